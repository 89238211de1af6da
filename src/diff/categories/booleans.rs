//! Conditional booleans, compared by default state.

use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::Side;
use crate::diff::{Category, DiffForm};
use crate::error::Result;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone)]
pub struct CanonicalBool {
    name: String,
    default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoolDiff {
    pub name: String,
    pub form: DiffForm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_default: Option<bool>,
}

impl fmt::Display for BoolDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.form.symbol(), self.name)?;
        if let (DiffForm::Modified, Some(from), Some(to)) =
            (self.form, self.orig_default, self.mod_default)
        {
            write!(f, " (changed from {from} to {to})")?;
        }
        Ok(())
    }
}

pub struct BooleansDiffer;

impl CategoryDiffer for BooleansDiffer {
    type Canonical = CanonicalBool;
    type Diff = BoolDiff;

    fn category(&self) -> Category {
        Category::Booleans
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<CanonicalBool>> {
        Ok(ctx
            .policy(side)
            .booleans()
            .map(|b| CanonicalBool {
                name: b.name.clone(),
                default: b.default,
            })
            .collect())
    }

    fn compare_key(&self, a: &CanonicalBool, b: &CanonicalBool) -> Ordering {
        a.name.cmp(&b.name)
    }

    fn one_sided(&self, _ctx: &DiffContext<'_>, form: DiffForm, item: &CanonicalBool) -> Result<BoolDiff> {
        let (orig_default, mod_default) = if form.is_added() {
            (None, Some(item.default))
        } else {
            (Some(item.default), None)
        };
        Ok(BoolDiff {
            name: item.name.clone(),
            form,
            orig_default,
            mod_default,
        })
    }

    fn deep_compare(
        &self,
        _ctx: &DiffContext<'_>,
        original: &CanonicalBool,
        modified: &CanonicalBool,
    ) -> Result<Option<BoolDiff>> {
        Ok((original.default != modified.default).then(|| BoolDiff {
            name: original.name.clone(),
            form: DiffForm::Modified,
            orig_default: Some(original.default),
            mod_default: Some(modified.default),
        }))
    }
}
