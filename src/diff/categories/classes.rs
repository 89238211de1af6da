//! Object classes.

use super::{fmt_member_change, partition};
use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::Side;
use crate::diff::{Category, DiffForm};
use crate::error::Result;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A class and its permissions, including those inherited from its common.
#[derive(Debug, Clone)]
pub struct CanonicalClass {
    name: String,
    perms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDiff {
    pub name: String,
    pub form: DiffForm,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_perms: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_perms: Vec<String>,
}

impl fmt::Display for ClassDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_member_change(
            f,
            self.form,
            &self.name,
            "Permission",
            &self.added_perms,
            &self.removed_perms,
        )
    }
}

pub struct ClassesDiffer;

impl CategoryDiffer for ClassesDiffer {
    type Canonical = CanonicalClass;
    type Diff = ClassDiff;

    fn category(&self) -> Category {
        Category::Classes
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<CanonicalClass>> {
        let policy = ctx.policy(side);
        policy
            .classes()
            .map(|class| {
                Ok(CanonicalClass {
                    name: class.name.clone(),
                    perms: policy.class_perms(&class.name)?,
                })
            })
            .collect()
    }

    fn compare_key(&self, a: &CanonicalClass, b: &CanonicalClass) -> Ordering {
        a.name.cmp(&b.name)
    }

    fn one_sided(&self, _ctx: &DiffContext<'_>, form: DiffForm, item: &CanonicalClass) -> Result<ClassDiff> {
        Ok(ClassDiff {
            name: item.name.clone(),
            form,
            added_perms: Vec::new(),
            removed_perms: Vec::new(),
        })
    }

    fn deep_compare(
        &self,
        _ctx: &DiffContext<'_>,
        original: &CanonicalClass,
        modified: &CanonicalClass,
    ) -> Result<Option<ClassDiff>> {
        let perms = partition(&original.perms, &modified.perms);
        if perms.is_unchanged() {
            return Ok(None);
        }
        Ok(Some(ClassDiff {
            name: original.name.clone(),
            form: DiffForm::Modified,
            added_perms: perms.added,
            removed_perms: perms.removed,
        }))
    }
}
