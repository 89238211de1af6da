//! Common permission sets.

use super::{fmt_member_change, partition};
use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::Side;
use crate::diff::{Category, DiffForm};
use crate::error::Result;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone)]
pub struct CanonicalCommon {
    name: String,
    perms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonDiff {
    pub name: String,
    pub form: DiffForm,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_perms: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_perms: Vec<String>,
}

impl fmt::Display for CommonDiff {
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

pub struct CommonsDiffer;

impl CategoryDiffer for CommonsDiffer {
    type Canonical = CanonicalCommon;
    type Diff = CommonDiff;

    fn category(&self) -> Category {
        Category::Commons
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<CanonicalCommon>> {
        Ok(ctx
            .policy(side)
            .commons()
            .map(|common| CanonicalCommon {
                name: common.name.clone(),
                perms: common.perms.clone(),
            })
            .collect())
    }

    fn compare_key(&self, a: &CanonicalCommon, b: &CanonicalCommon) -> Ordering {
        a.name.cmp(&b.name)
    }

    fn one_sided(&self, _ctx: &DiffContext<'_>, form: DiffForm, item: &CanonicalCommon) -> Result<CommonDiff> {
        Ok(CommonDiff {
            name: item.name.clone(),
            form,
            added_perms: Vec::new(),
            removed_perms: Vec::new(),
        })
    }

    fn deep_compare(
        &self,
        _ctx: &DiffContext<'_>,
        original: &CanonicalCommon,
        modified: &CanonicalCommon,
    ) -> Result<Option<CommonDiff>> {
        let perms = partition(&original.perms, &modified.perms);
        Ok((!perms.is_unchanged()).then(|| CommonDiff {
            name: original.name.clone(),
            form: DiffForm::Modified,
            added_perms: perms.added,
            removed_perms: perms.removed,
        }))
    }
}
