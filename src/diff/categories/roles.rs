//! Roles, compared by the types they may enter.

use super::{fmt_member_change, normalized, partition};
use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::{PseudoValue, Side};
use crate::diff::{Category, DiffForm};
use crate::error::Result;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone)]
pub struct CanonicalRole {
    name: String,
    types: Vec<PseudoValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDiff {
    pub name: String,
    pub form: DiffForm,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_types: Vec<String>,
}

impl fmt::Display for RoleDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_member_change(
            f,
            self.form,
            &self.name,
            "Type",
            &self.added_types,
            &self.removed_types,
        )
    }
}

pub struct RolesDiffer;

impl CategoryDiffer for RolesDiffer {
    type Canonical = CanonicalRole;
    type Diff = RoleDiff;

    fn category(&self) -> Category {
        Category::Roles
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<CanonicalRole>> {
        ctx.policy(side)
            .roles()
            .map(|role| {
                let types = role
                    .types
                    .iter()
                    .map(|id| ctx.type_map.map_to_pseudo(*id, side))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CanonicalRole {
                    name: role.name.clone(),
                    types: normalized(types),
                })
            })
            .collect()
    }

    fn compare_key(&self, a: &CanonicalRole, b: &CanonicalRole) -> Ordering {
        a.name.cmp(&b.name)
    }

    fn one_sided(&self, _ctx: &DiffContext<'_>, form: DiffForm, item: &CanonicalRole) -> Result<RoleDiff> {
        Ok(RoleDiff {
            name: item.name.clone(),
            form,
            added_types: Vec::new(),
            removed_types: Vec::new(),
        })
    }

    fn deep_compare(
        &self,
        ctx: &DiffContext<'_>,
        original: &CanonicalRole,
        modified: &CanonicalRole,
    ) -> Result<Option<RoleDiff>> {
        let types = partition(&original.types, &modified.types);
        if types.is_unchanged() {
            return Ok(None);
        }
        let map = ctx.type_map;
        Ok(Some(RoleDiff {
            name: original.name.clone(),
            form: DiffForm::Modified,
            added_types: types
                .added
                .iter()
                .map(|p| map.name_of(*p, Side::Modified))
                .collect(),
            removed_types: types
                .removed
                .iter()
                .map(|p| map.name_of(*p, Side::Original))
                .collect(),
        }))
    }
}
