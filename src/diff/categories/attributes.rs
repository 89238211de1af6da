//! Type attributes, compared by member set.

use super::{fmt_member_change, normalized, partition};
use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::{PseudoValue, Side};
use crate::diff::{Category, DiffForm};
use crate::error::Result;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone)]
pub struct CanonicalAttribute {
    name: String,
    members: Vec<PseudoValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDiff {
    pub name: String,
    pub form: DiffForm,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_types: Vec<String>,
}

impl fmt::Display for AttributeDiff {
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

pub struct AttributesDiffer;

impl CategoryDiffer for AttributesDiffer {
    type Canonical = CanonicalAttribute;
    type Diff = AttributeDiff;

    fn category(&self) -> Category {
        Category::Attributes
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<CanonicalAttribute>> {
        ctx.policy(side)
            .attributes()
            .map(|attr| {
                let members = attr
                    .members
                    .iter()
                    .map(|id| ctx.type_map.map_to_pseudo(*id, side))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CanonicalAttribute {
                    name: attr.name.clone(),
                    members: normalized(members),
                })
            })
            .collect()
    }

    fn compare_key(&self, a: &CanonicalAttribute, b: &CanonicalAttribute) -> Ordering {
        a.name.cmp(&b.name)
    }

    fn one_sided(
        &self,
        _ctx: &DiffContext<'_>,
        form: DiffForm,
        item: &CanonicalAttribute,
    ) -> Result<AttributeDiff> {
        Ok(AttributeDiff {
            name: item.name.clone(),
            form,
            added_types: Vec::new(),
            removed_types: Vec::new(),
        })
    }

    fn deep_compare(
        &self,
        ctx: &DiffContext<'_>,
        original: &CanonicalAttribute,
        modified: &CanonicalAttribute,
    ) -> Result<Option<AttributeDiff>> {
        let members = partition(&original.members, &modified.members);
        if members.is_unchanged() {
            return Ok(None);
        }
        let map = ctx.type_map;
        Ok(Some(AttributeDiff {
            name: original.name.clone(),
            form: DiffForm::Modified,
            added_types: members
                .added
                .iter()
                .map(|p| map.name_of(*p, Side::Modified))
                .collect(),
            removed_types: members
                .removed
                .iter()
                .map(|p| map.name_of(*p, Side::Original))
                .collect(),
        }))
    }
}
