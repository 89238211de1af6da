//! Types, compared through the type map.
//!
//! A pseudo type's attributes are the union over every concrete type mapped
//! to it on that side, so a split or merge rename compares as one type.

use super::{fmt_member_change, normalized, partition};
use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::{PseudoValue, Side};
use crate::diff::{Category, DiffForm};
use crate::error::Result;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone)]
pub struct CanonicalType {
    pseudo: PseudoValue,
    attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDiff {
    pub pseudo: PseudoValue,
    /// Composite name across both policies
    pub name: String,
    pub form: DiffForm,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_attributes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_attributes: Vec<String>,
}

impl fmt::Display for TypeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_member_change(
            f,
            self.form,
            &self.name,
            "Attribute",
            &self.added_attributes,
            &self.removed_attributes,
        )
    }
}

pub struct TypesDiffer;

impl CategoryDiffer for TypesDiffer {
    type Canonical = CanonicalType;
    type Diff = TypeDiff;

    fn category(&self) -> Category {
        Category::Types
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<CanonicalType>> {
        let policy = ctx.policy(side);
        Ok(ctx
            .type_map
            .pseudo_values()
            .filter(|p| !ctx.type_map.is_hole(*p, side))
            .map(|pseudo| {
                let attributes = ctx
                    .type_map
                    .pseudo_to_types(pseudo, side)
                    .iter()
                    .filter_map(|id| policy.type_symbol(*id))
                    .flat_map(|sym| sym.attributes.iter().cloned())
                    .collect();
                CanonicalType {
                    pseudo,
                    attributes: normalized(attributes),
                }
            })
            .collect())
    }

    fn compare_key(&self, a: &CanonicalType, b: &CanonicalType) -> Ordering {
        a.pseudo.cmp(&b.pseudo)
    }

    fn one_sided(&self, ctx: &DiffContext<'_>, form: DiffForm, item: &CanonicalType) -> Result<TypeDiff> {
        Ok(TypeDiff {
            pseudo: item.pseudo,
            name: ctx.type_map.display_name(item.pseudo),
            form,
            added_attributes: Vec::new(),
            removed_attributes: Vec::new(),
        })
    }

    fn deep_compare(
        &self,
        ctx: &DiffContext<'_>,
        original: &CanonicalType,
        modified: &CanonicalType,
    ) -> Result<Option<TypeDiff>> {
        let attrs = partition(&original.attributes, &modified.attributes);
        Ok((!attrs.is_unchanged()).then(|| TypeDiff {
            pseudo: original.pseudo,
            name: ctx.type_map.display_name(original.pseudo),
            form: DiffForm::Modified,
            added_attributes: attrs.added,
            removed_attributes: attrs.removed,
        }))
    }
}
