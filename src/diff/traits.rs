//! The per-category diff contract.
//!
//! Each category implements [`CategoryDiffer`]; the generic merge in
//! [`engine`](super::engine) does the rest.

use super::type_map::{Side, TypeMap};
use super::{Category, DiffForm, DiffItem};
use crate::error::Result;
use crate::model::Policy;
use std::cmp::Ordering;

/// Everything a differ may look at.
#[derive(Debug, Clone, Copy)]
pub struct DiffContext<'a> {
    pub original: &'a Policy,
    pub modified: &'a Policy,
    pub type_map: &'a TypeMap,
}

impl<'a> DiffContext<'a> {
    #[must_use]
    pub const fn new(original: &'a Policy, modified: &'a Policy, type_map: &'a TypeMap) -> Self {
        Self {
            original,
            modified,
            type_map,
        }
    }

    /// The policy on one side.
    #[must_use]
    pub const fn policy(&self, side: Side) -> &'a Policy {
        match side {
            Side::Original => self.original,
            Side::Modified => self.modified,
        }
    }
}

/// Diff strategy for one category.
///
/// Implementors turn each policy into a list of canonical items, define a
/// total order over their keys, and describe what a one-sided or changed
/// item looks like.
pub trait CategoryDiffer {
    /// Normalized, policy-independent form of one symbol or rule.
    type Canonical;

    /// Result item type.
    type Diff: Into<DiffItem>;

    fn category(&self) -> Category;

    /// Extract and normalize this category's items from one policy.
    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<Self::Canonical>>;

    /// Total order over item keys.
    fn compare_key(&self, a: &Self::Canonical, b: &Self::Canonical) -> Ordering;

    /// Refine the form of a one-sided item.
    ///
    /// Rule categories turn `Added`/`Removed` into the `DueToType` forms when
    /// a referenced type does not exist on the other side.
    fn classify(&self, _ctx: &DiffContext<'_>, form: DiffForm, _item: &Self::Canonical) -> DiffForm {
        form
    }

    /// Build the result for an item present on one side only.
    fn one_sided(
        &self,
        ctx: &DiffContext<'_>,
        form: DiffForm,
        item: &Self::Canonical,
    ) -> Result<Self::Diff>;

    /// Compare two items with equal keys. `None` means semantically equal.
    fn deep_compare(
        &self,
        ctx: &DiffContext<'_>,
        original: &Self::Canonical,
        modified: &Self::Canonical,
    ) -> Result<Option<Self::Diff>>;
}
