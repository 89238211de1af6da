//! MLS categories. A category either exists or it does not.

use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::Side;
use crate::diff::{Category, DiffForm};
use crate::error::Result;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatDiff {
    pub name: String,
    pub form: DiffForm,
}

impl fmt::Display for CatDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.form.symbol(), self.name)
    }
}

pub struct CatsDiffer;

impl CategoryDiffer for CatsDiffer {
    type Canonical = String;
    type Diff = CatDiff;

    fn category(&self) -> Category {
        Category::Categories
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<String>> {
        Ok(ctx.policy(side).categories().map(|c| c.name.clone()).collect())
    }

    fn compare_key(&self, a: &String, b: &String) -> Ordering {
        a.cmp(b)
    }

    fn one_sided(&self, _ctx: &DiffContext<'_>, form: DiffForm, item: &String) -> Result<CatDiff> {
        Ok(CatDiff {
            name: item.clone(),
            form,
        })
    }

    fn deep_compare(
        &self,
        _ctx: &DiffContext<'_>,
        _original: &String,
        _modified: &String,
    ) -> Result<Option<CatDiff>> {
        Ok(None)
    }
}
