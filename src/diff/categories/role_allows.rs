//! Role allow rules, merged per source role.

use super::{normalized, partition};
use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::Side;
use crate::diff::{Category, DiffForm};
use crate::error::Result;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone)]
pub struct CanonicalRoleAllow {
    source: String,
    targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleAllowDiff {
    pub source: String,
    pub form: DiffForm,
    /// All target roles for an added or removed rule, the unchanged ones otherwise
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_roles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_roles: Vec<String>,
}

impl fmt::Display for RoleAllowDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} allow {} {{", self.form.symbol(), self.source)?;
        for role in &self.roles {
            write!(f, " {role}")?;
        }
        for role in &self.added_roles {
            write!(f, " +{role}")?;
        }
        for role in &self.removed_roles {
            write!(f, " -{role}")?;
        }
        f.write_str(" };")
    }
}

pub struct RoleAllowsDiffer;

impl CategoryDiffer for RoleAllowsDiffer {
    type Canonical = CanonicalRoleAllow;
    type Diff = RoleAllowDiff;

    fn category(&self) -> Category {
        Category::RoleAllows
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<CanonicalRoleAllow>> {
        let mut merged: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for rule in ctx.policy(side).role_allows() {
            merged
                .entry(rule.source.as_str())
                .or_default()
                .extend(rule.targets.iter().cloned());
        }
        Ok(merged
            .into_iter()
            .map(|(source, targets)| CanonicalRoleAllow {
                source: source.to_string(),
                targets: normalized(targets),
            })
            .collect())
    }

    fn compare_key(&self, a: &CanonicalRoleAllow, b: &CanonicalRoleAllow) -> Ordering {
        a.source.cmp(&b.source)
    }

    fn one_sided(
        &self,
        _ctx: &DiffContext<'_>,
        form: DiffForm,
        item: &CanonicalRoleAllow,
    ) -> Result<RoleAllowDiff> {
        Ok(RoleAllowDiff {
            source: item.source.clone(),
            form,
            roles: item.targets.clone(),
            added_roles: Vec::new(),
            removed_roles: Vec::new(),
        })
    }

    fn deep_compare(
        &self,
        _ctx: &DiffContext<'_>,
        original: &CanonicalRoleAllow,
        modified: &CanonicalRoleAllow,
    ) -> Result<Option<RoleAllowDiff>> {
        let roles = partition(&original.targets, &modified.targets);
        if roles.is_unchanged() {
            return Ok(None);
        }
        Ok(Some(RoleAllowDiff {
            source: original.source.clone(),
            form: DiffForm::Modified,
            roles: roles.unmodified,
            added_roles: roles.added,
            removed_roles: roles.removed,
        }))
    }
}
