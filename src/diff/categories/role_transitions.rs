//! Role transition rules, keyed by source role and target type.

use super::rule_key::{classify_by_types, naming_side};
use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::{PseudoValue, Side};
use crate::diff::{Category, DiffForm};
use crate::error::{ErrorContext, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone)]
pub struct CanonicalRoleTrans {
    source: String,
    target: PseudoValue,
    default: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleTransDiff {
    pub source: String,
    #[serde(skip)]
    pub target: PseudoValue,
    #[serde(rename = "target")]
    pub target_name: String,
    pub form: DiffForm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_default: Option<String>,
}

impl fmt::Display for RoleTransDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} role_transition {} {} ",
            self.form.symbol(),
            self.source,
            self.target_name
        )?;
        match (&self.orig_default, &self.mod_default) {
            (Some(old), Some(new)) => write!(f, "{{ -{old} +{new} }};"),
            (Some(role), None) | (None, Some(role)) => write!(f, "{role};"),
            (None, None) => f.write_str(";"),
        }
    }
}

pub struct RoleTransitionsDiffer;

impl CategoryDiffer for RoleTransitionsDiffer {
    type Canonical = CanonicalRoleTrans;
    type Diff = RoleTransDiff;

    fn category(&self) -> Category {
        Category::RoleTransitions
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<CanonicalRoleTrans>> {
        let policy = ctx.policy(side);
        let mut merged: BTreeMap<(String, PseudoValue), String> = BTreeMap::new();
        for rule in policy.role_transitions() {
            let targets = policy
                .expand_type_set(&rule.target)
                .with_context(|| format!("role_transition {} {}", rule.source, rule.target))?;
            for id in targets {
                let target = ctx.type_map.map_to_pseudo(id, side)?;
                merged
                    .entry((rule.source.clone(), target))
                    .or_insert_with(|| rule.default.clone());
            }
        }
        Ok(merged
            .into_iter()
            .map(|((source, target), default)| CanonicalRoleTrans {
                source,
                target,
                default,
            })
            .collect())
    }

    fn compare_key(&self, a: &CanonicalRoleTrans, b: &CanonicalRoleTrans) -> Ordering {
        a.source.cmp(&b.source).then(a.target.cmp(&b.target))
    }

    fn classify(&self, ctx: &DiffContext<'_>, form: DiffForm, item: &CanonicalRoleTrans) -> DiffForm {
        classify_by_types(ctx, form, &[item.target])
    }

    fn one_sided(
        &self,
        ctx: &DiffContext<'_>,
        form: DiffForm,
        item: &CanonicalRoleTrans,
    ) -> Result<RoleTransDiff> {
        let (orig_default, mod_default) = if form.is_added() {
            (None, Some(item.default.clone()))
        } else {
            (Some(item.default.clone()), None)
        };
        Ok(RoleTransDiff {
            source: item.source.clone(),
            target: item.target,
            target_name: ctx.type_map.name_of(item.target, naming_side(form)),
            form,
            orig_default,
            mod_default,
        })
    }

    fn deep_compare(
        &self,
        ctx: &DiffContext<'_>,
        original: &CanonicalRoleTrans,
        modified: &CanonicalRoleTrans,
    ) -> Result<Option<RoleTransDiff>> {
        if original.default == modified.default {
            return Ok(None);
        }
        Ok(Some(RoleTransDiff {
            source: original.source.clone(),
            target: original.target,
            target_name: ctx.type_map.name_of(original.target, Side::Original),
            form: DiffForm::Modified,
            orig_default: Some(original.default.clone()),
            mod_default: Some(modified.default.clone()),
        }))
    }
}
