//! Type rules (type_transition, type_change, type_member).
//!
//! Keyed the same way as access vector rules; two rules with equal keys
//! differ when their default types map to different pseudo values.

use super::rule_key::{classify_by_types, cond_key, expand_pairs, naming_side, RuleKey};
use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::{PseudoValue, Side};
use crate::diff::{Category, DiffForm};
use crate::error::{ErrorContext, Result};
use crate::model::{RuleCondition, TeRuleKind};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone)]
pub struct CanonicalTeRule {
    key: RuleKey,
    cond: Option<RuleCondition>,
    default: PseudoValue,
    rule: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeRuleDiff {
    pub kind: TeRuleKind,
    pub form: DiffForm,
    #[serde(skip)]
    pub key: RuleKey,
    pub source: String,
    pub target: String,
    pub class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond: Option<RuleCondition>,
    #[serde(skip)]
    pub orig_default: Option<PseudoValue>,
    #[serde(skip)]
    pub mod_default: Option<PseudoValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_default_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_default_name: Option<String>,
    /// Index into the original policy's type rules
    #[serde(skip)]
    pub orig_rule: Option<usize>,
    #[serde(skip)]
    pub mod_rule: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orig_lines: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mod_lines: Vec<u64>,
}

impl TeRuleDiff {
    /// Default type in the given policy, if the rule exists there.
    #[must_use]
    pub const fn default_on(&self, side: Side) -> Option<PseudoValue> {
        match side {
            Side::Original => self.orig_default,
            Side::Modified => self.mod_default,
        }
    }
}

impl fmt::Display for TeRuleDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} : {} ",
            self.form.symbol(),
            self.kind,
            self.source,
            self.target,
            self.class
        )?;
        match (&self.orig_default_name, &self.mod_default_name) {
            (Some(old), Some(new)) => write!(f, "{{ -{old} +{new} }};")?,
            (Some(name), None) | (None, Some(name)) => write!(f, "{name};")?,
            (None, None) => f.write_str(";")?,
        }
        if let Some(cond) = &self.cond {
            write!(f, "  {cond}")?;
        }
        Ok(())
    }
}

pub struct TeRulesDiffer {
    kind: TeRuleKind,
}

impl TeRulesDiffer {
    #[must_use]
    pub const fn new(kind: TeRuleKind) -> Self {
        Self { kind }
    }

    fn build(&self, ctx: &DiffContext<'_>, form: DiffForm, item: &CanonicalTeRule) -> TeRuleDiff {
        let side = naming_side(form);
        TeRuleDiff {
            kind: self.kind,
            form,
            key: item.key.clone(),
            source: ctx.type_map.name_of(item.key.source, side),
            target: ctx.type_map.name_of(item.key.target, side),
            class: item.key.class.clone(),
            cond: item.cond.clone(),
            orig_default: None,
            mod_default: None,
            orig_default_name: None,
            mod_default_name: None,
            orig_rule: None,
            mod_rule: None,
            orig_lines: Vec::new(),
            mod_lines: Vec::new(),
        }
    }
}

impl CategoryDiffer for TeRulesDiffer {
    type Canonical = CanonicalTeRule;
    type Diff = TeRuleDiff;

    fn category(&self) -> Category {
        Category::from_te_kind(self.kind)
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<CanonicalTeRule>> {
        let policy = ctx.policy(side);
        let mut merged: BTreeMap<RuleKey, CanonicalTeRule> = BTreeMap::new();
        for (index, rule) in policy
            .te_rules()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.kind == self.kind)
        {
            let context = || format!("{} rule {index}", rule.kind);
            let pairs = expand_pairs(ctx, side, &rule.source, &rule.target).with_context(context)?;
            let cond = cond_key(rule.cond.as_ref()).with_context(context)?;
            let default = ctx.type_map.map_to_pseudo(rule.default, side)?;
            for (source, target) in pairs {
                let key = RuleKey {
                    source,
                    target,
                    class: rule.class.clone(),
                    cond: cond.clone(),
                };
                match merged.entry(key) {
                    Entry::Vacant(slot) => {
                        let key = slot.key().clone();
                        slot.insert(CanonicalTeRule {
                            key,
                            cond: rule.cond.clone(),
                            default,
                            rule: index,
                        });
                    }
                    Entry::Occupied(existing) if existing.get().default != default => {
                        tracing::warn!(
                            "{} {} {} : {} has conflicting defaults {} and {}; keeping the first",
                            rule.kind,
                            ctx.type_map.name_of(source, side),
                            ctx.type_map.name_of(target, side),
                            rule.class,
                            ctx.type_map.name_of(existing.get().default, side),
                            policy.type_name(rule.default),
                        );
                    }
                    Entry::Occupied(_) => {}
                }
            }
        }
        Ok(merged.into_values().collect())
    }

    fn compare_key(&self, a: &CanonicalTeRule, b: &CanonicalTeRule) -> Ordering {
        a.key.cmp(&b.key)
    }

    fn classify(&self, ctx: &DiffContext<'_>, form: DiffForm, item: &CanonicalTeRule) -> DiffForm {
        classify_by_types(ctx, form, &[item.key.source, item.key.target, item.default])
    }

    fn one_sided(&self, ctx: &DiffContext<'_>, form: DiffForm, item: &CanonicalTeRule) -> Result<TeRuleDiff> {
        let mut diff = self.build(ctx, form, item);
        let name = ctx.type_map.name_of(item.default, naming_side(form));
        if form.is_added() {
            diff.mod_default = Some(item.default);
            diff.mod_default_name = Some(name);
            diff.mod_rule = Some(item.rule);
        } else {
            diff.orig_default = Some(item.default);
            diff.orig_default_name = Some(name);
            diff.orig_rule = Some(item.rule);
        }
        Ok(diff)
    }

    fn deep_compare(
        &self,
        ctx: &DiffContext<'_>,
        original: &CanonicalTeRule,
        modified: &CanonicalTeRule,
    ) -> Result<Option<TeRuleDiff>> {
        if original.default == modified.default {
            return Ok(None);
        }
        let map = ctx.type_map;
        let mut diff = self.build(ctx, DiffForm::Modified, original);
        diff.orig_default = Some(original.default);
        diff.mod_default = Some(modified.default);
        diff.orig_default_name = Some(map.name_of(original.default, Side::Original));
        diff.mod_default_name = Some(map.name_of(modified.default, Side::Modified));
        diff.orig_rule = Some(original.rule);
        diff.mod_rule = Some(modified.rule);
        Ok(Some(diff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::engine::diff_category;
    use crate::diff::{RemapEntry, TypeMap};
    use crate::model::{Policy, PolicyBuilder};

    fn base() -> PolicyBuilder {
        PolicyBuilder::new("p")
            .class("process", None, &["transition"])
            .class("file", None, &["read"])
            .attribute("domain")
            .type_("init_t", &["domain"])
            .type_("shell_exec_t", &[])
            .type_("shell_t", &["domain"])
            .type_("user_t", &["domain"])
    }

    fn render(orig: &Policy, modified: &Policy, remaps: &[RemapEntry]) -> Vec<String> {
        let map = TypeMap::build(orig, modified, remaps).unwrap();
        let ctx = DiffContext::new(orig, modified, &map);
        diff_category(&TeRulesDiffer::new(TeRuleKind::TypeTransition), &ctx)
            .unwrap()
            .items
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_changed_default() {
        let orig = base()
            .type_transition("init_t", "shell_exec_t", "process", "shell_t")
            .build()
            .unwrap();
        let modified = base()
            .type_transition("init_t", "shell_exec_t", "process", "user_t")
            .build()
            .unwrap();
        assert_eq!(
            render(&orig, &modified, &[]),
            vec!["* type_transition init_t shell_exec_t : process { -shell_t +user_t };"]
        );
    }

    #[test]
    fn test_attribute_source_expands() {
        let orig = base()
            .type_transition("domain", "shell_exec_t", "process", "shell_t")
            .build()
            .unwrap();
        let modified = base()
            .type_transition("init_t", "shell_exec_t", "process", "shell_t")
            .type_transition("shell_t", "shell_exec_t", "process", "shell_t")
            .build()
            .unwrap();
        assert_eq!(
            render(&orig, &modified, &[]),
            vec!["- type_transition user_t shell_exec_t : process shell_t;"]
        );
    }

    #[test]
    fn test_new_default_type_is_due_to_type() {
        let orig = base().build().unwrap();
        let modified = base()
            .type_("new_t", &[])
            .type_transition("init_t", "shell_exec_t", "process", "new_t")
            .build()
            .unwrap();
        let map = TypeMap::build(&orig, &modified, &[]).unwrap();
        let ctx = DiffContext::new(&orig, &modified, &map);
        let summary = diff_category(&TeRulesDiffer::new(TeRuleKind::TypeTransition), &ctx).unwrap();
        assert_eq!(summary.stats.added_due_to_type, 1);
    }

    #[test]
    fn test_conflicting_defaults_keep_first() {
        let orig = base()
            .type_transition("init_t", "shell_exec_t", "process", "shell_t")
            .type_transition("init_t", "shell_exec_t", "process", "user_t")
            .build()
            .unwrap();
        let modified = base()
            .type_transition("init_t", "shell_exec_t", "process", "shell_t")
            .build()
            .unwrap();
        assert!(render(&orig, &modified, &[]).is_empty());
    }
}
