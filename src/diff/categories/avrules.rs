//! Access vector rules (allow, auditallow, dontaudit, neverallow).
//!
//! Rules are expanded to one semantic rule per (source, target, class,
//! condition) with the permission sets of all contributing source rules
//! unioned. The indices of those source rules are kept for line lookup.

use super::partition;
use super::rule_key::{classify_by_types, cond_key, expand_pairs, naming_side, RuleKey};
use crate::diff::line_numbers::LineAnnotation;
use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::Side;
use crate::diff::{Category, DiffForm};
use crate::error::{ErrorContext, Result};
use crate::model::{AvRuleKind, RuleCondition};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone)]
pub struct CanonicalAvRule {
    key: RuleKey,
    cond: Option<RuleCondition>,
    perms: Vec<String>,
    rules: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvRuleDiff {
    pub kind: AvRuleKind,
    pub form: DiffForm,
    #[serde(skip)]
    pub key: RuleKey,
    pub source: String,
    pub target: String,
    pub class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond: Option<RuleCondition>,
    /// All permissions for an added or removed rule, the unchanged ones otherwise
    pub perms: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_perms: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_perms: Vec<String>,
    /// Indices into the original policy's access vector rules
    #[serde(skip)]
    pub orig_rules: Vec<usize>,
    #[serde(skip)]
    pub mod_rules: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orig_lines: Vec<LineAnnotation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mod_lines: Vec<LineAnnotation>,
}

impl AvRuleDiff {
    /// Permissions this rule grants in the given policy.
    #[must_use]
    pub fn perms_on(&self, side: Side) -> Vec<String> {
        let mut perms = match (self.form, side) {
            (DiffForm::Modified, Side::Original) => {
                let mut p = self.perms.clone();
                p.extend(self.removed_perms.iter().cloned());
                p
            }
            (DiffForm::Modified, Side::Modified) => {
                let mut p = self.perms.clone();
                p.extend(self.added_perms.iter().cloned());
                p
            }
            (form, Side::Modified) if form.is_added() => self.perms.clone(),
            (form, Side::Original) if form.is_removed() => self.perms.clone(),
            _ => Vec::new(),
        };
        perms.sort();
        perms
    }

    /// Source lines in the original policy that grant `perm` for this rule.
    #[must_use]
    pub fn orig_lines_for_perm(&self, perm: &str) -> Vec<u64> {
        lines_for_perm(&self.orig_lines, perm)
    }

    /// Source lines in the modified policy that grant `perm` for this rule.
    #[must_use]
    pub fn mod_lines_for_perm(&self, perm: &str) -> Vec<u64> {
        lines_for_perm(&self.mod_lines, perm)
    }
}

fn lines_for_perm(annotations: &[LineAnnotation], perm: &str) -> Vec<u64> {
    annotations
        .iter()
        .filter(|a| a.perms.iter().any(|p| p == perm))
        .map(|a| a.line)
        .collect()
}

impl fmt::Display for AvRuleDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} : {} {{",
            self.form.symbol(),
            self.kind,
            self.source,
            self.target,
            self.class
        )?;
        for perm in &self.perms {
            write!(f, " {perm}")?;
        }
        for perm in &self.added_perms {
            write!(f, " +{perm}")?;
        }
        for perm in &self.removed_perms {
            write!(f, " -{perm}")?;
        }
        f.write_str(" };")?;
        if let Some(cond) = &self.cond {
            write!(f, "  {cond}")?;
        }
        Ok(())
    }
}

pub struct AvRulesDiffer {
    kind: AvRuleKind,
}

impl AvRulesDiffer {
    #[must_use]
    pub const fn new(kind: AvRuleKind) -> Self {
        Self { kind }
    }

    fn build(
        &self,
        ctx: &DiffContext<'_>,
        form: DiffForm,
        item: &CanonicalAvRule,
        cond: Option<RuleCondition>,
    ) -> AvRuleDiff {
        let side = naming_side(form);
        AvRuleDiff {
            kind: self.kind,
            form,
            key: item.key.clone(),
            source: ctx.type_map.name_of(item.key.source, side),
            target: ctx.type_map.name_of(item.key.target, side),
            class: item.key.class.clone(),
            cond,
            perms: Vec::new(),
            added_perms: Vec::new(),
            removed_perms: Vec::new(),
            orig_rules: Vec::new(),
            mod_rules: Vec::new(),
            orig_lines: Vec::new(),
            mod_lines: Vec::new(),
        }
    }
}

impl CategoryDiffer for AvRulesDiffer {
    type Canonical = CanonicalAvRule;
    type Diff = AvRuleDiff;

    fn category(&self) -> Category {
        Category::from_av_kind(self.kind)
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<CanonicalAvRule>> {
        let mut merged: BTreeMap<RuleKey, CanonicalAvRule> = BTreeMap::new();
        let rules = ctx.policy(side).av_rules();
        for (index, rule) in rules.iter().enumerate().filter(|(_, r)| r.kind == self.kind) {
            let context = || format!("{} rule {index}", rule.kind);
            let pairs = expand_pairs(ctx, side, &rule.source, &rule.target).with_context(context)?;
            let cond = cond_key(rule.cond.as_ref()).with_context(context)?;
            for (source, target) in pairs {
                let key = RuleKey {
                    source,
                    target,
                    class: rule.class.clone(),
                    cond: cond.clone(),
                };
                let entry = merged.entry(key.clone()).or_insert_with(|| CanonicalAvRule {
                    key,
                    cond: rule.cond.clone(),
                    perms: Vec::new(),
                    rules: Vec::new(),
                });
                entry.perms.extend(rule.perms.iter().cloned());
                entry.rules.push(index);
            }
        }
        Ok(merged
            .into_values()
            .map(|mut item| {
                item.perms.sort();
                item.perms.dedup();
                item.rules.sort_unstable();
                item.rules.dedup();
                item
            })
            .collect())
    }

    fn compare_key(&self, a: &CanonicalAvRule, b: &CanonicalAvRule) -> Ordering {
        a.key.cmp(&b.key)
    }

    fn classify(&self, ctx: &DiffContext<'_>, form: DiffForm, item: &CanonicalAvRule) -> DiffForm {
        classify_by_types(ctx, form, &[item.key.source, item.key.target])
    }

    fn one_sided(&self, ctx: &DiffContext<'_>, form: DiffForm, item: &CanonicalAvRule) -> Result<AvRuleDiff> {
        let mut diff = self.build(ctx, form, item, item.cond.clone());
        diff.perms = item.perms.clone();
        if form.is_added() {
            diff.mod_rules = item.rules.clone();
        } else {
            diff.orig_rules = item.rules.clone();
        }
        Ok(diff)
    }

    fn deep_compare(
        &self,
        ctx: &DiffContext<'_>,
        original: &CanonicalAvRule,
        modified: &CanonicalAvRule,
    ) -> Result<Option<AvRuleDiff>> {
        let perms = partition(&original.perms, &modified.perms);
        if perms.is_unchanged() {
            return Ok(None);
        }
        let mut diff = self.build(ctx, DiffForm::Modified, original, original.cond.clone());
        diff.perms = perms.unmodified;
        diff.added_perms = perms.added;
        diff.removed_perms = perms.removed;
        diff.orig_rules = original.rules.clone();
        diff.mod_rules = modified.rules.clone();
        Ok(Some(diff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::engine::diff_category;
    use crate::diff::TypeMap;
    use crate::model::{Policy, PolicyBuilder};

    fn base() -> PolicyBuilder {
        PolicyBuilder::new("p")
            .class("file", None, &["read", "write", "append", "getattr"])
            .attribute("domain")
            .attribute("empty_attr")
            .type_("a_t", &["domain"])
            .type_("b_t", &["domain"])
            .type_("etc_t", &[])
            .boolean("flag", false)
    }

    fn diff(orig: &Policy, modified: &Policy) -> Vec<String> {
        let map = TypeMap::build(orig, modified, &[]).unwrap();
        let ctx = DiffContext::new(orig, modified, &map);
        diff_category(&AvRulesDiffer::new(AvRuleKind::Allow), &ctx)
            .unwrap()
            .items
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_attribute_expansion_matches_explicit_rules() {
        let orig = base()
            .allow("domain", "etc_t", "file", &["read"])
            .build()
            .unwrap();
        let modified = base()
            .allow("a_t", "etc_t", "file", &["read"])
            .allow("b_t", "etc_t", "file", &["read"])
            .build()
            .unwrap();
        assert!(diff(&orig, &modified).is_empty());
    }

    #[test]
    fn test_self_target_and_permission_union() {
        let orig = base()
            .allow("a_t", "self", "file", &["read"])
            .allow("a_t", "a_t", "file", &["write"])
            .build()
            .unwrap();
        let modified = base()
            .allow("a_t", "a_t", "file", &["read", "append"])
            .build()
            .unwrap();
        assert_eq!(
            diff(&orig, &modified),
            vec!["* allow a_t a_t : file { read +append -write };"]
        );
    }

    #[test]
    fn test_empty_attribute_contributes_nothing() {
        let orig = base()
            .allow("empty_attr", "etc_t", "file", &["read"])
            .build()
            .unwrap();
        let modified = base().build().unwrap();
        assert!(diff(&orig, &modified).is_empty());
    }

    #[test]
    fn test_conditional_rules_are_distinct() {
        let orig = base()
            .allow("a_t", "etc_t", "file", &["read"])
            .build()
            .unwrap();
        let modified = base()
            .allow("a_t", "etc_t", "file", &["read"])
            .when(&["flag"], true)
            .allow("a_t", "etc_t", "file", &["write"])
            .build()
            .unwrap();
        assert_eq!(
            diff(&orig, &modified),
            vec!["+ allow a_t etc_t : file { write };  [flag]:TRUE"]
        );
    }

    #[test]
    fn test_perms_on_sides() {
        let orig = base()
            .allow("a_t", "etc_t", "file", &["read", "write"])
            .build()
            .unwrap();
        let modified = base()
            .allow("a_t", "etc_t", "file", &["read", "getattr"])
            .build()
            .unwrap();
        let map = TypeMap::build(&orig, &modified, &[]).unwrap();
        let ctx = DiffContext::new(&orig, &modified, &map);
        let summary = diff_category(&AvRulesDiffer::new(AvRuleKind::Allow), &ctx).unwrap();
        let item = summary.items[0].as_av_rule().unwrap();
        assert_eq!(item.perms_on(Side::Original), vec!["read", "write"]);
        assert_eq!(item.perms_on(Side::Modified), vec!["getattr", "read"]);
        assert_eq!(item.orig_rules, vec![0]);
    }
}
