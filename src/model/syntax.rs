//! Syntactic rule tables.
//!
//! A compiled policy only keeps *semantic* rules (one source type, one target,
//! one class). When a policy is built from source, the original rules as the
//! author wrote them can be kept alongside, each with the line it came from.
//! The diff session uses this table to annotate rule differences with line
//! numbers.

use super::cond::RuleCondition;
use super::document::{AvRuleKind, TeRuleKind};
use serde::{Deserialize, Serialize};

/// Kind of a syntactic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleKind {
    Av(AvRuleKind),
    Te(TeRuleKind),
}

/// A rule as written in policy source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyntacticRule {
    pub kind: RuleKind,
    /// Types, aliases or attributes
    pub sources: Vec<String>,
    /// Types, aliases, attributes or `self`
    pub targets: Vec<String>,
    pub classes: Vec<String>,
    /// Permissions (AV rules only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub perms: Vec<String>,
    /// Default type (type rules only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond: Option<RuleCondition>,
    pub line: u64,
}

/// An ordered collection of syntactic rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyntaxTable {
    rules: Vec<SyntacticRule>,
}

impl SyntaxTable {
    #[must_use]
    pub const fn new(rules: Vec<SyntacticRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &[SyntacticRule] {
        &self.rules
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Rules of the given kind, in table order.
    pub fn rules_of_kind(&self, kind: RuleKind) -> impl Iterator<Item = &SyntacticRule> {
        self.rules.iter().filter(move |r| r.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_deserializes_from_keyword() {
        let yaml = "kind: type_transition\nsources: [a_t]\ntargets: [b_t]\nclasses: [file]\ndefault: c_t\nline: 4\n";
        let rule: SyntacticRule = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(rule.kind, RuleKind::Te(TeRuleKind::TypeTransition));
        assert_eq!(rule.default.as_deref(), Some("c_t"));

        let yaml = "kind: dontaudit\nsources: [a_t]\ntargets: [self]\nclasses: [file]\nperms: [read]\nline: 9\n";
        let rule: SyntacticRule = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(rule.kind, RuleKind::Av(AvRuleKind::DontAudit));
    }

    #[test]
    fn test_rules_of_kind_filters() {
        let allow = SyntacticRule {
            kind: RuleKind::Av(AvRuleKind::Allow),
            sources: vec!["a_t".into()],
            targets: vec!["b_t".into()],
            classes: vec!["file".into()],
            perms: vec!["read".into()],
            default: None,
            cond: None,
            line: 1,
        };
        let mut dontaudit = allow.clone();
        dontaudit.kind = RuleKind::Av(AvRuleKind::DontAudit);
        dontaudit.line = 2;

        let table = SyntaxTable::new(vec![allow, dontaudit]);
        let lines: Vec<u64> = table
            .rules_of_kind(RuleKind::Av(AvRuleKind::DontAudit))
            .map(|r| r.line)
            .collect();
        assert_eq!(lines, vec![2]);
        assert_eq!(table.len(), 2);
    }
}
