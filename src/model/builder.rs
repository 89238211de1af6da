//! Fluent construction of small policies.
//!
//! Mostly useful in tests and benchmarks, where writing a YAML document for
//! every scenario would be noise. Level and range strings are parsed when
//! [`PolicyBuilder::build`] runs so a malformed one surfaces as an error
//! instead of a panic.

use super::cond::{CondExpr, RuleCondition};
use super::document::{
    AvRuleDecl, AvRuleKind, BoolDecl, ClassDecl, CommonDecl, PolicyDocument, RangeTransitionDecl,
    RoleAllowDecl, RoleDecl, RoleTransitionDecl, SymbolDecl, TeRuleDecl, TeRuleKind, TypeDecl,
    UserDecl,
};
use super::policy::Policy;
use super::syntax::SyntacticRule;
use crate::error::{PolDiffError, Result};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Builder for a [`Policy`].
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct PolicyBuilder {
    doc: PolicyDocument,
    levels: Vec<String>,
    users: Vec<(UserDecl, Option<String>, Option<String>)>,
    range_transitions: Vec<(String, String, String, String)>,
    pending_cond: Option<RuleCondition>,
    error: Option<String>,
}

impl PolicyBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            doc: PolicyDocument {
                name: Some(name.to_string()),
                ..PolicyDocument::default()
            },
            ..Self::default()
        }
    }

    pub fn mls(mut self, enabled: bool) -> Self {
        self.doc.mls = enabled;
        self
    }

    pub fn common(mut self, name: &str, perms: &[&str]) -> Self {
        self.doc.commons.push(CommonDecl {
            name: name.to_string(),
            perms: strings(perms),
        });
        self
    }

    pub fn class(mut self, name: &str, common: Option<&str>, perms: &[&str]) -> Self {
        self.doc.classes.push(ClassDecl {
            name: name.to_string(),
            common: common.map(str::to_string),
            perms: strings(perms),
        });
        self
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.doc.attributes.push(name.to_string());
        self
    }

    /// Declare a type belonging to the given attributes.
    pub fn type_(self, name: &str, attributes: &[&str]) -> Self {
        self.type_with_aliases(name, &[], attributes)
    }

    pub fn type_with_aliases(mut self, name: &str, aliases: &[&str], attributes: &[&str]) -> Self {
        self.doc.types.push(TypeDecl {
            name: name.to_string(),
            aliases: strings(aliases),
            attributes: strings(attributes),
        });
        self
    }

    pub fn role(mut self, name: &str, types: &[&str]) -> Self {
        self.doc.roles.push(RoleDecl {
            name: name.to_string(),
            types: strings(types),
        });
        self
    }

    /// Declare a user; `level` and `range` are MLS strings such as `"s0 - s1:c0.c3"`.
    pub fn user(mut self, name: &str, roles: &[&str], level: Option<&str>, range: Option<&str>) -> Self {
        self.users.push((
            UserDecl {
                name: name.to_string(),
                roles: strings(roles),
                default_level: None,
                range: None,
            },
            level.map(str::to_string),
            range.map(str::to_string),
        ));
        self
    }

    pub fn boolean(mut self, name: &str, default: bool) -> Self {
        self.doc.booleans.push(BoolDecl {
            name: name.to_string(),
            default,
        });
        self
    }

    pub fn sensitivity(mut self, name: &str) -> Self {
        self.doc.sensitivities.push(SymbolDecl::from(name));
        self
    }

    pub fn sensitivity_with_aliases(mut self, name: &str, aliases: &[&str]) -> Self {
        self.doc.sensitivities.push(SymbolDecl {
            name: name.to_string(),
            aliases: strings(aliases),
        });
        self
    }

    pub fn categories(mut self, names: &[&str]) -> Self {
        self.doc
            .categories
            .extend(names.iter().map(|n| SymbolDecl::from(*n)));
        self
    }

    /// Declare which categories a sensitivity accepts, e.g. `"s0:c0.c3"`.
    pub fn level(mut self, level: &str) -> Self {
        self.levels.push(level.to_string());
        self
    }

    /// Place the next rule inside a conditional block.
    ///
    /// `expr` is a reverse-polish token list.
    pub fn when(mut self, expr: &[&str], branch: bool) -> Self {
        match CondExpr::parse(expr) {
            Ok(expr) => self.pending_cond = Some(RuleCondition { expr, branch }),
            Err(e) => self.error = Some(e),
        }
        self
    }

    pub fn av_rule(
        mut self,
        kind: AvRuleKind,
        source: &str,
        target: &str,
        class: &str,
        perms: &[&str],
    ) -> Self {
        let cond = self.pending_cond.take();
        self.doc.av_rules.push(AvRuleDecl {
            kind,
            source: source.to_string(),
            target: target.to_string(),
            class: class.to_string(),
            perms: strings(perms),
            cond,
        });
        self
    }

    pub fn allow(self, source: &str, target: &str, class: &str, perms: &[&str]) -> Self {
        self.av_rule(AvRuleKind::Allow, source, target, class, perms)
    }

    pub fn te_rule(
        mut self,
        kind: TeRuleKind,
        source: &str,
        target: &str,
        class: &str,
        default: &str,
    ) -> Self {
        let cond = self.pending_cond.take();
        self.doc.te_rules.push(TeRuleDecl {
            kind,
            source: source.to_string(),
            target: target.to_string(),
            class: class.to_string(),
            default: default.to_string(),
            cond,
        });
        self
    }

    pub fn type_transition(self, source: &str, target: &str, class: &str, default: &str) -> Self {
        self.te_rule(TeRuleKind::TypeTransition, source, target, class, default)
    }

    pub fn role_allow(mut self, source: &str, targets: &[&str]) -> Self {
        self.doc.role_allows.push(RoleAllowDecl {
            source: source.to_string(),
            targets: strings(targets),
        });
        self
    }

    pub fn role_transition(mut self, source: &str, target: &str, default: &str) -> Self {
        self.doc.role_transitions.push(RoleTransitionDecl {
            source: source.to_string(),
            target: target.to_string(),
            default: default.to_string(),
        });
        self
    }

    pub fn range_transition(mut self, source: &str, target: &str, class: &str, range: &str) -> Self {
        self.range_transitions.push((
            source.to_string(),
            target.to_string(),
            class.to_string(),
            range.to_string(),
        ));
        self
    }

    pub fn source_rule(mut self, rule: SyntacticRule) -> Self {
        self.doc.source_rules.push(rule);
        self
    }

    /// Assemble the document without validating it.
    pub fn into_document(self) -> Result<PolicyDocument> {
        if let Some(error) = self.error {
            return Err(PolDiffError::invalid_argument(error));
        }
        let mut doc = self.doc;
        for level in self.levels {
            doc.levels
                .push(level.parse().map_err(PolDiffError::invalid_argument)?);
        }
        for (mut user, level, range) in self.users {
            user.default_level = level
                .map(|l| l.parse().map_err(PolDiffError::invalid_argument))
                .transpose()?;
            user.range = range
                .map(|r| r.parse().map_err(PolDiffError::invalid_argument))
                .transpose()?;
            doc.users.push(user);
        }
        for (source, target, class, range) in self.range_transitions {
            doc.range_transitions.push(RangeTransitionDecl {
                source,
                target,
                class,
                range: range.parse().map_err(PolDiffError::invalid_argument)?,
            });
        }
        Ok(doc)
    }

    /// Validate and index the policy.
    pub fn build(self) -> Result<Policy> {
        Policy::from_document(self.into_document()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_produces_document() {
        let doc = PolicyBuilder::new("tiny")
            .class("file", None, &["read"])
            .type_("a_t", &[])
            .allow("a_t", "self", "file", &["read"])
            .into_document()
            .unwrap();
        assert_eq!(doc.name.as_deref(), Some("tiny"));
        assert_eq!(doc.av_rules.len(), 1);
        assert_eq!(doc.av_rules[0].target, "self");
    }

    #[test]
    fn test_condition_applies_to_next_rule_only() {
        let doc = PolicyBuilder::new("cond")
            .when(&["b1"], true)
            .allow("a_t", "b_t", "file", &["read"])
            .allow("a_t", "b_t", "file", &["write"])
            .into_document()
            .unwrap();
        assert!(doc.av_rules[0].cond.is_some());
        assert!(doc.av_rules[1].cond.is_none());
    }

    #[test]
    fn test_malformed_level_is_an_error() {
        let result = PolicyBuilder::new("bad").level("s0:").into_document();
        assert!(matches!(result, Err(PolDiffError::InvalidArgument(_))));
    }
}
