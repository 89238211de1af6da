//! Declarative policy document.
//!
//! This is the on-disk form of a policy (YAML or JSON). It is a plain data
//! mirror of what a compiled policy exposes through its query interface;
//! [`Policy::from_document`](super::Policy::from_document) validates it and
//! builds the lookup indices the diff engine relies on.
//!
//! ```yaml
//! name: base
//! mls: true
//! commons:
//!   - name: file
//!     perms: [read, write]
//! classes:
//!   - name: file
//!     common: file
//!     perms: [entrypoint]
//! attributes: [domain]
//! types:
//!   - name: httpd_t
//!     attributes: [domain]
//! av_rules:
//!   - kind: allow
//!     source: domain
//!     target: self
//!     class: file
//!     perms: [read]
//! ```

use super::cond::RuleCondition;
use super::mls::{LevelExpr, RangeExpr};
use super::syntax::SyntacticRule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root of a policy document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyDocument {
    /// Display name used in reports
    pub name: Option<String>,
    /// Whether MLS is enabled
    pub mls: bool,
    pub commons: Vec<CommonDecl>,
    pub classes: Vec<ClassDecl>,
    pub attributes: Vec<String>,
    pub types: Vec<TypeDecl>,
    pub roles: Vec<RoleDecl>,
    pub users: Vec<UserDecl>,
    pub booleans: Vec<BoolDecl>,
    /// Sensitivities in dominance order, lowest first
    pub sensitivities: Vec<SymbolDecl>,
    /// Categories in declaration order
    pub categories: Vec<SymbolDecl>,
    /// Level declarations: which categories each sensitivity may carry
    pub levels: Vec<LevelExpr>,
    pub av_rules: Vec<AvRuleDecl>,
    pub te_rules: Vec<TeRuleDecl>,
    pub role_allows: Vec<RoleAllowDecl>,
    pub role_transitions: Vec<RoleTransitionDecl>,
    pub range_transitions: Vec<RangeTransitionDecl>,
    /// Syntactic rules with source line numbers, if the policy was built from source
    pub source_rules: Vec<SyntacticRule>,
}

/// A name with optional aliases. Accepts a bare string or a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SymbolDeclRepr")]
pub struct SymbolDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SymbolDeclRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        aliases: Vec<String>,
    },
}

impl From<SymbolDeclRepr> for SymbolDecl {
    fn from(repr: SymbolDeclRepr) -> Self {
        match repr {
            SymbolDeclRepr::Name(name) => Self {
                name,
                aliases: Vec::new(),
            },
            SymbolDeclRepr::Full { name, aliases } => Self { name, aliases },
        }
    }
}

impl From<&str> for SymbolDecl {
    fn from(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommonDecl {
    pub name: String,
    #[serde(default)]
    pub perms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<String>,
    #[serde(default)]
    pub perms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleDecl {
    pub name: String,
    /// Types or attributes this role may enter
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserDecl {
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_level: Option<LevelExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoolDecl {
    pub name: String,
    #[serde(default)]
    pub default: bool,
}

/// Access vector rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AvRuleKind {
    #[serde(rename = "allow")]
    Allow,
    #[serde(rename = "auditallow")]
    AuditAllow,
    #[serde(rename = "dontaudit")]
    DontAudit,
    #[serde(rename = "neverallow")]
    NeverAllow,
}

impl AvRuleKind {
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::AuditAllow => "auditallow",
            Self::DontAudit => "dontaudit",
            Self::NeverAllow => "neverallow",
        }
    }
}

impl fmt::Display for AvRuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Type enforcement (type rule) kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeRuleKind {
    TypeTransition,
    TypeChange,
    TypeMember,
}

impl TeRuleKind {
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::TypeTransition => "type_transition",
            Self::TypeChange => "type_change",
            Self::TypeMember => "type_member",
        }
    }
}

impl fmt::Display for TeRuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AvRuleDecl {
    pub kind: AvRuleKind,
    pub source: String,
    /// Type, attribute, or `self`
    pub target: String,
    pub class: String,
    pub perms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond: Option<RuleCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeRuleDecl {
    pub kind: TeRuleKind,
    pub source: String,
    pub target: String,
    pub class: String,
    pub default: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond: Option<RuleCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleAllowDecl {
    pub source: String,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleTransitionDecl {
    pub source: String,
    /// Type or attribute
    pub target: String,
    pub default: String,
}

fn default_range_class() -> String {
    "process".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeTransitionDecl {
    pub source: String,
    pub target: String,
    #[serde(default = "default_range_class")]
    pub class: String,
    pub range: RangeExpr,
}
