//! Indexed, validated, read-only policy.
//!
//! A [`Policy`] is what the diff engine queries: it resolves names (including
//! aliases) to policy-local identifiers, expands attributes to their member
//! types and resolves MLS expressions. Every cross-reference in the source
//! document is checked once, when the policy is built.

use super::cond::RuleCondition;
use super::document::{AvRuleKind, PolicyDocument, TeRuleKind};
use super::mls::{CategorySpec, Level, LevelExpr, MlsRange, RangeExpr};
use super::syntax::SyntaxTable;
use crate::error::{ErrorContext, OptionContext, PolDiffError, PolicyQueryKind, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Policy-local handle of a primary type.
///
/// Only meaningful for the policy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(u32);

impl TypeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSymbol {
    pub name: String,
    pub aliases: Vec<String>,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSymbol {
    pub name: String,
    pub members: Vec<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonSymbol {
    pub name: String,
    pub perms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSymbol {
    pub name: String,
    pub common: Option<String>,
    pub perms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSymbol {
    pub name: String,
    /// Member types with attributes expanded, sorted
    pub types: Vec<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSymbol {
    pub name: String,
    pub roles: Vec<String>,
    pub default_level: Option<Level>,
    pub range: Option<MlsRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolSymbol {
    pub name: String,
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitivitySymbol {
    pub name: String,
    pub aliases: Vec<String>,
    /// Categories a level with this sensitivity may carry
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySymbol {
    pub name: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvRule {
    pub kind: AvRuleKind,
    pub source: String,
    pub target: String,
    pub class: String,
    pub perms: Vec<String>,
    pub cond: Option<RuleCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeRule {
    pub kind: TeRuleKind,
    pub source: String,
    pub target: String,
    pub class: String,
    pub default: TypeId,
    pub cond: Option<RuleCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAllow {
    pub source: String,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTransition {
    pub source: String,
    pub target: String,
    pub default: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeTransition {
    pub source: String,
    pub target: String,
    pub class: String,
    pub range: MlsRange,
}

/// The target keyword that stands for the rule's own source type.
pub const SELF_TARGET: &str = "self";

/// A loaded policy.
#[derive(Debug, Clone)]
pub struct Policy {
    name: String,
    mls: bool,
    commons: IndexMap<String, CommonSymbol>,
    classes: IndexMap<String, ClassSymbol>,
    types: Vec<TypeSymbol>,
    type_lookup: HashMap<String, TypeId>,
    attributes: IndexMap<String, AttributeSymbol>,
    roles: IndexMap<String, RoleSymbol>,
    users: IndexMap<String, UserSymbol>,
    booleans: IndexMap<String, BoolSymbol>,
    sensitivities: IndexMap<String, SensitivitySymbol>,
    sensitivity_aliases: HashMap<String, String>,
    categories: IndexMap<String, CategorySymbol>,
    category_aliases: HashMap<String, String>,
    av_rules: Vec<AvRule>,
    te_rules: Vec<TeRule>,
    role_allows: Vec<RoleAllow>,
    role_transitions: Vec<RoleTransition>,
    range_transitions: Vec<RangeTransition>,
    syntax: SyntaxTable,
    fingerprint: u64,
}

fn duplicate(kind: &'static str, name: &str) -> PolDiffError {
    PolDiffError::policy_query(
        format!("declaration of {kind} {name}"),
        PolicyQueryKind::Duplicate {
            kind,
            name: name.to_string(),
        },
    )
}

fn invalid_mls(value: impl fmt::Display, reason: impl Into<String>) -> PolDiffError {
    let value = value.to_string();
    PolDiffError::policy_query(
        format!("resolving {value}"),
        PolicyQueryKind::InvalidMls {
            value,
            reason: reason.into(),
        },
    )
}

impl Policy {
    /// Validate a document and build the lookup indices.
    pub fn from_document(doc: PolicyDocument) -> Result<Self> {
        let fingerprint = xxhash_rust::xxh3::xxh3_64(&serde_json::to_vec(&doc)?);

        let mut policy = Self {
            name: doc.name.clone().unwrap_or_else(|| "policy".to_string()),
            mls: doc.mls,
            commons: IndexMap::new(),
            classes: IndexMap::new(),
            types: Vec::with_capacity(doc.types.len()),
            type_lookup: HashMap::new(),
            attributes: IndexMap::new(),
            roles: IndexMap::new(),
            users: IndexMap::new(),
            booleans: IndexMap::new(),
            sensitivities: IndexMap::new(),
            sensitivity_aliases: HashMap::new(),
            categories: IndexMap::new(),
            category_aliases: HashMap::new(),
            av_rules: Vec::with_capacity(doc.av_rules.len()),
            te_rules: Vec::with_capacity(doc.te_rules.len()),
            role_allows: Vec::new(),
            role_transitions: Vec::new(),
            range_transitions: Vec::new(),
            syntax: SyntaxTable::new(doc.source_rules),
            fingerprint,
        };

        for common in doc.commons {
            if policy.commons.contains_key(&common.name) {
                return Err(duplicate("common", &common.name));
            }
            policy.commons.insert(
                common.name.clone(),
                CommonSymbol {
                    name: common.name,
                    perms: sorted_unique(common.perms),
                },
            );
        }

        for class in doc.classes {
            if policy.classes.contains_key(&class.name) {
                return Err(duplicate("class", &class.name));
            }
            if let Some(common) = &class.common {
                policy
                    .commons
                    .get(common)
                    .or_unknown("common", common)
                    .with_context(|| format!("class {}", class.name))?;
            }
            policy.classes.insert(
                class.name.clone(),
                ClassSymbol {
                    name: class.name,
                    common: class.common,
                    perms: sorted_unique(class.perms),
                },
            );
        }

        for attr in doc.attributes {
            if policy.attributes.contains_key(&attr) {
                return Err(duplicate("attribute", &attr));
            }
            policy.attributes.insert(
                attr.clone(),
                AttributeSymbol {
                    name: attr,
                    members: Vec::new(),
                },
            );
        }

        for decl in doc.types {
            let id = TypeId::from_index(policy.types.len());
            for name in std::iter::once(&decl.name).chain(decl.aliases.iter()) {
                if policy.type_lookup.contains_key(name) || policy.attributes.contains_key(name) {
                    return Err(duplicate("type", name));
                }
                policy.type_lookup.insert(name.clone(), id);
            }
            for attr in &decl.attributes {
                let symbol = policy
                    .attributes
                    .get_mut(attr)
                    .or_unknown("attribute", attr)
                    .with_context(|| format!("type {}", decl.name))?;
                symbol.members.push(id);
            }
            policy.types.push(TypeSymbol {
                name: decl.name,
                aliases: decl.aliases,
                attributes: sorted_unique(decl.attributes),
            });
        }
        for attr in policy.attributes.values_mut() {
            attr.members.sort();
            attr.members.dedup();
        }

        for role in doc.roles {
            if policy.roles.contains_key(&role.name) {
                return Err(duplicate("role", &role.name));
            }
            let mut types = Vec::new();
            for name in &role.types {
                types.extend(
                    policy
                        .expand_type_set(name)
                        .with_context(|| format!("role {}", role.name))?,
                );
            }
            types.sort();
            types.dedup();
            policy.roles.insert(
                role.name.clone(),
                RoleSymbol {
                    name: role.name,
                    types,
                },
            );
        }

        for boolean in doc.booleans {
            if policy.booleans.contains_key(&boolean.name) {
                return Err(duplicate("boolean", &boolean.name));
            }
            policy.booleans.insert(
                boolean.name.clone(),
                BoolSymbol {
                    name: boolean.name,
                    default: boolean.default,
                },
            );
        }

        for sens in doc.sensitivities {
            if policy.sensitivities.contains_key(&sens.name) {
                return Err(duplicate("sensitivity", &sens.name));
            }
            for alias in &sens.aliases {
                policy
                    .sensitivity_aliases
                    .insert(alias.clone(), sens.name.clone());
            }
            policy.sensitivities.insert(
                sens.name.clone(),
                SensitivitySymbol {
                    name: sens.name,
                    aliases: sens.aliases,
                    categories: Vec::new(),
                },
            );
        }

        for cat in doc.categories {
            if policy.categories.contains_key(&cat.name) {
                return Err(duplicate("category", &cat.name));
            }
            for alias in &cat.aliases {
                policy
                    .category_aliases
                    .insert(alias.clone(), cat.name.clone());
            }
            policy.categories.insert(
                cat.name.clone(),
                CategorySymbol {
                    name: cat.name,
                    aliases: cat.aliases,
                },
            );
        }

        for expr in &doc.levels {
            let level = policy.resolve_level(expr)?;
            if let Some(sens) = policy.sensitivities.get_mut(&level.sensitivity) {
                sens.categories = level.categories;
            }
        }

        for user in doc.users {
            if policy.users.contains_key(&user.name) {
                return Err(duplicate("user", &user.name));
            }
            for role in &user.roles {
                policy
                    .roles
                    .get(role)
                    .or_unknown("role", role)
                    .with_context(|| format!("user {}", user.name))?;
            }
            let default_level = user
                .default_level
                .as_ref()
                .map(|l| policy.resolve_level(l))
                .transpose()
                .with_context(|| format!("default level of user {}", user.name))?;
            let range = user
                .range
                .as_ref()
                .map(|r| policy.resolve_range(r))
                .transpose()
                .with_context(|| format!("range of user {}", user.name))?;
            policy.users.insert(
                user.name.clone(),
                UserSymbol {
                    name: user.name,
                    roles: sorted_unique(user.roles),
                    default_level,
                    range,
                },
            );
        }

        for (index, rule) in doc.av_rules.into_iter().enumerate() {
            let context = || format!("{} rule {index}", rule.kind);
            policy.expand_type_set(&rule.source).with_context(context)?;
            if rule.target != SELF_TARGET {
                policy.expand_type_set(&rule.target).with_context(context)?;
            }
            let class_perms = policy.class_perms(&rule.class).with_context(context)?;
            for perm in &rule.perms {
                if !class_perms.contains(perm) {
                    return Err(PolDiffError::unknown_symbol("permission", perm))
                        .with_context(|| format!("{} on class {}", context(), rule.class));
                }
            }
            if let Some(cond) = &rule.cond {
                policy.check_condition(cond).with_context(context)?;
            }
            policy.av_rules.push(AvRule {
                kind: rule.kind,
                source: rule.source,
                target: rule.target,
                class: rule.class,
                perms: sorted_unique(rule.perms),
                cond: rule.cond,
            });
        }

        for (index, rule) in doc.te_rules.into_iter().enumerate() {
            let context = || format!("{} rule {index}", rule.kind);
            policy.expand_type_set(&rule.source).with_context(context)?;
            if rule.target != SELF_TARGET {
                policy.expand_type_set(&rule.target).with_context(context)?;
            }
            policy
                .classes
                .get(&rule.class)
                .or_unknown("class", &rule.class)
                .with_context(context)?;
            let default = policy.single_type(&rule.default).with_context(context)?;
            if let Some(cond) = &rule.cond {
                policy.check_condition(cond).with_context(context)?;
            }
            policy.te_rules.push(TeRule {
                kind: rule.kind,
                source: rule.source,
                target: rule.target,
                class: rule.class,
                default,
                cond: rule.cond,
            });
        }

        for rule in doc.role_allows {
            for role in std::iter::once(&rule.source).chain(rule.targets.iter()) {
                policy
                    .roles
                    .get(role)
                    .or_unknown("role", role)
                    .context("role allow rule")?;
            }
            policy.role_allows.push(RoleAllow {
                source: rule.source,
                targets: sorted_unique(rule.targets),
            });
        }

        for rule in doc.role_transitions {
            for role in [&rule.source, &rule.default] {
                policy
                    .roles
                    .get(role)
                    .or_unknown("role", role)
                    .context("role transition rule")?;
            }
            policy
                .expand_type_set(&rule.target)
                .context("role transition rule")?;
            policy.role_transitions.push(RoleTransition {
                source: rule.source,
                target: rule.target,
                default: rule.default,
            });
        }

        for rule in doc.range_transitions {
            policy
                .expand_type_set(&rule.source)
                .context("range transition rule")?;
            policy
                .expand_type_set(&rule.target)
                .context("range transition rule")?;
            policy
                .classes
                .get(&rule.class)
                .or_unknown("class", &rule.class)
                .context("range transition rule")?;
            let range = policy
                .resolve_range(&rule.range)
                .context("range transition rule")?;
            policy.range_transitions.push(RangeTransition {
                source: rule.source,
                target: rule.target,
                class: rule.class,
                range,
            });
        }

        tracing::debug!(
            "Loaded policy {}: {} types, {} attributes, {} av rules, {} type rules",
            policy.name,
            policy.types.len(),
            policy.attributes.len(),
            policy.av_rules.len(),
            policy.te_rules.len()
        );

        Ok(policy)
    }

    fn check_condition(&self, cond: &RuleCondition) -> Result<()> {
        for name in cond.expr.booleans() {
            self.booleans.get(&name).or_unknown("boolean", &name)?;
        }
        cond.key()
            .map_err(|kind| PolDiffError::policy_query("conditional expression", kind))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_mls(&self) -> bool {
        self.mls
    }

    /// Content hash of the source document.
    #[must_use]
    pub const fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    // ------------------------------------------------------------------
    // Types and attributes
    // ------------------------------------------------------------------

    /// All primary types in declaration order.
    pub fn types(&self) -> impl Iterator<Item = (TypeId, &TypeSymbol)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeId::from_index(i), t))
    }

    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn type_symbol(&self, id: TypeId) -> Option<&TypeSymbol> {
        self.types.get(id.index())
    }

    /// Name of a primary type. Unknown ids render as their number.
    #[must_use]
    pub fn type_name(&self, id: TypeId) -> String {
        self.types
            .get(id.index())
            .map_or_else(|| id.to_string(), |t| t.name.clone())
    }

    /// Resolve a primary type name or alias.
    #[must_use]
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.type_lookup.get(name).copied()
    }

    /// Resolve a name only if it is a primary type (not an alias).
    #[must_use]
    pub fn primary_type(&self, name: &str) -> Option<TypeId> {
        self.type_id(name)
            .filter(|id| self.types.get(id.index()).is_some_and(|t| t.name == name))
    }

    #[must_use]
    pub fn is_alias(&self, name: &str) -> bool {
        self.type_id(name).is_some() && self.primary_type(name).is_none()
    }

    #[must_use]
    pub fn is_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeSymbol> {
        self.attributes.values()
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeSymbol> {
        self.attributes.get(name)
    }

    /// Expand a type, alias or attribute name into primary types.
    ///
    /// An attribute without members expands to an empty set.
    pub fn expand_type_set(&self, name: &str) -> Result<Vec<TypeId>> {
        if let Some(id) = self.type_id(name) {
            return Ok(vec![id]);
        }
        self.attributes
            .get(name)
            .map(|a| a.members.clone())
            .or_unknown("type or attribute", name)
    }

    /// Resolve a name that must denote exactly one type.
    pub fn single_type(&self, name: &str) -> Result<TypeId> {
        if self.is_attribute(name) {
            return Err(PolDiffError::policy_query(
                format!("resolving {name}"),
                PolicyQueryKind::AttributeNotAllowed(name.to_string()),
            ));
        }
        self.type_id(name).or_unknown("type", name)
    }

    // ------------------------------------------------------------------
    // Classes and commons
    // ------------------------------------------------------------------

    pub fn classes(&self) -> impl Iterator<Item = &ClassSymbol> {
        self.classes.values()
    }

    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassSymbol> {
        self.classes.get(name)
    }

    /// Permissions of a class including those inherited from its common.
    pub fn class_perms(&self, name: &str) -> Result<Vec<String>> {
        let class = self.classes.get(name).or_unknown("class", name)?;
        let mut perms = class.perms.clone();
        if let Some(common) = &class.common {
            let common = self.commons.get(common).or_unknown("common", common)?;
            perms.extend(common.perms.iter().cloned());
        }
        Ok(sorted_unique(perms))
    }

    pub fn commons(&self) -> impl Iterator<Item = &CommonSymbol> {
        self.commons.values()
    }

    // ------------------------------------------------------------------
    // RBAC, users and booleans
    // ------------------------------------------------------------------

    pub fn roles(&self) -> impl Iterator<Item = &RoleSymbol> {
        self.roles.values()
    }

    #[must_use]
    pub fn role(&self, name: &str) -> Option<&RoleSymbol> {
        self.roles.get(name)
    }

    pub fn users(&self) -> impl Iterator<Item = &UserSymbol> {
        self.users.values()
    }

    pub fn booleans(&self) -> impl Iterator<Item = &BoolSymbol> {
        self.booleans.values()
    }

    // ------------------------------------------------------------------
    // MLS
    // ------------------------------------------------------------------

    /// Sensitivities in dominance order, lowest first.
    pub fn sensitivities(&self) -> impl Iterator<Item = &SensitivitySymbol> {
        self.sensitivities.values()
    }

    /// Position of a sensitivity (or sensitivity alias) in dominance order.
    #[must_use]
    pub fn sensitivity_rank(&self, name: &str) -> Option<usize> {
        let name = self
            .sensitivity_aliases
            .get(name)
            .map_or(name, String::as_str);
        self.sensitivities.get_index_of(name)
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategorySymbol> {
        self.categories.values()
    }

    fn canonical_category<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.categories.contains_key(name) {
            return Some(name);
        }
        self.category_aliases.get(name).map(String::as_str)
    }

    /// Resolve a level expression against this policy's categories.
    pub fn resolve_level(&self, expr: &LevelExpr) -> Result<Level> {
        let rank = self
            .sensitivity_rank(&expr.sensitivity)
            .ok_or_else(|| invalid_mls(expr, format!("unknown sensitivity {}", expr.sensitivity)))?;
        let sensitivity = self
            .sensitivities
            .get_index(rank)
            .map(|(name, _)| name.clone())
            .ok_or_else(|| invalid_mls(expr, "sensitivity index out of range"))?;

        let mut positions = Vec::new();
        for spec in &expr.categories {
            match spec {
                CategorySpec::Single(name) => {
                    let name = self
                        .canonical_category(name)
                        .ok_or_else(|| invalid_mls(expr, format!("unknown category {name}")))?;
                    positions.extend(self.categories.get_index_of(name));
                }
                CategorySpec::Span(first, last) => {
                    let lookup = |name: &str| {
                        self.canonical_category(name)
                            .and_then(|n| self.categories.get_index_of(n))
                            .ok_or_else(|| invalid_mls(expr, format!("unknown category {name}")))
                    };
                    let (from, to) = (lookup(first)?, lookup(last)?);
                    if from > to {
                        return Err(invalid_mls(
                            expr,
                            format!("category span {first}.{last} is reversed"),
                        ));
                    }
                    positions.extend(from..=to);
                }
            }
        }
        positions.sort_unstable();
        positions.dedup();
        let categories = positions
            .into_iter()
            .filter_map(|i| self.categories.get_index(i).map(|(name, _)| name.clone()))
            .collect();

        Ok(Level {
            sensitivity,
            categories,
        })
    }

    /// Resolve a range expression; the high level must dominate the low one.
    pub fn resolve_range(&self, expr: &RangeExpr) -> Result<MlsRange> {
        let low = self.resolve_level(&expr.low)?;
        let high = self.resolve_level(&expr.high)?;
        let low_rank = self.sensitivity_rank(&low.sensitivity).unwrap_or_default();
        let high_rank = self.sensitivity_rank(&high.sensitivity).unwrap_or_default();
        if high_rank < low_rank || !high.covers_categories(&low) {
            return Err(invalid_mls(expr, "high level does not dominate low level"));
        }
        Ok(MlsRange { low, high })
    }

    /// Every level inside a range, one per sensitivity from low to high.
    ///
    /// Each level carries the categories of the range's high level that the
    /// sensitivity is declared to accept (all of them when it has no level
    /// declaration).
    #[must_use]
    pub fn levels_in_range(&self, range: &MlsRange) -> Vec<Level> {
        let (Some(low), Some(high)) = (
            self.sensitivity_rank(&range.low.sensitivity),
            self.sensitivity_rank(&range.high.sensitivity),
        ) else {
            return vec![range.low.clone(), range.high.clone()];
        };
        (low..=high)
            .filter_map(|rank| self.sensitivities.get_index(rank))
            .map(|(name, sens)| {
                let categories = range
                    .high
                    .categories
                    .iter()
                    .filter(|c| sens.categories.is_empty() || sens.categories.contains(*c))
                    .cloned()
                    .collect();
                Level::new(name.clone(), categories)
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    #[must_use]
    pub fn av_rules(&self) -> &[AvRule] {
        &self.av_rules
    }

    #[must_use]
    pub fn te_rules(&self) -> &[TeRule] {
        &self.te_rules
    }

    #[must_use]
    pub fn role_allows(&self) -> &[RoleAllow] {
        &self.role_allows
    }

    #[must_use]
    pub fn role_transitions(&self) -> &[RoleTransition] {
        &self.role_transitions
    }

    #[must_use]
    pub fn range_transitions(&self) -> &[RangeTransition] {
        &self.range_transitions
    }

    /// Syntactic rules shipped with the policy (may be empty).
    #[must_use]
    pub const fn syntax(&self) -> &SyntaxTable {
        &self.syntax
    }
}

/// Sort and deduplicate a list of names.
pub(crate) fn sorted_unique(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PolicyBuilder;

    fn sample() -> Policy {
        PolicyBuilder::new("sample")
            .mls(true)
            .common("file", &["read", "write"])
            .class("file", Some("file"), &["entrypoint"])
            .class("process", None, &["transition"])
            .attribute("domain")
            .type_with_aliases("httpd_t", &["apache_t"], &["domain"])
            .type_("init_t", &["domain"])
            .type_("etc_t", &[])
            .sensitivity("s0")
            .sensitivity("s1")
            .categories(&["c0", "c1", "c2", "c3"])
            .level("s0:c0.c1")
            .level("s1:c0.c3")
            .build()
            .unwrap()
    }

    #[test]
    fn test_type_lookup_handles_aliases() {
        let policy = sample();
        let httpd = policy.type_id("httpd_t").unwrap();
        assert_eq!(policy.type_id("apache_t"), Some(httpd));
        assert_eq!(policy.primary_type("apache_t"), None);
        assert!(policy.is_alias("apache_t"));
        assert!(!policy.is_alias("httpd_t"));
    }

    #[test]
    fn test_attribute_expansion() {
        let policy = sample();
        let members = policy.expand_type_set("domain").unwrap();
        let names: Vec<String> = members.iter().map(|id| policy.type_name(*id)).collect();
        assert_eq!(names, vec!["httpd_t", "init_t"]);
        assert!(policy.expand_type_set("nonexistent_t").is_err());
        assert!(policy.single_type("domain").is_err());
    }

    #[test]
    fn test_class_perms_include_common() {
        let policy = sample();
        assert_eq!(
            policy.class_perms("file").unwrap(),
            vec!["entrypoint", "read", "write"]
        );
    }

    #[test]
    fn test_resolve_level_expands_spans() {
        let policy = sample();
        let level = policy.resolve_level(&"s1:c3,c0.c1".parse().unwrap()).unwrap();
        assert_eq!(level.categories, vec!["c0", "c1", "c3"]);
        assert!(policy.resolve_level(&"s9".parse().unwrap()).is_err());
        assert!(policy.resolve_level(&"s0:c3.c1".parse().unwrap()).is_err());
    }

    #[test]
    fn test_levels_in_range_respect_declarations() {
        let policy = sample();
        let range = policy.resolve_range(&"s0 - s1:c0.c3".parse().unwrap()).unwrap();
        let levels = policy.levels_in_range(&range);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].to_string(), "s0:c0,c1");
        assert_eq!(levels[1].to_string(), "s1:c0,c1,c2,c3");
    }

    #[test]
    fn test_range_must_be_ordered() {
        let policy = sample();
        assert!(policy.resolve_range(&"s1 - s0".parse().unwrap()).is_err());
    }

    #[test]
    fn test_unknown_permission_rejected() {
        let result = PolicyBuilder::new("bad")
            .class("file", None, &["read"])
            .type_("a_t", &[])
            .allow("a_t", "a_t", "file", &["write"])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_fingerprint_is_content_based() {
        assert_eq!(sample().fingerprint(), sample().fingerprint());
        let other = PolicyBuilder::new("other").build().unwrap();
        assert_ne!(sample().fingerprint(), other.fingerprint());
    }
}
