//! Diff categories and category masks.
//!
//! Every kind of policy symbol or rule that can be compared is a
//! [`Category`]. Callers select what to compute with a [`CategoryMask`], whose
//! bit values are stable and match the classic `POLDIFF_DIFF_*` constants.

use crate::error::{PolDiffError, Result};
use crate::model::{AvRuleKind, TeRuleKind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// A single diffable category.
///
/// Variants are listed in run order: symbols first, then rules.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Classes,
    Commons,
    Types,
    Attributes,
    Roles,
    Users,
    Booleans,
    Levels,
    Categories,
    AvAllow,
    AvAuditAllow,
    AvDontAudit,
    AvNeverAllow,
    TeChange,
    TeMember,
    TeTransition,
    RoleAllows,
    RoleTransitions,
    RangeTransitions,
}

impl Category {
    /// Every category in run order.
    pub const ALL: [Self; 19] = [
        Self::Classes,
        Self::Commons,
        Self::Types,
        Self::Attributes,
        Self::Roles,
        Self::Users,
        Self::Booleans,
        Self::Levels,
        Self::Categories,
        Self::AvAllow,
        Self::AvAuditAllow,
        Self::AvDontAudit,
        Self::AvNeverAllow,
        Self::TeChange,
        Self::TeMember,
        Self::TeTransition,
        Self::RoleAllows,
        Self::RoleTransitions,
        Self::RangeTransitions,
    ];

    /// The category's bit in a [`CategoryMask`].
    #[must_use]
    pub const fn bit(self) -> u32 {
        match self {
            Self::Classes => 0x0000_0001,
            Self::Commons => 0x0000_0002,
            Self::Types => 0x0000_0004,
            Self::Attributes => 0x0000_0008,
            Self::Roles => 0x0000_0010,
            Self::Users => 0x0000_0020,
            Self::Booleans => 0x0000_0040,
            Self::Levels => 0x0000_0080,
            Self::Categories => 0x0000_0100,
            Self::RoleAllows => 0x0000_0800,
            Self::RoleTransitions => 0x0000_1000,
            Self::RangeTransitions => 0x0000_2000,
            Self::TeChange => 0x0100_0000,
            Self::TeMember => 0x0200_0000,
            Self::TeTransition => 0x0400_0000,
            Self::AvAllow => 0x1000_0000,
            Self::AvAuditAllow => 0x2000_0000,
            Self::AvDontAudit => 0x4000_0000,
            Self::AvNeverAllow => 0x8000_0000,
        }
    }

    /// Machine name, as used on the command line and in config files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Classes => "classes",
            Self::Commons => "commons",
            Self::Types => "types",
            Self::Attributes => "attributes",
            Self::Roles => "roles",
            Self::Users => "users",
            Self::Booleans => "booleans",
            Self::Levels => "levels",
            Self::Categories => "categories",
            Self::AvAllow => "av-allow",
            Self::AvAuditAllow => "av-audit-allow",
            Self::AvDontAudit => "av-dont-audit",
            Self::AvNeverAllow => "av-never-allow",
            Self::TeChange => "te-change",
            Self::TeMember => "te-member",
            Self::TeTransition => "te-transition",
            Self::RoleAllows => "role-allows",
            Self::RoleTransitions => "role-transitions",
            Self::RangeTransitions => "range-transitions",
        }
    }

    /// Human-readable heading for reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Classes => "Classes",
            Self::Commons => "Commons",
            Self::Types => "Types",
            Self::Attributes => "Attributes",
            Self::Roles => "Roles",
            Self::Users => "Users",
            Self::Booleans => "Booleans",
            Self::Levels => "Levels",
            Self::Categories => "Categories",
            Self::AvAllow => "Allow Rules",
            Self::AvAuditAllow => "Auditallow Rules",
            Self::AvDontAudit => "Dontaudit Rules",
            Self::AvNeverAllow => "Neverallow Rules",
            Self::TeChange => "Type_change Rules",
            Self::TeMember => "Type_member Rules",
            Self::TeTransition => "Type_transition Rules",
            Self::RoleAllows => "Role Allow Rules",
            Self::RoleTransitions => "Role Transitions",
            Self::RangeTransitions => "Range Transitions",
        }
    }

    /// The access vector rule kind this category compares, if any.
    #[must_use]
    pub const fn av_kind(self) -> Option<AvRuleKind> {
        match self {
            Self::AvAllow => Some(AvRuleKind::Allow),
            Self::AvAuditAllow => Some(AvRuleKind::AuditAllow),
            Self::AvDontAudit => Some(AvRuleKind::DontAudit),
            Self::AvNeverAllow => Some(AvRuleKind::NeverAllow),
            _ => None,
        }
    }

    /// The type rule kind this category compares, if any.
    #[must_use]
    pub const fn te_kind(self) -> Option<TeRuleKind> {
        match self {
            Self::TeChange => Some(TeRuleKind::TypeChange),
            Self::TeMember => Some(TeRuleKind::TypeMember),
            Self::TeTransition => Some(TeRuleKind::TypeTransition),
            _ => None,
        }
    }

    #[must_use]
    pub const fn from_av_kind(kind: AvRuleKind) -> Self {
        match kind {
            AvRuleKind::Allow => Self::AvAllow,
            AvRuleKind::AuditAllow => Self::AvAuditAllow,
            AvRuleKind::DontAudit => Self::AvDontAudit,
            AvRuleKind::NeverAllow => Self::AvNeverAllow,
        }
    }

    #[must_use]
    pub const fn from_te_kind(kind: TeRuleKind) -> Self {
        match kind {
            TeRuleKind::TypeChange => Self::TeChange,
            TeRuleKind::TypeMember => Self::TeMember,
            TeRuleKind::TypeTransition => Self::TeTransition,
        }
    }

    /// Whether results of this category depend on the type map.
    #[must_use]
    pub const fn is_remapped(self) -> bool {
        CategoryMask::REMAPPED.bits() & self.bit() != 0
    }

    /// Whether items of this category can be annotated with source lines.
    #[must_use]
    pub const fn supports_line_numbers(self) -> bool {
        self.av_kind().is_some() || self.te_kind().is_some()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|c| c.name() == normalized)
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// A set of categories as a bit mask.
///
/// Arbitrary bits can be represented so that callers passing raw values get a
/// proper error from [`DiffSession::run`](super::DiffSession::run) instead of
/// silent truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMask(u32);

impl CategoryMask {
    pub const NONE: Self = Self(0);
    pub const CLASSES: Self = Self(Category::Classes.bit());
    pub const COMMONS: Self = Self(Category::Commons.bit());
    pub const TYPES: Self = Self(Category::Types.bit());
    pub const ATTRIBS: Self = Self(Category::Attributes.bit());
    pub const ROLES: Self = Self(Category::Roles.bit());
    pub const USERS: Self = Self(Category::Users.bit());
    pub const BOOLS: Self = Self(Category::Booleans.bit());
    pub const LEVELS: Self = Self(Category::Levels.bit());
    pub const CATS: Self = Self(Category::Categories.bit());
    pub const ROLE_ALLOWS: Self = Self(Category::RoleAllows.bit());
    pub const ROLE_TRANS: Self = Self(Category::RoleTransitions.bit());
    pub const RANGE_TRANS: Self = Self(Category::RangeTransitions.bit());
    pub const TECHANGE: Self = Self(Category::TeChange.bit());
    pub const TEMEMBER: Self = Self(Category::TeMember.bit());
    pub const TETRANS: Self = Self(Category::TeTransition.bit());
    pub const AVALLOW: Self = Self(Category::AvAllow.bit());
    pub const AVAUDITALLOW: Self = Self(Category::AvAuditAllow.bit());
    pub const AVDONTAUDIT: Self = Self(Category::AvDontAudit.bit());
    pub const AVNEVERALLOW: Self = Self(Category::AvNeverAllow.bit());

    pub const AVRULES: Self =
        Self(Self::AVALLOW.0 | Self::AVAUDITALLOW.0 | Self::AVDONTAUDIT.0 | Self::AVNEVERALLOW.0);
    pub const TERULES: Self = Self(Self::TECHANGE.0 | Self::TEMEMBER.0 | Self::TETRANS.0);
    pub const SYMBOLS: Self = Self(
        Self::CLASSES.0
            | Self::COMMONS.0
            | Self::TYPES.0
            | Self::ATTRIBS.0
            | Self::ROLES.0
            | Self::USERS.0
            | Self::BOOLS.0
            | Self::LEVELS.0
            | Self::CATS.0,
    );
    pub const RULES: Self = Self(
        Self::AVRULES.0
            | Self::TERULES.0
            | Self::ROLE_ALLOWS.0
            | Self::ROLE_TRANS.0
            | Self::RANGE_TRANS.0,
    );
    pub const RBAC: Self = Self(Self::ROLES.0 | Self::ROLE_ALLOWS.0 | Self::ROLE_TRANS.0);
    pub const MLS: Self = Self(Self::LEVELS.0 | Self::CATS.0 | Self::RANGE_TRANS.0);
    /// Categories whose results depend on the type map
    pub const REMAPPED: Self = Self(
        Self::TYPES.0
            | Self::ATTRIBS.0
            | Self::ROLES.0
            | Self::AVRULES.0
            | Self::TERULES.0
            | Self::ROLE_TRANS.0
            | Self::RANGE_TRANS.0,
    );
    pub const ALL: Self = Self(Self::SYMBOLS.0 | Self::RULES.0);

    /// Wrap raw bits without validation.
    #[must_use]
    pub const fn from_bits_retain(bits: u32) -> Self {
        Self(bits)
    }

    /// Wrap raw bits, rejecting bits that name no category.
    pub fn from_bits(bits: u32) -> Result<Self> {
        let mask = Self(bits);
        mask.validate()?;
        Ok(mask)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bits that do not correspond to any category.
    #[must_use]
    pub const fn unknown_bits(self) -> u32 {
        self.0 & !Self::ALL.0
    }

    pub fn validate(self) -> Result<()> {
        match self.unknown_bits() {
            0 => Ok(()),
            bits => Err(PolDiffError::invalid_argument(format!(
                "unknown category bits {bits:#010x} in mask {:#010x}",
                self.0
            ))),
        }
    }

    #[must_use]
    pub const fn contains(self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }

    /// Categories in this mask, in run order.
    pub fn categories(self) -> impl Iterator<Item = Category> {
        Category::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl From<Category> for CategoryMask {
    fn from(category: Category) -> Self {
        Self(category.bit())
    }
}

impl FromIterator<Category> for CategoryMask {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, |mask, c| mask | c)
    }
}

impl<T: Into<Self>> BitOr<T> for CategoryMask {
    type Output = Self;

    fn bitor(self, rhs: T) -> Self {
        Self(self.0 | rhs.into().0)
    }
}

impl<T: Into<Self>> BitOrAssign<T> for CategoryMask {
    fn bitor_assign(&mut self, rhs: T) {
        self.0 |= rhs.into().0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_are_distinct() {
        let mut seen = 0u32;
        for category in Category::ALL {
            assert_eq!(seen & category.bit(), 0, "{category} reuses a bit");
            seen |= category.bit();
        }
        assert_eq!(seen, CategoryMask::ALL.bits());
    }

    #[test]
    fn test_groups() {
        assert_eq!(CategoryMask::AVRULES.categories().count(), 4);
        assert_eq!(CategoryMask::TERULES.categories().count(), 3);
        assert!(CategoryMask::RBAC.contains(Category::RoleTransitions));
        assert!(!CategoryMask::SYMBOLS.contains(Category::AvAllow));
        assert!(Category::AvAllow.is_remapped());
        assert!(!Category::Booleans.is_remapped());
    }

    #[test]
    fn test_unknown_bits_rejected() {
        assert!(CategoryMask::from_bits(0x0000_0400).is_err());
        assert!(CategoryMask::from_bits(CategoryMask::ALL.bits()).is_ok());
        assert_eq!(CategoryMask::from_bits_retain(0x0000_0401).unknown_bits(), 0x400);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("av-allow".parse::<Category>(), Ok(Category::AvAllow));
        assert_eq!("TE_TRANSITION".parse::<Category>(), Ok(Category::TeTransition));
        assert!("bogus".parse::<Category>().is_err());
    }

    #[test]
    fn test_mask_collects_categories() {
        let mask: CategoryMask = [Category::Types, Category::Roles].into_iter().collect();
        assert_eq!(mask, CategoryMask::TYPES | CategoryMask::ROLES);
        let order: Vec<Category> = (CategoryMask::ROLES | Category::Classes).categories().collect();
        assert_eq!(order, vec![Category::Classes, Category::Roles]);
    }
}
