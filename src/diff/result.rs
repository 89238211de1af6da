//! Diff result types.

use super::categories::{
    AttributeDiff, AvRuleDiff, BoolDiff, CatDiff, ClassDiff, CommonDiff, LevelDiff, RangeTransDiff,
    RoleAllowDiff, RoleDiff, RoleTransDiff, TeRuleDiff, TypeDiff, UserDiff,
};
use super::Category;
use serde::Serialize;
use std::fmt;
use std::ops::{Add, AddAssign};

/// How an item differs between the two policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffForm {
    /// Only in the modified policy
    Added,
    /// Only in the original policy
    Removed,
    /// In both, with different content
    Modified,
    /// Only in the modified policy because a type it uses was added
    AddedDueToType,
    /// Only in the original policy because a type it uses was removed
    RemovedDueToType,
}

impl DiffForm {
    /// Prefix character used in rendered output.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Added | Self::AddedDueToType => '+',
            Self::Removed | Self::RemovedDueToType => '-',
            Self::Modified => '*',
        }
    }

    /// Whether the item exists only in the modified policy.
    #[must_use]
    pub const fn is_added(self) -> bool {
        matches!(self, Self::Added | Self::AddedDueToType)
    }

    /// Whether the item exists only in the original policy.
    #[must_use]
    pub const fn is_removed(self) -> bool {
        matches!(self, Self::Removed | Self::RemovedDueToType)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::Removed => "Removed",
            Self::Modified => "Modified",
            Self::AddedDueToType => "Added because of new type",
            Self::RemovedDueToType => "Removed because of missing type",
        }
    }
}

impl fmt::Display for DiffForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-form item counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub added_due_to_type: usize,
    pub removed_due_to_type: usize,
}

impl Stats {
    pub fn record(&mut self, form: DiffForm) {
        match form {
            DiffForm::Added => self.added += 1,
            DiffForm::Removed => self.removed += 1,
            DiffForm::Modified => self.modified += 1,
            DiffForm::AddedDueToType => self.added_due_to_type += 1,
            DiffForm::RemovedDueToType => self.removed_due_to_type += 1,
        }
    }

    /// Counts as `[added, removed, modified, added_due_to_type, removed_due_to_type]`.
    #[must_use]
    pub const fn as_array(&self) -> [usize; 5] {
        [
            self.added,
            self.removed,
            self.modified,
            self.added_due_to_type,
            self.removed_due_to_type,
        ]
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.added + self.removed + self.modified + self.added_due_to_type + self.removed_due_to_type
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl Add for Stats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            added: self.added + rhs.added,
            removed: self.removed + rhs.removed,
            modified: self.modified + rhs.modified,
            added_due_to_type: self.added_due_to_type + rhs.added_due_to_type,
            removed_due_to_type: self.removed_due_to_type + rhs.removed_due_to_type,
        }
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Stats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// One difference, of any category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DiffItem {
    Class(ClassDiff),
    Common(CommonDiff),
    Type(TypeDiff),
    Attribute(AttributeDiff),
    Role(RoleDiff),
    User(UserDiff),
    Bool(BoolDiff),
    Level(LevelDiff),
    Cat(CatDiff),
    AvRule(AvRuleDiff),
    TeRule(TeRuleDiff),
    RoleAllow(RoleAllowDiff),
    RoleTrans(RoleTransDiff),
    RangeTrans(RangeTransDiff),
}

impl DiffItem {
    #[must_use]
    pub const fn form(&self) -> DiffForm {
        match self {
            Self::Class(d) => d.form,
            Self::Common(d) => d.form,
            Self::Type(d) => d.form,
            Self::Attribute(d) => d.form,
            Self::Role(d) => d.form,
            Self::User(d) => d.form,
            Self::Bool(d) => d.form,
            Self::Level(d) => d.form,
            Self::Cat(d) => d.form,
            Self::AvRule(d) => d.form,
            Self::TeRule(d) => d.form,
            Self::RoleAllow(d) => d.form,
            Self::RoleTrans(d) => d.form,
            Self::RangeTrans(d) => d.form,
        }
    }

    /// The category that produced this item.
    #[must_use]
    pub const fn category(&self) -> Category {
        match self {
            Self::Class(_) => Category::Classes,
            Self::Common(_) => Category::Commons,
            Self::Type(_) => Category::Types,
            Self::Attribute(_) => Category::Attributes,
            Self::Role(_) => Category::Roles,
            Self::User(_) => Category::Users,
            Self::Bool(_) => Category::Booleans,
            Self::Level(_) => Category::Levels,
            Self::Cat(_) => Category::Categories,
            Self::AvRule(d) => Category::from_av_kind(d.kind),
            Self::TeRule(d) => Category::from_te_kind(d.kind),
            Self::RoleAllow(_) => Category::RoleAllows,
            Self::RoleTrans(_) => Category::RoleTransitions,
            Self::RangeTrans(_) => Category::RangeTransitions,
        }
    }

    #[must_use]
    pub const fn as_av_rule(&self) -> Option<&AvRuleDiff> {
        match self {
            Self::AvRule(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_te_rule(&self) -> Option<&TeRuleDiff> {
        match self {
            Self::TeRule(d) => Some(d),
            _ => None,
        }
    }
}

/// Items render the way policy analysts read them: one leading `+`, `-` or
/// `*`, then the symbol or rule, with details on tab-indented lines.
impl fmt::Display for DiffItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(d) => d.fmt(f),
            Self::Common(d) => d.fmt(f),
            Self::Type(d) => d.fmt(f),
            Self::Attribute(d) => d.fmt(f),
            Self::Role(d) => d.fmt(f),
            Self::User(d) => d.fmt(f),
            Self::Bool(d) => d.fmt(f),
            Self::Level(d) => d.fmt(f),
            Self::Cat(d) => d.fmt(f),
            Self::AvRule(d) => d.fmt(f),
            Self::TeRule(d) => d.fmt(f),
            Self::RoleAllow(d) => d.fmt(f),
            Self::RoleTrans(d) => d.fmt(f),
            Self::RangeTrans(d) => d.fmt(f),
        }
    }
}

macro_rules! impl_into_item {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for DiffItem {
                fn from(diff: $ty) -> Self {
                    Self::$variant(diff)
                }
            }
        )*
    };
}

impl_into_item!(
    ClassDiff => Class,
    CommonDiff => Common,
    TypeDiff => Type,
    AttributeDiff => Attribute,
    RoleDiff => Role,
    UserDiff => User,
    BoolDiff => Bool,
    LevelDiff => Level,
    CatDiff => Cat,
    AvRuleDiff => AvRule,
    TeRuleDiff => TeRule,
    RoleAllowDiff => RoleAllow,
    RoleTransDiff => RoleTrans,
    RangeTransDiff => RangeTrans,
);

/// Results of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub stats: Stats,
    pub items: Vec<DiffItem>,
}

impl CategorySummary {
    /// Build a summary; stats are computed from the items.
    #[must_use]
    pub fn new(category: Category, items: Vec<DiffItem>) -> Self {
        let mut stats = Stats::default();
        for item in &items {
            stats.record(item.form());
        }
        Self {
            category,
            stats,
            items,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items of a single form, in result order.
    pub fn items_with_form(&self, form: DiffForm) -> impl Iterator<Item = &DiffItem> {
        self.items.iter().filter(move |i| i.form() == form)
    }
}
