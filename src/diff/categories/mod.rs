//! One [`CategoryDiffer`] per category.
//!
//! Symbol categories (classes, commons, types, attributes, roles, users,
//! booleans, levels, categories) key on names or pseudo values; rule
//! categories key on source, target, class and conditional identity after
//! attribute expansion.

mod attributes;
mod avrules;
mod booleans;
mod cats;
mod classes;
mod commons;
mod levels;
mod range;
mod range_transitions;
mod role_allows;
mod role_transitions;
mod roles;
mod rule_key;
mod terules;
mod types;
mod users;

pub use attributes::{AttributeDiff, AttributesDiffer};
pub use avrules::{AvRuleDiff, AvRulesDiffer};
pub use booleans::{BoolDiff, BooleansDiffer};
pub use cats::{CatDiff, CatsDiffer};
pub use classes::{ClassDiff, ClassesDiffer};
pub use commons::{CommonDiff, CommonsDiffer};
pub use levels::{LevelDiff, LevelsDiffer};
pub use range::{RangeDiff, RangeRelation};
pub use range_transitions::{RangeTransDiff, RangeTransitionsDiffer};
pub use role_allows::{RoleAllowDiff, RoleAllowsDiffer};
pub use role_transitions::{RoleTransDiff, RoleTransitionsDiffer};
pub use roles::{RoleDiff, RolesDiffer};
pub use rule_key::RuleKey;
pub(crate) use rule_key::cond_key;
pub use terules::{TeRuleDiff, TeRulesDiffer};
pub use types::{TypeDiff, TypesDiffer};
pub use users::{UserDiff, UsersDiffer};

use super::engine::diff_category;
use super::traits::DiffContext;
use super::{Category, CategorySummary, DiffForm};
use crate::error::Result;
use crate::model::{AvRuleKind, TeRuleKind};
use std::fmt;

/// Run the differ for one category.
pub(crate) fn run_category(category: Category, ctx: &DiffContext<'_>) -> Result<CategorySummary> {
    match category {
        Category::Classes => diff_category(&ClassesDiffer, ctx),
        Category::Commons => diff_category(&CommonsDiffer, ctx),
        Category::Types => diff_category(&TypesDiffer, ctx),
        Category::Attributes => diff_category(&AttributesDiffer, ctx),
        Category::Roles => diff_category(&RolesDiffer, ctx),
        Category::Users => diff_category(&UsersDiffer, ctx),
        Category::Booleans => diff_category(&BooleansDiffer, ctx),
        Category::Levels => diff_category(&LevelsDiffer, ctx),
        Category::Categories => diff_category(&CatsDiffer, ctx),
        Category::AvAllow => diff_category(&AvRulesDiffer::new(AvRuleKind::Allow), ctx),
        Category::AvAuditAllow => diff_category(&AvRulesDiffer::new(AvRuleKind::AuditAllow), ctx),
        Category::AvDontAudit => diff_category(&AvRulesDiffer::new(AvRuleKind::DontAudit), ctx),
        Category::AvNeverAllow => diff_category(&AvRulesDiffer::new(AvRuleKind::NeverAllow), ctx),
        Category::TeChange => diff_category(&TeRulesDiffer::new(TeRuleKind::TypeChange), ctx),
        Category::TeMember => diff_category(&TeRulesDiffer::new(TeRuleKind::TypeMember), ctx),
        Category::TeTransition => {
            diff_category(&TeRulesDiffer::new(TeRuleKind::TypeTransition), ctx)
        }
        Category::RoleAllows => diff_category(&RoleAllowsDiffer, ctx),
        Category::RoleTransitions => diff_category(&RoleTransitionsDiffer, ctx),
        Category::RangeTransitions => diff_category(&RangeTransitionsDiffer, ctx),
    }
}

/// Split two sorted, deduplicated lists into added, removed and common parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Partition<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
    pub unmodified: Vec<T>,
}

impl<T> Partition<T> {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

pub(crate) fn partition<T: Ord + Clone>(original: &[T], modified: &[T]) -> Partition<T> {
    let mut result = Partition {
        added: Vec::new(),
        removed: Vec::new(),
        unmodified: Vec::new(),
    };
    let (mut x, mut y) = (0, 0);
    while x < original.len() && y < modified.len() {
        match original[x].cmp(&modified[y]) {
            std::cmp::Ordering::Less => {
                result.removed.push(original[x].clone());
                x += 1;
            }
            std::cmp::Ordering::Greater => {
                result.added.push(modified[y].clone());
                y += 1;
            }
            std::cmp::Ordering::Equal => {
                result.unmodified.push(original[x].clone());
                x += 1;
                y += 1;
            }
        }
    }
    result.removed.extend_from_slice(&original[x..]);
    result.added.extend_from_slice(&modified[y..]);
    result
}

/// Sort and deduplicate.
pub(crate) fn normalized<T: Ord>(mut items: Vec<T>) -> Vec<T> {
    items.sort();
    items.dedup();
    items
}

/// `"2 Added Permissions"`, `"1 Removed Permission"`.
pub(crate) fn count_phrase(count: usize, verb: &str, noun: &str) -> String {
    if count == 1 {
        format!("{count} {verb} {noun}")
    } else if let Some(stem) = noun.strip_suffix('y') {
        format!("{count} {verb} {stem}ies")
    } else {
        format!("{count} {verb} {noun}s")
    }
}

/// Render a symbol whose change is a set of added and removed members.
///
/// Added and removed symbols are a single `"+ name"`/`"- name"` line; a
/// modified one reads `"* name (1 Added Permission, 2 Removed Permissions)"`
/// followed by one tab-indented line per member change.
pub(crate) fn fmt_member_change(
    f: &mut fmt::Formatter<'_>,
    form: DiffForm,
    name: &str,
    noun: &str,
    added: &[String],
    removed: &[String],
) -> fmt::Result {
    write!(f, "{} {}", form.symbol(), name)?;
    if form != DiffForm::Modified {
        return Ok(());
    }
    let mut counts = Vec::new();
    if !added.is_empty() {
        counts.push(count_phrase(added.len(), "Added", noun));
    }
    if !removed.is_empty() {
        counts.push(count_phrase(removed.len(), "Removed", noun));
    }
    write!(f, " ({})", counts.join(", "))?;
    for member in added {
        write!(f, "\n\t+ {member}")?;
    }
    for member in removed {
        write!(f, "\n\t- {member}")?;
    }
    Ok(())
}
