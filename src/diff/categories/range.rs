//! MLS range comparison shared by users and range transitions.

use super::levels::LevelDiff;
use crate::diff::DiffForm;
use crate::model::{compare_levels, Level, LevelDominance, MlsRange, Policy};
use serde::Serialize;
use std::cmp::Ordering;

/// How the original range relates to the modified one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeRelation {
    Equal,
    /// The original range contains the modified range
    Dominates,
    /// The modified range contains the original range
    DominatedBy,
    Incomparable,
}

/// Level-by-level difference of two ranges.
///
/// A range present in one policy only has `None` on the other side; every
/// level it spans is then added or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeDiff {
    pub orig_range: Option<MlsRange>,
    pub mod_range: Option<MlsRange>,
    /// Per-sensitivity changes, ordered by sensitivity name
    pub levels: Vec<LevelDiff>,
    /// The low levels carry different categories
    pub min_cats_differ: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<RangeRelation>,
}

fn sorted_levels(policy: &Policy, range: &MlsRange) -> Vec<Level> {
    let mut levels = policy.levels_in_range(range);
    levels.sort_by(|a, b| a.sensitivity.cmp(&b.sensitivity));
    levels
}

fn sorted_categories(level: &Level) -> Vec<String> {
    let mut cats = level.categories.clone();
    cats.sort();
    cats
}

impl RangeDiff {
    /// Compare a range from each policy. `None` when they are equivalent.
    ///
    /// Each range is expanded to one level per sensitivity it spans; the
    /// levels are then compared by sensitivity name.
    #[must_use]
    pub fn compute(
        original: &Policy,
        orig_range: &MlsRange,
        modified: &Policy,
        mod_range: &MlsRange,
    ) -> Option<Self> {
        let orig_levels = sorted_levels(original, orig_range);
        let mod_levels = sorted_levels(modified, mod_range);

        let mut levels = Vec::new();
        let (mut x, mut y) = (0, 0);
        while x < orig_levels.len() && y < mod_levels.len() {
            let (o, m) = (&orig_levels[x], &mod_levels[y]);
            match o.sensitivity.cmp(&m.sensitivity) {
                Ordering::Less => {
                    levels.push(LevelDiff::one_sided(o, DiffForm::Removed));
                    x += 1;
                }
                Ordering::Greater => {
                    levels.push(LevelDiff::one_sided(m, DiffForm::Added));
                    y += 1;
                }
                Ordering::Equal => {
                    levels.extend(LevelDiff::compare(o, m));
                    x += 1;
                    y += 1;
                }
            }
        }
        levels.extend(
            orig_levels[x..]
                .iter()
                .map(|l| LevelDiff::one_sided(l, DiffForm::Removed)),
        );
        levels.extend(
            mod_levels[y..]
                .iter()
                .map(|l| LevelDiff::one_sided(l, DiffForm::Added)),
        );

        let min_cats_differ = sorted_categories(&orig_range.low) != sorted_categories(&mod_range.low);
        if levels.is_empty() && !min_cats_differ {
            return None;
        }

        Some(Self {
            orig_range: Some(orig_range.clone()),
            mod_range: Some(mod_range.clone()),
            levels,
            min_cats_differ,
            relation: Some(relation(original, orig_range, modified, mod_range)),
        })
    }

    /// A range that exists in only one policy, as `Added` or `Removed`.
    #[must_use]
    pub fn one_sided(policy: &Policy, range: &MlsRange, form: DiffForm) -> Self {
        let levels = sorted_levels(policy, range)
            .iter()
            .map(|l| LevelDiff::one_sided(l, form))
            .collect();
        let (orig_range, mod_range) = if form.is_added() {
            (None, Some(range.clone()))
        } else {
            (Some(range.clone()), None)
        };
        Self {
            orig_range,
            mod_range,
            levels,
            min_cats_differ: false,
            relation: None,
        }
    }

    /// Indented detail lines: the range change, then one line per level.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let side = |range: &Option<MlsRange>| {
            range
                .as_ref()
                .map_or_else(|| "(none)".to_string(), ToString::to_string)
        };
        let mut lines = vec![format!(
            "   range: {} -> {}",
            side(&self.orig_range),
            side(&self.mod_range)
        )];
        lines.extend(self.levels.iter().map(|l| format!("     {}", l.compact())));
        if self.min_cats_differ {
            lines.push("     (minimum categories differ)".to_string());
        }
        lines
    }
}

fn relation(
    original: &Policy,
    orig_range: &MlsRange,
    modified: &Policy,
    mod_range: &MlsRange,
) -> RangeRelation {
    let rank = |policy: &Policy, level: &Level| policy.sensitivity_rank(&level.sensitivity).unwrap_or_default();
    let low = compare_levels(
        &orig_range.low,
        rank(original, &orig_range.low),
        &mod_range.low,
        rank(modified, &mod_range.low),
    );
    let high = compare_levels(
        &orig_range.high,
        rank(original, &orig_range.high),
        &mod_range.high,
        rank(modified, &mod_range.high),
    );
    let orig_contains = matches!(low, LevelDominance::Equal | LevelDominance::DominatedBy)
        && matches!(high, LevelDominance::Equal | LevelDominance::Dominates);
    let mod_contains = matches!(low, LevelDominance::Equal | LevelDominance::Dominates)
        && matches!(high, LevelDominance::Equal | LevelDominance::DominatedBy);
    match (orig_contains, mod_contains) {
        (true, true) => RangeRelation::Equal,
        (true, false) => RangeRelation::Dominates,
        (false, true) => RangeRelation::DominatedBy,
        (false, false) => RangeRelation::Incomparable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PolicyBuilder;

    fn mls_policy() -> Policy {
        PolicyBuilder::new("mls")
            .mls(true)
            .sensitivity("s0")
            .sensitivity("s1")
            .sensitivity("s2")
            .categories(&["c0", "c1", "c2"])
            .level("s0:c0.c2")
            .level("s1:c0.c2")
            .level("s2:c0.c2")
            .build()
            .unwrap()
    }

    fn range(policy: &Policy, text: &str) -> MlsRange {
        policy.resolve_range(&text.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_equal_ranges() {
        let p = mls_policy();
        assert!(RangeDiff::compute(&p, &range(&p, "s0 - s1:c0"), &p, &range(&p, "s0 - s1:c0")).is_none());
    }

    #[test]
    fn test_narrowed_range_is_dominated() {
        let p = mls_policy();
        let diff = RangeDiff::compute(&p, &range(&p, "s0 - s2:c0.c2"), &p, &range(&p, "s0 - s1:c0"))
            .unwrap();
        assert_eq!(diff.relation, Some(RangeRelation::Dominates));
        assert!(!diff.min_cats_differ);
        let compact: Vec<String> = diff.levels.iter().map(LevelDiff::compact).collect();
        assert_eq!(
            compact,
            vec!["* s0 : c0 -c1 -c2", "* s1 : c0 -c1 -c2", "- s2 : c0,c1,c2"]
        );
    }

    #[test]
    fn test_widened_range_and_low_categories() {
        let p = mls_policy();
        let diff = RangeDiff::compute(&p, &range(&p, "s1:c1 - s1:c1"), &p, &range(&p, "s0 - s2:c1"))
            .unwrap();
        assert_eq!(diff.relation, Some(RangeRelation::DominatedBy));
        assert!(diff.min_cats_differ);
        let lines = diff.lines();
        assert_eq!(lines[0], "   range: s1:c1 -> s0 - s2:c1");
        assert_eq!(lines.last().unwrap(), "     (minimum categories differ)");
    }

    #[test]
    fn test_incomparable() {
        let p = mls_policy();
        let diff = RangeDiff::compute(&p, &range(&p, "s0 - s1:c0"), &p, &range(&p, "s0 - s1:c1"))
            .unwrap();
        assert_eq!(diff.relation, Some(RangeRelation::Incomparable));
    }

    #[test]
    fn test_one_sided_range() {
        let p = mls_policy();
        let diff = RangeDiff::one_sided(&p, &range(&p, "s0 - s1:c0"), DiffForm::Removed);
        assert_eq!(diff.relation, None);
        assert!(diff.mod_range.is_none());
        assert_eq!(
            diff.lines(),
            vec!["   range: s0 - s1:c0 -> (none)", "     - s0 : c0", "     - s1 : c0"]
        );
    }
}
