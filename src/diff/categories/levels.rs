//! MLS level declarations: which categories each sensitivity accepts.
//!
//! [`LevelDiff`] doubles as the per-level result inside user and range
//! comparisons, where it renders in a compact one-line form.

use super::{count_phrase, partition};
use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::Side;
use crate::diff::{Category, DiffForm};
use crate::error::Result;
use crate::model::Level;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelDiff {
    pub sensitivity: String,
    pub form: DiffForm,
    /// All categories for an added or removed level, the unchanged ones otherwise
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_categories: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_categories: Vec<String>,
}

impl LevelDiff {
    /// A level present on one side only.
    #[must_use]
    pub fn one_sided(level: &Level, form: DiffForm) -> Self {
        Self {
            sensitivity: level.sensitivity.clone(),
            form,
            categories: level.categories.clone(),
            added_categories: Vec::new(),
            removed_categories: Vec::new(),
        }
    }

    /// Compare the category sets of two levels with the same sensitivity.
    #[must_use]
    pub fn compare(original: &Level, modified: &Level) -> Option<Self> {
        let mut orig_cats = original.categories.clone();
        orig_cats.sort();
        let mut mod_cats = modified.categories.clone();
        mod_cats.sort();
        let cats = partition(&orig_cats, &mod_cats);
        (!cats.is_unchanged()).then(|| Self {
            sensitivity: original.sensitivity.clone(),
            form: DiffForm::Modified,
            categories: cats.unmodified,
            added_categories: cats.added,
            removed_categories: cats.removed,
        })
    }

    /// One-line form used inside user and range output: `"+ s0 : c0,c1"`,
    /// `"* s1 : c0 +c2 -c3"`.
    #[must_use]
    pub fn compact(&self) -> String {
        let mut out = format!("{} {}", self.form.symbol(), self.sensitivity);
        if self.form == DiffForm::Modified {
            let mut parts: Vec<String> = self.categories.clone();
            parts.extend(self.added_categories.iter().map(|c| format!("+{c}")));
            parts.extend(self.removed_categories.iter().map(|c| format!("-{c}")));
            out.push_str(" : ");
            out.push_str(&parts.join(" "));
        } else if !self.categories.is_empty() {
            out.push_str(" : ");
            out.push_str(&self.categories.join(","));
        }
        out
    }
}

impl fmt::Display for LevelDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.form.symbol(), self.sensitivity)?;
        if self.form != DiffForm::Modified {
            return Ok(());
        }
        let mut counts = Vec::new();
        if !self.added_categories.is_empty() {
            counts.push(count_phrase(self.added_categories.len(), "Added", "Category"));
        }
        if !self.removed_categories.is_empty() {
            counts.push(count_phrase(
                self.removed_categories.len(),
                "Removed",
                "Category",
            ));
        }
        write!(f, " ({})", counts.join(", "))?;
        for cat in &self.added_categories {
            write!(f, "\n\t+ {cat}")?;
        }
        for cat in &self.removed_categories {
            write!(f, "\n\t- {cat}")?;
        }
        Ok(())
    }
}

pub struct LevelsDiffer;

impl CategoryDiffer for LevelsDiffer {
    type Canonical = Level;
    type Diff = LevelDiff;

    fn category(&self) -> Category {
        Category::Levels
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<Level>> {
        Ok(ctx
            .policy(side)
            .sensitivities()
            .map(|s| Level::new(s.name.clone(), s.categories.clone()))
            .collect())
    }

    fn compare_key(&self, a: &Level, b: &Level) -> Ordering {
        a.sensitivity.cmp(&b.sensitivity)
    }

    fn one_sided(&self, _ctx: &DiffContext<'_>, form: DiffForm, item: &Level) -> Result<LevelDiff> {
        Ok(LevelDiff::one_sided(item, form))
    }

    fn deep_compare(
        &self,
        _ctx: &DiffContext<'_>,
        original: &Level,
        modified: &Level,
    ) -> Result<Option<LevelDiff>> {
        Ok(LevelDiff::compare(original, modified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(sens: &str, cats: &[&str]) -> Level {
        Level::new(sens, cats.iter().map(|c| (*c).to_string()).collect())
    }

    #[test]
    fn test_compare_partitions_categories() {
        let diff = LevelDiff::compare(&level("s0", &["c0", "c1"]), &level("s0", &["c1", "c2"]))
            .unwrap();
        assert_eq!(diff.categories, vec!["c1"]);
        assert_eq!(diff.compact(), "* s0 : c1 +c2 -c0");
        assert_eq!(
            diff.to_string(),
            "* s0 (1 Added Category, 1 Removed Category)\n\t+ c2\n\t- c0"
        );
        assert!(LevelDiff::compare(&level("s0", &["c0"]), &level("s0", &["c0"])).is_none());
    }

    #[test]
    fn test_compact_one_sided() {
        let added = LevelDiff::one_sided(&level("s1", &["c0", "c1"]), DiffForm::Added);
        assert_eq!(added.compact(), "+ s1 : c0,c1");
        let removed = LevelDiff::one_sided(&level("s2", &[]), DiffForm::Removed);
        assert_eq!(removed.compact(), "- s2");
        assert_eq!(removed.to_string(), "- s2");
    }
}
