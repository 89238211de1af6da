//! Generic sorted-merge diff.

use super::traits::{CategoryDiffer, DiffContext};
use super::type_map::Side;
use super::{CategorySummary, DiffForm, DiffItem};
use crate::error::{ErrorContext, Result};
use std::cmp::Ordering;

/// Run one category: canonicalize both sides, sort, and merge.
///
/// Items come out in key order. Keys present on one side only go through
/// [`CategoryDiffer::classify`]; equal keys always go through
/// [`CategoryDiffer::deep_compare`], even when a referenced type is missing
/// on one side.
pub fn diff_category<D: CategoryDiffer>(differ: &D, ctx: &DiffContext<'_>) -> Result<CategorySummary> {
    let category = differ.category();
    let mut original = differ
        .canonicalize(ctx, Side::Original)
        .context("original policy")?;
    let mut modified = differ
        .canonicalize(ctx, Side::Modified)
        .context("modified policy")?;
    original.sort_by(|a, b| differ.compare_key(a, b));
    modified.sort_by(|a, b| differ.compare_key(a, b));

    tracing::debug!(
        "{}: {} original and {} modified items",
        category,
        original.len(),
        modified.len()
    );

    let mut items: Vec<DiffItem> = Vec::new();
    let removed = |item: &D::Canonical| -> Result<DiffItem> {
        let form = differ.classify(ctx, DiffForm::Removed, item);
        Ok(differ.one_sided(ctx, form, item)?.into())
    };
    let added = |item: &D::Canonical| -> Result<DiffItem> {
        let form = differ.classify(ctx, DiffForm::Added, item);
        Ok(differ.one_sided(ctx, form, item)?.into())
    };

    let (mut x, mut y) = (0, 0);
    while x < original.len() && y < modified.len() {
        match differ.compare_key(&original[x], &modified[y]) {
            Ordering::Less => {
                items.push(removed(&original[x])?);
                x += 1;
            }
            Ordering::Greater => {
                items.push(added(&modified[y])?);
                y += 1;
            }
            Ordering::Equal => {
                if let Some(diff) = differ.deep_compare(ctx, &original[x], &modified[y])? {
                    items.push(diff.into());
                }
                x += 1;
                y += 1;
            }
        }
    }
    for item in &original[x..] {
        items.push(removed(item)?);
    }
    for item in &modified[y..] {
        items.push(added(item)?);
    }

    Ok(CategorySummary::new(category, items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::categories::CatDiff;
    use crate::diff::{Category, TypeMap};
    use crate::model::{Policy, PolicyBuilder};

    /// Diffs fixed string lists; an item "x=1" vs "x=2" is a modification.
    struct ListDiffer {
        original: Vec<&'static str>,
        modified: Vec<&'static str>,
    }

    fn key(item: &str) -> &str {
        item.split('=').next().unwrap_or(item)
    }

    impl CategoryDiffer for ListDiffer {
        type Canonical = &'static str;
        type Diff = CatDiff;

        fn category(&self) -> Category {
            Category::Categories
        }

        fn canonicalize(&self, _ctx: &DiffContext<'_>, side: Side) -> Result<Vec<&'static str>> {
            Ok(match side {
                Side::Original => self.original.clone(),
                Side::Modified => self.modified.clone(),
            })
        }

        fn compare_key(&self, a: &&'static str, b: &&'static str) -> Ordering {
            key(a).cmp(key(b))
        }

        fn one_sided(&self, _ctx: &DiffContext<'_>, form: DiffForm, item: &&'static str) -> Result<CatDiff> {
            Ok(CatDiff {
                name: key(item).to_string(),
                form,
            })
        }

        fn deep_compare(
            &self,
            _ctx: &DiffContext<'_>,
            original: &&'static str,
            modified: &&'static str,
        ) -> Result<Option<CatDiff>> {
            Ok((original != modified).then(|| CatDiff {
                name: key(original).to_string(),
                form: DiffForm::Modified,
            }))
        }
    }

    fn run(original: Vec<&'static str>, modified: Vec<&'static str>) -> CategorySummary {
        let policy: Policy = PolicyBuilder::new("empty").build().unwrap();
        let map = TypeMap::build(&policy, &policy, &[]).unwrap();
        let ctx = DiffContext::new(&policy, &policy, &map);
        diff_category(&ListDiffer { original, modified }, &ctx).unwrap()
    }

    #[test]
    fn test_merge_partitions_keys() {
        let summary = run(vec!["d", "a=1", "b=1"], vec!["b=2", "c", "a=1"]);
        let rendered: Vec<String> = summary.items.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["* b", "+ c", "- d"]);
        assert_eq!(summary.stats.as_array(), [1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_identical_inputs_produce_nothing() {
        let summary = run(vec!["x=1", "y=2"], vec!["y=2", "x=1"]);
        assert!(summary.is_empty());
        assert!(summary.stats.is_empty());
    }

    #[test]
    fn test_leftovers_drain() {
        let summary = run(vec![], vec!["a", "b"]);
        assert_eq!(summary.stats.added, 2);
        let summary = run(vec!["a", "b"], vec![]);
        assert_eq!(summary.stats.removed, 2);
    }
}
