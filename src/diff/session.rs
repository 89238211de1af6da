//! The diff session: runs categories over a pair of policies and owns the
//! results.
//!
//! A session borrows both policies for its lifetime. The type map is built
//! lazily before the first category runs and rebuilt after any change to the
//! remap entries.

use super::categories::run_category;
use super::line_numbers::{annotate, clear_annotations};
use super::traits::DiffContext;
use super::type_map::{validate_entries, validate_entry, RemapEntry, TypeMap, TypeRename};
use super::{Category, CategoryMask, CategorySummary, DiffItem, Stats};
use crate::error::{PolDiffError, Result};
use crate::model::{Policy, SyntaxTable};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Diff state for one pair of policies.
///
/// # Example
///
/// ```ignore
/// use poldiff::diff::{CategoryMask, DiffSession, Category};
///
/// let mut session = DiffSession::new(&original, &modified, &[])?;
/// session.run(CategoryMask::AVRULES | CategoryMask::TYPES)?;
/// for item in session.items(Category::AvAllow) {
///     println!("{item}");
/// }
/// ```
#[derive(Debug)]
pub struct DiffSession<'p> {
    original: &'p Policy,
    modified: &'p Policy,
    remaps: Vec<RemapEntry>,
    type_map: Option<TypeMap>,
    summaries: BTreeMap<Category, CategorySummary>,
}

impl<'p> DiffSession<'p> {
    /// Create a session. Rename declarations are validated up front.
    pub fn new(original: &'p Policy, modified: &'p Policy, renames: &[TypeRename]) -> Result<Self> {
        let remaps: Vec<RemapEntry> = renames.iter().map(RemapEntry::from).collect();
        validate_entries(original, modified, &remaps)?;
        Ok(Self {
            original,
            modified,
            remaps,
            type_map: None,
            summaries: BTreeMap::new(),
        })
    }

    #[must_use]
    pub const fn original(&self) -> &'p Policy {
        self.original
    }

    #[must_use]
    pub const fn modified(&self) -> &'p Policy {
        self.modified
    }

    fn ensure_type_map(&mut self) -> Result<&TypeMap> {
        if self.type_map.is_none() {
            self.type_map = Some(TypeMap::build(self.original, self.modified, &self.remaps)?);
        }
        self.type_map
            .as_ref()
            .ok_or_else(|| PolDiffError::invalid_argument("type map unavailable"))
    }

    /// Run every category in `mask` that has not run yet.
    ///
    /// Line-number annotations of earlier results are dropped on every call.
    /// A failing category is logged and skipped; the remaining categories
    /// still run and the first failure is returned at the end. A type map
    /// failure aborts before any category runs.
    pub fn run(&mut self, mask: CategoryMask) -> Result<()> {
        mask.validate()?;
        self.summaries.values_mut().for_each(clear_annotations);
        let pending: Vec<Category> = mask
            .categories()
            .filter(|c| !self.summaries.contains_key(c))
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        self.ensure_type_map()?;
        let (original, modified) = (self.original, self.modified);
        let Some(type_map) = self.type_map.as_ref() else {
            return Err(PolDiffError::invalid_argument("type map unavailable"));
        };
        let ctx = DiffContext::new(original, modified, type_map);

        // Categories only read the policies and the type map.
        let results: Vec<(Category, Result<CategorySummary>)> = pending
            .par_iter()
            .map(|&category| (category, run_category(category, &ctx)))
            .collect();
        self.store_results(results)
    }

    /// Keep the successful summaries and return the first failure.
    fn store_results(&mut self, results: Vec<(Category, Result<CategorySummary>)>) -> Result<()> {
        let mut first_error = None;
        let mut finished = Vec::with_capacity(results.len());
        for (category, result) in results {
            match result {
                Ok(summary) => {
                    tracing::info!(
                        "{}: {} differences ({} added, {} removed, {} modified)",
                        category.label(),
                        summary.stats.total(),
                        summary.stats.added + summary.stats.added_due_to_type,
                        summary.stats.removed + summary.stats.removed_due_to_type,
                        summary.stats.modified
                    );
                    finished.push(summary);
                }
                Err(err) => {
                    tracing::warn!("{} failed: {}", category.label(), err);
                    first_error.get_or_insert(PolDiffError::category(category, err));
                }
            }
        }
        for summary in finished {
            self.summaries.insert(summary.category, summary);
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Forget the results of the categories in `mask`.
    pub fn reset(&mut self, mask: CategoryMask) {
        self.summaries.retain(|category, _| !mask.contains(*category));
    }

    /// Whether every category in `mask` has results.
    #[must_use]
    pub fn is_run(&self, mask: CategoryMask) -> bool {
        mask.categories().all(|c| self.summaries.contains_key(&c))
    }

    pub fn summary(&self, category: Category) -> Option<&CategorySummary> {
        self.summaries.get(&category)
    }

    /// Summaries of all categories that have run, in run order.
    pub fn summaries(&self) -> impl Iterator<Item = &CategorySummary> {
        self.summaries.values()
    }

    /// Counts for one category; an error if it has not run.
    pub fn stats(&self, category: Category) -> Result<Stats> {
        self.summaries
            .get(&category)
            .map(|s| s.stats)
            .ok_or_else(|| PolDiffError::invalid_argument(format!("{category} has not been run")))
    }

    /// Summed counts over the categories in `mask` that have run.
    #[must_use]
    pub fn stats_for(&self, mask: CategoryMask) -> Stats {
        mask.categories()
            .filter_map(|c| self.summaries.get(&c))
            .map(|s| s.stats)
            .sum()
    }

    /// Items of one category; empty if it has not run.
    #[must_use]
    pub fn items(&self, category: Category) -> &[DiffItem] {
        self.summaries
            .get(&category)
            .map_or(&[][..], |s| s.items.as_slice())
    }

    /// The text form of one item.
    pub fn render_item(&self, category: Category, item: &DiffItem) -> Result<String> {
        if item.category() != category {
            return Err(PolDiffError::invalid_argument(format!(
                "item belongs to {}, not {category}",
                item.category()
            )));
        }
        Ok(item.to_string())
    }

    // ------------------------------------------------------------------
    // Type remapping
    // ------------------------------------------------------------------

    /// Explicit remap entries, in the order they were added.
    #[must_use]
    pub fn remap_entries(&self) -> &[RemapEntry] {
        &self.remaps
    }

    /// The type map, building it if needed.
    pub fn type_map(&mut self) -> Result<&TypeMap> {
        self.ensure_type_map()
    }

    /// The type map of the last run, if it is still current.
    #[must_use]
    pub const fn built_type_map(&self) -> Option<&TypeMap> {
        self.type_map.as_ref()
    }

    /// Add an explicit remap entry. Returns its index.
    pub fn add_remap(&mut self, orig_types: &[&str], mod_types: &[&str]) -> Result<usize> {
        let entry = RemapEntry::new(
            orig_types.iter().map(|s| (*s).to_string()).collect(),
            mod_types.iter().map(|s| (*s).to_string()).collect(),
        );
        validate_entry(self.original, self.modified, &entry)?;
        let mut candidate = self.remaps.clone();
        candidate.push(entry);
        validate_entries(self.original, self.modified, &candidate)?;
        self.remaps = candidate;
        self.invalidate_remaps();
        Ok(self.remaps.len() - 1)
    }

    /// Remove an explicit remap entry.
    pub fn remove_remap(&mut self, index: usize) -> Result<RemapEntry> {
        if index >= self.remaps.len() {
            return Err(PolDiffError::invalid_argument(format!(
                "no remap entry at index {index}"
            )));
        }
        let entry = self.remaps.remove(index);
        self.invalidate_remaps();
        Ok(entry)
    }

    /// Enable or disable an explicit remap entry.
    pub fn set_remap_enabled(&mut self, index: usize, enabled: bool) -> Result<()> {
        let Some(entry) = self.remaps.get(index) else {
            return Err(PolDiffError::invalid_argument(format!(
                "no remap entry at index {index}"
            )));
        };
        if entry.enabled == enabled {
            return Ok(());
        }
        let mut candidate = self.remaps.clone();
        candidate[index].enabled = enabled;
        validate_entries(self.original, self.modified, &candidate)?;
        self.remaps = candidate;
        self.invalidate_remaps();
        Ok(())
    }

    fn invalidate_remaps(&mut self) {
        self.type_map = None;
        self.reset(CategoryMask::REMAPPED);
    }

    // ------------------------------------------------------------------
    // Line numbers
    // ------------------------------------------------------------------

    /// Annotate a rule category's items with source lines.
    ///
    /// The category must have run and must be an AV or TE rule category.
    pub fn enable_line_numbers(
        &mut self,
        category: Category,
        orig_table: &SyntaxTable,
        mod_table: &SyntaxTable,
    ) -> Result<()> {
        if !category.supports_line_numbers() {
            return Err(PolDiffError::invalid_argument(format!(
                "{category} does not support line numbers"
            )));
        }
        let (original, modified) = (self.original, self.modified);
        let Some(type_map) = self.type_map.as_ref() else {
            return Err(PolDiffError::invalid_argument(format!(
                "{category} has not been run"
            )));
        };
        let Some(summary) = self.summaries.get_mut(&category) else {
            return Err(PolDiffError::invalid_argument(format!(
                "{category} has not been run"
            )));
        };
        let ctx = DiffContext::new(original, modified, type_map);
        annotate(summary, &ctx, orig_table, mod_table)
    }
}
