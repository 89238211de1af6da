//! Plain text report in the classic poldiff layout.
//!
//! ```text
//! Types (1 Added, 1 Removed, 0 Modified)
//!    Added Types: 1
//!       + new_t
//!    Removed Types: 1
//!       - old_t
//! ```

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::diff::{Category, CategorySummary, DiffForm, DiffItem, DiffSession};
use std::fmt::Write;

const SECTION_INDENT: &str = "   ";
const ITEM_INDENT: &str = "      ";

/// Forms in the order they are listed.
const FORM_ORDER: [DiffForm; 5] = [
    DiffForm::Added,
    DiffForm::AddedDueToType,
    DiffForm::Removed,
    DiffForm::RemovedDueToType,
    DiffForm::Modified,
];

/// Categories whose items can appear or vanish because of a type.
pub(crate) const fn has_type_forms(category: Category) -> bool {
    category.av_kind().is_some()
        || category.te_kind().is_some()
        || matches!(category, Category::RoleTransitions | Category::RangeTransitions)
}

/// `"Allow Rules (1 Added, 0 Removed, 2 Modified)"`.
pub(crate) fn category_header(summary: &CategorySummary) -> String {
    let stats = &summary.stats;
    let mut header = format!(
        "{} ({} Added, {} Removed, {} Modified",
        summary.category.label(),
        stats.added,
        stats.removed,
        stats.modified
    );
    if has_type_forms(summary.category) {
        let _ = write!(
            header,
            ", {} Added because of new type, {} Removed because of missing type",
            stats.added_due_to_type, stats.removed_due_to_type
        );
    }
    header.push(')');
    header
}

/// `"Added Allow Rules because of new type"`.
pub(crate) fn section_title(category: Category, form: DiffForm) -> String {
    let label = category.label();
    match form {
        DiffForm::Added => format!("Added {label}"),
        DiffForm::Removed => format!("Removed {label}"),
        DiffForm::Modified => format!("Modified {label}"),
        DiffForm::AddedDueToType => format!("Added {label} because of new type"),
        DiffForm::RemovedDueToType => format!("Removed {label} because of missing type"),
    }
}

/// Source line suffix for annotated rule items: `" [10, 12 -> 20]"`.
pub(crate) fn line_suffix(item: &DiffItem) -> String {
    let (orig, modified): (Vec<u64>, Vec<u64>) = match item {
        DiffItem::AvRule(av) => (
            av.orig_lines.iter().map(|a| a.line).collect(),
            av.mod_lines.iter().map(|a| a.line).collect(),
        ),
        DiffItem::TeRule(te) => (te.orig_lines.clone(), te.mod_lines.clone()),
        _ => return String::new(),
    };
    let join = |lines: &[u64]| {
        lines
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    match (orig.is_empty(), modified.is_empty()) {
        (true, true) => String::new(),
        (false, true) => format!(" [{}]", join(&orig)),
        (true, false) => format!(" [{}]", join(&modified)),
        (false, false) => format!(" [{} -> {}]", join(&orig), join(&modified)),
    }
}

/// Text reporter
pub struct TextReporter;

impl TextReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn write_item(out: &mut String, item: &DiffItem, config: &ReportConfig) {
        let rendered = item.to_string();
        let suffix = if config.show_line_numbers {
            line_suffix(item)
        } else {
            String::new()
        };
        for (i, line) in rendered.lines().enumerate() {
            out.push_str(ITEM_INDENT);
            out.push_str(line);
            if i == 0 {
                out.push_str(&suffix);
            }
            out.push('\n');
        }
    }

    fn write_category(out: &mut String, summary: &CategorySummary, config: &ReportConfig) {
        out.push_str(&category_header(summary));
        out.push('\n');
        for form in FORM_ORDER {
            let items: Vec<&DiffItem> = summary.items_with_form(form).collect();
            if items.is_empty() {
                continue;
            }
            let _ = writeln!(
                out,
                "{SECTION_INDENT}{}: {}",
                section_title(summary.category, form),
                items.len()
            );
            let (shown, hidden) = config.limit(&items);
            for item in shown {
                Self::write_item(out, item, config);
            }
            if hidden > 0 {
                let _ = writeln!(out, "{ITEM_INDENT}... and {hidden} more");
            }
        }
    }
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for TextReporter {
    fn generate_diff_report(
        &self,
        session: &DiffSession<'_>,
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut out = String::new();
        if let Some(title) = &config.title {
            writeln!(out, "{title}")?;
            writeln!(out)?;
        }
        let mut any = false;
        for summary in session.summaries() {
            if any {
                out.push('\n');
            }
            Self::write_category(&mut out, summary, config);
            any = true;
        }
        if !any {
            writeln!(out, "No categories were compared.")?;
        }
        Ok(out)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Text
    }
}
