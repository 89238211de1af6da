//! Markdown report generator.

use super::escape::{escape_code_block, escape_markdown_inline, escape_markdown_table, escape_md_opt};
use super::text::{category_header, has_type_forms, line_suffix, section_title};
use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::diff::{CategorySummary, DiffForm, DiffItem, DiffSession};
use std::fmt::Write;

/// Markdown reporter
pub struct MarkdownReporter;

impl MarkdownReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn write_summary_table(out: &mut String, session: &DiffSession<'_>) -> std::fmt::Result {
        writeln!(out, "## Summary")?;
        writeln!(out)?;
        writeln!(
            out,
            "| Category | Added | Removed | Modified | Added (new type) | Removed (missing type) |"
        )?;
        writeln!(out, "|----------|------:|--------:|---------:|-----------------:|-----------------------:|")?;
        for summary in session.summaries() {
            let stats = &summary.stats;
            let (added_type, removed_type) = if has_type_forms(summary.category) {
                (
                    stats.added_due_to_type.to_string(),
                    stats.removed_due_to_type.to_string(),
                )
            } else {
                ("-".to_string(), "-".to_string())
            };
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                escape_markdown_table(summary.category.label()),
                stats.added,
                stats.removed,
                stats.modified,
                added_type,
                removed_type
            )?;
        }
        writeln!(out)
    }

    fn write_category(
        out: &mut String,
        summary: &CategorySummary,
        config: &ReportConfig,
    ) -> std::fmt::Result {
        writeln!(out, "## {}", escape_markdown_inline(&category_header(summary)))?;
        writeln!(out)?;
        if summary.is_empty() {
            writeln!(out, "_No differences._")?;
            return writeln!(out);
        }
        for form in [
            DiffForm::Added,
            DiffForm::AddedDueToType,
            DiffForm::Removed,
            DiffForm::RemovedDueToType,
            DiffForm::Modified,
        ] {
            let items: Vec<&DiffItem> = summary.items_with_form(form).collect();
            if items.is_empty() {
                continue;
            }
            writeln!(
                out,
                "### {} ({})",
                escape_markdown_inline(&section_title(summary.category, form)),
                items.len()
            )?;
            writeln!(out)?;
            let (shown, hidden) = config.limit(&items);
            writeln!(out, "```")?;
            for item in shown {
                let mut rendered = item.to_string();
                if config.show_line_numbers {
                    if let Some(end) = rendered.find('\n') {
                        rendered.insert_str(end, &line_suffix(item));
                    } else {
                        rendered.push_str(&line_suffix(item));
                    }
                }
                writeln!(out, "{}", escape_code_block(&rendered))?;
            }
            writeln!(out, "```")?;
            if hidden > 0 {
                writeln!(out)?;
                writeln!(out, "_... and {hidden} more_")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for MarkdownReporter {
    fn generate_diff_report(
        &self,
        session: &DiffSession<'_>,
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut out = String::new();
        let title = config
            .title
            .clone()
            .unwrap_or_else(|| "Policy Diff Report".to_string());
        writeln!(out, "# {}", escape_markdown_inline(&title))?;
        writeln!(out)?;

        writeln!(out, "| | Original | Modified |")?;
        writeln!(out, "|---|---|---|")?;
        writeln!(
            out,
            "| Policy | {} | {} |",
            escape_markdown_table(session.original().name()),
            escape_markdown_table(session.modified().name())
        )?;
        writeln!(
            out,
            "| File | {} | {} |",
            escape_md_opt(config.metadata.original_path.as_deref()),
            escape_md_opt(config.metadata.modified_path.as_deref())
        )?;
        writeln!(
            out,
            "| Types | {} | {} |",
            session.original().type_count(),
            session.modified().type_count()
        )?;
        writeln!(out)?;

        if session.summaries().next().is_none() {
            writeln!(out, "_No categories were compared._")?;
            return Ok(out);
        }

        Self::write_summary_table(&mut out, session)?;
        for summary in session.summaries() {
            Self::write_category(&mut out, summary, config)?;
        }

        writeln!(out, "---")?;
        writeln!(out, "_Generated by poldiff {}_", env!("CARGO_PKG_VERSION"))?;
        Ok(out)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Markdown
    }
}
