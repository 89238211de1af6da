//! Summary report generator for shell output.
//!
//! Provides a compact, human-readable summary for terminal usage.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::diff::{CategoryMask, DiffSession, Stats};

/// Apply ANSI color formatting if colored output is enabled.
fn ansi_color(text: &str, color: &str, colored: bool) -> String {
    if colored {
        match color {
            "red" => format!("\x1b[31m{text}\x1b[0m"),
            "green" => format!("\x1b[32m{text}\x1b[0m"),
            "yellow" => format!("\x1b[33m{text}\x1b[0m"),
            "cyan" => format!("\x1b[36m{text}\x1b[0m"),
            "bold" => format!("\x1b[1m{text}\x1b[0m"),
            "dim" => format!("\x1b[2m{text}\x1b[0m"),
            _ => text.to_string(),
        }
    } else {
        text.to_string()
    }
}

/// Summary reporter for shell output
pub struct SummaryReporter {
    /// Use colored output
    colored: bool,
}

impl SummaryReporter {
    /// Create a new summary reporter
    #[must_use]
    pub const fn new() -> Self {
        Self { colored: true }
    }

    /// Disable colored output
    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        ansi_color(text, color, self.colored)
    }

    fn counts(&self, stats: &Stats) -> String {
        let added = stats.added + stats.added_due_to_type;
        let removed = stats.removed + stats.removed_due_to_type;
        let mut parts = Vec::new();
        if added > 0 {
            parts.push(self.color(&format!("+{added}"), "green"));
        }
        if removed > 0 {
            parts.push(self.color(&format!("-{removed}"), "red"));
        }
        if stats.modified > 0 {
            parts.push(self.color(&format!("~{}", stats.modified), "yellow"));
        }
        parts.join(" ")
    }
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for SummaryReporter {
    fn generate_diff_report(
        &self,
        session: &DiffSession<'_>,
        _config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let (original, modified) = (session.original(), session.modified());
        let mut lines = Vec::new();

        // Header
        lines.push(self.color("Policy Diff Summary", "bold"));
        lines.push(self.color("─".repeat(40).as_str(), "dim"));
        lines.push(format!(
            "{}  {} → {}",
            self.color("Policies:", "cyan"),
            original.name(),
            modified.name()
        ));
        lines.push(format!(
            "{}  {} → {} types",
            self.color("Size:", "cyan"),
            original.type_count(),
            modified.type_count()
        ));
        if let Some(map) = session.built_type_map() {
            let inferred = map.entries().iter().filter(|e| e.inferred).count();
            lines.push(format!(
                "{}  {} pseudo types, {} remapped ({} inferred)",
                self.color("Type map:", "cyan"),
                map.len(),
                map.entries().len(),
                inferred
            ));
        }

        lines.push(String::new());
        lines.push(self.color("Changes:", "bold"));

        let width = session
            .summaries()
            .map(|s| s.category.label().len())
            .max()
            .unwrap_or(0);
        let mut changed = 0;
        for summary in session.summaries().filter(|s| !s.stats.is_empty()) {
            lines.push(format!(
                "  {:<width$}  {}",
                summary.category.label(),
                self.counts(&summary.stats)
            ));
            changed += 1;
        }
        if changed == 0 {
            lines.push(format!("  {}", self.color("No changes", "dim")));
        } else {
            let total = session.stats_for(CategoryMask::ALL);
            lines.push(String::new());
            lines.push(format!(
                "{}  {} differences in {} of {} categories",
                self.color("Total:", "cyan"),
                total.total(),
                changed,
                session.summaries().count()
            ));
        }

        Ok(lines.join("\n"))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::test_support::policies;

    #[test]
    fn test_plain_summary() {
        let (orig, modified) = policies();
        let mut session = DiffSession::new(&orig, &modified, &[]).unwrap();
        session.run(CategoryMask::ALL).unwrap();
        let report = SummaryReporter::new()
            .no_color()
            .generate_diff_report(&session, &ReportConfig::default())
            .unwrap();
        assert!(report.contains("Policies:  orig → modified"));
        assert!(report.contains("Allow Rules"));
        assert!(report.contains("-1 ~1"));
        assert!(report.contains("Total:  4 differences in 2 of 19 categories"));
        assert!(!report.contains('\x1b'));
    }

    #[test]
    fn test_colored_summary() {
        let (orig, _) = policies();
        let mut session = DiffSession::new(&orig, &orig, &[]).unwrap();
        session.run(CategoryMask::ALL).unwrap();
        let report = SummaryReporter::new()
            .generate_diff_report(&session, &ReportConfig::default())
            .unwrap();
        assert!(report.contains("\x1b[2mNo changes\x1b[0m"));
    }
}
