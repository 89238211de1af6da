//! Report generation for diff results.
//!
//! This module provides several output formats for a finished
//! [`DiffSession`]:
//! - Summary: Compact per-category counts for the shell
//! - Text: Every difference in the classic poldiff layout
//! - JSON: Structured data for programmatic integration
//! - Markdown: Human-readable documentation
//!
//! # Security
//!
//! Policy symbol names are untrusted input. The `escape` module provides
//! utilities for embedding them in Markdown.

pub mod escape;
mod json;
mod markdown;
mod summary;
mod text;
mod types;

pub use json::JsonReporter;
pub use markdown::MarkdownReporter;
pub use summary::SummaryReporter;
pub use text::TextReporter;
pub use types::{ReportConfig, ReportFormat, ReportMetadata};

use crate::diff::DiffSession;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during report generation
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Format error: {0}")]
    FormatError(#[from] std::fmt::Error),
}

/// Trait for report generators
pub trait ReportGenerator {
    /// Generate a report from the categories a session has run
    fn generate_diff_report(
        &self,
        session: &DiffSession<'_>,
        config: &ReportConfig,
    ) -> Result<String, ReportError>;

    /// Write report to a writer
    fn write_diff_report(
        &self,
        session: &DiffSession<'_>,
        config: &ReportConfig,
        writer: &mut dyn Write,
    ) -> Result<(), ReportError> {
        let report = self.generate_diff_report(session, config)?;
        writer.write_all(report.as_bytes())?;
        Ok(())
    }

    /// Get the format this generator produces
    fn format(&self) -> ReportFormat;
}

/// Create a report generator for the given format
#[must_use]
pub fn create_reporter(format: ReportFormat) -> Box<dyn ReportGenerator> {
    create_reporter_with_options(format, true)
}

/// Create a report generator with color control
#[must_use]
pub fn create_reporter_with_options(
    format: ReportFormat,
    use_color: bool,
) -> Box<dyn ReportGenerator> {
    match format {
        ReportFormat::Summary => {
            if use_color {
                Box::new(SummaryReporter::new())
            } else {
                Box::new(SummaryReporter::new().no_color())
            }
        }
        ReportFormat::Text => Box::new(TextReporter::new()),
        ReportFormat::Json => Box::new(JsonReporter::new()),
        ReportFormat::Markdown => Box::new(MarkdownReporter::new()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::model::{Policy, PolicyBuilder};

    fn base(name: &str) -> PolicyBuilder {
        PolicyBuilder::new(name)
            .class("file", None, &["read", "write", "getattr"])
            .type_("init_t", &[])
            .type_("etc_t", &[])
            .boolean("secure_mode", false)
    }

    /// Two small policies with a handful of differences.
    pub fn policies() -> (Policy, Policy) {
        let orig = base("orig")
            .type_("old_t", &[])
            .allow("init_t", "etc_t", "file", &["read", "write"])
            .allow("init_t", "old_t", "file", &["read"])
            .build()
            .unwrap_or_else(|e| panic!("orig: {e}"));
        let modified = base("modified")
            .type_("new_t", &[])
            .allow("init_t", "etc_t", "file", &["read", "getattr"])
            .build()
            .unwrap_or_else(|e| panic!("modified: {e}"));
        (orig, modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::CategoryMask;

    #[test]
    fn test_every_format_has_a_reporter() {
        let (orig, modified) = test_support::policies();
        let mut session = DiffSession::new(&orig, &modified, &[]).unwrap();
        session.run(CategoryMask::ALL).unwrap();
        for format in [
            ReportFormat::Summary,
            ReportFormat::Text,
            ReportFormat::Json,
            ReportFormat::Markdown,
        ] {
            let reporter = create_reporter_with_options(format, false);
            assert_eq!(reporter.format(), format);
            let report = reporter
                .generate_diff_report(&session, &ReportConfig::default())
                .unwrap();
            assert!(!report.is_empty());
        }
    }

    #[test]
    fn test_write_diff_report() {
        let (orig, modified) = test_support::policies();
        let mut session = DiffSession::new(&orig, &modified, &[]).unwrap();
        session.run(CategoryMask::TYPES).unwrap();
        let mut out = Vec::new();
        TextReporter::new()
            .write_diff_report(&session, &ReportConfig::default(), &mut out)
            .unwrap();
        assert!(String::from_utf8(out).unwrap().contains("+ new_t"));
    }
}
