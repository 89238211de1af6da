//! Report type definitions.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Compact per-category counts
    Summary,
    /// Full item listing in the classic poldiff layout
    #[default]
    Text,
    /// Structured JSON output
    Json,
    /// Human-readable Markdown
    Markdown,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

/// Configuration for report generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Maximum items listed per category
    pub max_items: Option<usize>,
    /// Show source line numbers for rule items that carry them
    pub show_line_numbers: bool,
    /// Title for the report
    pub title: Option<String>,
    /// Additional metadata to include
    pub metadata: ReportMetadata,
}

impl ReportConfig {
    /// Items of a category that fit under `max_items`, and how many were cut.
    #[must_use]
    pub fn limit<'a, T>(&self, items: &'a [T]) -> (&'a [T], usize) {
        match self.max_items {
            Some(max) if items.len() > max => (&items[..max], items.len() - max),
            _ => (items, 0),
        }
    }
}

/// Metadata included in reports
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Original policy file path
    pub original_path: Option<String>,
    /// Modified policy file path
    pub modified_path: Option<String>,
    /// Tool version
    pub tool_version: String,
    /// Generation timestamp
    pub generated_at: Option<String>,
}

impl ReportMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit() {
        let items = [1, 2, 3, 4];
        let config = ReportConfig {
            max_items: Some(3),
            ..Default::default()
        };
        assert_eq!(config.limit(&items), (&items[..3], 1));
        assert_eq!(ReportConfig::default().limit(&items), (&items[..], 0));
    }

    #[test]
    fn test_format_names() {
        assert_eq!(ReportFormat::default(), ReportFormat::Text);
        assert_eq!(ReportFormat::Markdown.to_string(), "markdown");
        assert_eq!(
            ReportFormat::from_str("json", true).unwrap(),
            ReportFormat::Json
        );
    }
}
