//! JSON report generator.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::diff::{Category, CategoryMask, DiffItem, DiffSession, RemapEntry, Side, Stats};
use crate::model::Policy;
use chrono::Utc;
use serde::Serialize;

/// JSON report generator
pub struct JsonReporter {
    /// Whether to only include summary
    summary_only: bool,
    /// Pretty print output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    #[must_use]
    pub const fn new() -> Self {
        Self {
            summary_only: false,
            pretty: true,
        }
    }

    /// Create a summary-only reporter
    #[must_use]
    pub const fn summary_only() -> Self {
        Self {
            summary_only: true,
            pretty: true,
        }
    }

    /// Set pretty printing
    #[must_use]
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for JsonReporter {
    fn generate_diff_report(
        &self,
        session: &DiffSession<'_>,
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let type_map = session.built_type_map().map(|map| TypeMapInfo {
            pseudo_types: map.len(),
            original_holes: map.holes(Side::Original),
            modified_holes: map.holes(Side::Modified),
            entries: map.entries(),
        });

        let report = JsonDiffReport {
            metadata: JsonReportMetadata {
                tool: ToolInfo {
                    name: "poldiff".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                generated_at: config
                    .metadata
                    .generated_at
                    .clone()
                    .unwrap_or_else(|| Utc::now().to_rfc3339()),
                original: PolicyInfo::new(
                    session.original(),
                    config.metadata.original_path.clone(),
                ),
                modified: PolicyInfo::new(
                    session.modified(),
                    config.metadata.modified_path.clone(),
                ),
            },
            type_map,
            summary: JsonSummary {
                total_changes: session.stats_for(CategoryMask::ALL).total(),
                totals: session.stats_for(CategoryMask::ALL),
                categories_compared: session.summaries().count(),
            },
            categories: session
                .summaries()
                .map(|summary| {
                    let items = if self.summary_only {
                        None
                    } else {
                        Some(config.limit(&summary.items).0)
                    };
                    JsonCategory {
                        category: summary.category,
                        label: summary.category.label(),
                        stats: summary.stats,
                        items,
                    }
                })
                .collect(),
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };

        json.map_err(|e| ReportError::SerializationError(e.to_string()))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }
}

// JSON structures

#[derive(Serialize)]
struct JsonDiffReport<'a> {
    metadata: JsonReportMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_map: Option<TypeMapInfo<'a>>,
    summary: JsonSummary,
    categories: Vec<JsonCategory<'a>>,
}

#[derive(Serialize)]
struct JsonReportMetadata {
    tool: ToolInfo,
    generated_at: String,
    original: PolicyInfo,
    modified: PolicyInfo,
}

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    version: String,
}

#[derive(Serialize)]
struct PolicyInfo {
    name: String,
    file_path: Option<String>,
    fingerprint: String,
    mls: bool,
    type_count: usize,
}

impl PolicyInfo {
    fn new(policy: &Policy, file_path: Option<String>) -> Self {
        Self {
            name: policy.name().to_string(),
            file_path,
            fingerprint: format!("{:016x}", policy.fingerprint()),
            mls: policy.is_mls(),
            type_count: policy.type_count(),
        }
    }
}

#[derive(Serialize)]
struct TypeMapInfo<'a> {
    pseudo_types: usize,
    original_holes: usize,
    modified_holes: usize,
    entries: &'a [RemapEntry],
}

#[derive(Serialize)]
struct JsonSummary {
    total_changes: usize,
    totals: Stats,
    categories_compared: usize,
}

#[derive(Serialize)]
struct JsonCategory<'a> {
    category: Category,
    label: &'static str,
    stats: Stats,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<&'a [DiffItem]>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::test_support::policies;

    fn report(reporter: &JsonReporter, config: &ReportConfig) -> serde_json::Value {
        let (orig, modified) = policies();
        let mut session = DiffSession::new(&orig, &modified, &[]).unwrap();
        session
            .run(CategoryMask::TYPES | CategoryMask::AVALLOW)
            .unwrap();
        let json = reporter.generate_diff_report(&session, config).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_json_structure() {
        let value = report(&JsonReporter::new(), &ReportConfig::default());
        assert_eq!(value["metadata"]["tool"]["name"], "poldiff");
        assert_eq!(value["metadata"]["original"]["name"], "orig");
        assert_eq!(value["metadata"]["modified"]["type_count"], 3);
        assert_eq!(value["summary"]["total_changes"], 4);
        assert_eq!(value["summary"]["categories_compared"], 2);

        let categories = value["categories"].as_array().unwrap();
        assert_eq!(categories[0]["category"], "types");
        assert_eq!(categories[0]["stats"]["added"], 1);
        let types = categories[0]["items"].as_array().unwrap();
        let named = |form: &str| {
            types
                .iter()
                .find(|item| item["form"] == form)
                .map(|item| item["name"].clone())
        };
        assert_eq!(named("added").unwrap(), "new_t");
        assert_eq!(named("removed").unwrap(), "old_t");
        assert_eq!(categories[1]["category"], "av-allow");
        assert!(value["type_map"]["entries"].as_array().is_some());
    }

    #[test]
    fn test_summary_only_and_compact() {
        let reporter = JsonReporter::summary_only().pretty(false);
        let (orig, modified) = policies();
        let mut session = DiffSession::new(&orig, &modified, &[]).unwrap();
        session.run(CategoryMask::TYPES).unwrap();
        let json = reporter
            .generate_diff_report(&session, &ReportConfig::default())
            .unwrap();
        assert!(!json.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["categories"][0].get("items").is_none());
    }

    #[test]
    fn test_fixed_timestamp_and_limit() {
        let mut config = ReportConfig::default();
        config.metadata.generated_at = Some("2024-01-01T00:00:00+00:00".to_string());
        config.max_items = Some(1);
        let value = report(&JsonReporter::new(), &config);
        assert_eq!(value["metadata"]["generated_at"], "2024-01-01T00:00:00+00:00");
        assert_eq!(value["categories"][0]["items"].as_array().unwrap().len(), 1);
    }
}
