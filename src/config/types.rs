//! Configuration types for poldiff operations.
//!
//! Provides structured configuration for the diff, typemap and validate
//! commands.

use crate::diff::{Category, CategoryMask, TypeRename};
use crate::reports::ReportFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// This is the top-level configuration struct that aggregates all configuration
/// options. It can be constructed from CLI arguments, config files, or both
/// (with CLI overriding file settings).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Which categories to compare and how
    pub diff: DiffSettings,
    /// Type rename declarations applied to every comparison
    pub renames: Vec<TypeRename>,
    /// Output configuration (format, file, colors)
    pub output: OutputConfig,
    /// Behavior flags
    pub behavior: BehaviorConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Restrict the comparison to these categories.
    pub fn categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.config.diff.categories = categories.into_iter().collect();
        self
    }

    /// Annotate rule differences with source line numbers.
    pub const fn line_numbers(mut self, enabled: bool) -> Self {
        self.config.diff.line_numbers = enabled;
        self
    }

    /// Declare that `original` was renamed to `modified`.
    pub fn rename(mut self, original: impl Into<String>, modified: impl Into<String>) -> Self {
        self.config.renames.push(TypeRename::new(original, modified));
        self
    }

    /// Set the output format.
    pub const fn output_format(mut self, format: ReportFormat) -> Self {
        self.config.output.format = format;
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    /// Cap the number of items listed per category.
    pub const fn max_items(mut self, max: Option<usize>) -> Self {
        self.config.output.max_items = max;
        self
    }

    /// Disable colored output.
    pub const fn no_color(mut self, no_color: bool) -> Self {
        self.config.output.no_color = no_color;
        self
    }

    /// Enable fail-on-change mode.
    pub const fn fail_on_change(mut self, fail: bool) -> Self {
        self.config.behavior.fail_on_change = fail;
        self
    }

    /// Enable quiet mode.
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.config.behavior.quiet = quiet;
        self
    }

    /// Build the `AppConfig`.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Command-specific Configuration Types
// ============================================================================

/// Configuration for a diff run, resolved from the CLI and the config file.
#[derive(Debug, Clone)]
pub struct DiffConfig {
    /// Paths to compare
    pub paths: DiffPaths,
    /// Categories to run
    pub mask: CategoryMask,
    /// Annotate rule differences with source line numbers
    pub line_numbers: bool,
    /// Type rename declarations
    pub renames: Vec<TypeRename>,
    /// Output configuration
    pub output: OutputConfig,
    /// Behavior flags
    pub behavior: BehaviorConfig,
}

impl DiffConfig {
    /// Resolve an application config against the two policy paths.
    #[must_use]
    pub fn from_app_config(paths: DiffPaths, app: &AppConfig) -> Self {
        Self {
            paths,
            mask: app.diff.mask(),
            line_numbers: app.diff.line_numbers,
            renames: app.renames.clone(),
            output: app.output.clone(),
            behavior: app.behavior.clone(),
        }
    }
}

/// Paths for diff operation
#[derive(Debug, Clone)]
pub struct DiffPaths {
    /// Path to the original policy
    pub original: PathBuf,
    /// Path to the modified policy
    pub modified: PathBuf,
}

// ============================================================================
// Sub-configuration Types
// ============================================================================

/// Category selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DiffSettings {
    /// Categories to compare; empty compares every category
    pub categories: Vec<Category>,
    /// Annotate AV and TE rule differences with source line numbers
    pub line_numbers: bool,
}

impl DiffSettings {
    /// The selected categories as a mask.
    #[must_use]
    pub fn mask(&self) -> CategoryMask {
        if self.categories.is_empty() {
            CategoryMask::ALL
        } else {
            self.categories.iter().copied().collect()
        }
    }
}

/// Output-related configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: ReportFormat,
    /// Output file path (None for stdout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Maximum items listed per category (None for all)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1))]
    pub max_items: Option<usize>,
    /// Disable colored output
    pub no_color: bool,
}

/// Behavior flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Exit with code 1 if any differences are found
    pub fail_on_change: bool,
    /// Suppress non-essential output
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = AppConfig::builder()
            .categories([Category::Types, Category::AvAllow])
            .line_numbers(true)
            .rename("foo_t", "bar_t")
            .output_format(ReportFormat::Json)
            .fail_on_change(true)
            .build();
        assert_eq!(config.diff.mask(), CategoryMask::TYPES | CategoryMask::AVALLOW);
        assert!(config.diff.line_numbers);
        assert_eq!(config.renames, vec![TypeRename::new("foo_t", "bar_t")]);
        assert_eq!(config.output.format, ReportFormat::Json);
        assert!(config.behavior.fail_on_change);
    }

    #[test]
    fn test_empty_selection_means_all() {
        assert_eq!(DiffSettings::default().mask(), CategoryMask::ALL);
    }

    #[test]
    fn test_diff_config_from_app_config() {
        let app = AppConfig::builder().rename("a_t", "b_t").quiet(true).build();
        let config = DiffConfig::from_app_config(
            DiffPaths {
                original: "a.yaml".into(),
                modified: "b.yaml".into(),
            },
            &app,
        );
        assert_eq!(config.mask, CategoryMask::ALL);
        assert_eq!(config.renames.len(), 1);
        assert!(config.behavior.quiet);
    }
}
