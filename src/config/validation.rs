//! Configuration validation for poldiff.
//!
//! Provides validation traits and implementations for all configuration types.

use super::types::{AppConfig, BehaviorConfig, DiffConfig, DiffSettings, OutputConfig};
use crate::diff::TypeRename;
use std::collections::BTreeSet;

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.diff.validate());
        errors.extend(self.renames.validate());
        errors.extend(self.output.validate());
        errors.extend(self.behavior.validate());
        errors
    }
}

impl Validatable for DiffSettings {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let mut seen = BTreeSet::new();
        for category in &self.categories {
            if !seen.insert(*category) {
                errors.push(ConfigError {
                    field: "diff.categories".to_string(),
                    message: format!("Category '{}' is listed more than once", category.name()),
                });
            }
        }

        if self.line_numbers
            && !self.mask().categories().any(|c| c.supports_line_numbers())
        {
            errors.push(ConfigError {
                field: "diff.line_numbers".to_string(),
                message: "Line numbers need at least one allow or type rule category".to_string(),
            });
        }

        errors
    }
}

/// Rename declarations are checked for shape only; whether the names exist
/// is up to the policies.
impl Validatable for Vec<TypeRename> {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut originals = BTreeSet::new();
        let mut modifieds = BTreeSet::new();

        for (i, rename) in self.iter().enumerate() {
            let field = format!("renames[{i}]");
            if rename.original.trim().is_empty() || rename.modified.trim().is_empty() {
                errors.push(ConfigError {
                    field,
                    message: "Both 'original' and 'modified' must be non-empty".to_string(),
                });
                continue;
            }
            if !originals.insert(rename.original.as_str()) {
                errors.push(ConfigError {
                    field: field.clone(),
                    message: format!("Original type '{}' is renamed twice", rename.original),
                });
            }
            if !modifieds.insert(rename.modified.as_str()) {
                errors.push(ConfigError {
                    field,
                    message: format!(
                        "Modified type '{}' is the target of two renames",
                        rename.modified
                    ),
                });
            }
        }

        errors
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        // Validate output file path if specified
        if let Some(parent) = self.file.as_ref().and_then(|f| f.parent()) {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                errors.push(ConfigError {
                    field: "output.file".to_string(),
                    message: format!("Parent directory does not exist: {}", parent.display()),
                });
            }
        }

        if self.max_items == Some(0) {
            errors.push(ConfigError {
                field: "output.max_items".to_string(),
                message: "Max items must be at least 1".to_string(),
            });
        }

        errors
    }
}

impl Validatable for BehaviorConfig {
    fn validate(&self) -> Vec<ConfigError> {
        // BehaviorConfig contains only boolean flags that don't need validation
        Vec::new()
    }
}

impl Validatable for DiffConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        // Validate paths exist
        if !self.paths.original.exists() {
            errors.push(ConfigError {
                field: "paths.original".to_string(),
                message: format!("File not found: {}", self.paths.original.display()),
            });
        }
        if !self.paths.modified.exists() {
            errors.push(ConfigError {
                field: "paths.modified".to_string(),
                message: format!("File not found: {}", self.paths.modified.display()),
            });
        }

        if self.mask.is_empty() {
            errors.push(ConfigError {
                field: "diff.categories".to_string(),
                message: "No categories selected".to_string(),
            });
        }

        errors.extend(self.renames.validate());
        errors.extend(self.output.validate());
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiffPaths;
    use crate::diff::{Category, CategoryMask};

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().is_valid());
    }

    #[test]
    fn test_duplicate_category() {
        let settings = DiffSettings {
            categories: vec![Category::Types, Category::Types],
            line_numbers: false,
        };
        let errors = settings.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "diff.categories");
    }

    #[test]
    fn test_line_numbers_need_rule_category() {
        let settings = DiffSettings {
            categories: vec![Category::Roles],
            line_numbers: true,
        };
        assert!(!settings.is_valid());
        let settings = DiffSettings {
            categories: vec![Category::TeTransition],
            line_numbers: true,
        };
        assert!(settings.is_valid());
    }

    #[test]
    fn test_conflicting_renames() {
        let renames = vec![
            TypeRename::new("a_t", "b_t"),
            TypeRename::new("a_t", "c_t"),
            TypeRename::new("d_t", "c_t"),
            TypeRename::new("", "e_t"),
        ];
        let errors = renames.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].to_string().contains("renamed twice"));
        assert!(errors[1].to_string().contains("target of two renames"));
        assert_eq!(errors[2].field, "renames[3]");
    }

    #[test]
    fn test_output_validation() {
        let output = OutputConfig {
            file: Some("/nonexistent/dir/report.txt".into()),
            max_items: Some(0),
            ..Default::default()
        };
        assert_eq!(output.validate().len(), 2);
    }

    #[test]
    fn test_diff_config_missing_files() {
        let config = DiffConfig {
            paths: DiffPaths {
                original: "/nonexistent/a.yaml".into(),
                modified: "/nonexistent/b.yaml".into(),
            },
            mask: CategoryMask::NONE,
            line_numbers: false,
            renames: Vec::new(),
            output: OutputConfig::default(),
            behavior: BehaviorConfig::default(),
        };
        let fields: Vec<String> = config.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["paths.original", "paths.modified", "diff.categories"]);
    }
}
