//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::types::AppConfig;
use crate::reports::ReportFormat;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".poldiff.yaml",
    ".poldiff.yml",
    "poldiff.yaml",
    "poldiff.yml",
];

/// Where configuration files are looked for, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchLocation {
    CurrentDir,
    GitRoot,
    UserConfigDir,
    HomeDir,
}

impl SearchLocation {
    const ORDER: [Self; 4] = [
        Self::CurrentDir,
        Self::GitRoot,
        Self::UserConfigDir,
        Self::HomeDir,
    ];

    fn dir(self) -> Option<PathBuf> {
        match self {
            Self::CurrentDir => std::env::current_dir().ok(),
            Self::GitRoot => std::env::current_dir()
                .ok()
                .and_then(|cwd| enclosing_git_root(&cwd)),
            Self::UserConfigDir => user_config_dir(),
            Self::HomeDir => dirs::home_dir(),
        }
    }
}

/// Discover a config file.
///
/// An explicit path wins when it exists. Otherwise the current directory,
/// the enclosing git repository, the user config directory
/// (`~/.config/poldiff/`) and the home directory are searched in that order.
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path.filter(|p| p.is_file()) {
        return Some(path.to_path_buf());
    }
    SearchLocation::ORDER.into_iter().find_map(|location| {
        let found = location.dir().and_then(|dir| config_in_dir(&dir));
        if let Some(path) = &found {
            tracing::debug!("Found config via {location:?}: {}", path.display());
        }
        found
    })
}

/// The per-user configuration directory, `~/.config/poldiff` on Linux.
#[must_use]
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("poldiff"))
}

fn config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn enclosing_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Failure to load a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigFileError::NotFound(path.to_path_buf())
        } else {
            ConfigFileError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_yaml_ng::from_str(&content).map_err(|source| ConfigFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the discovered config file, falling back to defaults.
///
/// A file that exists but cannot be loaded is logged and ignored.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    let Some(path) = discover_config_file(explicit_path) else {
        return (AppConfig::default(), None);
    };
    match load_config_file(&path) {
        Ok(config) => {
            tracing::debug!("Loaded config from {}", path.display());
            (config, Some(path))
        }
        Err(e) => {
            tracing::warn!("Ignoring config: {e}");
            (AppConfig::default(), None)
        }
    }
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AppConfig {
    /// Merge another config into this one, with `other` taking precedence.
    ///
    /// Category selections replace each other; renames accumulate, with
    /// duplicates dropped.
    pub fn merge(&mut self, other: &Self) {
        if !other.diff.categories.is_empty() {
            self.diff.categories.clone_from(&other.diff.categories);
        }
        if other.diff.line_numbers {
            self.diff.line_numbers = true;
        }

        for rename in &other.renames {
            if !self.renames.contains(rename) {
                self.renames.push(rename.clone());
            }
        }

        // Defaults in `other` mean "not given" and leave self alone
        if other.output.format != ReportFormat::default() {
            self.output.format = other.output.format;
        }
        if other.output.file.is_some() {
            self.output.file.clone_from(&other.output.file);
        }
        if other.output.max_items.is_some() {
            self.output.max_items = other.output.max_items;
        }
        if other.output.no_color {
            self.output.no_color = true;
        }

        if other.behavior.fail_on_change {
            self.behavior.fail_on_change = true;
        }
        if other.behavior.quiet {
            self.behavior.quiet = true;
        }
    }

    /// Load from file and merge with CLI overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        cli_overrides: &Self,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge(cli_overrides);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    let example = AppConfig::default();
    format!(
        r"# poldiff configuration
# Place this file at .poldiff.yaml in your project root or ~/.config/poldiff/

{}",
        serde_yaml_ng::to_string(&example).unwrap_or_default()
    )
}

/// Generate a commented example config with all options.
#[must_use]
pub fn generate_full_example_config() -> String {
    r"# poldiff configuration file
# ===========================
#
# Place it at:
#   - .poldiff.yaml in your project root
#   - ~/.config/poldiff/poldiff.yaml for global config
#
# CLI arguments always override file settings.

# Category selection
diff:
  # Categories to compare; omit or leave empty for all. Names:
  #   classes, commons, types, attributes, roles, users, booleans,
  #   levels, categories, av-allow, av-audit-allow, av-dont-audit,
  #   av-never-allow, te-change, te-member, te-transition,
  #   role-allows, role-transitions, range-transitions
  categories: []
  # Annotate allow and type rule differences with source line numbers
  line_numbers: false

# Types renamed between the two policies
renames: []
#  - original: httpd_sys_content_t
#    modified: httpd_content_t

# Output configuration
output:
  # Format: summary, text, json, markdown
  format: text
  # Output file path (omit for stdout)
  # file: report.txt
  # Maximum items listed per category
  # max_items: 100
  # Disable colored output
  no_color: false

# Behavior flags
behavior:
  # Exit with code 1 if any differences are found
  fail_on_change: false
  # Suppress non-essential output
  quiet: false
"
    .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{Category, TypeRename};
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_in_dir() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(".poldiff.yaml");
        std::fs::write(&config_path, "diff:\n  line_numbers: true\n").unwrap();

        let found = config_in_dir(tmp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_dir_not_found() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(config_in_dir(tmp.path()), None);
    }

    #[test]
    fn test_load_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");

        let yaml = r"
diff:
  categories: [types, av-allow]
renames:
  - original: foo_t
    modified: bar_t
output:
  format: json
behavior:
  fail_on_change: true
";
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.diff.categories, vec![Category::Types, Category::AvAllow]);
        assert_eq!(config.renames, vec![TypeRename::new("foo_t", "bar_t")]);
        assert_eq!(config.output.format, ReportFormat::Json);
        assert!(config.behavior.fail_on_change);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config_file(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(ConfigFileError::NotFound(_))));
    }

    #[test]
    fn test_load_config_file_bad_category() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");
        std::fs::write(&config_path, "diff:\n  categories: [sids]\n").unwrap();
        assert!(matches!(
            load_config_file(&config_path),
            Err(ConfigFileError::Parse { .. })
        ));
    }

    #[test]
    fn test_config_merge() {
        let mut base = AppConfig::builder()
            .categories([Category::Types])
            .rename("a_t", "b_t")
            .build();
        let overrides = AppConfig::builder()
            .categories([Category::Roles])
            .rename("a_t", "b_t")
            .rename("c_t", "d_t")
            .output_format(ReportFormat::Markdown)
            .quiet(true)
            .build();

        base.merge(&overrides);

        assert_eq!(base.diff.categories, vec![Category::Roles]);
        assert_eq!(base.renames.len(), 2);
        assert_eq!(base.output.format, ReportFormat::Markdown);
        assert!(base.behavior.quiet);
    }

    #[test]
    fn test_merge_keeps_file_selection_without_override() {
        let mut base = AppConfig::builder().categories([Category::Users]).build();
        base.merge(&AppConfig::default());
        assert_eq!(base.diff.categories, vec![Category::Users]);
    }

    #[test]
    fn test_generated_examples_parse() {
        let example = generate_example_config();
        assert!(example.contains("diff:"));
        let parsed: AppConfig = serde_yaml_ng::from_str(&example).unwrap();
        assert_eq!(parsed, AppConfig::default());

        let full: AppConfig = serde_yaml_ng::from_str(&generate_full_example_config()).unwrap();
        assert_eq!(full, AppConfig::default());
    }

    #[test]
    fn test_git_root_walks_up() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join(".git")).unwrap();
        let nested = tmp.path().join("policy").join("modules");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(enclosing_git_root(&nested).as_deref(), Some(tmp.path()));
    }

    #[test]
    fn test_search_order_starts_local() {
        assert_eq!(SearchLocation::ORDER[0], SearchLocation::CurrentDir);
        assert_eq!(SearchLocation::ORDER[3], SearchLocation::HomeDir);
    }

    #[test]
    fn test_discover_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("custom-config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "behavior:\n  quiet: true").unwrap();

        let discovered = discover_config_file(Some(&config_path));
        assert_eq!(discovered, Some(config_path));
    }
}
