//! **Semantic differencing of SELinux policies.**
//!
//! `poldiff` compares two policies by meaning rather than by text. Symbols
//! are matched by name, rules are matched after attribute expansion, and
//! types that were renamed, split or merged between the two policies are
//! lined up through a shared pseudo-type space before anything is compared.
//!
//! Nineteen categories are supported: classes, commons, types, attributes,
//! roles, users, booleans, MLS levels and categories, the four access vector
//! rule kinds, the three type rule kinds, role allows, role transitions and
//! range transitions.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: The queryable [`Policy`] and its declarative on-disk
//!   form, [`PolicyDocument`](model::PolicyDocument).
//! - **[`parsers`]**: Loads JSON or YAML policy documents.
//! - **[`diff`]**: The [`DiffSession`], the [`TypeMap`](diff::TypeMap) and
//!   one differ per category.
//! - **[`reports`]**: Summary, text, JSON and Markdown renderings of a session.
//! - **[`config`]**: Configuration files, presets and validation.
//! - **[`pipeline`]**: The parse, diff and report stages used by the CLI.
//!
//! ## Diffing Two Policies
//!
//! ```no_run
//! use std::path::Path;
//! use poldiff::{parse_policy, Category, CategoryMask, DiffSession, TypeRename};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let original = parse_policy(Path::new("base-1.0.yaml"))?;
//!     let modified = parse_policy(Path::new("base-1.1.yaml"))?;
//!
//!     let renames = [TypeRename::new("httpd_sys_content_t", "httpd_content_t")];
//!     let mut session = DiffSession::new(&original, &modified, &renames)?;
//!     session.run(CategoryMask::TYPES | CategoryMask::AVALLOW)?;
//!
//!     let stats = session.stats(Category::AvAllow)?;
//!     println!("allow rules: +{} -{} ~{}", stats.added, stats.removed, stats.modified);
//!     for item in session.items(Category::Types) {
//!         println!("{item}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Generating a Report
//!
//! ```no_run
//! use std::path::Path;
//! use poldiff::reports::{create_reporter, ReportConfig, ReportFormat};
//! use poldiff::{parse_policy, CategoryMask, DiffSession};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let original = parse_policy(Path::new("old.yaml"))?;
//!     let modified = parse_policy(Path::new("new.yaml"))?;
//!     let mut session = DiffSession::new(&original, &modified, &[])?;
//!     session.run(CategoryMask::ALL)?;
//!
//!     let reporter = create_reporter(ReportFormat::Markdown);
//!     println!("{}", reporter.generate_diff_report(&session, &ReportConfig::default())?);
//!     Ok(())
//! }
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
// Pedantic lints: allow categories that are design choices for this codebase
#![allow(
    // Counts and line numbers never approach the limits of the cast targets
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    // Doc completeness: # Errors / # Panics sections are aspirational
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    // Variable names like `orig_types`/`mod_types` are clear in context
    clippy::similar_names
)]

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod parsers;
pub mod pipeline;
pub mod reports;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigPreset};
pub use config::{BehaviorConfig, DiffSettings, OutputConfig};
pub use config::{ConfigError, Validatable};
pub use config::{DiffConfig, DiffPaths};
pub use diff::{
    Category, CategoryMask, CategorySummary, DiffForm, DiffItem, DiffSession, Stats, TypeRename,
};
pub use error::{ErrorContext, OptionContext, PolDiffError, Result};
pub use model::{Policy, PolicyBuilder, PolicyDocument};
pub use parsers::{parse_policy, parse_policy_str};
pub use reports::{ReportFormat, ReportGenerator};
