//! Policy document loading.
//!
//! Reads a JSON or YAML [`PolicyDocument`] from disk or memory and turns it
//! into a validated [`Policy`].
//!
//! ## Usage
//!
//! ```no_run
//! use poldiff::parsers::{parse_policy, detect_format};
//! use std::path::Path;
//!
//! let policy = parse_policy(Path::new("base.yaml")).unwrap();
//! println!("{} declares {} types", policy.name(), policy.type_count());
//!
//! let content = std::fs::read_to_string("base.yaml").unwrap();
//! if let Some(format) = detect_format(&content) {
//!     println!("Detected: {}", format.name());
//! }
//! ```

mod detection;

pub use detection::{detect_for_path, detect_from_content, DetectionResult, DocumentFormat};

use crate::error::{ErrorContext, ParseErrorKind, PolDiffError, Result};
use crate::model::{Policy, PolicyDocument};
use std::path::Path;

/// Maximum policy document size (256 MB).
pub const MAX_POLICY_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Detect the document format from content without parsing.
#[must_use]
pub fn detect_format(content: &str) -> Option<DocumentFormat> {
    detect_from_content(content).format
}

/// Read and validate a policy file.
///
/// Returns an error if the file exceeds [`MAX_POLICY_FILE_SIZE`].
pub fn parse_policy(path: &Path) -> Result<Policy> {
    let document = parse_document(path)?;
    Policy::from_document(document).with_context(|| path.display().to_string())
}

/// Read a policy document without validating it.
pub fn parse_document(path: &Path) -> Result<PolicyDocument> {
    let metadata = std::fs::metadata(path).map_err(|e| PolDiffError::io(path, e))?;
    if metadata.len() > MAX_POLICY_FILE_SIZE {
        return Err(PolDiffError::parse(
            path.display().to_string(),
            ParseErrorKind::TooLarge {
                size: metadata.len(),
                limit: MAX_POLICY_FILE_SIZE,
            },
        ));
    }
    let content = std::fs::read_to_string(path).map_err(|e| PolDiffError::io(path, e))?;
    let detection = detect_for_path(path, &content);
    let format = detection.format.ok_or_else(|| {
        PolDiffError::parse(path.display().to_string(), ParseErrorKind::UnknownFormat)
    })?;
    tracing::debug!("Reading {} as {}", path.display(), format.name());
    parse_document_as(&content, format).with_context(|| path.display().to_string())
}

/// Parse and validate a policy from in-memory content.
pub fn parse_policy_str(content: &str) -> Result<Policy> {
    let format = detect_format(content)
        .ok_or_else(|| PolDiffError::parse("policy content", ParseErrorKind::UnknownFormat))?;
    Policy::from_document(parse_document_as(content, format)?)
}

fn parse_document_as(content: &str, format: DocumentFormat) -> Result<PolicyDocument> {
    let document = match format {
        DocumentFormat::Json => serde_json::from_str(content)?,
        DocumentFormat::Yaml => serde_yaml_ng::from_str(content)?,
    };
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = "name: minimal\nclasses:\n  - name: file\n    perms: [read]\ntypes:\n  - name: a_t\nav_rules:\n  - kind: allow\n    source: a_t\n    target: self\n    class: file\n    perms: [read]\n";

    #[test]
    fn test_parse_yaml_str() {
        let policy = parse_policy_str(MINIMAL).unwrap();
        assert_eq!(policy.name(), "minimal");
        assert_eq!(policy.av_rules().len(), 1);
    }

    #[test]
    fn test_parse_json_str() {
        let json = r#"{"name": "j", "types": [{"name": "a_t"}]}"#;
        let policy = parse_policy_str(json).unwrap();
        assert_eq!(policy.type_count(), 1);
    }

    #[test]
    fn test_parse_unknown_format() {
        let err = parse_policy_str("[]").unwrap_err();
        assert!(matches!(
            err,
            PolDiffError::Parse {
                source: ParseErrorKind::UnknownFormat,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_file_reports_path() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(b"name: broken\ntypes:\n  - name: a_t\n    attributes: [missing]\n")
            .unwrap();
        let err = parse_policy(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing"), "{message}");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_policy(Path::new("/nonexistent/policy.yaml")).unwrap_err();
        assert!(matches!(err, PolDiffError::Io { .. }));
    }
}
