//! Format detection for policy documents.
//!
//! Documents are either JSON or YAML. The file extension wins when it is
//! conclusive; otherwise the content is sniffed.

use std::path::Path;

/// Serialization format of a policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Get the human-readable name for this format.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }

    /// Guess the format from a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Result of format detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    /// The detected format, if any
    pub format: Option<DocumentFormat>,
    /// Any warnings about the detection
    pub warnings: Vec<String>,
}

impl DetectionResult {
    fn detected(format: DocumentFormat) -> Self {
        Self {
            format: Some(format),
            warnings: Vec::new(),
        }
    }

    fn unknown(reason: &str) -> Self {
        Self {
            format: None,
            warnings: vec![reason.to_string()],
        }
    }

    /// Whether a format was found.
    #[must_use]
    pub const fn can_parse(&self) -> bool {
        self.format.is_some()
    }
}

/// Sniff the format of document content.
///
/// A leading `{` means JSON. Anything that starts like a YAML mapping
/// (a document marker, a comment or a `key:` line) is YAML.
#[must_use]
pub fn detect_from_content(content: &str) -> DetectionResult {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    let Some(first) = trimmed.chars().next() else {
        return DetectionResult::unknown("Empty content");
    };

    let result = match first {
        '{' => DetectionResult::detected(DocumentFormat::Json),
        '#' => DetectionResult::detected(DocumentFormat::Yaml),
        '-' if trimmed.starts_with("---") => DetectionResult::detected(DocumentFormat::Yaml),
        c if c.is_ascii_alphabetic() || c == '_' || c == '"' => {
            let first_line = trimmed.lines().next().unwrap_or_default();
            if first_line.contains(':') {
                DetectionResult::detected(DocumentFormat::Yaml)
            } else {
                DetectionResult::unknown("First line is not a mapping entry")
            }
        }
        _ => DetectionResult::unknown("Unrecognized content format"),
    };

    tracing::debug!(
        "Format detection: {}",
        result.format.map_or("unknown", |f| f.name())
    );
    result
}

/// Detect the format of a file, preferring its extension.
#[must_use]
pub fn detect_for_path(path: &Path, content: &str) -> DetectionResult {
    match DocumentFormat::from_path(path) {
        Some(format) => DetectionResult::detected(format),
        None => detect_from_content(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_json() {
        let result = detect_from_content("  {\"name\": \"base\"}");
        assert_eq!(result.format, Some(DocumentFormat::Json));
    }

    #[test]
    fn test_detect_yaml() {
        assert_eq!(
            detect_from_content("name: base\ntypes: []\n").format,
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(
            detect_from_content("---\nname: base\n").format,
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(
            detect_from_content("# policy\nname: base\n").format,
            Some(DocumentFormat::Yaml)
        );
    }

    #[test]
    fn test_detect_unknown() {
        let result = detect_from_content("");
        assert!(!result.can_parse());
        assert_eq!(result.warnings, vec!["Empty content"]);
        assert!(!detect_from_content("[1, 2]").can_parse());
        assert!(!detect_from_content("just some words").can_parse());
    }

    #[test]
    fn test_extension_wins() {
        let result = detect_for_path(Path::new("policy.yml"), "{\"name\": \"x\"}");
        assert_eq!(result.format, Some(DocumentFormat::Yaml));
        let result = detect_for_path(Path::new("policy.txt"), "{\"name\": \"x\"}");
        assert_eq!(result.format, Some(DocumentFormat::Json));
    }
}
