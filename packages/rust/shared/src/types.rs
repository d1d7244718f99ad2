//! Core domain types for texforge paper directories.

use serde::{Deserialize, Serialize};

/// Metadata descriptor filename inside a paper directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Bibliographic data filename inside a paper directory. Its presence
/// alone selects the bibliography-aware build protocol.
pub const BIBLIOGRAPHY_FILE: &str = "refs.bib";

/// Build output subdirectory, cleared and recreated on every build.
pub const BUILD_DIR: &str = "__compiled";

/// Base name of the build unit (`main.tex` → `main.pdf`).
pub const BUILD_BASENAME: &str = "main";

/// Extension of content fragments discovered in a paper directory.
pub const FRAGMENT_EXTENSION: &str = "tex";

// ---------------------------------------------------------------------------
// PaperMetadata
// ---------------------------------------------------------------------------

/// The `metadata.json` structure stored at the root of a paper directory.
///
/// Every field is optional: an absent descriptor and an empty object
/// behave identically (no title block, no author block).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    /// Paper title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Subtitle, appended to the title after a forced line break.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Ordered author list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,
}

impl PaperMetadata {
    /// Whether no metadata was provided at all. An empty record gates
    /// exactly like an absent descriptor: no title block is emitted.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.subtitle.is_none() && self.authors.is_empty()
    }
}

/// A single author record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Author display name.
    pub name: String,

    /// Contact email, rendered as a footnote-style annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_parses_with_all_fields() {
        let json = r#"{
            "title": "On Things",
            "subtitle": "A Study",
            "authors": [
                {"name": "Ada Lovelace", "email": "ada@example.org"},
                {"name": "Charles Babbage"}
            ]
        }"#;
        let meta: PaperMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.title.as_deref(), Some("On Things"));
        assert_eq!(meta.subtitle.as_deref(), Some("A Study"));
        assert_eq!(meta.authors.len(), 2);
        assert_eq!(meta.authors[0].email.as_deref(), Some("ada@example.org"));
        assert!(meta.authors[1].email.is_none());
        assert!(!meta.is_empty());
    }

    #[test]
    fn metadata_parses_title_only() {
        let meta: PaperMetadata = serde_json::from_str(r#"{"title": "T"}"#).unwrap();
        assert_eq!(meta.title.as_deref(), Some("T"));
        assert!(meta.subtitle.is_none());
        assert!(meta.authors.is_empty());
    }

    #[test]
    fn empty_object_gates_like_absent_descriptor() {
        let meta: PaperMetadata = serde_json::from_str("{}").unwrap();
        assert!(meta.is_empty());
        assert_eq!(meta, PaperMetadata::default());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let meta: PaperMetadata =
            serde_json::from_str(r#"{"title": "T", "venue": "NeurIPS"}"#).unwrap();
        assert_eq!(meta.title.as_deref(), Some("T"));
    }
}
