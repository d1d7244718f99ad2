//! Document assembler.
//!
//! Turns a paper directory into a composed LaTeX source: a fixed
//! preamble, conditional title/author commands, one inclusion directive
//! per fragment, and an optional bibliography directive pair. Fragment
//! content is never inlined — the composed document references fragment
//! files by name, one directory level up from the build output.
//!
//! This module performs no filesystem writes and spawns no processes.

use std::path::Path;

use tracing::debug;

use texforge_shared::{
    BIBLIOGRAPHY_FILE, BUILD_BASENAME, FRAGMENT_EXTENSION, METADATA_FILE, PaperMetadata, Result,
    TexforgeError,
};

/// Fixed style/package declarations shared by every build. The style
/// file itself is an opaque asset resolved through the search path.
const PREAMBLE_PACKAGES: &[&str] = &[
    // xcolor first: the listings theme below depends on it
    "\\usepackage{xcolor}",
    "\\usepackage[preprint]{neurips_2023}",
    "\\usepackage[utf8]{inputenc}",
    "\\usepackage{amsmath}",
    "\\usepackage[colorlinks=true,linkcolor=blue,citecolor=blue,urlcolor=blue]{hyperref}",
    "\\usepackage{url}",
    "\\usepackage{booktabs}",
    "\\usepackage{amsfonts}",
    "\\usepackage{nicefrac}",
    "\\usepackage{microtype}",
    "\\usepackage{listings}",
];

/// Fixed visual theme for code blocks.
const LISTINGS_THEME: &str = "\\lstset{
    backgroundcolor=\\color{gray!10},
    basicstyle=\\ttfamily\\small,
    breaklines=true,
    keywordstyle=\\color{blue},
    commentstyle=\\color{green!40!black},
    stringstyle=\\color{orange},
    frame=single
}";

// ---------------------------------------------------------------------------
// Paper directory inputs
// ---------------------------------------------------------------------------

/// Load the metadata descriptor if present.
///
/// Absence is a normal, first-class state and yields the empty record.
/// A descriptor that exists but does not parse is a fatal metadata
/// error, surfaced here rather than at each field access.
pub fn load_metadata(paper_dir: &Path) -> Result<PaperMetadata> {
    let path = paper_dir.join(METADATA_FILE);
    if !path.exists() {
        debug!(path = %path.display(), "no metadata descriptor, using empty record");
        return Ok(PaperMetadata::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| TexforgeError::io(&path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| TexforgeError::metadata(format!("invalid {}: {e}", path.display())))
}

/// List all content fragments in the paper directory, sorted by
/// filename. The sort is what makes assembly deterministic — directory
/// enumeration order is never trusted. An empty set is permitted.
pub fn discover_fragments(paper_dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(paper_dir).map_err(|e| TexforgeError::io(paper_dir, e))?;

    let mut fragments = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| TexforgeError::io(paper_dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(FRAGMENT_EXTENSION) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            fragments.push(name.to_string());
        }
    }

    fragments.sort();
    debug!(count = fragments.len(), "discovered fragments");
    Ok(fragments)
}

/// Whether the paper directory carries bibliographic data.
pub fn has_bibliography(paper_dir: &Path) -> bool {
    paper_dir.join(BIBLIOGRAPHY_FILE).exists()
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// In-memory composed document: ordered preamble and body lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedDocument {
    /// Style/package declarations plus conditional title/author commands.
    pub preamble: Vec<String>,
    /// Title block, inclusion directives, optional bibliography pair.
    pub body: Vec<String>,
}

impl ComposedDocument {
    /// Render the full LaTeX source text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.preamble {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("\\begin{document}\n");
        for line in &self.body {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("\\end{document}\n");
        out
    }
}

/// Compose the document from its inputs.
///
/// `with_bibliography` gates the bibliography directive pair; metadata
/// presence gates the title block; `title`/`authors` presence gates the
/// corresponding preamble commands.
pub fn compose(
    metadata: &PaperMetadata,
    fragments: &[String],
    with_bibliography: bool,
) -> ComposedDocument {
    let mut preamble = vec!["\\documentclass{article}".to_string()];
    preamble.extend(PREAMBLE_PACKAGES.iter().map(|s| s.to_string()));
    preamble.push(LISTINGS_THEME.to_string());

    if let Some(title) = title_command(metadata) {
        preamble.push(title);
    }
    if let Some(author) = author_command(metadata) {
        preamble.push(author);
    }

    let mut body = Vec::new();
    if !metadata.is_empty() {
        body.push("\\maketitle".to_string());
    }
    for fragment in fragments {
        // the composed source lives one level below the fragments
        body.push(format!("\\input{{../{fragment}}}"));
    }
    if with_bibliography {
        body.push("\\bibliographystyle{plainnat}".to_string());
        body.push(format!(
            "\\bibliography{{../{}}}",
            BIBLIOGRAPHY_FILE.trim_end_matches(".bib")
        ));
    }

    ComposedDocument { preamble, body }
}

/// `\title{...}`, emitted only when a title is present. The subtitle,
/// when present, follows a forced line break.
fn title_command(metadata: &PaperMetadata) -> Option<String> {
    let title = metadata.title.as_ref()?;
    let text = match &metadata.subtitle {
        Some(subtitle) => format!("{title} \\\\ {subtitle}"),
        None => title.clone(),
    };
    Some(format!("\\title{{{text}}}"))
}

/// `\author{...}`, emitted only when the author list is non-empty.
/// Entries are joined with ` \and `; an email becomes a footnote-style
/// `\thanks` annotation attached to the name.
fn author_command(metadata: &PaperMetadata) -> Option<String> {
    if metadata.authors.is_empty() {
        return None;
    }

    let entries: Vec<String> = metadata
        .authors
        .iter()
        .map(|author| match &author.email {
            Some(email) => format!("{}\\thanks{{\\texttt{{{email}}}}}", author.name),
            None => author.name.clone(),
        })
        .collect();

    Some(format!("\\author{{{}}}", entries.join(" \\and ")))
}

/// Name of the composed source file inside the build output directory.
pub fn source_file_name() -> String {
    format!("{BUILD_BASENAME}.tex")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use texforge_shared::Author;

    fn meta_with_title(title: &str) -> PaperMetadata {
        PaperMetadata {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    #[test]
    fn load_metadata_absent_is_empty_record() {
        let dir = tempfile::tempdir().unwrap();
        let meta = load_metadata(dir.path()).unwrap();
        assert!(meta.is_empty());
    }

    #[test]
    fn load_metadata_malformed_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(METADATA_FILE), "{not json").unwrap();
        let err = load_metadata(dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("metadata error"));
    }

    #[test]
    fn fragments_sorted_by_name_not_enumeration_order() {
        let dir = tempfile::tempdir().unwrap();
        // create out of order on purpose
        for name in ["03-results.tex", "01-intro.tex", "02-method.tex", "10-appendix.tex"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "not a fragment").unwrap();
        std::fs::create_dir(dir.path().join("figures.tex")).unwrap();

        let fragments = discover_fragments(dir.path()).unwrap();
        assert_eq!(
            fragments,
            vec!["01-intro.tex", "02-method.tex", "03-results.tex", "10-appendix.tex"]
        );
    }

    #[test]
    fn fragments_empty_directory_is_permitted() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_fragments(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn no_metadata_emits_no_title_block() {
        let doc = compose(&PaperMetadata::default(), &["01-a.tex".into()], false);
        let source = doc.render();
        assert!(!source.contains("\\maketitle"));
        assert!(!source.contains("\\title{"));
        assert!(!source.contains("\\author{"));
    }

    #[test]
    fn title_without_authors_emits_title_only() {
        let doc = compose(&meta_with_title("T"), &[], false);
        let source = doc.render();
        assert!(source.contains("\\title{T}"));
        assert!(source.contains("\\maketitle"));
        assert!(!source.contains("\\author{"));
    }

    #[test]
    fn subtitle_joined_with_forced_line_break() {
        let meta = PaperMetadata {
            title: Some("A".into()),
            subtitle: Some("B".into()),
            ..Default::default()
        };
        let doc = compose(&meta, &[], false);
        assert!(doc.preamble.contains(&"\\title{A \\\\ B}".to_string()));

        let doc = compose(&meta_with_title("A"), &[], false);
        assert!(doc.preamble.contains(&"\\title{A}".to_string()));
    }

    #[test]
    fn authors_joined_with_and_and_thanks_for_email() {
        let meta = PaperMetadata {
            authors: vec![
                Author {
                    name: "Ada".into(),
                    email: Some("ada@example.org".into()),
                },
                Author {
                    name: "Charles".into(),
                    email: None,
                },
            ],
            ..Default::default()
        };
        let doc = compose(&meta, &[], false);
        assert!(doc.preamble.contains(
            &"\\author{Ada\\thanks{\\texttt{ada@example.org}} \\and Charles}".to_string()
        ));
        // authors alone still gate the title block
        assert!(doc.body.contains(&"\\maketitle".to_string()));
    }

    #[test]
    fn inclusion_directives_reference_one_level_up_in_order() {
        let doc = compose(
            &PaperMetadata::default(),
            &["01-intro.tex".into(), "02-body.tex".into()],
            false,
        );
        let source = doc.render();
        let first = source.find("\\input{../01-intro.tex}").unwrap();
        let second = source.find("\\input{../02-body.tex}").unwrap();
        assert!(first < second);
    }

    #[test]
    fn bibliography_directives_gated_on_presence() {
        let with = compose(&PaperMetadata::default(), &[], true).render();
        assert!(with.contains("\\bibliographystyle{plainnat}"));
        assert!(with.contains("\\bibliography{../refs}"));

        let without = compose(&PaperMetadata::default(), &[], false).render();
        assert!(!without.contains("\\bibliographystyle"));
        assert!(!without.contains("\\bibliography{"));
    }

    #[test]
    fn composition_is_byte_identical_across_runs() {
        let meta = PaperMetadata {
            title: Some("T".into()),
            subtitle: Some("S".into()),
            authors: vec![Author {
                name: "Ada".into(),
                email: None,
            }],
        };
        let fragments = vec!["01-a.tex".to_string(), "02-b.tex".to_string()];
        let a = compose(&meta, &fragments, true).render();
        let b = compose(&meta, &fragments, true).render();
        assert_eq!(a, b);
    }

    #[test]
    fn end_to_end_scenario_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(METADATA_FILE), r#"{"title":"T"}"#).unwrap();
        std::fs::write(dir.path().join("01-intro.tex"), "intro").unwrap();
        std::fs::write(dir.path().join("02-body.tex"), "body").unwrap();

        let meta = load_metadata(dir.path()).unwrap();
        let fragments = discover_fragments(dir.path()).unwrap();
        let doc = compose(&meta, &fragments, has_bibliography(dir.path()));
        let source = doc.render();

        assert!(source.contains("\\title{T}"));
        assert!(!source.contains("\\author{"));
        assert!(source.contains("\\input{../01-intro.tex}"));
        assert!(source.contains("\\input{../02-body.tex}"));
        assert!(!source.contains("\\bibliography"));
        // fragment content is referenced, never inlined
        assert!(!source.contains("intro"));
    }

    #[test]
    fn preamble_is_invariant_across_metadata() {
        let bare = compose(&PaperMetadata::default(), &[], false);
        let titled = compose(&meta_with_title("T"), &[], false);
        // the fixed declarations are a prefix of both preambles
        assert_eq!(bare.preamble, titled.preamble[..titled.preamble.len() - 1]);
        let source = bare.render();
        assert!(source.contains("\\usepackage[preprint]{neurips_2023}"));
        assert!(source.contains("backgroundcolor=\\color{gray!10}"));
        assert!(source.contains("frame=single"));
    }
}
