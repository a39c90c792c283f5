//! CFF serialization.
//!
//! Writes a [`CitationRecord`] as a `CITATION.cff` document. Key order is
//! fixed and every value is written as a double-quoted string.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::authors::AuthorRecord;
use crate::error::CffError;
use crate::normalize::FALLBACK_CFF_TYPE;
use crate::record::CitationRecord;

/// CFF schema version written when the caller does not choose one.
pub const DEFAULT_CFF_VERSION: &str = "1.2.0";

/// Renders a finalized record as CFF text.
///
/// # Panics
///
/// Panics if `record.author_count` disagrees with the number of authors,
/// which means the record was altered after finalizing.
pub fn render(record: &CitationRecord, cff_version: &str) -> String {
    assert_eq!(
        record.author_count,
        record.authors.len(),
        "author count changed after the author field was split"
    );

    let mut out = String::new();

    // Header
    push_field(&mut out, 0, "date-released", &record.date_released);
    push_field(&mut out, 0, "repository-code", &record.repo_url);
    push_field(&mut out, 0, "message", &record.message);
    if let Some(doi) = record.header_doi() {
        push_field(&mut out, 0, "doi", doi);
    }
    push_field(&mut out, 0, "title", &record.title);
    push_field(&mut out, 0, "cff-version", cff_version);
    if let Some(version) = &record.repo_version {
        push_field(&mut out, 0, "version", version);
    }

    push_authors(&mut out, 0, &record.authors);

    // Preferred citation
    out.push_str("preferred-citation:\n");
    push_field(
        &mut out,
        2,
        "type",
        record.cff_type.as_deref().unwrap_or(FALLBACK_CFF_TYPE),
    );
    if let Some(publisher) = &record.publisher {
        out.push_str("  publisher:\n");
        push_field(&mut out, 4, "name", publisher);
    }
    if let Some(conference) = &record.conference {
        out.push_str("  conference:\n");
        push_field(&mut out, 4, "name", conference);
    }

    let date_released = Some(record.date_released.clone());
    let title = Some(record.title.clone());
    let optional_fields: [(&str, &Option<String>); 13] = [
        ("doi", &record.doi),
        ("url", &record.url),
        ("date-released", &date_released),
        ("issue", &record.issue),
        ("volume", &record.volume),
        ("journal", &record.journal),
        ("title", &title),
        ("booktitle", &record.booktitle),
        ("editor", &record.editor),
        ("series", &record.series),
        ("publisher", &record.publisher),
        ("start", &record.start),
        ("end", &record.end),
    ];
    for (key, value) in optional_fields {
        if let Some(value) = value {
            push_field(&mut out, 2, key, value);
        }
    }

    push_authors(&mut out, 2, &record.authors);

    out
}

/// Returns `path` with a `.cff` suffix, appending one if missing.
pub fn cff_path(path: &Path) -> PathBuf {
    if path.as_os_str().to_string_lossy().ends_with(".cff") {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_owned();
    name.push(".cff");
    PathBuf::from(name)
}

/// Renders `record` and writes it to `path` (with `.cff` appended if needed).
///
/// The document is rendered completely before the file is created, so a
/// rendering problem never leaves a file behind.
///
/// # Returns
///
/// The path that was written.
///
/// # Errors
///
/// Returns [`CffError::Io`] if the file cannot be created or written.
pub fn write_cff(
    record: &CitationRecord,
    path: &Path,
    cff_version: &str,
) -> Result<PathBuf, CffError> {
    let path = cff_path(path);
    let content = render(record, cff_version);
    debug!(bytes = content.len(), "rendered cff document");

    let file = File::create(&path).map_err(|e| CffError::io(&path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(content.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|e| CffError::io(&path, e))?;

    info!(path = %path.display(), "wrote citation file");
    Ok(path)
}

fn push_field(out: &mut String, indent: usize, key: &str, value: &str) {
    out.push_str(&format!("{:indent$}{}: {}\n", "", key, quote(value), indent = indent));
}

fn push_authors(out: &mut String, indent: usize, authors: &[AuthorRecord]) {
    out.push_str(&format!("{:indent$}authors:\n", "", indent = indent));
    for author in authors {
        out.push_str(&format!(
            "{:indent$}  - family-names: {}\n",
            "",
            quote(&author.family_name),
            indent = indent
        ));
        push_field(out, indent + 4, "given-names", &author.given_name);
        if let Some(orcid) = &author.orcid {
            push_field(out, indent + 4, "orcid", orcid);
        }
    }
}

/// Double-quotes a scalar. JSON string escaping is valid YAML.
fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CitationRecord {
        CitationRecord {
            entry_type: "inproceedings".to_string(),
            cff_type: Some("conference-paper".to_string()),
            title: "Learning Things".to_string(),
            date_released: "2022-01-01".to_string(),
            authors: vec![AuthorRecord {
                full_name: "Doe, Jane".to_string(),
                given_name: "Jane".to_string(),
                family_name: "Doe".to_string(),
                orcid: Some("https://orcid.org/0000-0002-1825-0097".to_string()),
            }],
            author_count: 1,
            booktitle: Some("ICML".to_string()),
            journal: None,
            series: None,
            conference: Some("ICML".to_string()),
            volume: None,
            issue: None,
            editor: None,
            publisher: Some("PMLR".to_string()),
            url: None,
            doi: Some("10.1000/paper".to_string()),
            abstract_text: Some("Never written out.".to_string()),
            start: Some("100".to_string()),
            end: Some("110".to_string()),
            repo_url: "https://github.com/doe/things".to_string(),
            repo_doi: Some("10.5281/zenodo.1".to_string()),
            repo_version: Some("1.0".to_string()),
            message: "Cite me.".to_string(),
        }
    }

    #[test]
    fn test_render_full_document() {
        // Given: a conference paper record with every block populated
        let record = record();

        // When: we render it
        let out = render(&record, DEFAULT_CFF_VERSION);

        // Then: keys appear in the fixed order with quoted values
        let expected = r#"date-released: "2022-01-01"
repository-code: "https://github.com/doe/things"
message: "Cite me."
doi: "10.1000/paper"
title: "Learning Things"
cff-version: "1.2.0"
version: "1.0"
authors:
  - family-names: "Doe"
    given-names: "Jane"
    orcid: "https://orcid.org/0000-0002-1825-0097"
preferred-citation:
  type: "conference-paper"
  publisher:
    name: "PMLR"
  conference:
    name: "ICML"
  doi: "10.1000/paper"
  date-released: "2022-01-01"
  title: "Learning Things"
  booktitle: "ICML"
  publisher: "PMLR"
  start: "100"
  end: "110"
  authors:
    - family-names: "Doe"
      given-names: "Jane"
      orcid: "https://orcid.org/0000-0002-1825-0097"
"#;
        assert_eq!(out, expected);
    }

    #[test]
    fn test_render_omits_absent_optionals() {
        let mut record = record();
        record.doi = None;
        record.repo_doi = None;
        record.repo_version = None;
        record.publisher = None;
        record.conference = None;
        record.cff_type = None;

        let out = render(&record, DEFAULT_CFF_VERSION);

        assert!(!out.contains("doi:"), "{}", out);
        assert!(!out.contains("\nversion:"), "{}", out);
        assert!(!out.contains("publisher"), "{}", out);
        assert!(!out.contains("conference"), "{}", out);
        assert!(out.contains("  type: \"generic\"\n"), "{}", out);
    }

    #[test]
    fn test_render_repo_doi_fallback() {
        let mut record = record();
        record.doi = None;
        let out = render(&record, DEFAULT_CFF_VERSION);
        assert!(out.contains("doi: \"10.5281/zenodo.1\"\n"), "{}", out);
        // The repository DOI is not the publication's
        assert!(!out.contains("  doi:"), "{}", out);
    }

    #[test]
    fn test_render_escapes_quotes() {
        let mut record = record();
        record.title = r#"The "Best" Paper"#.to_string();
        let out = render(&record, DEFAULT_CFF_VERSION);
        assert!(out.contains(r#"title: "The \"Best\" Paper""#), "{}", out);
    }

    #[test]
    fn test_render_custom_cff_version() {
        let out = render(&record(), "1.1.0");
        assert!(out.contains("cff-version: \"1.1.0\"\n"));
    }

    #[test]
    #[should_panic(expected = "author count")]
    fn test_render_author_count_mismatch_panics() {
        let mut record = record();
        record.author_count = 2;
        render(&record, DEFAULT_CFF_VERSION);
    }

    #[test]
    fn test_cff_path_appends_extension() {
        assert_eq!(cff_path(Path::new("CITATION")), PathBuf::from("CITATION.cff"));
        assert_eq!(cff_path(Path::new("out.txt")), PathBuf::from("out.txt.cff"));
        assert_eq!(
            cff_path(Path::new("dir/CITATION.cff")),
            PathBuf::from("dir/CITATION.cff")
        );
    }

    #[test]
    fn test_cff_path_keeps_bare_suffix_name() {
        assert_eq!(cff_path(Path::new(".cff")), PathBuf::from(".cff"));
        assert_eq!(cff_path(Path::new("dir/.cff")), PathBuf::from("dir/.cff"));
    }

    #[test]
    fn test_write_cff_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_cff(&record(), &dir.path().join("CITATION"), "1.2.0").unwrap();

        assert_eq!(written, dir.path().join("CITATION.cff"));
        let content = std::fs::read_to_string(&written).unwrap();
        assert_eq!(content, render(&record(), "1.2.0"));
    }

    #[test]
    fn test_write_cff_unwritable_destination() {
        let result = write_cff(&record(), Path::new("/nonexistent/dir/CITATION"), "1.2.0");
        assert!(matches!(result, Err(CffError::Io { .. })));
    }
}
