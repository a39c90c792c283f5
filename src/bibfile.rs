//! BibTeX loading.
//!
//! Parses a `.bib` source with the `biblatex` crate and reduces its single
//! entry to the plain field-name to string mapping the rest of the pipeline
//! works on.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use biblatex::{Bibliography, ChunksExt, EntryType};
use serde::Serialize;
use tracing::debug;

use crate::error::CffError;

/// Fields copied out of the source entry. Everything else is ignored.
pub const FIELD_ALLOW_LIST: &[&str] = &[
    "title",
    "booktitle",
    "pages",
    "year",
    "month",
    "day",
    "date",
    "journal",
    "volume",
    "series",
    "issue",
    "number",
    "editor",
    "publisher",
    "url",
    "doi",
    "abstract",
    "conference",
    "author",
];

/// A single bibliographic entry reduced to its type and allow-listed fields.
///
/// Fields missing from the source are missing here too; nothing is filled in
/// with a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BibEntry {
    /// Lower-cased BibTeX entry type, e.g. `inproceedings`
    pub entry_type: String,
    /// Citation key, empty when built programmatically without one
    pub key: String,
    fields: BTreeMap<String, String>,
}

impl BibEntry {
    /// Builds an entry from an already-parsed field mapping.
    ///
    /// Field names are lower-cased, values have their whitespace collapsed and
    /// fields outside [`FIELD_ALLOW_LIST`] are dropped.
    pub fn from_fields<I, K, V>(entry_type: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let fields = fields
            .into_iter()
            .filter_map(|(name, value)| {
                let name = name.as_ref().to_lowercase();
                FIELD_ALLOW_LIST
                    .contains(&name.as_str())
                    .then(|| (name, collapse_whitespace(value.as_ref())))
            })
            .collect();

        BibEntry {
            entry_type: entry_type.trim().to_lowercase(),
            key: String::new(),
            fields,
        }
    }

    /// Sets the citation key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Returns the value of a field, if the entry has it.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Returns an owned copy of a field, if the entry has it.
    pub fn field(&self, field: &str) -> Option<String> {
        self.fields.get(field).cloned()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

/// Loads the single entry of a BibTeX file.
///
/// # Errors
///
/// Returns [`CffError::Io`] if the file cannot be read, and
/// [`CffError::MalformedInput`] if it does not parse or does not hold exactly
/// one entry.
pub fn load(path: &Path) -> Result<BibEntry, CffError> {
    let content = fs::read_to_string(path).map_err(|e| CffError::io(path, e))?;
    debug!(path = %path.display(), bytes = content.len(), "read bibtex source");
    parse_entry(&content)
}

/// Parses BibTeX source text that must contain exactly one entry.
pub fn parse_entry(src: &str) -> Result<BibEntry, CffError> {
    let bibliography = Bibliography::parse(src)
        .map_err(|e| CffError::MalformedInput(format!("invalid BibTeX: {}", e)))?;

    if bibliography.len() != 1 {
        return Err(CffError::MalformedInput(format!(
            "expected exactly 1 entry in the BibTeX source, found {}",
            bibliography.len()
        )));
    }

    let entry = bibliography
        .iter()
        .next()
        .ok_or_else(|| CffError::MalformedInput("BibTeX source has no entry".to_string()))?;

    let fields = entry
        .fields
        .iter()
        .map(|(name, chunks)| (name.clone(), chunks.format_verbatim()));
    let bib = BibEntry::from_fields(&entry_type_name(&entry.entry_type), fields).with_key(&entry.key);

    debug!(
        key = %bib.key,
        entry_type = %bib.entry_type,
        fields = bib.fields.len(),
        "parsed bibtex entry"
    );
    Ok(bib)
}

/// The type name as written in the source. Types `biblatex` does not know
/// keep their own name rather than displaying as `unknown`.
fn entry_type_name(entry_type: &EntryType) -> String {
    match entry_type {
        EntryType::Unknown(name) => name.clone(),
        known => known.to_string(),
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
