//! The merged citation record.
//!
//! A [`CitationBuilder`] accumulates the bibliographic entry and the
//! repository information, then [`CitationBuilder::finalize`] normalizes both
//! into an immutable [`CitationRecord`] that the exporter serializes.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::authors::{enrich_authors, split_authors, AuthorEnricher, AuthorRecord};
use crate::bibfile::BibEntry;
use crate::error::CffError;
use crate::export::write_cff;
use crate::normalize::{
    map_entry_type, resolve_conference, resolve_journal, resolve_release_date, split_pages,
    DateParts,
};

/// Message used when the caller does not supply one.
pub const DEFAULT_MESSAGE: &str = "If you use this software, please cite it as below.";

/// Written as `repository-code` when no repository URL is known.
pub const MISSING_REPO_URL: &str = "N/A";

/// Repository metadata supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub repo_url: Option<String>,
    pub repo_doi: Option<String>,
    pub version: Option<String>,
    /// Citation request message; [`DEFAULT_MESSAGE`] when `None`
    pub message: Option<String>,
    /// Explicit release date, overriding every date field of the entry
    pub date_released: Option<String>,
    /// Separate repository authors. Not supported; must stay `None`.
    pub authors: Option<String>,
}

/// A finalized, normalized citation ready for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CitationRecord {
    /// BibTeX entry type as loaded, empty if the entry had none
    pub entry_type: String,
    pub cff_type: Option<String>,
    pub title: String,
    pub date_released: String,
    pub authors: Vec<AuthorRecord>,
    /// Number of names in the source `author` field
    pub author_count: usize,

    pub booktitle: Option<String>,
    pub journal: Option<String>,
    pub series: Option<String>,
    pub conference: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub editor: Option<String>,
    pub publisher: Option<String>,
    pub url: Option<String>,
    pub doi: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,

    pub repo_url: String,
    pub repo_doi: Option<String>,
    pub repo_version: Option<String>,
    pub message: String,
}

impl CitationRecord {
    /// The DOI for the document header: the publication DOI when there is
    /// one, the repository DOI otherwise.
    pub fn header_doi(&self) -> Option<&str> {
        self.doi.as_deref().or(self.repo_doi.as_deref())
    }
}

/// Accumulates the inputs of a conversion.
///
/// Both [`load_bibliographic`](Self::load_bibliographic) and
/// [`attach_repository`](Self::attach_repository) must be called before
/// [`finalize`](Self::finalize) or [`export`](Self::export).
#[derive(Debug, Clone, Default)]
pub struct CitationBuilder {
    bib: Option<BibEntry>,
    authors: Vec<AuthorRecord>,
    repo: Option<RepositoryInfo>,
}

impl CitationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the bibliographic entry and splits its authors.
    ///
    /// # Errors
    ///
    /// Returns [`CffError::MalformedInput`] if an author name does not have
    /// exactly one comma.
    pub fn load_bibliographic(&mut self, entry: BibEntry) -> Result<&mut Self, CffError> {
        self.authors = match entry.get("author") {
            Some(raw) => split_authors(raw)?,
            None => Vec::new(),
        };
        debug!(key = %entry.key, authors = self.authors.len(), "loaded bibliographic entry");
        self.bib = Some(entry);
        Ok(self)
    }

    /// Stores the repository information.
    ///
    /// # Errors
    ///
    /// Returns [`CffError::UnsupportedFeature`] if repository authors are
    /// given; merging a second author list is not implemented.
    pub fn attach_repository(&mut self, info: RepositoryInfo) -> Result<&mut Self, CffError> {
        if let Some(authors) = &info.authors {
            return Err(CffError::UnsupportedFeature(format!(
                "repository authors ('{}') different from the publication authors are not implemented",
                authors
            )));
        }
        debug!(repo_url = ?info.repo_url, "attached repository info");
        self.repo = Some(info);
        Ok(self)
    }

    /// Fills in missing ORCIDs through `enricher`.
    ///
    /// # Errors
    ///
    /// Returns [`CffError::Precondition`] if no entry was loaded yet.
    pub fn enrich_authors(
        &mut self,
        enricher: &mut dyn AuthorEnricher,
    ) -> Result<&mut Self, CffError> {
        if !self.is_bibtex_loaded() {
            return Err(CffError::Precondition(
                "load the BibTeX entry before adding ORCIDs".to_string(),
            ));
        }
        enrich_authors(&mut self.authors, enricher);
        Ok(self)
    }

    pub fn is_bibtex_loaded(&self) -> bool {
        self.bib.is_some()
    }

    pub fn is_repo_info_set(&self) -> bool {
        self.repo.is_some()
    }

    pub fn authors(&self) -> &[AuthorRecord] {
        &self.authors
    }

    /// Normalizes the accumulated inputs, dating undated entries today.
    pub fn finalize(&self) -> Result<CitationRecord, CffError> {
        self.finalize_at(Local::now().date_naive())
    }

    /// Normalizes the accumulated inputs into a [`CitationRecord`].
    ///
    /// `today` is used for the release date of entries without a year.
    ///
    /// # Errors
    ///
    /// - [`CffError::Precondition`] if the entry or the repository info is
    ///   missing
    /// - [`CffError::MalformedInput`] for a missing title or author, or
    ///   unparsable pages and dates
    /// - [`CffError::UnsupportedType`] for an entry type with no CFF
    ///   counterpart
    pub fn finalize_at(&self, today: NaiveDate) -> Result<CitationRecord, CffError> {
        let (bib, repo) = match (&self.bib, &self.repo) {
            (Some(bib), Some(repo)) => (bib, repo),
            (None, _) => {
                return Err(CffError::Precondition(
                    "BibTeX entry not yet provided".to_string(),
                ))
            }
            (_, None) => {
                return Err(CffError::Precondition(
                    "repository info not yet provided".to_string(),
                ))
            }
        };

        let title = bib.field("title").ok_or_else(|| {
            CffError::MalformedInput(format!("entry '{}' has no title", bib.key))
        })?;
        if self.authors.is_empty() {
            return Err(CffError::MalformedInput(format!(
                "entry '{}' has no author; CFF requires at least one",
                bib.key
            )));
        }

        let cff_type = if bib.entry_type.is_empty() {
            None
        } else {
            Some(map_entry_type(&bib.entry_type)?.to_string())
        };

        let date_released = resolve_release_date(
            &DateParts {
                date_released: repo.date_released.as_deref(),
                date: bib.get("date"),
                year: bib.get("year"),
                month: bib.get("month"),
                day: bib.get("day"),
            },
            today,
        )?;

        let (start, end) = match bib.get("pages") {
            Some(pages) => {
                let (start, end) = split_pages(pages)?;
                (Some(start), end)
            }
            None => (None, None),
        };

        let journal = resolve_journal(bib.field("journal"), bib.get("series"));
        let conference = resolve_conference(
            cff_type.as_deref(),
            bib.get("booktitle"),
            bib.field("conference"),
        );

        let record = CitationRecord {
            entry_type: bib.entry_type.clone(),
            cff_type,
            title,
            date_released,
            author_count: self.authors.len(),
            authors: self.authors.clone(),
            booktitle: bib.field("booktitle"),
            journal,
            series: bib.field("series"),
            conference,
            volume: bib.field("volume"),
            issue: bib.field("issue").or_else(|| bib.field("number")),
            editor: bib.field("editor"),
            publisher: bib.field("publisher"),
            url: bib.field("url"),
            doi: bib.field("doi"),
            abstract_text: bib.field("abstract"),
            start,
            end,
            repo_url: repo
                .repo_url
                .clone()
                .unwrap_or_else(|| MISSING_REPO_URL.to_string()),
            repo_doi: repo.repo_doi.clone(),
            repo_version: repo.version.clone(),
            message: repo
                .message
                .clone()
                .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
        };

        debug!(
            cff_type = ?record.cff_type,
            date_released = %record.date_released,
            "finalized citation record"
        );
        Ok(record)
    }

    /// Finalizes the record and writes it as a CFF file.
    ///
    /// Nothing is written if finalizing fails. Returns the path written,
    /// which always ends in `.cff`.
    pub fn export(&self, path: &Path, cff_version: &str) -> Result<PathBuf, CffError> {
        let record = self.finalize()?;
        write_cff(&record, path, cff_version)
    }
}
