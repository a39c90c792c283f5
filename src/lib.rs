//! bib2cff: convert a BibTeX entry and repository metadata into a CITATION.cff file.
//!
//! This library provides functionality to:
//! - Load a single BibTeX entry through the `biblatex` parser
//! - Split author names and attach ORCIDs
//! - Normalize release dates, page ranges, entry types and venues
//! - Merge bibliographic and repository metadata into one record
//! - Serialize that record in Citation File Format

pub mod authors;
pub mod bibfile;
pub mod error;
pub mod export;
pub mod normalize;
pub mod record;

pub use authors::{
    enrich_authors, normalize_orcid, split_authors, AuthorEnricher, AuthorRecord, OrcidTable,
};
pub use bibfile::{load, parse_entry, BibEntry};
pub use error::CffError;
pub use export::{cff_path, render, write_cff, DEFAULT_CFF_VERSION};
pub use normalize::{
    entry_type_table, map_entry_type, resolve_release_date, split_pages, DateParts,
};
pub use record::{CitationBuilder, CitationRecord, RepositoryInfo, DEFAULT_MESSAGE};
