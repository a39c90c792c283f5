//! Author name splitting and ORCID enrichment.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::CffError;

/// Separator between authors in a BibTeX `author` field.
pub const AUTHOR_SEPARATOR: &str = " and ";

/// One author of the cited work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRecord {
    /// The name exactly as it appeared in the `author` field
    pub full_name: String,
    /// Text after the comma
    pub given_name: String,
    /// Text before the comma
    pub family_name: String,
    /// ORCID as a full `https://orcid.org/...` URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

impl AuthorRecord {
    /// `Family, Given` form used to match authors against ORCID tables.
    pub fn sort_name(&self) -> String {
        format!("{}, {}", self.family_name, self.given_name)
    }
}

/// Splits a BibTeX `author` field into one record per author.
///
/// Each author must be written as `Family, Given` with exactly one comma.
/// The output keeps the input order.
///
/// # Errors
///
/// Returns [`CffError::MalformedInput`] naming the first author whose comma
/// count is not one.
pub fn split_authors(raw: &str) -> Result<Vec<AuthorRecord>, CffError> {
    let authors = raw
        .split(AUTHOR_SEPARATOR)
        .map(|name| {
            let commas = name.matches(',').count();
            if commas != 1 {
                let problem = if commas == 0 { "no comma" } else { "more than one comma" };
                return Err(CffError::MalformedInput(format!(
                    "author '{}' has {} (expected 'Family, Given')",
                    name, problem
                )));
            }
            let (family, given) = name.split_once(',').unwrap_or((name, ""));
            Ok(AuthorRecord {
                full_name: name.to_string(),
                given_name: given.trim().to_string(),
                family_name: family.trim().to_string(),
                orcid: None,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = authors.len(), "split author field");
    Ok(authors)
}

fn orcid_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{4}-\d{4}-\d{3}[\dX]$").unwrap())
}

/// Normalizes user-supplied ORCID input to a full URL.
///
/// Accepts a bare identifier (`0000-0002-1825-0097`) or a URL on
/// `https://orcid.org/` or `https://www.orcid.org/`. Returns `None` for
/// anything else.
pub fn normalize_orcid(input: &str) -> Option<String> {
    let input = input.trim();
    if orcid_id_regex().is_match(input) {
        return Some(format!("https://orcid.org/{}", input));
    }
    ["https://orcid.org/", "https://www.orcid.org/"]
        .iter()
        .find_map(|prefix| input.strip_prefix(prefix))
        .filter(|id| orcid_id_regex().is_match(id))
        .map(|_| input.to_string())
}

/// Supplies ORCIDs for authors that do not have one yet.
pub trait AuthorEnricher {
    /// Returns the raw ORCID (identifier or URL) for `author`, or `None` to
    /// leave the author without one.
    fn orcid_for(&mut self, author: &AuthorRecord) -> Option<String>;
}

/// Asks `enricher` once for every author lacking an ORCID.
///
/// Answers that are not recognizable ORCIDs are logged and skipped; the
/// author keeps no ORCID.
pub fn enrich_authors(authors: &mut [AuthorRecord], enricher: &mut dyn AuthorEnricher) {
    for author in authors.iter_mut().filter(|a| a.orcid.is_none()) {
        let Some(raw) = enricher.orcid_for(author) else {
            continue;
        };
        if raw.trim().is_empty() {
            continue;
        }
        match normalize_orcid(&raw) {
            Some(orcid) => {
                debug!(author = %author.full_name, %orcid, "attached orcid");
                author.orcid = Some(orcid);
            }
            None => warn!(
                author = %author.full_name,
                input = %raw,
                "not recognised as an ORCID, skipping"
            ),
        }
    }
}

/// ORCIDs looked up by author name.
///
/// Keys match either the author's full name as written in the BibTeX field or
/// its `Family, Given` form, ignoring surrounding whitespace.
#[derive(Debug, Clone, Default)]
pub struct OrcidTable {
    by_name: HashMap<String, String>,
}

impl OrcidTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, orcid: &str) {
        self.by_name
            .insert(name.trim().to_string(), orcid.trim().to_string());
    }

    /// Parses a `NAME=ORCID` assignment, splitting on the last `=`.
    pub fn insert_assignment(&mut self, assignment: &str) -> Result<(), CffError> {
        let (name, orcid) = assignment.rsplit_once('=').ok_or_else(|| {
            CffError::MalformedInput(format!(
                "ORCID assignment '{}' must look like 'Family, Given=0000-0000-0000-0000'",
                assignment
            ))
        })?;
        self.insert(name, orcid);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl AuthorEnricher for OrcidTable {
    fn orcid_for(&mut self, author: &AuthorRecord) -> Option<String> {
        self.by_name
            .get(author.full_name.trim())
            .or_else(|| self.by_name.get(&author.sort_name()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Tests for split_authors ---

    #[test]
    fn test_split_authors_two() {
        // Given: two authors in Family, Given form
        let raw = "Doe, Jane and Smith, John";

        // When: we split them
        let authors = split_authors(raw).unwrap();

        // Then: order is kept and the comma separates family from given
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].family_name, "Doe");
        assert_eq!(authors[0].given_name, "Jane");
        assert_eq!(authors[1].family_name, "Smith");
        assert_eq!(authors[1].given_name, "John");
        assert_eq!(authors[1].full_name, "Smith, John");
    }

    #[test]
    fn test_split_authors_preserves_count() {
        let raw = "A, a and B, b and C, c and D, d";
        let authors = split_authors(raw).unwrap();
        assert_eq!(authors.len(), raw.split(" and ").count());
        let families: Vec<_> = authors.iter().map(|a| a.family_name.as_str()).collect();
        assert_eq!(families, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_split_authors_multiword_names() {
        let authors = split_authors("van der Berg, Anna Maria").unwrap();
        assert_eq!(authors[0].family_name, "van der Berg");
        assert_eq!(authors[0].given_name, "Anna Maria");
    }

    #[test]
    fn test_split_authors_no_comma() {
        let result = split_authors("Doe Jane");
        match result {
            Err(CffError::MalformedInput(msg)) => {
                assert!(msg.contains("Doe Jane"), "{}", msg);
                assert!(msg.contains("no comma"), "{}", msg);
            }
            other => panic!("Expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_split_authors_two_commas() {
        let result = split_authors("Doe, Jane and King, Martin, Jr.");
        match result {
            Err(CffError::MalformedInput(msg)) => {
                assert!(msg.contains("King, Martin, Jr."), "{}", msg)
            }
            other => panic!("Expected MalformedInput, got {:?}", other),
        }
    }

    // --- Tests for normalize_orcid ---

    #[test]
    fn test_normalize_orcid_bare_id() {
        assert_eq!(
            normalize_orcid("0000-0002-1825-0097").as_deref(),
            Some("https://orcid.org/0000-0002-1825-0097")
        );
    }

    #[test]
    fn test_normalize_orcid_checksum_x() {
        assert_eq!(
            normalize_orcid("0000-0002-1694-233X").as_deref(),
            Some("https://orcid.org/0000-0002-1694-233X")
        );
    }

    #[test]
    fn test_normalize_orcid_urls_kept() {
        for url in [
            "https://orcid.org/0000-0002-1825-0097",
            "https://www.orcid.org/0000-0002-1825-0097",
        ] {
            assert_eq!(normalize_orcid(url).as_deref(), Some(url));
        }
    }

    #[test]
    fn test_normalize_orcid_rejects_garbage() {
        assert_eq!(normalize_orcid("1234"), None);
        assert_eq!(normalize_orcid("http://orcid.org/0000-0002-1825-0097"), None);
        assert_eq!(normalize_orcid("https://orcid.org/not-an-id"), None);
    }

    // --- Tests for enrichment ---

    struct Scripted(Vec<Option<String>>);

    impl AuthorEnricher for Scripted {
        fn orcid_for(&mut self, _author: &AuthorRecord) -> Option<String> {
            self.0.remove(0)
        }
    }

    #[test]
    fn test_enrich_authors_asks_only_missing() {
        // Given: two authors, the first already has an ORCID
        let mut authors = split_authors("Doe, Jane and Smith, John").unwrap();
        authors[0].orcid = Some("https://orcid.org/0000-0001-0000-0001".to_string());
        let mut enricher = Scripted(vec![Some("0000-0002-1825-0097".to_string())]);

        // When: we enrich
        enrich_authors(&mut authors, &mut enricher);

        // Then: only the second author was asked, and every answer was used
        assert!(enricher.0.is_empty());
        assert_eq!(
            authors[1].orcid.as_deref(),
            Some("https://orcid.org/0000-0002-1825-0097")
        );
    }

    #[test]
    fn test_enrich_authors_skips_invalid_and_empty() {
        let mut authors = split_authors("Doe, Jane and Smith, John").unwrap();
        let mut enricher = Scripted(vec![Some("".to_string()), Some("nope".to_string())]);

        enrich_authors(&mut authors, &mut enricher);

        assert!(authors.iter().all(|a| a.orcid.is_none()));
    }

    #[test]
    fn test_orcid_table_matches_both_name_forms() {
        let mut table = OrcidTable::new();
        table.insert("Doe, Jane", "0000-0002-1825-0097");
        table
            .insert_assignment("Smith,John=https://orcid.org/0000-0001-5109-3700")
            .unwrap();
        let mut authors = split_authors("Doe, Jane and Smith,John").unwrap();

        enrich_authors(&mut authors, &mut table);

        assert_eq!(
            authors[0].orcid.as_deref(),
            Some("https://orcid.org/0000-0002-1825-0097")
        );
        assert_eq!(
            authors[1].orcid.as_deref(),
            Some("https://orcid.org/0000-0001-5109-3700")
        );
    }

    #[test]
    fn test_orcid_assignment_without_equals() {
        let mut table = OrcidTable::new();
        assert!(table.insert_assignment("Doe, Jane").is_err());
        assert!(table.is_empty());
    }
}
