//! Shared test constants and helpers for integration tests.

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

/// Conference paper with two authors, pages and a publication DOI.
pub const CONFERENCE_BIB: &str = r#"
@inproceedings{doe2022,
  author    = {Doe, Jane and Smith, John},
  title     = {Learning Things},
  booktitle = {ICML},
  publisher = {PMLR},
  year      = {2022},
  month     = {3},
  pages     = {100--110},
  doi       = {10.1000/paper}
}
"#;

/// Entry whose single author has no comma.
pub const MALFORMED_AUTHOR_BIB: &str = r#"
@article{doe2020,
  author  = {Jane Doe},
  title   = {Bad Names},
  journal = {Nature},
  year    = {2020}
}
"#;

/// Two entries; only single-entry sources are accepted.
pub const TWO_ENTRIES_BIB: &str = r#"
@misc{first, author = {Doe, Jane}, title = {First}, year = {2020}}
@misc{second, author = {Roe, Rick}, title = {Second}, year = {2021}}
"#;

/// Create a temporary file with the given content and extension.
pub fn create_temp_file(content: &str, extension: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(extension)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
