//! Line-oriented plain-text extractor.
//!
//! The default for `.txt`, `.log`, code files and any unrecognized
//! extension, and the recursion target for archive members and decompressed
//! streams that turn out to be plain text. Each line is one text unit whose
//! locator is its 1-based line number.

use crate::error::Result;
use crate::locator;
use crate::matcher::{MatchedLine, Matcher, WindowStyle};
use crate::options::SearchOptions;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Claims no extensions: the dispatcher routes every unclaimed extension
/// here.
pub const EXTENSIONS: &[&str] = &[];

const BINARY_CHECK_SIZE: usize = 8000;

/// Null-byte sniff so unknown binary formats yield no garbage units.
pub fn is_binary(path: &Path) -> bool {
    if let Ok(mut file) = File::open(path) {
        let mut buffer = vec![0u8; BINARY_CHECK_SIZE];
        if let Ok(n) = file.read(&mut buffer) {
            if n > 0 {
                let null_bytes = buffer[..n].iter().filter(|&&b| b == 0).count();
                return (null_bytes as f64 / n as f64) > 0.3;
            }
        }
    }
    false
}

pub fn search(path: &Path, terms: &[String], opts: &SearchOptions) -> Result<Vec<MatchedLine>> {
    if is_binary(path) {
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader
        .lines()
        .map(|l| l.unwrap_or_default())
        .collect();

    let mut matcher = Matcher::new(path, terms, opts, WindowStyle::Plain)?;
    matcher.match_units(lines.iter().map(String::as_str), locator::LINE);
    Ok(matcher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture(content: &str) -> NamedTempFile {
        let mut f = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .expect("temp file");
        f.write_all(content.as_bytes()).expect("write fixture");
        f
    }

    #[test]
    fn line_numbers_are_one_based() {
        let f = fixture("alpha\nbeta\ngamma beta\n");
        let opts = SearchOptions::case_insensitive();
        let out = search(f.path(), &["beta".to_string()], &opts).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].line_number, 2);
        assert_eq!(out[1].line_number, 3);
        assert_eq!(out[0].content, "Line 2:\tbeta");
    }

    #[test]
    fn matched_substring_is_recoverable() {
        let f = fixture("The QUICK brown fox\n");
        let opts = SearchOptions::case_insensitive();
        let out = search(f.path(), &["quick".to_string()], &opts).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].matched_text().eq_ignore_ascii_case("quick"));
    }

    #[test]
    fn pangram_terms_count_independently() {
        let f = fixture(
            "The quick brown fox jumps over the lazy dog\nthe end of the line is near\n",
        );
        let opts = SearchOptions::case_insensitive();
        let the_only = search(f.path(), &["the".to_string()], &opts).unwrap();
        let quick_only = search(f.path(), &["quick".to_string()], &opts).unwrap();
        let both = search(
            f.path(),
            &["the".to_string(), "quick".to_string()],
            &opts,
        )
        .unwrap();
        assert_eq!(both.len(), the_only.len() + quick_only.len());
    }

    #[test]
    fn binary_files_yield_no_units() {
        let mut f = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        f.write_all(&[0u8; 4096]).unwrap();
        let opts = SearchOptions::case_insensitive();
        let out = search(f.path(), &["anything".to_string()], &opts).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn pre_cancelled_search_is_empty() {
        let f = fixture("match me\n");
        let opts = SearchOptions::case_insensitive();
        opts.cancel.cancel();
        let out = search(f.path(), &["match".to_string()], &opts).unwrap();
        assert!(out.is_empty());
    }
}
