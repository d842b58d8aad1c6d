//! PDF extractor.
//!
//! One text unit per page. Page text comes out of the extraction library
//! with hard line breaks at rendering boundaries, so every break is
//! collapsed to a single space before matching; otherwise a phrase regex
//! would fail to span what the reader sees as one sentence.

use crate::error::{DocgrepError, Result};
use crate::locator;
use crate::matcher::{MatchedLine, Matcher, WindowStyle};
use crate::options::SearchOptions;
use std::path::Path;

pub const EXTENSIONS: &[&str] = &[".PDF"];

pub fn search(path: &Path, terms: &[String], opts: &SearchOptions) -> Result<Vec<MatchedLine>> {
    let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| {
        DocgrepError::FileProcessing {
            path: path.to_path_buf(),
            source: e.to_string().into(),
        }
    })?;

    let normalized: Vec<String> = pages.iter().map(|p| collapse_line_breaks(p)).collect();
    let mut matcher = Matcher::new(path, terms, opts, WindowStyle::Plain)?;
    matcher.match_units(normalized.iter().map(String::as_str), locator::PAGE);
    Ok(matcher.finish())
}

fn collapse_line_breaks(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
