//! Format registry and dispatcher.
//!
//! Maps a file's extension to the extractor that knows how to turn it into
//! searchable text units. The table is an explicit registry built once on
//! first use; an unclaimed extension is never an error and falls back to the
//! line-oriented plain-text extractor.

use crate::error::Result;
use crate::extractors;
use crate::matcher::MatchedLine;
use crate::options::SearchOptions;
use log::debug;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Tagged variants of the available extractor implementations. Adding a
/// format means adding a variant and one registry row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    /// Line-oriented plain-text scan; the fallback for everything textual.
    Text,
    /// Office Open XML word-processing documents.
    WordXml,
    /// Office Open XML spreadsheets.
    SheetXml,
    /// Office Open XML presentations.
    SlideXml,
    OdfText,
    OdfSheet,
    OdfSlide,
    Pdf,
    Email,
    /// Compressed containers, searched recursively.
    Archive,
}

static REGISTRY: OnceLock<HashMap<&'static str, ExtractorKind>> = OnceLock::new();

/// Uppercase-extension lookup table, built once for the process lifetime
/// from each extractor's static extension list.
fn registry() -> &'static HashMap<&'static str, ExtractorKind> {
    REGISTRY.get_or_init(|| {
        let rows: [(&[&str], ExtractorKind); 9] = [
            (extractors::docx::EXTENSIONS, ExtractorKind::WordXml),
            (extractors::xlsx::EXTENSIONS, ExtractorKind::SheetXml),
            (extractors::pptx::EXTENSIONS, ExtractorKind::SlideXml),
            (extractors::odf::TEXT_EXTENSIONS, ExtractorKind::OdfText),
            (extractors::odf::SHEET_EXTENSIONS, ExtractorKind::OdfSheet),
            (extractors::odf::SLIDE_EXTENSIONS, ExtractorKind::OdfSlide),
            (extractors::pdf::EXTENSIONS, ExtractorKind::Pdf),
            (extractors::email::EXTENSIONS, ExtractorKind::Email),
            (extractors::archive::EXTENSIONS, ExtractorKind::Archive),
        ];
        let mut table = HashMap::new();
        for (extensions, kind) in rows {
            for ext in extensions {
                table.insert(*ext, kind);
            }
        }
        table
    })
}

/// Resolves the extractor for a path from its extension, case-insensitively.
pub fn extractor_for(path: &Path) -> ExtractorKind {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_uppercase()))
        .and_then(|e| registry().get(e.as_str()).copied())
        .unwrap_or(ExtractorKind::Text)
}

/// Searches one file for the given terms, delegating to the registered
/// extractor. Errors are whatever the selected extractor raises; the
/// dispatcher itself does not open files.
pub fn search(path: &Path, terms: &[String], opts: &SearchOptions) -> Result<Vec<MatchedLine>> {
    let kind = extractor_for(path);
    debug!("dispatching {} to {:?}", path.display(), kind);
    match kind {
        ExtractorKind::Text => extractors::text::search(path, terms, opts),
        ExtractorKind::WordXml => extractors::docx::search(path, terms, opts),
        ExtractorKind::SheetXml => extractors::xlsx::search(path, terms, opts),
        ExtractorKind::SlideXml => extractors::pptx::search(path, terms, opts),
        ExtractorKind::OdfText => extractors::odf::search_text(path, terms, opts),
        ExtractorKind::OdfSheet => extractors::odf::search_spreadsheet(path, terms, opts),
        ExtractorKind::OdfSlide => extractors::odf::search_presentation(path, terms, opts),
        ExtractorKind::Pdf => extractors::pdf::search(path, terms, opts),
        ExtractorKind::Email => extractors::email::search(path, terms, opts),
        ExtractorKind::Archive => extractors::archive::search(path, terms, opts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_resolve_case_insensitively() {
        assert_eq!(extractor_for(Path::new("a.pdf")), ExtractorKind::Pdf);
        assert_eq!(extractor_for(Path::new("a.PDF")), ExtractorKind::Pdf);
        assert_eq!(extractor_for(Path::new("a.DocX")), ExtractorKind::WordXml);
        assert_eq!(extractor_for(Path::new("a.xlsx")), ExtractorKind::SheetXml);
        assert_eq!(extractor_for(Path::new("a.odp")), ExtractorKind::OdfSlide);
        assert_eq!(extractor_for(Path::new("a.eml")), ExtractorKind::Email);
        assert_eq!(extractor_for(Path::new("a.zip")), ExtractorKind::Archive);
        assert_eq!(extractor_for(Path::new("a.7z")), ExtractorKind::Archive);
    }

    #[test]
    fn unknown_or_missing_extensions_fall_back_to_text() {
        assert_eq!(extractor_for(Path::new("a.txt")), ExtractorKind::Text);
        assert_eq!(extractor_for(Path::new("a.log")), ExtractorKind::Text);
        assert_eq!(extractor_for(Path::new("a.rs")), ExtractorKind::Text);
        assert_eq!(extractor_for(Path::new("Makefile")), ExtractorKind::Text);
        assert_eq!(extractor_for(Path::new("a.xyzzy")), ExtractorKind::Text);
    }
}
