//! Office Open XML word-processing extractor (`.docx`).
//!
//! Streams `word/document.xml` out of the ZIP container and accumulates one
//! text unit per non-empty paragraph. Paragraphs are labelled with the page
//! they start on, tracked from explicit page breaks and the renderer's
//! last-rendered-page-break markers.

use crate::error::{corrupt_container, Result};
use crate::locator;
use crate::matcher::{MatchedLine, Matcher, WindowStyle};
use crate::options::SearchOptions;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const EXTENSIONS: &[&str] = &[".DOCX"];

/// A paragraph's text and the 1-based page it starts on.
struct Paragraph {
    text: String,
    page: usize,
}

pub fn search(path: &Path, terms: &[String], opts: &SearchOptions) -> Result<Vec<MatchedLine>> {
    let xml = read_document_xml(path)?;
    let paragraphs = parse_paragraphs(&xml).map_err(|_| corrupt_container(path))?;

    let mut matcher = Matcher::new(path, terms, opts, WindowStyle::WordAligned)?;
    for para in &paragraphs {
        matcher.match_unit(&para.text, locator::PAGE, para.page);
    }
    if opts.multiline {
        let units: Vec<String> = paragraphs.iter().map(|p| p.text.clone()).collect();
        let pages: Vec<usize> = paragraphs.iter().map(|p| p.page).collect();
        matcher.match_joined_mapped(&units, locator::PAGE, Some(&pages));
    }
    Ok(matcher.finish())
}

/// Opens the container and reads the main document part. Any failure here
/// means the file is not a readable OOXML package.
fn read_document_xml(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|_| corrupt_container(path))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|_| corrupt_container(path))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|_| corrupt_container(path))?;
    Ok(xml)
}

fn parse_paragraphs(xml: &str) -> std::result::Result<Vec<Paragraph>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut buf = Vec::new();
    let mut page = 1usize;
    let mut para_page = 1usize;
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                b"w:p" => {
                    current.clear();
                    para_page = page;
                }
                b"w:t" => in_text = true,
                b"w:br" => {
                    let is_page_break = e.attributes().flatten().any(|a| {
                        a.key.as_ref() == b"w:type" && a.value.as_ref() == b"page"
                    });
                    if is_page_break {
                        page += 1;
                    }
                }
                b"w:lastRenderedPageBreak" => page += 1,
                _ => {}
            },
            Event::Text(ref t) => {
                if in_text {
                    current.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if !current.trim().is_empty() {
                        paragraphs.push(Paragraph {
                            text: current.clone(),
                            page: para_page,
                        });
                    }
                    current.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}
