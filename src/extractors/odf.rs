//! OpenDocument extractors (`.odt`, `.ods`, `.odp`).
//!
//! All three formats are zip containers with a single `content.xml` carrying
//! the document body. The member is unzipped to a scratch directory, parsed,
//! and the scratch is removed when the search returns on any path.
//!
//! Text documents yield one line-numbered unit per paragraph. Spreadsheets
//! walk table/row/cell elements, honouring the `number-rows-repeated` and
//! `number-columns-repeated` attributes that collapse empty runs, and locate
//! by sheet name plus base-26 cell reference. Presentations yield one unit
//! per page, numbered from the stored `draw:name` (a literal `"Slide N"`,
//! stable across display-language localization).

use crate::error::{corrupt_container, Result};
use crate::locator;
use crate::matcher::{MatchedLine, Matcher, WindowStyle};
use crate::options::SearchOptions;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::path::Path;
use std::thread;

pub const TEXT_EXTENSIONS: &[&str] = &[".ODT"];
pub const SHEET_EXTENSIONS: &[&str] = &[".ODS"];
pub const SLIDE_EXTENSIONS: &[&str] = &[".ODP"];

const CELLS_PER_YIELD: usize = 10_000;

/// Unzips `content.xml` into a fresh scratch directory and reads it back.
/// The scratch is dropped (and deleted) before this returns.
fn content_xml(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|_| corrupt_container(path))?;
    let scratch = tempfile::tempdir()?;
    let target = scratch.path().join("content.xml");
    {
        let mut entry = archive
            .by_name("content.xml")
            .map_err(|_| corrupt_container(path))?;
        let mut out = File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
    }
    std::fs::read_to_string(&target).map_err(|_| corrupt_container(path).into())
}

fn attr(reader: &Reader<&[u8]>, e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| {
            a.decode_and_unescape_value(reader)
                .ok()
                .map(|v| v.into_owned())
        })
}

fn repeat_count(reader: &Reader<&[u8]>, e: &BytesStart, name: &[u8]) -> usize {
    attr(reader, e, name)
        .and_then(|v| v.parse().ok())
        .filter(|&n| n >= 1)
        .unwrap_or(1)
}

pub fn search_text(path: &Path, terms: &[String], opts: &SearchOptions) -> Result<Vec<MatchedLine>> {
    let xml = content_xml(path)?;
    let paragraphs = text_paragraphs(&xml).map_err(|_| corrupt_container(path))?;
    let mut matcher = Matcher::new(path, terms, opts, WindowStyle::Plain)?;
    matcher.match_units(paragraphs.iter().map(String::as_str), locator::LINE);
    Ok(matcher.finish())
}

/// Every `text:p`/`text:h` is one line, empty paragraphs included so line
/// numbers track the document.
fn text_paragraphs(xml: &str) -> std::result::Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                if matches!(e.name().as_ref(), b"text:p" | b"text:h") {
                    if depth == 0 {
                        current.clear();
                    }
                    depth += 1;
                }
            }
            Event::Empty(ref e) => {
                if depth == 0 && matches!(e.name().as_ref(), b"text:p" | b"text:h") {
                    paragraphs.push(String::new());
                }
            }
            Event::Text(ref t) => {
                if depth > 0 {
                    current.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => {
                if matches!(e.name().as_ref(), b"text:p" | b"text:h") && depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}

pub fn search_spreadsheet(
    path: &Path,
    terms: &[String],
    opts: &SearchOptions,
) -> Result<Vec<MatchedLine>> {
    let xml = content_xml(path)?;
    let mut matcher = Matcher::new(path, terms, opts, WindowStyle::Plain)?;
    scan_tables(&xml, opts, &mut matcher).map_err(|_| corrupt_container(path))?;
    Ok(matcher.finish())
}

fn scan_tables(
    xml: &str,
    opts: &SearchOptions,
    matcher: &mut Matcher,
) -> std::result::Result<(), quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut sheet = String::new();
    let mut row = 0usize;
    let mut row_repeat = 1usize;
    let mut col = 0usize;
    let mut col_repeat = 1usize;
    let mut in_cell = false;
    let mut in_paragraph = false;
    let mut cell_text = String::new();
    let mut cells_scanned = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"table:table" => {
                    sheet =
                        attr(&reader, e, b"table:name").unwrap_or_else(|| "Sheet".to_string());
                    row = 0;
                }
                b"table:table-row" => {
                    row_repeat = repeat_count(&reader, e, b"table:number-rows-repeated");
                    col = 0;
                }
                b"table:table-cell" | b"table:covered-table-cell" => {
                    col_repeat = repeat_count(&reader, e, b"table:number-columns-repeated");
                    in_cell = true;
                    cell_text.clear();
                }
                b"text:p" if in_cell => {
                    if !cell_text.is_empty() {
                        cell_text.push('\n');
                    }
                    in_paragraph = true;
                }
                _ => {}
            },
            Event::Empty(ref e) => match e.name().as_ref() {
                b"table:table-cell" | b"table:covered-table-cell" => {
                    col += repeat_count(&reader, e, b"table:number-columns-repeated");
                }
                b"table:table-row" => {
                    row += repeat_count(&reader, e, b"table:number-rows-repeated");
                }
                _ => {}
            },
            Event::Text(ref t) => {
                if in_paragraph {
                    cell_text.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"text:p" => in_paragraph = false,
                b"table:table-cell" | b"table:covered-table-cell" => {
                    in_cell = false;
                    cells_scanned += 1;
                    if cells_scanned % CELLS_PER_YIELD == 0 {
                        thread::yield_now();
                        if opts.cancel.is_cancelled() {
                            return Ok(());
                        }
                    }
                    if !cell_text.trim().is_empty() {
                        let cell_ref = locator::cell_reference(col, row);
                        let prefix = locator::cell_prefix(&sheet, &cell_ref);
                        matcher.match_unit_with_prefix(&cell_text, &prefix, row + 1);
                    }
                    col += col_repeat;
                }
                b"table:table-row" => row += row_repeat,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

pub fn search_presentation(
    path: &Path,
    terms: &[String],
    opts: &SearchOptions,
) -> Result<Vec<MatchedLine>> {
    let xml = content_xml(path)?;
    let slides = presentation_slides(&xml).map_err(|_| corrupt_container(path))?;

    let mut matcher = Matcher::new(path, terms, opts, WindowStyle::NewlineTrimmed)?;
    for (n, text) in &slides {
        matcher.match_unit(text, locator::SLIDE, *n);
    }
    if opts.multiline {
        let texts: Vec<String> = slides.iter().map(|(_, t)| t.clone()).collect();
        let ordinals: Vec<usize> = slides.iter().map(|(n, _)| *n).collect();
        matcher.match_joined_mapped(&texts, locator::SLIDE, Some(&ordinals));
    }
    Ok(matcher.finish())
}

/// `draw:name="Slide 7"` -> 7; pages whose stored name does not carry the
/// literal prefix fall back to their position.
fn slide_ordinal(name: Option<String>, position: usize) -> usize {
    name.as_deref()
        .and_then(|n| n.strip_prefix("Slide "))
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(position + 1)
}

fn presentation_slides(
    xml: &str,
) -> std::result::Result<Vec<(usize, String)>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut slides = Vec::new();
    let mut buf = Vec::new();
    let mut in_page = false;
    let mut in_notes = false;
    let mut in_paragraph = false;
    let mut slide_no = 0usize;
    let mut body = String::new();
    let mut notes = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"draw:page" => {
                    in_page = true;
                    slide_no = slide_ordinal(attr(&reader, e, b"draw:name"), slides.len());
                    body.clear();
                    notes.clear();
                }
                b"presentation:notes" => in_notes = true,
                b"text:p" if in_page => in_paragraph = true,
                _ => {}
            },
            Event::Text(ref t) => {
                if in_paragraph {
                    let target = if in_notes { &mut notes } else { &mut body };
                    target.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"text:p" => {
                    if in_page {
                        in_paragraph = false;
                        let target = if in_notes { &mut notes } else { &mut body };
                        target.push('\n');
                    }
                }
                b"presentation:notes" => in_notes = false,
                b"draw:page" => {
                    in_page = false;
                    let mut text = body.trim_end_matches('\n').to_string();
                    for line in notes.lines() {
                        // Same slide-number placeholder heuristic as the
                        // Office presentation notes.
                        if line.trim().is_empty() || line.trim().parse::<usize>().is_ok() {
                            continue;
                        }
                        if !text.is_empty() {
                            text.push('\n');
                        }
                        text.push_str(line);
                    }
                    if !text.trim().is_empty() {
                        slides.push((slide_no, text));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(slides)
}
