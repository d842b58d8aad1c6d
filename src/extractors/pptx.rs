//! Office Open XML presentation extractor (`.pptx`).
//!
//! One text unit per slide, in slide-number order: the slide's title
//! placeholders first, then the remaining shape text, then its speaker
//! notes. Slide-number placeholders render as bare integers in the notes
//! part and are dropped.

use crate::error::{corrupt_container, Result};
use crate::locator;
use crate::matcher::{MatchedLine, Matcher, WindowStyle};
use crate::options::SearchOptions;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

pub const EXTENSIONS: &[&str] = &[".PPTX"];

pub fn search(path: &Path, terms: &[String], opts: &SearchOptions) -> Result<Vec<MatchedLine>> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(|_| corrupt_container(path))?;

    let mut slide_numbers: Vec<usize> = (0..archive.len())
        .filter_map(|i| archive.name_for_index(i).and_then(slide_number))
        .collect();
    slide_numbers.sort_unstable();

    let mut units: Vec<(usize, String)> = Vec::with_capacity(slide_numbers.len());
    for n in slide_numbers {
        let slide_xml = read_entry(&mut archive, &format!("ppt/slides/slide{n}.xml"))
            .ok_or_else(|| corrupt_container(path))?;
        let mut text = slide_text(&slide_xml).map_err(|_| corrupt_container(path))?;

        if let Some(notes_xml) = read_entry(&mut archive, &format!("ppt/notesSlides/notesSlide{n}.xml"))
        {
            let notes = drawing_text(&notes_xml).map_err(|_| corrupt_container(path))?;
            for line in notes.lines() {
                // Notes parts carry the slide-number placeholder as a bare
                // integer line; it is chrome, not content.
                if line.trim().parse::<usize>().is_ok() {
                    continue;
                }
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(line);
            }
        }
        if !text.trim().is_empty() {
            units.push((n, text));
        }
    }

    let mut matcher = Matcher::new(path, terms, opts, WindowStyle::NewlineTrimmed)?;
    for (n, text) in &units {
        matcher.match_unit(text, locator::SLIDE, *n);
    }
    if opts.multiline {
        let texts: Vec<String> = units.iter().map(|(_, t)| t.clone()).collect();
        let ordinals: Vec<usize> = units.iter().map(|(n, _)| *n).collect();
        matcher.match_joined_mapped(&texts, locator::SLIDE, Some(&ordinals));
    }
    Ok(matcher.finish())
}

/// `ppt/slides/slide12.xml` -> `Some(12)`.
fn slide_number(entry_name: &str) -> Option<usize> {
    let rest = entry_name.strip_prefix("ppt/slides/slide")?;
    let digits = rest.strip_suffix(".xml")?;
    digits.parse().ok()
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Option<String> {
    let mut entry = archive.by_name(name).ok()?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).ok()?;
    Some(xml)
}

/// Slide body text with titles pulled to the front: shapes whose placeholder
/// type is `title` or `ctrTitle` come first, then every other shape, each
/// paragraph on its own line.
fn slide_text(xml: &str) -> std::result::Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);

    let mut titles: Vec<String> = Vec::new();
    let mut rest: Vec<String> = Vec::new();
    let mut buf = Vec::new();
    let mut in_text = false;
    let mut in_shape = false;
    let mut shape_is_title = false;
    let mut shape_text = String::new();

    let is_title_ph = |e: &quick_xml::events::BytesStart| {
        e.attributes().flatten().any(|a| {
            a.key.as_ref() == b"type"
                && matches!(a.value.as_ref(), b"title" | b"ctrTitle")
        })
    };

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"p:sp" => {
                    in_shape = true;
                    shape_is_title = false;
                    shape_text.clear();
                }
                b"p:ph" => {
                    if is_title_ph(e) {
                        shape_is_title = true;
                    }
                }
                b"a:t" => in_text = true,
                _ => {}
            },
            Event::Empty(ref e) => {
                if e.name().as_ref() == b"p:ph" && is_title_ph(e) {
                    shape_is_title = true;
                }
            }
            Event::Text(ref t) => {
                if in_text {
                    shape_text.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" => {
                    if in_shape {
                        shape_text.push('\n');
                    }
                }
                b"p:sp" => {
                    in_shape = false;
                    let text = shape_text.trim_end_matches('\n');
                    if !text.trim().is_empty() {
                        let bucket = if shape_is_title { &mut titles } else { &mut rest };
                        bucket.push(text.to_string());
                    }
                    shape_text.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    // Text outside any shape (tables, grouped frames) still counts.
    let stray = shape_text.trim_end_matches('\n');
    if !stray.trim().is_empty() {
        rest.push(stray.to_string());
    }

    let mut out = titles.join("\n");
    for chunk in rest {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&chunk);
    }
    Ok(out)
}

/// Flattens DrawingML body text in document order: runs concatenate within a
/// paragraph, paragraphs become separate lines. Used for notes parts, where
/// placeholder ordering does not matter.
fn drawing_text(xml: &str) -> std::result::Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut buf = Vec::new();
    let mut in_text = false;
    let mut paragraph_open = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"a:p" => paragraph_open = true,
                b"a:t" => in_text = true,
                _ => {}
            },
            Event::Text(ref t) => {
                if in_text {
                    out.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" => {
                    if paragraph_open {
                        out.push('\n');
                        paragraph_open = false;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    while out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn pptx_fixture(entries: &[(&str, &str)]) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new()
            .suffix(".pptx")
            .tempfile()
            .expect("temp file");
        let mut writer = zip::ZipWriter::new(file.reopen().expect("reopen"));
        for (name, content) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start entry");
            writer.write_all(content.as_bytes()).expect("write entry");
        }
        writer.finish().expect("finish zip");
        file
    }

    fn slide_xml(lines: &[&str]) -> String {
        let paragraphs: String = lines
            .iter()
            .map(|l| format!("<a:p><a:r><a:t>{l}</a:t></a:r></a:p>"))
            .collect();
        format!(
            r#"<p:sld xmlns:p="http://p" xmlns:a="http://a"><p:cSld><p:spTree><p:sp><p:txBody>{paragraphs}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
        )
    }

    #[test]
    fn slides_are_numbered_and_ordered() {
        let slide2 = slide_xml(&["budget review"]);
        let slide1 = slide_xml(&["welcome everyone"]);
        let f = pptx_fixture(&[
            ("ppt/slides/slide2.xml", slide2.as_str()),
            ("ppt/slides/slide1.xml", slide1.as_str()),
        ]);
        let opts = SearchOptions::case_insensitive();
        let out = search(f.path(), &["budget".to_string()], &opts).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].line_number, 2);
        assert!(out[0].content.starts_with("Slide 2:\t"));
    }

    #[test]
    fn speaker_notes_are_searchable_and_placeholders_dropped() {
        let slide = slide_xml(&["agenda"]);
        let notes = slide_xml(&["remember the demo", "3"]);
        let f = pptx_fixture(&[
            ("ppt/slides/slide3.xml", slide.as_str()),
            ("ppt/notesSlides/notesSlide3.xml", notes.as_str()),
        ]);
        let opts = SearchOptions::case_insensitive();
        let out = search(f.path(), &["demo".to_string()], &opts).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].line_number, 3);

        let digits = search(f.path(), &["3".to_string()], &opts).unwrap();
        assert!(digits.is_empty());
    }

    #[test]
    fn title_shapes_lead_the_slide_unit() {
        let xml = r#"<p:sld xmlns:p="http://p" xmlns:a="http://a"><p:cSld><p:spTree>
            <p:sp><p:txBody><a:p><a:r><a:t>body details</a:t></a:r></a:p></p:txBody></p:sp>
            <p:sp><p:nvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>
              <p:txBody><a:p><a:r><a:t>headline first</a:t></a:r></a:p></p:txBody></p:sp>
        </p:spTree></p:cSld></p:sld>"#;
        let f = pptx_fixture(&[("ppt/slides/slide1.xml", xml)]);
        let opts = SearchOptions::case_insensitive();
        let out = search(f.path(), &["headline".to_string()], &opts).unwrap();
        assert_eq!(out.len(), 1);
        // Though the title shape appears after the body in the part, it
        // leads the unit, so the hit sits right after the locator prefix.
        assert_eq!(out[0].start_index, "Slide 1:\t".chars().count());
    }

    #[test]
    fn ten_plus_slide_numbers_sort_numerically() {
        assert_eq!(slide_number("ppt/slides/slide10.xml"), Some(10));
        assert_eq!(slide_number("ppt/slides/slide2.xml"), Some(2));
        assert_eq!(slide_number("ppt/slides/_rels/slide2.xml.rels"), None);
        assert_eq!(slide_number("ppt/notesSlides/notesSlide2.xml"), None);
    }
}
