//! Email extractor (`.eml`, `.msg`, `.oft`).
//!
//! Messages are parsed structurally, never as raw bytes. One synthetic
//! header unit (sender, recipients, date, subject) is matched first, then
//! the body is split into lines and matched exactly like plain text, so
//! body matches read the same as file matches. RFC-822 text and the Outlook
//! binary container share this shape but use different parsers.

use crate::error::{DocgrepError, Result};
use crate::locator;
use crate::matcher::{MatchedLine, Matcher, WindowStyle};
use crate::options::SearchOptions;
use mail_parser::{Addr, Address, MessageParser};
use std::path::Path;

pub const EXTENSIONS: &[&str] = &[".EML", ".MSG", ".OFT"];

pub fn search(path: &Path, terms: &[String], opts: &SearchOptions) -> Result<Vec<MatchedLine>> {
    let outlook_container = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            e == "msg" || e == "oft"
        })
        .unwrap_or(false);
    let (header, body) = if outlook_container {
        parse_outlook(path)?
    } else {
        parse_rfc822(path)?
    };

    let mut matcher = Matcher::new(path, terms, opts, WindowStyle::Plain)?;
    matcher.match_unit_with_prefix(&header, &locator::bare_prefix(locator::HEADER), 1);
    matcher.match_units(body.lines(), locator::LINE);
    Ok(matcher.finish())
}

fn parse_failed(path: &Path, detail: impl std::fmt::Display) -> DocgrepError {
    DocgrepError::FileProcessing {
        path: path.to_path_buf(),
        source: detail.to_string().into(),
    }
}

fn parse_rfc822(path: &Path) -> Result<(String, String)> {
    let raw = std::fs::read(path)?;
    let message = MessageParser::default()
        .parse(&raw)
        .ok_or_else(|| parse_failed(path, "unparseable RFC-822 message"))?;

    let header = header_unit(
        &join_addresses(message.from()),
        &join_addresses(message.to()),
        &join_addresses(message.cc()),
        &message.date().map(|d| d.to_rfc3339()).unwrap_or_default(),
        message.subject().unwrap_or_default(),
    );

    // Text body first; an HTML-only message is still searchable through the
    // markup fallback.
    let body = message
        .body_text(0)
        .filter(|b| !b.trim().is_empty())
        .or_else(|| message.body_html(0))
        .map(|b| b.into_owned())
        .unwrap_or_default();
    Ok((header, body))
}

fn parse_outlook(path: &Path) -> Result<(String, String)> {
    let message =
        msg_parser::Outlook::from_path(path).map_err(|e| parse_failed(path, e))?;

    let header = header_unit(
        &display_person(&message.sender),
        &join_persons(&message.to),
        &join_persons(&message.cc),
        &message.headers.date,
        &message.subject,
    );
    Ok((header, message.body))
}

fn header_unit(from: &str, to: &str, cc: &str, date: &str, subject: &str) -> String {
    format!("From: {from} To: {to} Cc: {cc} Date: {date} Subject: {subject}")
}

fn join_addresses(address: Option<&Address>) -> String {
    let mut parts = Vec::new();
    if let Some(address) = address {
        match address {
            Address::List(list) => {
                parts.extend(list.iter().map(display_addr));
            }
            Address::Group(groups) => {
                for group in groups {
                    parts.extend(group.addresses.iter().map(display_addr));
                }
            }
        }
    }
    parts.join(", ")
}

fn display_addr(addr: &Addr) -> String {
    match (addr.name(), addr.address()) {
        (Some(name), Some(email)) => format!("{name} <{email}>"),
        (Some(name), None) => name.to_string(),
        (None, Some(email)) => email.to_string(),
        (None, None) => String::new(),
    }
}

fn display_person(person: &msg_parser::Person) -> String {
    match (person.name.as_str(), person.email.as_str()) {
        ("", email) => email.to_string(),
        (name, "") => name.to_string(),
        (name, email) => format!("{name} <{email}>"),
    }
}

fn join_persons(persons: &[msg_parser::Person]) -> String {
    persons
        .iter()
        .map(display_person)
        .collect::<Vec<_>>()
        .join(", ")
}
