//! Text-unit matching engine.
//!
//! Extractors turn a document into a sequence of text units (lines, pages,
//! slides, cells, header blocks) and feed them through a [`Matcher`], which
//! applies every search term to every unit and produces [`MatchedLine`]
//! records carrying enough position information to re-locate the match in
//! the stored content.
//!
//! Two algorithms: single-unit mode matches each unit in isolation (with a
//! truncation window for oversized units), cross-unit mode joins all units
//! with newlines and lets patterns span unit boundaries.

use crate::error::{DocgrepError, Result};
use crate::locator;
use crate::options::SearchOptions;
use regex::{Regex, RegexBuilder};
use std::path::Path;

/// Units longer than this are not stored verbatim; a window around the
/// match is stored instead so displayed content stays compact.
pub const MAX_UNIT_DISPLAY_CHARS: usize = 2000;
const WINDOW_BEFORE: usize = 100;
const WINDOW_AFTER: usize = 200;

/// One located occurrence of a search term within a text unit.
///
/// `start_index` and `length` are character offsets into `content`,
/// already adjusted for the locator-label prefix the content begins with.
/// Invariant: `start_index + length <= content.chars().count()`.
#[derive(Debug, Clone)]
pub struct MatchedLine {
    /// Displayable text of the unit containing the match, possibly
    /// truncated, always beginning with the locator prefix (except for
    /// archive pass-through, which keeps child records' own labels).
    pub content: String,
    /// The term that produced this match, after escaping/word-bounding.
    pub search_term: String,
    /// Absolute path of the originating file. The empty string is a
    /// sentinel meaning "same file as the previous record".
    pub file_name: String,
    /// 1-based page, slide, sheet-row, or line number, format-dependent.
    pub line_number: usize,
    /// Character offset of the matched substring within `content`.
    pub start_index: usize,
    /// Character length of the matched substring.
    pub length: usize,
    /// Monotonically increasing counter scoped to one extractor invocation.
    pub match_id: usize,
    /// Transient flag consumed by the presentation layer; always false here.
    pub display_processed: bool,
}

impl MatchedLine {
    /// The matched substring of `content`, recovered from the stored
    /// character offsets.
    pub fn matched_text(&self) -> String {
        self.content
            .chars()
            .skip(self.start_index)
            .take(self.length)
            .collect()
    }
}

/// How a truncation window's edges are adjusted before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowStyle {
    /// Hard cut at the computed offsets.
    #[default]
    Plain,
    /// Walk outward to the nearest space so the window never splits a word.
    WordAligned,
    /// Trim leading and trailing newline characters from the window.
    NewlineTrimmed,
}

struct CompiledTerm {
    /// The transformed pattern stored into `MatchedLine::search_term`.
    display: String,
    regex: Regex,
    /// Cross-unit variant with `.*` widened to `(.|\n)*`; compiled only
    /// when the multiline flag is set.
    joined: Option<Regex>,
    hits: usize,
}

/// Stateless per call beyond the shared [`SearchOptions`]; create one per
/// file, feed it units, then take the records with [`Matcher::finish`].
pub struct Matcher {
    opts: SearchOptions,
    terms: Vec<CompiledTerm>,
    out: Vec<MatchedLine>,
    next_id: usize,
    path: String,
    window: WindowStyle,
    cancelled: bool,
}

impl Matcher {
    /// Compiles every term up front. A malformed user-supplied pattern
    /// raises [`DocgrepError::InvalidPattern`] and cancels the in-flight
    /// search: partial results from a broken pattern are misleading.
    pub fn new(
        path: &Path,
        terms: &[String],
        opts: &SearchOptions,
        window: WindowStyle,
    ) -> Result<Self> {
        let mut compiled = Vec::with_capacity(terms.len());
        for term in terms {
            let mut pattern = if opts.use_regex {
                term.clone()
            } else {
                regex::escape(term)
            };
            if opts.whole_word {
                pattern = format!(r"\b{pattern}\b");
            }

            let regex = RegexBuilder::new(&pattern)
                .case_insensitive(opts.case_insensitive)
                .dot_matches_new_line(opts.dot_matches_newline)
                .build()
                .map_err(|source| {
                    opts.cancel.cancel();
                    DocgrepError::InvalidPattern {
                        term: term.clone(),
                        source,
                    }
                })?;

            let joined = if opts.multiline {
                // Single-line dot does not match newline, so a naive `.*`
                // cannot span unit boundaries in the joined string.
                let widened = pattern.replace(".*", "(.|\n)*");
                Some(
                    RegexBuilder::new(&widened)
                        .case_insensitive(opts.case_insensitive)
                        .build()
                        .map_err(|source| {
                            opts.cancel.cancel();
                            DocgrepError::InvalidPattern {
                                term: term.clone(),
                                source,
                            }
                        })?,
                )
            } else {
                None
            };

            compiled.push(CompiledTerm {
                display: pattern,
                regex,
                joined,
                hits: 0,
            });
        }

        Ok(Self {
            opts: opts.clone(),
            terms: compiled,
            out: Vec::new(),
            next_id: 0,
            path: path.display().to_string(),
            window,
            cancelled: false,
        })
    }

    /// True once the shared signal fired; accumulated records are already
    /// discarded by the time this returns true.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn poll_cancel(&mut self) -> bool {
        if self.cancelled {
            return true;
        }
        if self.opts.cancel.is_cancelled() {
            self.cancelled = true;
            self.out.clear();
            return true;
        }
        false
    }

    /// Matches one numbered unit, labelling it `"<label> <ordinal>:\t"`.
    pub fn match_unit(&mut self, text: &str, label: &str, ordinal: usize) {
        let prefix = locator::prefix(label, ordinal);
        self.match_unit_with_prefix(text, &prefix, ordinal);
    }

    /// Matches one unit with a caller-supplied locator prefix (spreadsheet
    /// cells, email headers). Offsets are adjusted for the prefix length.
    pub fn match_unit_with_prefix(&mut self, text: &str, prefix: &str, ordinal: usize) {
        if self.poll_cancel() {
            return;
        }
        let total_chars = text.chars().count();
        for ti in 0..self.terms.len() {
            if self.poll_cancel() {
                return;
            }
            let spans: Vec<(usize, usize)> = self.terms[ti]
                .regex
                .find_iter(text)
                .map(|m| (m.start(), m.end()))
                .collect();
            for (byte_start, byte_end) in spans {
                self.terms[ti].hits += 1;
                if total_chars > MAX_UNIT_DISPLAY_CHARS {
                    self.push_windowed(text, prefix, ordinal, ti, byte_start, byte_end);
                } else {
                    let start = chars_before(text, byte_start);
                    let length = text[byte_start..byte_end].chars().count();
                    let prefix_chars = prefix.chars().count();
                    let content = format!("{prefix}{text}");
                    self.push(content, ti, ordinal, prefix_chars + start, length);
                }
            }
        }
    }

    /// Iterates units in order, one call per unit; cross-unit mode instead
    /// collects them and delegates to [`Matcher::match_joined`].
    pub fn match_units<I, S>(&mut self, units: I, label: &str)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.opts.multiline {
            let collected: Vec<String> =
                units.into_iter().map(|u| u.as_ref().to_string()).collect();
            self.match_joined(&collected, label);
        } else {
            for (i, unit) in units.into_iter().enumerate() {
                if self.poll_cancel() {
                    return;
                }
                self.match_unit(unit.as_ref(), label, i + 1);
            }
        }
    }

    /// Cross-unit regex mode: joins all units with a newline separator and
    /// matches the widened patterns against the joined string. The
    /// originating unit of each match is recovered by counting newline
    /// characters preceding the match offset and mapping that line back to
    /// the unit it falls in.
    ///
    /// Matches whose text is already covered by a record present before
    /// this call (a single-unit hit) are dropped in favour of that record,
    /// not duplicated.
    pub fn match_joined(&mut self, units: &[String], label: &str) {
        self.match_joined_mapped(units, label, None);
    }

    /// [`Matcher::match_joined`] with an optional unit-index-to-ordinal
    /// mapping, for extractors whose units are not numbered by position
    /// (word-processing paragraphs labelled by rendered page).
    pub fn match_joined_mapped(
        &mut self,
        units: &[String],
        label: &str,
        ordinals: Option<&[usize]>,
    ) {
        if self.poll_cancel() {
            return;
        }
        let joined = units.join("\n");
        // First line index of each unit. Units can hold internal newlines
        // (slide paragraphs), so a raw newline count indexes lines of the
        // joined string, not units; these prefix sums map it back.
        let mut line_starts = Vec::with_capacity(units.len());
        let mut next_line = 0usize;
        for unit in units {
            line_starts.push(next_line);
            next_line += unit.matches('\n').count() + 1;
        }
        let preexisting = self.out.len();
        for ti in 0..self.terms.len() {
            if self.poll_cancel() {
                return;
            }
            let Some(regex) = self.terms[ti].joined.clone() else {
                continue;
            };
            for m in regex.find_iter(&joined) {
                let matched = m.as_str().to_string();
                let covered = self.out[..preexisting]
                    .iter()
                    .any(|r| r.matched_text().contains(&matched));
                if covered {
                    continue;
                }
                let line_index = joined[..m.start()].matches('\n').count();
                let unit_index = match line_starts.binary_search(&line_index) {
                    Ok(i) => i,
                    Err(i) => i.saturating_sub(1),
                };
                let ordinal = ordinals
                    .and_then(|map| map.get(unit_index).copied())
                    .unwrap_or(unit_index + 1);
                let prefix = locator::prefix(label, ordinal);
                let start = prefix.chars().count();
                let length = matched.chars().count();
                self.terms[ti].hits += 1;
                let content = format!("{prefix}{matched}");
                self.push(content, ti, ordinal, start, length);
            }
        }
    }

    fn push_windowed(
        &mut self,
        text: &str,
        prefix: &str,
        ordinal: usize,
        term_index: usize,
        byte_start: usize,
        byte_end: usize,
    ) {
        let chars: Vec<char> = text.chars().collect();
        let match_start = chars_before(text, byte_start);
        let match_end = chars_before(text, byte_end);

        let mut w_start = match_start.saturating_sub(WINDOW_BEFORE);
        let mut w_end = (match_end + WINDOW_AFTER).min(chars.len());

        match self.window {
            WindowStyle::Plain => {}
            WindowStyle::WordAligned => {
                while w_start > 0 && chars[w_start - 1] != ' ' {
                    w_start -= 1;
                }
                while w_end < chars.len() && chars[w_end] != ' ' {
                    w_end += 1;
                }
            }
            WindowStyle::NewlineTrimmed => {
                while w_start < match_start && matches!(chars[w_start], '\n' | '\r') {
                    w_start += 1;
                }
                while w_end > match_end && matches!(chars[w_end - 1], '\n' | '\r') {
                    w_end -= 1;
                }
            }
        }

        let window: String = chars[w_start..w_end].iter().collect();
        // Re-run the match inside the window so the stored offsets refer to
        // the content actually kept, not the original oversized unit.
        let (start, length) = match self.terms[term_index].regex.find(&window) {
            Some(m) => (
                chars_before(&window, m.start()),
                window[m.start()..m.end()].chars().count(),
            ),
            None => (0, 0),
        };
        let prefix_chars = prefix.chars().count();
        let content = format!("{prefix}{window}");
        self.push(content, term_index, ordinal, prefix_chars + start, length);
    }

    fn push(
        &mut self,
        content: String,
        term_index: usize,
        ordinal: usize,
        start_index: usize,
        length: usize,
    ) {
        let file_name = if self.out.is_empty() {
            self.path.clone()
        } else {
            String::new()
        };
        self.next_id += 1;
        self.out.push(MatchedLine {
            content,
            search_term: self.terms[term_index].display.clone(),
            file_name,
            line_number: ordinal,
            start_index,
            length,
            match_id: self.next_id,
            display_processed: false,
        });
    }

    /// Consumes the matcher. Returns the accumulated records, or an empty
    /// list if the search was cancelled or the all-terms-must-match flag is
    /// set and some term never matched.
    pub fn finish(mut self) -> Vec<MatchedLine> {
        if self.poll_cancel() {
            return Vec::new();
        }
        if self.opts.match_all_terms && self.terms.iter().any(|t| t.hits == 0) {
            return Vec::new();
        }
        self.out
    }
}

/// Character count of `s` up to a byte offset that falls on a char boundary.
fn chars_before(s: &str, byte_index: usize) -> usize {
    s[..byte_index].chars().count()
}
