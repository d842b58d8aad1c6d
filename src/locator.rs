//! Locator labels and the prefix arithmetic every extractor shares.
//!
//! A text unit's displayable content always begins with a locator prefix
//! such as `"Page 3:\t"`, and every stored `start_index` is shifted by the
//! rendered length of that prefix. The coupling between a (localizable)
//! label string and computed offsets is deliberately confined to this
//! module: callers obtain the prefix and its character length from the same
//! helper, so swapping label text cannot silently skew offsets.

/// Default label vocabulary. A localization layer may substitute other
/// strings as long as it passes the substituted text into the same helpers.
pub const LINE: &str = "Line";
pub const PAGE: &str = "Page";
pub const SLIDE: &str = "Slide";
pub const HEADER: &str = "Header";

/// Numbered locator prefix: `"<label> <n>:\t"`.
pub fn prefix(label: &str, n: usize) -> String {
    format!("{label} {n}:\t")
}

/// Character length of [`prefix`] for the same arguments.
pub fn prefix_chars(label: &str, n: usize) -> usize {
    prefix(label, n).chars().count()
}

/// Unnumbered locator prefix: `"<label>:\t"`, used for the email header unit.
pub fn bare_prefix(label: &str) -> String {
    format!("{label}:\t")
}

/// Spreadsheet locator prefix: `"<sheet>\<cellref>\t\t"`.
pub fn cell_prefix(sheet: &str, cell_ref: &str) -> String {
    format!("{sheet}\\{cell_ref}\t\t")
}

/// Spreadsheet-style column letters for a 0-based column index:
/// 0 -> "A", 25 -> "Z", 26 -> "AA".
pub fn column_letters(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ASCII letters")
}

/// `"B12"`-style cell reference from 0-based column and row indices.
pub fn cell_reference(col: usize, row: usize) -> String {
    format!("{}{}", column_letters(col), row + 1)
}
