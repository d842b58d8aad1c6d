//! Office Open XML spreadsheet extractor (`.xlsx`).
//!
//! Every non-empty cell is its own text unit, located by sheet name and
//! `B12`-style cell reference. Offsets reported by the reader are honoured,
//! so a sheet whose data starts at C5 labels its first cell C5, not A1.

use crate::error::{corrupt_container, Result};
use crate::locator;
use crate::matcher::{MatchedLine, Matcher, WindowStyle};
use crate::options::SearchOptions;
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;
use std::thread;

pub const EXTENSIONS: &[&str] = &[".XLSX"];

/// Large sheets are scanned cell by cell; yield periodically so a shared
/// cancel signal and sibling worker threads get a chance to run.
const CELLS_PER_YIELD: usize = 10_000;

pub fn search(path: &Path, terms: &[String], opts: &SearchOptions) -> Result<Vec<MatchedLine>> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|_| corrupt_container(path))?;
    let mut matcher = Matcher::new(path, terms, opts, WindowStyle::Plain)?;

    let mut cells_scanned = 0usize;
    let sheet_names = workbook.sheet_names().to_vec();
    'sheets: for sheet in sheet_names {
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|_| corrupt_container(path))?;
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        for (r, row) in range.rows().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                cells_scanned += 1;
                if cells_scanned % CELLS_PER_YIELD == 0 {
                    thread::yield_now();
                    if opts.cancel.is_cancelled() {
                        break 'sheets;
                    }
                }
                if matches!(cell, Data::Empty) {
                    continue;
                }
                let text = format_cell(cell);
                if text.is_empty() {
                    continue;
                }
                let abs_row = start_row as usize + r;
                let abs_col = start_col as usize + c;
                let cell_ref = locator::cell_reference(abs_col, abs_row);
                let prefix = locator::cell_prefix(&sheet, &cell_ref);
                matcher.match_unit_with_prefix(&text, &prefix, abs_row + 1);
            }
        }
    }
    Ok(matcher.finish())
}

/// Serial-date cells render through the resolved calendar value; everything
/// else uses the reader's own display form.
fn format_cell(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use std::io::Write;

    #[test]
    fn date_cells_render_as_calendar_text_not_serials() {
        let cell = Data::DateTime(ExcelDateTime::new(
            45000.5,
            ExcelDateTimeType::DateTime,
            false,
        ));
        let text = format_cell(&cell);
        assert!(text.starts_with("2023-03-15"), "got {text:?}");
        assert!(text.contains("12:00:00"));
        assert!(!text.contains("45000"));
    }

    #[test]
    fn non_date_cells_keep_their_display_form() {
        assert_eq!(format_cell(&Data::Float(42.0)), "42");
        assert_eq!(
            format_cell(&Data::String("grand total".to_string())),
            "grand total"
        );
    }

    #[test]
    fn not_a_workbook_reports_corrupt_or_protected() {
        let mut f = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        f.write_all(b"plain text masquerading as a workbook").unwrap();
        let opts = SearchOptions::case_insensitive();
        let err = search(f.path(), &["x".to_string()], &opts).unwrap_err();
        assert!(err.to_string().contains("corrupt or protected"));
    }
}
