use std::io::Cursor;
use std::iter;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use csv::ReaderBuilder;

use super::error::ImportError;

/// File families accepted for import, decided from the upload's file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet,
    Csv,
}

impl SourceFormat {
    pub fn from_file_name(file_name: &str) -> Result<Self, ImportError> {
        let ext = Path::new(file_name.trim())
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Ok(SourceFormat::Spreadsheet),
            "csv" => Ok(SourceFormat::Csv),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

/// First sheet of a workbook as rows of optional text cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    rows: Vec<Vec<Option<String>>>,
}

impl SheetGrid {
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    /// Convenience for fixtures: empty strings become blank cells.
    pub fn from_text_rows(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|c| non_empty(c.to_string())).collect())
                .collect(),
        )
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows.get(row).map(|r| cell(r, col)).unwrap_or("")
    }

    pub fn decode(bytes: &[u8], format: SourceFormat) -> Result<Self, ImportError> {
        match format {
            SourceFormat::Spreadsheet => decode_spreadsheet(bytes),
            SourceFormat::Csv => decode_csv(bytes),
        }
    }
}

/// Trimmed text of a cell, `""` when blank or past the end of the row.
pub fn cell(row: &[Option<String>], col: usize) -> &str {
    row.get(col).and_then(|c| c.as_deref()).map(str::trim).unwrap_or("")
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == text.len() {
        Some(text)
    } else {
        Some(trimmed.to_string())
    }
}

fn decode_spreadsheet(bytes: &[u8]) -> Result<SheetGrid, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ImportError::Decode(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Decode("workbook has no sheets".to_string()))?
        .map_err(|e| ImportError::Decode(e.to_string()))?;

    // The range starts at the first used cell, not at A1.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    let mut rows: Vec<Vec<Option<String>>> = vec![Vec::new(); start_row as usize];
    rows.extend(range.rows().map(|row| {
        iter::repeat(None)
            .take(start_col as usize)
            .chain(row.iter().map(render_cell))
            .collect()
    }));

    Ok(SheetGrid::new(rows))
}

/// Dates and times stay as serial numbers; the normalizer owns their meaning.
fn render_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => non_empty(s.clone()),
        Data::Float(n) => Some(if n.fract() == 0.0 && n.abs() < 1e15 {
            format!("{}", *n as i64)
        } else {
            format!("{}", n)
        }),
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => Some(format!("{}", dt.as_f64())),
    }
}

fn decode_csv(bytes: &[u8]) -> Result<SheetGrid, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // report rows have ragged widths
        .from_reader(bytes);

    let mut rows = Vec::new();
    // Terminal exports are often Windows-1252; bad bytes become U+FFFD.
    for record in reader.byte_records() {
        let record = record.map_err(|e| ImportError::Decode(e.to_string()))?;
        rows.push(
            record
                .iter()
                .map(|c| non_empty(String::from_utf8_lossy(c).into_owned()))
                .collect(),
        );
    }

    Ok(SheetGrid::new(rows))
}
