//! Biometric attendance workbook import.
//!
//! bytes -> [`SheetGrid`] -> [`assemble`] -> [`match_rows`] -> [`reconcile`]

pub mod assemble;
pub mod classify;
pub mod error;
pub mod grid;
pub mod matcher;
pub mod normalize;
pub mod reconcile;
pub mod store;

use serde::Serialize;
use tracing::info;

use crate::model::employee::DirectoryEmployee;

pub use assemble::{ParsedAttendanceRow, TracingSink, assemble};
pub use error::{ImportError, StoreError};
pub use grid::{SheetGrid, SourceFormat};
pub use matcher::{MatchedRow, match_rows};
pub use normalize::StatusTag;
pub use reconcile::{AttendanceStore, ImportSummary, ReconcileOptions, reconcile};

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub summary: ImportSummary,
    pub rows: Vec<MatchedRow>,
}

/// Decode the first sheet and scan it. An empty result is an error: nothing
/// downstream should run for a file with no recognizable records.
pub fn parse_workbook(
    bytes: &[u8],
    format: SourceFormat,
) -> Result<Vec<ParsedAttendanceRow>, ImportError> {
    let grid = SheetGrid::decode(bytes, format)?;
    let rows = assemble(&grid, &mut TracingSink);

    info!(grid_rows = grid.len(), parsed = rows.len(), "attendance workbook scanned");
    if rows.is_empty() {
        return Err(ImportError::NoRecords);
    }
    Ok(rows)
}

pub fn preview(
    parsed: Vec<ParsedAttendanceRow>,
    directory: &[DirectoryEmployee],
) -> Vec<MatchedRow> {
    match_rows(parsed, directory)
}

pub async fn persist<S: AttendanceStore + ?Sized>(
    parsed: Vec<ParsedAttendanceRow>,
    directory: &[DirectoryEmployee],
    store: &S,
    options: &ReconcileOptions,
) -> ImportReport {
    let rows = match_rows(parsed, directory);
    let summary = reconcile(&rows, store, options).await;

    info!(
        inserted = summary.inserted,
        updated = summary.updated,
        skipped = summary.skipped,
        unmatched = summary.unmatched,
        "attendance import finished"
    );
    ImportReport { summary, rows }
}

pub async fn ingest<S: AttendanceStore + ?Sized>(
    bytes: &[u8],
    format: SourceFormat,
    directory: &[DirectoryEmployee],
    store: &S,
    options: &ReconcileOptions,
) -> Result<ImportReport, ImportError> {
    let parsed = parse_workbook(bytes, format)?;
    Ok(persist(parsed, directory, store, options).await)
}
