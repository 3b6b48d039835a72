use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::{debug, warn};

use super::classify::{ColumnMap, DropReason, RowKind, classify_row, read_data_row};
use super::grid::SheetGrid;
use super::normalize::{StatusTag, is_known_status, normalize_status};

/// One punch-day as read from the file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedAttendanceRow {
    pub employee_code: String,
    pub employee_name: String,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub shift: String,
    pub total_duration: String,
    pub status: StatusTag,
    pub raw_status: String,
    pub remarks: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeContext {
    pub code: String,
    pub name: Option<String>,
}

impl EmployeeContext {
    fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("Employee {}", self.code))
    }
}

/// State carried from one row to the next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanContext {
    pub employee: Option<EmployeeContext>,
    pub columns: ColumnMap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent<'a> {
    EmployeeStarted { row: usize, code: &'a str },
    /// Code row without a readable code; following rows have no employee.
    EmployeeUnreadable { row: usize },
    ColumnsMapped { row: usize, columns: &'a ColumnMap },
    RowDropped { row: usize, reason: DropReason },
    StatusDefaulted { row: usize, raw: &'a str },
}

/// Receives scan diagnostics; none of them change the parse result.
pub trait ScanSink {
    fn event(&mut self, event: ScanEvent<'_>);
}

impl ScanSink for () {
    fn event(&mut self, _: ScanEvent<'_>) {}
}

pub struct TracingSink;

impl ScanSink for TracingSink {
    fn event(&mut self, event: ScanEvent<'_>) {
        match event {
            ScanEvent::EmployeeStarted { row, code } => debug!(row, code, "employee block"),
            ScanEvent::ColumnsMapped { row, columns } => debug!(row, ?columns, "column header"),
            ScanEvent::EmployeeUnreadable { row } => {
                warn!(row, "employee code row without a readable code, block skipped")
            }
            ScanEvent::RowDropped { row, reason: DropReason::UnparseableDate } => {
                warn!(row, "row dropped, date not recognized")
            }
            ScanEvent::RowDropped { row, reason } => debug!(row, ?reason, "row dropped"),
            ScanEvent::StatusDefaulted { row, raw } => {
                warn!(row, raw, "unrecognized status text, recorded as absent")
            }
        }
    }
}

/// Classify one row against `ctx` and return the context for the next row.
pub fn scan_row(
    mut ctx: ScanContext,
    index: usize,
    row: &[Option<String>],
    sink: &mut impl ScanSink,
) -> (ScanContext, Option<ParsedAttendanceRow>) {
    match classify_row(row, &ctx.columns) {
        RowKind::Employee(header) => {
            sink.event(ScanEvent::EmployeeStarted { row: index, code: &header.code });
            ctx.employee = Some(EmployeeContext {
                code: header.code,
                name: header.name,
            });
            (ctx, None)
        }
        RowKind::UnreadableEmployee => {
            sink.event(ScanEvent::EmployeeUnreadable { row: index });
            ctx.employee = None;
            (ctx, None)
        }
        RowKind::EmployeeName(name) => {
            if let Some(employee) = ctx.employee.as_mut() {
                employee.name = Some(name);
            }
            (ctx, None)
        }
        RowKind::ColumnHeader(columns) => {
            sink.event(ScanEvent::ColumnsMapped { row: index, columns: &columns });
            ctx.columns = columns;
            (ctx, None)
        }
        RowKind::Noise => (ctx, None),
        RowKind::Data => {
            let Some(employee) = ctx.employee.as_ref() else {
                if row.iter().any(Option::is_some) {
                    sink.event(ScanEvent::RowDropped {
                        row: index,
                        reason: DropReason::NoEmployee,
                    });
                }
                return (ctx, None);
            };

            let fields = match read_data_row(row, &ctx.columns) {
                Ok(fields) => fields,
                Err(reason) => {
                    if row.iter().any(Option::is_some) {
                        sink.event(ScanEvent::RowDropped { row: index, reason });
                    }
                    return (ctx, None);
                }
            };

            if !is_known_status(&fields.raw_status) {
                sink.event(ScanEvent::StatusDefaulted { row: index, raw: &fields.raw_status });
            }

            let parsed = ParsedAttendanceRow {
                employee_code: employee.code.clone(),
                employee_name: employee.display_name(),
                date: fields.date,
                check_in: fields.check_in,
                check_out: fields.check_out,
                shift: fields.shift,
                total_duration: fields.total_duration,
                status: normalize_status(&fields.raw_status),
                raw_status: fields.raw_status,
                remarks: fields.remarks,
            };
            (ctx, Some(parsed))
        }
    }
}

/// Single top-to-bottom pass over the grid.
pub fn assemble(grid: &SheetGrid, sink: &mut impl ScanSink) -> Vec<ParsedAttendanceRow> {
    let (_, parsed) = grid.rows().iter().enumerate().fold(
        (ScanContext::default(), Vec::new()),
        |(ctx, mut out), (index, row)| {
            let (next, emitted) = scan_row(ctx, index, row, sink);
            out.extend(emitted);
            (next, out)
        },
    );
    parsed
}
