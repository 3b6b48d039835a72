use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::grid::cell;
use super::normalize::{looks_like_status, normalize_date, normalize_time};

/// How far past a label cell to look for its value.
const LABEL_LOOKAHEAD: usize = 4;
/// How far either side of the status column to look when it is blank.
const STATUS_SEARCH_RADIUS: usize = 2;
const MAX_REMARK_CELLS: usize = 10;

const NOISE_MARKERS: &[&str] = &[
    "total duration=",
    "daily attendance",
    "company:",
    "department:",
    "printed on",
];

static EMBEDDED_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)employee\s*code[:\s]*([a-z0-9][a-z0-9_/-]*)")
        .expect("employee code pattern is valid")
});
static EMBEDDED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)employee\s*name[:\s]*(.*)$").expect("employee name pattern is valid")
});

/// Physical column of each field in the current employee block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub in_time: usize,
    pub out_time: usize,
    pub shift: usize,
    pub duration: usize,
    pub status: usize,
    pub remarks: usize,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            date: 0,
            in_time: 2,
            out_time: 3,
            shift: 5,
            duration: 6,
            status: 7,
            remarks: 8,
        }
    }
}

impl ColumnMap {
    /// Columns missing from `row` keep their offsets from `self`.
    pub fn rebuild(&self, row: &[Option<String>]) -> ColumnMap {
        let mut found: [Option<usize>; 7] = [None; 7];

        for idx in 0..row.len() {
            let text = cell(row, idx).to_lowercase();
            if text.is_empty() {
                continue;
            }
            let slot = if text.contains("intime") || text.contains("in time") {
                1
            } else if text.contains("outtime") || text.contains("out time") {
                2
            } else if text.contains("duration") {
                4
            } else if text.contains("shift") {
                3
            } else if text.contains("status") {
                5
            } else if text.contains("remark") {
                6
            } else if text.contains("date") {
                0
            } else {
                continue;
            };
            found[slot].get_or_insert(idx);
        }

        ColumnMap {
            date: found[0].unwrap_or(self.date),
            in_time: found[1].unwrap_or(self.in_time),
            out_time: found[2].unwrap_or(self.out_time),
            shift: found[3].unwrap_or(self.shift),
            duration: found[4].unwrap_or(self.duration),
            status: found[5].unwrap_or(self.status),
            remarks: found[6].unwrap_or(self.remarks),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeHeader {
    pub code: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    Employee(EmployeeHeader),
    /// An employee code row whose code could not be read.
    UnreadableEmployee,
    /// Name printed on its own row below the code row.
    EmployeeName(String),
    ColumnHeader(ColumnMap),
    Noise,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NoEmployee,
    UnparseableDate,
    MissingStatus,
}

/// Fields read from a data row before the employee context is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFields {
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub shift: String,
    pub total_duration: String,
    pub raw_status: String,
    pub remarks: String,
}

/// Lower-cased text of every non-blank cell; merged cells wander between
/// columns, so markers are looked for across the whole row.
pub fn row_text(row: &[Option<String>]) -> String {
    (0..row.len())
        .map(|idx| cell(row, idx))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn classify_row(row: &[Option<String>], columns: &ColumnMap) -> RowKind {
    let text = row_text(row);

    if text.contains("employee code") {
        return match extract_employee(row) {
            Some(header) => RowKind::Employee(header),
            None => RowKind::UnreadableEmployee,
        };
    }
    if text.contains("employee name") {
        return match extract_name(row, None) {
            Some(name) => RowKind::EmployeeName(name),
            None => RowKind::Noise,
        };
    }
    if text.contains("intime") || text.contains("in time") {
        return RowKind::ColumnHeader(columns.rebuild(row));
    }
    if NOISE_MARKERS.iter().any(|marker| text.contains(marker)) {
        return RowKind::Noise;
    }
    RowKind::Data
}

fn is_label(text: &str) -> bool {
    text.contains(':') || text.to_lowercase().contains("employee")
}

fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// `1042`, `EMP-008`, `HQ/17`: one token holding at least one digit.
fn is_code_token(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/'))
}

fn embedded_code(text: &str) -> Option<String> {
    EMBEDDED_CODE
        .captures(text)
        .map(|caps| caps[1].to_string())
        .filter(|code| is_code_token(code))
}

/// Code and (when printed on the same row) name from an employee header row.
pub fn extract_employee(row: &[Option<String>]) -> Option<EmployeeHeader> {
    let code = extract_code(row)?;
    let name = extract_name(row, Some(&code));
    Some(EmployeeHeader { code, name })
}

fn extract_code(row: &[Option<String>]) -> Option<String> {
    for idx in 0..row.len() {
        let text = cell(row, idx);
        if !text.to_lowercase().contains("employee code") {
            continue;
        }
        if let Some(code) = embedded_code(text) {
            return Some(code);
        }
        let forward = (idx + 1..=idx + LABEL_LOOKAHEAD)
            .map(|i| cell(row, i))
            .find(|value| is_code_token(value));
        if let Some(code) = forward {
            return Some(code.to_string());
        }
    }

    // label split over merged cells: "Employee" | "Code: 12"
    let joined = (0..row.len())
        .map(|idx| cell(row, idx))
        .collect::<Vec<_>>()
        .join(" ");
    embedded_code(&joined)
}

fn extract_name(row: &[Option<String>], code: Option<&str>) -> Option<String> {
    for idx in 0..row.len() {
        let text = cell(row, idx);
        if !text.to_lowercase().contains("employee name") {
            continue;
        }
        if let Some(name) = EMBEDDED_NAME
            .captures(text)
            .and_then(|caps| clean_embedded_name(&caps[1]))
        {
            return Some(name);
        }
        let forward = (idx + 1..=idx + LABEL_LOOKAHEAD)
            .map(|i| cell(row, i))
            .find(|value| !value.is_empty() && !is_label(value) && !is_numeric(value));
        if let Some(name) = forward {
            return Some(name.to_string());
        }
    }

    // Last plain token on the row that is neither a label nor the code.
    (0..row.len())
        .rev()
        .map(|idx| cell(row, idx))
        .find(|value| {
            !value.is_empty() && !is_label(value) && !is_numeric(value) && Some(*value) != code
        })
        .map(str::to_string)
}

/// "JOHN DOE" out of "JOHN DOE  Department: Sales" and the like.
fn clean_embedded_name(captured: &str) -> Option<String> {
    let mut name = captured.trim();
    if let Some(pos) = name.find("  ") {
        name = &name[..pos];
    }
    let name = match name.find(':') {
        Some(pos) => {
            // drop the word that labels the next field
            let before = name[..pos].trim_end();
            before.rsplit_once(char::is_whitespace).map_or("", |(head, _)| head)
        }
        None => name,
    };
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

pub fn read_data_row(
    row: &[Option<String>],
    columns: &ColumnMap,
) -> Result<DataFields, DropReason> {
    let date = normalize_date(cell(row, columns.date)).ok_or(DropReason::UnparseableDate)?;

    let raw_status = find_status(row, columns.status).ok_or(DropReason::MissingStatus)?;

    let remarks = (columns.remarks..columns.remarks + MAX_REMARK_CELLS)
        .map(|idx| cell(row, idx))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");

    Ok(DataFields {
        date,
        check_in: normalize_time(cell(row, columns.in_time)),
        check_out: normalize_time(cell(row, columns.out_time)),
        shift: cell(row, columns.shift).to_string(),
        total_duration: cell(row, columns.duration).to_string(),
        raw_status: raw_status.to_string(),
        remarks,
    })
}

fn find_status(row: &[Option<String>], status_col: usize) -> Option<&str> {
    let direct = cell(row, status_col);
    if !direct.is_empty() {
        return Some(direct);
    }
    // nearest neighbours first, left before right
    (1..=STATUS_SEARCH_RADIUS)
        .flat_map(|d| [status_col.checked_sub(d), Some(status_col + d)])
        .flatten()
        .map(|idx| cell(row, idx))
        .find(|text| looks_like_status(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::grid::SheetGrid;

    fn row(cells: &[&str]) -> Vec<Option<String>> {
        SheetGrid::from_text_rows(&[cells]).rows()[0].clone()
    }

    #[test]
    fn employee_code_embedded_in_label() {
        let header = extract_employee(&row(&["Employee Code: 1042"])).unwrap();
        assert_eq!(header.code, "1042");
        assert_eq!(header.name, None);
    }

    #[test]
    fn employee_code_and_name_in_following_cells() {
        let r = row(&["Employee Code:", "", "1042", "", "Employee Name:", "", "RAHIM UDDIN"]);
        let header = extract_employee(&r).unwrap();
        assert_eq!(header.code, "1042");
        assert_eq!(header.name.as_deref(), Some("RAHIM UDDIN"));
    }

    #[test]
    fn alphanumeric_codes_are_kept_whole() {
        let header = extract_employee(&row(&["Employee Code: EMP-008"])).unwrap();
        assert_eq!(header.code, "EMP-008");

        let r = row(&["Employee Code:", "HQ/17", "Employee Name:", "JANE ROE"]);
        let header = extract_employee(&r).unwrap();
        assert_eq!(header.code, "HQ/17");
        assert_eq!(header.name.as_deref(), Some("JANE ROE"));
    }

    #[test]
    fn code_row_without_a_code_is_still_an_employee_row() {
        let columns = ColumnMap::default();
        assert_eq!(
            classify_row(&row(&["Employee Code: N/A"]), &columns),
            RowKind::UnreadableEmployee
        );
        assert_eq!(
            classify_row(&row(&["Employee Code:", "Employee Name: JANE ROE"]), &columns),
            RowKind::UnreadableEmployee
        );
    }

    #[test]
    fn name_embedded_next_to_another_label() {
        let r = row(&["Employee Code: 7", "Employee Name: JOHN DOE Department: Sales"]);
        let header = extract_employee(&r).unwrap();
        assert_eq!(header.name.as_deref(), Some("JOHN DOE"));
    }

    #[test]
    fn name_falls_back_to_last_plain_token() {
        let r = row(&["Employee Code:", "88", "", "KARIM", ""]);
        let header = extract_employee(&r).unwrap();
        assert_eq!(header.code, "88");
        assert_eq!(header.name.as_deref(), Some("KARIM"));
    }

    #[test]
    fn classifies_rows_by_whole_row_text() {
        let columns = ColumnMap::default();
        assert!(matches!(
            classify_row(&row(&["", "Employee", "Code: 12"]), &columns),
            RowKind::Employee(EmployeeHeader { ref code, .. }) if code == "12"
        ));
        assert!(matches!(
            classify_row(&row(&["", "Employee Code: 12"]), &columns),
            RowKind::Employee(EmployeeHeader { ref code, .. }) if code == "12"
        ));
        assert_eq!(
            classify_row(&row(&["Employee Code:", "", ""]), &columns),
            RowKind::UnreadableEmployee
        );
        assert_eq!(
            classify_row(&row(&["Employee Name: JOHN DOE"]), &columns),
            RowKind::EmployeeName("JOHN DOE".to_string())
        );
        assert_eq!(classify_row(&row(&["Daily Attendance Report"]), &columns), RowKind::Noise);
        assert_eq!(classify_row(&row(&["Company:", "ACME Ltd"]), &columns), RowKind::Noise);
        assert_eq!(classify_row(&row(&["", "Total Duration=182:30"]), &columns), RowKind::Noise);
        assert_eq!(classify_row(&row(&["Printed On 03-Feb-2026"]), &columns), RowKind::Noise);
        assert_eq!(classify_row(&row(&["01-Jan-2026", "", "09:05"]), &columns), RowKind::Data);
    }

    #[test]
    fn header_row_rebuilds_column_map() {
        let r = row(&[
            "Date", "", "In Time", "Out Time", "", "Shift", "Total Duration", "Status", "Remarks",
        ]);
        assert_eq!(
            classify_row(&r, &ColumnMap::default()),
            RowKind::ColumnHeader(ColumnMap::default())
        );

        let shifted = row(&["Sl", "Date", "Shift", "InTime", "OutTime", "Duration", "Status"]);
        let map = ColumnMap::default().rebuild(&shifted);
        assert_eq!(map.date, 1);
        assert_eq!(map.shift, 2);
        assert_eq!(map.in_time, 3);
        assert_eq!(map.out_time, 4);
        assert_eq!(map.duration, 5);
        assert_eq!(map.status, 6);
        // no remarks column: previous offset kept
        assert_eq!(map.remarks, 8);
    }

    #[test]
    fn reads_data_row_fields() {
        let r = row(&[
            "01-Jan-2026", "", "09:05", "18:10", "", "General", "09:05", "Present", "late bus", "",
            "gate 2",
        ]);
        let fields = read_data_row(&r, &ColumnMap::default()).unwrap();

        assert_eq!(fields.date, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(fields.check_in, NaiveTime::from_hms_opt(9, 5, 0));
        assert_eq!(fields.check_out, NaiveTime::from_hms_opt(18, 10, 0));
        assert_eq!(fields.shift, "General");
        assert_eq!(fields.total_duration, "09:05");
        assert_eq!(fields.raw_status, "Present");
        assert_eq!(fields.remarks, "late bus | gate 2");
    }

    #[test]
    fn blank_status_is_found_in_a_neighbouring_cell() {
        let r = row(&["02-Jan-2026", "", "", "", "", "General", "00:00", "", "WeeklyOff"]);
        let fields = read_data_row(&r, &ColumnMap::default()).unwrap();
        assert_eq!(fields.raw_status, "WeeklyOff");
        assert_eq!(fields.check_in, None);
    }

    #[test]
    fn rows_without_date_or_status_are_dropped() {
        let columns = ColumnMap::default();
        assert_eq!(
            read_data_row(&row(&["Date", "", "In Time"]), &columns),
            Err(DropReason::UnparseableDate)
        );
        assert_eq!(
            read_data_row(
                &row(&["03-Jan-2026", "", "09:00", "17:00", "", "General", "08:00"]),
                &columns
            ),
            Err(DropReason::MissingStatus)
        );
    }
}
