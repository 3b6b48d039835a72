use serde::Serialize;

use super::assemble::ParsedAttendanceRow;
use crate::model::employee::DirectoryEmployee;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedRow {
    #[serde(flatten)]
    pub row: ParsedAttendanceRow,
    pub employee_id: Option<u64>,
    pub matched_name: Option<String>,
}

impl MatchedRow {
    pub fn is_matched(&self) -> bool {
        self.employee_id.is_some()
    }
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Exact code first, then a loose name comparison.
pub fn find_employee<'a>(
    row: &ParsedAttendanceRow,
    directory: &'a [DirectoryEmployee],
) -> Option<&'a DirectoryEmployee> {
    let code = row.employee_code.trim();
    if !code.is_empty() {
        if let Some(emp) = directory.iter().find(|e| e.employee_code.trim() == code) {
            return Some(emp);
        }
    }

    let name = normalize_name(&row.employee_name);
    if name.is_empty() {
        return None;
    }

    directory.iter().find(|emp| {
        let full = normalize_name(&emp.full_name());
        let first = normalize_name(&emp.first_name);
        !full.is_empty()
            && (name == full || name == first || full.contains(&name) || name.contains(&full))
    })
}

/// Each row is resolved independently; unmatched rows stay in the output.
pub fn match_rows(
    rows: Vec<ParsedAttendanceRow>,
    directory: &[DirectoryEmployee],
) -> Vec<MatchedRow> {
    rows.into_iter()
        .map(|row| {
            let found = find_employee(&row, directory);
            MatchedRow {
                employee_id: found.map(|e| e.id),
                matched_name: found.map(DirectoryEmployee::full_name),
                row,
            }
        })
        .collect()
}
