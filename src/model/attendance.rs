use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::import::normalize::StatusTag;

/// A row of the `attendance` table; one per employee per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub status: String,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub work_type: String,
}

impl Attendance {
    pub fn from_new(id: u64, new: &NewAttendance) -> Self {
        Self {
            id,
            employee_id: new.employee_id,
            date: new.date,
            status: new.status.to_string(),
            check_in: new.check_in,
            check_out: new.check_out,
            notes: new.notes.clone(),
            work_type: new.work_type.clone(),
        }
    }

    /// Only the fields present in `patch` overwrite.
    pub fn apply(&mut self, patch: &AttendancePatch) {
        self.status = patch.status.to_string();
        if let Some(check_in) = patch.check_in {
            self.check_in = Some(check_in);
        }
        if let Some(check_out) = patch.check_out {
            self.check_out = Some(check_out);
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub status: StatusTag,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub work_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendancePatch {
    pub status: StatusTag,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub notes: Option<String>,
}
