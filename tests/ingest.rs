use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use hrm_attendance::import::{
    self, AttendanceStore, ImportError, ImportSummary, ReconcileOptions, SourceFormat, StoreError,
};
use hrm_attendance::model::attendance::{Attendance, AttendancePatch, NewAttendance};
use hrm_attendance::model::employee::DirectoryEmployee;

const REPORT: &str = "\
Daily Attendance Report,,,,,,,,
Employee Code: 7,,,,,,,,
Employee Name: JOHN DOE,,,,,,,,
Date,,In Time,Out Time,,Shift,Total Duration,Status,Remarks
01-Jan-2026,,09:05,18:10,,General,09:05,Present,
02-Jan-2026,,,,,General,00:00,WeeklyOff,
";

#[derive(Default)]
struct MemoryStore {
    records: Mutex<HashMap<u64, Attendance>>,
}

impl MemoryStore {
    fn all(&self) -> Vec<Attendance> {
        let mut all: Vec<_> = self.records.lock().unwrap().values().cloned().collect();
        all.sort_by_key(|a| a.id);
        all
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find_id(&self, employee_id: u64, date: NaiveDate) -> Result<Option<u64>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|a| a.employee_id == employee_id && a.date == date)
            .map(|a| a.id))
    }

    async fn update(&self, id: u64, patch: &AttendancePatch) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&id)
            .ok_or_else(|| StoreError::Rejected(format!("no attendance {id}")))?;
        record.apply(patch);
        Ok(())
    }

    async fn insert(&self, record: &NewAttendance) -> Result<u64, StoreError> {
        let mut records = self.records.lock().unwrap();
        let id = records.len() as u64 + 1;
        records.insert(id, Attendance::from_new(id, record));
        Ok(id)
    }
}

fn directory() -> Vec<DirectoryEmployee> {
    vec![
        DirectoryEmployee {
            id: 1,
            employee_code: "7".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
        },
        DirectoryEmployee {
            id: 2,
            employee_code: "8".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Roe".to_string(),
        },
    ]
}

#[actix_web::test]
async fn csv_report_is_imported_without_weekly_offs() {
    let store = MemoryStore::default();

    let report = import::ingest(
        REPORT.as_bytes(),
        SourceFormat::Csv,
        &directory(),
        &store,
        &ReconcileOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.rows.len(), 2);
    assert!(report.rows.iter().all(|r| r.employee_id == Some(1)));
    assert_eq!(
        report.summary,
        ImportSummary { inserted: 1, updated: 0, skipped: 0, unmatched: 0 }
    );

    let stored = store.all();
    assert_eq!(stored.len(), 1);
    let day1 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    assert_eq!(stored[0].employee_id, 1);
    assert_eq!(stored[0].date, day1);
    assert_eq!(stored[0].status, "present");
    assert_eq!(stored[0].check_in, day1.and_hms_opt(9, 5, 0));
    assert_eq!(stored[0].check_out, day1.and_hms_opt(18, 10, 0));
}

#[actix_web::test]
async fn reimporting_the_same_file_changes_nothing() {
    let store = MemoryStore::default();
    let options = ReconcileOptions::default();

    import::ingest(REPORT.as_bytes(), SourceFormat::Csv, &directory(), &store, &options)
        .await
        .unwrap();
    let after_first = store.all();

    let second = import::ingest(
        REPORT.as_bytes(),
        SourceFormat::Csv,
        &directory(),
        &store,
        &options,
    )
    .await
    .unwrap();

    assert_eq!(second.summary.inserted, 0);
    assert_eq!(second.summary.updated, 1);
    assert_eq!(store.all(), after_first);
}

#[actix_web::test]
async fn unknown_employees_are_counted_not_written() {
    let store = MemoryStore::default();
    let csv = "\
Employee Code: 99,,,,,,,,
Employee Name: NOBODY,,,,,,,,
03-Jan-2026,,08:58,17:01,,General,08:03,Present,
";

    let options = ReconcileOptions::default();
    let report = import::ingest(csv.as_bytes(), SourceFormat::Csv, &directory(), &store, &options)
        .await
        .unwrap();

    assert_eq!(report.summary.unmatched, 1);
    assert_eq!(report.summary.inserted, 0);
    assert!(store.all().is_empty());
}

#[actix_web::test]
async fn file_without_records_is_rejected() {
    let store = MemoryStore::default();
    let csv = "Daily Attendance Report\nPrinted On,01-Jan-2026\n";

    let options = ReconcileOptions::default();
    let err = import::ingest(csv.as_bytes(), SourceFormat::Csv, &directory(), &store, &options)
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::NoRecords));
    assert!(store.all().is_empty());
}

#[test]
fn unsupported_extension_is_rejected_before_decoding() {
    let err = SourceFormat::from_file_name("attendance.pdf").unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat(ext) if ext == "pdf"));
    assert_eq!(SourceFormat::from_file_name("Attendance.XLSX").unwrap(), SourceFormat::Spreadsheet);
}
