use std::collections::BTreeMap;
use std::future::Future;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::{StreamExt, future, stream};
use serde::Serialize;
use tracing::{debug, error};
use utoipa::ToSchema;

use super::assemble::ParsedAttendanceRow;
use super::error::StoreError;
use super::matcher::MatchedRow;
use super::normalize::StatusTag;
use crate::model::attendance::{AttendancePatch, NewAttendance};

/// The attendance table as seen by the importer.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_id(&self, employee_id: u64, date: NaiveDate) -> Result<Option<u64>, StoreError>;

    async fn update(&self, id: u64, patch: &AttendancePatch) -> Result<(), StoreError>;

    async fn insert(&self, record: &NewAttendance) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Upper bound on rows written at the same time.
    pub concurrency: usize,
    pub default_work_type: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            default_work_type: "office".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ImportSummary {
    #[schema(example = 21)]
    pub inserted: usize,
    #[schema(example = 3)]
    pub updated: usize,
    #[schema(example = 0)]
    pub skipped: usize,
    #[schema(example = 2)]
    pub unmatched: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    Inserted,
    Updated,
    Skipped,
}

impl ImportSummary {
    fn count(mut self, outcome: RowOutcome) -> Self {
        match outcome {
            RowOutcome::Inserted => self.inserted += 1,
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Skipped => self.skipped += 1,
        }
        self
    }
}

fn timestamp(date: NaiveDate, time: Option<NaiveTime>) -> Option<NaiveDateTime> {
    time.map(|t| date.and_time(t))
}

fn notes_for(row: &ParsedAttendanceRow) -> String {
    if row.remarks.is_empty() {
        row.raw_status.clone()
    } else {
        format!("{} | {}", row.raw_status, row.remarks)
    }
}

async fn upsert<S: AttendanceStore + ?Sized>(
    store: &S,
    employee_id: u64,
    row: &ParsedAttendanceRow,
    work_type: &str,
) -> Result<RowOutcome, StoreError> {
    let check_in = timestamp(row.date, row.check_in);
    let check_out = timestamp(row.date, row.check_out);

    match store.find_id(employee_id, row.date).await? {
        Some(id) => {
            let patch = AttendancePatch {
                status: row.status,
                check_in,
                check_out,
                notes: Some(notes_for(row)),
            };
            store.update(id, &patch).await?;
            Ok(RowOutcome::Updated)
        }
        None => {
            let record = NewAttendance {
                employee_id,
                date: row.date,
                status: row.status,
                check_in,
                check_out,
                notes: Some(notes_for(row)),
                work_type: work_type.to_string(),
            };
            store.insert(&record).await?;
            Ok(RowOutcome::Inserted)
        }
    }
}

async fn record_row<S: AttendanceStore + ?Sized>(
    store: &S,
    employee_id: u64,
    matched: &MatchedRow,
    work_type: &str,
) -> RowOutcome {
    match upsert(store, employee_id, &matched.row, work_type).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(
                error = %e,
                employee_id,
                date = %matched.row.date,
                "Failed to save attendance row"
            );
            RowOutcome::Skipped
        }
    }
}

pub async fn reconcile<S: AttendanceStore + ?Sized>(
    rows: &[MatchedRow],
    store: &S,
    options: &ReconcileOptions,
) -> ImportSummary {
    reconcile_until(rows, store, options, future::pending::<()>()).await
}

/// Like [`reconcile`], but stops starting new writes once `cancel` resolves.
/// Writes that already finished stay, and only they are counted.
pub async fn reconcile_until<S, C>(
    rows: &[MatchedRow],
    store: &S,
    options: &ReconcileOptions,
    cancel: C,
) -> ImportSummary
where
    S: AttendanceStore + ?Sized,
    C: Future<Output = ()>,
{
    let unmatched = rows.iter().filter(|r| !r.is_matched()).count();

    // Same key, same group: rows of one (employee, day) are written in file
    // order so the last one wins and the key is inserted at most once.
    let mut groups: BTreeMap<(u64, NaiveDate), Vec<&MatchedRow>> = BTreeMap::new();
    for matched in rows {
        let Some(employee_id) = matched.employee_id else {
            continue;
        };
        if matched.row.status == StatusTag::WeeklyOff {
            continue;
        }
        groups.entry((employee_id, matched.row.date)).or_default().push(matched);
    }
    debug!(keys = groups.len(), unmatched, "reconciling attendance rows");

    let work_type = options.default_work_type.as_str();
    // Cancellation stops new groups from starting; started groups finish.
    stream::iter(groups)
        .take_until(cancel)
        .map(move |((employee_id, _), group)| {
            Box::pin(
                stream::iter(group)
                    .then(move |matched| record_row(store, employee_id, matched, work_type)),
            )
        })
        .flatten_unordered(options.concurrency.max(1))
        .fold(
            ImportSummary {
                unmatched,
                ..ImportSummary::default()
            },
            |summary, outcome| async move { summary.count(outcome) },
        )
        .await
}
