use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Attendance status as stored in the `attendance.status` column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusTag {
    Present,
    Absent,
    HalfDay,
    Late,
    WeeklyOff,
}

/// Serial numbers outside this window are treated as plain numbers, not dates.
const SERIAL_MIN: f64 = 40_000.0;
const SERIAL_MAX: f64 = 60_000.0;

/// Day zero of the spreadsheet serial calendar. Starting on 1899-12-30
/// rather than 1900-01-01 absorbs the phantom 1900-02-29.
fn from_serial(serial: f64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

fn is_serial_date(value: f64) -> bool {
    value > SERIAL_MIN && value < SERIAL_MAX
}

// Two-digit years first: `%Y` happily reads "26" as year 26.
const DATE_FORMATS: &[&str] = &[
    "%d-%b-%y", "%d-%b-%Y", "%d %b %Y", "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d",
    "%b %d, %Y", "%b %d %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d-%b-%Y %H:%M:%S",
    "%d-%b-%Y %H:%M",
];

static CLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").expect("clock pattern is valid"));

pub fn normalize_date(cell: &str) -> Option<NaiveDate> {
    let text = cell.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(serial) = text.parse::<f64>() {
        return if is_serial_date(serial) { from_serial(serial) } else { None };
    }

    parse_date_text(text).or_else(|| {
        // "01-Jan-2026 Thu", "01/01/2026 00:00"
        let head = text.split_whitespace().next()?;
        (head != text).then(|| parse_date_text(head)).flatten()
    })
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// `None` means no punch was recorded; midnight is never returned.
pub fn normalize_time(cell: &str) -> Option<NaiveTime> {
    let text = cell.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = CLOCK.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        return non_midnight(NaiveTime::from_hms_opt(hour, minute, 0)?);
    }

    let upper = text.to_uppercase();
    for fmt in ["%I:%M %p", "%I:%M:%S %p", "%I:%M%p"] {
        if let Ok(t) = NaiveTime::parse_from_str(&upper, fmt) {
            return non_midnight(t.with_second(0)?);
        }
    }

    let mut fraction: f64 = text.parse().ok()?;
    if is_serial_date(fraction) {
        // date and time in one serial
        fraction = fraction.fract();
    }
    if !(0.0..1.0).contains(&fraction) {
        return None;
    }
    let minutes = ((fraction * 1440.0).round() as u32).min(1439);
    non_midnight(NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)?)
}

fn non_midnight(time: NaiveTime) -> Option<NaiveTime> {
    (time.num_seconds_from_midnight() != 0).then_some(time)
}

fn fold_status(raw: &str) -> String {
    raw.trim().to_lowercase().replace('½', "half").replace("1/2", "half")
}

/// Unrecognized text maps to `Absent`.
pub fn normalize_status(raw: &str) -> StatusTag {
    let text = fold_status(raw);
    let half_present = text.contains("half present") || text.contains("halfpresent");

    if text.contains("weeklyoff") || text.contains("weekly off") {
        return if half_present {
            StatusTag::HalfDay
        } else if text.contains("present") {
            StatusTag::Present
        } else {
            StatusTag::WeeklyOff
        };
    }
    if half_present {
        return StatusTag::HalfDay;
    }
    if text.contains("present") {
        return StatusTag::Present;
    }
    match text.as_str() {
        "absent" => StatusTag::Absent,
        "late" => StatusTag::Late,
        _ => StatusTag::Absent,
    }
}

/// True when `normalize_status` would recognize the text without falling
/// back to the default.
pub fn is_known_status(raw: &str) -> bool {
    let text = fold_status(raw);
    ["present", "weeklyoff", "weekly off"].iter().any(|k| text.contains(k))
        || matches!(text.as_str(), "absent" | "late")
}

/// Loose vocabulary test used when hunting for a status in neighbouring cells.
pub fn looks_like_status(text: &str) -> bool {
    let text = fold_status(text);
    !text.is_empty()
        && ["present", "absent", "weeklyoff", "weekly off", "half", "late", "leave"]
            .iter()
            .any(|k| text.contains(k))
}
