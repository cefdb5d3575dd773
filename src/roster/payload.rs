//! Normalization of Remote Roster Service payloads.
//!
//! The roster spreadsheet has been edited by hand over time, so the same
//! field can arrive under several names. Every accepted alias is listed here
//! and nowhere else; the first alias holding a non-empty value wins.

use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::{AttendanceRecord, Child, HistoryRecord, NO_ALLERGIES};

const CHILD_ID: &[&str] = &["id", "Id", "ID", "childId", "child_id"];
const CHILD_NAME: &[&str] = &["childName", "child_name", "name"];
const PARENT_NAME: &[&str] = &["parentName", "parent_name"];
const PARENT_PHONE: &[&str] = &["parentPhone", "parent_phone"];
const PARENT_EMAIL: &[&str] = &["parentEmail", "parent_email"];
const ALLERGIES: &[&str] = &[
    "allergies",
    "allergies_medical_notes",
    "allergiesNotes",
    "allergies_notes",
];
const ROSTER_ARRAY: &[&str] = &["children", "data"];
const HISTORY_ARRAY: &[&str] = &["history", "records", "data"];

const DATE: &[&str] = &["date", "Date"];
const CHECKED_IN: &[&str] = &["checkedIn", "checked_in"];
const CHECK_IN_TIME: &[&str] = &["checkInTime", "check_in_time"];
const DROPPED_OFF_BY: &[&str] = &[
    "droppedOffBy",
    "dropped_off_by",
    "dropOffPerson",
    "drop_off_person",
];
const CHECK_OUT_TIME: &[&str] = &["checkOutTime", "check_out_time"];
const PICKED_UP_BY: &[&str] = &["pickedUpBy", "picked_up_by", "pickUpPerson", "pick_up_person"];

/// One child's entry in today's attendance, keyed remotely by child name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAttendance {
    pub checked_in: bool,
    pub check_in_time: Option<String>,
    pub dropped_off_by: Option<String>,
    pub check_out_time: Option<String>,
    pub picked_up_by: Option<String>,
}

/// Today's attendance sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodayAttendance {
    pub date: Option<String>,
    /// `(child name, entry)` pairs
    pub entries: Vec<(String, RemoteAttendance)>,
}

impl TodayAttendance {
    pub fn entry_for(&self, child_name: &str) -> Option<&RemoteAttendance> {
        self.entries
            .iter()
            .find(|(name, _)| name == child_name)
            .map(|(_, entry)| entry)
    }
}

/// What the service echoed back for a successful write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionReceipt {
    pub message: Option<String>,
    pub child_name: Option<String>,
    pub time: Option<String>,
}

/// Fail if the payload carries an `error` field.
pub fn ensure_no_error(value: &Value) -> Result<(), AppError> {
    match value.get("error") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(msg)) => Err(AppError::Upstream(msg.clone())),
        Some(other) => Err(AppError::Upstream(other.to_string())),
    }
}

/// Map a `getChildren` payload into the roster.
pub fn parse_children(value: &Value) -> Result<Vec<Child>, AppError> {
    ensure_no_error(value)?;
    let obj = as_object(value, "roster")?;

    let raw = ROSTER_ARRAY
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array))
        .ok_or_else(|| {
            AppError::MalformedPayload("Roster payload has no children array".to_string())
        })?;

    raw.iter()
        .enumerate()
        .map(|(idx, entry)| {
            let entry = entry.as_object().ok_or_else(|| {
                AppError::MalformedPayload(format!("Roster entry {} is not an object", idx))
            })?;
            let id = pick(entry, CHILD_ID).ok_or_else(|| {
                AppError::MalformedPayload(format!("Roster entry {} has no id", idx))
            })?;

            Ok(Child {
                id,
                name: pick(entry, CHILD_NAME).unwrap_or_default(),
                parent_name: pick(entry, PARENT_NAME).unwrap_or_default(),
                parent_phone: pick(entry, PARENT_PHONE).unwrap_or_default(),
                parent_email: pick(entry, PARENT_EMAIL).unwrap_or_default(),
                allergies_notes: pick(entry, ALLERGIES)
                    .unwrap_or_else(|| NO_ALLERGIES.to_string()),
            })
        })
        .collect()
}

/// Map a `getTodayAttendance` payload.
pub fn parse_today_attendance(value: &Value) -> Result<TodayAttendance, AppError> {
    ensure_no_error(value)?;
    let obj = as_object(value, "attendance")?;

    let sheet = match obj.get("attendance") {
        Some(Value::Object(sheet)) => sheet,
        Some(Value::Null) => {
            return Ok(TodayAttendance {
                date: pick(obj, DATE),
                entries: Vec::new(),
            })
        }
        _ => {
            return Err(AppError::MalformedPayload(
                "Attendance payload has no attendance map".to_string(),
            ))
        }
    };

    let entries = sheet
        .iter()
        .filter_map(|(name, entry)| {
            let entry = entry.as_object()?;
            Some((
                name.trim().to_string(),
                RemoteAttendance {
                    checked_in: pick_bool(entry, CHECKED_IN),
                    check_in_time: pick(entry, CHECK_IN_TIME),
                    dropped_off_by: pick(entry, DROPPED_OFF_BY),
                    check_out_time: pick(entry, CHECK_OUT_TIME),
                    picked_up_by: pick(entry, PICKED_UP_BY),
                },
            ))
        })
        .collect();

    Ok(TodayAttendance {
        date: pick(obj, DATE),
        entries,
    })
}

/// Map a `getHistory` payload. `None` means the service does not support
/// the action and the caller should fall back to today's attendance.
pub fn parse_history(value: &Value) -> Option<Vec<HistoryRecord>> {
    if ensure_no_error(value).is_err() {
        return None;
    }

    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(obj) => HISTORY_ARRAY
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array))?,
        _ => return None,
    };

    Some(
        rows.iter()
            .filter_map(Value::as_object)
            .map(|row| HistoryRecord {
                date: pick(row, DATE).unwrap_or_default(),
                child_name: pick(row, CHILD_NAME).unwrap_or_default(),
                parent_name: pick(row, PARENT_NAME).unwrap_or_default(),
                parent_phone: pick(row, PARENT_PHONE).unwrap_or_default(),
                check_in_time: pick(row, CHECK_IN_TIME),
                dropped_off_by: pick(row, DROPPED_OFF_BY),
                check_out_time: pick(row, CHECK_OUT_TIME),
                picked_up_by: pick(row, PICKED_UP_BY),
            })
            .collect(),
    )
}

/// Map a `checkIn`/`checkOut` response.
pub fn parse_action(value: &Value) -> Result<ActionReceipt, AppError> {
    ensure_no_error(value)?;
    let obj = as_object(value, "action")?;

    let message = pick(obj, &["message"]);
    if obj.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(AppError::Upstream(
            message.unwrap_or_else(|| "Roster service rejected the write".to_string()),
        ));
    }

    let data = obj.get("data").and_then(Value::as_object);
    Ok(ActionReceipt {
        message,
        child_name: data.and_then(|d| pick(d, CHILD_NAME)),
        time: data.and_then(|d| pick(d, &["time"])),
    })
}

/// Build today's records for the roster from the attendance sheet.
///
/// Entries are matched to children by exact name. Entries without a
/// check-in are skipped, so every record produced carries a check-in time.
pub fn records_for_roster(
    children: &[Child],
    sheet: &TodayAttendance,
    today: &str,
) -> Vec<AttendanceRecord> {
    let date = sheet.date.as_deref().unwrap_or(today);

    children
        .iter()
        .filter_map(|child| {
            let entry = sheet.entry_for(&child.name)?;
            if !entry.checked_in {
                return None;
            }
            let check_in_time = entry.check_in_time.clone()?;
            let record = AttendanceRecord::check_in(
                date,
                child,
                check_in_time,
                entry.dropped_off_by.clone(),
            );
            Some(match &entry.check_out_time {
                Some(out) => record.with_check_out(out.clone(), entry.picked_up_by.clone()),
                None => record,
            })
        })
        .collect()
}

/// Present today's attendance as history rows, filling guardian details
/// from the roster where the child name matches.
pub fn today_as_history(
    children: &[Child],
    sheet: &TodayAttendance,
    today: &str,
) -> Vec<HistoryRecord> {
    let date = sheet.date.as_deref().unwrap_or(today);

    sheet
        .entries
        .iter()
        .filter(|(_, entry)| entry.checked_in && entry.check_in_time.is_some())
        .map(|(name, entry)| {
            let child = children.iter().find(|c| &c.name == name);
            HistoryRecord {
                date: date.to_string(),
                child_name: name.clone(),
                parent_name: child.map(|c| c.parent_name.clone()).unwrap_or_default(),
                parent_phone: child.map(|c| c.parent_phone.clone()).unwrap_or_default(),
                check_in_time: entry.check_in_time.clone(),
                dropped_off_by: entry.dropped_off_by.clone(),
                check_out_time: entry.check_out_time.clone(),
                picked_up_by: entry.picked_up_by.clone(),
            }
        })
        .collect()
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, AppError> {
    value
        .as_object()
        .ok_or_else(|| AppError::MalformedPayload(format!("{} payload is not a JSON object", what)))
}

/// First alias holding a non-empty string or a number.
fn pick(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn pick_bool(obj: &Map<String, Value>, aliases: &[&str]) -> bool {
    aliases.iter().any(|key| match obj.get(*key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
        }
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    })
}
