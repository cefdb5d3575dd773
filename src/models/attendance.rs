//! Attendance record, derived status and aggregate counts.

use serde::{Deserialize, Serialize};

use super::Child;

/// Derived three-valued attendance classification. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    NotCheckedIn,
    CheckedIn,
    CheckedOut,
}

impl AttendanceStatus {
    /// Status of a child given its record for the day, if any.
    pub fn of(record: Option<&AttendanceRecord>) -> Self {
        match record {
            Some(r) if r.check_in_time.is_some() => {
                if r.check_out_time.is_some() {
                    AttendanceStatus::CheckedOut
                } else {
                    AttendanceStatus::CheckedIn
                }
            }
            _ => AttendanceStatus::NotCheckedIn,
        }
    }
}

/// One child's attendance for one calendar day.
///
/// Built only through [`AttendanceRecord::check_in`], so a record always
/// carries a check-in time and never has a check-out without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub date: String,
    pub child_id: String,
    pub child_name: String,
    pub parent_name: String,
    pub parent_phone: String,
    pub check_in_time: Option<String>,
    pub dropped_off_by: Option<String>,
    pub check_out_time: Option<String>,
    pub picked_up_by: Option<String>,
}

impl AttendanceRecord {
    /// Record id for a child on a date; at most one record per child per day.
    pub fn record_id(date: &str, child_id: &str) -> String {
        format!("{}-{}", date, child_id)
    }

    /// Fresh record for a child checked in at `time`, with guardian details
    /// denormalized from the roster entry. The drop-off person is optional
    /// only for entries read back from the sheet.
    pub fn check_in(
        date: &str,
        child: &Child,
        time: String,
        dropped_off_by: Option<String>,
    ) -> Self {
        Self {
            id: Self::record_id(date, &child.id),
            date: date.to_string(),
            child_id: child.id.clone(),
            child_name: child.name.clone(),
            parent_name: child.parent_name.clone(),
            parent_phone: child.parent_phone.clone(),
            check_in_time: Some(time),
            dropped_off_by,
            check_out_time: None,
            picked_up_by: None,
        }
    }

    /// Copy of this record with the check-out fields filled in.
    pub fn with_check_out(&self, time: String, picked_up_by: Option<String>) -> Self {
        Self {
            check_out_time: Some(time),
            picked_up_by,
            ..self.clone()
        }
    }

    pub fn status(&self) -> AttendanceStatus {
        AttendanceStatus::of(Some(self))
    }
}

/// Aggregate counts over the roster for today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub checked_in: usize,
    pub checked_out: usize,
    pub not_checked_in: usize,
    pub total: usize,
}

/// Per-status counts for the filter badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub all: usize,
    pub checked_in: usize,
    pub checked_out: usize,
    pub not_checked_in: usize,
}

/// Status filter for roster listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    NotCheckedIn,
    CheckedIn,
    CheckedOut,
}

impl StatusFilter {
    pub fn accepts(&self, status: AttendanceStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::NotCheckedIn => status == AttendanceStatus::NotCheckedIn,
            StatusFilter::CheckedIn => status == AttendanceStatus::CheckedIn,
            StatusFilter::CheckedOut => status == AttendanceStatus::CheckedOut,
        }
    }
}

/// A roster child together with its derived status and today's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildEntry {
    pub child: Child,
    pub status: AttendanceStatus,
    pub has_allergies: bool,
    pub record: Option<AttendanceRecord>,
}

/// Query parameters for roster listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
}

pub const DEFAULT_PER_PAGE: usize = 12;
pub const MAX_PER_PAGE: usize = 100;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slice `all` into the requested 1-based page.
    pub fn paginate(all: Vec<T>, page: Option<usize>, per_page: Option<usize>) -> Self {
        let per_page = per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let page = page.unwrap_or(1).max(1);
        let total_items = all.len();
        let total_pages = total_items.div_ceil(per_page);

        let items = all
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        Self {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        }
    }
}

/// Request body for checking a child in.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    #[serde(default)]
    pub dropped_off_by: String,
}

/// Request body for checking a child out.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutRequest {
    #[serde(default)]
    pub picked_up_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NO_ALLERGIES;

    fn child() -> Child {
        Child {
            id: "42".to_string(),
            name: "Omar Hassan".to_string(),
            parent_name: "Yusuf Hassan".to_string(),
            parent_phone: "(555) 234-5678".to_string(),
            parent_email: "yusuf@email.com".to_string(),
            allergies_notes: NO_ALLERGIES.to_string(),
        }
    }

    #[test]
    fn test_status_derivation() {
        assert_eq!(AttendanceStatus::of(None), AttendanceStatus::NotCheckedIn);

        let record = AttendanceRecord::check_in(
            "2026-10-19",
            &child(),
            "8:05 AM".to_string(),
            Some("Yusuf".to_string()),
        );
        assert_eq!(record.id, "2026-10-19-42");
        assert_eq!(record.status(), AttendanceStatus::CheckedIn);

        let done = record.with_check_out("4:30 PM".to_string(), Some("Grandma".to_string()));
        assert_eq!(done.status(), AttendanceStatus::CheckedOut);
        assert_eq!(done.check_in_time.as_deref(), Some("8:05 AM"));

        let blank = AttendanceRecord {
            check_in_time: None,
            ..record
        };
        assert_eq!(blank.status(), AttendanceStatus::NotCheckedIn);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_value(AttendanceStatus::NotCheckedIn).unwrap();
        assert_eq!(json, "not-checked-in");
        let parsed: AttendanceStatus = serde_json::from_str("\"checked-out\"").unwrap();
        assert_eq!(parsed, AttendanceStatus::CheckedOut);
    }

    #[test]
    fn test_paginate() {
        let page = Page::paginate((1..=25).collect::<Vec<_>>(), Some(3), Some(10));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 25);

        let past_end = Page::paginate((1..=5).collect::<Vec<_>>(), Some(4), Some(2));
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_pages, 3);

        let clamped = Page::paginate(Vec::<u8>::new(), Some(0), Some(1000));
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.per_page, MAX_PER_PAGE);
        assert_eq!(clamped.total_pages, 0);
    }

    #[test]
    fn test_status_filter() {
        assert!(StatusFilter::All.accepts(AttendanceStatus::CheckedOut));
        assert!(StatusFilter::CheckedIn.accepts(AttendanceStatus::CheckedIn));
        assert!(!StatusFilter::CheckedIn.accepts(AttendanceStatus::NotCheckedIn));
    }
}
