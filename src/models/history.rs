//! Attendance history models and date grouping.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One historical attendance row as reported by the Remote Roster Service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub date: String,
    pub child_name: String,
    pub parent_name: String,
    pub parent_phone: String,
    pub check_in_time: Option<String>,
    pub dropped_off_by: Option<String>,
    pub check_out_time: Option<String>,
    pub picked_up_by: Option<String>,
}

/// Records sharing one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDay {
    pub date: String,
    pub count: usize,
    pub records: Vec<HistoryRecord>,
}

/// Where a history listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HistorySource {
    History,
    TodayFallback,
}

/// History grouped by date, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub source: HistorySource,
    /// Every distinct date in the unfiltered data, newest first
    pub dates: Vec<String>,
    pub days: Vec<HistoryDay>,
}

impl History {
    pub fn build(
        records: Vec<HistoryRecord>,
        date_filter: Option<&str>,
        source: HistorySource,
    ) -> Self {
        let mut dates: Vec<String> = Vec::new();
        for record in &records {
            if !dates.contains(&record.date) {
                dates.push(record.date.clone());
            }
        }
        dates.sort_by(|a, b| newest_first(a, b));

        let filter = date_filter.map(str::trim).filter(|d| !d.is_empty());
        let mut days: Vec<HistoryDay> = Vec::new();
        for record in records {
            if filter.is_some_and(|d| d != record.date) {
                continue;
            }
            match days.iter_mut().find(|day| day.date == record.date) {
                Some(day) => day.records.push(record),
                None => days.push(HistoryDay {
                    date: record.date.clone(),
                    count: 0,
                    records: vec![record],
                }),
            }
        }
        for day in &mut days {
            day.count = day.records.len();
        }
        days.sort_by(|a, b| newest_first(&a.date, &b.date));

        Self {
            source,
            dates,
            days,
        }
    }
}

/// Parse the date formats the roster spreadsheet is known to emit.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%Y-%m-%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Newest parseable date first; unparseable dates last, in string order.
fn newest_first(a: &str, b: &str) -> Ordering {
    match (parse_date(a), parse_date(b)) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, child: &str) -> HistoryRecord {
        HistoryRecord {
            date: date.to_string(),
            child_name: child.to_string(),
            parent_name: String::new(),
            parent_phone: String::new(),
            check_in_time: Some("8:00 AM".to_string()),
            dropped_off_by: None,
            check_out_time: None,
            picked_up_by: None,
        }
    }

    #[test]
    fn test_groups_newest_first() {
        let history = History::build(
            vec![
                row("10/1/2026", "Adam"),
                row("2026-10-03", "Layla"),
                row("10/1/2026", "Zara"),
                row("someday", "Khalid"),
                row("2026-10-02", "Omar"),
            ],
            None,
            HistorySource::History,
        );

        let order: Vec<&str> = history.days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(order, vec!["2026-10-03", "2026-10-02", "10/1/2026", "someday"]);
        assert_eq!(history.dates, order);

        let oct_first = &history.days[2];
        assert_eq!(oct_first.count, 2);
        assert_eq!(oct_first.records[0].child_name, "Adam");
        assert_eq!(oct_first.records[1].child_name, "Zara");
    }

    #[test]
    fn test_date_filter_keeps_all_dates() {
        let history = History::build(
            vec![row("2026-10-02", "Omar"), row("2026-10-03", "Layla")],
            Some("2026-10-02"),
            HistorySource::TodayFallback,
        );
        assert_eq!(history.dates.len(), 2);
        assert_eq!(history.days.len(), 1);
        assert_eq!(history.days[0].records[0].child_name, "Omar");
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2026-01-05"), NaiveDate::from_ymd_opt(2026, 1, 5));
        assert_eq!(parse_date("1/5/2026"), NaiveDate::from_ymd_opt(2026, 1, 5));
        assert_eq!(parse_date("yesterday"), None);
    }
}
