//! Attendance Store: the session's roster and today's records.
//!
//! Mutations are two-phase. The local delta is applied first and is visible
//! to readers immediately; the remote write follows. If the write fails the
//! precomputed inverse delta is applied and the error is returned.
//! The remote write and its reconcile step run in a spawned task, so they
//! complete even if the caller is dropped mid-request.
//! The state lock is never held across a remote call.

mod in_flight;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::clock;
use crate::errors::AppError;
use crate::models::{
    AttendanceRecord, AttendanceStats, AttendanceStatus, Child, ChildEntry, History,
    HistorySource, ListQuery, Page, StatusCounts,
};
use crate::roster::{payload, CheckInData, CheckOutData, RosterClient};

use in_flight::InFlight;

#[derive(Default)]
struct StoreState {
    children: Vec<Child>,
    /// Today's records keyed by child id
    records: HashMap<String, AttendanceRecord>,
    revision: i64,
    loaded_at: Option<DateTime<Utc>>,
}

impl StoreState {
    fn child(&self, child_id: &str) -> Result<&Child, AppError> {
        self.children
            .iter()
            .find(|c| c.id == child_id)
            .ok_or_else(|| AppError::NotFound(format!("Child {} not found", child_id)))
    }

    fn status_of(&self, child_id: &str) -> AttendanceStatus {
        AttendanceStatus::of(self.records.get(child_id))
    }

    fn entry(&self, child: &Child) -> ChildEntry {
        let record = self.records.get(&child.id).cloned();
        ChildEntry {
            child: child.clone(),
            status: AttendanceStatus::of(record.as_ref()),
            has_allergies: child.has_allergies(),
            record,
        }
    }
}

/// Summary of a completed `load`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub children: usize,
    pub records: usize,
    pub revision_id: i64,
    pub loaded_at: DateTime<Utc>,
}

/// Owns the roster and today's attendance for one session.
pub struct AttendanceStore {
    roster: RosterClient,
    state: Arc<RwLock<StoreState>>,
    in_flight: Arc<InFlight>,
}

impl AttendanceStore {
    /// An empty store; call [`AttendanceStore::load`] to populate it.
    pub fn new(roster: RosterClient) -> Self {
        Self {
            roster,
            state: Arc::new(RwLock::new(StoreState::default())),
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Fetch the roster and today's attendance and replace local state.
    ///
    /// On failure the previous state is kept untouched.
    pub async fn load(&self) -> Result<LoadSummary, AppError> {
        let children = self.roster.get_children().await?;
        let sheet = self.roster.get_today_attendance().await?;
        let records: HashMap<String, AttendanceRecord> =
            payload::records_for_roster(&children, &sheet, &clock::today())
                .into_iter()
                .map(|r| (r.child_id.clone(), r))
                .collect();

        let mut state = self.state.write().await;
        state.children = children;
        state.records = records;
        state.revision += 1;
        let loaded_at = Utc::now();
        state.loaded_at = Some(loaded_at);

        tracing::info!(
            children = state.children.len(),
            records = state.records.len(),
            revision = state.revision,
            "Roster loaded"
        );

        Ok(LoadSummary {
            children: state.children.len(),
            records: state.records.len(),
            revision_id: state.revision,
            loaded_at,
        })
    }

    pub async fn revision(&self) -> i64 {
        self.state.read().await.revision
    }

    pub async fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.loaded_at
    }

    /// Derived status; `NotCheckedIn` for unknown ids.
    pub async fn status_of(&self, child_id: &str) -> AttendanceStatus {
        self.state.read().await.status_of(child_id)
    }

    pub async fn record_of(&self, child_id: &str) -> Option<AttendanceRecord> {
        self.state.read().await.records.get(child_id).cloned()
    }

    pub async fn children(&self) -> Vec<Child> {
        self.state.read().await.children.clone()
    }

    /// Today's records in roster order.
    pub async fn records(&self) -> Vec<AttendanceRecord> {
        let state = self.state.read().await;
        state
            .children
            .iter()
            .filter_map(|c| state.records.get(&c.id).cloned())
            .collect()
    }

    pub async fn child_entry(&self, child_id: &str) -> Result<ChildEntry, AppError> {
        let state = self.state.read().await;
        let child = state.child(child_id)?;
        Ok(state.entry(child))
    }

    pub async fn stats(&self) -> AttendanceStats {
        let state = self.state.read().await;
        let total = state.children.len();
        let checked_in = state
            .records
            .values()
            .filter(|r| r.check_in_time.is_some() && r.check_out_time.is_none())
            .count();
        let checked_out = state
            .records
            .values()
            .filter(|r| r.check_out_time.is_some())
            .count();

        AttendanceStats {
            checked_in,
            checked_out,
            not_checked_in: total.saturating_sub(state.records.len()),
            total,
        }
    }

    /// Search, filter by status and paginate the roster.
    pub async fn list(&self, query: &ListQuery) -> Page<ChildEntry> {
        let search = query.search.as_deref().unwrap_or_default();
        let state = self.state.read().await;
        let matching: Vec<ChildEntry> = state
            .children
            .iter()
            .filter(|c| c.matches_search(search))
            .filter(|c| query.status.accepts(state.status_of(&c.id)))
            .map(|c| state.entry(c))
            .collect();

        Page::paginate(matching, query.page, query.per_page)
    }

    /// Per-status counts over children matching `search`.
    pub async fn status_counts(&self, search: Option<&str>) -> StatusCounts {
        let search = search.unwrap_or_default();
        let state = self.state.read().await;
        let mut counts = StatusCounts::default();
        for child in state.children.iter().filter(|c| c.matches_search(search)) {
            counts.all += 1;
            match state.status_of(&child.id) {
                AttendanceStatus::NotCheckedIn => counts.not_checked_in += 1,
                AttendanceStatus::CheckedIn => counts.checked_in += 1,
                AttendanceStatus::CheckedOut => counts.checked_out += 1,
            }
        }
        counts
    }

    /// Check a child in, replacing any earlier record for today.
    pub async fn check_in(
        &self,
        child_id: &str,
        dropped_off_by: &str,
    ) -> Result<AttendanceRecord, AppError> {
        let dropped_off_by = required_name(dropped_off_by, "Drop-off person")?;
        let guard = self.in_flight.begin(child_id)?;

        // Phase one: apply locally, remembering what to restore.
        let (record, previous) = {
            let mut state = self.state.write().await;
            let child = state.child(child_id)?;
            let record = AttendanceRecord::check_in(
                &clock::today(),
                child,
                clock::current_time(),
                Some(dropped_off_by),
            );
            let previous = state.records.insert(child_id.to_string(), record.clone());
            state.revision += 1;
            (record, previous)
        };

        let data = CheckInData {
            child_name: record.child_name.clone(),
            parent_name: record.parent_name.clone(),
            parent_phone: record.parent_phone.clone(),
            check_in_time: record.check_in_time.clone().unwrap_or_default(),
            drop_off_person: record.dropped_off_by.clone().unwrap_or_default(),
        };

        // Phase two runs detached so a dropped caller cannot skip the rollback.
        let roster = self.roster.clone();
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            let _guard = guard;
            match roster.check_in(&data).await {
                Ok(receipt) => {
                    tracing::info!(
                        child_id = %record.child_id,
                        child = %record.child_name,
                        dropped_off_by = %data.drop_off_person,
                        remote_time = ?receipt.time,
                        "Checked in"
                    );
                    Ok(record)
                }
                Err(err) => {
                    let mut state = state.write().await;
                    if state.records.get(&record.child_id) == Some(&record) {
                        match previous {
                            Some(previous) => {
                                state.records.insert(record.child_id.clone(), previous);
                            }
                            None => {
                                state.records.remove(&record.child_id);
                            }
                        }
                        state.revision += 1;
                    }
                    tracing::warn!(
                        child_id = %record.child_id,
                        child = %record.child_name,
                        "Failed to check in {}, reverted: {}",
                        record.child_name,
                        err
                    );
                    Err(err)
                }
            }
        });

        join_write(task).await
    }

    /// Check out a child that is currently checked in.
    pub async fn check_out(
        &self,
        child_id: &str,
        picked_up_by: &str,
    ) -> Result<AttendanceRecord, AppError> {
        let picked_up_by = required_name(picked_up_by, "Pick-up person")?;
        let guard = self.in_flight.begin(child_id)?;

        let record = {
            let mut state = self.state.write().await;
            let child = state.child(child_id)?;
            let current = match state.records.get(child_id) {
                Some(r) if r.status() == AttendanceStatus::CheckedIn => r,
                Some(_) => {
                    return Err(AppError::Validation(format!(
                        "{} is already checked out",
                        child.name
                    )))
                }
                None => {
                    return Err(AppError::Validation(format!(
                        "{} is not checked in",
                        child.name
                    )))
                }
            };
            let record = current.with_check_out(clock::current_time(), Some(picked_up_by));
            state.records.insert(child_id.to_string(), record.clone());
            state.revision += 1;
            record
        };

        let data = CheckOutData {
            child_name: record.child_name.clone(),
            check_out_time: record.check_out_time.clone().unwrap_or_default(),
            pick_up_person: record.picked_up_by.clone().unwrap_or_default(),
        };

        let roster = self.roster.clone();
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            let _guard = guard;
            match roster.check_out(&data).await {
                Ok(receipt) => {
                    tracing::info!(
                        child_id = %record.child_id,
                        child = %record.child_name,
                        picked_up_by = %data.pick_up_person,
                        remote_time = ?receipt.time,
                        "Checked out"
                    );
                    Ok(record)
                }
                Err(err) => {
                    let mut guard = state.write().await;
                    let state = &mut *guard;
                    if let Some(current) = state.records.get_mut(&record.child_id) {
                        if *current == record {
                            current.check_out_time = None;
                            current.picked_up_by = None;
                            state.revision += 1;
                        }
                    }
                    tracing::warn!(
                        child_id = %record.child_id,
                        child = %record.child_name,
                        "Failed to check out {}, reverted: {}",
                        record.child_name,
                        err
                    );
                    Err(err)
                }
            }
        });

        join_write(task).await
    }

    /// Attendance history grouped by date, newest first.
    ///
    /// Deployments without `getHistory` get today's attendance instead.
    pub async fn history(&self, date: Option<&str>) -> Result<History, AppError> {
        let (rows, source) = match self.roster.get_history().await? {
            Some(rows) => (rows, HistorySource::History),
            None => {
                tracing::debug!("getHistory unsupported, falling back to today's attendance");
                let sheet = self.roster.get_today_attendance().await?;
                let children = self.children().await;
                (
                    payload::today_as_history(&children, &sheet, &clock::today()),
                    HistorySource::TodayFallback,
                )
            }
        };

        Ok(History::build(rows, date, source))
    }
}

/// Wait for a detached remote write and its reconcile step.
async fn join_write(
    task: JoinHandle<Result<AttendanceRecord, AppError>>,
) -> Result<AttendanceRecord, AppError> {
    task.await.map_err(|e| {
        tracing::error!("Roster write task failed: {}", e);
        AppError::Upstream(format!("Roster write did not complete: {}", e))
    })?
}

fn required_name(raw: &str, what: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", what)));
    }
    Ok(trimmed.to_string())
}
