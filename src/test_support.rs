//! In-process fake of the Remote Roster Service for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::sync::Notify;

use crate::config::WriteMethod;
use crate::roster::RosterClient;
use crate::store::AttendanceStore;

/// A write received by the fake.
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub action: String,
    pub method: &'static str,
    pub fields: HashMap<String, String>,
}

/// Scriptable state behind the fake roster endpoint.
pub struct FakeState {
    pub children: Value,
    /// Attendance sheet keyed by child name
    pub attendance: Map<String, Value>,
    pub date: String,
    /// `None` answers `getHistory` with an "unknown action" error
    pub history: Option<Value>,
    pub fail_reads: bool,
    pub fail_writes: bool,
    /// Answer writes with `{success: false}` instead of an HTTP error
    pub reject_writes: bool,
    /// Only answer the older `getAttendance` action name
    pub legacy_attendance_only: bool,
    /// When set, writes wait for a notification before answering
    pub gate: Option<Arc<Notify>>,
    pub writes: Vec<RecordedWrite>,
    pub reads: Vec<String>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            children: json!({
                "children": [
                    {
                        "id": "A",
                        "childName": "Aisha Ahmad",
                        "parentName": "Fatima Ahmad",
                        "parentPhone": "(555) 123-4567",
                        "parentEmail": "fatima@email.com",
                        "allergies": "Peanut allergy"
                    },
                    {
                        "id": "B",
                        "child_name": "Omar Hassan",
                        "parent_name": "Yusuf Hassan",
                        "parent_phone": "(555) 234-5678",
                        "parent_email": "yusuf@email.com"
                    }
                ],
                "count": 2,
                "timestamp": "2026-10-19T07:00:00Z"
            }),
            attendance: Map::new(),
            date: "2026-10-19".to_string(),
            history: None,
            fail_reads: false,
            fail_writes: false,
            reject_writes: false,
            legacy_attendance_only: false,
            gate: None,
            writes: Vec::new(),
            reads: Vec::new(),
        }
    }
}

type Shared = Arc<Mutex<FakeState>>;

/// A running fake roster endpoint.
pub struct FakeRoster {
    pub url: String,
    state: Shared,
}

impl FakeRoster {
    pub async fn spawn(state: FakeState) -> Self {
        let shared: Shared = Arc::new(Mutex::new(state));
        let app = Router::new()
            .route("/exec", get(handle_get).post(handle_post))
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake roster");
        let addr = listener.local_addr().expect("Failed to get addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}/exec", addr),
            state: shared,
        }
    }

    pub fn client(&self, write_method: WriteMethod) -> RosterClient {
        RosterClient::new(&self.url, write_method, Duration::from_secs(5))
            .expect("Failed to build roster client")
    }

    pub fn store(&self) -> Arc<AttendanceStore> {
        Arc::new(AttendanceStore::new(self.client(WriteMethod::Get)))
    }

    pub fn update<F: FnOnce(&mut FakeState)>(&self, f: F) {
        f(&mut lock(&self.state));
    }

    /// Hold every subsequent write open until the returned handle is notified.
    pub fn install_gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.state).gate = Some(gate.clone());
        gate
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        lock(&self.state).writes.clone()
    }

    pub fn reads(&self) -> Vec<String> {
        lock(&self.state).reads.clone()
    }

    /// Wait until the fake has received `count` writes.
    pub async fn wait_for_writes(&self, count: usize) {
        for _ in 0..200 {
            if self.writes().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("fake roster never received {} writes", count);
    }
}

fn lock(state: &Shared) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

async fn handle_get(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let action = params.get("action").cloned().unwrap_or_default();
    match action.as_str() {
        "checkIn" | "checkOut" => {
            let mut fields = params;
            fields.remove("action");
            handle_write(state, action, "GET", fields).await
        }
        _ => handle_read(&state, &action),
    }
}

async fn handle_post(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let action = body["action"].as_str().unwrap_or_default().to_string();
    let fields = body["data"]
        .as_object()
        .map(|data| {
            data.iter()
                .map(|(k, v)| {
                    let v = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    (k.clone(), v)
                })
                .collect()
        })
        .unwrap_or_default();
    handle_write(state, action, "POST", fields).await
}

fn handle_read(state: &Shared, action: &str) -> Response {
    let mut s = lock(state);
    s.reads.push(action.to_string());

    if s.fail_reads {
        return (StatusCode::SERVICE_UNAVAILABLE, "roster offline").into_response();
    }

    let body = match action {
        "getChildren" => s.children.clone(),
        "getTodayAttendance" if s.legacy_attendance_only => {
            json!({ "error": "Unknown action: getTodayAttendance" })
        }
        "getTodayAttendance" | "getAttendance" => json!({
            "attendance": Value::Object(s.attendance.clone()),
            "date": s.date,
            "rowsChecked": s.attendance.len(),
        }),
        "getHistory" => s
            .history
            .clone()
            .unwrap_or_else(|| json!({ "error": "Unknown action: getHistory" })),
        other => json!({ "error": format!("Unknown action: {}", other) }),
    };
    Json(body).into_response()
}

async fn handle_write(
    state: Shared,
    action: String,
    method: &'static str,
    fields: HashMap<String, String>,
) -> Response {
    let gate = {
        let mut s = lock(&state);
        s.writes.push(RecordedWrite {
            action: action.clone(),
            method,
            fields: fields.clone(),
        });
        s.gate.clone()
    };

    if let Some(gate) = gate {
        gate.notified().await;
    }

    let mut s = lock(&state);
    if s.fail_writes {
        return (StatusCode::INTERNAL_SERVER_ERROR, "sheet locked").into_response();
    }
    if s.reject_writes {
        return Json(json!({ "success": false, "message": "Write rejected" })).into_response();
    }

    let child_name = fields.get("childName").cloned().unwrap_or_default();
    let time = if action == "checkIn" {
        let time = fields.get("checkInTime").cloned().unwrap_or_default();
        s.attendance.insert(
            child_name.clone(),
            json!({
                "checkedIn": true,
                "checkInTime": time,
                "dropOffPerson": fields.get("dropOffPerson").cloned().unwrap_or_default(),
            }),
        );
        time
    } else {
        let time = fields.get("checkOutTime").cloned().unwrap_or_default();
        if let Some(Value::Object(entry)) = s.attendance.get_mut(&child_name) {
            entry.insert("checkOutTime".to_string(), json!(time));
            entry.insert(
                "pickUpPerson".to_string(),
                json!(fields.get("pickUpPerson").cloned().unwrap_or_default()),
            );
        }
        time
    };

    Json(json!({
        "success": true,
        "message": format!("{} recorded", action),
        "data": { "childName": child_name, "time": time }
    }))
    .into_response()
}
