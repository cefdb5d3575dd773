//! HTTP client for the Remote Roster Service.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::{json, Value};

use super::payload::{self, ActionReceipt, TodayAttendance};
use crate::config::WriteMethod;
use crate::errors::AppError;
use crate::models::{Child, HistoryRecord};

/// Fields sent with a `checkIn` write.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInData {
    pub child_name: String,
    pub parent_name: String,
    pub parent_phone: String,
    pub check_in_time: String,
    pub drop_off_person: String,
}

/// Fields sent with a `checkOut` write.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutData {
    pub child_name: String,
    pub check_out_time: String,
    pub pick_up_person: String,
}

/// Client for the single `action`-dispatched roster endpoint.
#[derive(Clone)]
pub struct RosterClient {
    http: Client,
    url: String,
    write_method: WriteMethod,
}

impl RosterClient {
    pub fn new(url: &str, write_method: WriteMethod, timeout: Duration) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: url.to_string(),
            write_method,
        })
    }

    /// GET ?action=getChildren
    pub async fn get_children(&self) -> Result<Vec<Child>, AppError> {
        let body = self.read("getChildren").await?;
        payload::parse_children(&body)
    }

    /// GET ?action=getTodayAttendance, retrying once as `getAttendance`
    /// for deployments that only know the older action name.
    pub async fn get_today_attendance(&self) -> Result<TodayAttendance, AppError> {
        let body = self.read("getTodayAttendance").await?;
        match payload::parse_today_attendance(&body) {
            Err(AppError::Upstream(first)) => {
                tracing::debug!("getTodayAttendance rejected ({}), trying getAttendance", first);
                let legacy = self.read("getAttendance").await?;
                payload::parse_today_attendance(&legacy).map_err(|_| AppError::Upstream(first))
            }
            other => other,
        }
    }

    /// GET ?action=getHistory. `Ok(None)` when the deployment does not
    /// support the action.
    pub async fn get_history(&self) -> Result<Option<Vec<HistoryRecord>>, AppError> {
        let body = self.read("getHistory").await?;
        Ok(payload::parse_history(&body))
    }

    pub async fn check_in(&self, data: &CheckInData) -> Result<ActionReceipt, AppError> {
        self.write("checkIn", data).await
    }

    pub async fn check_out(&self, data: &CheckOutData) -> Result<ActionReceipt, AppError> {
        self.write("checkOut", data).await
    }

    async fn read(&self, action: &str) -> Result<Value, AppError> {
        tracing::debug!(action, "Roster service read");
        let response = self
            .http
            .get(&self.url)
            .query(&[("action", action)])
            .send()
            .await?;
        Self::json_body(action, response).await
    }

    async fn write<T: Serialize>(&self, action: &str, data: &T) -> Result<ActionReceipt, AppError> {
        tracing::debug!(action, method = ?self.write_method, "Roster service write");
        let request = match self.write_method {
            WriteMethod::Get => self
                .http
                .get(&self.url)
                .query(&[("action", action)])
                .query(data),
            WriteMethod::Post => self
                .http
                .post(&self.url)
                .json(&json!({ "action": action, "data": data })),
        };

        let response = request.send().await?;
        let body = Self::json_body(action, response).await?;
        let receipt = payload::parse_action(&body)?;
        tracing::debug!(action, message = ?receipt.message, "Roster service accepted write");
        Ok(receipt)
    }

    async fn json_body(action: &str, response: Response) -> Result<Value, AppError> {
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "Roster service returned {} for {}",
                status, action
            )));
        }
        Ok(response.json::<Value>().await?)
    }
}
