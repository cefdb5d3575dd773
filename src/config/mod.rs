//! Configuration module for the check-in desk.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::errors::AppError;

/// How check-in/check-out writes are sent to the Remote Roster Service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod {
    /// `GET ?action=checkIn&childName=...`
    Get,
    /// `POST {"action": "checkIn", "data": {...}}`
    Post,
}

impl WriteMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Some(WriteMethod::Get),
            "post" => Some(WriteMethod::Post),
            _ => None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Some(LogFormat::Text),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Remote Roster Service endpoint
    pub roster_url: String,
    /// Transport used for check-in/check-out writes
    pub roster_write_method: WriteMethod,
    /// Upper bound on a single Remote Roster Service request
    pub roster_timeout: Duration,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_psk = lookup("DAYCARE_API_PSK").filter(|s| !s.is_empty());

        let roster_url = lookup("DAYCARE_ROSTER_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Config("DAYCARE_ROSTER_URL must be set".to_string()))?;

        let roster_write_method = match lookup("DAYCARE_ROSTER_WRITE_METHOD") {
            Some(raw) => WriteMethod::parse(&raw).ok_or_else(|| {
                AppError::Config(format!(
                    "Invalid DAYCARE_ROSTER_WRITE_METHOD '{}' (expected get or post)",
                    raw
                ))
            })?,
            None => WriteMethod::Get,
        };

        let roster_timeout = match lookup("DAYCARE_ROSTER_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    AppError::Config(format!("Invalid DAYCARE_ROSTER_TIMEOUT_SECS '{}'", raw))
                })?,
            None => Duration::from_secs(30),
        };

        let bind_raw =
            lookup("DAYCARE_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let bind_addr = bind_raw.parse().map_err(|_| {
            AppError::Config(format!("Invalid DAYCARE_BIND_ADDR format '{}'", bind_raw))
        })?;

        let log_level = lookup("DAYCARE_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match lookup("DAYCARE_LOG_FORMAT") {
            Some(raw) => LogFormat::parse(&raw).ok_or_else(|| {
                AppError::Config(format!(
                    "Invalid DAYCARE_LOG_FORMAT '{}' (expected text or json)",
                    raw
                ))
            })?,
            None => LogFormat::Text,
        };

        Ok(Self {
            api_psk,
            roster_url,
            roster_write_method,
            roster_timeout,
            bind_addr,
            log_level,
            log_format,
        })
    }
}
