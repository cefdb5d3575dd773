//! Remote Roster Service: the spreadsheet-backed source of truth for the
//! roster and attendance.

mod client;
pub mod payload;

pub use client::*;
