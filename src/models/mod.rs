//! Data models for the daycare check-in desk.
//!
//! Field names serialize in camelCase to match the frontend interfaces.

mod attendance;
mod child;
mod history;

pub use attendance::*;
pub use child::*;
pub use history::*;
