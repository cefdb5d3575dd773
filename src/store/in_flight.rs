//! Per-child guard against overlapping mutations.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::errors::AppError;

/// Child ids with a check-in or check-out currently awaiting the remote write.
#[derive(Default)]
pub(super) struct InFlight {
    ids: Mutex<HashSet<String>>,
}

impl InFlight {
    /// Claim `child_id` until the returned guard drops. The guard is owned so
    /// it can travel with a spawned remote write.
    pub(super) fn begin(self: &Arc<Self>, child_id: &str) -> Result<InFlightGuard, AppError> {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        if !ids.insert(child_id.to_string()) {
            return Err(AppError::Conflict {
                message: format!("An update for child {} is already in progress", child_id),
                child_id: child_id.to_string(),
            });
        }
        Ok(InFlightGuard {
            owner: Arc::clone(self),
            child_id: child_id.to_string(),
        })
    }
}

pub(super) struct InFlightGuard {
    owner: Arc<InFlight>,
    child_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.owner
            .ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.child_id);
    }
}
