//! Conversion between job records and their Redis hash representation.

use super::error::QueueError;
use crate::domain::jobs::{JobRecord, JobState};
use std::collections::HashMap;

/// Hash field names, matching what clients read back by id.
pub(super) const F_NAME: &str = "name";
pub(super) const F_DATA: &str = "data";
pub(super) const F_STATE: &str = "state";
pub(super) const F_PROGRESS: &str = "progress";
pub(super) const F_RETURN: &str = "returnvalue";
pub(super) const F_FAILED: &str = "failedReason";
pub(super) const F_LEASE: &str = "lease_until";

pub(super) fn fields_from_record(record: &JobRecord) -> Result<Vec<(&'static str, String)>, QueueError> {
    Ok(vec![
        (F_NAME, record.name.clone()),
        (F_DATA, serde_json::to_string(&record.data)?),
        (F_STATE, record.state.as_str().to_string()),
        (F_PROGRESS, record.progress.to_string()),
    ])
}

pub(super) fn record_from_map(
    id: &str,
    map: &HashMap<String, String>,
) -> Result<JobRecord, QueueError> {
    let name = map
        .get(F_NAME)
        .ok_or_else(|| QueueError::Corrupt(format!("job {} has no name field", id)))?
        .clone();
    let data = map
        .get(F_DATA)
        .ok_or_else(|| QueueError::Corrupt(format!("job {} has no data field", id)))?;
    let data = serde_json::from_str(data)?;
    let state = map
        .get(F_STATE)
        .and_then(|s| JobState::parse(s))
        .ok_or_else(|| QueueError::Corrupt(format!("job {} has an unknown state", id)))?;
    let progress = map
        .get(F_PROGRESS)
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);
    let result = match map.get(F_RETURN) {
        Some(json) => Some(serde_json::from_str(json)?),
        None => None,
    };
    let failed_reason = map.get(F_FAILED).cloned();

    Ok(JobRecord {
        id: id.to_string(),
        name,
        data,
        state,
        progress,
        result,
        failed_reason,
    })
}
