//! Deciding the target certificate and what it supersedes

use crate::error::{RefreshError, RefreshResult};
use crate::selector::select_latest_valid;
use certrefresh_cdn::Certificate;
use serde::Serialize;

/// Outcome of planning a refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshPlan {
    /// Certificate every domain should end up on
    pub target_id: String,
    /// Candidates whose domains move to the target, in candidate order
    pub supersede: Vec<String>,
}

/// Plan a refresh over the certificates of one tracing key
///
/// A non-empty `explicit_target` is used as is; otherwise the latest-expiring
/// certificate valid at `epoch` is chosen. The target must be one of the
/// candidates.
pub fn plan(
    key: &str,
    candidates: &[Certificate],
    explicit_target: Option<&str>,
    epoch: i64,
) -> RefreshResult<RefreshPlan> {
    let target_id = match explicit_target.filter(|t| !t.is_empty()) {
        Some(target) => target.to_string(),
        None => select_latest_valid(candidates, epoch)
            .map(|c| c.id.clone())
            .ok_or_else(|| RefreshError::NoEligibleCertificate {
                key: key.to_string(),
            })?,
    };

    if !candidates.iter().any(|c| c.id == target_id) {
        return Err(RefreshError::TargetNotInScope {
            target_id,
            key: key.to_string(),
        });
    }

    let supersede = candidates
        .iter()
        .filter(|c| c.id != target_id)
        .map(|c| c.id.clone())
        .collect();

    Ok(RefreshPlan {
        target_id,
        supersede,
    })
}
