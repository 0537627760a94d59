//! Join-request workflow models.

use serde::{Deserialize, Serialize};

use crate::errors::require_field;
use crate::Result;

/// State of one (quest, requester) pair.
///
/// There is no `Requested -> None` withdrawal transition. `Rejected` is only
/// ever reported as the outcome of a reject call: afterwards the stored
/// document is indistinguishable from `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinRequestState {
    None,
    Requested,
    Approved,
    Rejected,
}

/// Application written by the requester themself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJoinRequest {
    pub quest_id: String,
    pub requester_uid: String,
    pub requester_name: String,
    pub message: Option<String>,
}

impl NewJoinRequest {
    pub fn validate(&self) -> Result<()> {
        require_field("questId", &self.quest_id)?;
        require_field("requesterUid", &self.requester_uid)?;
        require_field("requesterName", &self.requester_name)?;
        Ok(())
    }
}

/// Result of a workflow transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinTransition {
    pub quest_id: String,
    pub requester_uid: String,
    pub state: JoinRequestState,
    /// Approval picked up a previously interrupted run.
    pub resumed: bool,
}
