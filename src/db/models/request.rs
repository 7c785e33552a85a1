// src/db/models/request.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::asset::AssetType;

/// Lifecycle of an asset request. `Pending` is the only non-terminal state;
/// `Approved` and `Rejected` admit no further transitions.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Approved)
                | (RequestStatus::Pending, RequestStatus::Rejected)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetRequest {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub asset_name: String,
    pub asset_type: AssetType,
    pub requester_email: String,
    pub requester_name: String,
    pub hr_email: String,
    pub company_name: String,
    pub request_date: DateTime<Utc>,
    pub request_status: RequestStatus,
    pub approval_date: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
    pub note: Option<String>,
}

/// Submission payload. The requester's identity comes from the bearer token,
/// and the owning employer is taken from the asset record itself.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAssetRequest {
    pub asset_id: Uuid,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::RequestStatus;

    #[test]
    fn pending_is_the_only_non_terminal_state() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn approved_and_rejected_admit_no_transitions() {
        for next in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
        ] {
            assert!(!RequestStatus::Approved.can_transition_to(next));
            assert!(!RequestStatus::Rejected.can_transition_to(next));
        }
    }

    #[test]
    fn pending_transitions_only_to_terminal_states() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Approved));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Rejected));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
    }
}
