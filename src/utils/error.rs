use axum::http::StatusCode;
use serde_json::json;
use tracing::error;

use crate::utils::api_response::ApiResponse;

/// Result type for workflow and store operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Failure taxonomy shared by the inventory, request-workflow, affiliation
/// and billing-reconciliation operations. Each variant maps to a stable
/// `kind` string and HTTP status so callers can tell retryable failures
/// (`Upstream`) from terminal ones (`Conflict`, `NotFound`).
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Billing provider error: {0}")]
    Upstream(String),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl WorkflowError {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::InvalidInput(_) => "invalid_input",
            WorkflowError::NotFound(_) => "not_found",
            WorkflowError::Conflict(_) => "conflict",
            WorkflowError::Upstream(_) => "upstream",
            WorkflowError::Store(_) => "store",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::Conflict(_) => StatusCode::CONFLICT,
            WorkflowError::Upstream(_) => StatusCode::BAD_GATEWAY,
            WorkflowError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WorkflowError> for ApiResponse<()> {
    fn from(err: WorkflowError) -> Self {
        if let WorkflowError::Store(ref e) = err {
            error!("Store operation failed: {e}");
        }
        ApiResponse::error(
            err.status_code(),
            err.to_string(),
            Some(json!({ "kind": err.kind() })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::WorkflowError;
    use crate::utils::api_response::ApiResponse;
    use axum::http::StatusCode;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            WorkflowError::InvalidInput("missing assetId".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WorkflowError::NotFound("asset").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WorkflowError::Conflict("request is not pending".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            WorkflowError::Upstream("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn envelope_carries_the_stable_kind() {
        let resp: ApiResponse<()> = WorkflowError::Conflict("out of stock".into()).into();
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["status_code"], 409);
        assert_eq!(value["errors"]["kind"], "conflict");
        assert_eq!(value["message"], "out of stock");
    }

    #[test]
    fn not_found_message_names_the_entity() {
        let err = WorkflowError::NotFound("asset");
        assert_eq!(err.to_string(), "asset not found");
        assert_eq!(err.kind(), "not_found");
    }
}
