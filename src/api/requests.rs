use axum::{
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::request::*;

pub fn request_routes() -> Router<PgPool> {
    Router::new()
        .route("/requests", post(submit_request))
        .route("/requests", get(get_requests_for_employer))
        .route("/requests/mine", get(get_my_requests))
        .route("/requests/{request_id}", get(get_request_handler))
        .route("/requests/{request_id}/approve", patch(approve_request))
        .route("/requests/{request_id}/reject", patch(reject_request))
}
