use axum::{
    routing::{get, patch},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::assigned_asset::*;

pub fn assigned_asset_routes() -> Router<PgPool> {
    Router::new()
        .route("/assigned-assets", get(get_assignments_for_employer))
        .route("/assigned-assets/mine", get(get_my_assignments))
        .route("/assigned-assets/{id}/return", patch(return_asset_handler))
}
