use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::asset::*;

pub fn asset_routes() -> Router<PgPool> {
    Router::new()
        .route("/assets", post(create_asset))
        .route("/assets", get(get_assets))
        .route("/assets/available", get(get_available_assets))
        .route("/assets/{id}", patch(update_asset))
        .route("/assets/{id}", delete(delete_asset))
}
