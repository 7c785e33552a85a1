use axum::{
    routing::{delete, get},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::affiliation::*;

pub fn affiliation_routes() -> Router<PgPool> {
    Router::new()
        .route("/affiliations", get(get_affiliations))
        .route("/affiliations/{id}", delete(remove_affiliation))
}
