use axum::{routing::get, Router};
use sqlx::PgPool;

use crate::db::queries::package::*;

pub fn package_routes() -> Router<PgPool> {
    Router::new().route("/packages", get(get_packages))
}
