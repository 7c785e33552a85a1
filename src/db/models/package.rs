// src/db/models/package.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A subscription tier from the package catalog.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: Uuid,
    pub name: String,
    pub price_usd: i64,
    pub employee_limit: i32,
}
