// src/db/models/assigned_asset.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::asset::AssetType;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "assignment_status", rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    Returned,
}

/// Created only as a side effect of request approval; flipped to `Returned`
/// exactly once.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignedAsset {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub asset_name: String,
    pub asset_type: AssetType,
    pub employee_email: String,
    pub employee_name: String,
    pub hr_email: String,
    pub company_name: String,
    pub assignment_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: AssignmentStatus,
}
