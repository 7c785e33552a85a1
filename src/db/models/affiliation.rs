// src/db/models/affiliation.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "affiliation_status", rename_all = "snake_case")]
pub enum AffiliationStatus {
    Active,
    Inactive,
}

/// The employment link between an employee and an employer, derived from the
/// first approved request. At most one row per (employee_email, hr_email),
/// enforced by a unique constraint; removal deactivates instead of deleting.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeAffiliation {
    pub id: Uuid,
    pub employee_email: String,
    pub employee_name: String,
    pub hr_email: String,
    pub company_name: String,
    pub affiliation_date: DateTime<Utc>,
    pub status: AffiliationStatus,
}
