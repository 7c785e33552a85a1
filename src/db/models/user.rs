// src/db/models/user.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub const ROLE_EMPLOYER: &str = "hr";
pub const ROLE_EMPLOYEE: &str = "employee";

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub company_name: Option<String>,
    pub package: Option<String>,
    pub package_limit: Option<i32>,
    pub status: String,
}
