// src/db/models/asset.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Whether an asset comes back to the inventory after use.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "asset_type", rename_all = "snake_case")]
pub enum AssetType {
    Returnable,
    NonReturnable,
}

/// A piece of company equipment owned by an employer.
///
/// Invariant: `0 <= available_quantity <= product_quantity`, enforced by a
/// CHECK constraint and by the conditional inventory updates.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: Uuid,
    pub product_name: String,
    pub product_type: AssetType,
    pub product_quantity: i32,
    pub available_quantity: i32,
    pub hr_email: String,
    pub company_name: String,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub product_name: String,
    pub product_type: AssetType,
    pub product_quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAsset {
    pub product_name: Option<String>,
    /// New total owned. Availability moves by the same delta so outstanding
    /// assignments are never counted as loanable.
    pub product_quantity: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_type_serializes_as_pascal_case() {
        assert_eq!(
            serde_json::to_string(&AssetType::Returnable).unwrap(),
            "\"Returnable\""
        );
        assert_eq!(
            serde_json::to_string(&AssetType::NonReturnable).unwrap(),
            "\"NonReturnable\""
        );
    }

    #[test]
    fn asset_json_uses_camel_case_fields() {
        let asset = Asset {
            id: Uuid::new_v4(),
            product_name: "Laptop".into(),
            product_type: AssetType::Returnable,
            product_quantity: 5,
            available_quantity: 5,
            hr_email: "hr@example.com".into(),
            company_name: "ABC Corp".into(),
            date_added: Utc::now(),
        };
        let value = serde_json::to_value(&asset).unwrap();
        assert!(value.get("productName").is_some());
        assert!(value.get("availableQuantity").is_some());
        assert!(value.get("product_name").is_none());
    }
}
