// src/db/models/payment.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A reconciled external payment. Insert-only; `transaction_id` is unique and
/// serves as the idempotency key for the whole reconciliation protocol.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub hr_email: String,
    pub package_name: String,
    pub employee_limit: i32,
    pub amount_usd: i64,
    pub transaction_id: String,
    pub payment_date: DateTime<Utc>,
    pub status: String,
}

/// Parameters delivered by the billing collaborator's completion callback.
/// May arrive more than once for the same `transaction_id`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileParams {
    pub transaction_id: String,
    pub employer_email: String,
    pub package_name: String,
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutcome {
    pub transaction_id: String,
    pub package_name: String,
    pub employee_limit: i32,
    /// True when the payment row already existed and only the quota
    /// application was replayed.
    pub already_processed: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Package name or catalog id.
    pub package_ref: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub redirect_url: String,
}

#[cfg(test)]
mod tests {
    use super::ReconcileParams;

    #[test]
    fn callback_body_deserializes_from_camel_case() {
        let params: ReconcileParams = serde_json::from_str(
            r#"{
                "transactionId": "t1",
                "employerEmail": "e@x.com",
                "packageName": "Professional",
                "amount": 49
            }"#,
        )
        .unwrap();
        assert_eq!(params.transaction_id, "t1");
        assert_eq!(params.employer_email, "e@x.com");
        assert_eq!(params.package_name, "Professional");
        assert_eq!(params.amount, 49);
    }
}
