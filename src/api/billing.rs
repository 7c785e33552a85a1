use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::billing::catalog::{self, PackagePlan};
use crate::billing::client::{BillingClient, CheckoutSessionRequest};
use crate::config::Config;
use crate::db::models::payment::{CheckoutRequest, CheckoutResponse};
use crate::db::queries::payment::{get_payment_history, reconcile_get, reconcile_post};
use crate::middleware::auth::AccountContext;
use crate::utils::api_response::ApiResponse;
use crate::utils::error::WorkflowError;

/// Routes reachable without a bearer token: the provider's completion
/// callback arrives with no caller identity of ours.
pub fn billing_public_routes() -> Router<PgPool> {
    Router::new()
        .route("/billing/reconcile", post(reconcile_post))
        .route("/billing/reconcile", get(reconcile_get))
}

pub fn billing_routes() -> Router<PgPool> {
    Router::new()
        .route("/billing/checkout-session", post(create_checkout_session))
        .route("/payments/{employer_email}", get(get_payment_history))
}

/// Resolve a package reference: a catalog name, or a row id from the
/// `packages` table.
async fn resolve_package(pool: &PgPool, package_ref: &str) -> Result<PackagePlan, WorkflowError> {
    if let Some(plan) = catalog::resolve(package_ref) {
        return Ok(*plan);
    }

    if let Ok(package_id) = Uuid::parse_str(package_ref.trim()) {
        let row = sqlx::query_as::<_, (String,)>("SELECT name FROM packages WHERE id = $1")
            .bind(package_id)
            .fetch_optional(pool)
            .await?;
        if let Some((name,)) = row {
            if let Some(plan) = catalog::resolve(&name) {
                return Ok(*plan);
            }
        }
    }

    Err(WorkflowError::NotFound("Package"))
}

#[utoipa::path(
    post,
    path = "/billing/checkout-session",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Hosted checkout session created", body = CheckoutResponse),
        (status = 403, description = "Caller is not an employer"),
        (status = 404, description = "Package not found"),
        (status = 502, description = "Billing provider unavailable")
    ),
    tag = "Billing",
    security(("bearerAuth" = []))
)]
pub async fn create_checkout_session(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
    Extension(billing): Extension<BillingClient>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<ApiResponse<CheckoutResponse>, ApiResponse<()>> {
    if !ctx.is_employer() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Only employers can purchase packages",
            None,
        ));
    }

    let plan = resolve_package(&pool, &payload.package_ref).await?;

    let redirect_base = Config::get().checkout_redirect_base.clone();
    let session = billing
        .create_checkout_session(&CheckoutSessionRequest {
            customer_email: &ctx.email,
            package_name: plan.name,
            amount_usd: plan.price_usd,
            success_url: format!("{redirect_base}/payment/success"),
            cancel_url: format!("{redirect_base}/payment/cancel"),
        })
        .await?;

    info!(hr_email = %ctx.email, package = plan.name, session = %session.id, "Checkout session created");

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Checkout session created",
        CheckoutResponse {
            session_id: session.id,
            redirect_url: session.url,
        },
    ))
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(create_checkout_session),
    components(schemas(CheckoutRequest, CheckoutResponse)),
    tags(
        (name = "Billing", description = "Billing reconciliation and payment history")
    )
)]
pub struct BillingDoc;
