use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::billing::catalog;
use crate::db::models::payment::{Payment, ReconcileOutcome, ReconcileParams};
use crate::middleware::auth::{AccountCache, AccountContext};
use crate::utils::api_response::ApiResponse;
use crate::utils::error::{WorkflowError, WorkflowResult};

/// Apply a completed external payment exactly once.
///
/// The unique index on `payments.transaction_id` is the real idempotency
/// guarantee: under concurrent duplicate delivery both callbacks reach the
/// INSERT, one wins, and `ON CONFLICT DO NOTHING` turns the loser into
/// "already processed" instead of an error. The quota application is
/// re-applied on every delivery, so a crash between the payment insert and
/// the quota write is repaired by any retry with the same transaction id.
pub async fn reconcile_payment(
    pool: &PgPool,
    params: &ReconcileParams,
) -> WorkflowResult<ReconcileOutcome> {
    if params.transaction_id.trim().is_empty() {
        return Err(WorkflowError::InvalidInput(
            "transactionId must not be empty".to_string(),
        ));
    }
    if params.employer_email.trim().is_empty() {
        return Err(WorkflowError::InvalidInput(
            "employerEmail must not be empty".to_string(),
        ));
    }

    let plan = catalog::resolve(&params.package_name).ok_or_else(|| {
        WorkflowError::InvalidInput(format!("Unrecognized package: {}", params.package_name))
    })?;

    if params.amount != plan.price_usd {
        warn!(
            transaction_id = %params.transaction_id,
            expected = plan.price_usd,
            received = params.amount,
            "Reconciled amount differs from catalog price"
        );
    }

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        "INSERT INTO payments
             (id, hr_email, package_name, employee_limit, amount_usd, transaction_id,
              payment_date, status)
         VALUES ($1, $2, $3, $4, $5, $6, now(), 'completed')
         ON CONFLICT (transaction_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(&params.employer_email)
    .bind(plan.name)
    .bind(plan.employee_limit)
    .bind(params.amount)
    .bind(params.transaction_id.trim())
    .execute(&mut *tx)
    .await?
    .rows_affected()
        == 1;

    let employer_updated = sqlx::query(
        "UPDATE users SET package = $2, package_limit = $3
         WHERE email = $1 AND role = 'hr'",
    )
    .bind(&params.employer_email)
    .bind(plan.name)
    .bind(plan.employee_limit)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if employer_updated == 0 {
        return Err(WorkflowError::NotFound("Employer"));
    }

    tx.commit().await?;

    if inserted {
        info!(
            transaction_id = %params.transaction_id,
            hr_email = %params.employer_email,
            package = plan.name,
            "Payment reconciled"
        );
    } else {
        info!(
            transaction_id = %params.transaction_id,
            "Duplicate reconciliation, quota re-applied"
        );
    }

    Ok(ReconcileOutcome {
        transaction_id: params.transaction_id.trim().to_string(),
        package_name: plan.name.to_string(),
        employee_limit: plan.employee_limit,
        already_processed: !inserted,
    })
}

// ---------- Handlers ----------

async fn reconcile_and_respond(
    pool: &PgPool,
    account_cache: &AccountCache,
    params: ReconcileParams,
) -> Result<ApiResponse<ReconcileOutcome>, ApiResponse<()>> {
    let outcome = reconcile_payment(pool, &params).await?;
    // The employer's cached account context now carries a stale quota.
    account_cache.invalidate(&params.employer_email);
    Ok(ApiResponse::success(
        StatusCode::OK,
        if outcome.already_processed {
            "Payment already processed"
        } else {
            "Payment reconciled"
        },
        outcome,
    ))
}

#[utoipa::path(
    post,
    path = "/billing/reconcile",
    request_body = ReconcileParams,
    responses(
        (status = 200, description = "Payment applied (idempotent)", body = ReconcileOutcome),
        (status = 400, description = "Unknown package or malformed callback"),
        (status = 404, description = "Employer not found")
    ),
    tag = "Billing"
)]
pub async fn reconcile_post(
    State(pool): State<PgPool>,
    Extension(account_cache): Extension<AccountCache>,
    Json(params): Json<ReconcileParams>,
) -> Result<ApiResponse<ReconcileOutcome>, ApiResponse<()>> {
    reconcile_and_respond(&pool, &account_cache, params).await
}

#[utoipa::path(
    get,
    path = "/billing/reconcile",
    params(
        ("transactionId" = String, Query, description = "External billing reference"),
        ("employerEmail" = String, Query, description = "Employer account email"),
        ("packageName" = String, Query, description = "Purchased package"),
        ("amount" = i64, Query, description = "Amount paid in USD")
    ),
    responses(
        (status = 200, description = "Payment applied (idempotent)", body = ReconcileOutcome),
        (status = 400, description = "Unknown package or malformed callback"),
        (status = 404, description = "Employer not found")
    ),
    tag = "Billing"
)]
pub async fn reconcile_get(
    State(pool): State<PgPool>,
    Extension(account_cache): Extension<AccountCache>,
    Query(params): Query<ReconcileParams>,
) -> Result<ApiResponse<ReconcileOutcome>, ApiResponse<()>> {
    reconcile_and_respond(&pool, &account_cache, params).await
}

#[utoipa::path(
    get,
    path = "/payments/{employerEmail}",
    params(("employerEmail" = String, Path, description = "Employer account email")),
    responses(
        (status = 200, description = "Payment history, newest first", body = Vec<Payment>),
        (status = 403, description = "Caller is not this employer")
    ),
    tag = "Billing",
    security(("bearerAuth" = []))
)]
pub async fn get_payment_history(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
    Path(employer_email): Path<String>,
) -> Result<ApiResponse<Vec<Payment>>, ApiResponse<()>> {
    if !ctx.is_employer() || ctx.email != employer_email {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "You can only view your own payment history",
            None,
        ));
    }

    let payments = sqlx::query_as::<_, Payment>(
        "SELECT id, hr_email, package_name, employee_limit, amount_usd, transaction_id,
                payment_date, status
         FROM payments
         WHERE hr_email = $1
         ORDER BY payment_date DESC",
    )
    .bind(&employer_email)
    .fetch_all(&pool)
    .await
    .map_err(WorkflowError::from)?;

    Ok(ApiResponse::success(StatusCode::OK, "Payments", payments))
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(reconcile_post, reconcile_get, get_payment_history),
    components(schemas(Payment, ReconcileParams, ReconcileOutcome)),
    tags(
        (name = "Billing", description = "Billing reconciliation and payment history")
    )
)]
pub struct PaymentDoc;
