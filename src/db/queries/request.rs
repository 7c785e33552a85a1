use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::request::{AssetRequest, NewAssetRequest, RequestStatus};
use crate::db::queries::{affiliation, asset};
use crate::middleware::auth::AccountContext;
use crate::utils::api_response::ApiResponse;
use crate::utils::error::{WorkflowError, WorkflowResult};

const REQUEST_COLUMNS: &str = "id, asset_id, asset_name, asset_type, requester_email, \
     requester_name, hr_email, company_name, request_date, request_status, approval_date, \
     processed_by, note";

pub async fn get_request_by_id(pool: &PgPool, request_id: Uuid) -> WorkflowResult<AssetRequest> {
    sqlx::query_as::<_, AssetRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM asset_requests WHERE id = $1"
    ))
    .bind(request_id)
    .fetch_optional(pool)
    .await?
    .ok_or(WorkflowError::NotFound("Request"))
}

// ---------- Handlers ----------

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestFilter {
    pub hr_email: String,
}

#[utoipa::path(
    post,
    path = "/requests",
    request_body = NewAssetRequest,
    responses(
        (status = 201, description = "Request submitted", body = AssetRequest),
        (status = 400, description = "Missing or malformed fields"),
        (status = 403, description = "Caller is not an employee"),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "Duplicate request already pending")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn submit_request(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
    Json(payload): Json<NewAssetRequest>,
) -> Result<ApiResponse<AssetRequest>, ApiResponse<()>> {
    if !ctx.is_employee() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Only employees can request assets",
            None,
        ));
    }
    if ctx.email.trim().is_empty() || ctx.name.trim().is_empty() {
        return Err(
            WorkflowError::InvalidInput("Requester identity must not be empty".to_string()).into(),
        );
    }

    let asset = asset::get_asset_by_id(&pool, payload.asset_id).await?;

    // One pending request per (requester, asset) at a time.
    let duplicate_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
             SELECT 1 FROM asset_requests
             WHERE requester_email = $1 AND asset_id = $2 AND request_status = 'pending'
         )",
    )
    .bind(&ctx.email)
    .bind(payload.asset_id)
    .fetch_one(&pool)
    .await
    .map_err(WorkflowError::from)?;

    if duplicate_exists {
        return Err(WorkflowError::Conflict(
            "Duplicate request already pending".to_string(),
        )
        .into());
    }

    let request = sqlx::query_as::<_, AssetRequest>(&format!(
        "INSERT INTO asset_requests
             (id, asset_id, asset_name, asset_type, requester_email, requester_name,
              hr_email, company_name, request_date, request_status, note)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now(), 'pending', $9)
         RETURNING {REQUEST_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(asset.id)
    .bind(&asset.product_name)
    .bind(asset.product_type)
    .bind(&ctx.email)
    .bind(&ctx.name)
    .bind(&asset.hr_email)
    .bind(&asset.company_name)
    .bind(payload.note.as_deref())
    .fetch_one(&pool)
    .await
    .map_err(WorkflowError::from)?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Request submitted",
        request,
    ))
}

#[utoipa::path(
    get,
    path = "/requests",
    params(("hrEmail" = String, Query, description = "Employer email")),
    responses(
        (status = 200, description = "Requests for the employer, newest first", body = Vec<AssetRequest>),
        (status = 403, description = "Caller is not this employer")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_requests_for_employer(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
    Query(filter): Query<RequestFilter>,
) -> Result<ApiResponse<Vec<AssetRequest>>, ApiResponse<()>> {
    if !ctx.is_employer() || ctx.email != filter.hr_email {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "You can only list requests addressed to you",
            None,
        ));
    }

    let requests = sqlx::query_as::<_, AssetRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM asset_requests
         WHERE hr_email = $1
         ORDER BY request_date DESC"
    ))
    .bind(&filter.hr_email)
    .fetch_all(&pool)
    .await
    .map_err(WorkflowError::from)?;

    Ok(ApiResponse::success(StatusCode::OK, "Requests", requests))
}

#[utoipa::path(
    get,
    path = "/requests/mine",
    responses(
        (status = 200, description = "Requests submitted by the caller, newest first", body = Vec<AssetRequest>)
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_my_requests(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
) -> Result<ApiResponse<Vec<AssetRequest>>, ApiResponse<()>> {
    let requests = sqlx::query_as::<_, AssetRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM asset_requests
         WHERE requester_email = $1
         ORDER BY request_date DESC"
    ))
    .bind(&ctx.email)
    .fetch_all(&pool)
    .await
    .map_err(WorkflowError::from)?;

    Ok(ApiResponse::success(StatusCode::OK, "Your requests", requests))
}

#[utoipa::path(
    get,
    path = "/requests/{id}",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request retrieved", body = AssetRequest),
        (status = 403, description = "Caller is neither the requester nor the employer"),
        (status = 404, description = "Request not found")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_request_handler(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
    Path(request_id): Path<Uuid>,
) -> Result<ApiResponse<AssetRequest>, ApiResponse<()>> {
    let request = get_request_by_id(&pool, request_id).await?;
    if request.requester_email != ctx.email && request.hr_email != ctx.email {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "You are not a party to this request",
            None,
        ));
    }
    Ok(ApiResponse::success(StatusCode::OK, "Request", request))
}

#[utoipa::path(
    patch,
    path = "/requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request approved; asset assigned", body = AssetRequest),
        (status = 403, description = "Caller is not the employer for this request"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request not pending, asset out of stock, or employee quota reached")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn approve_request(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
    Path(request_id): Path<Uuid>,
) -> Result<ApiResponse<AssetRequest>, ApiResponse<()>> {
    let request = get_request_by_id(&pool, request_id).await?;
    if !ctx.is_employer() || request.hr_email != ctx.email {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Only the owning employer can approve this request",
            None,
        ));
    }

    let approved = approve(&pool, request_id, &ctx.email).await?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Request approved",
        approved,
    ))
}

/// Approve a pending request as one transaction: compare-and-set the status,
/// take a unit out of the inventory, create the assignment, and activate the
/// employer/employee affiliation. Any failing step rolls the whole thing
/// back, so the inventory decrement can never leak out of a failed approval.
pub async fn approve(
    pool: &PgPool,
    request_id: Uuid,
    approver_email: &str,
) -> WorkflowResult<AssetRequest> {
    let mut tx = pool.begin().await?;

    let approved = sqlx::query_as::<_, AssetRequest>(&format!(
        "UPDATE asset_requests
         SET request_status = 'approved', approval_date = $2, processed_by = $3
         WHERE id = $1 AND request_status = 'pending'
         RETURNING {REQUEST_COLUMNS}"
    ))
    .bind(request_id)
    .bind(Utc::now())
    .bind(approver_email)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(approved) = approved else {
        // The request exists (caller just read it) but is no longer pending.
        let status = sqlx::query_scalar::<_, RequestStatus>(
            "SELECT request_status FROM asset_requests WHERE id = $1",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?;
        return match status {
            Some(_) => Err(WorkflowError::Conflict(
                "Request is not pending".to_string(),
            )),
            None => Err(WorkflowError::NotFound("Request")),
        };
    };

    asset::decrement_availability(&mut tx, approved.asset_id).await?;

    sqlx::query(
        "INSERT INTO assigned_assets
             (id, asset_id, asset_name, asset_type, employee_email, employee_name,
              hr_email, company_name, assignment_date, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now(), 'assigned')",
    )
    .bind(Uuid::new_v4())
    .bind(approved.asset_id)
    .bind(&approved.asset_name)
    .bind(approved.asset_type)
    .bind(&approved.requester_email)
    .bind(&approved.requester_name)
    .bind(&approved.hr_email)
    .bind(&approved.company_name)
    .execute(&mut *tx)
    .await?;

    let activated = affiliation::ensure_active(
        &mut tx,
        &approved.requester_email,
        &approved.requester_name,
        &approved.hr_email,
        &approved.company_name,
    )
    .await?;

    tx.commit().await?;

    info!(
        request_id = %approved.id,
        asset_id = %approved.asset_id,
        affiliation_activated = activated,
        "Request approved"
    );

    Ok(approved)
}

#[utoipa::path(
    patch,
    path = "/requests/{id}/reject",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request rejected", body = AssetRequest),
        (status = 403, description = "Caller is not the employer for this request"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not pending")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn reject_request(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
    Path(request_id): Path<Uuid>,
) -> Result<ApiResponse<AssetRequest>, ApiResponse<()>> {
    let request = get_request_by_id(&pool, request_id).await?;
    if !ctx.is_employer() || request.hr_email != ctx.email {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Only the owning employer can reject this request",
            None,
        ));
    }

    // Compare-and-set so a request already approved elsewhere is never
    // silently overwritten.
    let rejected = sqlx::query_as::<_, AssetRequest>(&format!(
        "UPDATE asset_requests
         SET request_status = 'rejected', processed_by = $2
         WHERE id = $1 AND request_status = 'pending'
         RETURNING {REQUEST_COLUMNS}"
    ))
    .bind(request_id)
    .bind(&ctx.email)
    .fetch_optional(&pool)
    .await
    .map_err(WorkflowError::from)?;

    match rejected {
        Some(request) => Ok(ApiResponse::success(
            StatusCode::OK,
            "Request rejected",
            request,
        )),
        None => Err(WorkflowError::Conflict("Request is not pending".to_string()).into()),
    }
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(
        submit_request,
        get_requests_for_employer,
        get_my_requests,
        get_request_handler,
        approve_request,
        reject_request
    ),
    components(schemas(AssetRequest, NewAssetRequest, RequestStatus)),
    tags(
        (name = "Requests", description = "Asset request workflow endpoints")
    )
)]
pub struct RequestDoc;
