use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::asset::AssetType;
use crate::db::models::assigned_asset::{AssignedAsset, AssignmentStatus};
use crate::db::queries::asset;
use crate::middleware::auth::AccountContext;
use crate::utils::api_response::ApiResponse;
use crate::utils::error::{WorkflowError, WorkflowResult};

const ASSIGNMENT_COLUMNS: &str = "id, asset_id, asset_name, asset_type, employee_email, \
     employee_name, hr_email, company_name, assignment_date, return_date, status";

/// Return an assigned asset: flip `assigned -> returned` and put the unit
/// back into the inventory, as one transaction. The compare-and-set on the
/// status guarantees a double return can never double-increment.
pub async fn return_asset(pool: &PgPool, assignment_id: Uuid) -> WorkflowResult<AssignedAsset> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, AssignedAsset>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assigned_assets WHERE id = $1"
    ))
    .bind(assignment_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(WorkflowError::NotFound("Assignment"))?;

    if existing.asset_type == AssetType::NonReturnable {
        return Err(WorkflowError::Conflict(
            "Non-returnable assets cannot be returned".to_string(),
        ));
    }

    let returned = sqlx::query_as::<_, AssignedAsset>(&format!(
        "UPDATE assigned_assets
         SET status = 'returned', return_date = now()
         WHERE id = $1 AND status = 'assigned'
         RETURNING {ASSIGNMENT_COLUMNS}"
    ))
    .bind(assignment_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| WorkflowError::Conflict("Asset has already been returned".to_string()))?;

    asset::increment_availability(&mut tx, returned.asset_id).await?;

    tx.commit().await?;

    info!(assignment_id = %returned.id, asset_id = %returned.asset_id, "Asset returned");

    Ok(returned)
}

// ---------- Handlers ----------

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentFilter {
    pub hr_email: String,
}

#[utoipa::path(
    get,
    path = "/assigned-assets",
    params(("hrEmail" = String, Query, description = "Employer email")),
    responses(
        (status = 200, description = "Assignments handed out by the employer", body = Vec<AssignedAsset>),
        (status = 403, description = "Caller is not this employer")
    ),
    tag = "AssignedAssets",
    security(("bearerAuth" = []))
)]
pub async fn get_assignments_for_employer(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
    Query(filter): Query<AssignmentFilter>,
) -> Result<ApiResponse<Vec<AssignedAsset>>, ApiResponse<()>> {
    if !ctx.is_employer() || ctx.email != filter.hr_email {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "You can only list assignments you handed out",
            None,
        ));
    }

    let assignments = sqlx::query_as::<_, AssignedAsset>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assigned_assets
         WHERE hr_email = $1
         ORDER BY assignment_date DESC"
    ))
    .bind(&filter.hr_email)
    .fetch_all(&pool)
    .await
    .map_err(WorkflowError::from)?;

    Ok(ApiResponse::success(StatusCode::OK, "Assignments", assignments))
}

#[utoipa::path(
    get,
    path = "/assigned-assets/mine",
    responses(
        (status = 200, description = "Assets currently or previously assigned to the caller", body = Vec<AssignedAsset>)
    ),
    tag = "AssignedAssets",
    security(("bearerAuth" = []))
)]
pub async fn get_my_assignments(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
) -> Result<ApiResponse<Vec<AssignedAsset>>, ApiResponse<()>> {
    let assignments = sqlx::query_as::<_, AssignedAsset>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assigned_assets
         WHERE employee_email = $1
         ORDER BY assignment_date DESC"
    ))
    .bind(&ctx.email)
    .fetch_all(&pool)
    .await
    .map_err(WorkflowError::from)?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Your assignments",
        assignments,
    ))
}

#[utoipa::path(
    patch,
    path = "/assigned-assets/{id}/return",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Asset returned to the inventory", body = AssignedAsset),
        (status = 403, description = "Caller is not a party to this assignment"),
        (status = 404, description = "Assignment not found"),
        (status = 409, description = "Already returned or non-returnable")
    ),
    tag = "AssignedAssets",
    security(("bearerAuth" = []))
)]
pub async fn return_asset_handler(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
    Path(assignment_id): Path<Uuid>,
) -> Result<ApiResponse<AssignedAsset>, ApiResponse<()>> {
    let assignment = sqlx::query_as::<_, AssignedAsset>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assigned_assets WHERE id = $1"
    ))
    .bind(assignment_id)
    .fetch_optional(&pool)
    .await
    .map_err(WorkflowError::from)?
    .ok_or(WorkflowError::NotFound("Assignment"))?;

    if assignment.employee_email != ctx.email && assignment.hr_email != ctx.email {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "You are not a party to this assignment",
            None,
        ));
    }

    let returned = return_asset(&pool, assignment_id).await?;

    Ok(ApiResponse::success(StatusCode::OK, "Asset returned", returned))
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(
        get_assignments_for_employer,
        get_my_assignments,
        return_asset_handler
    ),
    components(schemas(AssignedAsset, AssignmentStatus)),
    tags(
        (name = "AssignedAssets", description = "Assigned asset endpoints")
    )
)]
pub struct AssignedAssetDoc;
