use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::asset::{Asset, NewAsset, UpdateAsset};
use crate::middleware::auth::AccountContext;
use crate::utils::api_response::ApiResponse;
use crate::utils::error::{WorkflowError, WorkflowResult};

// ---------- Inventory operations ----------
//
// Both operations are single conditional UPDATEs so that concurrent
// approvals/returns racing on the same asset can never produce a lost
// update; the precondition lives in the WHERE clause, not in a prior read.

/// Take one unit out of the loanable stock.
pub async fn decrement_availability(
    conn: &mut PgConnection,
    asset_id: Uuid,
) -> WorkflowResult<()> {
    let updated = sqlx::query(
        "UPDATE assets SET available_quantity = available_quantity - 1
         WHERE id = $1 AND available_quantity > 0",
    )
    .bind(asset_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if updated == 1 {
        return Ok(());
    }

    if asset_exists(conn, asset_id).await? {
        Err(WorkflowError::Conflict("Asset is out of stock".to_string()))
    } else {
        Err(WorkflowError::NotFound("Asset"))
    }
}

/// Put one unit back. Clamped: once `available_quantity` reaches
/// `product_quantity` the update is a logged no-op, never an error.
pub async fn increment_availability(
    conn: &mut PgConnection,
    asset_id: Uuid,
) -> WorkflowResult<()> {
    let updated = sqlx::query(
        "UPDATE assets SET available_quantity = available_quantity + 1
         WHERE id = $1 AND available_quantity < product_quantity",
    )
    .bind(asset_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if updated == 1 {
        return Ok(());
    }

    if asset_exists(conn, asset_id).await? {
        warn!(%asset_id, "Availability already at capacity, return clamped");
        Ok(())
    } else {
        Err(WorkflowError::NotFound("Asset"))
    }
}

pub async fn asset_exists(conn: &mut PgConnection, asset_id: Uuid) -> WorkflowResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM assets WHERE id = $1)")
        .bind(asset_id)
        .fetch_one(conn)
        .await?;
    Ok(exists)
}

pub async fn get_asset_by_id(pool: &PgPool, asset_id: Uuid) -> WorkflowResult<Asset> {
    sqlx::query_as::<_, Asset>(
        "SELECT id, product_name, product_type, product_quantity, available_quantity,
                hr_email, company_name, date_added
         FROM assets WHERE id = $1",
    )
    .bind(asset_id)
    .fetch_optional(pool)
    .await?
    .ok_or(WorkflowError::NotFound("Asset"))
}

// ---------- Handlers ----------

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetFilter {
    pub hr_email: String,
}

#[utoipa::path(
    post,
    path = "/assets",
    request_body = NewAsset,
    responses(
        (status = 201, description = "Asset created successfully", body = Asset),
        (status = 400, description = "Missing or malformed fields"),
        (status = 403, description = "Caller is not an employer")
    ),
    tag = "Assets",
    security(("bearerAuth" = []))
)]
pub async fn create_asset(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
    Json(payload): Json<NewAsset>,
) -> Result<ApiResponse<Asset>, ApiResponse<()>> {
    if !ctx.is_employer() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Only employers can add assets",
            None,
        ));
    }
    if payload.product_name.trim().is_empty() {
        return Err(WorkflowError::InvalidInput("productName must not be empty".to_string()).into());
    }
    if payload.product_quantity <= 0 {
        return Err(
            WorkflowError::InvalidInput("productQuantity must be positive".to_string()).into(),
        );
    }

    let asset = sqlx::query_as::<_, Asset>(
        "INSERT INTO assets (id, product_name, product_type, product_quantity,
                             available_quantity, hr_email, company_name, date_added)
         VALUES ($1, $2, $3, $4, $4, $5, $6, now())
         RETURNING id, product_name, product_type, product_quantity, available_quantity,
                   hr_email, company_name, date_added",
    )
    .bind(Uuid::new_v4())
    .bind(payload.product_name.trim())
    .bind(payload.product_type)
    .bind(payload.product_quantity)
    .bind(&ctx.email)
    .bind(ctx.company_name.clone().unwrap_or_default())
    .fetch_one(&pool)
    .await
    .map_err(WorkflowError::from)?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Asset created",
        asset,
    ))
}

#[utoipa::path(
    get,
    path = "/assets",
    params(("hrEmail" = String, Query, description = "Owning employer email")),
    responses(
        (status = 200, description = "Assets owned by the employer", body = Vec<Asset>)
    ),
    tag = "Assets",
    security(("bearerAuth" = []))
)]
pub async fn get_assets(
    State(pool): State<PgPool>,
    Query(filter): Query<AssetFilter>,
) -> Result<ApiResponse<Vec<Asset>>, ApiResponse<()>> {
    let assets = sqlx::query_as::<_, Asset>(
        "SELECT id, product_name, product_type, product_quantity, available_quantity,
                hr_email, company_name, date_added
         FROM assets WHERE hr_email = $1
         ORDER BY date_added DESC",
    )
    .bind(&filter.hr_email)
    .fetch_all(&pool)
    .await
    .map_err(WorkflowError::from)?;

    Ok(ApiResponse::success(StatusCode::OK, "Assets", assets))
}

#[utoipa::path(
    get,
    path = "/assets/available",
    params(("hrEmail" = String, Query, description = "Owning employer email")),
    responses(
        (status = 200, description = "Assets with loanable stock", body = Vec<Asset>)
    ),
    tag = "Assets",
    security(("bearerAuth" = []))
)]
pub async fn get_available_assets(
    State(pool): State<PgPool>,
    Query(filter): Query<AssetFilter>,
) -> Result<ApiResponse<Vec<Asset>>, ApiResponse<()>> {
    let assets = sqlx::query_as::<_, Asset>(
        "SELECT id, product_name, product_type, product_quantity, available_quantity,
                hr_email, company_name, date_added
         FROM assets WHERE hr_email = $1 AND available_quantity > 0
         ORDER BY date_added DESC",
    )
    .bind(&filter.hr_email)
    .fetch_all(&pool)
    .await
    .map_err(WorkflowError::from)?;

    Ok(ApiResponse::success(StatusCode::OK, "Available assets", assets))
}

#[utoipa::path(
    patch,
    path = "/assets/{id}",
    params(("id" = Uuid, Path, description = "Asset ID")),
    request_body = UpdateAsset,
    responses(
        (status = 200, description = "Asset updated", body = Asset),
        (status = 403, description = "Caller does not own this asset"),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "Total cannot drop below the assigned count")
    ),
    tag = "Assets",
    security(("bearerAuth" = []))
)]
pub async fn update_asset(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
    Path(asset_id): Path<Uuid>,
    Json(payload): Json<UpdateAsset>,
) -> Result<ApiResponse<Asset>, ApiResponse<()>> {
    let existing = get_asset_by_id(&pool, asset_id).await?;
    if existing.hr_email != ctx.email {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "You do not own this asset",
            None,
        ));
    }
    if let Some(quantity) = payload.product_quantity {
        if quantity <= 0 {
            return Err(
                WorkflowError::InvalidInput("productQuantity must be positive".to_string()).into(),
            );
        }
    }

    // Availability moves by the same delta as the total so units already
    // assigned stay accounted for; shrinking below that count is refused.
    let updated = sqlx::query_as::<_, Asset>(
        "UPDATE assets
         SET product_name = COALESCE($2, product_name),
             available_quantity = available_quantity + (COALESCE($3, product_quantity) - product_quantity),
             product_quantity = COALESCE($3, product_quantity)
         WHERE id = $1
           AND available_quantity + (COALESCE($3, product_quantity) - product_quantity) >= 0
         RETURNING id, product_name, product_type, product_quantity, available_quantity,
                   hr_email, company_name, date_added",
    )
    .bind(asset_id)
    .bind(payload.product_name.as_deref().map(str::trim))
    .bind(payload.product_quantity)
    .fetch_optional(&pool)
    .await
    .map_err(WorkflowError::from)?;

    match updated {
        Some(asset) => Ok(ApiResponse::success(StatusCode::OK, "Asset updated", asset)),
        None => Err(WorkflowError::Conflict(
            "Total quantity cannot drop below the number of assigned units".to_string(),
        )
        .into()),
    }
}

#[utoipa::path(
    delete,
    path = "/assets/{id}",
    params(("id" = Uuid, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset deleted"),
        (status = 403, description = "Caller does not own this asset"),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "Asset has active assignments")
    ),
    tag = "Assets",
    security(("bearerAuth" = []))
)]
pub async fn delete_asset(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
    Path(asset_id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    let existing = get_asset_by_id(&pool, asset_id).await?;
    if existing.hr_email != ctx.email {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "You do not own this asset",
            None,
        ));
    }

    let deleted = sqlx::query(
        "DELETE FROM assets
         WHERE id = $1
           AND NOT EXISTS (
               SELECT 1 FROM assigned_assets
               WHERE asset_id = $1 AND status = 'assigned'
           )",
    )
    .bind(asset_id)
    .execute(&pool)
    .await
    .map_err(WorkflowError::from)?
    .rows_affected();

    if deleted == 0 {
        return Err(WorkflowError::Conflict(
            "Asset is referenced by an active assignment".to_string(),
        )
        .into());
    }

    Ok(ApiResponse::success(StatusCode::OK, "Asset deleted", ()))
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(
        create_asset,
        get_assets,
        get_available_assets,
        update_asset,
        delete_asset
    ),
    components(schemas(Asset, NewAsset, UpdateAsset)),
    tags(
        (name = "Assets", description = "Asset inventory endpoints")
    )
)]
pub struct AssetDoc;
