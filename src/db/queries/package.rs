use axum::{extract::State, http::StatusCode};
use sqlx::PgPool;

use crate::db::models::package::Package;
use crate::utils::api_response::ApiResponse;
use crate::utils::error::WorkflowError;

#[utoipa::path(
    get,
    path = "/packages",
    responses(
        (status = 200, description = "Subscription package catalog", body = Vec<Package>)
    ),
    tag = "Packages"
)]
pub async fn get_packages(
    State(pool): State<PgPool>,
) -> Result<ApiResponse<Vec<Package>>, ApiResponse<()>> {
    let packages = sqlx::query_as::<_, Package>(
        "SELECT id, name, price_usd, employee_limit FROM packages ORDER BY price_usd",
    )
    .fetch_all(&pool)
    .await
    .map_err(WorkflowError::from)?;

    Ok(ApiResponse::success(StatusCode::OK, "Packages", packages))
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(get_packages),
    components(schemas(Package)),
    tags(
        (name = "Packages", description = "Package catalog endpoints")
    )
)]
pub struct PackageDoc;
