use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::billing::catalog;
use crate::db::models::affiliation::{AffiliationStatus, EmployeeAffiliation};
use crate::middleware::auth::AccountContext;
use crate::utils::api_response::ApiResponse;
use crate::utils::error::{WorkflowError, WorkflowResult};

// ---------- Registry operations ----------

/// Make sure an active employment link exists for (employee, employer).
///
/// Idempotent: the unique constraint on (employee_email, hr_email) means
/// calling this N times leaves exactly one row. An `inactive` link is
/// reactivated with a fresh affiliation date. Returns whether the link
/// actually transitioned into `active`.
///
/// Activating a new link is gated on the employer's package quota; an
/// already-active link never re-counts against it.
pub async fn ensure_active(
    conn: &mut PgConnection,
    employee_email: &str,
    employee_name: &str,
    hr_email: &str,
    company_name: &str,
) -> WorkflowResult<bool> {
    let existing = sqlx::query_scalar::<_, AffiliationStatus>(
        "SELECT status FROM employee_affiliations
         WHERE employee_email = $1 AND hr_email = $2",
    )
    .bind(employee_email)
    .bind(hr_email)
    .fetch_optional(&mut *conn)
    .await?;

    if existing == Some(AffiliationStatus::Active) {
        return Ok(false);
    }

    let within_quota = sqlx::query_scalar::<_, bool>(
        "SELECT (SELECT count(*) FROM employee_affiliations
                 WHERE hr_email = $1 AND status = 'active')
              < COALESCE((SELECT package_limit FROM users WHERE email = $1), $2)",
    )
    .bind(hr_email)
    .bind(catalog::DEFAULT_EMPLOYEE_LIMIT as i64)
    .fetch_one(&mut *conn)
    .await?;

    if !within_quota {
        return Err(WorkflowError::Conflict(
            "Employee limit reached for the current package".to_string(),
        ));
    }

    sqlx::query(
        "INSERT INTO employee_affiliations
             (id, employee_email, employee_name, hr_email, company_name, affiliation_date, status)
         VALUES ($1, $2, $3, $4, $5, now(), 'active')
         ON CONFLICT (employee_email, hr_email)
         DO UPDATE SET status = 'active', affiliation_date = now()",
    )
    .bind(Uuid::new_v4())
    .bind(employee_email)
    .bind(employee_name)
    .bind(hr_email)
    .bind(company_name)
    .execute(&mut *conn)
    .await?;

    Ok(true)
}

/// Deactivate a link. Absent or already-inactive rows are a no-op.
pub async fn deactivate(pool: &PgPool, affiliation_id: Uuid, hr_email: &str) -> WorkflowResult<()> {
    sqlx::query(
        "UPDATE employee_affiliations SET status = 'inactive'
         WHERE id = $1 AND hr_email = $2 AND status = 'active'",
    )
    .bind(affiliation_id)
    .bind(hr_email)
    .execute(pool)
    .await?;
    Ok(())
}

// ---------- Handlers ----------

#[utoipa::path(
    get,
    path = "/affiliations",
    responses(
        (status = 200, description = "Active employees of the calling employer", body = Vec<EmployeeAffiliation>),
        (status = 403, description = "Caller is not an employer")
    ),
    tag = "Affiliations",
    security(("bearerAuth" = []))
)]
pub async fn get_affiliations(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
) -> Result<ApiResponse<Vec<EmployeeAffiliation>>, ApiResponse<()>> {
    if !ctx.is_employer() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Only employers can list affiliations",
            None,
        ));
    }

    let affiliations = sqlx::query_as::<_, EmployeeAffiliation>(
        "SELECT id, employee_email, employee_name, hr_email, company_name,
                affiliation_date, status
         FROM employee_affiliations
         WHERE hr_email = $1 AND status = 'active'
         ORDER BY affiliation_date DESC",
    )
    .bind(&ctx.email)
    .fetch_all(&pool)
    .await
    .map_err(WorkflowError::from)?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Active affiliations",
        affiliations,
    ))
}

#[utoipa::path(
    delete,
    path = "/affiliations/{id}",
    params(("id" = Uuid, Path, description = "Affiliation ID")),
    responses(
        (status = 200, description = "Affiliation deactivated (no-op when already inactive)"),
        (status = 403, description = "Caller is not an employer")
    ),
    tag = "Affiliations",
    security(("bearerAuth" = []))
)]
pub async fn remove_affiliation(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
    Path(affiliation_id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    if !ctx.is_employer() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Only employers can remove affiliations",
            None,
        ));
    }

    deactivate(&pool, affiliation_id, &ctx.email).await?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Affiliation deactivated",
        (),
    ))
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(get_affiliations, remove_affiliation),
    components(schemas(EmployeeAffiliation, AffiliationStatus)),
    tags(
        (name = "Affiliations", description = "Employer/employee affiliation registry")
    )
)]
pub struct AffiliationDoc;
