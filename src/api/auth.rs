use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::Config;
use crate::db::models::user::{User, ROLE_EMPLOYEE, ROLE_EMPLOYER};
use crate::middleware::auth::AccountContext;
use crate::utils::api_response::ApiResponse;
use crate::utils::error::WorkflowError;

/// Represents a request to register a new account.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Full name
    pub name: String,
    /// Account email, also the account identifier
    pub email: String,
    /// Account password
    pub password: String,
    /// Either "hr" (employer) or "employee"
    pub role: String,
    /// Company name, required for employers
    pub company_name: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
}

/// JWT Claims used for authentication.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject - account email
    pub sub: String,
    /// Full name of the authenticated account
    pub name: String,
    /// Role assigned to the account
    pub role: String,
    /// Expiration timestamp (UNIX TIME)
    pub exp: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
}

pub fn auth_routes() -> Router<PgPool> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn secure_auth_routes() -> Router<PgPool> {
    Router::new().route("/users/me", get(get_me))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ApiResponse<RegisterResponse>, ApiResponse<()>> {
    if payload.name.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(WorkflowError::InvalidInput("name and email are required".to_string()).into());
    }
    if payload.password.len() < 8 {
        return Err(
            WorkflowError::InvalidInput("password must be at least 8 characters".to_string())
                .into(),
        );
    }
    if payload.role != ROLE_EMPLOYER && payload.role != ROLE_EMPLOYEE {
        return Err(
            WorkflowError::InvalidInput("role must be 'hr' or 'employee'".to_string()).into(),
        );
    }
    if payload.role == ROLE_EMPLOYER
        && payload
            .company_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty())
    {
        return Err(
            WorkflowError::InvalidInput("companyName is required for employers".to_string())
                .into(),
        );
    }

    let password_hash = hash(&payload.password, DEFAULT_COST).map_err(|e| {
        ApiResponse::<()>::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to hash password",
            Some(json!({ "error": e.to_string() })),
        )
    })?;

    let result = sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, company_name, status)
         VALUES ($1, $2, $3, $4, $5, $6, 'active')",
    )
    .bind(Uuid::new_v4())
    .bind(payload.name.trim())
    .bind(payload.email.trim().to_lowercase())
    .bind(&password_hash)
    .bind(&payload.role)
    .bind(payload.company_name.as_deref().map(str::trim))
    .execute(&pool)
    .await;

    match result {
        Ok(_) => Ok(ApiResponse::success(
            StatusCode::CREATED,
            "Account created",
            RegisterResponse {
                message: "Registration successful".to_string(),
            },
        )),
        Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => Err(
            WorkflowError::Conflict("Email already registered".to_string()).into(),
        ),
        Err(e) => Err(WorkflowError::from(e).into()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = LoginResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(pool): State<PgPool>,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, ApiResponse<()>> {
    let row = sqlx::query_as::<_, (String, String, String, String)>(
        "SELECT name, email, password_hash, role FROM users
         WHERE email = $1 AND status = 'active'",
    )
    .bind(payload.email.trim().to_lowercase())
    .fetch_optional(&pool)
    .await
    .map_err(WorkflowError::from)?;

    let Some((name, email, password_hash, role)) = row else {
        warn!("Login attempt for unknown account");
        return Err(invalid_credentials());
    };

    let verified = verify(&payload.password, &password_hash).map_err(|e| {
        ApiResponse::<()>::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to verify password",
            Some(json!({ "error": e.to_string() })),
        )
    })?;
    if !verified {
        warn!("Failed login attempt for {email}");
        return Err(invalid_credentials());
    }

    let claims = Claims {
        sub: email,
        name,
        role: role.clone(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(24)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(Config::get().jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        ApiResponse::<()>::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to issue token",
            Some(json!({ "error": e.to_string() })),
        )
    })?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Login successful",
        LoginResponse { token, role },
    ))
}

fn invalid_credentials() -> ApiResponse<()> {
    ApiResponse::error(StatusCode::UNAUTHORIZED, "Invalid email or password", None)
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "The calling account", body = User),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(ctx): Extension<AccountContext>,
) -> Result<ApiResponse<User>, ApiResponse<()>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, role, company_name, package, package_limit, status
         FROM users WHERE email = $1",
    )
    .bind(&ctx.email)
    .fetch_optional(&pool)
    .await
    .map_err(WorkflowError::from)?
    .ok_or(WorkflowError::NotFound("Account"))?;

    Ok(ApiResponse::success(StatusCode::OK, "Account", user))
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(register, login, get_me),
    components(schemas(RegisterRequest, RegisterResponse, LoginRequest, LoginResponse, User)),
    tags(
        (name = "Authentication", description = "Account registration and login")
    )
)]
pub struct AuthDoc;

#[cfg(test)]
mod tests {
    use super::Claims;

    #[test]
    fn claims_round_trip_through_jwt() {
        let secret = b"test-secret";
        let claims = Claims {
            sub: "hr@example.com".to_string(),
            name: "HR Manager".to_string(),
            role: "hr".to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(secret),
        )
        .unwrap();

        let decoded = jsonwebtoken::decode::<Claims>(
            &token,
            &jsonwebtoken::DecodingKey::from_secret(secret),
            &jsonwebtoken::Validation::default(),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, "hr@example.com");
        assert_eq!(decoded.claims.role, "hr");
    }

    #[test]
    fn expired_token_is_rejected() {
        let secret = b"test-secret";
        let claims = Claims {
            sub: "hr@example.com".to_string(),
            name: "HR Manager".to_string(),
            role: "hr".to_string(),
            exp: (chrono::Utc::now() - chrono::Duration::hours(1)).timestamp() as usize,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(secret),
        )
        .unwrap();

        let err = jsonwebtoken::decode::<Claims>(
            &token,
            &jsonwebtoken::DecodingKey::from_secret(secret),
            &jsonwebtoken::Validation::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.kind(),
            &jsonwebtoken::errors::ErrorKind::ExpiredSignature
        );
    }
}
