use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use tracing::error;

use crate::api::auth::Claims;
use crate::config::Config;
use crate::db::models::user::ROLE_EMPLOYER;
use crate::utils::api_response::ApiResponse;

/// ✅ **Account Context Cache Using `moka`**
pub type AccountCache = Arc<Cache<String, AccountContext>>;

/// ✅ **Initialize the `moka` Cache**
pub fn create_account_cache() -> AccountCache {
    Arc::new(
        Cache::builder()
            .time_to_live(Duration::from_secs(600)) // ✅ TTL = 10 minutes
            .build(),
    )
}

/// ✅ **JWT Middleware** (Handles Token Authentication)
pub async fn jwt_middleware(mut req: Request<Body>, next: Next) -> Result<Response, Response> {
    // Step 1: Extract Authorization header
    let auth_header = req.headers().get("Authorization").ok_or_else(|| {
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Missing Authorization header", None)
            .into_response()
    })?;

    // Step 2: Convert header to string
    let token_str = auth_header.to_str().map_err(|_| {
        ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            "Invalid Authorization header format",
            None,
        )
        .into_response()
    })?;

    // Step 3: Strip "Bearer " prefix
    let token = token_str.strip_prefix("Bearer ").ok_or_else(|| {
        ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            "Invalid token format (missing 'Bearer ' prefix)",
            None,
        )
        .into_response()
    })?;

    // Step 4: Decode the JWT token
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(Config::get().jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        ApiResponse::<()>::error(
            StatusCode::UNAUTHORIZED,
            "Invalid token",
            Some(json!({ "error": e.to_string() })),
        )
        .into_response()
    })?;

    // Step 5: Insert claims into request extensions
    req.extensions_mut().insert(token_data.claims);

    // Step 6: Proceed to the next middleware
    Ok(next.run(req).await)
}

/// The caller's account as the store knows it. Attached to every private
/// request; handlers use it for role checks and for the requester identity
/// (never trusting client-supplied emails).
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct AccountContext {
    pub email: String,
    pub name: String,
    pub role: String,
    pub company_name: Option<String>,
    pub package: Option<String>,
    pub package_limit: Option<i32>,
}

impl AccountContext {
    pub fn is_employer(&self) -> bool {
        self.role == ROLE_EMPLOYER
    }

    pub fn is_employee(&self) -> bool {
        !self.is_employer()
    }
}

/// ✅ **Account Context Middleware with `moka`**
pub async fn account_context_middleware(
    State(db_pool): State<PgPool>,
    Extension(account_cache): Extension<AccountCache>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let claims = req.extensions().get::<Claims>().cloned().ok_or_else(|| {
        error!("Missing JWT claims in request");
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Missing JWT claims in request", None)
            .into_response()
    })?;

    // ✅ **Check cache first before querying DB**
    if let Some(cached_context) = account_cache.get(&claims.sub) {
        req.extensions_mut().insert(cached_context);
        return Ok(next.run(req).await);
    }

    // ❌ **If not cached, query database**
    let context = match fetch_account_from_db(&claims.sub, &db_pool).await {
        Ok(Some(context)) => context,
        Ok(None) => {
            return Err(ApiResponse::<()>::error(
                StatusCode::UNAUTHORIZED,
                "Account no longer exists",
                None,
            )
            .into_response());
        }
        Err(err) => {
            error!("Database query failed: {:?}", err);
            return Err(ApiResponse::<()>::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load account context",
                Some(json!({ "error": err.to_string() })),
            )
            .into_response());
        }
    };

    // ✅ **Cache the retrieved context**
    account_cache.insert(claims.sub.clone(), context.clone());

    // ✅ **Attach to request & continue**
    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

/// ✅ **Query Database for the caller's account**
async fn fetch_account_from_db(
    email: &str,
    pool: &PgPool,
) -> Result<Option<AccountContext>, sqlx::Error> {
    sqlx::query_as::<_, AccountContext>(
        "SELECT email, name, role, company_name, package, package_limit
         FROM users WHERE email = $1 AND status = 'active'",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::AccountContext;

    fn context(role: &str) -> AccountContext {
        AccountContext {
            email: "someone@example.com".into(),
            name: "Someone".into(),
            role: role.into(),
            company_name: None,
            package: None,
            package_limit: None,
        }
    }

    #[test]
    fn hr_role_is_employer() {
        assert!(context("hr").is_employer());
        assert!(!context("hr").is_employee());
    }

    #[test]
    fn employee_role_is_not_employer() {
        assert!(context("employee").is_employee());
        assert!(!context("employee").is_employer());
    }
}
