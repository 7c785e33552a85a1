use dotenvy::dotenv;
use std::env;
use std::sync::{Arc, OnceLock};

/// ✅ Global Config stored in `OnceLock`
static CONFIG: OnceLock<Arc<Config>> = OnceLock::new();

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub billing_api_base: String,
    pub billing_api_key: String,
    pub checkout_redirect_base: String,
}

impl Config {
    /// ✅ Load environment variables and set defaults
    pub fn from_env() -> Self {
        dotenv().ok(); // Load .env only once

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            billing_api_base: env::var("BILLING_API_BASE")
                .unwrap_or_else(|_| "https://api.billing.example.com".to_string()),
            billing_api_key: env::var("BILLING_API_KEY").expect("BILLING_API_KEY must be set"),
            checkout_redirect_base: env::var("CHECKOUT_REDIRECT_BASE")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        }
    }

    /// ✅ Initialize the global config
    pub fn init() {
        CONFIG
            .set(Arc::new(Self::from_env()))
            .expect("Config already initialized");
    }

    /// ✅ Safe access to Config
    pub fn get() -> Arc<Config> {
        CONFIG.get().expect("Config not initialized").clone()
    }
}
