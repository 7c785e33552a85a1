#![allow(dead_code, unused)]
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{Extension, Router};
use dotenvy::dotenv;
use sqlx::PgPool;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod billing;
mod config;
mod db;
mod middleware;
mod utils;

use crate::api::auth::AuthDoc;
use crate::api::billing::BillingDoc;
use crate::billing::client::BillingClient;
use crate::config::Config;
use crate::db::queries::affiliation::AffiliationDoc;
use crate::db::queries::asset::AssetDoc;
use crate::db::queries::assigned_asset::AssignedAssetDoc;
use crate::db::queries::package::PackageDoc;
use crate::db::queries::payment::PaymentDoc;
use crate::db::queries::request::RequestDoc;
use crate::middleware::auth::{account_context_middleware, create_account_cache, jwt_middleware};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    Config::init();

    std::fs::create_dir_all("logs")?;
    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .with_writer(non_blocking)
        .init();

    let account_cache = create_account_cache();
    let pool = db::pool::get_db_pool().await;
    let billing_client = BillingClient::from_config(&Config::get());

    let merged_doc = AuthDoc::openapi()
        .merge_from(AssetDoc::openapi())
        .merge_from(RequestDoc::openapi())
        .merge_from(AssignedAssetDoc::openapi())
        .merge_from(AffiliationDoc::openapi())
        .merge_from(PackageDoc::openapi())
        .merge_from(PaymentDoc::openapi())
        .merge_from(BillingDoc::openapi());

    // Public routes (registration, catalog, and the provider callback)
    let public_routes = Router::new()
        .merge(api::auth::auth_routes())
        .merge(api::packages::package_routes())
        .merge(api::billing::billing_public_routes());

    // Private routes
    let private_routes = Router::new()
        .merge(api::assets::asset_routes())
        .merge(api::requests::request_routes())
        .merge(api::assigned_assets::assigned_asset_routes())
        .merge(api::affiliations::affiliation_routes())
        .merge(api::billing::billing_routes())
        .merge(api::auth::secure_auth_routes())
        .route_layer(from_fn_with_state(pool.clone(), account_context_middleware))
        .route_layer(from_fn(jwt_middleware));

    let app = Router::new()
        .merge(api::health::health_routes())
        .merge(public_routes)
        .merge(private_routes)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", merged_doc.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/rapidoc.json", merged_doc).path("/rapidoc"))
        .layer(CorsLayer::permissive())
        .layer(Extension(account_cache.clone()))
        .layer(Extension(billing_client))
        .with_state(pool.clone());

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    run_server(app, shutdown_tx, pool).await;
    println!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal(mut shutdown_rx: broadcast::Receiver<()>, pool: PgPool) {
    tokio::select! {
        _ = signal::ctrl_c() => println!("Received Ctrl+C, shutting down..."),
        _ = shutdown_rx.recv() => println!("Received shutdown signal."),
    }
    println!("🛠️ Closing database pool...");
    pool.close().await;
    println!("✅ Database pool closed. Server shutting down.");
}

async fn run_server(app: Router, shutdown_tx: broadcast::Sender<()>, pool: PgPool) {
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    println!("Server running at http://{}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");

    let shutdown = shutdown_signal(shutdown_tx.subscribe(), pool.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .expect("Server encountered an error");
}
