//! storefront HTTP Server
//!
//! Axum-based server for the digital-goods storefront: checkout session
//! creation, payment verification, file downloads and call requests.

mod config;
mod download;
mod error;
mod handlers;
mod state;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::handlers::{create_checkout_session, liveness, request_call, verify_session};
use crate::state::AppState;

/// API routes without transport layers
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/", get(liveness))
        // Checkout
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/api/verify-session", post(verify_session))
        // Leads
        .route("/api/request-call", post(request_call))
        // Deliverables
        .route("/download/{filename}", get(download::download))
        .with_state(state)
}

fn cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment (before tracing so RUST_LOG from .env applies)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let state = AppState::from_config(&config)?;

    if let Some(checkout) = &state.checkout {
        tracing::info!("✓ Payments configured ({})", checkout.provider_name());
    } else {
        tracing::warn!("⚠ Stripe not configured - payments disabled");
        tracing::warn!("  Set STRIPE_SECRET_KEY in .env");
    }

    if config.download_signing_secret.is_some() {
        tracing::info!(
            "✓ Download links signed (valid {}s)",
            config.download_link_ttl_secs
        );
    } else {
        tracing::warn!("⚠ DOWNLOAD_SIGNING_SECRET not set - download links never expire");
    }

    if !state.downloads.root().is_dir() {
        tracing::warn!(
            "⚠ Download directory {} does not exist",
            state.downloads.root().display()
        );
    }

    let app = router(state)
        .layer(cors(&config.allowed_origins))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 storefront server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /                        - Liveness");
    tracing::info!("  POST /create-checkout-session - Start Stripe checkout");
    tracing::info!("  POST /api/verify-session      - Verify payment, get downloads");
    tracing::info!("  POST /api/request-call        - Book a call");
    tracing::info!("  GET  /download/{{filename}}     - Download a purchased file");
    tracing::info!("");
    tracing::info!("Allowed origins: {}", config.allowed_origins.join(", "));
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
