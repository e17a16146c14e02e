//! Extra Chill Contact API Server
//!
//! Contact form submission endpoint with Turnstile verification, HTML mail
//! notifications and Sendy newsletter sync
//!
//! Usage:
//!   cargo run --bin contact_api
//!
//! Environment:
//!   CONTACT_ADMIN_EMAIL - Notification address (required)
//!   PORT / CONTACT_PORT - Server port (default: 8080)
//!   CONTACT_HOST        - Server host (default: 0.0.0.0)
//!   RUST_LOG            - Log filter (default: info)

use extrachill_contact::api::{create_router, AppState};
use extrachill_contact::utils::constants::{APP_NAME, APP_VERSION};
use extrachill_contact::{ContactConfig, SubmissionService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = Arc::new(ContactConfig::from_env()?);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let service = Arc::new(SubmissionService::from_config(config)?);
    let state = Arc::new(AppState::new(service));
    let app = create_router(state);

    info!("🚀 {} v{} starting on http://{}", APP_NAME, APP_VERSION, addr);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/contact/submit   - JSON submission (X-WP-Nonce header)");
    info!("  POST /v1/contact/form     - Form-encoded submission, redirects with notice");
    info!("  GET  /v1/contact/notice   - Resolve a redirect notice");
    info!("  GET  /v1/contact/config   - Client form props with fresh nonces");
    info!("  GET  /v1/health           - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("👋 {} shutdown complete", APP_NAME);

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════╗
    ║                                              ║
    ║        E X T R A   C H I L L                 ║
    ║        C O N T A C T   A P I   v{:<8}     ║
    ║                                              ║
    ╚══════════════════════════════════════════════╝
    "#,
        APP_VERSION
    );
}
