//! packet-api - payroll packet form server
//!
//! Provides REST endpoints for:
//! - Listing configured forms and downloading their templates
//! - Filling name, initials and date into a form (native fields or overlay)
//! - Inspecting a template's fields against its profile
//! - Saving and restoring a user's in-progress packet

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod handlers;
mod models;
mod state;
mod store;

use config::FormsConfig;
use state::AppState;

/// Command-line arguments for packet-api
#[derive(Parser, Debug)]
#[command(name = "packet-api")]
#[command(about = "Payroll packet form filling server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// SQLite database for form progress
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:packet.db?mode=rwc")]
    database_url: String,

    /// Forms config (TOML); defaults to the employee handbook only
    #[arg(long, env = "PACKET_FORMS_CONFIG")]
    forms_config: Option<PathBuf>,

    /// Directory that relative template paths resolve against
    #[arg(long, env = "PACKET_TEMPLATE_DIR", default_value = "templates")]
    template_dir: PathBuf,
}

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Forms
        .route("/api/forms", get(handlers::list_forms))
        .route("/api/forms/:form/template", get(handlers::get_template))
        .route("/api/forms/:form/inspect", post(handlers::inspect_form))
        .route("/api/forms/:form/fill", post(handlers::fill_form))
        // Progress
        .route(
            "/api/progress/:user_id/:form",
            get(handlers::get_progress).put(handlers::save_progress),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("packet_api=info".parse()?)
                .add_directive("packet_forms=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let forms = match &args.forms_config {
        Some(path) => FormsConfig::load(path)?,
        None => FormsConfig::handbook_only(),
    };

    info!("Initializing packet-api...");
    let state = AppState::new(&args.database_url, &forms, &args.template_dir).await?;
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting packet-api on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
