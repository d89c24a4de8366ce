mod config;
mod engine;
mod errors;
mod models;
mod personalizer;
mod reference;
mod routes;
mod state;
mod vectorizer;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::engine::RecommendationEngine;
use crate::reference::bundle::BundleLocator;
use crate::reference::careers::CareerResolver;
use crate::routes::build_router;
use crate::state::AppState;
use crate::vectorizer::StudentVectorizer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting recomendaciones API v{}", env!("CARGO_PKG_VERSION"));

    // Reference data is a startup requirement: without the bundle the
    // process must not begin serving.
    let locator = BundleLocator {
        explicit: config.data_bundle.clone(),
        data_dir: config.data_dir.clone(),
    };
    let reference = reference::shared(&locator)?;
    info!(
        vocabulary = reference.vocabulary().len(),
        groups = reference.groups().len(),
        careers = reference.academic_profiles().careers().len(),
        "reference data ready"
    );

    let resolver = Arc::new(CareerResolver::default());
    let vectorizer = Arc::new(StudentVectorizer::new(Arc::clone(&reference)));
    let engine = Arc::new(RecommendationEngine::new(
        Arc::clone(&reference),
        Arc::clone(&resolver),
        config.offers_dir.clone(),
    ));

    let personalizer = personalizer::from_config(&config);
    info!(
        llm_enabled = personalizer.status().enabled,
        "personalizer initialized"
    );

    let state = AppState {
        reference,
        resolver,
        vectorizer,
        engine,
        personalizer,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
