use crate::app::handlers;
use crate::app::state::AppState;
use crate::config::AppConfig;
use crate::utils::error::{LookupError, Result};
use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use std::time::Duration;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(CORS_MAX_AGE);

    Router::new()
        .route("/api/health", get(handlers::health))
        // ICD-10
        .route("/api/icd10/search", get(handlers::icd10::search))
        .route("/api/icd10/live", get(handlers::icd10::live))
        .route("/api/icd10/codes", get(handlers::icd10::codes_for_drug))
        .route(
            "/api/icd10/live/drugs/:drug_name/indications",
            get(handlers::icd10::drug_indications),
        )
        .route(
            "/api/icd10/live/icd10/:icd10_code/drugs",
            get(handlers::icd10::drugs_for_code),
        )
        // Registry, coverage, formulary
        .route("/api/drug-service/search", get(handlers::drugs::search))
        .route("/api/drug-service/drugs/:id", get(handlers::drugs::get_drug))
        .route("/api/drug-service/categories", get(handlers::drugs::categories))
        .route("/api/daman-service/coverage", get(handlers::drugs::coverage))
        .route("/api/uae-drugs", get(handlers::drugs::uae_drugs))
        .route("/api/formulary", get(handlers::drugs::formulary))
        // Safety
        .route("/api/drug-interactions", get(handlers::safety::interactions))
        .route("/api/pregnancy-categories", get(handlers::safety::pregnancy))
        // External pharma APIs
        .route(
            "/api/external/openfda/drug-labels/:drug_name",
            get(handlers::external::openfda_labels),
        )
        .route(
            "/api/external/openfda/adverse-events/:drug_name",
            get(handlers::external::openfda_adverse_events),
        )
        .route(
            "/api/external/rxnorm/search/:drug_name",
            get(handlers::external::rxnorm_search),
        )
        .route(
            "/api/external/rxnorm/interactions/:rxcui",
            get(handlers::external::rxnorm_interactions),
        )
        .route(
            "/api/external/chembl/search/:drug_name",
            get(handlers::external::chembl_search),
        )
        .route(
            "/api/external/chembl/targets/:chembl_id",
            get(handlers::external::chembl_targets),
        )
        .route(
            "/api/external/combined-search/:drug_name",
            get(handlers::external::combined_search),
        )
        .route("/api/external/health", get(handlers::external::health))
        .route("/api/openfda/drugs", get(handlers::external::openfda_drugs))
        .route("/api/rxnorm/drugs", get(handlers::external::rxnorm_drugs))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
pub async fn serve(config: &AppConfig, state: AppState) -> Result<()> {
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("🚀 Listening on http://{}", address);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(LookupError::IoError)?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
