//! HTTP surface: raw lookup endpoints, the batch aggregation endpoint,
//! CORS, and error mapping.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use chemfuse_core::Correlator;
use chemfuse_providers::{MaterialsClient, PropertiesClient, RegistryClient, TranslatorClient};
use chemfuse_shared::{
    AppConfig, ChemFuseError, ChemTable, MaterialSummary, PipelineConfig, PropertyPayload,
    Result, ServerConfig,
};

/// Static usage text served at `/help`.
const HELP_TEXT: &str = "\
Welcome to the chemfuse API!

This service aggregates chemical and materials data from four upstream
providers.

Available endpoints:
- GET /mpID/{ids}: material summaries for one or more material IDs.
- GET /formula/{formula}: registry number for a chemical formula.
- GET /cts/{casRegistryNumber}: compound ID for a registry number.
- GET /pubchemcID/{ids}: compound property bags for one or more compound IDs.
- GET /data/{ids}: fully correlated table for up to 5 material IDs.
- GET /health: liveness check.

Usage examples:
- GET /mpID/mp-149
- GET /formula/H2O
- GET /cts/7732-18-5
- GET /pubchemcID/962
- GET /data/mp-149,mp-13
";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared handler state: the provider clients plus the correlator over them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<StateInner>,
}

struct StateInner {
    materials: MaterialsClient,
    registry: RegistryClient,
    translator: TranslatorClient,
    properties: PropertiesClient,
    correlator: Correlator,
}

impl AppState {
    /// Build all provider clients and the correlator from config.
    pub fn new(config: &AppConfig, api_key: String) -> Result<Self> {
        let providers = &config.providers;

        let materials = MaterialsClient::new(&providers.materials_base_url, api_key)?;
        let registry = RegistryClient::new(&providers.registry_base_url)?;
        let translator = TranslatorClient::new(&providers.translator_base_url)?;
        let properties = PropertiesClient::new(&providers.properties_base_url)?;

        let correlator = Correlator::new(
            materials.clone(),
            registry.clone(),
            translator.clone(),
            properties.clone(),
            &PipelineConfig::from(config),
        );

        Ok(Self {
            inner: Arc::new(StateInner {
                materials,
                registry,
                translator,
                properties,
                correlator,
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the application router with tracing and CORS middleware.
pub fn router(state: AppState, server: &ServerConfig) -> Result<Router> {
    let cors = cors_layer(server)?;

    Ok(Router::new()
        .route("/mpID/:ids", get(material_summaries))
        .route("/formula/:formula", get(registry_number))
        .route("/cts/:cas_rn", get(compound_id))
        .route("/pubchemcID/:ids", get(compound_properties))
        .route("/data/:ids", get(aggregate))
        .route("/help", get(help))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}

/// CORS: configured origins only, GET only, credentials allowed.
fn cors_layer(server: &ServerConfig) -> Result<CorsLayer> {
    let origins = server
        .allowed_origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|e| {
                ChemFuseError::config(format!("invalid CORS origin '{origin}': {e}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Material summaries for one or a comma-joined list of ids.
async fn material_summaries(
    State(state): State<AppState>,
    Path(ids): Path<String>,
) -> ApiResult<Json<Vec<MaterialSummary>>> {
    let ids = ids.replace(' ', "");
    info!(%ids, "summary lookup");
    let summaries = state.inner.materials.summaries(&ids).await?;
    Ok(Json(summaries))
}

/// Registry number for a chemical formula; `""` when unresolved.
async fn registry_number(
    State(state): State<AppState>,
    Path(formula): Path<String>,
) -> ApiResult<Json<String>> {
    info!(%formula, "registry number lookup");
    let number = state.inner.registry.registry_number(&formula).await?;
    Ok(Json(number.unwrap_or_default()))
}

/// Compound id for a registry number; `""` when unresolved.
async fn compound_id(
    State(state): State<AppState>,
    Path(cas_rn): Path<String>,
) -> ApiResult<Json<String>> {
    info!(registry_number = %cas_rn, "compound id lookup");
    let id = state.inner.translator.compound_id(&cas_rn).await?;
    Ok(Json(id.unwrap_or_default()))
}

/// Property bags for one or a comma-joined list of compound ids.
async fn compound_properties(
    State(state): State<AppState>,
    Path(ids): Path<String>,
) -> ApiResult<Json<PropertyPayload>> {
    info!(%ids, "property batch lookup");
    let payload = state.inner.properties.fetch_batch(&ids).await?;
    Ok(Json(payload))
}

/// The correlated table for an ordered batch of material ids.
async fn aggregate(
    State(state): State<AppState>,
    Path(ids): Path<String>,
) -> ApiResult<Json<ChemTable>> {
    let request_id = Uuid::now_v7();
    let ids: Vec<String> = ids.split(',').map(|id| id.trim().to_string()).collect();
    info!(%request_id, batch = ids.len(), "aggregation request");

    let records = state.inner.correlator.aggregate(&ids).await?;
    Ok(Json(ChemTable::from_records(&records)))
}

/// Static usage text.
async fn help() -> &'static str {
    HELP_TEXT
}

/// Liveness check.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Maps pipeline failures onto HTTP statuses: validation errors are the
/// client's fault, everything else is a server-side failure.
pub struct ApiError(ChemFuseError);

impl From<ChemFuseError> for ApiError {
    fn from(err: ChemFuseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let body = Json(serde_json::json!({"error": self.0.to_string()}));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AppState {
        let mut config = AppConfig::default();
        config.limits.rate_limit_ms = 0;
        AppState::new(&config, "test-key".to_string()).expect("build state")
    }

    #[test]
    fn router_builds_with_default_cors() {
        let config = AppConfig::default();
        let state = test_state();
        router(state, &config.server).expect("router should build");
    }

    #[test]
    fn cors_rejects_malformed_origin() {
        let mut server = ServerConfig::default();
        server.allowed_origins = vec!["not\nan\norigin".into()];
        assert!(cors_layer(&server).is_err());
    }

    #[test]
    fn validation_errors_map_to_bad_request() {
        let response =
            ApiError(ChemFuseError::validation("too many IDs provided")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn provider_errors_map_to_internal_error() {
        let response = ApiError(ChemFuseError::Provider("bad payload".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ApiError(ChemFuseError::Network("timeout".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn help_names_every_endpoint() {
        let text = help().await;
        for route in ["/mpID/", "/formula/", "/cts/", "/pubchemcID/", "/data/"] {
            assert!(text.contains(route), "help must mention {route}");
        }
    }
}
