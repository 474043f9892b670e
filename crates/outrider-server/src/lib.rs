//! HTTP surface and per-workflow orchestrators
//!
//! One axum router fronts three workflows (bulk download-and-backup,
//! backup rollback, and training launch), each a thin variation over the
//! same skeleton: discover work units, generate a shell program, drive
//! the target node to running, dispatch through the execution channel,
//! and answer 202 with a correlation identifier. Completion is never
//! observed here.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderName, Method, Request};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{info, info_span, Level};
use uuid::Uuid;

pub mod config;
pub mod error;
pub mod handlers;
pub mod orchestrator;

pub use config::ServerConfig;
pub use error::ApiError;
pub use orchestrator::WorkflowResponse;

use outrider_dispatch::{DispatchGateway, ExecutionChannel, RestChannelConfig, RestExecutionChannel};
use outrider_platform::{ComputePlatform, RestComputePlatform, RestPlatformConfig};
use outrider_storage::{
    ObjectStore, RestObjectStore, RestSecretStore, RestStorageConfig, SecretCache, SecretStore,
};

/// Shared handles for request handling.
///
/// Everything is behind `Arc`; invocations share nothing mutable beyond
/// the secret cache, which tolerates concurrent refresh.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub platform: Arc<dyn ComputePlatform>,
    pub gateway: Arc<DispatchGateway>,
    pub object_store: Arc<dyn ObjectStore>,
    pub secrets: Arc<dyn SecretStore>,
}

impl AppState {
    /// Assemble state from explicit collaborators (tests inject fakes here)
    pub fn new(
        config: ServerConfig,
        platform: Arc<dyn ComputePlatform>,
        channel: Arc<dyn ExecutionChannel>,
        object_store: Arc<dyn ObjectStore>,
        secrets: Arc<dyn SecretStore>,
    ) -> Self {
        let gateway = Arc::new(DispatchGateway::new(channel).with_payload_limit(config.payload_limit));
        Self {
            config: Arc::new(config),
            platform,
            gateway,
            object_store,
            secrets,
        }
    }

    /// Assemble state with the REST collaborator clients
    pub fn from_config(config: ServerConfig) -> Self {
        let platform = Arc::new(RestComputePlatform::new(RestPlatformConfig::new(
            &config.platform_url,
            &config.api_token,
        )));
        let channel = Arc::new(RestExecutionChannel::new(RestChannelConfig::new(
            &config.channel_url,
            &config.api_token,
        )));
        let object_store = Arc::new(RestObjectStore::new(RestStorageConfig::new(
            &config.storage_url,
            &config.api_token,
        )));
        let secrets = Arc::new(SecretCache::new(Arc::new(RestSecretStore::new(
            &config.secrets_url,
            &config.api_token,
        ))));

        Self::new(config, platform, channel, object_store, secrets)
    }
}

/// Build the application router.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
        ]);

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %Uuid::new_v4(),
            )
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/download-start", get(handlers::download_start))
        .route("/rollback", get(handlers::rollback))
        .route("/rollback-ssm", get(handlers::rollback))
        .route(
            "/start-training",
            get(handlers::start_training).post(handlers::start_training),
        )
        .fallback(handlers::fallback)
        .layer(trace)
        .layer(cors)
        .with_state(state)
}

/// Run the server until shutdown.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::from_config(config);
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "outrider listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
