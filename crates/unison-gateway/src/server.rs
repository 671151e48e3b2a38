// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router assembly and the HTTP server loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use unison_config::model::ServiceConfig;
use unison_config::ContextConfig;
use unison_core::{ContextError, KvBackend, PolicyDirectory};
use unison_kv::tiered::KvCache;
use unison_kv::{ExportEngine, TieredKvStore};
use unison_records::{ConversationCache, ConversationStore, DashboardStore, ProfileStore};
use unison_storage::Database;
use unison_vault::PayloadCipher;

use crate::auth::{access_middleware, AccessGate};
use crate::handlers;

/// Renders the Prometheus exposition text.
pub type MetricsRender = Arc<dyn Fn() -> String + Send + Sync>;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct GatewayState {
    pub service_name: String,
    pub kv: Arc<TieredKvStore>,
    pub export: Arc<ExportEngine>,
    pub profiles: Arc<ProfileStore>,
    pub dashboards: Arc<DashboardStore>,
    pub conversations: Arc<ConversationStore>,
    /// Checked by `/ready` alongside the backend.
    pub database: Arc<Database>,
    pub gate: Arc<dyn AccessGate>,
    /// `None` when the exporter is disabled; `/metrics` then answers 404.
    pub metrics_render: Option<MetricsRender>,
}

impl GatewayState {
    /// Wire the stores over one database, backend, cipher and optional
    /// policy directory. Caches are created here and owned by the state.
    pub fn assemble(
        config: &ContextConfig,
        database: Arc<Database>,
        backend: Arc<dyn KvBackend>,
        policy: Option<Arc<dyn PolicyDirectory>>,
        cipher: PayloadCipher,
        gate: Arc<dyn AccessGate>,
    ) -> Self {
        let kv = Arc::new(TieredKvStore::new(KvCache::shared(), backend));
        Self {
            service_name: config.service.name.clone(),
            export: Arc::new(ExportEngine::new(kv.clone())),
            kv,
            profiles: Arc::new(ProfileStore::new(database.clone(), cipher.clone(), policy)),
            dashboards: Arc::new(DashboardStore::new(
                database.clone(),
                cipher,
                config.dashboard.max_cards,
            )),
            conversations: Arc::new(ConversationStore::new(
                database.clone(),
                ConversationCache::shared(),
            )),
            database,
            gate,
            metrics_render: None,
        }
    }

    pub fn with_metrics_render(mut self, render: MetricsRender) -> Self {
        self.metrics_render = Some(render);
        self
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("service_name", &self.service_name)
            .field("metrics", &self.metrics_render.is_some())
            .finish_non_exhaustive()
    }
}

/// Per-request bounds applied to the whole router.
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    pub max_concurrent: usize,
    pub timeout: Duration,
}

impl RequestLimits {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent_requests.max(1),
            timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self::from_config(&ServiceConfig::default())
    }
}

/// Build the full router: public health routes plus gated operations.
pub fn build_router(state: GatewayState, limits: RequestLimits) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/metrics", get(handlers::metrics))
        .route("/conversation/health", get(handlers::conversation_health));

    let gated = Router::new()
        .route("/kv/put", post(handlers::kv_put))
        .route("/kv/get", post(handlers::kv_get))
        .route("/kv/set", post(handlers::kv_set))
        .route(
            "/profile/{person_id}",
            get(handlers::profile_get).post(handlers::profile_put),
        )
        .route("/profile/{person_id}/export", get(handlers::profile_export))
        .route(
            "/dashboard/{person_id}",
            get(handlers::dashboard_get).post(handlers::dashboard_put),
        )
        .route(
            "/conversation/{person_id}/{session_id}",
            get(handlers::conversation_load).post(handlers::conversation_store),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.gate.clone(),
            access_middleware,
        ));

    public
        .merge(gated)
        // One semaphore shared by every route.
        .layer(GlobalConcurrencyLimitLayer::new(limits.max_concurrent))
        .layer(TimeoutLayer::new(limits.timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn start_server<F>(
    config: &ServiceConfig,
    state: GatewayState,
    shutdown: F,
) -> Result<(), ContextError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.bind_address, config.port);
    let app = build_router(state, RequestLimits::from_config(config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ContextError::Internal(format!("failed to bind {addr}: {e}")))?;
    tracing::info!(addr = %addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ContextError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
