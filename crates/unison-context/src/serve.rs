// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unison-context serve`: wire every component and run the gateway.

use std::sync::Arc;

use tracing::{error, info, warn};
use unison_config::ContextConfig;
use unison_core::{ContextError, KvBackend, PluginAdapter, PolicyDirectory};
use unison_gateway::{start_server, AccessGate, ConsentGate, GatewayState, OpenGate};
use unison_kv::HttpKvBackend;
use unison_records::HttpPolicyDirectory;
use unison_storage::Database;
use unison_vault::PayloadCipher;

use crate::shutdown;

/// Run the service until SIGINT/SIGTERM, then checkpoint the database.
pub async fn run_serve(config: ContextConfig) -> Result<(), ContextError> {
    init_tracing(&config.service.log_level);
    info!(service = %config.service.name, "starting unison-context serve");

    let database = Arc::new(
        Database::open_with(&config.database.path, config.database.wal_mode).await?,
    );
    info!(path = %config.database.path, "database ready");

    let cipher = PayloadCipher::new(
        config
            .encryption
            .decode_key()
            .map_err(ContextError::Config)?,
    );
    if !cipher.is_enabled() {
        warn!("no encryption key configured, profiles and dashboards are stored as plaintext");
    }

    let backend: Arc<dyn KvBackend> = Arc::new(HttpKvBackend::from_config(&config.backend)?);
    let backend_url = config.backend.base_url();
    match backend.health_check().await {
        Ok(status) if status.is_healthy() => info!(url = %backend_url, "kv backend reachable"),
        Ok(status) => warn!(
            url = %backend_url,
            status = status.label(),
            "kv backend not healthy, writes will degrade"
        ),
        Err(e) => warn!(url = %backend_url, error = %e, "kv backend health check failed"),
    }

    let policy: Option<Arc<dyn PolicyDirectory>> = if config.policy.validate_groups {
        let directory = HttpPolicyDirectory::from_config(&config.policy)?;
        let policy_url = config.policy.base_url();
        match directory.health_check().await {
            Ok(status) if status.is_healthy() => {
                info!(url = %policy_url, "policy group validation enabled")
            }
            Ok(status) => warn!(
                url = %policy_url,
                status = status.label(),
                "policy directory not healthy, profiles naming a group will be rejected"
            ),
            Err(e) => warn!(url = %policy_url, error = %e, "policy health check failed"),
        }
        Some(Arc::new(directory))
    } else {
        None
    };

    let gate: Arc<dyn AccessGate> = if config.security.require_consent {
        info!(url = %config.security.consent_url(), "consent enforcement enabled");
        Arc::new(ConsentGate::from_config(&config.security)?)
    } else {
        warn!("consent enforcement disabled, all routes are open");
        Arc::new(OpenGate)
    };

    let state = GatewayState::assemble(
        &config,
        database.clone(),
        backend.clone(),
        policy,
        cipher,
        gate,
    );
    let state = attach_metrics(&config, state)?;

    let cancel = shutdown::install_signal_handler();
    let served = start_server(&config.service, state, cancel.clone().cancelled_owned()).await;
    cancel.cancel();

    if let Err(e) = database.shutdown().await {
        error!(error = %e, "database checkpoint on shutdown failed");
    }
    if let Err(e) = backend.shutdown().await {
        warn!(error = %e, "kv backend shutdown failed");
    }

    served?;
    info!("unison-context serve shutdown complete");
    Ok(())
}

#[cfg(feature = "prometheus")]
fn attach_metrics(
    config: &ContextConfig,
    state: GatewayState,
) -> Result<GatewayState, ContextError> {
    if !config.prometheus.enabled {
        info!("prometheus exporter disabled");
        return Ok(state);
    }
    let adapter = Arc::new(unison_prometheus::PrometheusAdapter::new()?);
    info!("prometheus exporter installed at /metrics");
    Ok(state.with_metrics_render(Arc::new(move || adapter.render())))
}

#[cfg(not(feature = "prometheus"))]
fn attach_metrics(
    _config: &ContextConfig,
    state: GatewayState,
) -> Result<GatewayState, ContextError> {
    Ok(state)
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("unison={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
