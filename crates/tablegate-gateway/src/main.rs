//! tablegate gateway entry point.
//!
//! Loads settings and starts the axum-based HTTP gateway.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TABLEGATE_CONFIG` | *(none)* | Path to a toml / yaml / json settings file. |
//! | `TABLEGATE__<KEY>` | *(see settings)* | Override any setting, `__` separating nested keys. |
//! | `AIRTABLE_API_KEY` | *(none)* | Bearer token used when `remote.api_key` is unset. |
//! | `RUST_LOG` | `tablegate_gateway=info` | Log filter directives. |

use std::process::ExitCode;
use tablegate_gateway::backend::{AirtableBackend, InMemoryBackend};
use tablegate_gateway::server::GatewayServer;
use tablegate_kernel::{BackendKind, GatewaySettings};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tablegate_gateway=info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::var("TABLEGATE_CONFIG").ok();
    let mut settings = match GatewaySettings::load(config_path.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("failed to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(settings.log_json);

    if settings.remote.api_key.is_empty() {
        settings.remote.api_key = std::env::var("AIRTABLE_API_KEY").unwrap_or_default();
    }

    info!(
        addr = %settings.listen_addr(),
        backend = ?settings.backend,
        remote = %settings.remote.base_url,
        request_timeout_ms = settings.request_timeout_ms,
        "tablegate configuration loaded"
    );

    let server = match settings.backend {
        BackendKind::Airtable => {
            if settings.remote.api_key.is_empty() {
                warn!("no remote API key configured; outbound calls will be unauthenticated");
            }
            match AirtableBackend::from_settings(&settings.remote) {
                Ok(backend) => GatewayServer::new(settings, backend),
                Err(e) => {
                    error!(error = %e, "failed to build remote backend");
                    return ExitCode::FAILURE;
                }
            }
        }
        BackendKind::Memory => GatewayServer::new(settings, InMemoryBackend::new()),
    };

    if let Err(e) = server.start().await {
        error!(error = %e, "gateway error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
