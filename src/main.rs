#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use clap::Parser;
use remote_write_proxy::config::{ProxyConfig, cli::Cli};
use remote_write_proxy::http::server::run_http_server;
use remote_write_proxy::http::state::HttpServerState;
use remote_write_proxy::proxy::RemoteWriteProxy;
use remote_write_proxy::upstream::ReqwestUpstreamClient;
use std::sync::Arc;
use tracing::{error, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install CryptoProvider: {:?}", e))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Initialize tracing subscriber for HTTP request logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    // Load configuration, command line flags take precedence
    let config = ProxyConfig::load().context("Failed to load configuration")?;
    let config = Arc::new(cli.apply(config));
    config.validate().context("Invalid configuration")?;

    // Initialize Sentry if DSN is provided
    let _sentry = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let upstream =
        ReqwestUpstreamClient::new(&config).context("Failed to create the upstream client")?;
    info!("Forwarding remote writes to {}", upstream.endpoint());

    let state = HttpServerState {
        proxy: RemoteWriteProxy::new(Arc::new(upstream)),
    };

    let address = config.listen_address();
    info!("Starting HTTP server on {}", address);
    match run_http_server(state, &config, address).await {
        Ok(_) => {
            info!("HTTP server stopped gracefully");
            Ok(())
        }
        Err(err) => {
            error!("HTTP server failed: {}", err);
            sentry::integrations::anyhow::capture_anyhow(&err);
            Err(err)
        }
    }
}
