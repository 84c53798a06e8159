// SPDX-License-Identifier: AGPL-3.0-only
use crate::config::{Args, LogFormat};
use crate::metrics::PrometheusMetrics;
use crate::server::{RejectingHandler, serve_legacy};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::fmt::time::UtcTime;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let builder = tracing_subscriber::fmt().with_timer(UtcTime::rfc_3339());
    match args.log_format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }

    let secret = args.shared_secret()?;
    let config = args.crypter_config()?;
    let metrics = Arc::new(PrometheusMetrics::new().context("registering metrics")?);
    let handler = Arc::new(RejectingHandler::new(args.reject_message.clone()));
    info!(
        max_body_length = config.max_body_length,
        proxy = config.proxy,
        "starting legacy listener"
    );

    let serve = serve_legacy(args.listen, secret, config, metrics.clone(), handler);
    tokio::select! {
        result = serve => {
            if let Err(err) = &result {
                error!(error = ?err, "legacy listener stopped");
            }
            result
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for shutdown signal")?;
            info!("shutting down");
            print!("{}", metrics.encode());
            Ok(())
        }
    }
}

mod config;
mod metrics;
mod server;
