// `server.rs` composes the service: it builds the metrics registry, starts
// the subscription renewer in the background, and mounts the callback and
// operational routes.
use crate::{
    config::{CALLBACK_PATH, Config},
    handlers::{self, CallbackState},
    hub::HubClient,
    metrics::Metrics,
    renewer::Renewer,
};
use anyhow::Context;
use axum::{Extension, Router, routing::{any, get}};
use std::sync::Arc;
use tokio::task;
use tokio_util::sync::CancellationToken;

pub async fn run(config: Config) -> anyhow::Result<()> {
    let metrics = Metrics::new()?;
    let shutdown = CancellationToken::new();

    let renewer = Renewer {
        client: HubClient::new(config.hub_url.clone())?,
        topic: config.topic_url.clone(),
        callback: config.callback_url.clone(),
        verify_token: config.verify_token.clone(),
        interval: config.renew_interval,
        metrics: metrics.clone(),
    };
    let renewer_task = task::spawn(renewer.run(shutdown.clone()));

    let app = router(CallbackState {
        verify_token: Arc::from(config.verify_token.as_str()),
        metrics,
    });

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            // The renewer may already be talking to the hub; stop it before bailing.
            shutdown.cancel();
            return Err(e).with_context(|| format!("failed to bind {}", bind_addr));
        }
    };
    tracing::info!(addr = %bind_addr, callback = %config.callback_url, "listening");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("ctrl-c received, shutting down"),
                _ = signal.cancelled() => {}
            }
            signal.cancel();
        })
        .await
        .context("http server failed")?;

    shutdown.cancel();
    if let Err(e) = renewer_task.await {
        tracing::warn!(error = %e, "renewer task ended abnormally");
    }
    Ok(())
}

/// Build the HTTP app. `/websub` takes every method so the handler can answer
/// 405 itself (HEAD included, which a `get` route would otherwise serve).
pub fn router(state: CallbackState) -> Router {
    Router::new()
        .route(CALLBACK_PATH, any(handlers::websub))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/health", get(handlers::health))
        .layer(Extension(state.metrics.clone()))
        .layer(Extension(state))
}
