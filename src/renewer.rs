// Subscription renewer. Subscribes once at startup, then again every
// `interval`. The hub-granted lease is ignored; the fixed cadence is the
// whole renewal policy.
use crate::hub::{HubClient, SubscriptionRequest};
use crate::metrics::Metrics;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct Renewer {
    pub client: HubClient,
    pub topic: String,
    pub callback: String,
    pub verify_token: String,
    pub interval: Duration,
    pub metrics: Metrics,
}

impl Renewer {
    /// Run until `shutdown` is cancelled. Never returns an error: a failed
    /// subscribe is logged and the next attempt waits for the next tick.
    pub async fn run(self, shutdown: CancellationToken) {
        loop {
            let req = SubscriptionRequest::subscribe(&self.topic, &self.callback, &self.verify_token);
            self.metrics.subscribe_attempts.inc();

            let outcome = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                res = self.client.subscribe(&req) => res,
            };

            // Log and continue. No retry before the next cycle.
            match outcome {
                Ok(()) => tracing::info!(topic = %self.topic, hub = self.client.hub_url(), "subscribe OK"),
                Err(e) => {
                    self.metrics.subscribe_failures.inc();
                    tracing::error!(topic = %self.topic, error = %e, "subscribe error");
                }
            }

            if let Ok(d) = chrono::Duration::from_std(self.interval) {
                tracing::debug!(next_at = %(chrono::Utc::now() + d), "next subscription renewal scheduled");
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        tracing::info!("renewer stopped");
    }
}
