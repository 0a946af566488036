// Prometheus counters shared by the handlers and the renewer. Counters are
// atomic internally, so `Metrics` is cloned freely and never locked.
use prometheus::{IntCounter, Registry};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    pub verifications: IntCounter,
    pub verifications_rejected: IntCounter,
    pub notifications: IntCounter,
    pub notification_bytes: IntCounter,
    pub subscribe_attempts: IntCounter,
    pub subscribe_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let counter = |name: &str, help: &str| -> anyhow::Result<IntCounter> {
            let c = IntCounter::new(name, help)?;
            registry.register(Box::new(c.clone()))?;
            Ok(c)
        };

        let verifications = counter("websub_verifications_total", "Hub verification requests answered with the challenge")?;
        let verifications_rejected = counter("websub_verifications_rejected_total", "Hub verification requests rejected for a bad verify_token")?;
        let notifications = counter("websub_notifications_total", "Notification deliveries received")?;
        let notification_bytes = counter("websub_notification_bytes_total", "Bytes of notification payload received")?;
        let subscribe_attempts = counter("websub_subscribe_attempts_total", "Subscribe requests sent to the hub")?;
        let subscribe_failures = counter("websub_subscribe_failures_total", "Subscribe requests that failed")?;

        Ok(Metrics {
            registry: Arc::new(registry),
            verifications,
            verifications_rejected,
            notifications,
            notification_bytes,
            subscribe_attempts,
            subscribe_failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};

    #[test]
    fn test_counters_registered_and_exported() {
        let m = Metrics::new().unwrap();
        m.notifications.inc();
        m.notification_bytes.inc_by(42);

        let mut buf = Vec::new();
        TextEncoder::new().encode(&m.registry.gather(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("websub_notifications_total 1"));
        assert!(text.contains("websub_notification_bytes_total 42"));
        assert!(text.contains("websub_subscribe_failures_total 0"));
    }

    #[test]
    fn test_independent_registries() {
        // each instance owns its registry, so building twice must not collide
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.verifications.inc();
        assert_eq!(a.verifications.get(), 1);
        assert_eq!(b.verifications.get(), 0);
    }
}
