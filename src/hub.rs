// Outbound side of WebSub: asking the hub to (re)subscribe our callback to
// the topic. The hub answers asynchronously by calling the callback with a
// verification GET, which `handlers::websub` serves.
use reqwest::{StatusCode, redirect};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("hub subscribe status {}: {body}", .status.as_u16())]
    Status { status: StatusCode, body: String },

    #[error("hub subscribe request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Form body of a subscribe request, encoded with the `hub.*` field names.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubscriptionRequest {
    #[serde(rename = "hub.mode")]
    pub mode: &'static str,
    #[serde(rename = "hub.topic")]
    pub topic: String,
    #[serde(rename = "hub.callback")]
    pub callback: String,
    #[serde(rename = "hub.verify")]
    pub verify: &'static str,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: String,
}

impl SubscriptionRequest {
    pub fn subscribe(topic: &str, callback: &str, verify_token: &str) -> Self {
        SubscriptionRequest {
            mode: "subscribe",
            topic: topic.to_string(),
            callback: callback.to_string(),
            verify: "async",
            verify_token: verify_token.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct HubClient {
    http: reqwest::Client,
    hub_url: String,
}

impl HubClient {
    /// Redirects are not followed: a 3xx from the hub is reported as a
    /// failed subscribe rather than silently re-posted elsewhere.
    pub fn new(hub_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().redirect(redirect::Policy::none()).build()?;
        Ok(HubClient { http, hub_url: hub_url.into() })
    }

    pub fn hub_url(&self) -> &str {
        &self.hub_url
    }

    /// Send one subscribe request. Any status >= 300 is an error carrying the
    /// status and the response body text.
    pub async fn subscribe(&self, req: &SubscriptionRequest) -> Result<(), SubscribeError> {
        let resp = self.http.post(&self.hub_url).form(req).send().await?;
        let status = resp.status();
        // body only matters for the error message
        let body = resp.text().await.unwrap_or_default();
        if status.as_u16() >= 300 {
            return Err(SubscribeError::Status { status, body });
        }
        Ok(())
    }
}
