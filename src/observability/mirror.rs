//! Best-effort remote log mirror
//!
//! The device also ships its status lines to a remote sink so a fleet can be
//! watched without shelling into containers. Delivery is fire-and-forget: a
//! mirror failure must never slow down or abort the publish loop, so errors
//! are logged at debug and dropped. Ordering is only guaranteed within the
//! local sink, not across the two.

use serde_json::json;
use std::time::Duration;
use tracing::debug;

const MIRROR_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct LogMirror {
    url: String,
    stream: String,
    client: reqwest::Client,
}

impl LogMirror {
    pub fn new(url: impl Into<String>, stream: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stream: stream.into(),
            client: reqwest::Client::builder()
                .timeout(MIRROR_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Post one status line to the remote sink without waiting for it.
    pub fn record(&self, message: impl Into<String>) {
        let client = self.client.clone();
        let url = self.url.clone();
        let body = json!({
            "stream": self.stream,
            "timestamp_ms": chrono::Utc::now().timestamp_millis(),
            "message": message.into(),
        });
        tokio::spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(response) if !response.status().is_success() => {
                    debug!(status = %response.status(), "log mirror rejected status line");
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "log mirror unreachable"),
            }
        });
    }
}
