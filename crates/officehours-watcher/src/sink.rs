//! Destinations for open-state change events.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, WatcherError};
use crate::event::OpenChangeEvent;

/// Receives open-state change events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: &OpenChangeEvent) -> Result<()>;
}

/// Posts events as JSON to an external event service.
#[derive(Debug, Clone)]
pub struct HttpEventSink {
    client: reqwest::Client,
    url: String,
}

impl HttpEventSink {
    /// Request timeout for event delivery.
    pub const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("office-hours/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Self::TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn publish(&self, event: &OpenChangeEvent) -> Result<()> {
        let response = self.client.post(&self.url).json(event).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WatcherError::Rejected(format!(
                "{} responded with {}",
                self.url, status
            )));
        }

        tracing::debug!(url = %self.url, "Published open state change");
        Ok(())
    }
}

/// Writes events to the log. Used when no event service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

#[async_trait]
impl EventSink for LogEventSink {
    async fn publish(&self, event: &OpenChangeEvent) -> Result<()> {
        tracing::info!(
            is_open = event.is_open,
            office_hour = event.office_hour.as_ref().and_then(|r| r.id()).unwrap_or("-"),
            changed_at = %event.changed_at,
            "Open state changed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_http_sink_keeps_url() {
        let sink = HttpEventSink::new("http://events.local/api/events").unwrap();
        assert_eq!(sink.url(), "http://events.local/api/events");
    }

    #[tokio::test]
    async fn test_log_sink_never_fails() {
        let event = OpenChangeEvent::new(false, None, Utc::now());
        assert!(LogEventSink.publish(&event).await.is_ok());
    }
}
