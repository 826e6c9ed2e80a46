//! Presence publishing boundary.
//!
//! The engine pushes each tick's computed presence through a
//! [`PresencePublisher`]. Publishing is best-effort against a remote service
//! that may rate-limit or drop out; failures are reported to the engine,
//! which logs them and keeps rotating.

use crate::emoji::EmojiPresentation;
use crate::{Result, StatusCycleError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Request timeout for presence updates; well under the minimum rotation
/// interval so a hung request cannot overlap the next tick.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Activity type code for a custom status.
const CUSTOM_STATUS_TYPE: u8 = 4;

/// Applies a computed presence as the externally visible status.
#[async_trait]
pub trait PresencePublisher: Send + Sync {
    async fn publish(&self, text: &str, emoji: Option<&EmojiPresentation>) -> Result<()>;
}

/// Wire payload for a presence update.
#[derive(Debug, Serialize)]
pub struct PresenceUpdate {
    pub status: &'static str,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Serialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: u8,
    pub state: String,
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<EmojiPresentation>,
}

/// Build the custom-status presence payload for one frame.
pub fn custom_status_payload(text: &str, emoji: Option<&EmojiPresentation>) -> PresenceUpdate {
    PresenceUpdate {
        status: "online",
        activities: vec![Activity {
            kind: CUSTOM_STATUS_TYPE,
            state: text.to_string(),
            name: "Custom Status",
            emoji: emoji.cloned(),
        }],
    }
}

/// Publishes presence updates over HTTP to the chat service.
pub struct HttpPresencePublisher {
    client: Client,
    endpoint: String,
    token: String,
}

impl HttpPresencePublisher {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl PresencePublisher for HttpPresencePublisher {
    async fn publish(&self, text: &str, emoji: Option<&EmojiPresentation>) -> Result<()> {
        let payload = custom_status_payload(text, emoji);
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", &self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| StatusCycleError::Publish(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StatusCycleError::Publish(format!(
                "presence endpoint returned {}",
                response.status()
            )));
        }

        debug!("Published presence: {:?}", text);
        Ok(())
    }
}

/// Logs the would-be update instead of sending it; lets the rotator run
/// without credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunPublisher;

#[async_trait]
impl PresencePublisher for DryRunPublisher {
    async fn publish(&self, text: &str, emoji: Option<&EmojiPresentation>) -> Result<()> {
        match emoji {
            Some(e) => info!("(dry run) status: {:?} emoji: {}", text, e.name),
            None => info!("(dry run) status: {:?}", text),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_payload_shape_without_emoji() {
        let payload = serde_json::to_value(custom_status_payload("hello", None)).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({
                "status": "online",
                "activities": [{
                    "type": 4,
                    "state": "hello",
                    "name": "Custom Status"
                }]
            })
        );
    }

    #[test]
    fn test_payload_shape_with_custom_emoji() {
        let emoji = EmojiPresentation::custom("spin", "42", true);
        let payload = serde_json::to_value(custom_status_payload("hi", Some(&emoji))).unwrap();
        assert_eq!(
            payload["activities"][0]["emoji"],
            serde_json::json!({"name": "spin", "id": "42", "animated": true})
        );
    }

    #[tokio::test]
    async fn test_dry_run_always_succeeds() {
        let publisher = DryRunPublisher;
        publisher.publish("anything", None).await.unwrap();
    }
}
