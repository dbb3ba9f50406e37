// 📣 Webhook Delivery - Discord-style embeds, one message at a time
// The destination rate-limits bursts, so deliveries are paced.

use crate::classifier::Notification;
use crate::profile::{Profile, ProfileLookup};
use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_secs(3);

// ============================================================================
// PAYLOAD MODEL
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// ISO-8601
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<bool>,
}

impl Notification {
    /// One embed carrying the title, color and whatever the profile knows
    pub fn to_payload(&self, profile: &Profile) -> WebhookPayload {
        let fields = profile
            .age
            .map(|age| EmbedField {
                name: "Age".to_string(),
                value: age.to_string(),
                inline: None,
            })
            .into_iter()
            .collect();

        WebhookPayload {
            embeds: vec![Embed {
                title: Some(self.title.clone()),
                description: profile.description.clone(),
                timestamp: Some(Utc::now().to_rfc3339()),
                color: Some(self.color.value()),
                image: profile.image_url.clone().map(|url| EmbedImage { url }),
                fields,
                ..Embed::default()
            }],
            ..WebhookPayload::default()
        }
    }
}

// ============================================================================
// NOTIFIER
// ============================================================================

pub trait Notifier {
    fn post(&self, payload: &WebhookPayload) -> Result<()>;
}

/// Deliver every notification in order, pausing `interval` between posts.
///
/// Stops at the first failed post; messages already sent stay sent.
/// Returns how many were delivered.
pub fn deliver_all(
    notifier: &dyn Notifier,
    profiles: &dyn ProfileLookup,
    notifications: &[Notification],
    interval: Duration,
) -> Result<usize> {
    if notifications.is_empty() {
        debug!("no notifications to post");
        return Ok(0);
    }

    for (i, notification) in notifications.iter().enumerate() {
        if i > 0 && !interval.is_zero() {
            thread::sleep(interval);
        }

        let profile = match &notification.image_handle {
            Some(handle) => profiles.lookup(handle),
            None => Profile::default(),
        };

        if let Err(err) = notifier.post(&notification.to_payload(&profile)) {
            warn!(title = %notification.title, delivered = i, "failed post request");
            return Err(err);
        }
        debug!(title = %notification.title, "posted");
    }

    info!(count = notifications.len(), "all notifications posted");
    Ok(notifications.len())
}

#[cfg(feature = "net")]
pub use http::WebhookNotifier;

#[cfg(feature = "net")]
mod http {
    use super::{Notifier, WebhookPayload};
    use crate::error::SyncError;
    use anyhow::{Context, Result};
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(10);

    pub struct WebhookNotifier {
        url: String,
        http: reqwest::blocking::Client,
    }

    impl WebhookNotifier {
        pub fn new(url: impl Into<String>) -> Result<Self> {
            let http = reqwest::blocking::Client::builder()
                .timeout(TIMEOUT)
                .build()
                .context("Failed to create HTTP client")?;
            Ok(WebhookNotifier { url: url.into(), http })
        }
    }

    impl Notifier for WebhookNotifier {
        fn post(&self, payload: &WebhookPayload) -> Result<()> {
            let response = self
                .http
                .post(&self.url)
                .json(payload)
                .send()
                .context("Failed to send webhook request")?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().unwrap_or_default();
                return Err(SyncError::Delivery { status: status.as_u16(), body }.into());
            }
            Ok(())
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
