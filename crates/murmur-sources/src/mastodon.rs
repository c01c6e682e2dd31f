//! Mastodon mentions feed and status publisher.

use crate::error::{SourceError, SourceResult};
use async_trait::async_trait;
use murmur_config::MastodonConfig;
use murmur_core::{InteractionKind, MentionsFeed, Notification, Publisher};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for a Mastodon instance's REST API.
#[derive(Clone)]
pub struct MastodonClient {
    client: Client,
    base_url: String,
    access_token: String,
    fetch_limit: usize,
}

/// One entry from `/api/v1/notifications`.
#[derive(Debug, Clone, Deserialize)]
struct ApiNotification {
    #[serde(rename = "type")]
    kind: String,
    status: Option<ApiStatus>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiStatus {
    id: String,
    content: String,
    in_reply_to_id: Option<String>,
    account: ApiAccount,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiAccount {
    acct: String,
}

#[derive(Debug, Clone, Serialize)]
struct PostStatusRequest {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_reply_to_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PostStatusResponse {
    id: String,
}

impl MastodonClient {
    /// Create a new client from configuration. The access token is
    /// resolved from the configured environment variable.
    pub fn from_config(config: &MastodonConfig) -> SourceResult<Self> {
        let access_token = config.access_token().unwrap_or_default();
        Self::new(config.base_url.as_str(), access_token, config.fetch_limit)
    }

    /// Create a new client with explicit settings.
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        fetch_limit: usize,
    ) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(SourceError::Http)?;

        let base_url = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            fetch_limit,
        })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> SourceError {
        if e.is_connect() {
            SourceError::Unreachable {
                base_url: self.base_url.clone(),
            }
        } else if e.is_timeout() {
            SourceError::Timeout {
                seconds: REQUEST_TIMEOUT_SECS,
            }
        } else {
            SourceError::Http(e)
        }
    }

    /// Fetch recent mention notifications, in feed order.
    pub async fn fetch_mentions(&self) -> SourceResult<Vec<Notification>> {
        let url = format!("{}/api/v1/notifications", self.base_url);
        debug!("Fetching up to {} notifications", self.fetch_limit);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("limit", self.fetch_limit.to_string())])
            .query(&[
                ("exclude_types[]", "follow"),
                ("exclude_types[]", "favourite"),
                ("exclude_types[]", "reblog"),
                ("exclude_types[]", "poll"),
            ])
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let notifications: Vec<ApiNotification> = response.json().await?;

        let mentions = notifications
            .into_iter()
            .filter(|n| n.kind == "mention")
            .filter_map(|n| n.status)
            .map(|status| {
                let kind = if status.in_reply_to_id.is_some() {
                    InteractionKind::Reply
                } else {
                    InteractionKind::Mention
                };
                Notification {
                    external_id: status.id,
                    kind,
                    author: status.account.acct,
                    content: strip_html(&status.content),
                    in_reply_to: status.in_reply_to_id,
                }
            })
            .collect();

        Ok(mentions)
    }

    /// Post a status, optionally as a reply. Returns the new status id.
    pub async fn post_status(
        &self,
        text: &str,
        in_reply_to: Option<&str>,
    ) -> SourceResult<String> {
        let url = format!("{}/api/v1/statuses", self.base_url);
        debug!("Posting status (reply to: {:?})", in_reply_to);

        let request = PostStatusRequest {
            status: text.to_string(),
            in_reply_to_id: in_reply_to.map(str::to_string),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let posted: PostStatusResponse = response.json().await?;
        Ok(posted.id)
    }
}

/// Strip HTML tags from status content. Mastodon statuses arrive as HTML;
/// the generation prompt wants plain text.
fn strip_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_tag = false;

    for c in content.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }

    out.trim().to_string()
}

#[async_trait]
impl MentionsFeed for MastodonClient {
    async fn fetch_notifications(&self) -> murmur_core::Result<Vec<Notification>> {
        self.fetch_mentions()
            .await
            .map_err(|e| murmur_core::Error::SourceUnavailable(e.to_string()))
    }
}

#[async_trait]
impl Publisher for MastodonClient {
    async fn publish(&self, text: &str, in_reply_to: Option<&str>) -> murmur_core::Result<String> {
        self.post_status(text, in_reply_to)
            .await
            .map_err(|e| murmur_core::Error::PublishFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Hello <span class=\"h-card\">@murmur</span> world</p>"),
            "Hello @murmur world"
        );
        assert_eq!(strip_html("no tags here"), "no tags here");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_notification_parsing() {
        let raw = r#"[
            {
                "type": "mention",
                "status": {
                    "id": "109",
                    "content": "<p>love the sourdough!</p>",
                    "in_reply_to_id": null,
                    "account": {"acct": "ada@example.social"}
                }
            },
            {"type": "follow", "status": null}
        ]"#;

        let parsed: Vec<ApiNotification> = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].kind, "mention");
        assert_eq!(
            parsed[0].status.as_ref().unwrap().account.acct,
            "ada@example.social"
        );
    }
}
