//! Notion document source.
//!
//! Fetches a page's metadata and block children and flattens the rich text
//! into plain text. The page's `last_edited_time` is used verbatim as the
//! opaque revision marker; it is only ever compared for equality.

use crate::error::{SourceError, SourceResult};
use async_trait::async_trait;
use murmur_config::NotionConfig;
use murmur_core::{DocumentSource, SourceDocument};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const NOTION_API_BASE: &str = "https://api.notion.com";
const NOTION_VERSION: &str = "2022-06-28";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for the Notion REST API.
#[derive(Clone)]
pub struct NotionSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NotionSource {
    /// Create a new source from configuration.
    pub fn from_config(config: &NotionConfig) -> SourceResult<Self> {
        let api_key = config.api_key().unwrap_or_default();
        Self::new(NOTION_API_BASE, api_key)
    }

    /// Create a new source with an explicit base URL (for testing).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(SourceError::Http)?;

        let base_url = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
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

    async fn get_json(&self, url: &str) -> SourceResult<Value> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
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

        Ok(response.json().await?)
    }

    /// Fetch page metadata and content.
    pub async fn fetch_page(&self, page_id: &str) -> SourceResult<SourceDocument> {
        debug!("Fetching Notion page {}", page_id);

        let page = self
            .get_json(&format!("{}/v1/pages/{}", self.base_url, page_id))
            .await?;

        let revision_marker = page
            .get("last_edited_time")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let title = extract_title(&page).unwrap_or_else(|| format!("Notion Page {}", page_id));

        let blocks = self
            .get_json(&format!("{}/v1/blocks/{}/children", self.base_url, page_id))
            .await?;

        let results = blocks
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| SourceError::Parse("blocks response missing 'results'".to_string()))?;

        let content = flatten_blocks(results);

        Ok(SourceDocument {
            revision_marker,
            title,
            content,
        })
    }
}

/// Pull the page title out of the properties map. Notion keys the title
/// property by user-chosen name, so we scan for `type == "title"`.
fn extract_title(page: &Value) -> Option<String> {
    let properties = page.get("properties")?.as_object()?;

    for prop in properties.values() {
        if prop.get("type").and_then(Value::as_str) == Some("title") {
            let title = prop
                .get("title")?
                .as_array()?
                .first()?
                .get("plain_text")?
                .as_str()?;
            return Some(title.to_string());
        }
    }

    None
}

/// Flatten block children into plain text, one line per rich-text run.
fn flatten_blocks(blocks: &[Value]) -> String {
    let mut lines = Vec::new();

    for block in blocks {
        let Some(block_type) = block.get("type").and_then(Value::as_str) else {
            continue;
        };

        let Some(rich_text) = block
            .get(block_type)
            .and_then(|b| b.get("rich_text"))
            .and_then(Value::as_array)
        else {
            continue;
        };

        for run in rich_text {
            if let Some(text) = run.get("plain_text").and_then(Value::as_str) {
                lines.push(text.to_string());
            }
        }
    }

    lines.join("\n")
}

#[async_trait]
impl DocumentSource for NotionSource {
    async fn fetch(&self, source_id: &str) -> murmur_core::Result<SourceDocument> {
        self.fetch_page(source_id)
            .await
            .map_err(|e| murmur_core::Error::SourceUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_title() {
        let page = json!({
            "properties": {
                "Name": {
                    "type": "title",
                    "title": [{"plain_text": "Brand Guide"}]
                },
                "Status": {"type": "select"}
            }
        });
        assert_eq!(extract_title(&page), Some("Brand Guide".to_string()));

        let empty = json!({"properties": {}});
        assert_eq!(extract_title(&empty), None);
    }

    #[test]
    fn test_flatten_blocks() {
        let blocks = vec![
            json!({
                "type": "paragraph",
                "paragraph": {"rich_text": [
                    {"plain_text": "First line."},
                    {"plain_text": "Second run."}
                ]}
            }),
            json!({"type": "divider", "divider": {}}),
            json!({
                "type": "heading_1",
                "heading_1": {"rich_text": [{"plain_text": "A heading"}]}
            }),
        ];

        let content = flatten_blocks(&blocks);
        assert_eq!(content, "First line.\nSecond run.\nA heading");
    }
}
