//! # Tag Suggestions
//!
//! Asks an OpenAI-compatible chat-completions service for topic tags when a
//! note is exported without any. The service is optional: a disabled client,
//! a missing API key, a network error, or an unexpected reply all produce an
//! empty tag list and a warning, never a failed export.
//!
//! ```no_run
//! use vaultpress_core::TagServiceConfig;
//! use vaultpress_tags::{OpenAiTagSuggester, TagExtractor};
//!
//! # async fn example() -> vaultpress_core::Result<()> {
//! let config = TagServiceConfig {
//!     api_key: "sk-...".to_string(),
//!     enabled: true,
//!     ..Default::default()
//! };
//! let suggester = OpenAiTagSuggester::new(config)?;
//! let tags = suggester.extract_tags("Notes on async Rust and tokio").await;
//! println!("{:?}", tags);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vaultpress_core::{Error, Result, TagServiceConfig};

pub const MAX_TAGS: usize = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str =
    "You are a tag extraction assistant. Extract relevant tags from the given content.";

const TAG_EXTRACTION_PROMPT: &str = "Given the following content, extract up to 10 relevant tags that best describe the main topics, technologies, concepts, or themes discussed.
Rules:
1. Return only the tags as a comma-separated list
2. Use lowercase for all tags
3. Replace spaces with hyphens in multi-word tags
4. Maximum 10 tags
5. No special characters except hyphens
6. No explanations, just the tags

Content:
";

const PROBE_MESSAGE: &str = "Hello! This is a test message.";

/// Source of tag suggestions for a note body
#[async_trait]
pub trait TagExtractor: Send + Sync {
    /// Suggested tags, at most [`MAX_TAGS`]. Failures yield an empty list.
    async fn extract_tags(&self, text: &str) -> Vec<String>;
}

/// Never suggests anything
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTagSuggester;

#[async_trait]
impl TagExtractor for DisabledTagSuggester {
    async fn extract_tags(&self, _text: &str) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Chat-completions client
#[derive(Debug, Clone)]
pub struct OpenAiTagSuggester {
    config: TagServiceConfig,
    client: reqwest::Client,
}

impl OpenAiTagSuggester {
    pub fn new(config: TagServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::tag_service(format!("HTTP client error: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &TagServiceConfig {
        &self.config
    }

    /// Send a one-line probe and report whether the service accepted it.
    ///
    /// Unlike [`TagExtractor::extract_tags`] this surfaces the failure,
    /// including the service's own error message when it sends one.
    pub async fn test_connection(&self) -> Result<()> {
        if self.config.api_key.trim().is_empty() {
            return Err(Error::tag_service("No API key configured"));
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: PROBE_MESSAGE.to_string(),
            }],
            temperature: None,
            max_tokens: None,
        };

        let resp = self.send(&request).await?;
        if resp.status().is_success() {
            log::info!("Tag service at {} is reachable", self.config.base_url);
            return Ok(());
        }

        let status = resp.status();
        let message = resp
            .json::<ErrorResponse>()
            .await
            .ok()
            .and_then(|e| e.error)
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Unknown error".to_string());
        Err(Error::tag_service(format!(
            "API connection failed ({}): {}",
            status, message
        )))
    }

    async fn request_tags(&self, text: &str) -> Result<Vec<String>> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("{}{}", TAG_EXTRACTION_PROMPT, text),
                },
            ],
            temperature: Some(0.3),
            max_tokens: Some(100),
        };

        let resp = self.send(&request).await?;
        if !resp.status().is_success() {
            return Err(Error::tag_service(format!(
                "API request failed: HTTP {}",
                resp.status()
            )));
        }

        let body: ChatResponse = resp
            .json()
            .await
            .map_err(|e| Error::tag_service(format!("JSON parse error: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::tag_service("Reply has no message content"))?;

        Ok(parse_tag_reply(&content))
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<reqwest::Response> {
        self.client
            .post(self.config.completions_url())
            .bearer_auth(self.config.api_key.trim())
            .json(request)
            .send()
            .await
            .map_err(|e| Error::tag_service(format!("Request failed: {}", e)))
    }
}

#[async_trait]
impl TagExtractor for OpenAiTagSuggester {
    #[tracing::instrument(skip_all, fields(model = %self.config.model))]
    async fn extract_tags(&self, text: &str) -> Vec<String> {
        if !self.config.enabled {
            return Vec::new();
        }
        if self.config.api_key.trim().is_empty() {
            log::warn!("Tag service is enabled but no API key is configured");
            return Vec::new();
        }

        match self.request_tags(text).await {
            Ok(tags) => {
                log::debug!("Tag service suggested {} tag(s)", tags.len());
                tags
            }
            Err(e) => {
                log::warn!("Tag extraction failed, continuing without tags: {}", e);
                Vec::new()
            }
        }
    }
}

/// Turn a comma-separated reply into tags: trimmed, lowercased, no empties,
/// at most [`MAX_TAGS`]
pub fn parse_tag_reply(raw: &str) -> Vec<String> {
    raw.trim()
        .split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .take(MAX_TAGS)
        .collect()
}
