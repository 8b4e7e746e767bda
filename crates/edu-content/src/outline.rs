//! AI-drafted course outlines.
//!
//! The admin console asks an [`OutlineGenerator`] for a chapter plan given a
//! course title and category. The production generator calls the Gemini
//! `generateContent` endpoint with a fixed response schema; tests plug in
//! their own implementation.
//!
//! A failed generation is reported as a single error. There is no retry and
//! no partial outline.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::error::{LlmErrorKind, Result, SiteError};

/// Fewest chapters an outline may have.
pub const MIN_CHAPTERS: usize = 5;

/// Category used when the operator leaves it blank.
pub const DEFAULT_CATEGORY: &str = "General";

// ============================================================================
// Outline types
// ============================================================================

/// One chapter of a drafted outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter heading.
    pub chapter: String,
    /// One or two sentences on what the chapter covers.
    pub description: String,
}

/// A drafted course outline, in chapter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    /// Ordered chapters.
    pub outline: Vec<Chapter>,
}

/// Matches a reply wrapped in a markdown code fence.
static FENCED_JSON: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").ok());

impl Outline {
    /// Parses the generator's text reply.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::OutlineMalformed`] if the text is not an outline
    /// object and [`SiteError::OutlineTooShort`] if it has too few chapters.
    pub fn parse(text: &str) -> Result<Self> {
        let body = FENCED_JSON
            .as_ref()
            .and_then(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map_or(text, |m| m.as_str());

        let outline: Self =
            serde_json::from_str(body).map_err(|e| SiteError::outline_malformed(e.to_string()))?;
        outline.validated()
    }

    /// Checks the chapter count.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::OutlineTooShort`] below [`MIN_CHAPTERS`].
    pub fn validated(self) -> Result<Self> {
        if self.outline.len() < MIN_CHAPTERS {
            return Err(SiteError::OutlineTooShort {
                count: self.outline.len(),
                min: MIN_CHAPTERS,
            });
        }
        Ok(self)
    }

    /// Returns the number of chapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outline.len()
    }

    /// Returns `true` if there are no chapters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outline.is_empty()
    }
}

// ============================================================================
// Requests
// ============================================================================

/// A validated outline request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineRequest {
    title: String,
    category: String,
}

impl OutlineRequest {
    /// Builds a request. A blank category becomes [`DEFAULT_CATEGORY`].
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::EmptyOutlineTitle`] if `title` is blank.
    pub fn new(title: &str, category: &str) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SiteError::EmptyOutlineTitle);
        }
        let category = match category.trim() {
            "" => DEFAULT_CATEGORY,
            c => c,
        };
        Ok(Self {
            title: title.to_string(),
            category: category.to_string(),
        })
    }

    /// Course title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Course category.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Renders the instruction sent to the model.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            "You are planning a course for an educational center.\n\
             Course title: {title}\n\
             Category: {category}\n\n\
             Write a course outline of at least {MIN_CHAPTERS} chapters in the same \
             language as the course title. For every chapter give a short heading \
             and a one or two sentence description.",
            title = self.title,
            category = self.category,
        )
    }
}

/// Produces course outlines.
#[async_trait]
pub trait OutlineGenerator: Send + Sync + fmt::Debug {
    /// Drafts an outline for `request`.
    async fn generate(&self, request: &OutlineRequest) -> Result<Outline>;
}

/// Validates the input, asks `generator` once and checks the reply.
///
/// A blank title fails before any request is made.
///
/// # Errors
///
/// Returns [`SiteError::EmptyOutlineTitle`] for a blank title, or the
/// generator's error.
pub async fn draft_outline(
    generator: &dyn OutlineGenerator,
    title: &str,
    category: &str,
) -> Result<Outline> {
    let request = OutlineRequest::new(title, category)?;
    let outline = generator.generate(&request).await?.validated()?;
    info!(
        title = %request.title(),
        chapters = outline.len(),
        "Course outline drafted"
    );
    Ok(outline)
}

// ============================================================================
// Gemini client
// ============================================================================

/// Settings for [`GeminiOutlineClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key; an empty key fails every request as an authentication error.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Base endpoint URL.
    pub endpoint: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

/// Schema the model must answer with.
fn outline_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "outline": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "chapter": {"type": "STRING"},
                        "description": {"type": "STRING"}
                    },
                    "required": ["chapter", "description"]
                }
            }
        },
        "required": ["outline"]
    })
}

/// [`OutlineGenerator`] backed by the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiOutlineClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiOutlineClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::LlmApiError`] if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SiteError::llm_api_error(LlmErrorKind::Other, e.to_string()))?;
        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn body(&self, request: &OutlineRequest) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": request.prompt()}]
            }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "responseMimeType": "application/json",
                "responseSchema": outline_schema()
            }
        })
    }
}

#[async_trait]
impl OutlineGenerator for GeminiOutlineClient {
    #[instrument(skip(self, request), fields(title = %request.title(), model = %self.config.model))]
    async fn generate(&self, request: &OutlineRequest) -> Result<Outline> {
        if self.config.api_key.trim().is_empty() {
            return Err(SiteError::llm_api_error(
                LlmErrorKind::Authentication,
                "no AI API key configured",
            ));
        }

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| SiteError::llm_api_error(LlmErrorKind::Network, e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SiteError::llm_api_error(LlmErrorKind::Network, e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            let kind = LlmErrorKind::from_status(status.as_u16());
            warn!(status = status.as_u16(), kind = %kind, "Outline request rejected");
            return Err(SiteError::llm_api_error(kind, message));
        }

        let parsed: GeminiResponse =
            serde_json::from_str(&text).map_err(|e| SiteError::outline_malformed(e.to_string()))?;
        let reply: String = parsed
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if reply.trim().is_empty() {
            return Err(SiteError::outline_malformed("reply contained no text"));
        }

        debug!(bytes = reply.len(), "Outline reply received");
        Outline::parse(&reply)
    }
}
