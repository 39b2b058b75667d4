//! Gemini Client: the single point of entry for all Gemini API calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini API directly.
//! All generative calls MUST go through this module.
//!
//! Model: gemini-2.5-flash (hardcoded, not configurable)
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod prompts;
pub mod recovery;

use recovery::recover_truncated_json;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
/// The model used for every call. Intentionally hardcoded.
pub const MODEL: &str = "gemini-2.5-flash";
/// Output ceiling for the structured-extraction calls.
pub const EXTRACTION_MAX_TOKENS: u32 = 65536;
/// Default output ceiling for free generation when the caller gives none.
pub const DEFAULT_GENERATION_MAX_TOKENS: u32 = 32768;
const EXTRACTION_TEMPERATURE: f32 = 0.1;
const GENERATION_TEMPERATURE: f32 = 0.7;
const JSON_MIME_TYPE: &str = "application/json";
const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini API key is not configured")]
    MissingApiKey,

    #[error("Failed to reach Gemini API: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Content blocked by Gemini safety filters (reason: {reason})")]
    ContentBlocked { reason: String },

    #[error("Response truncated: the output token limit was reached before generation finished")]
    Truncated,

    #[error("Gemini returned an empty response")]
    EmptyResponse,

    #[error("Failed to parse Gemini response as JSON: {0}")]
    Parse(String),
}

/// What to do when the provider stops because it hit the token ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxTokensPolicy {
    /// Keep the partial text; JSON recovery gets a chance at it.
    Tolerate,
    /// Fail the call with `GeminiError::Truncated`.
    Reject,
}

/// Per-call generation settings.
#[derive(Debug, Clone, Copy)]
pub struct CallOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub on_max_tokens: MaxTokensPolicy,
}

impl CallOptions {
    pub fn extraction() -> Self {
        Self {
            temperature: EXTRACTION_TEMPERATURE,
            max_output_tokens: EXTRACTION_MAX_TOKENS,
            on_max_tokens: MaxTokensPolicy::Tolerate,
        }
    }

    pub fn generation(max_output_tokens: u32) -> Self {
        Self {
            temperature: GENERATION_TEMPERATURE,
            max_output_tokens,
            on_max_tokens: MaxTokensPolicy::Reject,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request envelope
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Document {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Response envelope
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

/// Why the provider stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
}

impl GenerateContentResponse {
    /// Text of the first candidate, with all of its text parts joined.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn finish_reason(&self) -> Option<&FinishReason> {
        self.candidates.first()?.finish_reason.as_ref()
    }

    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref()?.block_reason.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The single Gemini client shared by all handlers.
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Result<Self, GeminiError> {
        Ok(Self {
            client: Client::builder().build()?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, MODEL)
    }

    /// Makes one call to the Gemini API and returns the completion text.
    /// `pdf_base64`, when present, is sent as an inline `application/pdf` part.
    pub async fn generate_text(
        &self,
        prompt: &str,
        pdf_base64: Option<&str>,
        options: &CallOptions,
    ) -> Result<String, GeminiError> {
        let api_key = self.api_key.as_deref().ok_or(GeminiError::MissingApiKey)?;

        let mut parts = Vec::with_capacity(2);
        if let Some(data) = pdf_base64 {
            parts.push(RequestPart::Document {
                inline_data: InlineData {
                    mime_type: PDF_MIME_TYPE,
                    data,
                },
            });
        }
        parts.push(RequestPart::Text { text: prompt });

        let request_body = GenerateContentRequest {
            contents: vec![RequestContent { role: "user", parts }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
                response_mime_type: JSON_MIME_TYPE,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}: {}", status, body);
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GeminiError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &envelope.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, output_tokens={}, total_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        completion_text(envelope, options.on_max_tokens)
    }

    /// Extraction call: sends the PDF with a low temperature and parses the
    /// completion as JSON, falling back to truncated-JSON recovery.
    pub async fn extract_json(&self, prompt: &str, pdf_base64: &str) -> Result<Value, GeminiError> {
        let text = self
            .generate_text(prompt, Some(pdf_base64), &CallOptions::extraction())
            .await?;
        parse_model_json(&text)
    }

    /// Free generation from a system/user prompt pair. Returns raw text.
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_output_tokens: u32,
    ) -> Result<String, GeminiError> {
        let prompt = format!("{system_prompt}\n\n{user_prompt}");
        self.generate_text(&prompt, None, &CallOptions::generation(max_output_tokens))
            .await
    }
}

/// Applies the completion-reason checks and pulls out the text.
fn completion_text(
    envelope: GenerateContentResponse,
    on_max_tokens: MaxTokensPolicy,
) -> Result<String, GeminiError> {
    if let Some(reason) = envelope.block_reason() {
        return Err(GeminiError::ContentBlocked {
            reason: reason.to_string(),
        });
    }

    match envelope.finish_reason() {
        Some(FinishReason::Safety) => {
            return Err(GeminiError::ContentBlocked {
                reason: "SAFETY".to_string(),
            })
        }
        Some(FinishReason::MaxTokens) => match on_max_tokens {
            MaxTokensPolicy::Reject => return Err(GeminiError::Truncated),
            MaxTokensPolicy::Tolerate => {
                warn!("Gemini stopped at the output token limit; response may be truncated")
            }
        },
        _ => {}
    }

    envelope.text().ok_or(GeminiError::EmptyResponse)
}

/// Strips fences, parses strictly, and only then tries recovery.
pub fn parse_model_json(text: &str) -> Result<Value, GeminiError> {
    let text = strip_json_fences(text);

    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("Gemini response is not valid JSON ({e}); attempting recovery");
            match recover_truncated_json(text) {
                Some(value) => {
                    info!("Recovered truncated JSON response");
                    Ok(value)
                }
                None => Err(GeminiError::Parse(e.to_string())),
            }
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
/// The language tag is matched in any case. Either fence may be missing, as
/// happens when the output is cut short.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let text = match text.strip_prefix("```") {
        Some(rest) => match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        },
        None => text,
    }
    .trim_start();
    text.strip_suffix("```").unwrap_or(text).trim()
}
