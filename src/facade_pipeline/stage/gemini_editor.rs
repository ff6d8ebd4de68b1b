//! `ImageEditor` backed by the Gemini `generateContent` REST endpoint.
//!
//! The instruction goes first as a text part, the image second as an inline
//! base64 part, and the model is asked to answer with both text and image.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::{ApiKey, PipelineConfig};
use crate::facade_pipeline::common::error::{FacadeError, Result};
use crate::facade_pipeline::stage::editor::{EditRequest, EditResponse, EditorError, ImageEditor};

/// Finish reasons that mean the model declined rather than failed.
const REFUSAL_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "PROHIBITED_CONTENT",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
    "IMAGE_RECITATION",
    "BLOCKLIST",
    "SPII",
    "RECITATION",
];

/// Model notes are echoed to the log, cut to this many characters.
const NOTE_LOG_CHARS: usize = 150;

pub struct GeminiEditor {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: ApiKey,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart<'a> {
    Text(&'a str),
    InlineData(InlineData),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: [&'static str; 2],
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    #[serde(alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiEditor {
    pub fn new(api_key: ApiKey, config: &PipelineConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| FacadeError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl ImageEditor for GeminiEditor {
    #[instrument(skip(self, request), fields(stage = %request.stage, model = %self.model, payload = request.payload.len()))]
    async fn edit(&self, request: EditRequest<'_>) -> std::result::Result<EditResponse, EditorError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::Text(request.instruction),
                    RequestPart::InlineData(InlineData {
                        mime_type: request.mime_type.to_string(),
                        data: STANDARD.encode(request.payload),
                    }),
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["TEXT", "IMAGE"],
            },
        };

        debug!("Sending request to {}", self.url());
        let resp = self
            .http
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| EditorError::Malformed(format!("response parse failed: {e}")))?;

        let response = interpret_response(parsed)?;
        for note in &response.notes {
            info!(stage = %request.stage, "Model says: {}", truncate(note, NOTE_LOG_CHARS));
        }
        Ok(response)
    }
}

/// Only a timeout or a failed connect is worth a fresh request; TLS, redirect
/// and body errors fail the same way again.
fn send_error(e: reqwest::Error) -> EditorError {
    EditorError::Transport {
        reason: format!("request failed: {e}"),
        transient: e.is_timeout() || e.is_connect(),
    }
}

/// Maps a non-success HTTP status to an editor error.
pub(crate) fn status_error(status: StatusCode, body: &str) -> EditorError {
    let transient = status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error();
    EditorError::Transport {
        reason: format!("service returned {}: {}", status, truncate(body, 500)),
        transient,
    }
}

/// Picks the first image part of the first candidate, or explains why there is none.
pub(crate) fn interpret_response(
    response: GenerateContentResponse,
) -> std::result::Result<EditResponse, EditorError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(EditorError::Refused(format!("prompt blocked: {reason}")));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| EditorError::Malformed("response contained no candidates".to_string()))?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if REFUSAL_FINISH_REASONS.contains(&reason) {
            return Err(EditorError::Refused(format!("generation stopped: {reason}")));
        }
    }

    let mut notes = Vec::new();
    let mut image = None;
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(text) = part.text {
            notes.push(text);
        } else if let Some(data) = part.inline_data {
            if image.is_none() {
                image = Some(data);
            }
        }
    }

    let data = image.ok_or_else(|| {
        let said = notes.first().map(|n| truncate(n, NOTE_LOG_CHARS)).unwrap_or_default();
        EditorError::Malformed(format!("response carried no image (model said: {said:?})"))
    })?;

    let payload = STANDARD
        .decode(data.data.as_bytes())
        .map_err(|e| EditorError::Malformed(format!("image payload is not valid base64: {e}")))?;

    Ok(EditResponse {
        mime_type: data.mime_type,
        payload,
        notes,
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
