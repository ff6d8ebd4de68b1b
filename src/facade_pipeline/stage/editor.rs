use async_trait::async_trait;
use thiserror::Error;

use crate::facade_pipeline::stage::spec::StageKind;

/// One request to the external image-editing capability.
#[derive(Debug, Clone, Copy)]
pub struct EditRequest<'a> {
    pub stage: StageKind,
    pub instruction: &'a str,
    pub mime_type: &'static str,
    pub payload: &'a [u8],
}

/// The encoded image the capability sent back, plus any text it attached.
#[derive(Debug, Clone, Default)]
pub struct EditResponse {
    pub mime_type: String,
    pub payload: Vec<u8>,
    pub notes: Vec<String>,
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("transport failure: {reason}")]
    Transport { reason: String, transient: bool },

    #[error("request refused: {0}")]
    Refused(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// `transform(image, instruction) -> image | error`, at the byte level.
///
/// Implementations make exactly one outbound call per `edit` and never retry.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    async fn edit(&self, request: EditRequest<'_>) -> Result<EditResponse, EditorError>;
}
