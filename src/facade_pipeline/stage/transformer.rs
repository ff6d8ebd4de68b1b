use tracing::{debug, info, instrument};

use crate::facade_pipeline::common::Image;
use crate::facade_pipeline::common::error::{FacadeError, Result};
use crate::facade_pipeline::stage::codec::{TRANSPORT_MIME, decode_rgb, encode_png};
use crate::facade_pipeline::stage::editor::{EditRequest, EditResponse, EditorError, ImageEditor};
use crate::facade_pipeline::stage::spec::{StageKind, StageSpec};

/// One semantic transformation backed by a single external call.
///
/// The transformer owns no state beyond its spec; persistence and retry
/// belong to the caller.
pub struct StageTransformer<'a, E: ImageEditor> {
    editor: &'a E,
    spec: &'static StageSpec,
}

impl<'a, E: ImageEditor> StageTransformer<'a, E> {
    pub fn new(editor: &'a E, kind: StageKind) -> Self {
        Self {
            editor,
            spec: kind.spec(),
        }
    }

    #[instrument(skip(self, input), fields(stage = %self.spec.kind, version = self.spec.version, width = input.width(), height = input.height()))]
    pub async fn transform(&self, input: &Image) -> Result<Image> {
        let stage = self.spec.kind;
        if input.width() == 0 || input.height() == 0 {
            return Err(FacadeError::InvalidDimensions(input.width(), input.height()));
        }

        let payload = {
            let _span = tracing::debug_span!("encode_input").entered();
            encode_png(input)?
        };

        info!("Submitting {} stage request", stage);
        let response = self
            .editor
            .edit(EditRequest {
                stage,
                instruction: self.spec.instruction,
                mime_type: TRANSPORT_MIME,
                payload: &payload,
            })
            .await
            .map_err(|e| editor_failure(stage, e))?;

        let output = {
            let _span = tracing::debug_span!("validate_output").entered();
            validate(stage, input.dimensions(), &response)?
        };

        info!(
            width = output.width(),
            height = output.height(),
            "{} stage produced a valid image",
            stage
        );
        Ok(output)
    }
}

/// Structural gate between an untrusted response and the next stage.
///
/// Checks decodability and that dimensions match the input exactly; pixel
/// content is never compared because the service is not repeatable.
pub fn validate(stage: StageKind, expected: (u32, u32), response: &EditResponse) -> Result<Image> {
    debug!(mime = %response.mime_type, bytes = response.payload.len(), "Validating stage output");

    let image = decode_rgb(&response.payload).map_err(|e| FacadeError::StageOutputInvalid {
        stage,
        reason: e.to_string(),
    })?;

    if image.dimensions() != expected {
        return Err(FacadeError::StageOutputInvalid {
            stage,
            reason: format!(
                "expected {}x{}, received {}x{}",
                expected.0,
                expected.1,
                image.width(),
                image.height()
            ),
        });
    }

    Ok(image)
}

fn editor_failure(stage: StageKind, error: EditorError) -> FacadeError {
    match error {
        EditorError::Transport { reason, transient } => FacadeError::StageTransformFailed {
            stage,
            reason,
            transient,
        },
        EditorError::Refused(reason) => FacadeError::ContentRefused { stage, reason },
        EditorError::Malformed(reason) => FacadeError::StageOutputInvalid { stage, reason },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::Rgb;
    use std::sync::{Arc, Mutex};

    enum Behaviour {
        Echo,
        Resize(u32, u32),
        Garbage,
        Fail(fn() -> EditorError),
    }

    struct MockEditor {
        behaviour: Behaviour,
        requests: Arc<Mutex<Vec<(StageKind, String)>>>,
    }

    impl MockEditor {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl ImageEditor for MockEditor {
        async fn edit(&self, request: EditRequest<'_>) -> std::result::Result<EditResponse, EditorError> {
            self.requests
                .lock()
                .unwrap()
                .push((request.stage, request.instruction.to_string()));
            let payload = match &self.behaviour {
                Behaviour::Echo => request.payload.to_vec(),
                Behaviour::Resize(w, h) => {
                    encode_png(&Image::from_pixel(*w, *h, Rgb([1, 2, 3]))).unwrap()
                }
                Behaviour::Garbage => b"<html>oops</html>".to_vec(),
                Behaviour::Fail(make) => return Err(make()),
            };
            Ok(EditResponse {
                mime_type: "image/png".into(),
                payload,
                notes: Vec::new(),
            })
        }
    }

    fn photo() -> Image {
        Image::from_pixel(8, 6, Rgb([120, 110, 100]))
    }

    #[tokio::test]
    async fn test_output_keeps_input_dimensions() {
        let editor = MockEditor::new(Behaviour::Echo);
        let transformer = StageTransformer::new(&editor, StageKind::Clean);

        let output = transformer.transform(&photo()).await.unwrap();
        assert_eq!(output.dimensions(), (8, 6));
    }

    #[tokio::test]
    async fn test_sends_stage_instruction() {
        let editor = MockEditor::new(Behaviour::Echo);
        StageTransformer::new(&editor, StageKind::Mask)
            .transform(&photo())
            .await
            .unwrap();

        let requests = editor.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, StageKind::Mask);
        assert_eq!(requests[0].1, StageKind::Mask.spec().instruction);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_invalid_output() {
        let editor = MockEditor::new(Behaviour::Resize(16, 12));
        let result = StageTransformer::new(&editor, StageKind::Select)
            .transform(&photo())
            .await;

        match result {
            Err(FacadeError::StageOutputInvalid { stage, reason }) => {
                assert_eq!(stage, StageKind::Select);
                assert!(reason.contains("16x12"));
            }
            other => panic!("expected StageOutputInvalid, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_invalid_output() {
        let editor = MockEditor::new(Behaviour::Garbage);
        let result = StageTransformer::new(&editor, StageKind::Mask)
            .transform(&photo())
            .await;
        assert!(matches!(result, Err(FacadeError::StageOutputInvalid { stage: StageKind::Mask, .. })));
    }

    #[tokio::test]
    async fn test_editor_errors_keep_their_kind() {
        let transport = MockEditor::new(Behaviour::Fail(|| EditorError::Transport {
            reason: "connection reset".into(),
            transient: true,
        }));
        let result = StageTransformer::new(&transport, StageKind::Clean)
            .transform(&photo())
            .await;
        assert!(matches!(
            result,
            Err(FacadeError::StageTransformFailed { stage: StageKind::Clean, transient: true, .. })
        ));

        let refused = MockEditor::new(Behaviour::Fail(|| EditorError::Refused("SAFETY".into())));
        let result = StageTransformer::new(&refused, StageKind::Clean)
            .transform(&photo())
            .await;
        assert!(matches!(result, Err(FacadeError::ContentRefused { .. })));

        let malformed = MockEditor::new(Behaviour::Fail(|| EditorError::Malformed("no image".into())));
        let result = StageTransformer::new(&malformed, StageKind::Clean)
            .transform(&photo())
            .await;
        assert!(matches!(result, Err(FacadeError::StageOutputInvalid { .. })));
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_before_any_request() {
        let editor = MockEditor::new(Behaviour::Echo);
        let result = StageTransformer::new(&editor, StageKind::Clean)
            .transform(&Image::new(0, 4))
            .await;
        assert!(matches!(result, Err(FacadeError::InvalidDimensions(0, 4))));
        assert!(editor.requests.lock().unwrap().is_empty());
    }
}
