//! External stage module
//!
//! Wraps the generative image-editing capability behind `ImageEditor` and
//! turns each call into a validated, dimension-preserving transformation.

mod codec;
mod editor;
mod gemini_editor;
mod spec;
mod transformer;

pub use codec::{TRANSPORT_MIME, decode_rgb, encode_png};
pub use editor::{EditRequest, EditResponse, EditorError, ImageEditor};
pub use gemini_editor::GeminiEditor;
#[cfg(test)]
pub(crate) use gemini_editor::interpret_response;
pub use spec::{CLEAN_SPEC, MASK_SPEC, SELECT_SPEC, StageKind, StageSpec};
pub use transformer::{StageTransformer, validate};
