use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::facade_pipeline::common::Image;
use crate::facade_pipeline::common::error::{FacadeError, Result};
use crate::facade_pipeline::stage::decode_rgb;
use crate::facade_pipeline::stage::StageKind;

pub const CLEAN_FILE: &str = "step1_output.png";
pub const SELECT_FILE: &str = "step2_output.png";
pub const MASK_FILE: &str = "step3_mask.png";
pub const OVERLAY_FILE: &str = "result.png";

/// Where one run persists its four artifacts. Each file is written only by
/// the step that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub clean: PathBuf,
    pub select: PathBuf,
    pub mask: PathBuf,
    pub overlay: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            clean: dir.join(CLEAN_FILE),
            select: dir.join(SELECT_FILE),
            mask: dir.join(MASK_FILE),
            overlay: dir.join(OVERLAY_FILE),
        }
    }

    pub fn for_stage(&self, stage: StageKind) -> &Path {
        match stage {
            StageKind::Clean => &self.clean,
            StageKind::Select => &self.select,
            StageKind::Mask => &self.mask,
        }
    }

    pub fn all(&self) -> [&Path; 4] {
        [&self.clean, &self.select, &self.mask, &self.overlay]
    }

    /// Artifacts currently on disk, in pipeline order.
    pub fn existing(&self) -> Vec<PathBuf> {
        self.all()
            .into_iter()
            .filter(|p| p.exists())
            .map(Path::to_path_buf)
            .collect()
    }

    /// Removes leftovers of an earlier run so a failed run never mixes old
    /// and new artifacts.
    pub fn clear_stale(&self) -> Result<()> {
        for path in self.all() {
            if path.exists() {
                std::fs::remove_file(path).map_err(|e| {
                    FacadeError::OutputWriteError(format!("{}: {}", path.display(), e))
                })?;
                debug!(path = %path.display(), "Removed stale artifact");
            }
        }
        Ok(())
    }
}

pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| FacadeError::InputReadError(format!("{}: {}", path.display(), e)))?;
    decode_rgb(&bytes).map_err(|e| match e {
        FacadeError::DecodeError(reason) => {
            FacadeError::DecodeError(format!("{}: {}", path.display(), reason))
        }
        other => other,
    })
}

/// Writes `image` in the format implied by the extension.
pub fn save_image<P: AsRef<Path>>(image: &Image, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| FacadeError::OutputWriteError(format!("{}: {}", parent.display(), e)))?;
    }
    image
        .save(path)
        .map_err(|e| FacadeError::OutputWriteError(format!("{}: {}", path.display(), e)))?;
    info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "Saved artifact"
    );
    Ok(())
}
