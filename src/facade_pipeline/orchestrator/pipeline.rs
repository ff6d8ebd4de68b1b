use std::path::Path;

use tracing::{info, instrument, warn};

use crate::config::{ApiKey, PipelineConfig};
use crate::facade_pipeline::common::Image;
use crate::facade_pipeline::common::error::{FacadeError, Result};
use crate::facade_pipeline::orchestrator::artifacts::{ArtifactPaths, load_image, save_image};
use crate::facade_pipeline::orchestrator::run::{PipelineRun, PipelineStep, RunFailure};
use crate::facade_pipeline::orchestrator::timing::{PipelineTimings, Timer};
use crate::facade_pipeline::ratio::{RatioCalculator, RatioReport};
use crate::facade_pipeline::stage::{GeminiEditor, ImageEditor, StageKind, StageTransformer};

/// Runs clean -> select -> mask strictly in order, persisting each output
/// before the next stage starts, then measures the mask.
pub struct FacadePipeline<E: ImageEditor> {
    editor: E,
    config: PipelineConfig,
    calculator: RatioCalculator,
}

impl FacadePipeline<GeminiEditor> {
    pub fn new(api_key: ApiKey, config: PipelineConfig) -> Result<Self> {
        let editor = GeminiEditor::new(api_key, &config)?;
        Self::with_editor(editor, config)
    }
}

impl<E: ImageEditor> FacadePipeline<E> {
    pub fn with_editor(editor: E, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            editor,
            calculator: RatioCalculator::new(config.palette),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// One stage, with the configured number of attempts for retryable errors.
    ///
    /// Returns the validated image and how many requests it took.
    pub async fn transform_stage(&self, stage: StageKind, input: &Image) -> Result<(Image, u32)> {
        let transformer = StageTransformer::new(&self.editor, stage);
        let mut attempt = 1;
        loop {
            match transformer.transform(input).await {
                Ok(image) => return Ok((image, attempt)),
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                    warn!(
                        stage = %stage,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        "Retrying after error: {}",
                        e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Full run from a photo on disk.
    #[instrument(skip(self, photo_path, out_dir), fields(photo = %photo_path.as_ref().display()))]
    pub async fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        photo_path: P,
        out_dir: Q,
    ) -> std::result::Result<PipelineRun, RunFailure> {
        // Nothing of this run is on disk yet; older files in `out_dir` are not reported.
        let photo = load_image(photo_path.as_ref()).map_err(|e| RunFailure {
            step: PipelineStep::Load,
            source: e,
            artifacts: Vec::new(),
        })?;
        info!(width = photo.width(), height = photo.height(), "Loaded photo");
        self.run_image(photo, out_dir).await
    }

    /// Full run from an in-memory photo. Artifacts land in `out_dir`.
    pub async fn run_image<Q: AsRef<Path>>(
        &self,
        photo: Image,
        out_dir: Q,
    ) -> std::result::Result<PipelineRun, RunFailure> {
        let out_dir = out_dir.as_ref();
        let artifacts = ArtifactPaths::in_dir(out_dir);
        let fail = |step: PipelineStep, e: FacadeError| RunFailure::new(step, e, &artifacts);

        // Whatever is left in `out_dir` here belongs to an earlier run.
        std::fs::create_dir_all(out_dir)
            .map_err(|e| FacadeError::OutputWriteError(format!("{}: {}", out_dir.display(), e)))
            .and_then(|_| artifacts.clear_stale())
            .map_err(|e| RunFailure {
                step: PipelineStep::Prepare,
                source: e,
                artifacts: Vec::new(),
            })?;

        let mut timings = PipelineTimings::new();
        let clean = self.run_one(StageKind::Clean, &photo, &artifacts, &mut timings).await?;
        let select = self.run_one(StageKind::Select, &clean, &artifacts, &mut timings).await?;
        let mask = self.run_one(StageKind::Mask, &select, &artifacts, &mut timings).await?;

        let timer = Timer::start(PipelineStep::Calculate);
        let (report, overlay) = self
            .calculator
            .calculate(&mask, &select)
            .map_err(|e| fail(PipelineStep::Calculate, e))?;
        save_image(&overlay, &artifacts.overlay).map_err(|e| fail(PipelineStep::Calculate, e))?;
        let (step, duration) = timer.stop();
        timings.add_step(step, duration, 1);

        report.log_summary();
        timings.log_summary();

        Ok(PipelineRun {
            clean,
            select,
            mask,
            overlay,
            report,
            artifacts,
            timings,
        })
    }

    /// Runs one stage inside a full run and persists its output before returning.
    async fn run_one(
        &self,
        stage: StageKind,
        input: &Image,
        artifacts: &ArtifactPaths,
        timings: &mut PipelineTimings,
    ) -> std::result::Result<Image, RunFailure> {
        info!("[Step {}] Running {} stage", stage.ordinal(), stage);
        let timer = Timer::start(stage.into());
        let (output, attempts) = self
            .transform_stage(stage, input)
            .await
            .map_err(|e| RunFailure::new(stage.into(), e, artifacts))?;
        save_image(&output, artifacts.for_stage(stage))
            .map_err(|e| RunFailure::new(stage.into(), e, artifacts))?;
        let (step, duration) = timer.stop();
        timings.add_step(step, duration, attempts);
        Ok(output)
    }

    /// Standalone entry for a single stage: same contract as inside a run.
    #[instrument(skip(self, input_path, output_path), fields(stage = %stage))]
    pub async fn run_stage_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        stage: StageKind,
        input_path: P,
        output_path: Q,
    ) -> Result<Image> {
        let input = load_image(input_path)?;
        let (output, _) = self.transform_stage(stage, &input).await?;
        save_image(&output, output_path)?;
        Ok(output)
    }
}

/// Standalone ratio calculation from an existing mask; no stage is involved.
///
/// The overlay is drawn on `base_path` when given, otherwise on the mask itself.
pub fn calculate_file<P: AsRef<Path>>(
    calculator: &RatioCalculator,
    mask_path: P,
    base_path: Option<&Path>,
    overlay_path: Option<&Path>,
) -> Result<RatioReport> {
    let mask = load_image(mask_path)?;
    let base = match base_path {
        Some(path) => load_image(path)?,
        None => mask.clone(),
    };
    let (report, overlay) = calculator.calculate(&mask, &base)?;
    if let Some(path) = overlay_path {
        save_image(&overlay, path)?;
    }
    report.log_summary();
    Ok(report)
}
