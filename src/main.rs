use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use facade_ratio_rs::config::{ApiKey, PipelineConfig};
use facade_ratio_rs::facade_pipeline::{
    FacadePipeline, RatioCalculator, RatioReport, StageKind, calculate_file,
};
use facade_ratio_rs::logger;

use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "facade-ratio",
    about = "Estimate the window-to-wall ratio of a building facade from a street photo",
    version
)]
struct Cli {
    /// Rejection band for mask colors (Euclidean RGB distance).
    #[arg(long, global = true, value_name = "DISTANCE")]
    threshold: Option<f64>,

    /// Bound on each stage request in seconds. Unbounded when omitted.
    #[arg(long, global = true, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Attempts per stage for retryable errors, counting the first.
    #[arg(long, global = true, value_name = "N")]
    max_attempts: Option<u32>,

    /// Print the ratio report as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging with per-span timings.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run clean -> select -> mask -> ratio on one photo.
    Run {
        photo: PathBuf,
        #[arg(default_value = ".")]
        out_dir: PathBuf,
    },
    /// Remove obstructions in front of the building.
    Clean { input: PathBuf, output: PathBuf },
    /// Dim everything except the center building.
    Select { input: PathBuf, output: PathBuf },
    /// Produce the red/blue/black segmentation mask.
    Mask { input: PathBuf, output: PathBuf },
    /// Measure an existing mask without calling the image service.
    Calculate {
        mask: PathBuf,
        /// Image to draw the overlay on; the mask itself when omitted.
        #[arg(long)]
        base: Option<PathBuf>,
        /// Where to write the overlay.
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
}

impl Cli {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = PipelineConfig::from_env()?;
        if let Some(threshold) = self.threshold {
            config.palette.rejection_threshold = threshold;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(attempts) = self.max_attempts {
            config.max_attempts = attempts;
        }
        config.validate()?;
        Ok(config)
    }
}

fn print_report(report: &RatioReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!(
            "Image: {}x{}  facade: {} px ({:.1}% of image)  windows: {} px  wall: {} px",
            report.counts.width,
            report.counts.height,
            report.counts.facade_count(),
            report.facade_share,
            report.counts.window_count,
            report.counts.wall_count,
        );
        println!("WINDOW / FACADE: {:.1}%", report.ratio.window_ratio);
        println!("WALL / FACADE:   {:.1}%", report.ratio.wall_ratio);
    }
    Ok(())
}

async fn run_stage(cli: &Cli, stage: StageKind, input: &PathBuf, output: &PathBuf) -> anyhow::Result<()> {
    let config = cli.pipeline_config()?;
    let pipeline = FacadePipeline::new(ApiKey::from_env()?, config)?;
    info!("[Step {}] {} stage: {} -> {}", stage.ordinal(), stage, input.display(), output.display());
    pipeline
        .run_stage_file(stage, input, output)
        .await
        .with_context(|| format!("{stage} stage failed for {}", input.display()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init_verbose(cli.verbose);

    match &cli.command {
        Command::Run { photo, out_dir } => {
            let config = cli.pipeline_config()?;
            let pipeline = FacadePipeline::new(ApiKey::from_env()?, config)?;
            info!(photo = %photo.display(), out_dir = %out_dir.display(), "Starting facade analysis");

            match pipeline.run(photo, out_dir).await {
                Ok(run) => {
                    print_report(&run.report, cli.json)?;
                    for path in run.artifacts.all() {
                        info!(path = %path.display(), "Artifact");
                    }
                }
                Err(failure) => {
                    error!(step = %failure.step, "{}", failure.source);
                    for path in &failure.artifacts {
                        error!(path = %path.display(), "Kept artifact");
                    }
                    return Err(failure.into());
                }
            }
        }
        Command::Clean { input, output } => run_stage(&cli, StageKind::Clean, input, output).await?,
        Command::Select { input, output } => run_stage(&cli, StageKind::Select, input, output).await?,
        Command::Mask { input, output } => run_stage(&cli, StageKind::Mask, input, output).await?,
        Command::Calculate { mask, base, overlay } => {
            // No request is made, so no key is needed.
            let config = cli.pipeline_config()?;
            let calculator = RatioCalculator::new(config.palette);
            let report = calculate_file(&calculator, mask, base.as_deref(), overlay.as_deref())
                .with_context(|| format!("failed to measure {}", mask.display()))?;
            print_report(&report, cli.json)?;
        }
    }

    Ok(())
}
