use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::info;

use crate::facade_pipeline::orchestrator::run::PipelineStep;

#[derive(Debug, Clone)]
pub struct StepTiming {
    pub step: PipelineStep,
    pub duration: Duration,
    /// Requests issued for this step; 1 unless a retryable error was repeated.
    pub attempts: u32,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineTimings {
    steps: Vec<StepTiming>,
    step_map: HashMap<PipelineStep, Duration>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, step: PipelineStep, duration: Duration, attempts: u32) {
        self.steps.push(StepTiming {
            step,
            duration,
            attempts,
        });
        *self.step_map.entry(step).or_insert(Duration::ZERO) += duration;
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    pub fn get_step(&self, step: PipelineStep) -> Option<Duration> {
        self.step_map.get(&step).copied()
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    pub fn log_summary(&self) {
        let total = self.total_duration();
        for timing in &self.steps {
            let percentage = if total.as_secs_f64() > 0.0 {
                (timing.duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            } else {
                0.0
            };
            info!(
                step = %timing.step,
                attempts = timing.attempts,
                "{:>12.3}ms ({:>5.1}%)",
                timing.duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        info!("Pipeline total: {:.3}ms", total.as_secs_f64() * 1000.0);
    }
}

pub struct Timer {
    start: Instant,
    step: PipelineStep,
}

impl Timer {
    pub fn start(step: PipelineStep) -> Self {
        Self {
            start: Instant::now(),
            step,
        }
    }

    pub fn stop(self) -> (PipelineStep, Duration) {
        (self.step, self.start.elapsed())
    }
}
