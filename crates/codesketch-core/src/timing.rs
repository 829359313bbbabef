//! Stage timing for the orchestration pipeline.

use codesketch_types::LatencyBreakdown;
use std::time::{Duration, Instant};

/// A timed step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Codegen,
    Diagram,
    Analysis,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Codegen => "codegen",
            Stage::Diagram => "diagram",
            Stage::Analysis => "analysis",
        }
    }
}

/// Records the wall-clock duration of each stage and of the whole run.
///
/// The overall clock starts at construction. Each stage is measured from
/// [`StageTimer::begin`] to [`StageTimer::end`].
#[derive(Debug)]
pub struct StageTimer {
    started: Instant,
    current: Option<(Stage, Instant)>,
    breakdown: LatencyBreakdown,
}

impl StageTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            current: None,
            breakdown: LatencyBreakdown::default(),
        }
    }

    /// Mark the start of a stage. A stage still open is closed first.
    pub fn begin(&mut self, stage: Stage) {
        if self.current.is_some() {
            self.end();
        }
        self.current = Some((stage, Instant::now()));
    }

    /// Close the open stage and return its duration.
    pub fn end(&mut self) -> Duration {
        let Some((stage, began)) = self.current.take() else {
            return Duration::ZERO;
        };
        let elapsed = began.elapsed();
        tracing::trace!(
            target: "codesketch::orchestrator",
            stage = stage.as_str(),
            elapsed_ms = as_millis(elapsed),
            "Stage finished"
        );
        self.record(stage, elapsed);
        elapsed
    }

    /// Store a stage duration measured elsewhere.
    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        let ms = as_millis(elapsed);
        match stage {
            Stage::Codegen => self.breakdown.codegen = ms,
            Stage::Diagram => self.breakdown.diagram = ms,
            Stage::Analysis => self.breakdown.analysis = ms,
        }
    }

    /// Close any open stage and return the per-stage and total durations.
    pub fn finish(mut self) -> LatencyBreakdown {
        self.end();
        self.breakdown.total = as_millis(self.started.elapsed());
        self.breakdown
    }
}

fn as_millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_stages_land_in_breakdown() {
        let mut timer = StageTimer::start();
        timer.record(Stage::Codegen, Duration::from_millis(250));
        timer.record(Stage::Diagram, Duration::from_micros(1500));
        let breakdown = timer.finish();

        assert_eq!(breakdown.codegen, 250.0);
        assert!((breakdown.diagram - 1.5).abs() < 1e-9);
        assert_eq!(breakdown.analysis, 0.0);
    }

    #[test]
    fn test_total_covers_stages() {
        let mut timer = StageTimer::start();
        timer.begin(Stage::Codegen);
        std::thread::sleep(Duration::from_millis(5));
        let codegen = timer.end();
        timer.begin(Stage::Analysis);
        let breakdown = timer.finish();

        assert!(codegen >= Duration::from_millis(5));
        assert!(breakdown.codegen >= 5.0);
        assert!(breakdown.analysis >= 0.0);
        assert!(breakdown.total >= breakdown.codegen + breakdown.analysis);
    }

    #[test]
    fn test_end_without_begin_is_zero() {
        let mut timer = StageTimer::start();
        assert_eq!(timer.end(), Duration::ZERO);
    }

    #[test]
    fn test_begin_closes_open_stage() {
        let mut timer = StageTimer::start();
        timer.begin(Stage::Codegen);
        std::thread::sleep(Duration::from_millis(2));
        timer.begin(Stage::Diagram);
        let breakdown = timer.finish();
        assert!(breakdown.codegen >= 2.0);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Codegen.as_str(), "codegen");
        assert_eq!(Stage::Diagram.as_str(), "diagram");
        assert_eq!(Stage::Analysis.as_str(), "analysis");
    }
}
