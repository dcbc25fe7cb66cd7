//! Stage contract and result types.

use crate::pipeline::BuildContext;
use std::path::PathBuf;
use std::time::Duration;

/// An independent unit of the pipeline: consumes input files, produces output
/// files or a pass/fail verdict.
///
/// A flag-gated stage must check its flag and return a skipped result with
/// zero side effects when disabled. A glob matching zero files is success,
/// not an error.
pub trait Stage: Send + Sync {
    /// Short stage name used in reports.
    fn name(&self) -> &'static str;

    /// Run the stage. Input globs are re-evaluated on every call.
    fn run(&self, ctx: &BuildContext) -> StageResult;
}

/// Outcome of a single stage run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    /// Stage ran and completed
    Done,
    /// Stage short-circuited (feature disabled or nothing to do)
    Skipped,
    /// Stage failed with an error message
    Failed(String),
}

impl StageStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, StageStatus::Done | StageStatus::Skipped)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StageStatus::Failed(_))
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageStatus::Done => write!(f, "done"),
            StageStatus::Skipped => write!(f, "skipped"),
            StageStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of running one stage.
#[derive(Debug, Clone)]
pub struct StageResult {
    /// Stage name
    pub stage: String,
    /// Outcome
    pub status: StageStatus,
    /// Files written by the stage
    pub outputs: Vec<PathBuf>,
    /// Non-fatal findings (lint warnings, unresolved imports, ...)
    pub warnings: Vec<String>,
    /// Wall-clock duration, filled in by the plan executor
    pub duration: Duration,
}

impl StageResult {
    /// Successful completion with the files written.
    pub fn done(stage: &str, outputs: Vec<PathBuf>) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageStatus::Done,
            outputs,
            warnings: vec![],
            duration: Duration::ZERO,
        }
    }

    /// Disabled-feature or nothing-to-do short circuit.
    pub fn skipped(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageStatus::Skipped,
            outputs: vec![],
            warnings: vec![],
            duration: Duration::ZERO,
        }
    }

    /// Stage failure.
    pub fn failed(stage: &str, error: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageStatus::Failed(error.into()),
            outputs: vec![],
            warnings: vec![],
            duration: Duration::ZERO,
        }
    }

    /// Attach non-fatal warnings.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Aggregated result of a full pipeline run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Per-stage results, in completion order
    pub stages: Vec<StageResult>,
    /// Total wall-clock duration
    pub total_duration: Duration,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no stage failed.
    pub fn is_success(&self) -> bool {
        self.stages.iter().all(|s| s.status.is_success())
    }

    pub fn failures(&self) -> Vec<&StageResult> {
        self.stages.iter().filter(|s| s.status.is_failure()).collect()
    }

    /// All files written during the run.
    pub fn all_outputs(&self) -> Vec<&PathBuf> {
        self.stages.iter().flat_map(|s| s.outputs.iter()).collect()
    }

    /// Find a stage result by name.
    pub fn stage(&self, name: &str) -> Option<&StageResult> {
        self.stages.iter().find(|s| s.stage == name)
    }

    /// One-line-per-stage human summary.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for s in &self.stages {
            let line = match &s.status {
                StageStatus::Done => {
                    format!("  ok   {} ({} file(s), {:?})", s.stage, s.outputs.len(), s.duration)
                }
                StageStatus::Skipped => format!("  --   {} (skipped)", s.stage),
                StageStatus::Failed(e) => format!("  FAIL {}: {}", s.stage, e),
            };
            lines.push(line);
        }
        let verdict = if self.is_success() { "Build complete" } else { "Build failed" };
        lines.push(format!("{} in {:?}", verdict, self.total_duration));
        lines.join("\n")
    }
}
