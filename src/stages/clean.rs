//! Output tree cleaning.
//!
//! Runs strictly before any transform stage writes, so a build is never
//! corrupted by stale artifacts from a previous run with different flags.

use crate::pipeline::{BuildContext, Stage, StageResult};
use std::fs;

/// Deletes the entire output directory tree when `settings.clean` is on.
pub struct Clean;

impl Stage for Clean {
    fn name(&self) -> &'static str {
        "clean"
    }

    fn run(&self, ctx: &BuildContext) -> StageResult {
        if !ctx.config().settings.clean {
            return StageResult::skipped(self.name());
        }

        let output = ctx.resolve(&ctx.config().paths.output);
        if !output.exists() {
            return StageResult::done(self.name(), vec![]);
        }

        match fs::remove_dir_all(&output) {
            Ok(()) => StageResult::done(self.name(), vec![]),
            Err(e) => {
                StageResult::failed(self.name(), format!("cannot remove {}: {}", output.display(), e))
            }
        }
    }
}
