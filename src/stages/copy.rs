//! Static copy and HTML publish stages, both gated by `settings.copy`.

use crate::pipeline::{BuildContext, Stage, StageResult};
use std::fs;

/// Copies every file under the static source tree verbatim into the output
/// root, preserving relative paths.
pub struct CopyStatic;

impl Stage for CopyStatic {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn run(&self, ctx: &BuildContext) -> StageResult {
        if !ctx.config().settings.copy {
            return StageResult::skipped(self.name());
        }

        let pattern = ctx.resolve_glob(&ctx.config().paths.copy.input);
        let files = match super::matched_files(&pattern) {
            Ok(files) => files,
            Err(e) => return StageResult::failed(self.name(), e),
        };

        let base = super::glob_static_prefix(&pattern);
        let out_root = ctx.resolve(&ctx.config().paths.copy.output);

        let mut outputs = Vec::new();
        for file in &files {
            let rel = file.strip_prefix(&base).unwrap_or(file);
            let dest = out_root.join(rel);

            if let Some(parent) = dest.parent() {
                if let Err(e) = fs::create_dir_all(parent) {
                    return StageResult::failed(
                        self.name(),
                        format!("cannot create {}: {}", parent.display(), e),
                    );
                }
            }
            if let Err(e) = fs::copy(file, &dest) {
                return StageResult::failed(
                    self.name(),
                    format!("cannot copy {} -> {}: {}", file.display(), dest.display(), e),
                );
            }
            outputs.push(dest);
        }

        StageResult::done(self.name(), outputs)
    }
}

/// Publishes the already-inlined `index.html` from the output tree to the
/// project root. A promotion step, not a transform; only the `build` pipeline
/// runs it, after the include stage.
pub struct PublishHtml;

impl Stage for PublishHtml {
    fn name(&self) -> &'static str {
        "publish-html"
    }

    fn run(&self, ctx: &BuildContext) -> StageResult {
        if !ctx.config().settings.copy {
            return StageResult::skipped(self.name());
        }

        let source = ctx.resolve(&ctx.config().paths.html.file);
        if !source.is_file() {
            // nothing produced, nothing to promote
            return StageResult::done(self.name(), vec![]);
        }

        let publish_dir = ctx.resolve(&ctx.config().paths.html.publish);
        if let Err(e) = fs::create_dir_all(&publish_dir) {
            return StageResult::failed(
                self.name(),
                format!("cannot create {}: {}", publish_dir.display(), e),
            );
        }

        let file_name = match source.file_name() {
            Some(name) => name,
            None => return StageResult::failed(self.name(), "html file has no name"),
        };
        let dest = publish_dir.join(file_name);

        match fs::copy(&source, &dest) {
            Ok(_) => StageResult::done(self.name(), vec![dest]),
            Err(e) => StageResult::failed(
                self.name(),
                format!("cannot copy {} -> {}: {}", source.display(), dest.display(), e),
            ),
        }
    }
}
