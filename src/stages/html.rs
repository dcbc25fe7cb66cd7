//! HTML include stage.
//!
//! Expands `@@include('path')` directives in the built `index.html` in place.
//! Include paths resolve relative to the directory of the file containing the
//! directive, so fragments can include further fragments with their own
//! relative paths. Cycles are detected and fail the stage.

use crate::pipeline::{BuildContext, Stage, StageResult};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Inlines component fragments into the output `index.html`.
pub struct HtmlInclude;

impl Stage for HtmlInclude {
    fn name(&self) -> &'static str {
        "html-include"
    }

    fn run(&self, ctx: &BuildContext) -> StageResult {
        // No feature flag of its own: a hand-authored index.html gets its
        // directives expanded even when the copy stage is off. The
        // missing-file skip below covers the nothing-to-do case.
        let file = ctx.resolve(&ctx.config().paths.html.file);
        if !file.is_file() {
            // copy stage produced no index.html, nothing to expand
            return StageResult::skipped(self.name())
                .with_warnings(vec![format!("{} not found", file.display())]);
        }

        let source = match fs::read_to_string(&file) {
            Ok(s) => s,
            Err(e) => {
                return StageResult::failed(
                    self.name(),
                    format!("cannot read {}: {}", file.display(), e),
                )
            }
        };

        let mut visited = HashSet::new();
        let expanded = match expand_includes(&source, &file, &mut visited) {
            Ok(html) => html,
            Err(e) => return StageResult::failed(self.name(), e),
        };

        if expanded != source {
            if let Err(e) = fs::write(&file, expanded) {
                return StageResult::failed(
                    self.name(),
                    format!("cannot write {}: {}", file.display(), e),
                );
            }
        }

        StageResult::done(self.name(), vec![file])
    }
}

fn include_directive() -> Regex {
    Regex::new(r#"@@include\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap()
}

/// Recursively expand include directives in `source`, which was read from
/// `file`. `visited` holds the canonical paths of the current expansion chain.
fn expand_includes(
    source: &str,
    file: &Path,
    visited: &mut HashSet<PathBuf>,
) -> Result<String, String> {
    let canonical = fs::canonicalize(file)
        .map_err(|e| format!("cannot resolve {}: {}", file.display(), e))?;
    if !visited.insert(canonical.clone()) {
        return Err(format!("include cycle through {}", file.display()));
    }

    let base = file.parent().unwrap_or_else(|| Path::new("."));
    let directive = include_directive();

    // Splice manually so fragment errors can propagate.
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for caps in directive.captures_iter(source) {
        let whole = caps.get(0).ok_or("malformed include match")?;
        let target = base.join(&caps[1]);

        let fragment = fs::read_to_string(&target)
            .map_err(|e| format!("{}: cannot include {}: {}", file.display(), target.display(), e))?;
        let expanded = expand_includes(&fragment, &target, visited)?;

        out.push_str(&source[last..whole.start()]);
        out.push_str(&expanded);
        last = whole.end();
    }
    out.push_str(&source[last..]);

    visited.remove(&canonical);
    Ok(out)
}
