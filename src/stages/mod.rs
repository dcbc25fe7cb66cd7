//! File transform stages.
//!
//! Each stage is an independent unit, most gated by a feature flag: it
//! consumes input globs resolved at run time and writes into the output tree
//! (or, for lint, produces a pass/fail verdict). Stages never retry; every
//! failure is terminal for the enclosing pipeline run.

pub mod clean;
pub mod copy;
pub mod html;
pub mod lint;
pub mod scripts;
pub mod styles;
pub mod svg;

pub use clean::Clean;
pub use copy::{CopyStatic, PublishHtml};
pub use html::HtmlInclude;
pub use lint::ScriptLint;
pub use scripts::ScriptBuild;
pub use styles::StyleBuild;
pub use svg::SvgSprite;

use std::path::{Path, PathBuf};

/// Expand a glob pattern to the matching files, in the glob's sorted
/// enumeration order. Directories are filtered out. A malformed pattern is an
/// error; a pattern matching nothing is an empty list.
pub(crate) fn matched_files(pattern: &str) -> Result<Vec<PathBuf>, String> {
    let paths = glob::glob(pattern).map_err(|e| format!("bad glob '{}': {}", pattern, e))?;
    Ok(paths.filter_map(Result::ok).filter(|p| p.is_file()).collect())
}

/// The static directory prefix of a glob pattern (everything before the first
/// component containing a metacharacter). Used to preserve relative layout
/// when copying.
pub(crate) fn glob_static_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if text.contains(['*', '?', '[']) {
            break;
        }
        prefix.push(component);
    }
    prefix
}
