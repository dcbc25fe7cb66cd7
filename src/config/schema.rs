//! Configuration schema types for `sitesmith.toml`
//!
//! Every section is optional; defaults reproduce the conventional project
//! layout (`src/` in, `dist/` out).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Lint severity for a single rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Finding fails the lint stage
    Error,
    /// Finding is reported, build continues
    Warn,
    /// Rule disabled
    Off,
}

/// Feature flags. A disabled stage signals completion without touching the
/// filesystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub clean: bool,
    /// Gates both the script build and the script lint stages
    pub scripts: bool,
    /// Reserved; no stage currently consumes it
    pub polyfills: bool,
    pub styles: bool,
    pub svgs: bool,
    /// Gates static copying and index.html publishing
    pub copy: bool,
    /// Gates the dev server and browser reload signalling
    pub reload: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clean: true,
            scripts: true,
            polyfills: true,
            styles: true,
            svgs: true,
            copy: true,
            reload: true,
        }
    }
}

/// Script stage paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptPaths {
    /// Glob pattern for script sources, re-evaluated on every run
    pub input: String,
    /// Directory receiving the concatenated `main.js`
    pub output: PathBuf,
}

impl Default for ScriptPaths {
    fn default() -> Self {
        Self { input: "src/**/*.js".to_string(), output: PathBuf::from("dist/js") }
    }
}

/// Style stage paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePaths {
    /// Directory scanned recursively for `.scss`/`.sass`/`.css` sources
    pub input: PathBuf,
    /// Directory receiving the expanded and minified CSS
    pub output: PathBuf,
    /// Extra roots for `@import` resolution (component libraries)
    pub include_paths: Vec<PathBuf>,
}

impl Default for StylePaths {
    fn default() -> Self {
        Self {
            input: PathBuf::from("src/sass"),
            output: PathBuf::from("dist/css"),
            include_paths: vec![],
        }
    }
}

/// SVG sprite stage paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgPaths {
    /// Directory holding sprite sources (`*.svg`, non-recursive)
    pub input: PathBuf,
    /// Directory receiving the combined `sprite.svg`
    pub output: PathBuf,
}

impl Default for SvgPaths {
    fn default() -> Self {
        Self { input: PathBuf::from("src/svg-sprite"), output: PathBuf::from("dist/svg") }
    }
}

/// Static copy stage paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyPaths {
    /// Glob pattern for static files, copied verbatim
    pub input: String,
    /// Destination root; relative layout under the glob base is preserved
    pub output: PathBuf,
}

impl Default for CopyPaths {
    fn default() -> Self {
        Self { input: "src/copy/**/*".to_string(), output: PathBuf::from("dist") }
    }
}

/// HTML inlining and publishing paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlPaths {
    /// The include-inlining target; read from the output tree and written
    /// back to the same path
    pub file: PathBuf,
    /// Directory the `build` pipeline publishes the inlined file to
    pub publish: PathBuf,
}

impl Default for HtmlPaths {
    fn default() -> Self {
        Self { file: PathBuf::from("dist/index.html"), publish: PathBuf::from(".") }
    }
}

/// Paths to project folders
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    /// Source root; the watcher monitors this tree recursively
    pub input: PathBuf,
    /// Output root; the clean stage deletes this tree
    pub output: PathBuf,
    pub scripts: ScriptPaths,
    pub styles: StylePaths,
    pub svgs: SvgPaths,
    pub copy: CopyPaths,
    pub html: HtmlPaths,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            input: PathBuf::from("src"),
            output: PathBuf::from("dist"),
            scripts: ScriptPaths::default(),
            styles: StylePaths::default(),
            svgs: SvgPaths::default(),
            copy: CopyPaths::default(),
            html: HtmlPaths::default(),
        }
    }
}

/// Lint rule configuration: rule name -> severity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    pub rules: BTreeMap<String, Severity>,
}

impl Default for LintConfig {
    fn default() -> Self {
        let mut rules = BTreeMap::new();
        rules.insert("no-debugger".to_string(), Severity::Error);
        rules.insert("no-eval".to_string(), Severity::Error);
        rules.insert("no-console".to_string(), Severity::Warn);
        rules.insert("no-alert".to_string(), Severity::Warn);
        Self { rules }
    }
}

/// Dev server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Watch mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Debounce window for filesystem events, in milliseconds
    pub debounce_ms: u64,
    /// Clear the terminal before each rebuild
    pub clear_screen: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100, clear_screen: false }
    }
}

/// Top-level `sitesmith.toml` structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub settings: Settings,
    pub paths: Paths,
    pub lint: LintConfig,
    pub server: ServerConfig,
    pub watch: WatchConfig,
}
