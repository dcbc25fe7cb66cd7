//! Build context shared by every stage.
//!
//! Constructed once at process start from the loaded config and passed by
//! reference into stage runs; nothing in it is mutated after construction.

use crate::config::SiteConfig;
use std::path::{Path, PathBuf};

/// Immutable per-invocation build state.
#[derive(Debug, Clone)]
pub struct BuildContext {
    config: SiteConfig,
    project_root: PathBuf,
    production: bool,
    verbose: bool,
}

impl BuildContext {
    /// Create a new build context rooted at the project directory.
    pub fn new(config: SiteConfig, project_root: PathBuf) -> Self {
        Self { config, project_root, production: false, verbose: false }
    }

    /// Enable production processing (script transpile + minify).
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Enable verbose console output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn is_production(&self) -> bool {
        self.production
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Resolve a configured path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Resolve a configured glob pattern against the project root.
    pub fn resolve_glob(&self, pattern: &str) -> String {
        if Path::new(pattern).is_absolute() {
            pattern.to_string()
        } else {
            format!("{}/{}", self.project_root.display(), pattern)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;

    #[test]
    fn test_resolve_relative_path() {
        let ctx = BuildContext::new(default_config(), PathBuf::from("/proj"));
        assert_eq!(ctx.resolve(Path::new("dist/js")), PathBuf::from("/proj/dist/js"));
    }

    #[test]
    fn test_resolve_absolute_path_untouched() {
        let ctx = BuildContext::new(default_config(), PathBuf::from("/proj"));
        assert_eq!(ctx.resolve(Path::new("/abs/out")), PathBuf::from("/abs/out"));
    }

    #[test]
    fn test_resolve_glob() {
        let ctx = BuildContext::new(default_config(), PathBuf::from("/proj"));
        assert_eq!(ctx.resolve_glob("src/**/*.js"), "/proj/src/**/*.js");
    }

    #[test]
    fn test_builder_flags() {
        let ctx = BuildContext::new(default_config(), PathBuf::from("."))
            .with_production(true)
            .with_verbose(true);
        assert!(ctx.is_production());
        assert!(ctx.is_verbose());
    }
}
