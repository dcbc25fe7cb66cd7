//! Watch mode: rebuild on source changes and push live reloads.
//!
//! The watch loop is single threaded. Change events accumulate in the channel
//! while a rebuild runs, so overlapping bursts serialize into back-to-back
//! rebuilds instead of concurrent ones. Browsers are only told to reload
//! after a rebuild that succeeded.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use thiserror::Error;

use crate::pipeline::{self, BuildContext, RunReport};
use crate::serve::DevServer;
use crate::stages::glob_static_prefix;

/// Error during watch mode
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to initialize file watcher: {0}")]
    WatcherInit(notify::Error),
    #[error("failed to watch path: {0}")]
    WatchPath(notify::Error),
    #[error("watch channel error: {0}")]
    Channel(String),
    #[error("no source directory to watch (looked for {0})")]
    SourceNotFound(PathBuf),
}

/// Directories the watcher observes: the source root plus any stage input
/// living outside it. Glob inputs contribute their static prefix, directory
/// inputs themselves. Missing directories are dropped so a project without
/// e.g. an svg source still watches the rest.
pub fn watch_roots(ctx: &BuildContext) -> Vec<PathBuf> {
    let paths = &ctx.config().paths;
    let candidates = [
        ctx.resolve(&paths.input),
        glob_static_prefix(&ctx.resolve_glob(&paths.scripts.input)),
        ctx.resolve(&paths.styles.input),
        ctx.resolve(&paths.svgs.input),
        glob_static_prefix(&ctx.resolve_glob(&paths.copy.input)),
    ];

    let mut roots: Vec<PathBuf> = Vec::new();
    for dir in candidates {
        if !dir.is_dir() {
            continue;
        }
        // keep only the outermost of nested candidates
        if roots.iter().any(|r| dir.starts_with(r)) {
            continue;
        }
        roots.retain(|r| !r.starts_with(&dir));
        roots.push(dir);
    }
    roots
}

/// Watch the source directories, rerunning the default pipeline on changes.
///
/// Blocks until the event channel closes (normally never; the process exits
/// via Ctrl+C).
pub fn watch_and_rebuild(ctx: &BuildContext, server: &DevServer) -> Result<(), WatchError> {
    let roots = watch_roots(ctx);
    if roots.is_empty() {
        return Err(WatchError::SourceNotFound(ctx.resolve(&ctx.config().paths.input)));
    }

    let (tx, rx) = channel();
    let debounce = Duration::from_millis(ctx.config().watch.debounce_ms);
    let mut debouncer = new_debouncer(debounce, tx).map_err(WatchError::WatcherInit)?;
    for root in &roots {
        debouncer
            .watcher()
            .watch(root, RecursiveMode::Recursive)
            .map_err(WatchError::WatchPath)?;
    }

    for root in &roots {
        println!("[{}] Watching {} for changes...", timestamp(), root.display());
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed: Vec<&Path> = events
                    .iter()
                    .filter(|e| {
                        matches!(e.kind, DebouncedEventKind::Any) && is_relevant_file(&e.path)
                    })
                    .map(|e| e.path.as_path())
                    .collect();
                if changed.is_empty() {
                    continue;
                }

                for path in &changed {
                    if let Some(name) = path.file_name() {
                        println!("[{}] Changed: {}", timestamp(), name.to_string_lossy());
                    }
                }

                if ctx.config().watch.clear_screen {
                    clear_screen();
                }

                println!("[{}] Building...", timestamp());
                let report = pipeline::default_plan().run(ctx);
                print_report(&report);

                if report.is_success() {
                    println!(
                        "[{}] Rebuilt in {}, reloading browsers",
                        timestamp(),
                        format_duration(report.total_duration)
                    );
                    server.reload();
                }
            }
            Ok(Err(error)) => {
                // non-fatal, keep watching
                eprintln!("[{}] Watch error: {:?}", timestamp(), error);
            }
            Err(e) => {
                return Err(WatchError::Channel(e.to_string()));
            }
        }
    }
}

/// Editor droppings and hidden files do not trigger rebuilds.
fn is_relevant_file(path: &Path) -> bool {
    match path.file_name().map(|n| n.to_string_lossy().into_owned()) {
        Some(name) => !name.starts_with('.') && !name.ends_with('~') && !name.ends_with(".swp"),
        None => false,
    }
}

fn print_report(report: &RunReport) {
    println!("{}", report.summary());
    for stage in &report.stages {
        for warning in &stage.warnings {
            eprintln!("[{}] Warning: {}", timestamp(), warning);
        }
    }
}

/// Clear the terminal screen
fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
}

/// Format duration for display
fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Get current timestamp for logging
pub fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400; // seconds since midnight
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
