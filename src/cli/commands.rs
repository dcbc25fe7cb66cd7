//! Command runners behind the CLI surface.

use std::path::Path;
use std::process::ExitCode;

use crate::config::{find_config, load_config};
use crate::pipeline::{self, BuildContext, RunReport};
use crate::serve::DevServer;
use crate::watch::{self, timestamp};

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Resolve config and project root into a build context.
///
/// An explicit `--config` path must exist; without one the nearest
/// `sitesmith.toml` up from the working directory is used, falling back to the
/// defaults rooted at the working directory.
fn load_context(config_path: Option<&Path>, verbose: bool) -> Result<BuildContext, String> {
    let found = match config_path {
        Some(p) => {
            if !p.is_file() {
                return Err(format!("config not found: {}", p.display()));
            }
            Some(p.to_path_buf())
        }
        None => find_config(),
    };

    let config = load_config(found.as_deref()).map_err(|e| e.to_string())?;
    let root = match &found {
        Some(p) => p
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| Path::new(".").to_path_buf()),
        None => std::env::current_dir().map_err(|e| e.to_string())?,
    };

    if verbose {
        match &found {
            Some(p) => println!("[{}] Using config {}", timestamp(), p.display()),
            None => println!("[{}] No sitesmith.toml found, using defaults", timestamp()),
        }
    }

    Ok(BuildContext::new(config, root).with_verbose(verbose))
}

fn print_report(report: &RunReport, verbose: bool) {
    println!("{}", report.summary());
    for stage in &report.stages {
        for warning in &stage.warnings {
            eprintln!("[{}] Warning: {}", timestamp(), warning);
        }
    }
    if verbose {
        for output in report.all_outputs() {
            println!("[{}] Wrote {}", timestamp(), output.display());
        }
    }
}

fn exit_for(report: &RunReport) -> ExitCode {
    if report.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// `sitesmith` with no subcommand: the default pipeline.
pub fn run_default(config_path: Option<&Path>, verbose: bool) -> ExitCode {
    let ctx = match load_context(config_path, verbose) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!("[{}] Building...", timestamp());
    let report = pipeline::default_plan().run(&ctx);
    print_report(&report, verbose);
    exit_for(&report)
}

/// `sitesmith build`: default pipeline plus publishing index.html.
pub fn run_build(config_path: Option<&Path>, verbose: bool, production: bool) -> ExitCode {
    let ctx = match load_context(config_path, verbose) {
        Ok(ctx) => ctx.with_production(production),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!("[{}] Building...", timestamp());
    let report = pipeline::build_plan().run(&ctx);
    print_report(&report, verbose);
    exit_for(&report)
}

/// `sitesmith watch`: build, serve, rebuild on changes.
///
/// The initial build must succeed before the server starts; a broken tree is
/// reported the same way a plain build would report it.
pub fn run_watch(config_path: Option<&Path>, verbose: bool, port: Option<u16>) -> ExitCode {
    let ctx = match load_context(config_path, verbose) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!("[{}] Building...", timestamp());
    let report = pipeline::default_plan().run(&ctx);
    print_report(&report, verbose);
    if !report.is_success() {
        return ExitCode::from(EXIT_ERROR);
    }

    let server = if ctx.config().settings.reload {
        let serve_root = ctx.resolve(&ctx.config().paths.output);
        let port = port.unwrap_or(ctx.config().server.port);
        match DevServer::start(serve_root, port) {
            Ok(server) => server,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        DevServer::disabled()
    };
    if let Some(addr) = server.addr() {
        println!("[{}] Serving on http://{}", timestamp(), addr);
    }

    match watch::watch_and_rebuild(&ctx, &server) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
