//! Sitesmith - command-line front-end asset pipeline

use std::process::ExitCode;

use sitesmith::cli;

fn main() -> ExitCode {
    cli::run()
}
