//! Sitesmith - front-end asset pipeline
//!
//! Turns a conventional `src/` tree into a deployable `dist/` tree: script
//! concatenation and linting, style compilation and minification, SVG
//! spriting, static copying and HTML component inlining, orchestrated as a
//! sequence/concurrent plan. Watch mode adds a dev server with live reload.

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod serve;
pub mod stages;
pub mod watch;
