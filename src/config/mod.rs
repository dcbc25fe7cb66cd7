//! Configuration for `sitesmith.toml`
//!
//! The config carries two read-only structures consumed by every stage:
//! feature flags (`[settings]`) and path specs (`[paths]`), plus lint rules
//! and server/watch tuning.

pub mod loader;
pub mod schema;

pub use loader::{default_config, find_config, find_config_from, load_config, ConfigError};
pub use schema::*;
