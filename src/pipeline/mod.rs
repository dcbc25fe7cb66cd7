//! Pipeline orchestration
//!
//! Stages are independent units behind the [`Stage`] trait; [`Plan`] composes
//! them into sequence/concurrent trees. The two named entry pipelines are
//! built here:
//!
//! - `default`: clean, then lint/scripts/styles/svgs/copy concurrently, then
//!   HTML include inlining
//! - `build`: `default` plus publishing the inlined `index.html`
//!
//! Watch mode layers the dev server and the file watcher on top of `default`
//! (see [`crate::watch`]).

pub mod context;
pub mod plan;
pub mod stage;

pub use context::BuildContext;
pub use plan::Plan;
pub use stage::{RunReport, Stage, StageResult, StageStatus};

use crate::stages::{
    Clean, CopyStatic, HtmlInclude, PublishHtml, ScriptBuild, ScriptLint, StyleBuild, SvgSprite,
};

/// Concurrent group of the independent transform stages.
fn transform_group() -> Plan {
    Plan::concurrent(vec![
        Plan::step(ScriptLint),
        Plan::step(ScriptBuild),
        Plan::step(StyleBuild),
        Plan::step(SvgSprite),
        Plan::step(CopyStatic),
    ])
}

/// The `default` pipeline: clean, transform concurrently, inline includes.
pub fn default_plan() -> Plan {
    Plan::sequence(vec![Plan::step(Clean), transform_group(), Plan::step(HtmlInclude)])
}

/// The `build` pipeline: `default` plus publishing the inlined index.html.
pub fn build_plan() -> Plan {
    Plan::sequence(vec![
        Plan::step(Clean),
        transform_group(),
        Plan::step(HtmlInclude),
        Plan::step(PublishHtml),
    ])
}
