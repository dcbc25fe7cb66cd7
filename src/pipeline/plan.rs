//! First-class pipeline composition.
//!
//! A [`Plan`] is a tree whose leaves are stages and whose internal nodes are
//! `Sequence` (children run in order, a failure stops the sequence) or
//! `Concurrent` (children run on scoped threads, all run to completion, the
//! group fails if any child failed). Keeping composition as a value makes the
//! orchestrator testable with stub stages.

use crate::pipeline::{BuildContext, RunReport, Stage, StageResult};
use std::sync::Mutex;
use std::time::Instant;

/// Composable pipeline tree.
pub enum Plan {
    /// A single stage
    Step(Box<dyn Stage>),
    /// Children run strictly in order; each must complete before the next
    /// starts, and a failed child stops the sequence
    Sequence(Vec<Plan>),
    /// Children run concurrently with no ordering guarantees; completion
    /// requires all children, failure is any child failing. Started siblings
    /// are never cancelled.
    Concurrent(Vec<Plan>),
}

impl Plan {
    /// Wrap a stage as a leaf plan.
    pub fn step(stage: impl Stage + 'static) -> Plan {
        Plan::Step(Box::new(stage))
    }

    pub fn sequence(children: Vec<Plan>) -> Plan {
        Plan::Sequence(children)
    }

    pub fn concurrent(children: Vec<Plan>) -> Plan {
        Plan::Concurrent(children)
    }

    /// Execute the plan against a build context.
    pub fn run(&self, ctx: &BuildContext) -> RunReport {
        let start = Instant::now();
        let mut report = RunReport::new();
        self.execute(ctx, &mut report.stages);
        report.total_duration = start.elapsed();
        report
    }

    /// Execute recursively, appending stage results. Returns false on the
    /// first failure so enclosing sequences stop.
    fn execute(&self, ctx: &BuildContext, out: &mut Vec<StageResult>) -> bool {
        match self {
            Plan::Step(stage) => {
                if ctx.is_verbose() {
                    println!("Running: {} ...", stage.name());
                }
                let start = Instant::now();
                let mut result = stage.run(ctx);
                result.duration = start.elapsed();
                let ok = result.is_success();
                out.push(result);
                ok
            }
            Plan::Sequence(children) => {
                for child in children {
                    if !child.execute(ctx, out) {
                        return false;
                    }
                }
                true
            }
            Plan::Concurrent(children) => {
                if children.is_empty() {
                    return true;
                }
                // One scoped thread per child; stage counts are small and the
                // work is I/O bound.
                let collected: Mutex<Vec<(bool, Vec<StageResult>)>> = Mutex::new(Vec::new());
                std::thread::scope(|scope| {
                    for child in children {
                        let collected = &collected;
                        scope.spawn(move || {
                            let mut local = Vec::new();
                            let ok = child.execute(ctx, &mut local);
                            collected.lock().unwrap().push((ok, local));
                        });
                    }
                });
                let mut all_ok = true;
                for (ok, local) in collected.into_inner().unwrap() {
                    all_ok &= ok;
                    out.extend(local);
                }
                all_ok
            }
        }
    }
}
