//! Fixed-size worker pool driving the compiler.
//!
//! The producer (the caller of [`Scheduler::run`]) feeds work items into a
//! bounded channel read by `W` workers. Each worker compiles one item at a
//! time and pushes the result into a second bounded channel, drained by a
//! single aggregator thread that hands results to the [`ResultHandler`].
//!
//! Shutdown is strictly ordered: close the work channel, join the workers,
//! close the result channel, join the aggregator. Every thread is scoped to
//! `run`, so none outlives it.

use crossbeam_channel::bounded;
use std::num::NonZeroUsize;
use std::thread;
use tracing::{debug, info};

use crate::compiler::{Compiler, CompilerResult};
use crate::errors::{PapyError, Result};
use crate::handler::{BuildSummary, ResultHandler};
use crate::scanner::WorkItem;

/// Number of available processing units, at least 1
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    workers: usize,
}

impl Scheduler {
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(PapyError::NoWorkers);
        }
        Ok(Self { workers })
    }

    /// `None` or `Some(0)` mean one worker per processing unit
    pub fn with_workers(workers: Option<usize>) -> Self {
        let workers = match workers {
            Some(n) if n > 0 => n,
            _ => default_workers(),
        };
        Self { workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Compile every item exactly once.
    ///
    /// Returns after every result went through `handler`. Compiler failures
    /// only show up in the summary; an `Err` means the pool itself broke
    /// (a thread couldn't start or panicked).
    pub fn run(
        &self,
        compiler: &dyn Compiler,
        items: Vec<WorkItem>,
        handler: &dyn ResultHandler,
    ) -> Result<BuildSummary> {
        info!(
            "Going to compile {} script(s) with {} worker(s)",
            items.len(),
            self.workers
        );

        thread::scope(|scope| -> Result<BuildSummary> {
            let (work_tx, work_rx) = bounded::<WorkItem>(self.workers);
            let (result_tx, result_rx) = bounded::<CompilerResult>(self.workers);

            let aggregator = thread::Builder::new()
                .name("papy-results".to_string())
                .spawn_scoped(scope, move || {
                    let mut summary = BuildSummary::default();
                    for result in result_rx {
                        if let Some(error) = &result.error {
                            debug!("{} failed: {}", result.source_path().display(), error);
                        }
                        summary.record(&result);
                        handler.handle(result);
                    }
                    summary
                })
                .map_err(|source| PapyError::ThreadSpawn {
                    name: "result aggregator",
                    source,
                })?;

            let mut workers = Vec::with_capacity(self.workers);
            for id in 0..self.workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let worker = thread::Builder::new()
                    .name(format!("papy-worker-{id}"))
                    .spawn_scoped(scope, move || {
                        for item in work_rx {
                            let result = compiler.compile(&item);
                            if result_tx.send(result).is_err() {
                                // Aggregator is gone, nobody would see the rest
                                break;
                            }
                        }
                        debug!("worker {id} done");
                    })
                    .map_err(|source| PapyError::ThreadSpawn {
                        name: "worker",
                        source,
                    })?;
                workers.push(worker);
            }
            drop(work_rx);

            // Only fails if every worker already exited
            let mut dispatched_all = true;
            for item in items {
                if work_tx.send(item).is_err() {
                    dispatched_all = false;
                    break;
                }
            }
            drop(work_tx);

            let mut worker_panicked = false;
            for worker in workers {
                worker_panicked |= worker.join().is_err();
            }
            drop(result_tx);

            let summary = aggregator
                .join()
                .map_err(|_| PapyError::ThreadPanicked("result aggregator"))?;

            if worker_panicked {
                return Err(PapyError::ThreadPanicked("worker"));
            }
            if !dispatched_all {
                return Err(PapyError::Disconnected);
            }

            info!(
                "Compiled {} script(s), {} failed",
                summary.attempted, summary.failed
            );
            Ok(summary)
        })
    }
}
