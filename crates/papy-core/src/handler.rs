use std::sync::Mutex;

use crate::compiler::CompilerResult;

/// Receives every compilation result, in completion order.
///
/// Only the scheduler's aggregator thread calls `handle`, but handlers are
/// shared through the container, hence `Send + Sync`.
pub trait ResultHandler: Send + Sync {
    fn handle(&self, result: CompilerResult);
}

/// Prints failures to stderr and forgets successes
pub struct ConsoleResultHandler {
    pretty: bool,
}

impl ConsoleResultHandler {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// The text printed for `result`, `None` when it compiled fine
    pub fn report(&self, result: &CompilerResult) -> Option<String> {
        let error = result.error.as_ref()?;
        let header = if self.pretty {
            format!(
                "\x1b[31mError\x1b[0m while compiling \x1b[1m{}\x1b[0m:",
                result.source_path().display()
            )
        } else {
            format!("Error while compiling {}:", result.source_path().display())
        };
        let report = format!("{header}\n{}\n{error}\n{}\n", result.command, result.output);
        Some(report)
    }
}

impl ResultHandler for ConsoleResultHandler {
    fn handle(&self, result: CompilerResult) {
        if let Some(report) = self.report(&result) {
            eprint!("{report}");
        }
    }
}

/// Collecting handler for testing
/// Keeps every result without printing
#[derive(Default)]
pub struct CollectingResultHandler {
    results: Mutex<Vec<CompilerResult>>,
}

impl CollectingResultHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn failure_count(&self) -> usize {
        self.results
            .lock()
            .unwrap()
            .iter()
            .filter(|r| !r.is_success())
            .count()
    }

    pub fn take(&self) -> Vec<CompilerResult> {
        std::mem::take(&mut *self.results.lock().unwrap())
    }
}

impl ResultHandler for CollectingResultHandler {
    fn handle(&self, result: CompilerResult) {
        self.results.lock().unwrap().push(result);
    }
}

/// Counts for one scheduler run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub attempted: usize,
    pub failed: usize,
}

impl BuildSummary {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed
    }

    /// True when nothing failed, including when nothing had to be compiled
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub(crate) fn record(&mut self, result: &CompilerResult) {
        self.attempted += 1;
        if !result.is_success() {
            self.failed += 1;
        }
    }
}
