pub mod compiler;
pub mod config;
pub mod di;
pub mod errors;
pub mod handler;
pub mod orphan;
pub mod project;
pub mod scanner;
pub mod scheduler;

pub use compiler::{CompileFailure, Compiler, CompilerResult, PapyrusCompiler};
pub use config::Settings;
pub use di::Container;
pub use errors::{PapyError, Result};
pub use handler::{BuildSummary, CollectingResultHandler, ConsoleResultHandler, ResultHandler};
pub use orphan::{missing_artifacts, unbound_artifacts};
pub use project::Project;
pub use scanner::{scripts_to_compile, WorkItem, ARTIFACT_EXTENSION, SOURCE_EXTENSION};
pub use scheduler::Scheduler;
