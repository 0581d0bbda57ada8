//! External compiler invocation.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::{debug, info};

use crate::project::Project;
use crate::scanner::WorkItem;

/// Separator of the import folder list passed with `-i`
pub const IMPORT_SEPARATOR: &str = ";";

/// Why a single compilation failed
#[derive(Debug, Error)]
pub enum CompileFailure {
    #[error("cannot start compiler: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("compiler failed with {0}")]
    Status(ExitStatus),

    /// Failure reported by a non-process compiler (mocks, wrappers)
    #[error("{0}")]
    Other(String),
}

/// Outcome of one compilation
#[derive(Debug)]
pub struct CompilerResult {
    pub item: WorkItem,
    /// Arguments joined with spaces, for error reports
    pub command: String,
    /// stdout followed by stderr
    pub output: String,
    pub error: Option<CompileFailure>,
}

impl CompilerResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn source_path(&self) -> &Path {
        &self.item.source_path
    }
}

/// Compiles one script at a time.
///
/// Implementations must not panic or return early: every failure ends up in
/// [`CompilerResult::error`] so that one broken script doesn't stop the others.
pub trait Compiler: Send + Sync {
    fn compile(&self, item: &WorkItem) -> CompilerResult;
}

/// The Papyrus compiler executable
#[derive(Debug, Clone)]
pub struct PapyrusCompiler {
    executable: PathBuf,
    imports: String,
    flags: String,
    optimize: bool,
}

impl PapyrusCompiler {
    pub fn new(executable: impl Into<PathBuf>, project: &Project) -> Self {
        let imports = project
            .imports
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>()
            .join(IMPORT_SEPARATOR);
        Self {
            executable: executable.into(),
            imports,
            flags: project.flags.clone(),
            optimize: project.optimize,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// `<source> -o=<dest> -i=<imports> -f=<flags> [-o]`
    pub fn arguments(&self, item: &WorkItem) -> Vec<String> {
        let mut args = vec![
            item.source_path.to_string_lossy().into_owned(),
            flag("o", &item.destination_folder.to_string_lossy()),
            flag("i", &self.imports),
            flag("f", &self.flags),
        ];
        if self.optimize {
            args.push("-o".to_string());
        }
        args
    }
}

fn flag(name: &str, value: &str) -> String {
    format!("-{name}={value}")
}

impl Compiler for PapyrusCompiler {
    fn compile(&self, item: &WorkItem) -> CompilerResult {
        info!(
            "Compiling {} -> {}",
            item.source_path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default(),
            item.destination_folder.display()
        );
        let args = self.arguments(item);
        let command = args.join(" ");
        debug!("{} {}", self.executable.display(), command);

        let (output, error) = match Command::new(&self.executable).args(&args).output() {
            Ok(out) => {
                let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&out.stderr));
                let error = (!out.status.success()).then_some(CompileFailure::Status(out.status));
                (text, error)
            }
            Err(e) => (String::new(), Some(CompileFailure::Spawn(e))),
        };

        CompilerResult {
            item: item.clone(),
            command,
            output,
            error,
        }
    }
}
