use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a whole run.
///
/// Compiler failures for a single script never show up here: they are
/// captured in [`crate::compiler::CompilerResult`] and reported by the
/// result handler instead.
#[derive(Debug, Error)]
pub enum PapyError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot get directory entries for {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot stat file {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot unmarshal {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot have empty folder")]
    EmptyFolder,

    #[error("folder {0} does not exist or is a file")]
    MissingFolder(PathBuf),

    #[error("project has no output folders")]
    NoOutputFolders,

    #[error("{0} is a directory, expected a compiled script")]
    ArtifactIsDirectory(PathBuf),

    #[error("compiler path is not configured, run `papy setup` first")]
    CompilerNotConfigured,

    #[error("compiler {0} does not exist or is a directory")]
    InvalidCompiler(PathBuf),

    #[error("game path is not configured but the project imports $base_game")]
    GamePathNotConfigured,

    #[error("cannot locate the home directory")]
    NoHomeDir,

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("cannot start {name} thread: {source}")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),

    #[error("work channel disconnected before all scripts were dispatched")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, PapyError>;
