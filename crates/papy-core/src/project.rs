//! Project descriptor (`papy.yaml`).

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::config::Settings;
use crate::errors::{PapyError, Result};

/// Default project file name, looked up in the working directory
pub const PROJECT_FILE_NAME: &str = "papy.yaml";

/// Flags file passed to the compiler when the project doesn't name one
pub const DEFAULT_FLAGS_FILE: &str = "TESV_Papyrus_Flags.flg";

/// Import placeholder replaced with the vanilla scripts folder
pub const BASE_GAME_IMPORT: &str = "$base_game";

/// Project file as written by the user, before any path is resolved
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
    /// Folders with the scripts to compile
    #[serde(default)]
    pub folders: Vec<String>,

    /// Extra import folders (`-i`), may contain `$base_game`
    #[serde(default)]
    pub imports: Vec<String>,

    /// Output folders, the first one receives scripts never built before
    #[serde(default)]
    pub output_folders: Vec<String>,

    /// Pass `-o` to the compiler
    #[serde(default)]
    pub optimize: bool,

    /// Compiler flags file (`-f`)
    #[serde(default)]
    pub flags: Option<String>,
}

/// A resolved project: every path is absolute and imports include the
/// source folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub folders: Vec<PathBuf>,
    pub imports: Vec<PathBuf>,
    pub output_folders: Vec<PathBuf>,
    pub optimize: bool,
    pub flags: String,
}

impl Project {
    /// Build a project from already absolute folders.
    /// Imports get the source folders appended, as in a loaded project file.
    pub fn new(folders: Vec<PathBuf>, imports: Vec<PathBuf>, output_folders: Vec<PathBuf>) -> Self {
        let mut project = Self {
            folders,
            imports,
            output_folders,
            optimize: false,
            flags: DEFAULT_FLAGS_FILE.to_string(),
        };
        project.add_sources_to_imports();
        project
    }

    /// Read and resolve a project file
    pub fn from_file(path: &Path, settings: &Settings) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PapyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path, settings)
    }

    /// Resolve the YAML content of the project file at `path`.
    ///
    /// Relative folders are resolved against the directory holding the file.
    pub fn parse(content: &str, path: &Path, settings: &Settings) -> Result<Self> {
        let file: ProjectFile =
            serde_yaml::from_str(content).map_err(|source| PapyError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        let base_dir = absolute(path.parent().unwrap_or(Path::new("")))?;
        Self::resolve(file, &base_dir, settings)
    }

    fn resolve(file: ProjectFile, base_dir: &Path, settings: &Settings) -> Result<Self> {
        let to_abs = |p: &String| normalize(&base_dir.join(p));

        let mut imports = Vec::with_capacity(file.imports.len());
        for import in &file.imports {
            if import == BASE_GAME_IMPORT {
                imports.push(normalize(&settings.base_game_scripts()?));
            } else {
                imports.push(to_abs(import));
            }
        }

        let mut project = Self {
            folders: file.folders.iter().map(to_abs).collect(),
            imports,
            output_folders: file.output_folders.iter().map(to_abs).collect(),
            optimize: file.optimize,
            flags: file.flags.unwrap_or_else(|| DEFAULT_FLAGS_FILE.to_string()),
        };
        project.add_sources_to_imports();
        debug!(
            "Project: {} source folder(s), {} import(s), {} output folder(s)",
            project.folders.len(),
            project.imports.len(),
            project.output_folders.len()
        );
        Ok(project)
    }

    /// Append every source folder missing from the imports, otherwise the
    /// compiler can't see scripts living next to the one it compiles.
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn add_sources_to_imports(&mut self) {
        let mut merged: Vec<PathBuf> = Vec::with_capacity(self.imports.len() + self.folders.len());
        for folder in self.imports.iter().chain(self.folders.iter()) {
            if !merged.contains(folder) {
                merged.push(folder.clone());
            }
        }
        self.imports = merged;
    }

    /// The folder receiving scripts that were never compiled
    pub fn primary_output(&self) -> Result<&Path> {
        self.output_folders
            .first()
            .map(PathBuf::as_path)
            .ok_or(PapyError::NoOutputFolders)
    }

    /// Make sure every folder of the project exists
    pub fn check_folders(&self) -> Result<()> {
        if self.output_folders.is_empty() {
            return Err(PapyError::NoOutputFolders);
        }
        self.folders
            .iter()
            .chain(&self.imports)
            .chain(&self.output_folders)
            .try_for_each(|folder| check_folder(folder))
    }
}

fn check_folder(folder: &Path) -> Result<()> {
    if folder.as_os_str().is_empty() {
        return Err(PapyError::EmptyFolder);
    }
    match std::fs::metadata(folder) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PapyError::MissingFolder(folder.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PapyError::MissingFolder(folder.to_path_buf()))
        }
        Err(source) => Err(PapyError::Stat {
            path: folder.to_path_buf(),
            source,
        }),
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir().map_err(|source| PapyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize(&cwd.join(path)))
}

/// Lexically drop `.` and fold `..`, without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
