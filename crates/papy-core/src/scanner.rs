//! Staleness detection: decides which scripts must be (re)compiled.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{PapyError, Result};
use crate::project::Project;

/// Extension of script sources
pub const SOURCE_EXTENSION: &str = "psc";

/// Extension of compiled scripts
pub const ARTIFACT_EXTENSION: &str = "pex";

/// A script that needs to be compiled, and where its output goes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    pub source_path: PathBuf,
    pub destination_folder: PathBuf,
}

impl WorkItem {
    pub fn new(source_path: impl Into<PathBuf>, destination_folder: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            destination_folder: destination_folder.into(),
        }
    }
}

/// Every script of the project that is new or newer than its compiled
/// version, in source folder then file name order.
pub fn scripts_to_compile(project: &Project) -> Result<Vec<WorkItem>> {
    let primary = project.primary_output()?;
    let mut items = Vec::new();
    for folder in &project.folders {
        scan_folder(folder, &project.output_folders, primary, &mut items)?;
    }
    debug!("{} script(s) to compile", items.len());
    Ok(items)
}

/// Compiled script name for a source file name (`Foo.psc` -> `Foo.pex`)
pub fn artifact_name(source_file_name: &str) -> Option<String> {
    let stem = source_file_name
        .strip_suffix(SOURCE_EXTENSION)?
        .strip_suffix('.')?;
    Some(format!("{stem}.{ARTIFACT_EXTENSION}"))
}

/// Scripts live in one flat folder, subfolders are ignored
fn scan_folder(
    folder: &Path,
    output_folders: &[PathBuf],
    primary: &Path,
    items: &mut Vec<WorkItem>,
) -> Result<()> {
    for (name, meta) in dir_entries(folder)? {
        if meta.is_dir() {
            continue;
        }
        let Some(artifact) = artifact_name(&name) else {
            continue;
        };
        let source_path = folder.join(&name);

        match find_artifact(&artifact, output_folders)? {
            None => {
                debug!("{} was never compiled", source_path.display());
                items.push(WorkItem::new(source_path, primary));
            }
            Some((output_folder, artifact_meta)) => {
                if is_newer(&meta, &artifact_meta, &source_path)? {
                    debug!("{} changed", source_path.display());
                    items.push(WorkItem::new(source_path, output_folder));
                }
            }
        }
    }
    Ok(())
}

/// The first output folder holding the artifact wins, later ones are not
/// looked at.
fn find_artifact<'a>(
    artifact: &str,
    output_folders: &'a [PathBuf],
) -> Result<Option<(&'a Path, Metadata)>> {
    for output_folder in output_folders {
        let path = output_folder.join(artifact);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => return Err(PapyError::ArtifactIsDirectory(path)),
            Ok(meta) => return Ok(Some((output_folder.as_path(), meta))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(source) => return Err(PapyError::Stat { path, source }),
        }
    }
    Ok(None)
}

/// Strictly newer: equal timestamps mean up to date
fn is_newer(source: &Metadata, artifact: &Metadata, source_path: &Path) -> Result<bool> {
    let stat_err = |source| PapyError::Stat {
        path: source_path.to_path_buf(),
        source,
    };
    let source_time = source.modified().map_err(stat_err)?;
    let artifact_time = artifact.modified().map_err(stat_err)?;
    Ok(source_time > artifact_time)
}

/// Entries of a folder sorted by name, with their metadata
pub(crate) fn dir_entries(folder: &Path) -> Result<Vec<(String, Metadata)>> {
    let read_err = |source| PapyError::ReadDir {
        path: folder.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(folder).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let meta = entry.metadata().map_err(|source| PapyError::Stat {
            path: entry.path(),
            source,
        })?;
        entries.push((entry.file_name().to_string_lossy().into_owned(), meta));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}
