//! Orphan detection between source and output folders.
//!
//! Candidates are collected from one side into a set. Every folder of the
//! other side is then scanned concurrently, and each name found there is sent
//! to the thread owning the set, which removes it. What is left are the
//! orphans. The set is only ever touched by its owner thread.

use crossbeam_channel::{bounded, Sender};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::debug;

use crate::errors::{PapyError, Result};
use crate::scanner::{dir_entries, ARTIFACT_EXTENSION, SOURCE_EXTENSION};

/// Compiled scripts in `output_folder` with no source in any of
/// `source_folders`. Names are lowercased, without extension, sorted.
pub fn unbound_artifacts(output_folder: &Path, source_folders: &[PathBuf]) -> Result<Vec<String>> {
    reconcile(
        std::slice::from_ref(&output_folder.to_path_buf()),
        ARTIFACT_EXTENSION,
        source_folders,
        SOURCE_EXTENSION,
    )
}

/// Sources in `source_folders` that were never compiled into any of
/// `output_folders`. Names are lowercased, without extension, sorted.
pub fn missing_artifacts(
    source_folders: &[PathBuf],
    output_folders: &[PathBuf],
) -> Result<Vec<String>> {
    reconcile(
        source_folders,
        SOURCE_EXTENSION,
        output_folders,
        ARTIFACT_EXTENSION,
    )
}

fn reconcile(
    candidate_folders: &[PathBuf],
    candidate_extension: &str,
    scan_folders: &[PathBuf],
    scan_extension: &str,
) -> Result<Vec<String>> {
    let mut candidates = FxHashSet::default();
    for folder in candidate_folders {
        candidates.extend(base_names(folder, candidate_extension)?);
    }
    debug!(
        "{} .{} candidate(s), scanning {} folder(s) for .{}",
        candidates.len(),
        candidate_extension,
        scan_folders.len(),
        scan_extension
    );

    let remaining = thread::scope(|scope| -> Result<FxHashSet<String>> {
        let (remove_tx, remove_rx) = bounded::<String>(scan_folders.len().max(1));

        let owner = thread::Builder::new()
            .name("papy-set-owner".to_string())
            .spawn_scoped(scope, move || {
                for name in remove_rx {
                    candidates.remove(&name);
                }
                candidates
            })
            .map_err(|source| PapyError::ThreadSpawn {
                name: "set owner",
                source,
            })?;

        let scanned = scan_folders
            .par_iter()
            .try_for_each(|folder| send_base_names(folder, scan_extension, &remove_tx));
        drop(remove_tx);

        let remaining = owner
            .join()
            .map_err(|_| PapyError::ThreadPanicked("set owner"))?;
        scanned.map(|()| remaining)
    })?;

    let mut remaining: Vec<String> = remaining.into_iter().collect();
    remaining.sort();
    Ok(remaining)
}

fn send_base_names(folder: &Path, extension: &str, remove: &Sender<String>) -> Result<()> {
    for name in base_names(folder, extension)? {
        if remove.send(name).is_err() {
            return Err(PapyError::ThreadPanicked("set owner"));
        }
    }
    Ok(())
}

/// Lowercased names of the files in `folder` with `extension`, without it
fn base_names(folder: &Path, extension: &str) -> Result<Vec<String>> {
    let suffix = format!(".{extension}");
    Ok(dir_entries(folder)?
        .into_iter()
        .filter(|(_, meta)| !meta.is_dir())
        .filter_map(|(name, _)| {
            let name = name.to_lowercase();
            name.strip_suffix(&suffix).map(str::to_string)
        })
        .collect())
}
