//! On-disk project layouts

use papy_core::Project;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// A fixed point in time plus `secs`, so tests don't depend on the clock
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + secs)
}

/// Create (or overwrite) a file and set its modification time
pub fn touch(path: &Path, mtime: SystemTime) {
    touch_with(path, "", mtime);
}

/// Like [`touch`], with content
pub fn touch_with(path: &Path, content: &str, mtime: SystemTime) {
    fs::write(path, content).unwrap();
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}

pub fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

/// A temporary mod folder with source folders, output folders and
/// a `papy.yaml` describing them.
///
/// ```text
/// <root>/src0, src1, ...   source folders
/// <root>/out0, out1, ...   output folders, out0 is the primary one
/// ```
pub struct ProjectFixture {
    dir: TempDir,
    sources: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
}

impl ProjectFixture {
    pub fn new(source_folders: usize, output_folders: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let make = |prefix: &str, n: usize| -> Vec<PathBuf> {
            (0..n)
                .map(|i| {
                    let path = dir.path().join(format!("{prefix}{i}"));
                    fs::create_dir(&path).unwrap();
                    path
                })
                .collect()
        };
        let sources = make("src", source_folders);
        let outputs = make("out", output_folders);
        Self {
            dir,
            sources,
            outputs,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn source(&self, i: usize) -> &Path {
        &self.sources[i]
    }

    pub fn output(&self, i: usize) -> &Path {
        &self.outputs[i]
    }

    /// Write `<src i>/<name>.psc`
    pub fn script(&self, folder: usize, name: &str, mtime: SystemTime) -> PathBuf {
        let path = self.source(folder).join(format!("{name}.psc"));
        touch(&path, mtime);
        path
    }

    /// Write `<src i>/<name>.psc` with content
    pub fn script_with(
        &self,
        folder: usize,
        name: &str,
        content: &str,
        mtime: SystemTime,
    ) -> PathBuf {
        let path = self.source(folder).join(format!("{name}.psc"));
        touch_with(&path, content, mtime);
        path
    }

    /// Write `<out i>/<name>.pex`
    pub fn artifact(&self, folder: usize, name: &str, mtime: SystemTime) -> PathBuf {
        let path = self.output(folder).join(format!("{name}.pex"));
        touch(&path, mtime);
        path
    }

    /// The resolved project for this layout
    pub fn project(&self) -> Project {
        Project::new(self.sources.clone(), Vec::new(), self.outputs.clone())
    }

    /// Write `papy.yaml` with relative folder names and return its path
    pub fn write_project_file(&self, optimize: bool) -> PathBuf {
        let names = |folders: &[PathBuf]| {
            folders
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let yaml = format!(
            "folders: [{}]\noutput_folders: [{}]\noptimize: {}\n",
            names(&self.sources),
            names(&self.outputs),
            optimize
        );
        let path = self.root().join("papy.yaml");
        fs::write(&path, yaml).unwrap();
        path
    }
}
