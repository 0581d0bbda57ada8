//! Mock implementations for testing

use papy_core::{CompileFailure, Compiler, CompilerResult, WorkItem};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A compiler that records what it was asked to compile.
///
/// Scripts whose file stem is in the failing list get an error, every other
/// one "compiles" by writing the `.pex` into the destination folder.
#[derive(Debug, Default)]
pub struct MockCompiler {
    failing: Vec<String>,
    calls: Mutex<Vec<WorkItem>>,
}

impl MockCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<WorkItem> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Compiler for MockCompiler {
    fn compile(&self, item: &WorkItem) -> CompilerResult {
        self.calls.lock().unwrap().push(item.clone());

        let stem = item
            .source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let error = if self.failing.contains(&stem) {
            Some(CompileFailure::Other(format!("mock failure for {stem}")))
        } else {
            fs::write(item.destination_folder.join(format!("{stem}.pex")), b"")
                .err()
                .map(|e| CompileFailure::Other(e.to_string()))
        };

        CompilerResult {
            item: item.clone(),
            command: format!("mock {}", item.source_path.display()),
            output: format!("compiled {stem}\n"),
            error,
        }
    }
}

/// Shell script standing in for the real compiler executable.
///
/// It understands the same arguments (`<source> -o=<dir> ...`), appends its
/// command line to `<dir>/calls.log`, fails when the source contains `FAIL`
/// and otherwise writes `<dir>/<stem>.pex`.
#[cfg(unix)]
pub fn fake_compiler(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    const SCRIPT: &str = r#"#!/bin/sh
src="$1"
shift
out=""
for arg in "$@"; do
  case "$arg" in
    -o=*) out="${arg#-o=}" ;;
  esac
done
echo "$src $*" >> "$out/calls.log"
if grep -q FAIL "$src"; then
  echo "$src(1,1): compilation failed"
  exit 1
fi
name=$(basename "$src" .psc)
: > "$out/$name.pex"
echo "Compilation succeeded."
"#;

    let path = dir.join("PapyrusCompiler.exe");
    fs::write(&path, SCRIPT).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
