#![cfg(unix)]

use papy_test_helpers::fixtures::{at, ProjectFixture};
use papy_test_helpers::mocks::fake_compiler;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

fn start_watch(fx: &ProjectFixture, project: &Path) -> Child {
    let compiler = fake_compiler(fx.root());
    let settings = fx.root().join("settings.yaml");
    papy_core::Settings {
        compiler_path: Some(compiler),
        game_path: None,
    }
    .save(&settings)
    .unwrap();

    Command::new(env!("CARGO_BIN_EXE_papy"))
        .arg("--config")
        .arg(&settings)
        .arg("watch")
        .arg(project)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start watch mode")
}

fn call_count(out: &Path) -> usize {
    fs::read_to_string(out.join("calls.log"))
        .map(|log| log.lines().count())
        .unwrap_or(0)
}

/// Watch mode starts and performs the initial compilation
#[test]
fn test_watch_mode_starts() {
    let fx = ProjectFixture::new(1, 1);
    let project: PathBuf = fx.write_project_file(false);
    fx.script(0, "Quest", at(10));

    let mut child = start_watch(&fx, &project);
    thread::sleep(Duration::from_millis(800));
    child.kill().expect("Failed to kill watch process");

    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Watching"));
    assert!(stdout.contains("Initial compilation"));
    assert!(fx.output(0).join("Quest.pex").exists());
}

/// Saving a script triggers one more build
#[test]
fn test_watch_mode_recompiles_on_change() {
    let fx = ProjectFixture::new(1, 1);
    let project = fx.write_project_file(false);
    let script = fx.script(0, "Quest", at(10));

    let mut child = start_watch(&fx, &project);
    thread::sleep(Duration::from_millis(800));
    assert_eq!(call_count(fx.output(0)), 1);

    // Content changes get a fresh modification time
    fs::write(&script, "Scriptname Quest extends Quest\n").unwrap();
    thread::sleep(Duration::from_millis(1500));

    child.kill().expect("Failed to kill watch process");
    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("recompiling"));
    assert_eq!(call_count(fx.output(0)), 2);
}
