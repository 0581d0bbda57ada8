use assert_cmd::Command;
use indoc::indoc;
use papy_test_helpers::fixtures::{at, ProjectFixture};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn papy_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("papy"))
}

/// Settings file pointing at `compiler`, placed next to the project
fn write_settings(fx: &ProjectFixture, compiler: Option<&Path>) -> PathBuf {
    let settings = papy_core::Settings {
        compiler_path: compiler.map(Path::to_path_buf),
        game_path: None,
    };
    let path = fx.root().join("settings.yaml");
    settings.save(&path).unwrap();
    path
}

// ============================================================================
// GENERAL
// ============================================================================

#[test]
fn test_help_lists_commands() {
    papy_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("incremental"))
        .stdout(predicate::str::contains("unbound"))
        .stdout(predicate::str::contains("missing"))
        .stdout(predicate::str::contains("setup"));
}

#[test]
fn test_missing_project_file() {
    let fx = ProjectFixture::new(1, 1);
    let settings = write_settings(&fx, None);

    papy_cmd()
        .current_dir(fx.root())
        .arg("--config")
        .arg(&settings)
        .arg("incremental")
        .assert()
        .failure()
        .stderr(predicate::str::contains("papy.yaml"));
}

#[test]
fn test_invalid_project_file() {
    let fx = ProjectFixture::new(1, 1);
    let settings = write_settings(&fx, None);
    fs::write(
        fx.root().join("papy.yaml"),
        indoc! {"
            folders: [src0]
            output_folders: [out0]
            compress: true
        "},
    )
    .unwrap();

    papy_cmd()
        .current_dir(fx.root())
        .arg("--config")
        .arg(&settings)
        .arg("incremental")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot unmarshal"));
}

#[test]
fn test_missing_folder_is_reported() {
    let fx = ProjectFixture::new(1, 1);
    let settings = write_settings(&fx, None);
    fs::write(
        fx.root().join("papy.yaml"),
        indoc! {"
            folders: [src0, nowhere]
            output_folders: [out0]
        "},
    )
    .unwrap();

    papy_cmd()
        .current_dir(fx.root())
        .arg("--config")
        .arg(&settings)
        .arg("missing")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_incremental_requires_compiler() {
    let fx = ProjectFixture::new(1, 1);
    let settings = write_settings(&fx, None);
    let project = fx.write_project_file(false);

    papy_cmd()
        .arg("--config")
        .arg(&settings)
        .arg("incremental")
        .arg(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("papy setup"));
}

// ============================================================================
// ORPHANS
// ============================================================================

#[test]
fn test_unbound_prints_artifacts_without_source() {
    let fx = ProjectFixture::new(1, 1);
    let settings = write_settings(&fx, None);
    let project = fx.write_project_file(false);
    for name in ["Alpha", "Beta", "Gamma"] {
        fx.artifact(0, name, at(1));
    }
    for name in ["Alpha", "Gamma"] {
        fx.script(0, name, at(1));
    }

    papy_cmd()
        .arg("--config")
        .arg(&settings)
        .arg("unbound")
        .arg(&project)
        .assert()
        .success()
        .stdout("beta.pex\n");
}

#[test]
fn test_missing_prints_sources_without_artifact() {
    let fx = ProjectFixture::new(2, 2);
    let settings = write_settings(&fx, None);
    let project = fx.write_project_file(false);
    fx.script(0, "Built", at(1));
    fx.script(1, "Fresh", at(1));
    fx.artifact(1, "Built", at(1));

    papy_cmd()
        .arg("--config")
        .arg(&settings)
        .arg("missing")
        .arg(&project)
        .assert()
        .success()
        .stdout("fresh.psc\n");
}

#[test]
fn test_unbound_with_several_outputs_keeps_stdout_to_names() {
    let fx = ProjectFixture::new(1, 2);
    let settings = write_settings(&fx, None);
    let project = fx.write_project_file(false);
    fx.script(0, "Kept", at(1));
    fx.artifact(0, "Kept", at(1));
    fx.artifact(0, "Old", at(1));
    fx.artifact(1, "Gone", at(1));

    papy_cmd()
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&settings)
        .arg("unbound")
        .arg(&project)
        .assert()
        .success()
        .stdout("old.pex\ngone.pex\n")
        .stderr(predicate::str::contains("Unbound scripts in"));
}

// ============================================================================
// LOGGING
// ============================================================================

#[test]
fn test_rust_log_enables_debug() {
    let fx = ProjectFixture::new(1, 1);
    let settings = write_settings(&fx, None);
    let project = fx.write_project_file(false);

    papy_cmd()
        .env("RUST_LOG", "debug")
        .arg("--config")
        .arg(&settings)
        .arg("missing")
        .arg(&project)
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG"));
}

#[test]
fn test_rust_log_silences_info() {
    let fx = ProjectFixture::new(1, 2);
    let settings = write_settings(&fx, None);
    let project = fx.write_project_file(false);
    fx.artifact(0, "Old", at(1));
    fx.artifact(1, "Gone", at(1));

    papy_cmd()
        .env("RUST_LOG", "warn")
        .arg("--config")
        .arg(&settings)
        .arg("unbound")
        .arg(&project)
        .assert()
        .success()
        .stdout("old.pex\ngone.pex\n")
        .stderr(predicate::str::contains("INFO").not());
}

#[test]
fn test_verbose_flag_enables_debug() {
    let fx = ProjectFixture::new(1, 1);
    let settings = write_settings(&fx, None);
    let project = fx.write_project_file(false);

    papy_cmd()
        .env("RUST_LOG", "warn")
        .arg("-v")
        .arg("--config")
        .arg(&settings)
        .arg("missing")
        .arg(&project)
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG"));
}

// ============================================================================
// SETUP
// ============================================================================

#[test]
fn test_setup_discovers_compiler() {
    let fx = ProjectFixture::new(0, 0);
    let game = fx.root().join("Skyrim");
    let compiler = game.join("Papyrus Compiler").join("PapyrusCompiler.exe");
    fs::create_dir_all(game.join("Papyrus Compiler")).unwrap();
    fs::write(&compiler, b"").unwrap();
    let settings = fx.root().join("settings.yaml");

    papy_cmd()
        .arg("--config")
        .arg(&settings)
        .arg("setup")
        .arg("--game-path")
        .arg(&game)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));

    let loaded = papy_core::Settings::load(&settings).unwrap();
    assert_eq!(loaded.game_path.as_deref(), Some(game.as_path()));
    assert_eq!(loaded.compiler_path, Some(compiler));

    // Existing file is kept unless forced
    papy_cmd()
        .arg("--config")
        .arg(&settings)
        .arg("setup")
        .arg("--game-path")
        .arg(&game)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    papy_cmd()
        .arg("--config")
        .arg(&settings)
        .arg("setup")
        .arg("--game-path")
        .arg(&game)
        .arg("--force")
        .assert()
        .success();
}

#[test]
fn test_setup_without_compiler_fails() {
    let fx = ProjectFixture::new(0, 0);
    let settings = fx.root().join("settings.yaml");

    papy_cmd()
        .arg("--config")
        .arg(&settings)
        .arg("setup")
        .arg("--game-path")
        .arg(fx.root())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--compiler-path"));
    assert!(!settings.exists());
}

// ============================================================================
// INCREMENTAL BUILDS (fake compiler is a shell script)
// ============================================================================

#[cfg(unix)]
mod with_fake_compiler {
    use super::*;
    use papy_test_helpers::mocks::fake_compiler;

    fn calls(out: &Path) -> Vec<String> {
        fs::read_to_string(out.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_incremental_compiles_new_and_changed_scripts() {
        let fx = ProjectFixture::new(1, 2);
        let compiler = fake_compiler(fx.root());
        let settings = write_settings(&fx, Some(&compiler));
        let project = fx.write_project_file(false);

        fx.script(0, "New", at(10));
        fx.script(0, "Changed", at(50));
        fx.script(0, "Clean", at(10));
        fx.artifact(1, "Changed", at(20));
        fx.artifact(1, "Clean", at(20));

        papy_cmd()
            .arg("--config")
            .arg(&settings)
            .arg("incremental")
            .arg(&project)
            .arg("-w")
            .arg("2")
            .assert()
            .success();

        assert!(fx.output(0).join("New.pex").exists());
        assert_eq!(calls(fx.output(0)).len(), 1);
        assert_eq!(calls(fx.output(1)).len(), 1);
        assert!(calls(fx.output(1))[0].contains("Changed.psc"));

        // Everything is up to date now
        papy_cmd()
            .arg("--config")
            .arg(&settings)
            .arg("incremental")
            .arg(&project)
            .assert()
            .success();
        assert_eq!(calls(fx.output(0)).len(), 1);
        assert_eq!(calls(fx.output(1)).len(), 1);
    }

    #[test]
    fn test_compiler_arguments() {
        let fx = ProjectFixture::new(1, 1);
        let compiler = fake_compiler(fx.root());
        let settings = write_settings(&fx, Some(&compiler));
        let project = fx.write_project_file(true);
        let script = fx.script(0, "Quest", at(10));

        papy_cmd()
            .arg("--config")
            .arg(&settings)
            .arg("incremental")
            .arg(&project)
            .assert()
            .success();

        let line = calls(fx.output(0)).pop().unwrap();
        let prefix = format!("{} -o={}", script.display(), fx.output(0).display());
        assert!(line.starts_with(&prefix));
        assert!(line.contains(&format!("-i={}", fx.source(0).display())));
        assert!(line.contains("-f=TESV_Papyrus_Flags.flg"));
        assert!(line.ends_with(" -o"));
    }

    #[test]
    fn test_failed_script_fails_the_run_but_not_the_others() {
        let fx = ProjectFixture::new(1, 1);
        let compiler = fake_compiler(fx.root());
        let settings = write_settings(&fx, Some(&compiler));
        let project = fx.write_project_file(false);

        let broken = fx.script_with(0, "Broken", "FAIL here", at(10));
        for name in ["A", "B", "C"] {
            fx.script(0, name, at(10));
        }

        papy_cmd()
            .arg("--config")
            .arg(&settings)
            .arg("incremental")
            .arg(&project)
            .arg("--workers")
            .arg("1")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error while compiling"))
            .stderr(predicate::str::contains(format!(
                "{} -o={} -i=",
                broken.display(),
                fx.output(0).display()
            )))
            .stderr(predicate::str::contains("compilation failed"));

        for name in ["A", "B", "C"] {
            assert!(fx.output(0).join(format!("{name}.pex")).exists());
        }
        assert!(!fx.output(0).join("Broken.pex").exists());
    }

    #[test]
    fn test_nothing_to_compile_succeeds() {
        let fx = ProjectFixture::new(1, 1);
        let compiler = fake_compiler(fx.root());
        let settings = write_settings(&fx, Some(&compiler));
        let project = fx.write_project_file(false);

        papy_cmd()
            .arg("--config")
            .arg(&settings)
            .arg("incremental")
            .arg(&project)
            .assert()
            .success();
        assert!(calls(fx.output(0)).is_empty());
    }
}
