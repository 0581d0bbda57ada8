use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use notify::event::{EventKind, ModifyKind};
use notify::Event;
use papy_core::config::{discover_compiler, Settings};
use papy_core::di::Container;
use papy_core::orphan::{missing_artifacts, unbound_artifacts};
use papy_core::project::{Project, PROJECT_FILE_NAME};
use papy_core::scanner::{ARTIFACT_EXTENSION, SOURCE_EXTENSION};
use papy_core::scheduler::Scheduler;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Papy - packager and incremental compiler for Skyrim Special Edition mods
#[derive(Parser, Debug)]
#[command(name = "papy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (default: ~/.papy.yaml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compiles all new scripts or that have been edited
    Incremental(BuildArgs),

    /// Runs `incremental`, then again every time a script changes
    Watch(BuildArgs),

    /// Prints all compiled scripts with no corresponding source
    Unbound(ProjectArgs),

    /// Prints all scripts that were never compiled
    Missing(ProjectArgs),

    /// Creates the settings file
    Setup {
        /// Game root folder (where SkyrimSE.exe is)
        #[arg(long, value_name = "DIR")]
        game_path: PathBuf,

        /// Compiler executable, looked up in the game folder if omitted
        #[arg(long, value_name = "FILE")]
        compiler_path: Option<PathBuf>,

        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct ProjectArgs {
    /// Project file
    #[arg(value_name = "PROJECT_FILE", default_value = PROJECT_FILE_NAME)]
    project: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct BuildArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Number of workers, 0 for one per cpu core
    #[arg(short, long, default_value_t = 0)]
    workers: usize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG replaces the info default, -v forces debug on top of it.
    // Logs go to stderr, stdout is for listings.
    let mut filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();
    if cli.verbose {
        filter = filter.add_directive(tracing::Level::DEBUG.into());
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let settings_path = match &cli.config {
        Some(path) => path.clone(),
        None => Settings::default_path()?,
    };

    match cli.command {
        Command::Incremental(args) => {
            let settings = load_settings(&settings_path)?;
            if !incremental(&args, settings)? {
                std::process::exit(1);
            }
        }
        Command::Watch(args) => watch_mode(&args, &settings_path)?,
        Command::Unbound(args) => unbound(&args, &settings_path)?,
        Command::Missing(args) => missing(&args, &settings_path)?,
        Command::Setup {
            game_path,
            compiler_path,
            force,
        } => setup(&settings_path, &game_path, compiler_path, force)?,
    }

    Ok(())
}

fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    debug!("Reading settings from {}", path.display());
    Settings::load(path).context("cannot read settings file")
}

fn load_project(args: &ProjectArgs, settings: &Settings) -> anyhow::Result<Project> {
    let project = Project::from_file(&args.project, settings)?;
    project.check_folders()?;
    Ok(project)
}

/// One incremental build. Returns false if any script failed to compile.
fn incremental(args: &BuildArgs, settings: Settings) -> anyhow::Result<bool> {
    let project = load_project(&args.project, &settings)?;
    let container = Container::new(settings, project, std::io::stderr().is_terminal())?;
    if let Some(compiler) = &container.settings().compiler_path {
        debug!("Using compiler {}", compiler.display());
    }

    let scheduler = Scheduler::with_workers(Some(args.workers));
    debug!("Using {} workers", scheduler.workers());

    let summary = container.incremental(&scheduler)?;
    if summary.is_success() {
        info!("Done! {} script(s) compiled", summary.attempted);
    } else {
        error!(
            "{} of {} script(s) failed to compile",
            summary.failed, summary.attempted
        );
    }
    Ok(summary.is_success())
}

fn unbound(args: &ProjectArgs, settings_path: &Path) -> anyhow::Result<()> {
    let settings = load_settings(settings_path)?;
    let project = load_project(args, &settings)?;
    let many = project.output_folders.len() > 1;
    for output in &project.output_folders {
        let orphans = unbound_artifacts(output, &project.folders)?;
        if many && !orphans.is_empty() {
            info!("Unbound scripts in {}", output.display());
        }
        for name in orphans {
            println!("{}.{}", name, ARTIFACT_EXTENSION);
        }
    }
    Ok(())
}

fn missing(args: &ProjectArgs, settings_path: &Path) -> anyhow::Result<()> {
    let settings = load_settings(settings_path)?;
    let project = load_project(args, &settings)?;
    for name in missing_artifacts(&project.folders, &project.output_folders)? {
        println!("{}.{}", name, SOURCE_EXTENSION);
    }
    Ok(())
}

/// Non-interactive replacement for the setup wizard
fn setup(
    settings_path: &Path,
    game_path: &Path,
    compiler_path: Option<PathBuf>,
    force: bool,
) -> anyhow::Result<()> {
    if settings_path.is_dir() {
        bail!(
            "settings path {} is a directory, expected a file",
            settings_path.display()
        );
    }
    if settings_path.exists() && !force {
        bail!(
            "settings file {} already exists, use --force to overwrite it",
            settings_path.display()
        );
    }

    let game_path = std::env::current_dir()?.join(game_path);
    if !game_path.is_dir() {
        bail!("game path {} is not a directory", game_path.display());
    }

    let compiler_path = match compiler_path {
        Some(path) => {
            let path = std::env::current_dir()?.join(path);
            if !path.is_file() {
                bail!("compiler {} must be a file", path.display());
            }
            path
        }
        None => discover_compiler(&game_path)
            .context("cannot find the compiler in the game folder, pass --compiler-path")?,
    };

    let settings = Settings {
        compiler_path: Some(compiler_path),
        game_path: Some(game_path),
    };
    settings
        .save(settings_path)
        .context("error while writing settings file")?;

    println!("{}", settings);
    println!("ok");
    Ok(())
}

/// Watch mode - recompile on script changes
fn watch_mode(args: &BuildArgs, settings_path: &Path) -> anyhow::Result<()> {
    use notify::{RecursiveMode, Watcher};
    use std::sync::mpsc::channel;
    use std::time::{Duration, Instant};

    let settings = load_settings(settings_path)?;
    let project = load_project(&args.project, &settings)?;

    println!("Watching for changes... (Press Ctrl+C to stop)");

    // Initial compilation
    println!("\nInitial compilation:");
    if let Err(e) = incremental(args, settings.clone()) {
        error!("{:#}", e);
    }

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    // Source folders are flat, no need to recurse
    for folder in &project.folders {
        watcher.watch(folder, RecursiveMode::NonRecursive)?;
    }

    let debounce_duration = Duration::from_millis(200);
    let mut pending: Option<Instant> = None;

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                if is_script_change(&event) {
                    pending = Some(Instant::now());
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                bail!("File watcher disconnected");
            }
        }

        // Rebuild once events stop for a moment, a save burst is one build
        if pending.is_some_and(|since| since.elapsed() >= debounce_duration) {
            pending = None;
            println!("\nScript changed, recompiling...");
            if let Err(e) = incremental(args, settings.clone()) {
                error!("{:#}", e);
            }
        }
    }
}

/// A script was created, written or renamed. Some backends only report
/// `Modify(Any)` for writes, so every modification counts except metadata.
fn is_script_change(event: &Event) -> bool {
    let kind_matches = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };
    kind_matches
        && event
            .paths
            .iter()
            .filter_map(|path| path.extension())
            .any(|ext| ext == SOURCE_EXTENSION)
}
