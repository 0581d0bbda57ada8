//! Per-user settings, stored in `~/.papy.yaml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{PapyError, Result};

/// Default settings file name, placed in the home directory
pub const SETTINGS_FILE_NAME: &str = ".papy.yaml";

/// Folder of the compiler inside the game root
pub const COMPILER_FOLDER: &str = "Papyrus Compiler";

/// Compiler executable name
pub const COMPILER_EXECUTABLE: &str = "PapyrusCompiler.exe";

/// Global settings shared by every project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the compiler executable
    #[serde(default)]
    pub compiler_path: Option<PathBuf>,

    /// Path to the game root folder (the one holding the game executable)
    #[serde(default)]
    pub game_path: Option<PathBuf>,
}

impl Settings {
    /// `$HOME/.papy.yaml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(SETTINGS_FILE_NAME))
            .ok_or(PapyError::NoHomeDir)
    }

    /// Load settings from a YAML file.
    ///
    /// A missing file is not an error: it yields empty settings, so commands
    /// that don't need the compiler still work before `papy setup` ran.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(PapyError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| PapyError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write settings to a YAML file, replacing it
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).map_err(|source| PapyError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, yaml).map_err(|source| PapyError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns the configured compiler, making sure it is an existing file
    pub fn check_compiler(&self) -> Result<&Path> {
        let compiler = self
            .compiler_path
            .as_deref()
            .ok_or(PapyError::CompilerNotConfigured)?;
        match std::fs::metadata(compiler) {
            Ok(meta) if meta.is_file() => Ok(compiler),
            _ => Err(PapyError::InvalidCompiler(compiler.to_path_buf())),
        }
    }

    /// Folder with the vanilla script sources, what `$base_game` points to
    pub fn base_game_scripts(&self) -> Result<PathBuf> {
        self.game_path
            .as_ref()
            .map(|game| game.join("Data").join("Source").join("Scripts"))
            .ok_or(PapyError::GamePathNotConfigured)
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unset>".to_string())
        };
        write!(
            f,
            "GamePath: {}\nCompilerPath: {}",
            show(&self.game_path),
            show(&self.compiler_path)
        )
    }
}

/// Locate the compiler inside a game installation
pub fn discover_compiler(game_path: &Path) -> Result<PathBuf> {
    let compiler = game_path.join(COMPILER_FOLDER).join(COMPILER_EXECUTABLE);
    match std::fs::metadata(&compiler) {
        Ok(meta) if meta.is_file() => Ok(compiler),
        Ok(_) => Err(PapyError::InvalidCompiler(compiler)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PapyError::InvalidCompiler(compiler))
        }
        Err(source) => Err(PapyError::Stat {
            path: compiler,
            source,
        }),
    }
}
