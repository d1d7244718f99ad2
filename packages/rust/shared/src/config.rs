//! Application configuration for texforge.
//!
//! User config lives at `~/.texforge/texforge.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TexforgeError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "texforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".texforge";

// ---------------------------------------------------------------------------
// Config structs (matching texforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// External toolchain settings.
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Build policies.
    #[serde(default)]
    pub build: BuildPolicyConfig,
}

/// `[toolchain]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Typesetting engine command.
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Bibliography resolution command.
    #[serde(default = "default_bibliography_tool")]
    pub bibliography_tool: String,

    /// Engine-owned multipass driver, used when no bibliography exists.
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Bounded wait per external invocation, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Directory of reusable style assets, passed to every invocation
    /// via the `TEXINPUTS` search path. `~` expands to the user's home.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            bibliography_tool: default_bibliography_tool(),
            driver: default_driver(),
            timeout_secs: default_timeout_secs(),
            assets_dir: default_assets_dir(),
        }
    }
}

fn default_engine() -> String {
    "pdflatex".into()
}
fn default_bibliography_tool() -> String {
    "bibtex".into()
}
fn default_driver() -> String {
    "latexmk".into()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_assets_dir() -> String {
    "~/.texforge/assets".into()
}

impl ToolchainConfig {
    /// Resolve the assets directory to an absolute path, expanding a
    /// leading `~`. Returns `None` if the directory does not exist, in
    /// which case the search path is simply not set on child processes.
    pub fn resolved_assets_dir(&self) -> Option<PathBuf> {
        let path = expand_tilde(&self.assets_dir)?;
        path.is_dir().then_some(path)
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildPolicyConfig {
    /// Strict policy: treat a missing `refs.bib` as a fatal
    /// precondition failure instead of a non-bibliography build.
    #[serde(default)]
    pub require_bibliography: bool,
}

impl Default for BuildPolicyConfig {
    fn default() -> Self {
        Self {
            require_bibliography: false,
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_tilde(path: &str) -> Option<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        Some(dirs::home_dir()?.join(rest))
    } else if path == "~" {
        dirs::home_dir()
    } else {
        Some(PathBuf::from(path))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.texforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TexforgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.texforge/texforge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TexforgeError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TexforgeError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TexforgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TexforgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TexforgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("pdflatex"));
        assert!(toml_str.contains("bibtex"));
        assert!(toml_str.contains("latexmk"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.toolchain.engine, "pdflatex");
        assert_eq!(parsed.toolchain.timeout_secs, 120);
        assert!(!parsed.build.require_bibliography);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[toolchain]
engine = "lualatex"

[build]
require_bibliography = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.toolchain.engine, "lualatex");
        assert_eq!(config.toolchain.bibliography_tool, "bibtex");
        assert!(config.build.require_bibliography);
    }

    #[test]
    fn load_config_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_from(&dir.path().join("nope.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn resolved_assets_dir_skips_missing_directory() {
        let toolchain = ToolchainConfig {
            assets_dir: "/definitely/not/a/real/dir".into(),
            ..Default::default()
        };
        assert!(toolchain.resolved_assets_dir().is_none());
    }

    #[test]
    fn resolved_assets_dir_accepts_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let toolchain = ToolchainConfig {
            assets_dir: dir.path().to_string_lossy().into_owned(),
            ..Default::default()
        };
        assert_eq!(toolchain.resolved_assets_dir(), Some(dir.path().to_path_buf()));
    }
}
