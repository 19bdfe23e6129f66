//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/flowtable/flowtable.toml`
//! 3. Local config: `<project_dir>/.flowtable.toml`
//! 4. Environment variables: `FLOWTABLE_*` prefix

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::ValueEnum;
use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// How the table is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per row, indented by depth
    #[default]
    Table,
    /// Box-drawing tree
    Tree,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Tree => write!(f, "tree"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "tree" => Ok(OutputFormat::Tree),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// Raw settings for intermediate parsing (every field optional to detect
/// "not specified" while merging layers).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub indent: Option<usize>,
    pub format: Option<OutputFormat>,
    pub show_status: Option<bool>,
    pub show_paired_end: Option<bool>,
    pub color: Option<bool>,
}

/// Unified configuration for flowtable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Spaces per depth level in table output (default: 2)
    pub indent: usize,
    /// Output format (default: table)
    pub format: OutputFormat,
    /// Show the node status next to each row
    pub show_status: bool,
    /// Show the label of the region end folded into a start row
    pub show_paired_end: bool,
    /// Colored output; NO_COLOR still wins
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            indent: 2,
            format: OutputFormat::Table,
            show_status: true,
            show_paired_end: true,
            color: true,
        }
    }
}

/// Get the XDG config directory for flowtable.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "flowtable").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("flowtable.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".flowtable.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// An unset variable keeps the current value; a malformed one is an error.
fn env_value<T>(
    result: Result<T, ConfigError>,
    var: &str,
) -> Result<Option<T>, ApplicationError> {
    match result {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::Config {
            message: format!("{}: {}", var, e),
        }),
    }
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            indent: overlay.indent.unwrap_or(self.indent),
            format: overlay.format.unwrap_or(self.format),
            show_status: overlay.show_status.unwrap_or(self.show_status),
            show_paired_end: overlay.show_paired_end.unwrap_or(self.show_paired_end),
            color: overlay.color.unwrap_or(self.color),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory for local config
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/flowtable/flowtable.toml`
    /// 3. Local config: `<project_dir>/.flowtable.toml`
    /// 4. Environment variables: `FLOWTABLE_*` prefix
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Apply FLOWTABLE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(Environment::with_prefix("FLOWTABLE").try_parsing(true))
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value(config.get_int("indent"), "FLOWTABLE_INDENT")? {
            settings.indent = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("FLOWTABLE_INDENT must not be negative: {}", val),
            })?;
        }
        if let Some(val) = env_value(config.get_string("format"), "FLOWTABLE_FORMAT")? {
            settings.format = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Some(val) = env_value(config.get_bool("show_status"), "FLOWTABLE_SHOW_STATUS")? {
            settings.show_status = val;
        }
        if let Some(val) = env_value(
            config.get_bool("show_paired_end"),
            "FLOWTABLE_SHOW_PAIRED_END",
        )? {
            settings.show_paired_end = val;
        }
        if let Some(val) = env_value(config.get_bool("color"), "FLOWTABLE_COLOR")? {
            settings.color = val;
        }

        Ok(settings)
    }

    /// Render settings as TOML (for `config show`).
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_overlay_when_merging_then_specified_fields_win() {
        let base = Settings::default();
        let overlay = RawSettings {
            indent: Some(4),
            format: Some(OutputFormat::Tree),
            ..Default::default()
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.indent, 4);
        assert_eq!(merged.format, OutputFormat::Tree);
        assert!(merged.show_status);
        assert!(merged.color);
    }

    #[test]
    fn given_unset_or_malformed_env_value_when_reading_then_keep_or_fail() {
        let unset: Result<bool, ConfigError> = Err(ConfigError::NotFound("color".into()));
        let malformed: Result<bool, ConfigError> = Err(ConfigError::Message("maybe".into()));

        assert!(matches!(env_value(unset, "FLOWTABLE_COLOR"), Ok(None)));
        assert!(matches!(env_value(Ok(true), "FLOWTABLE_COLOR"), Ok(Some(true))));
        let err = env_value(malformed, "FLOWTABLE_COLOR").unwrap_err();
        assert!(err.to_string().contains("FLOWTABLE_COLOR"));
    }

    #[test]
    fn given_format_names_when_parsing_then_case_insensitive() {
        assert_eq!("Tree".parse::<OutputFormat>(), Ok(OutputFormat::Tree));
        assert_eq!(" table ".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert!("grid".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn given_defaults_when_rendering_toml_then_all_keys_present() {
        let toml = Settings::default().to_toml().unwrap();
        assert!(toml.contains("indent = 2"));
        assert!(toml.contains("format = \"table\""));
        assert!(toml.contains("show_paired_end = true"));
    }
}
