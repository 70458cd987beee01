use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "mini-ca.toml";

/// `chrono` format for validity dates typed at the prompt.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MiniCaConfig {
    #[serde(default)]
    pub directories: Directories,
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Directories {
    /// Where new bundles are written when `--out` is not given
    #[serde(default = "default_directory")]
    pub output: PathBuf,
    /// Where parent bundles are read from when `--in` is not given
    #[serde(default = "default_directory")]
    pub input: PathBuf,
}

impl Default for Directories {
    fn default() -> Self {
        Self {
            output: default_directory(),
            input: default_directory(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
        }
    }
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl MiniCaConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Self> {
        toml::from_str(config_str).context("Failed to parse config file")
    }

    /// An explicit path must exist. Otherwise `mini-ca.toml` is used when present
    /// and the built-in defaults when not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
                Self::from_file(DEFAULT_CONFIG_PATH)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = MiniCaConfig::from_toml("").unwrap();
        assert_eq!(config.directories.output, PathBuf::from("."));
        assert_eq!(config.directories.input, PathBuf::from("."));
        assert_eq!(config.prompt.date_format, DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn test_partial_config() {
        let config = MiniCaConfig::from_toml(
            r#"
            [directories]
            output = "out/ca"

            [prompt]
            date_format = "%Y-%m-%d"
            "#,
        )
        .unwrap();
        assert_eq!(config.directories.output, PathBuf::from("out/ca"));
        assert_eq!(config.directories.input, PathBuf::from("."));
        assert_eq!(config.prompt.date_format, "%Y-%m-%d");
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(MiniCaConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_rejects_bad_toml() {
        assert!(MiniCaConfig::from_toml("[directories\noutput = 1").is_err());
    }
}
