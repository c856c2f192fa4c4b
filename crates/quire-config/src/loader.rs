//! Configuration file loading

use crate::ClassifierConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while loading or interpreting configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not valid for its format
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        /// Format name (toml, yaml, json)
        format: &'static str,
        /// Parser message
        message: String,
    },

    /// The extension does not map to a supported format
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A field holds a value that cannot be used
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Field name
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// `llm_provider` names a backend that does not exist
    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Supported on-disk formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (`.toml`)
    Toml,
    /// YAML (`.yaml`, `.yml`)
    Yaml,
    /// JSON (`.json`)
    Json,
}

impl ConfigFormat {
    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                other.to_string()
            })),
        }
    }
}

/// Loads [`ClassifierConfig`] from disk
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    ///
    /// A missing file yields [`ClassifierConfig::default`]. Any other read
    /// failure, or content that does not parse, is an error.
    pub async fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<ClassifierConfig> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Config file not found, using defaults");
                return Ok(ClassifierConfig::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = Self::load_from_str(&content, format)?;
        debug!(path = %path.display(), ?format, "Loaded classifier config");
        Ok(config)
    }

    /// Parse configuration from a string in the given format
    pub fn load_from_str(content: &str, format: ConfigFormat) -> ConfigResult<ClassifierConfig> {
        match format {
            ConfigFormat::Toml => Self::parse_toml(content),
            ConfigFormat::Yaml => Self::parse_yaml(content),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| ConfigError::Parse {
                format: "json",
                message: e.to_string(),
            }),
        }
    }

    #[cfg(feature = "toml")]
    fn parse_toml(content: &str) -> ConfigResult<ClassifierConfig> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            format: "toml",
            message: e.to_string(),
        })
    }

    #[cfg(not(feature = "toml"))]
    fn parse_toml(_content: &str) -> ConfigResult<ClassifierConfig> {
        Err(ConfigError::UnsupportedFormat(
            "toml (feature disabled)".to_string(),
        ))
    }

    #[cfg(feature = "yaml")]
    fn parse_yaml(content: &str) -> ConfigResult<ClassifierConfig> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            format: "yaml",
            message: e.to_string(),
        })
    }

    #[cfg(not(feature = "yaml"))]
    fn parse_yaml(_content: &str) -> ConfigResult<ClassifierConfig> {
        Err(ConfigError::UnsupportedFormat(
            "yaml (feature disabled)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/b.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("c.YML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("d.json")).unwrap(),
            ConfigFormat::Json
        );
        assert!(matches!(
            ConfigFormat::from_path(Path::new("e.ini")),
            Err(ConfigError::UnsupportedFormat(ref ext)) if ext == "ini"
        ));
    }

    #[test]
    fn test_json_parse_error_names_format() {
        let err = ConfigLoader::load_from_str("{not json", ConfigFormat::Json).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "json", .. }));
    }
}
