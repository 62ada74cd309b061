//! On-disk encodings of the configuration file, chosen by extension.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unsupported configuration format for '{}'", .0.display())]
    Unsupported(PathBuf),

    #[error("file is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("TOML: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Toml,
    Yaml,
}

impl Format {
    /// Pick the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self, FormatError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| FormatError::Unsupported(path.to_path_buf()))
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "toml" => Some(Format::Toml),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T, FormatError> {
        let value = match self {
            Format::Json => serde_json::from_slice(bytes)?,
            Format::Toml => toml::from_str(std::str::from_utf8(bytes)?)?,
            Format::Yaml => serde_yaml::from_slice(bytes)?,
        };
        Ok(value)
    }

    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>, FormatError> {
        let bytes = match self {
            Format::Json => {
                let mut bytes = serde_json::to_vec_pretty(value)?;
                bytes.push(b'\n');
                bytes
            }
            Format::Toml => toml::to_string_pretty(value)?.into_bytes(),
            Format::Yaml => serde_yaml::to_string(value)?.into_bytes(),
        };
        Ok(bytes)
    }
}
