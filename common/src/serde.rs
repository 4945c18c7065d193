use std::path::Path;

use ::serde::de::DeserializeOwned;
use ::serde::Serialize;
use anyhow::Context;

use crate::file_format::FileFormat;
use crate::normalize_string::NormalizeString;

pub type Result<T> = anyhow::Result<T>;

pub fn serialize<T: Serialize>(value: &T, format: FileFormat) -> Result<String> {
    let text = match format {
        FileFormat::Yaml => serde_yml::to_string(value)?,
        FileFormat::Json => serde_json::to_string_pretty(value)?,
        FileFormat::Toml => toml::to_string(value)?,
    };

    Ok(text.normalize())
}

pub fn deserialize<T: DeserializeOwned>(serialized: &[u8], format: FileFormat) -> Result<T> {
    let text = std::str::from_utf8(serialized)?;
    match format {
        FileFormat::Yaml => Ok(serde_yml::from_str(text)?),
        FileFormat::Json => Ok(serde_json::from_str(text)?),
        FileFormat::Toml => Ok(toml::from_str(text)?),
    }
}

/// Reads `path` and decodes it using the format implied by its extension.
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = FileFormat::from_path(path)?;
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    deserialize(&bytes, format).with_context(|| format!("Failed to parse '{}'", path.display()))
}

/// Encodes `value` using the format implied by the extension of `path` and writes it.
pub fn save_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let format = FileFormat::from_path(path)?;
    let text = serialize(value, format)?;
    std::fs::write(path, text).with_context(|| format!("Failed to write '{}'", path.display()))
}
