//! `$XDG_CONFIG_HOME/<app>/config.toml`: the `[env]` table and typed sections.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::LoadError;

/// `$XDG_CONFIG_HOME/<app>/config.toml`, falling back to the platform config dir.
/// `None` when neither is known (no `HOME`).
pub fn config_path(app_name: &str) -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)?;
    Some(base.join(app_name).join("config.toml"))
}

/// Parsed file, or `None` when it does not exist.
pub fn read_table(path: &Path) -> Result<Option<toml::Table>, LoadError> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let table = content
        .parse::<toml::Table>()
        .map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(table))
}

/// String values of the `[env]` table. Non-string values are rendered as TOML literals.
pub fn env_map(table: &toml::Table) -> HashMap<String, String> {
    let Some(toml::Value::Table(env)) = table.get("env") else {
        return HashMap::new();
    };
    env.iter()
        .map(|(k, v)| {
            let value = match v {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}

/// Deserializes `[section]`; a missing section yields `T::default()`.
pub fn section<T>(table: &toml::Table, section: &str) -> Result<T, LoadError>
where
    T: DeserializeOwned + Default,
{
    match table.get(section) {
        None => Ok(T::default()),
        Some(value) => value
            .clone()
            .try_into()
            .map_err(|source| LoadError::Section {
                section: section.to_string(),
                source,
            }),
    }
}
