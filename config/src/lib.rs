//! Configuration loading for Thoughtweave.
//!
//! Two sources, one file layout:
//!
//! - `$XDG_CONFIG_HOME/<app>/config.toml`: an `[env]` table of environment
//!   defaults plus typed sections such as `[search]`.
//! - a project `.env` file.
//!
//! [`load_and_apply`] sets environment variables with priority
//! **existing env > .env > XDG `[env]`**. [`load_section`] reads one typed table.

mod dotenv;
mod file;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

pub use file::config_path;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid [{section}] section: {source}")]
    Section {
        section: String,
        source: toml::de::Error,
    },
    #[error("read .env: {0}")]
    Dotenv(std::io::Error),
}

/// Applies `.env` and the XDG `[env]` table to the process environment.
///
/// Keys already set in the environment are left alone. `dotenv_dir` overrides
/// where `.env` is looked up (default: current directory).
pub fn load_and_apply(app_name: &str, dotenv_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg = match config_path(app_name) {
        Some(path) => file::read_table(&path)?
            .map(|table| file::env_map(&table))
            .unwrap_or_default(),
        None => HashMap::new(),
    };
    let dotenv = dotenv::load(dotenv_dir).map_err(LoadError::Dotenv)?;
    apply(merge(dotenv, xdg));
    Ok(())
}

/// Reads `[section]` of the app's config file; missing file or section gives `T::default()`.
pub fn load_section<T>(app_name: &str, section: &str) -> Result<T, LoadError>
where
    T: DeserializeOwned + Default,
{
    match config_path(app_name) {
        Some(path) => load_section_from(&path, section),
        None => Ok(T::default()),
    }
}

/// [`load_section`] against an explicit file.
pub fn load_section_from<T>(path: &Path, section: &str) -> Result<T, LoadError>
where
    T: DeserializeOwned + Default,
{
    match file::read_table(path)? {
        Some(table) => file::section(&table, section),
        None => Ok(T::default()),
    }
}

/// `.env` entries win over XDG entries.
fn merge(dotenv: HashMap<String, String>, xdg: HashMap<String, String>) -> HashMap<String, String> {
    let mut merged = xdg;
    merged.extend(dotenv);
    merged
}

fn apply(values: HashMap<String, String>) {
    for (key, value) in values {
        if std::env::var_os(&key).is_none() {
            std::env::set_var(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn dotenv_wins_over_xdg() {
        let merged = merge(
            map(&[("MODEL", "from_dotenv")]),
            map(&[("MODEL", "from_xdg"), ("URL", "from_xdg")]),
        );
        assert_eq!(merged["MODEL"], "from_dotenv");
        assert_eq!(merged["URL"], "from_xdg");
    }

    #[test]
    fn existing_env_is_not_overwritten() {
        env::set_var("TW_CONFIG_TEST_EXISTING", "from_env");
        env::remove_var("TW_CONFIG_TEST_NEW");
        apply(map(&[
            ("TW_CONFIG_TEST_EXISTING", "from_file"),
            ("TW_CONFIG_TEST_NEW", "from_file"),
        ]));
        assert_eq!(env::var("TW_CONFIG_TEST_EXISTING").unwrap(), "from_env");
        assert_eq!(env::var("TW_CONFIG_TEST_NEW").unwrap(), "from_file");
        env::remove_var("TW_CONFIG_TEST_EXISTING");
        env::remove_var("TW_CONFIG_TEST_NEW");
    }

    #[test]
    fn load_and_apply_reads_dotenv_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "TW_CONFIG_TEST_DOTENV=1\n").unwrap();
        env::remove_var("TW_CONFIG_TEST_DOTENV");
        load_and_apply("thoughtweave-config-test-no-such-app", Some(dir.path())).unwrap();
        assert_eq!(env::var("TW_CONFIG_TEST_DOTENV").unwrap(), "1");
        env::remove_var("TW_CONFIG_TEST_DOTENV");
    }

    #[test]
    fn load_section_from_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let v: HashMap<String, String> =
            load_section_from(&dir.path().join("config.toml"), "search").unwrap();
        assert!(v.is_empty());
    }
}
