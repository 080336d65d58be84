//! Load configuration from a `config.toml` and a project `.env`, then apply it
//! to the process environment with priority: **existing env > .env > config.toml**.
//!
//! The server and CLI call [`load_and_apply`] once at startup; everything else
//! in the workspace reads plain environment variables after that. The
//! `AGENT_*` variables the runtime consults are collected in [`agent_env`].

pub mod agent_env;
mod dotenv;
mod toml_file;

use std::path::Path;

use thiserror::Error;

pub use agent_env::AgentEnv;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("config dir: {0}")]
    ConfigDir(String),
    #[error("read config.toml: {0}")]
    TomlRead(std::io::Error),
    #[error("parse config.toml: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// Loads config from `~/.config/<app_name>/config.toml` and an optional project
/// `.env`, then sets environment variables only for keys that are **not**
/// already set, so existing env always wins.
///
/// Order of precedence when a key is missing from the process environment:
/// 1. Value from project `.env` (current directory, or `override_dir` if given)
/// 2. Value from the `[env]` table of `config.toml`
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let toml_map = toml_file::load_env_map(app_name)?;
    let dotenv_map = dotenv::load_env_map(override_dir).map_err(LoadError::DotenvRead)?;

    let mut keys: std::collections::HashSet<String> = toml_map.keys().cloned().collect();
    keys.extend(dotenv_map.keys().cloned());

    for key in keys {
        if std::env::var(&key).is_ok() {
            continue; // existing env wins
        }
        let value = dotenv_map.get(&key).or_else(|| toml_map.get(&key)).cloned();
        if let Some(v) = value {
            std::env::set_var(&key, v);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn existing_env_wins() {
        env::set_var("TRELLIS_CONFIG_TEST_EXISTING", "from_env");
        let _ = load_and_apply("trellis", None);
        assert_eq!(
            env::var("TRELLIS_CONFIG_TEST_EXISTING").as_deref(),
            Ok("from_env")
        );
        env::remove_var("TRELLIS_CONFIG_TEST_EXISTING");
    }

    #[test]
    fn load_and_apply_without_any_config_is_ok() {
        let r = load_and_apply("trellis-nonexistent-app-xyz", None::<&std::path::Path>);
        assert!(r.is_ok());
    }

    #[test]
    fn dotenv_value_is_applied_when_env_unset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "TRELLIS_CONFIG_TEST_DOTENV=from_dotenv\n",
        )
        .unwrap();
        env::remove_var("TRELLIS_CONFIG_TEST_DOTENV");
        load_and_apply("trellis-nonexistent-app-xyz", Some(dir.path())).unwrap();
        assert_eq!(
            env::var("TRELLIS_CONFIG_TEST_DOTENV").as_deref(),
            Ok("from_dotenv")
        );
        env::remove_var("TRELLIS_CONFIG_TEST_DOTENV");
    }
}
