//! Reading configuration layers from the environment and from YAML files.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::{config_dir, home_dir};
use tracing::debug;

use crate::config::model::{ConfigError, ConfigLayer, FormationConfig};
use crate::config::validation::validate_config;

/// Candidate config files, searched in order when no path is given.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(2);
    if let Some(home) = home_dir() {
        paths.push(home.join(".formation-mcp.yaml"));
    }
    if let Some(config) = config_dir() {
        paths.push(config.join("formation-mcp").join("config.yaml"));
    }
    paths
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home_dir().map(|home| home.join(rest)).unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Load the file layer.
///
/// With an explicit path only that file is considered; otherwise the first
/// existing default location wins. A file that does not exist yields an empty
/// layer.
pub fn file_layer(explicit: Option<&Path>) -> Result<ConfigLayer, ConfigError> {
    let candidates = match explicit {
        Some(path) => vec![expand_tilde(path)],
        None => default_config_paths(),
    };

    for path in candidates {
        if !path.exists() {
            continue;
        }
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        if content.trim().is_empty() {
            return Ok(ConfigLayer::default());
        }
        return serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse { path, source });
    }
    Ok(ConfigLayer::default())
}

/// Read the environment layer. Unset or empty variables are left unset.
pub fn env_layer() -> Result<ConfigLayer, ConfigError> {
    let read = |name: &str| env::var(name).ok().filter(|value| !value.trim().is_empty());

    let poll_interval = match read("FORMATION_POLL_INTERVAL") {
        Some(value) => Some(value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
            name: "FORMATION_POLL_INTERVAL",
            value,
        })?),
        None => None,
    };

    Ok(ConfigLayer {
        base_url: read("FORMATION_BASE_URL"),
        token: read("FORMATION_TOKEN"),
        username: read("FORMATION_USERNAME"),
        password: read("FORMATION_PASSWORD"),
        log_level: read("LOG_LEVEL"),
        log_json: read("LOG_JSON").map(|value| matches!(value.trim(), "true" | "1")),
        poll_interval,
    })
}

/// Assemble the final configuration: `flags` over environment over file over
/// defaults.
pub fn load_config(flags: ConfigLayer, config_path: Option<&Path>) -> Result<FormationConfig, ConfigError> {
    let merged = file_layer(config_path)?.overlay(env_layer()?).overlay(flags);
    validate_config(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use std::io::Write;
    use std::time::Duration;

    const ENV_VARS: [&str; 7] = [
        "FORMATION_BASE_URL",
        "FORMATION_TOKEN",
        "FORMATION_USERNAME",
        "FORMATION_PASSWORD",
        "LOG_LEVEL",
        "LOG_JSON",
        "FORMATION_POLL_INTERVAL",
    ];

    fn cleared_env() -> Vec<(&'static str, Option<&'static str>)> {
        ENV_VARS.iter().map(|name| (*name, None)).collect()
    }

    fn yaml_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_explicit_file_is_an_empty_layer() {
        let dir = tempfile::tempdir().unwrap();
        let layer = file_layer(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(layer, ConfigLayer::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = yaml_file("base_url: [unterminated\n");
        assert!(matches!(file_layer(Some(file.path())), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn tilde_expands_to_home() {
        let expanded = expand_tilde(Path::new("~/.formation-mcp.yaml"));
        if let Some(home) = home_dir() {
            assert_eq!(expanded, home.join(".formation-mcp.yaml"));
        }
        assert_eq!(expand_tilde(Path::new("/etc/formation.yaml")), PathBuf::from("/etc/formation.yaml"));
    }

    #[test]
    fn env_layer_reads_every_variable() {
        temp_env::with_vars(
            [
                ("FORMATION_BASE_URL", Some("https://env.example.org")),
                ("FORMATION_TOKEN", Some("env-token")),
                ("FORMATION_USERNAME", Some("alice")),
                ("FORMATION_PASSWORD", Some("pw")),
                ("LOG_LEVEL", Some("debug")),
                ("LOG_JSON", Some("1")),
                ("FORMATION_POLL_INTERVAL", Some("7")),
            ],
            || {
                let layer = env_layer().unwrap();
                assert_eq!(layer.base_url.as_deref(), Some("https://env.example.org"));
                assert_eq!(layer.token.as_deref(), Some("env-token"));
                assert_eq!(layer.username.as_deref(), Some("alice"));
                assert_eq!(layer.password.as_deref(), Some("pw"));
                assert_eq!(layer.log_level.as_deref(), Some("debug"));
                assert_eq!(layer.log_json, Some(true));
                assert_eq!(layer.poll_interval, Some(7));
            },
        );
    }

    #[test]
    fn env_layer_rejects_non_numeric_poll_interval() {
        let mut vars = cleared_env();
        vars.retain(|(name, _)| *name != "FORMATION_POLL_INTERVAL");
        vars.push(("FORMATION_POLL_INTERVAL", Some("soon")));
        temp_env::with_vars(vars, || {
            assert!(matches!(env_layer(), Err(ConfigError::InvalidEnv { name: "FORMATION_POLL_INTERVAL", .. })));
        });
    }

    #[test]
    fn precedence_is_flags_then_env_then_file() {
        let file = yaml_file(
            "base_url: https://file.example.org/\ntoken: file-token\nlog_level: warn\npoll_interval: 9\nlog_json: true\n",
        );
        let mut vars = cleared_env();
        vars.retain(|(name, _)| *name != "FORMATION_TOKEN" && *name != "LOG_LEVEL");
        vars.push(("FORMATION_TOKEN", Some("env-token")));
        vars.push(("LOG_LEVEL", Some("error")));

        temp_env::with_vars(vars, || {
            let flags = ConfigLayer {
                log_level: Some("debug".into()),
                ..Default::default()
            };
            let config = load_config(flags, Some(file.path())).unwrap();
            assert_eq!(config.base_url.as_str(), "https://file.example.org/");
            assert_eq!(config.token.as_deref(), Some("env-token"));
            assert_eq!(config.log_level, LogLevel::Debug);
            assert_eq!(config.poll_interval, Duration::from_secs(9));
            assert!(config.log_json);
        });
    }

    #[test]
    fn nothing_configured_reports_missing_base_url() {
        let dir = tempfile::tempdir().unwrap();
        temp_env::with_vars(cleared_env(), || {
            let error = load_config(ConfigLayer::default(), Some(&dir.path().join("none.yaml"))).unwrap_err();
            assert!(matches!(error, ConfigError::MissingBaseUrl));
        });
    }
}
