//! Turns a merged configuration layer into settings the server can run with.

use std::time::Duration;

use formation_api::Credentials;
use tracing::debug;
use url::Url;

use crate::config::model::{
    ConfigError, ConfigLayer, DEFAULT_POLL_INTERVAL_SECS, FormationConfig, LogLevel, MAX_POLL_INTERVAL_SECS,
};

/// Validate a merged layer, applying defaults for anything left unset.
pub fn validate_config(layer: ConfigLayer) -> Result<FormationConfig, ConfigError> {
    let base_url = validate_base_url(layer.base_url.as_deref())?;

    let credentials = match (layer.username, layer.password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Some(Credentials::new(username, password))
        }
        _ => None,
    };
    let token = layer.token.filter(|token| !token.is_empty());
    if token.is_none() && credentials.is_none() {
        return Err(ConfigError::MissingCredentials);
    }

    let log_level = match layer.log_level.as_deref() {
        Some(value) => value.parse::<LogLevel>()?,
        None => LogLevel::default(),
    };

    let poll_interval = layer.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
    if poll_interval == 0 || poll_interval > MAX_POLL_INTERVAL_SECS {
        return Err(ConfigError::InvalidPollInterval);
    }

    debug!(base_url = %base_url, has_token = token.is_some(), has_credentials = credentials.is_some(), "validated configuration");
    Ok(FormationConfig {
        base_url,
        token,
        credentials,
        log_level,
        log_json: layer.log_json.unwrap_or(false),
        poll_interval: Duration::from_secs(poll_interval),
    })
}

fn validate_base_url(raw: Option<&str>) -> Result<Url, ConfigError> {
    let trimmed = raw.map(str::trim).unwrap_or_default().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::MissingBaseUrl);
    }

    let url = Url::parse(trimmed).map_err(|error| ConfigError::InvalidBaseUrl {
        url: trimmed.to_string(),
        reason: error.to_string(),
    })?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ConfigError::InvalidBaseUrl {
            url: trimmed.to_string(),
            reason: format!("unsupported scheme '{scheme}' (expected http or https)"),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> ConfigLayer {
        ConfigLayer {
            base_url: Some("https://formation.example.org/".into()),
            token: Some("token".into()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_apply_to_unset_fields() {
        let config = validate_config(layer()).unwrap();
        assert_eq!(config.base_url.as_str(), "https://formation.example.org/");
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(!config.log_json);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(config.credentials.is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_path() {
        let config = validate_config(ConfigLayer {
            base_url: Some("https://formation.example.org/api/".into()),
            ..layer()
        })
        .unwrap();
        assert_eq!(config.base_url.path(), "/api");
    }

    #[test]
    fn missing_base_url_is_rejected() {
        let error = validate_config(ConfigLayer {
            base_url: None,
            ..layer()
        })
        .unwrap_err();
        assert!(matches!(error, ConfigError::MissingBaseUrl));
    }

    #[test]
    fn username_without_password_is_not_a_credential() {
        let error = validate_config(ConfigLayer {
            token: None,
            username: Some("alice".into()),
            ..layer()
        })
        .unwrap_err();
        assert!(matches!(error, ConfigError::MissingCredentials));

        let config = validate_config(ConfigLayer {
            token: None,
            username: Some("alice".into()),
            password: Some("pw".into()),
            ..layer()
        })
        .unwrap();
        assert_eq!(config.credentials.map(|c| c.username), Some("alice".to_string()));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            validate_config(ConfigLayer {
                base_url: Some("ftp://formation.example.org".into()),
                ..layer()
            }),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            validate_config(ConfigLayer {
                log_level: Some("loud".into()),
                ..layer()
            }),
            Err(ConfigError::InvalidLogLevel { .. })
        ));
        assert!(matches!(
            validate_config(ConfigLayer {
                poll_interval: Some(0),
                ..layer()
            }),
            Err(ConfigError::InvalidPollInterval)
        ));
        assert!(matches!(
            validate_config(ConfigLayer {
                poll_interval: Some(u64::MAX),
                ..layer()
            }),
            Err(ConfigError::InvalidPollInterval)
        ));
        assert!(
            validate_config(ConfigLayer {
                poll_interval: Some(MAX_POLL_INTERVAL_SECS),
                ..layer()
            })
            .is_ok()
        );
    }
}
