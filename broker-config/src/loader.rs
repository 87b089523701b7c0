//! Configuration loader implementations.

use std::path::Path;

use tracing::debug;

use crate::{BrokerConfig, ConfigError, ConfigResult};

/// Parses and validates a configuration from a JSON document.
///
/// Missing fields fall back to [`BrokerConfig::default`].
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed JSON and
/// [`ConfigError::Invalid`] when validation fails.
pub fn from_json_str(document: &str) -> ConfigResult<BrokerConfig> {
    let config: BrokerConfig = serde_json::from_str(document)?;
    config.validate()?;
    Ok(config)
}

/// Reads, parses, and validates a configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
/// errors of [`from_json_str`].
pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<BrokerConfig> {
    let path = path.as_ref();
    let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = from_json_str(&document)?;
    debug!(
        path = %path.display(),
        mappings = config.name_mappings.len(),
        "loaded broker config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_defaults() {
        let config = from_json_str(r#"{ "event_capacity": 8 }"#).unwrap();
        assert_eq!(config.event_capacity, 8);
        assert_eq!(
            config.builtin_prefixes,
            BrokerConfig::default().builtin_prefixes
        );
    }

    #[test]
    fn invalid_values_fail_validation() {
        let err = from_json_str(r#"{ "builtin_prefixes": [""] }"#).expect_err("should fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = from_json_str("{ not json").expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn reads_from_disk() {
        let mut path = std::env::temp_dir();
        path.push(format!("broker-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "confirmation_tools": ["ask_user"] }"#).unwrap();

        let config = from_path(&path).unwrap();
        assert!(config.is_confirmation_tool("ask_user"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = from_path("/definitely/not/here.json").expect_err("should fail");
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
