//! Configuration loading.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::domains;
use crate::config::env::{Capabilities, Environment};
use crate::config::resolver::{ResolveError, Resolver};
use crate::config::schema::ServerConfig;
use crate::config::settings::{Settings, SettingsError};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("Dotenv error: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate server configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate server configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Supplement `base` with a dotenv file when one is given.
pub fn load_environment(base: Environment, env_file: Option<&Path>) -> Result<Environment, ConfigError> {
    match env_file {
        Some(path) => Ok(base.with_dotenv(path)?),
        None => Ok(base),
    }
}

/// Resolve every application domain using the server's resolver inputs.
/// The typed views the server depends on are checked here too, so a
/// badly shaped value fails before anything binds.
pub fn load_settings(config: &ServerConfig, env: &Environment) -> Result<Settings, ConfigError> {
    let capabilities: Capabilities = config.resolver.capabilities.iter().cloned().collect();
    let resolver = Resolver::new(env)
        .with_capabilities(&capabilities)
        .with_storage_root(&config.resolver.storage_root);
    let settings = Settings::resolve_all(&domains::all(), &resolver)?;
    settings.session()?;
    settings.app()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;
    use std::io::Write;

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [observability]
            log_format = "json"

            [resolver]
            storage_root = "/var/lib/league/storage"
            capabilities = []
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.resolver.capabilities.is_empty());
    }

    #[test]
    fn test_parse_rejects_invalid_values() {
        let err = parse_config("[timeouts]\nrequest_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("timeouts.request_secs"));

        let err = parse_config("[listener\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_settings_uses_resolver_inputs() {
        let mut config = ServerConfig::default();
        config.resolver.storage_root = "/srv/storage".into();
        let env: Environment = [("MYSQL_ATTR_SSL_CA", "/ca.pem")].into_iter().collect();

        let settings = load_settings(&config, &env).unwrap();
        assert_eq!(settings.get_str("cache.stores.file.path"), Some("/srv/storage/framework/cache/data"));
        assert_eq!(
            settings.get_str("database.connections.mysql.options.MYSQL_ATTR_SSL_CA"),
            Some("/ca.pem")
        );

        config.resolver.capabilities.clear();
        let settings = load_settings(&config, &env).unwrap();
        assert!(settings
            .get("database.connections.mysql.options.MYSQL_ATTR_SSL_CA")
            .is_none());
    }

    #[test]
    fn test_load_settings_surfaces_resolution_errors() {
        let env: Environment = [("AWS_USE_PATH_STYLE_ENDPOINT", "maybe")].into_iter().collect();
        let err = load_settings(&ServerConfig::default(), &env).unwrap_err();
        assert!(matches!(err, ConfigError::Resolve(ResolveError::InvalidConfigValue { .. })));
    }

    #[test]
    fn test_load_settings_rejects_negative_lifetime() {
        let env: Environment = [("SESSION_LIFETIME", "-5")].into_iter().collect();
        let err = load_settings(&ServerConfig::default(), &env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Settings(SettingsError::Shape { ref domain, .. }) if domain == "session"
        ));
    }

    #[test]
    fn test_load_environment_applies_dotenv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "APP_NAME=League").unwrap();

        let base: Environment = [("DB_PORT", "3310")].into_iter().collect();
        let env = load_environment(base, Some(file.path())).unwrap();
        assert_eq!(env.get("APP_NAME"), Some("League"));
        assert_eq!(env.get("DB_PORT"), Some("3310"));

        let env = load_environment(Environment::empty(), None).unwrap();
        assert!(env.is_empty());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/league-web.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
