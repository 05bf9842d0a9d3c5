//! Resolved application settings.
//!
//! All domains are resolved together at startup. Resolution failures are
//! fatal there, so a `Settings` value never holds a partially resolved
//! domain.

use std::sync::OnceLock;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::resolver::{ResolveError, ResolvedConfig, Resolver};
use crate::config::value::ConfigDomain;

static GLOBAL: OnceLock<Settings> = OnceLock::new();

/// Every configured domain, resolved against one environment snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    domains: Vec<ResolvedConfig>,
}

impl Settings {
    /// Resolve `domains` in order, stopping at the first error.
    pub fn resolve_all(
        domains: &[ConfigDomain],
        resolver: &Resolver<'_>,
    ) -> Result<Self, ResolveError> {
        let domains = domains
            .iter()
            .map(|domain| resolver.resolve(domain))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { domains })
    }

    pub fn domain(&self, name: &str) -> Option<&ResolvedConfig> {
        self.domains.iter().find(|d| d.name() == name)
    }

    pub fn domains(&self) -> impl Iterator<Item = &ResolvedConfig> {
        self.domains.iter()
    }

    /// Look up `domain.dotted.path`. A bare domain name is not a value;
    /// use [`Settings::domain`] for that.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let (domain, rest) = path.split_once('.')?;
        self.domain(domain)?.get(rest)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .domains
            .iter()
            .map(|d| (d.name().to_string(), d.to_value()))
            .collect();
        Value::Object(map)
    }

    /// Typed view of the `session` domain.
    pub fn session(&self) -> Result<SessionSettings, SettingsError> {
        self.typed("session")
    }

    /// Typed view of the `app` domain.
    pub fn app(&self) -> Result<AppSettings, SettingsError> {
        self.typed("app")
    }

    /// Level of the `single` log channel.
    pub fn log_level(&self) -> Option<&str> {
        self.get_str("logging.channels.single.level")
    }

    fn typed<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<T, SettingsError> {
        let domain = self
            .domain(name)
            .ok_or_else(|| SettingsError::MissingDomain(name.to_string()))?;
        domain.deserialize().map_err(|source| SettingsError::Shape {
            domain: name.to_string(),
            source,
        })
    }

    /// Publish these settings process-wide. Only the first call wins;
    /// later calls hand their value back.
    pub fn install(self) -> Result<&'static Settings, Settings> {
        let mut candidate = Some(self);
        let installed = GLOBAL.get_or_init(|| Settings {
            domains: candidate.take().map(|s| s.domains).unwrap_or_default(),
        });
        match candidate {
            Some(rejected) => Err(rejected),
            None => Ok(installed),
        }
    }

    /// Settings published by [`Settings::install`], if any.
    pub fn global() -> Option<&'static Settings> {
        GLOBAL.get()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("configuration domain {0} was not resolved")]
    MissingDomain(String),

    #[error("configuration domain {domain} has an unexpected shape: {source}")]
    Shape {
        domain: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

/// The parts of the `session` domain the HTTP layer relies on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionSettings {
    pub driver: String,
    /// Idle lifetime in minutes.
    pub lifetime: u64,
    pub expire_on_close: bool,
    /// Expired-session sweep odds: `[chances, out_of]`.
    pub lottery: [u64; 2],
    pub cookie: String,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub env: String,
    pub debug: bool,
    pub url: String,
    pub timezone: String,
    pub locale: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::domains;
    use crate::config::env::Environment;

    fn settings_for(pairs: &[(&str, &str)]) -> Result<Settings, ResolveError> {
        let env: Environment = pairs.iter().copied().collect();
        Settings::resolve_all(&domains::all(), &Resolver::new(&env))
    }

    #[test]
    fn test_dotted_lookup() {
        let settings = settings_for(&[("DB_HOST", "db.internal")]).unwrap();
        assert_eq!(settings.get_str("database.connections.mysql.host"), Some("db.internal"));
        assert_eq!(settings.get_str("database.connections.mysql.port"), Some("3306"));
        assert!(settings.get("database").is_none());
        assert!(settings.get("broadcasting.default").is_none());
    }

    #[test]
    fn test_typed_session_view() {
        let settings = settings_for(&[("SESSION_LIFETIME", "30"), ("APP_NAME", "Sis Champions")]).unwrap();
        let session = settings.session().unwrap();
        assert_eq!(session.lifetime, 30);
        assert_eq!(session.cookie, "sis_champions_session");
        assert_eq!(session.same_site, SameSite::Lax);
        assert!(session.http_only);
        assert_eq!(session.domain, None);
        assert_eq!(session.lottery, [2, 100]);
    }

    #[test]
    fn test_typed_app_view() {
        let settings = settings_for(&[]).unwrap();
        let app = settings.app().unwrap();
        assert_eq!(app.url, "https://sischampions2022.com");
        assert_eq!(app.env, "production");
        assert!(!app.debug);
        assert_eq!(settings.log_level(), Some("debug"));
    }

    #[test]
    fn test_fails_fast_on_first_error() {
        let err = settings_for(&[("SESSION_LIFETIME", "forever")]).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidConfigValue { ref var, .. } if var == "SESSION_LIFETIME"));
    }

    #[test]
    fn test_missing_domain_view() {
        let env = Environment::empty();
        let settings = Settings::resolve_all(&[domains::app()], &Resolver::new(&env)).unwrap();
        assert!(matches!(settings.session(), Err(SettingsError::MissingDomain(_))));
    }

    #[test]
    fn test_serialized_tree_keeps_domain_order() {
        let settings = settings_for(&[]).unwrap();
        let value = settings.to_value();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, domains::DOMAIN_NAMES);
    }

    #[test]
    fn test_install_is_write_once() {
        let first = settings_for(&[("APP_NAME", "first")]).unwrap();
        let second = settings_for(&[("APP_NAME", "second")]).unwrap();

        let installed = first.clone().install().unwrap();
        assert_eq!(installed, &first);

        let rejected = second.clone().install().unwrap_err();
        assert_eq!(rejected, second);
        assert_eq!(Settings::global(), Some(&first));
    }
}
