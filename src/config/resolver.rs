//! Environment-driven configuration resolution.
//!
//! # Responsibilities
//! - Walk a [`ConfigDomain`] depth-first and materialize every node
//! - Substitute environment references, falling back to their defaults
//! - Coerce raw environment strings to bool/int on request
//! - Drop conditional nodes whose predicate does not hold
//!
//! # Design Decisions
//! - Pure function of (domain, environment, capabilities, storage root)
//! - Output is a `serde_json` tree so key order survives and typed views
//!   can be deserialized from it
//! - An omitted conditional node is absent from the output, never `null`

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::env::{Capabilities, Environment};
use crate::config::value::{Coercion, ConfigDomain, ConfigValue, EnvRef, Scalar};

/// Storage root used when the caller does not configure one.
pub const DEFAULT_STORAGE_ROOT: &str = "storage";

/// Errors raised while resolving a domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("invalid value for {var} at {path}: expected {expected}, got {raw:?}")]
    InvalidConfigValue {
        var: String,
        raw: String,
        expected: Coercion,
        path: String,
    },

    #[error("missing required configuration value {var} at {path}")]
    MissingRequiredValue { var: String, path: String },
}

/// A fully materialized configuration domain.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    name: String,
    values: Map<String, Value>,
}

impl ResolvedConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Look up a dotted path such as `connections.mysql.port`. Numeric
    /// segments index into sequences.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.values.get(first)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Value::as_i64)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Deserialize the whole domain into a typed view.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }
}

/// Resolves domains against one environment snapshot.
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    env: &'a Environment,
    capabilities: Option<&'a Capabilities>,
    storage_root: PathBuf,
}

impl<'a> Resolver<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self {
            env,
            capabilities: None,
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
        }
    }

    pub fn with_capabilities(mut self, capabilities: &'a Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn resolve(&self, domain: &ConfigDomain) -> Result<ResolvedConfig, ResolveError> {
        let mut path = vec![domain.name.clone()];
        let values = self.resolve_entries(&domain.options, &mut path)?;
        Ok(ResolvedConfig {
            name: domain.name.clone(),
            values,
        })
    }

    fn resolve_entries(
        &self,
        entries: &[(String, ConfigValue)],
        path: &mut Vec<String>,
    ) -> Result<Map<String, Value>, ResolveError> {
        let mut out = Map::new();
        for (key, node) in entries {
            path.push(key.clone());
            let value = self.resolve_node(node, path)?;
            path.pop();
            if let Some(value) = value {
                out.insert(key.clone(), value);
            }
        }
        Ok(out)
    }

    /// `None` means the node is omitted from its parent.
    fn resolve_node(
        &self,
        node: &ConfigValue,
        path: &mut Vec<String>,
    ) -> Result<Option<Value>, ResolveError> {
        let value = match node {
            ConfigValue::Literal(scalar) => scalar_to_value(scalar),
            ConfigValue::Map(entries) => Value::Object(self.resolve_entries(entries, path)?),
            ConfigValue::Seq(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    path.push(i.to_string());
                    let value = self.resolve_node(item, path)?;
                    path.pop();
                    out.extend(value);
                }
                Value::Array(out)
            }
            ConfigValue::Env(reference) => self.resolve_env(reference, path)?,
            ConfigValue::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    if let Some(value) = self.resolve_node(part, path)? {
                        out.push_str(&stringify(&value));
                    }
                }
                Value::String(out)
            }
            ConfigValue::Slug { source, separator } => {
                let source = self.resolve_node(source, path)?.unwrap_or(Value::Null);
                Value::String(slugify(&stringify(&source), *separator))
            }
            ConfigValue::StoragePath(relative) => Value::String(
                self.storage_root
                    .join(relative)
                    .to_string_lossy()
                    .into_owned(),
            ),
            ConfigValue::IncludedIf { capability, value } => {
                let available = self
                    .capabilities
                    .map(|c| c.is_available(capability))
                    .unwrap_or(false);
                if !available {
                    return Ok(None);
                }
                return self.resolve_node(value, path);
            }
            ConfigValue::NonEmpty(inner) => {
                return Ok(self.resolve_node(inner, path)?.filter(|v| !is_empty(v)));
            }
        };
        Ok(Some(value))
    }

    fn resolve_env(&self, reference: &EnvRef, path: &mut Vec<String>) -> Result<Value, ResolveError> {
        if let Some(raw) = self.env.get(&reference.name) {
            return coerce(raw, reference.coercion).ok_or_else(|| ResolveError::InvalidConfigValue {
                var: reference.name.clone(),
                raw: raw.to_string(),
                expected: reference.coercion,
                path: path.join("."),
            });
        }

        match &reference.default {
            Some(default) => Ok(self.resolve_node(default, path)?.unwrap_or(Value::Null)),
            None if reference.required => Err(ResolveError::MissingRequiredValue {
                var: reference.name.clone(),
                path: path.join("."),
            }),
            None => Ok(Value::Null),
        }
    }
}

/// Resolve `domain` against `env` with no optional capabilities and the
/// default storage root.
pub fn resolve(domain: &ConfigDomain, env: &Environment) -> Result<ResolvedConfig, ResolveError> {
    Resolver::new(env).resolve(domain)
}

fn scalar_to_value(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::Int(i) => Value::from(*i),
        Scalar::Str(s) => Value::String(s.clone()),
    }
}

fn coerce(raw: &str, coercion: Coercion) -> Option<Value> {
    match coercion {
        Coercion::Raw => Some(Value::String(raw.to_string())),
        Coercion::Bool => {
            let trimmed = raw.trim();
            if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
                Some(Value::Bool(true))
            } else if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        Coercion::Int => raw.trim().parse::<i64>().ok().map(Value::from),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Lower-case alphanumerics; whitespace, `-` and `_` runs collapse into a
/// single separator; everything else is dropped.
pub fn slugify(input: &str, separator: char) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending = false;
    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending && !out.is_empty() {
                out.push(separator);
            }
            pending = false;
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' || c == separator {
            pending = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::value::{
        concat, env, included_if, lit, map, non_empty, null, seq, slug, storage_path,
    };

    fn env_of(pairs: &[(&str, &str)]) -> Environment {
        pairs.iter().copied().collect()
    }

    fn domain(options: Vec<(&str, ConfigValue)>) -> ConfigDomain {
        ConfigDomain::new("test", options)
    }

    #[test]
    fn test_literals_copied_unchanged() {
        let d = domain(vec![
            ("driver", lit("mysql")),
            ("strict", lit(true)),
            ("retry_after", lit(90)),
            ("engine", null()),
            ("lottery", seq([lit(2), lit(100)])),
        ]);
        let resolved = resolve(&d, &Environment::empty()).unwrap();

        assert_eq!(resolved.get_str("driver"), Some("mysql"));
        assert_eq!(resolved.get_bool("strict"), Some(true));
        assert_eq!(resolved.get_i64("retry_after"), Some(90));
        assert_eq!(resolved.get("engine"), Some(&Value::Null));
        assert_eq!(resolved.get_i64("lottery.1"), Some(100));
    }

    #[test]
    fn test_env_present_and_default() {
        let d = domain(vec![
            ("host", env("DB_HOST").into()),
            ("port", env("DB_PORT").or("3306").into()),
        ]);

        let resolved = resolve(&d, &Environment::empty()).unwrap();
        assert_eq!(resolved.get("host"), Some(&Value::Null));
        assert_eq!(resolved.get_str("port"), Some("3306"));

        let resolved = resolve(&d, &env_of(&[("DB_HOST", "db"), ("DB_PORT", "3307")])).unwrap();
        assert_eq!(resolved.get_str("host"), Some("db"));
        assert_eq!(resolved.get_str("port"), Some("3307"));
    }

    #[test]
    fn test_default_may_be_nested_reference() {
        let d = domain(vec![(
            "cookie",
            env("SESSION_COOKIE")
                .or(concat([slug(env("APP_NAME").or("laravel"), '_'), lit("_session")]))
                .into(),
        )]);

        let resolved = resolve(&d, &Environment::empty()).unwrap();
        assert_eq!(resolved.get_str("cookie"), Some("laravel_session"));

        let resolved = resolve(&d, &env_of(&[("APP_NAME", "Sis Champions 2022")])).unwrap();
        assert_eq!(resolved.get_str("cookie"), Some("sis_champions_2022_session"));

        let resolved = resolve(&d, &env_of(&[("SESSION_COOKIE", "league")])).unwrap();
        assert_eq!(resolved.get_str("cookie"), Some("league"));
    }

    #[test]
    fn test_bool_coercion() {
        let d = domain(vec![("flag", env("FLAG").or(false).bool().into())]);

        for (raw, expected) in [("true", true), ("1", true), ("TRUE", true), ("false", false), ("0", false), ("", false)] {
            let resolved = resolve(&d, &env_of(&[("FLAG", raw)])).unwrap();
            assert_eq!(resolved.get_bool("flag"), Some(expected), "raw value {:?}", raw);
        }

        let resolved = resolve(&d, &Environment::empty()).unwrap();
        assert_eq!(resolved.get_bool("flag"), Some(false));
    }

    #[test]
    fn test_bool_coercion_rejects_garbage() {
        let d = domain(vec![("flag", env("FLAG").bool().into())]);
        let err = resolve(&d, &env_of(&[("FLAG", "yes")])).unwrap_err();
        assert_eq!(
            err,
            ResolveError::InvalidConfigValue {
                var: "FLAG".into(),
                raw: "yes".into(),
                expected: Coercion::Bool,
                path: "test.flag".into(),
            }
        );
    }

    #[test]
    fn test_int_coercion() {
        let d = domain(vec![("lifetime", env("SESSION_LIFETIME").or(120).int().into())]);

        let resolved = resolve(&d, &env_of(&[("SESSION_LIFETIME", "45")])).unwrap();
        assert_eq!(resolved.get_i64("lifetime"), Some(45));

        let resolved = resolve(&d, &Environment::empty()).unwrap();
        assert_eq!(resolved.get_i64("lifetime"), Some(120));

        let err = resolve(&d, &env_of(&[("SESSION_LIFETIME", "two hours")])).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidConfigValue { expected: Coercion::Int, .. }));
        assert!(err.to_string().contains("SESSION_LIFETIME"));
    }

    #[test]
    fn test_required_value_missing() {
        let d = domain(vec![("nested", map([("key", env("APP_KEY").required().into())]))]);

        let err = resolve(&d, &Environment::empty()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingRequiredValue {
                var: "APP_KEY".into(),
                path: "test.nested.key".into(),
            }
        );

        let resolved = resolve(&d, &env_of(&[("APP_KEY", "base64:abc")])).unwrap();
        assert_eq!(resolved.get_str("nested.key"), Some("base64:abc"));
    }

    #[test]
    fn test_required_with_default_is_satisfied() {
        let d = domain(vec![("mailer", env("MAIL_MAILER").or("smtp").required().into())]);
        let resolved = resolve(&d, &Environment::empty()).unwrap();
        assert_eq!(resolved.get_str("mailer"), Some("smtp"));
    }

    #[test]
    fn test_conditional_node_omitted_not_null() {
        let d = domain(vec![(
            "options",
            map([("SSL_CA", included_if("pdo_mysql", env("MYSQL_ATTR_SSL_CA")))]),
        )]);
        let env = env_of(&[("MYSQL_ATTR_SSL_CA", "/etc/ssl/ca.pem")]);

        let resolved = resolve(&d, &env).unwrap();
        let options = resolved.get("options").and_then(Value::as_object).unwrap();
        assert!(options.is_empty());
        assert!(!options.contains_key("SSL_CA"));

        let caps: Capabilities = ["pdo_mysql"].into_iter().collect();
        let resolved = Resolver::new(&env).with_capabilities(&caps).resolve(&d).unwrap();
        assert_eq!(resolved.get_str("options.SSL_CA"), Some("/etc/ssl/ca.pem"));
    }

    #[test]
    fn test_conditional_sequence_element_dropped() {
        let d = domain(vec![("channels", seq([lit("single"), included_if("syslog", lit("syslog"))]))]);
        let resolved = resolve(&d, &Environment::empty()).unwrap();
        assert_eq!(resolved.get("channels"), Some(&serde_json::json!(["single"])));
    }

    #[test]
    fn test_non_empty_filter() {
        let d = domain(vec![("options", map([("SSL_CA", non_empty(env("MYSQL_ATTR_SSL_CA")))]))]);

        let resolved = resolve(&d, &Environment::empty()).unwrap();
        assert_eq!(resolved.get("options"), Some(&serde_json::json!({})));

        let resolved = resolve(&d, &env_of(&[("MYSQL_ATTR_SSL_CA", "")])).unwrap();
        assert_eq!(resolved.get("options"), Some(&serde_json::json!({})));

        let resolved = resolve(&d, &env_of(&[("MYSQL_ATTR_SSL_CA", "/ca.pem")])).unwrap();
        assert_eq!(resolved.get_str("options.SSL_CA"), Some("/ca.pem"));
    }

    #[test]
    fn test_concat_treats_null_as_empty() {
        let d = domain(vec![("url", concat([env("APP_URL").into(), lit("/storage")]))]);

        let resolved = resolve(&d, &Environment::empty()).unwrap();
        assert_eq!(resolved.get_str("url"), Some("/storage"));

        let resolved = resolve(&d, &env_of(&[("APP_URL", "https://league.test")])).unwrap();
        assert_eq!(resolved.get_str("url"), Some("https://league.test/storage"));
    }

    #[test]
    fn test_storage_path_uses_root() {
        let d = domain(vec![("path", storage_path("framework/sessions"))]);
        let env = Environment::empty();
        let resolved = Resolver::new(&env)
            .with_storage_root("/srv/league/storage")
            .resolve(&d)
            .unwrap();
        assert_eq!(resolved.get_str("path"), Some("/srv/league/storage/framework/sessions"));
    }

    #[test]
    fn test_key_order_preserved() {
        let d = domain(vec![("zeta", lit(1)), ("alpha", lit(2)), ("mid", lit(3))]);
        let resolved = resolve(&d, &Environment::empty()).unwrap();
        let keys: Vec<&str> = resolved.values().keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_resolution_is_deterministic_and_pure() {
        let d = domain(vec![
            ("port", env("DB_PORT").or("3306").into()),
            ("flag", env("FLAG").or(false).bool().into()),
        ]);
        let before = d.clone();
        let env = env_of(&[("FLAG", "1")]);
        let env_before = env.clone();

        let first = resolve(&d, &env).unwrap();
        let second = resolve(&d, &env).unwrap();

        assert_eq!(first, second);
        assert_eq!(d, before);
        assert_eq!(env, env_before);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("laravel", '_'), "laravel");
        assert_eq!(slugify("Sis Champions 2022", '_'), "sis_champions_2022");
        assert_eq!(slugify("  My -- App!  ", '_'), "my_app");
        assert_eq!(slugify("league_web", '-'), "league-web");
        assert_eq!(slugify("", '_'), "");
    }
}
