//! Configuration definition tree.
//!
//! A [`ConfigDomain`] is static data: a named tree of [`ConfigValue`] nodes
//! built once at startup. Nothing in here reads the environment; that is
//! the resolver's job.

use std::fmt;

/// A literal scalar in a definition tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(i64::from(v))
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

/// How a raw environment string is converted before it lands in the
/// resolved output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coercion {
    /// Keep the raw string.
    #[default]
    Raw,
    Bool,
    Int,
}

impl fmt::Display for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coercion::Raw => write!(f, "string"),
            Coercion::Bool => write!(f, "bool"),
            Coercion::Int => write!(f, "int"),
        }
    }
}

/// Reference to an environment variable with an optional fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvRef {
    pub name: String,
    pub default: Option<Box<ConfigValue>>,
    pub coercion: Coercion,
    pub required: bool,
}

impl EnvRef {
    /// Fallback used when the variable is absent. May be any node,
    /// including another reference.
    pub fn or(mut self, default: impl Into<ConfigValue>) -> Self {
        self.default = Some(Box::new(default.into()));
        self
    }

    pub fn bool(mut self) -> Self {
        self.coercion = Coercion::Bool;
        self
    }

    pub fn int(mut self) -> Self {
        self.coercion = Coercion::Int;
        self
    }

    /// Fail resolution when neither the variable nor a default exists.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A node of a configuration definition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Literal(Scalar),
    /// Ordered mapping; key order is preserved in the resolved output.
    Map(Vec<(String, ConfigValue)>),
    Seq(Vec<ConfigValue>),
    Env(EnvRef),
    /// String concatenation of the resolved parts.
    Concat(Vec<ConfigValue>),
    Slug {
        source: Box<ConfigValue>,
        separator: char,
    },
    /// Path relative to the resolver's storage root.
    StoragePath(String),
    /// Present only when `capability` is available, omitted otherwise.
    IncludedIf {
        capability: String,
        value: Box<ConfigValue>,
    },
    /// Omitted when the inner value resolves to null, `""` or `false`.
    NonEmpty(Box<ConfigValue>),
}

macro_rules! literal_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ConfigValue {
                fn from(v: $t) -> Self {
                    ConfigValue::Literal(v.into())
                }
            }
        )*
    };
}

literal_from!(bool, i32, i64, &str, String);

impl From<Scalar> for ConfigValue {
    fn from(v: Scalar) -> Self {
        ConfigValue::Literal(v)
    }
}

impl From<EnvRef> for ConfigValue {
    fn from(v: EnvRef) -> Self {
        ConfigValue::Env(v)
    }
}

/// A named top-level configuration section.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDomain {
    pub name: String,
    pub options: Vec<(String, ConfigValue)>,
}

impl ConfigDomain {
    pub fn new<K: Into<String>>(
        name: impl Into<String>,
        options: impl IntoIterator<Item = (K, ConfigValue)>,
    ) -> Self {
        Self {
            name: name.into(),
            options: options.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

pub fn env(name: impl Into<String>) -> EnvRef {
    EnvRef {
        name: name.into(),
        default: None,
        coercion: Coercion::Raw,
        required: false,
    }
}

pub fn lit(v: impl Into<Scalar>) -> ConfigValue {
    ConfigValue::Literal(v.into())
}

pub fn null() -> ConfigValue {
    ConfigValue::Literal(Scalar::Null)
}

pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, ConfigValue)>) -> ConfigValue {
    ConfigValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
}

pub fn seq(items: impl IntoIterator<Item = ConfigValue>) -> ConfigValue {
    ConfigValue::Seq(items.into_iter().collect())
}

pub fn concat(parts: impl IntoIterator<Item = ConfigValue>) -> ConfigValue {
    ConfigValue::Concat(parts.into_iter().collect())
}

pub fn slug(source: impl Into<ConfigValue>, separator: char) -> ConfigValue {
    ConfigValue::Slug {
        source: Box::new(source.into()),
        separator,
    }
}

pub fn storage_path(relative: impl Into<String>) -> ConfigValue {
    ConfigValue::StoragePath(relative.into())
}

pub fn included_if(capability: impl Into<String>, value: impl Into<ConfigValue>) -> ConfigValue {
    ConfigValue::IncludedIf {
        capability: capability.into(),
        value: Box::new(value.into()),
    }
}

pub fn non_empty(value: impl Into<ConfigValue>) -> ConfigValue {
    ConfigValue::NonEmpty(Box::new(value.into()))
}
