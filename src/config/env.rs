//! Environment snapshot and capability set handed to the resolver.
//!
//! # Design Decisions
//! - The resolver never reads `std::env` itself; callers take a snapshot
//!   once and pass it in
//! - A dotenv file only fills variables the process does not already set

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Read-only mapping of environment variable names to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// An empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment. Variables whose
    /// name or value is not valid unicode are skipped.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Add variables from a dotenv file without overriding ones already
    /// present in the snapshot.
    pub fn with_dotenv(mut self, path: &Path) -> Result<Self, dotenvy::Error> {
        for item in dotenvy::from_path_iter(path)? {
            let (key, value) = item?;
            self.vars.entry(key).or_insert(value);
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Optional runtime capabilities that conditional configuration nodes
/// test for, e.g. `pdo_mysql`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    names: BTreeSet<String>,
}

impl Capabilities {
    /// No optional capability available.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Capabilities {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
