//! Environment reader module
//!
//! This module provides the low-level abstraction for reading environment
//! variables, so configuration can be resolved against the process environment
//! or against an in-memory map in tests.

use super::ConfigError;
use std::collections::HashMap;
use std::env;

/// Trait for reading environment variables
pub trait EnvReader {
    /// Get a variable by name, `None` when it is not set
    fn get_var(&self, key: &str) -> Result<Option<String>, ConfigError>;
}

/// Reader backed by the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvReader;

impl EnvReader for SystemEnvReader {
    fn get_var(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => Err(ConfigError::EnvUnavailable {
                key: key.to_owned(),
                reason: "value is not valid unicode".to_owned(),
            }),
        }
    }
}

impl EnvReader for HashMap<String, String> {
    fn get_var(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.get(key).cloned())
    }
}

impl<R: EnvReader + ?Sized> EnvReader for &R {
    fn get_var(&self, key: &str) -> Result<Option<String>, ConfigError> {
        (**self).get_var(key)
    }
}

/// Mock environment reader for unit tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockEnvReader {
    vars: HashMap<String, String>,
    failing: Option<String>,
}

#[cfg(test)]
impl MockEnvReader {
    /// Create a new mock reader
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable to the mock reader
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Make reads of `key` fail
    pub fn with_failing_var(mut self, key: &str) -> Self {
        self.failing = Some(key.to_owned());
        self
    }
}

#[cfg(test)]
impl EnvReader for MockEnvReader {
    fn get_var(&self, key: &str) -> Result<Option<String>, ConfigError> {
        if self.failing.as_deref() == Some(key) {
            return Err(ConfigError::EnvUnavailable {
                key: key.to_owned(),
                reason: "mock failure".to_owned(),
            });
        }
        Ok(self.vars.get(key).cloned())
    }
}
