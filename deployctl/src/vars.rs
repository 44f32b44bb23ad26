//! Variable expansion for job fields
//!
//! Replaces `$NAME` and `${NAME}` with values from the run's variables.
//! Unknown variables are left untouched, as is a `$` not followed by a name.

use std::collections::BTreeMap;

/// Variables available to a deployment run
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    vars: BTreeMap<String, String>,
}

impl EnvVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment
    pub fn from_process_env() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Set or override a variable
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Expand every known placeholder in `input`
    ///
    /// Unbraced names stop at the first character outside `[A-Za-z0-9_]`.
    pub fn expand(&self, input: &str) -> String {
        shellexpand::env_with_context_no_errors(input, |name: &str| self.get(name)).into_owned()
    }
}

impl FromIterator<(String, String)> for EnvVars {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}
