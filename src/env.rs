use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable, session-wide variable store and working directory.
///
/// The environment contains:
/// - `vars`: a map of variables visible to executed commands; last write
///   wins, and the store lives for the whole interactive session.
/// - `current_dir`: the working directory for command execution, kept in
///   sync with the process working directory by the `cd` builtin.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of variables (e.g., PATH, HOME, user assignments).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// This copies variables from `std::env::vars()` and initializes
    /// `current_dir` from `std::env::current_dir()`.
    pub fn new() -> Self {
        let mut vars = HashMap::new();
        for (k, v) in stdenv::vars() {
            vars.insert(k, v);
        }
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Get the value of a variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to
    /// `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// The expander's view of a variable: its value, or the empty string
    /// when undefined.
    pub fn value_of(&self, key: &str) -> String {
        self.get_var(key).unwrap_or_default()
    }

    /// Set or override a variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Environment;
    use std::collections::HashMap;
    use std::env as stdenv;

    fn empty_env() -> Environment {
        Environment {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap(),
        }
    }

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = empty_env();

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE".to_string()));
    }

    #[test]
    fn test_last_write_wins() {
        let mut env = empty_env();
        env.set_var("KEY", "first");
        env.set_var("KEY", "second");
        assert_eq!(env.get_var("KEY"), Some("second".to_string()));
    }

    #[test]
    fn test_value_of_defaults_to_empty() {
        let env = empty_env();
        assert_eq!(env.value_of("SOME_RANDOM_ENV_VAR_12345"), "");
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }
}
