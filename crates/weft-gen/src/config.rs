// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::path::PathBuf;

use weft_spec::{DEFAULT_MARKER, LoadConfig};

use crate::artifact::WriteOptions;
use crate::shape::{DEFAULT_HTTP_METHOD, DEFAULT_RUNTIME_CRATE, GenOptions};

/// weft-gen configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Directory source patterns are resolved against
    pub cwd: PathBuf,
    /// Root generated files are written under (defaults to `cwd`)
    pub out_dir: Option<PathBuf>,
    /// Source glob patterns (empty means every `.rs` file)
    pub patterns: Vec<String>,
    /// Tag marker
    pub marker: String,
    /// Runtime crate path used by generated code
    pub runtime_crate: String,
    /// Maximum analyzers running at once per unit
    pub jobs: usize,
    /// Reject ambiguous declarations instead of guessing
    pub strict: bool,
    /// Format generated files with rustfmt
    pub rustfmt: bool,
    /// Stop at the first failing unit
    pub fail_fast: bool,
    /// Keep running the other analyzers of a unit after one fails
    pub continue_on_error: bool,
    /// Default HTTP method for service routes
    pub http_method: String,
}

impl GeneratorConfig {
    /// Defaults rooted at `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            out_dir: None,
            patterns: Vec::new(),
            marker: DEFAULT_MARKER.to_string(),
            runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
            jobs: default_jobs(),
            strict: true,
            rustfmt: false,
            fail_fast: false,
            continue_on_error: false,
            http_method: DEFAULT_HTTP_METHOD.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `WEFT_CWD`: working directory (default: the process working directory)
    /// - `WEFT_OUT_DIR`: output root (default: `WEFT_CWD`)
    /// - `WEFT_PATTERNS`: comma separated source globs (default: `**/*.rs`)
    /// - `WEFT_MARKER`: tag marker (default: `weft`)
    /// - `WEFT_RUNTIME_CRATE`: runtime crate path (default: `weft_runtime`)
    /// - `WEFT_JOBS`: analyzers per unit running at once (default: available cores)
    /// - `WEFT_STRICT`: reject ambiguous declarations (default: true)
    /// - `WEFT_RUSTFMT`: format generated files (default: false)
    /// - `WEFT_FAIL_FAST`: stop at the first failing unit (default: false)
    /// - `WEFT_CONTINUE_ON_ERROR`: keep analyzing a unit after an analyzer fails (default: false)
    /// - `WEFT_HTTP_METHOD`: default route method (default: POST)
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = match std::env::var("WEFT_CWD") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir().map_err(|_| ConfigError::Missing("WEFT_CWD"))?,
        };
        let mut config = Self::new(cwd);

        config.out_dir = std::env::var("WEFT_OUT_DIR").ok().map(PathBuf::from);

        if let Ok(patterns) = std::env::var("WEFT_PATTERNS") {
            config.patterns = patterns
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(marker) = std::env::var("WEFT_MARKER") {
            config.set_marker(marker)?;
        }

        if let Ok(runtime_crate) = std::env::var("WEFT_RUNTIME_CRATE") {
            config.runtime_crate = runtime_crate;
        }

        if let Ok(jobs) = std::env::var("WEFT_JOBS") {
            config.jobs = jobs
                .parse()
                .ok()
                .filter(|n: &usize| *n > 0)
                .ok_or(ConfigError::Invalid("WEFT_JOBS", "must be a positive integer"))?;
        }

        config.strict = env_flag("WEFT_STRICT", config.strict)?;
        config.rustfmt = env_flag("WEFT_RUSTFMT", config.rustfmt)?;
        config.fail_fast = env_flag("WEFT_FAIL_FAST", config.fail_fast)?;
        config.continue_on_error = env_flag("WEFT_CONTINUE_ON_ERROR", config.continue_on_error)?;

        if let Ok(method) = std::env::var("WEFT_HTTP_METHOD") {
            config.http_method = method.to_ascii_uppercase();
        }

        Ok(config)
    }

    /// Replaces the tag marker. A marker is lowercase ASCII letters and digits.
    pub fn set_marker(&mut self, marker: impl Into<String>) -> Result<(), ConfigError> {
        let marker = marker.into();
        if !is_marker(&marker) {
            return Err(ConfigError::Invalid(
                "WEFT_MARKER",
                "must be lowercase letters and digits",
            ));
        }
        self.marker = marker;
        Ok(())
    }

    /// Where generated files go.
    pub fn output_root(&self) -> PathBuf {
        self.out_dir.clone().unwrap_or_else(|| self.cwd.clone())
    }

    /// Source loading settings.
    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            cwd: self.cwd.clone(),
            patterns: self.patterns.clone(),
        }
    }

    /// Generation settings.
    pub fn gen_options(&self) -> GenOptions {
        GenOptions {
            runtime_crate: self.runtime_crate.clone(),
            strict: self.strict,
            http_method: self.http_method.clone(),
            marker: self.marker.clone(),
        }
    }

    /// Writer settings.
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            rustfmt: self.rustfmt,
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

fn is_marker(marker: &str) -> bool {
    !marker.is_empty()
        && marker
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

fn env_flag(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid(key, "must be true or false")),
        },
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required value is missing and has no usable default.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Serializes tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const KEYS: [&str; 11] = [
        "WEFT_CWD",
        "WEFT_OUT_DIR",
        "WEFT_PATTERNS",
        "WEFT_MARKER",
        "WEFT_RUNTIME_CRATE",
        "WEFT_JOBS",
        "WEFT_STRICT",
        "WEFT_RUSTFMT",
        "WEFT_FAIL_FAST",
        "WEFT_CONTINUE_ON_ERROR",
        "WEFT_HTTP_METHOD",
    ];

    /// Sets env vars for a test and restores them after
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn clean() -> Self {
            let mut guard = Self { vars: Vec::new() };
            for key in KEYS {
                guard.remove(key);
            }
            guard
        }

        fn set(&mut self, key: &str, value: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::set_var(key, value) };
        }

        fn remove(&mut self, key: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::remove_var(key) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.drain(..).rev() {
                // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
                unsafe {
                    match value {
                        Some(v) => env::set_var(&key, v),
                        None => env::remove_var(&key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_config_from_env_with_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();
        guard.set("WEFT_CWD", "/srv/app");

        let config = GeneratorConfig::from_env().unwrap();

        assert_eq!(config.cwd, PathBuf::from("/srv/app"));
        assert_eq!(config.output_root(), PathBuf::from("/srv/app"));
        assert!(config.patterns.is_empty());
        assert_eq!(config.marker, "weft");
        assert_eq!(config.runtime_crate, "weft_runtime");
        assert!(config.jobs >= 1);
        assert!(config.strict);
        assert!(!config.rustfmt);
        assert!(!config.fail_fast);
        assert!(!config.continue_on_error);
        assert_eq!(config.http_method, "POST");
    }

    #[test]
    fn test_config_from_env_all_custom() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();
        guard.set("WEFT_CWD", "/srv/app");
        guard.set("WEFT_OUT_DIR", "/tmp/out");
        guard.set("WEFT_PATTERNS", "src/**/*.rs, crates/*/src/*.rs");
        guard.set("WEFT_MARKER", "acme");
        guard.set("WEFT_RUNTIME_CRATE", "crate::rt");
        guard.set("WEFT_JOBS", "3");
        guard.set("WEFT_STRICT", "false");
        guard.set("WEFT_RUSTFMT", "1");
        guard.set("WEFT_FAIL_FAST", "yes");
        guard.set("WEFT_CONTINUE_ON_ERROR", "on");
        guard.set("WEFT_HTTP_METHOD", "put");

        let config = GeneratorConfig::from_env().unwrap();

        assert_eq!(config.output_root(), PathBuf::from("/tmp/out"));
        assert_eq!(config.patterns, ["src/**/*.rs", "crates/*/src/*.rs"]);
        assert_eq!(config.jobs, 3);
        assert!(!config.strict);
        assert!(config.rustfmt);
        assert!(config.fail_fast);
        assert!(config.continue_on_error);

        let options = config.gen_options();
        assert_eq!(options.marker, "acme");
        assert_eq!(options.runtime_crate, "crate::rt");
        assert_eq!(options.http_method, "PUT");
        assert!(!options.strict);
    }

    #[test]
    fn test_config_invalid_jobs() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();
        guard.set("WEFT_JOBS", "0");

        let err = GeneratorConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("WEFT_JOBS", _)));
        assert!(err.to_string().contains("WEFT_JOBS"));
    }

    #[test]
    fn test_config_invalid_flag() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();
        guard.set("WEFT_STRICT", "maybe");

        let err = GeneratorConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("WEFT_STRICT", _)));
    }

    #[test]
    fn test_config_invalid_marker() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();
        guard.set("WEFT_MARKER", "Weft:");

        assert!(matches!(
            GeneratorConfig::from_env(),
            Err(ConfigError::Invalid("WEFT_MARKER", _))
        ));
    }

    #[test]
    fn test_set_marker_validates() {
        let mut config = GeneratorConfig::new("/srv/app");

        assert!(matches!(
            config.set_marker("Acme"),
            Err(ConfigError::Invalid("WEFT_MARKER", _))
        ));
        assert!(config.set_marker("").is_err());
        assert_eq!(config.marker, "weft");

        config.set_marker("acme2").unwrap();
        assert_eq!(config.gen_options().marker, "acme2");
    }
}
