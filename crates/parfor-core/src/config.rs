//! Worker-count configuration from .parforrc (JSON) and the environment.
//!
//! Nothing here is cached globally: resolve a [`ThreadConfig`] once at startup
//! and pass it to the engine.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Worker count used when nothing else is configured.
pub const DEFAULT_THREADS: usize = 4;
/// Lower clamp for a configured worker count.
pub const MIN_THREADS: usize = 1;
/// Upper clamp for a configured worker count.
pub const MAX_THREADS: usize = 64;

/// Environment variable overriding the worker count.
pub const THREADS_ENV: &str = "PARFOR_NUM_THREADS";
/// Environment variable enabling core pinning (`1`, `true`, `yes`).
pub const PIN_ENV: &str = "PARFOR_PIN_WORKERS";
/// Config file looked up in the project dir, then home.
pub const CONFIG_FILE: &str = ".parforrc";

/// Resolved worker-count settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThreadConfig {
    /// Default worker count for a call
    pub threads: usize,
    pub min_threads: usize,
    pub max_threads: usize,
    /// Pin worker `i` to core `i % cpus`
    pub pin_workers: bool,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            min_threads: MIN_THREADS,
            max_threads: MAX_THREADS,
            pin_workers: false,
        }
    }
}

impl ThreadConfig {
    /// Defaults with the process environment applied.
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Load `.parforrc` from `dir`, then `~/.parforrc`, then apply the
    /// environment. Missing or invalid file = defaults.
    pub fn load(dir: &Path) -> Self {
        Self::load_with(dir, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) with environment lookups going through `lookup`.
    pub fn load_with<F>(dir: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let candidates = [
            Some(dir.join(CONFIG_FILE)),
            dirs::home_dir().map(|h| h.join(CONFIG_FILE)),
        ];
        let mut cfg = Self::default();
        for path in candidates.iter().flatten() {
            if path.is_file() {
                if let Some(from_file) = read_file(path) {
                    cfg = from_file;
                }
                break;
            }
        }
        cfg.with_env(lookup)
    }

    /// Apply overrides from `lookup` (normally `std::env::var`).
    ///
    /// The thread count is parsed as a signed integer and clamped to
    /// `[min_threads, max_threads]`; text that does not parse counts as 0 and
    /// so lands on `min_threads`.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(THREADS_ENV) {
            let parsed = raw.trim().parse::<i64>().unwrap_or(0);
            self.threads = self.clamp_signed(parsed);
        } else {
            self.threads = self.clamp(self.threads);
        }
        if let Some(raw) = lookup(PIN_ENV) {
            self.pin_workers = matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        self
    }

    /// Bound `requested` to `[min_threads, max_threads]`.
    pub fn clamp(&self, requested: usize) -> usize {
        requested.min(self.max_threads).max(self.min_threads)
    }

    fn clamp_signed(&self, requested: i64) -> usize {
        self.clamp(usize::try_from(requested).unwrap_or(0))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_threads == 0 {
            return Err(ConfigError::ZeroMinimum);
        }
        if self.min_threads > self.max_threads {
            return Err(ConfigError::InvertedBounds {
                min: self.min_threads,
                max: self.max_threads,
            });
        }
        Ok(())
    }
}

fn read_file(path: &Path) -> Option<ThreadConfig> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "could not read config, using defaults"
            );
            return None;
        }
    };
    let cfg: ThreadConfig = match serde_json::from_str(&text) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
            return None;
        }
    };
    if let Err(e) = cfg.validate() {
        tracing::warn!(path = %path.display(), error = %e, "invalid thread bounds, using defaults");
        return None;
    }
    Some(cfg)
}
