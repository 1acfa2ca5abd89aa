//! Execution context configuration
//!
//! Controls what an [`ExecutionContext`](crate::ExecutionContext)
//! implementation does around each launch. The host reference context
//! honours every field; device-backed contexts are expected to do the same.

use crate::error::{Error, Result};
use std::env;

/// Post-launch behaviour of an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextConfig {
    /// Request events for launches and report them to the profiler.
    pub profiling: bool,
    /// Flush the queue after every launch.
    pub flush_after_launch: bool,
    /// Wait for queue completion after every launch.
    pub sync_after_launch: bool,
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub fn with_flush_after_launch(mut self, enabled: bool) -> Self {
        self.flush_after_launch = enabled;
        self
    }

    pub fn with_sync_after_launch(mut self, enabled: bool) -> Self {
        self.sync_after_launch = enabled;
        self
    }

    /// Build a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ORTCL_PROFILING` - Record launch events: `1`, `true`, `yes`
    /// - `ORTCL_FLUSH_AFTER_LAUNCH` - Flush after each launch
    /// - `ORTCL_SYNC_AFTER_LAUNCH` - Finish after each launch
    ///
    /// Unrecognised values are rejected.
    pub fn try_from_env() -> Result<Self> {
        Ok(Self {
            profiling: env_flag("ORTCL_PROFILING")?,
            flush_after_launch: env_flag("ORTCL_FLUSH_AFTER_LAUNCH")?,
            sync_after_launch: env_flag("ORTCL_SYNC_AFTER_LAUNCH")?,
        })
    }

    /// Like [`try_from_env`](Self::try_from_env), falling back to the
    /// default configuration on invalid values.
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring context configuration from environment");
            Self::default()
        })
    }
}

fn env_flag(key: &str) -> Result<bool> {
    let Ok(value) = env::var(key) else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        other => Err(Error::Config(format!("{key}={other} is not a boolean"))),
    }
}
