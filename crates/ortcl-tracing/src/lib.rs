//! Shared tracing configuration for the OpenCL dispatch workspace.
//!
//! Binaries, integration tests and benchmarks install their `tracing`
//! subscriber through this crate so that launch and mapping diagnostics from
//! `ortcl-core` look the same everywhere. The core itself only emits events;
//! installing a subscriber is always the embedder's decision.

pub mod performance;

#[macro_use]
pub mod macros;

use std::env;

pub use tracing::{debug, error, info, trace, warn};

#[doc(hidden)]
pub use tracing;

use tracing::Subscriber;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter, Registry};

/// Configuration describing how the shared tracing subscriber should behave.
#[derive(Clone, Debug)]
pub struct TracingConfig {
    /// Optional tracing directives (e.g. `ortcl_core=debug,info`). When
    /// absent the crate falls back to `RUST_LOG` and finally to
    /// [`default_directive`](Self::default_directive).
    pub directives: Option<String>,
    /// Fallback directive used when neither `directives` nor `RUST_LOG`
    /// resolve to a valid filter.
    pub default_directive: String,
    /// Controls whether event targets (module paths) appear in output.
    pub include_targets: bool,
    /// Controls ANSI formatting. Disable for CI logs that strip colour codes.
    pub ansi: bool,
    /// Span lifecycle events to emit. Defaults to [`FmtSpan::NONE`].
    pub span_events: FmtSpan,
    /// Output format for the formatter layer.
    pub output: TracingOutput,
    /// Controls whether performance spans around enqueue and map calls log
    /// their timings.
    pub enable_performance_tracing: bool,
    /// Minimum duration in microseconds for a performance span to be logged.
    pub performance_threshold_us: Option<u64>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::for_local()
    }
}

impl TracingConfig {
    /// Pretty, ANSI-enabled output for local development.
    pub fn for_local() -> Self {
        Self {
            directives: None,
            default_directive: "info".to_string(),
            include_targets: true,
            ansi: true,
            span_events: FmtSpan::NONE,
            output: TracingOutput::Pretty,
            enable_performance_tracing: cfg!(debug_assertions),
            performance_threshold_us: None,
        }
    }

    /// JSON output without ANSI codes, for CI and log collection.
    pub fn for_ci() -> Self {
        Self {
            directives: None,
            default_directive: "info".to_string(),
            include_targets: true,
            ansi: false,
            span_events: FmtSpan::NONE,
            output: TracingOutput::Json,
            enable_performance_tracing: false,
            performance_threshold_us: None,
        }
    }

    /// Verbose launch diagnostics and span timings for profiling sessions.
    ///
    /// Enables debug-level output for the dispatch core so every kernel
    /// launch logs its name and work sizes.
    pub fn for_performance() -> Self {
        Self {
            directives: Some("ortcl_core=debug,ortcl_tracing=debug".to_string()),
            default_directive: "info".to_string(),
            include_targets: true,
            ansi: false,
            span_events: FmtSpan::CLOSE,
            output: TracingOutput::Json,
            enable_performance_tracing: true,
            performance_threshold_us: None,
        }
    }

    /// Build a configuration using environment hints.
    ///
    /// # Environment Variables
    ///
    /// - `ORTCL_TRACING_PROFILE` - Profile preset: `local` (default), `ci`, or `performance`
    /// - `ORTCL_TRACING_DIRECTIVES` - Overrides tracing directives
    /// - `ORTCL_TRACING_FORMAT` - Output format: `pretty`, `compact`, or `json`
    /// - `ORTCL_PERF_TRACING` - Enable/disable performance tracing: `true` or `false`
    /// - `ORTCL_PERF_THRESHOLD_US` - Minimum duration (microseconds) to log
    pub fn from_env() -> Self {
        let profile = env::var("ORTCL_TRACING_PROFILE")
            .unwrap_or_else(|_| "local".to_string())
            .to_ascii_lowercase();

        let mut config = match profile.as_str() {
            "ci" => Self::for_ci(),
            "performance" => Self::for_performance(),
            _ => Self::for_local(),
        };

        if let Ok(directives) = env::var("ORTCL_TRACING_DIRECTIVES") {
            if !directives.trim().is_empty() {
                config.directives = Some(directives);
            }
        }

        if let Ok(format) = env::var("ORTCL_TRACING_FORMAT") {
            if let Some(parsed) = TracingOutput::from_env_value(&format) {
                config.output = parsed;
                if matches!(config.output, TracingOutput::Json) {
                    config.ansi = false;
                }
            }
        }

        if let Ok(perf_tracing) = env::var("ORTCL_PERF_TRACING") {
            config.enable_performance_tracing = parse_flag(&perf_tracing);
        }

        if let Ok(threshold) = env::var("ORTCL_PERF_THRESHOLD_US") {
            if let Ok(threshold_us) = threshold.trim().parse::<u64>() {
                config.performance_threshold_us = Some(threshold_us);
            }
        }

        config
    }

    /// Install this configuration's performance tracing switch and default
    /// span threshold. [`init_global_tracing`] does this automatically.
    pub fn apply_performance_settings(&self) {
        performance::configure(self.enable_performance_tracing, self.performance_threshold_us);
    }

    fn resolve_filter(&self) -> Result<EnvFilter, TracingSetupError> {
        if let Some(directives) = &self.directives {
            EnvFilter::try_new(directives).map_err(|err| TracingSetupError::InvalidFilter(err.to_string()))
        } else {
            match EnvFilter::try_from_default_env() {
                Ok(filter) => Ok(filter),
                Err(_) => Ok(EnvFilter::new(self.default_directive.clone())),
            }
        }
    }
}

/// Accepts `1`, `true` and `yes` (case-insensitive) as enabled.
pub fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}

/// Errors surfaced when configuring the shared tracing subscriber fails.
#[derive(Debug, thiserror::Error)]
pub enum TracingSetupError {
    /// The provided directive string could not be parsed.
    #[error("invalid tracing directive: {0}")]
    InvalidFilter(String),

    /// Installing the global subscriber failed (usually because one is
    /// already set).
    #[error("failed to install global tracing subscriber: {0}")]
    SubscriberInit(#[source] tracing_subscriber::util::TryInitError),
}

/// Build a `tracing` subscriber using the provided configuration.
pub fn build_subscriber(config: &TracingConfig) -> Result<impl Subscriber + Send + Sync, TracingSetupError> {
    let (filter, fmt_layer) = subscriber_layers(config)?;
    Ok(Registry::default().with(fmt_layer).with(filter))
}

/// Build the filter and formatting layers for external composition.
pub fn subscriber_layers(
    config: &TracingConfig,
) -> Result<(EnvFilter, Box<dyn Layer<Registry> + Send + Sync>), TracingSetupError> {
    let filter = config.resolve_filter()?;
    let span_events = config.span_events.clone();
    let include_targets = config.include_targets;

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.output {
        TracingOutput::Compact => Box::new(
            tracing_fmt::layer()
                .compact()
                .with_target(include_targets)
                .with_ansi(config.ansi)
                .with_span_events(span_events),
        ),
        TracingOutput::Pretty => Box::new(
            tracing_fmt::layer()
                .pretty()
                .with_target(include_targets)
                .with_ansi(config.ansi)
                .with_span_events(span_events),
        ),
        TracingOutput::Json => Box::new(
            tracing_fmt::layer()
                .json()
                .with_target(include_targets)
                .with_span_events(span_events)
                .with_ansi(false),
        ),
    };

    Ok((filter, layer))
}

/// Install the configured subscriber as the process-wide default.
///
/// Also applies the configuration's performance settings, even when a
/// subscriber was already installed.
pub fn init_global_tracing(config: &TracingConfig) -> Result<(), TracingSetupError> {
    let subscriber = build_subscriber(config)?;
    config.apply_performance_settings();
    subscriber.try_init().map_err(TracingSetupError::SubscriberInit)
}

/// Output format choices for the tracing formatter layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TracingOutput {
    Compact,
    Pretty,
    Json,
}

impl TracingOutput {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}
