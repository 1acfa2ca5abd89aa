//! Timing utilities for device calls
//!
//! The dispatch core wraps profiled kernel enqueues and blocking image maps
//! in a [`PerformanceSpan`] and reports completed operations through
//! [`record_launch`] and [`record_map`].
//!
//! Whether spans and records are logged at all, and the default threshold
//! for spans created without one, are process-wide settings installed by
//! [`configure`] (called from [`crate::init_global_tracing`]).
//!
//! ```rust
//! use ortcl_tracing::performance::{record_launch, PerformanceSpan};
//!
//! let span = PerformanceSpan::new("enqueue_nd_range_kernel", Some(100));
//! // ... enqueue ...
//! let elapsed = span.elapsed_us();
//! drop(span); // logged only if the enqueue took at least 100μs
//!
//! record_launch("conv2d", 65_536, elapsed);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tracing::Level;

static ENABLED: AtomicBool = AtomicBool::new(true);
/// Zero logs every span.
static DEFAULT_THRESHOLD_US: AtomicU64 = AtomicU64::new(0);

/// Install the process-wide performance tracing settings.
///
/// `threshold_us` applies to spans created without an explicit threshold.
pub fn configure(enabled: bool, threshold_us: Option<u64>) {
    ENABLED.store(enabled, Ordering::Relaxed);
    DEFAULT_THRESHOLD_US.store(threshold_us.unwrap_or(0), Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Threshold used by spans created without one, if any.
pub fn default_threshold_us() -> Option<u64> {
    match DEFAULT_THRESHOLD_US.load(Ordering::Relaxed) {
        0 => None,
        us => Some(us),
    }
}

/// Serialises tests that change the process-wide settings.
#[cfg(test)]
pub(crate) static SETTINGS_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn should_log(enabled: bool, threshold_us: Option<u64>, elapsed_us: u64) -> bool {
    enabled && threshold_us.is_none_or(|t| elapsed_us >= t)
}

/// RAII guard that measures a span's duration and logs it on drop.
///
/// Logging is suppressed when the elapsed time is below the optional
/// threshold.
pub struct PerformanceSpan {
    enabled: bool,
    threshold_us: Option<u64>,
    start_time: Instant,
    span: tracing::Span,
}

impl PerformanceSpan {
    /// Create a debug-level span. `threshold_us = None` falls back to
    /// [`default_threshold_us`].
    pub fn new(span_name: impl Into<String>, threshold_us: Option<u64>) -> Self {
        Self::with_level(Level::DEBUG, span_name, threshold_us)
    }

    /// Create a span at the given level.
    pub fn with_level(level: Level, span_name: impl Into<String>, threshold_us: Option<u64>) -> Self {
        let span_name = span_name.into();
        let span = match level {
            Level::TRACE => tracing::trace_span!("perf", name = %span_name),
            Level::DEBUG => tracing::debug_span!("perf", name = %span_name),
            Level::INFO => tracing::info_span!("perf", name = %span_name),
            Level::WARN => tracing::warn_span!("perf", name = %span_name),
            Level::ERROR => tracing::error_span!("perf", name = %span_name),
        };

        Self {
            enabled: is_enabled(),
            threshold_us: threshold_us.or_else(default_threshold_us),
            start_time: Instant::now(),
            span,
        }
    }

    /// Microseconds since the span was created.
    pub fn elapsed_us(&self) -> u64 {
        self.start_time.elapsed().as_micros() as u64
    }

    /// Enter this span's context.
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for PerformanceSpan {
    fn drop(&mut self) {
        let elapsed_us = self.elapsed_us();

        if should_log(self.enabled, self.threshold_us, elapsed_us) {
            let _entered = self.span.enter();
            tracing::debug!(
                duration_us = elapsed_us,
                duration_ms = elapsed_us as f64 / 1000.0,
                "performance_span_complete"
            );
        }
    }
}

/// Record a completed kernel enqueue.
///
/// `work_items` is the product of the global work size.
pub fn record_launch(kernel: &str, work_items: u64, duration_us: u64) {
    if !is_enabled() {
        return;
    }
    tracing::debug!(
        event = "launch",
        kernel = kernel,
        work_items = work_items,
        duration_us = duration_us,
        "kernel_enqueued"
    );
}

/// Record a completed blocking image map.
pub fn record_map(width: usize, height: usize, row_pitch: usize, write: bool, duration_us: u64) {
    if !is_enabled() {
        return;
    }
    let mapped_bytes = row_pitch * height;
    tracing::debug!(
        event = "map",
        width = width,
        height = height,
        row_pitch = row_pitch,
        mapped_kb = mapped_bytes as f64 / 1024.0,
        write = write,
        duration_us = duration_us,
        "image_mapped"
    );
}
