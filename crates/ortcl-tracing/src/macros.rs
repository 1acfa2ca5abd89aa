//! Convenience macros for performance tracing

/// Create a performance span, optionally tagged with fields.
///
/// Returns a [`crate::performance::PerformanceSpan`] guard that logs its
/// duration when dropped.
///
/// ```rust
/// use ortcl_tracing::perf_span;
///
/// {
///     let _span = perf_span!("map_image", width = 64, height = 64);
///     // ... blocking map ...
/// }
/// ```
#[macro_export]
macro_rules! perf_span {
    ($name:expr) => {{
        $crate::performance::PerformanceSpan::new($name, None)
    }};
    ($name:expr, $($field:tt = $value:expr),+ $(,)?) => {{
        let _span = $crate::tracing::debug_span!(
            "perf",
            name = $name,
            $($field = $value),+
        ).entered();
        $crate::performance::PerformanceSpan::new($name, None)
    }};
}

/// Emit a debug-level performance event.
///
/// ```rust
/// use ortcl_tracing::perf_event;
///
/// perf_event!("unmap", image = 3, bytes = 4096);
/// ```
#[macro_export]
macro_rules! perf_event {
    ($name:expr, $($field:tt = $value:expr),+ $(,)?) => {
        $crate::tracing::debug!(
            event = $name,
            $($field = $value),+
        );
    };
}
