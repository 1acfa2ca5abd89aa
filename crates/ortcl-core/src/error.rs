//! Error types for dispatch operations

use crate::backend::{MapAccess, MemHandle, NdRange};
use crate::status::StatusCode;

/// Result type for dispatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Where in a dispatch operation a failure was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ArgumentBinding,
    Validation,
    Enqueue,
    AfterLaunch,
    Map,
    Unmap,
    Config,
}

/// Errors that can occur while launching kernels or mapping images
///
/// Device failures carry the [`StatusCode`]; its `Display` includes the
/// translated diagnostic name.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A kernel argument failed to bind; the launch was not enqueued
    #[error("{status} on setting argument {index}")]
    ArgumentBinding { status: StatusCode, index: u32 },

    /// Global/local work sizes cannot describe a launch
    #[error("invalid work grid: global {global}, local {local}")]
    InvalidWorkGrid { global: NdRange, local: NdRange },

    /// The device rejected the kernel enqueue
    #[error("{status} enqueueing kernel '{kernel}'")]
    Enqueue { status: StatusCode, kernel: String },

    /// Mapping an image into host memory failed
    #[error("{status} mapping {image} ({width}x{height}, {access})")]
    Map {
        status: StatusCode,
        image: MemHandle,
        width: usize,
        height: usize,
        access: MapAccess,
    },

    /// Releasing a host mapping failed
    #[error("{status} unmapping {image}")]
    Unmap { status: StatusCode, image: MemHandle },

    /// A post-launch queue call (`flush` or `finish`) failed
    #[error("{status} in {operation}")]
    Device { status: StatusCode, operation: &'static str },

    /// Requested map region is empty
    #[error("invalid map region {width}x{height}")]
    InvalidRegion { width: usize, height: usize },

    /// Mutable access requested on a read mapping
    #[error("{image} is mapped for reading")]
    ReadOnlyMapping { image: MemHandle },

    /// Row index past the mapped region
    #[error("row {row} out of range for mapped height {height}")]
    RowOutOfRange { row: usize, height: usize },

    /// Mapped bytes cannot be viewed as the requested element type
    #[error("mapped layout error: {0}")]
    Layout(String),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Create a post-launch error for the named queue operation
    pub fn device(status: StatusCode, operation: &'static str) -> Self {
        Self::Device { status, operation }
    }

    /// Create a layout error
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    /// Device status code behind this error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::ArgumentBinding { status, .. }
            | Self::Enqueue { status, .. }
            | Self::Map { status, .. }
            | Self::Unmap { status, .. }
            | Self::Device { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Index of the failing argument for bind failures
    pub fn arg_index(&self) -> Option<u32> {
        match self {
            Self::ArgumentBinding { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::ArgumentBinding { .. } => Stage::ArgumentBinding,
            Self::InvalidWorkGrid { .. }
            | Self::InvalidRegion { .. }
            | Self::ReadOnlyMapping { .. }
            | Self::RowOutOfRange { .. }
            | Self::Layout(_) => Stage::Validation,
            Self::Enqueue { .. } => Stage::Enqueue,
            Self::Device { .. } => Stage::AfterLaunch,
            Self::Map { .. } => Stage::Map,
            Self::Unmap { .. } => Stage::Unmap,
            Self::Config(_) => Stage::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_reports_code_and_index() {
        let err = Error::ArgumentBinding {
            status: StatusCode::OUT_OF_RESOURCES,
            index: 2,
        };
        assert_eq!(err.to_string(), "CL_OUT_OF_RESOURCES (-5) on setting argument 2");
        assert_eq!(err.status(), Some(StatusCode::OUT_OF_RESOURCES));
        assert_eq!(err.arg_index(), Some(2));
        assert_eq!(err.stage(), Stage::ArgumentBinding);
    }

    #[test]
    fn test_enqueue_error_names_kernel() {
        let err = Error::Enqueue {
            status: StatusCode::INVALID_WORK_GROUP_SIZE,
            kernel: "resize_bilinear".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "CL_INVALID_WORK_GROUP_SIZE (-54) enqueueing kernel 'resize_bilinear'"
        );
        assert_eq!(err.arg_index(), None);
        assert_eq!(err.stage(), Stage::Enqueue);
    }

    #[test]
    fn test_map_error_describes_region() {
        let err = Error::Map {
            status: StatusCode::MAP_FAILURE,
            image: MemHandle::new(4),
            width: 8,
            height: 2,
            access: MapAccess::Write,
        };
        assert_eq!(err.to_string(), "CL_MAP_FAILURE (-12) mapping mem4 (8x2, write)");
        assert_eq!(err.stage(), Stage::Map);
    }

    #[test]
    fn test_validation_errors_have_no_status() {
        let err = Error::InvalidWorkGrid {
            global: NdRange::new2(4, 4),
            local: NdRange::new1(2),
        };
        assert_eq!(err.status(), None);
        assert_eq!(err.stage(), Stage::Validation);
        assert_eq!(err.to_string(), "invalid work grid: global {4,4}, local {2}");
        assert_eq!(Error::Config("x".into()).stage(), Stage::Config);
        assert_eq!(Error::device(StatusCode::OUT_OF_RESOURCES, "finish").stage(), Stage::AfterLaunch);
    }

    #[test]
    fn test_post_launch_errors_name_the_queue_call() {
        for operation in ["flush", "finish"] {
            let err = Error::device(StatusCode::INVALID_COMMAND_QUEUE, operation);
            assert_eq!(err.stage(), Stage::AfterLaunch);
            assert_eq!(err.status(), Some(StatusCode::INVALID_COMMAND_QUEUE));
            assert_eq!(err.to_string(), format!("CL_INVALID_COMMAND_QUEUE (-36) in {operation}"));
        }
    }
}
