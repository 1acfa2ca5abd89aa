//! Device status codes and their diagnostic names
//!
//! Every device call reports a [`StatusCode`]. [`error_string`] turns it into
//! the canonical OpenCL constant name for diagnostics; it is total and falls
//! back to `"Unknown"` for codes outside the OpenCL 1.2 table.

use std::fmt;

/// Outcome of a device operation. Zero is success, every other value is a
/// specific failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(pub i32);

/// Generic string for codes missing from the table.
pub const UNKNOWN: &str = "Unknown";

macro_rules! status_codes {
    ($($name:ident = $value:literal => $text:literal,)+) => {
        impl StatusCode {
            $(pub const $name: StatusCode = StatusCode($value);)+

            /// Every code with a dedicated diagnostic string.
            pub const KNOWN: &'static [StatusCode] = &[$(StatusCode::$name),+];
        }

        /// Translate a status code into its diagnostic name.
        pub const fn error_string(code: StatusCode) -> &'static str {
            match code.0 {
                $($value => $text,)+
                _ => UNKNOWN,
            }
        }
    };
}

status_codes! {
    SUCCESS = 0 => "CL_SUCCESS",
    DEVICE_NOT_FOUND = -1 => "CL_DEVICE_NOT_FOUND",
    DEVICE_NOT_AVAILABLE = -2 => "CL_DEVICE_NOT_AVAILABLE",
    COMPILER_NOT_AVAILABLE = -3 => "CL_COMPILER_NOT_AVAILABLE",
    MEM_OBJECT_ALLOCATION_FAILURE = -4 => "CL_MEM_OBJECT_ALLOCATION_FAILURE",
    OUT_OF_RESOURCES = -5 => "CL_OUT_OF_RESOURCES",
    OUT_OF_HOST_MEMORY = -6 => "CL_OUT_OF_HOST_MEMORY",
    PROFILING_INFO_NOT_AVAILABLE = -7 => "CL_PROFILING_INFO_NOT_AVAILABLE",
    MEM_COPY_OVERLAP = -8 => "CL_MEM_COPY_OVERLAP",
    IMAGE_FORMAT_MISMATCH = -9 => "CL_IMAGE_FORMAT_MISMATCH",
    IMAGE_FORMAT_NOT_SUPPORTED = -10 => "CL_IMAGE_FORMAT_NOT_SUPPORTED",
    BUILD_PROGRAM_FAILURE = -11 => "CL_BUILD_PROGRAM_FAILURE",
    MAP_FAILURE = -12 => "CL_MAP_FAILURE",
    MISALIGNED_SUB_BUFFER_OFFSET = -13 => "CL_MISALIGNED_SUB_BUFFER_OFFSET",
    EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST = -14 => "CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST",
    COMPILE_PROGRAM_FAILURE = -15 => "CL_COMPILE_PROGRAM_FAILURE",
    LINKER_NOT_AVAILABLE = -16 => "CL_LINKER_NOT_AVAILABLE",
    LINK_PROGRAM_FAILURE = -17 => "CL_LINK_PROGRAM_FAILURE",
    DEVICE_PARTITION_FAILED = -18 => "CL_DEVICE_PARTITION_FAILED",
    KERNEL_ARG_INFO_NOT_AVAILABLE = -19 => "CL_KERNEL_ARG_INFO_NOT_AVAILABLE",
    INVALID_VALUE = -30 => "CL_INVALID_VALUE",
    INVALID_DEVICE_TYPE = -31 => "CL_INVALID_DEVICE_TYPE",
    INVALID_PLATFORM = -32 => "CL_INVALID_PLATFORM",
    INVALID_DEVICE = -33 => "CL_INVALID_DEVICE",
    INVALID_CONTEXT = -34 => "CL_INVALID_CONTEXT",
    INVALID_QUEUE_PROPERTIES = -35 => "CL_INVALID_QUEUE_PROPERTIES",
    INVALID_COMMAND_QUEUE = -36 => "CL_INVALID_COMMAND_QUEUE",
    INVALID_HOST_PTR = -37 => "CL_INVALID_HOST_PTR",
    INVALID_MEM_OBJECT = -38 => "CL_INVALID_MEM_OBJECT",
    INVALID_IMAGE_FORMAT_DESCRIPTOR = -39 => "CL_INVALID_IMAGE_FORMAT_DESCRIPTOR",
    INVALID_IMAGE_SIZE = -40 => "CL_INVALID_IMAGE_SIZE",
    INVALID_SAMPLER = -41 => "CL_INVALID_SAMPLER",
    INVALID_BINARY = -42 => "CL_INVALID_BINARY",
    INVALID_BUILD_OPTIONS = -43 => "CL_INVALID_BUILD_OPTIONS",
    INVALID_PROGRAM = -44 => "CL_INVALID_PROGRAM",
    INVALID_PROGRAM_EXECUTABLE = -45 => "CL_INVALID_PROGRAM_EXECUTABLE",
    INVALID_KERNEL_NAME = -46 => "CL_INVALID_KERNEL_NAME",
    INVALID_KERNEL_DEFINITION = -47 => "CL_INVALID_KERNEL_DEFINITION",
    INVALID_KERNEL = -48 => "CL_INVALID_KERNEL",
    INVALID_ARG_INDEX = -49 => "CL_INVALID_ARG_INDEX",
    INVALID_ARG_VALUE = -50 => "CL_INVALID_ARG_VALUE",
    INVALID_ARG_SIZE = -51 => "CL_INVALID_ARG_SIZE",
    INVALID_KERNEL_ARGS = -52 => "CL_INVALID_KERNEL_ARGS",
    INVALID_WORK_DIMENSION = -53 => "CL_INVALID_WORK_DIMENSION",
    INVALID_WORK_GROUP_SIZE = -54 => "CL_INVALID_WORK_GROUP_SIZE",
    INVALID_WORK_ITEM_SIZE = -55 => "CL_INVALID_WORK_ITEM_SIZE",
    INVALID_GLOBAL_OFFSET = -56 => "CL_INVALID_GLOBAL_OFFSET",
    INVALID_EVENT_WAIT_LIST = -57 => "CL_INVALID_EVENT_WAIT_LIST",
    INVALID_EVENT = -58 => "CL_INVALID_EVENT",
    INVALID_OPERATION = -59 => "CL_INVALID_OPERATION",
    INVALID_GL_OBJECT = -60 => "CL_INVALID_GL_OBJECT",
    INVALID_BUFFER_SIZE = -61 => "CL_INVALID_BUFFER_SIZE",
    INVALID_MIP_LEVEL = -62 => "CL_INVALID_MIP_LEVEL",
    INVALID_GLOBAL_WORK_SIZE = -63 => "CL_INVALID_GLOBAL_WORK_SIZE",
    INVALID_PROPERTY = -64 => "CL_INVALID_PROPERTY",
    INVALID_IMAGE_DESCRIPTOR = -65 => "CL_INVALID_IMAGE_DESCRIPTOR",
    INVALID_COMPILER_OPTIONS = -66 => "CL_INVALID_COMPILER_OPTIONS",
    INVALID_LINKER_OPTIONS = -67 => "CL_INVALID_LINKER_OPTIONS",
    INVALID_DEVICE_PARTITION_COUNT = -68 => "CL_INVALID_DEVICE_PARTITION_COUNT",
}

/// Coarse failure taxonomy used when reporting device errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Success,
    /// Host or device memory/compute resources unavailable.
    ResourceExhaustion,
    /// Stale or mismatched kernel, queue, memory or context references.
    InvalidHandle,
    /// Wrong size, type, index or value passed to a device call.
    InvalidArgument,
    /// Program compilation or linking failed.
    BuildFailure,
    /// Image format or size the device cannot handle.
    UnsupportedFormat,
    /// Failure while executing queued work (map failure, wait lists, ...).
    Execution,
    Unknown,
}

impl StatusCode {
    /// Wrap a raw device code.
    pub const fn new(code: i32) -> Self {
        StatusCode(code)
    }

    /// Raw numeric code.
    pub const fn code(self) -> i32 {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 == StatusCode::SUCCESS.0
    }

    /// Diagnostic name, see [`error_string`].
    pub const fn name(self) -> &'static str {
        error_string(self)
    }

    /// `Ok(())` for success, the code itself otherwise.
    pub const fn check(self) -> Result<(), StatusCode> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub const fn category(self) -> ErrorCategory {
        match self.0 {
            0 => ErrorCategory::Success,
            -2 | -4 | -5 | -6 => ErrorCategory::ResourceExhaustion,
            -1 | -34..=-32 | -36 | -38 | -41 | -44 | -45 | -48 | -58 | -60 => ErrorCategory::InvalidHandle,
            -3 | -11 | -17..=-15 | -42 | -43 | -46 | -47 | -66 | -67 => ErrorCategory::BuildFailure,
            -9 | -10 | -39 | -40 | -65 => ErrorCategory::UnsupportedFormat,
            -7 | -8 | -12 | -13 | -14 | -18 | -19 => ErrorCategory::Execution,
            -30 | -31 | -35 | -37 | -57..=-49 | -59 | -64..=-61 | -68 => ErrorCategory::InvalidArgument,
            _ => ErrorCategory::Unknown,
        }
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::SUCCESS
    }
}

impl From<i32> for StatusCode {
    fn from(code: i32) -> Self {
        StatusCode(code)
    }
}

impl From<StatusCode> for i32 {
    fn from(status: StatusCode) -> Self {
        status.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", error_string(*self), self.0)
    }
}
