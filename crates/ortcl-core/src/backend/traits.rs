//! Interfaces of the device collaborators the dispatch core calls into
//!
//! Queue creation, kernel compilation and memory allocation live outside this
//! crate. The launcher and the image mapper only see these traits, which
//! keeps them testable against the host reference device in
//! [`crate::backends::host`].
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                ExecutionContext              │
//! │  command_queue() · after_launch() · profiler │
//! └───────────────┬──────────────────────────────┘
//!                 │
//!      ┌──────────┴──────────┐
//!      ▼                     ▼
//! ┌────────────────┐  ┌──────────────┐
//! │ KernelLauncher │  │ map_image2d  │
//! │   (enqueue)    │  │ (map/unmap)  │
//! └───────┬────────┘  └──────┬───────┘
//!         ▼                  ▼
//! ┌──────────────────────────────────┐
//! │           CommandQueue           │
//! └──────────────────────────────────┘
//! ```

use super::types::{EventHandle, KernelHandle, MapAccess, MapInfo, MemHandle, NdRange};
use crate::error::Result;
use crate::status::StatusCode;
use std::ptr::NonNull;

/// An ordered stream of device commands.
///
/// Every method reports the device's [`StatusCode`]; the queue is expected
/// to provide its own thread safety.
pub trait CommandQueue {
    /// Enqueue `kernel` over `global` work-items.
    ///
    /// An empty `local` range lets the device choose the work-group size.
    /// When `want_event` is set the queue returns an event for profiling.
    /// The call returns once the device has accepted the command.
    fn enqueue_nd_range_kernel(
        &self,
        kernel: KernelHandle,
        global: &NdRange,
        local: &NdRange,
        want_event: bool,
    ) -> std::result::Result<Option<EventHandle>, StatusCode>;

    /// Map a region of a 2D/3D image into host memory.
    ///
    /// With `blocking` set the call waits until the mapping is established,
    /// draining earlier work that touches `image`.
    fn enqueue_map_image(
        &self,
        image: MemHandle,
        blocking: bool,
        access: MapAccess,
        origin: [usize; 3],
        region: [usize; 3],
    ) -> std::result::Result<MapInfo, StatusCode>;

    /// Release a mapping previously returned by
    /// [`enqueue_map_image`](Self::enqueue_map_image).
    fn enqueue_unmap_mem_object(&self, image: MemHandle, ptr: NonNull<u8>) -> StatusCode;

    /// Submit all queued commands to the device.
    fn flush(&self) -> StatusCode;

    /// Block until all queued commands have completed.
    fn finish(&self) -> StatusCode;
}

/// A compiled kernel supplied by the kernel cache.
pub trait Kernel {
    fn handle(&self) -> KernelHandle;

    /// Name of the kernel function, used in diagnostics.
    fn function_name(&self) -> &str;

    /// Bind argument `index`.
    ///
    /// `value` is `None` for local-memory arguments, where only `size` is
    /// meaningful.
    fn set_arg(&self, index: u32, size: usize, value: Option<&[u8]>) -> StatusCode;
}

/// Receives events of profiled kernel launches.
pub trait LaunchProfiler {
    fn kernel_enqueued(&self, kernel_name: &str, event: EventHandle);
}

/// The execution provider state a launch or map runs against.
pub trait ExecutionContext {
    fn command_queue(&self) -> &dyn CommandQueue;

    /// Queue-level post-processing after a successful enqueue (flushing,
    /// synchronisation, event bookkeeping). Its result becomes the result of
    /// the launch.
    fn after_launch(&self) -> Result<()>;

    /// Profiling instrumentation, if enabled.
    fn profiler(&self) -> Option<&dyn LaunchProfiler> {
        None
    }
}
