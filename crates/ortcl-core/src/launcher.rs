//! Kernel argument binding and launch
//!
//! [`KernelLauncher`] is a consuming builder: each `set_*` call binds the
//! next argument through the kernel collaborator and threads the outcome
//! through an internal `Result`. The first failing bind is kept; once a bind
//! has failed, later binds are not forwarded to the device. [`launch`]
//! checks that state before touching the queue, so a kernel never runs with
//! partially bound arguments.
//!
//! ```rust
//! use ortcl_core::backends::host::{HostContext, HostKernel};
//! use ortcl_core::{ContextConfig, KernelLauncher, MemHandle, NdRange};
//!
//! # fn main() -> ortcl_core::Result<()> {
//! let ctx = HostContext::new(ContextConfig::default());
//! let kernel = HostKernel::new(ctx.queue(), "scale", &[8, 4, 4]);
//! let image = ctx.queue().create_image2d(16, 16, 4);
//!
//! KernelLauncher::new(&kernel)
//!     .set_image2d(image)
//!     .set_arg(&2.0f32)
//!     .set_arg(&16u32)
//!     .launch(&ctx, &NdRange::new2(16, 16), &NdRange::new2(4, 4))?;
//!
//! assert_eq!(ctx.queue().stats().enqueues, 1);
//! # Ok(())
//! # }
//! ```
//!
//! [`launch`]: KernelLauncher::launch

use crate::backend::{ExecutionContext, Kernel, MemHandle, NdRange};
use crate::error::{Error, Result};
use crate::status::StatusCode;
use ortcl_tracing::perf_span;
use ortcl_tracing::performance::record_launch;

/// First failing bind: its status and argument index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BindFailure {
    status: StatusCode,
    index: u32,
}

/// Binds arguments of one kernel and launches it once.
///
/// The kernel is borrowed from the kernel cache for the duration of the
/// launch.
pub struct KernelLauncher<'k> {
    kernel: &'k dyn Kernel,
    next_index: u32,
    bound: std::result::Result<(), BindFailure>,
}

impl<'k> KernelLauncher<'k> {
    pub fn new(kernel: &'k dyn Kernel) -> Self {
        Self {
            kernel,
            next_index: 0,
            bound: Ok(()),
        }
    }

    /// Bind the bytes of a plain value as the next argument.
    pub fn set_arg<T: bytemuck::Pod>(self, value: &T) -> Self {
        let bytes = bytemuck::bytes_of(value);
        self.bind(bytes.len(), Some(bytes))
    }

    /// Bind a buffer object as the next argument.
    pub fn set_buffer(self, buffer: MemHandle) -> Self {
        self.bind_mem(buffer)
    }

    /// Bind a 2D image object as the next argument.
    pub fn set_image2d(self, image: MemHandle) -> Self {
        self.bind_mem(image)
    }

    /// Reserve `bytes` of work-group local memory as the next argument.
    pub fn set_local_memory(self, bytes: usize) -> Self {
        self.bind(bytes, None)
    }

    /// Record the outcome of a bind performed outside the launcher.
    ///
    /// Consumes the next argument index like any other bind.
    pub fn record(mut self, status: StatusCode) -> Self {
        let index = self.next_index;
        self.next_index += 1;
        if self.bound.is_ok() {
            self.bound = status.check().map_err(|status| BindFailure { status, index });
        }
        self
    }

    /// Index the next bind will use.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// `Ok` while every bind so far succeeded, otherwise the first failure.
    pub fn bind_status(&self) -> Result<()> {
        self.bound
            .map_err(|BindFailure { status, index }| Error::ArgumentBinding { status, index })
    }

    pub fn kernel_name(&self) -> &str {
        self.kernel.function_name()
    }

    /// Enqueue the kernel over `global` work-items in groups of `local`.
    ///
    /// Fails without any device call if a bind failed or the grid shape is
    /// invalid. On a successful enqueue the context's post-launch hook runs
    /// and its result is returned.
    pub fn launch(self, ctx: &dyn ExecutionContext, global: &NdRange, local: &NdRange) -> Result<()> {
        self.bind_status()?;
        validate_grid(global, local)?;

        let name = self.kernel.function_name();
        tracing::debug!("[CL] Launching {} with global work size: {} local work size: {}", name, global, local);

        let queue = ctx.command_queue();
        let handle = self.kernel.handle();
        match ctx.profiler() {
            Some(profiler) => {
                let span = perf_span!("enqueue_nd_range_kernel", kernel = name);
                let event = queue
                    .enqueue_nd_range_kernel(handle, global, local, true)
                    .map_err(|status| enqueue_error(status, name))?;
                record_launch(name, global.total(), span.elapsed_us());
                if let Some(event) = event {
                    profiler.kernel_enqueued(name, event);
                }
            }
            None => {
                queue
                    .enqueue_nd_range_kernel(handle, global, local, false)
                    .map_err(|status| enqueue_error(status, name))?;
            }
        }

        ctx.after_launch()
    }

    fn bind_mem(self, mem: MemHandle) -> Self {
        let bytes = mem.arg_bytes();
        self.bind(bytes.len(), Some(&bytes[..]))
    }

    fn bind(self, size: usize, value: Option<&[u8]>) -> Self {
        let status = if self.bound.is_ok() {
            self.kernel.set_arg(self.next_index, size, value)
        } else {
            StatusCode::SUCCESS
        };
        self.record(status)
    }
}

fn enqueue_error(status: StatusCode, kernel: &str) -> Error {
    Error::Enqueue {
        status,
        kernel: kernel.to_string(),
    }
}

/// Global needs 1-3 dimensions; local is either unspecified or matches it.
fn validate_grid(global: &NdRange, local: &NdRange) -> Result<()> {
    let global_ok = !global.is_empty();
    let local_ok = local.is_empty() || local.dims() == global.dims();
    if global_ok && local_ok {
        Ok(())
    } else {
        Err(Error::InvalidWorkGrid {
            global: *global,
            local: *local,
        })
    }
}
