//! OpenCL dispatch core
//!
//! This crate provides the small layer between an execution provider and
//! an OpenCL command queue:
//! - **Status codes**: Name and classify every OpenCL 1.2 status code
//! - **Kernel launcher**: Bind arguments and enqueue kernels, keeping the
//!   first bind failure until launch
//! - **Mapped images**: Scoped host access to 2D images that always unmaps
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Execution provider                      │
//! │        (kernel cache · tensor allocator · queue)         │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │  ExecutionContext / Kernel
//!                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │     KernelLauncher          map_image2d → MappedImage    │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │  CommandQueue
//!         ┌─────────────┴─────────────┐
//!         ▼                           ▼
//!   ┌───────────┐              ┌─────────────┐
//!   │  OpenCL   │              │    Host     │
//!   │  runtime  │              │  reference  │
//!   └───────────┘              └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use ortcl_core::backends::host::{HostContext, HostKernel};
//! use ortcl_core::{map_image2d, ContextConfig, KernelLauncher, MapAccess, NdRange};
//!
//! # fn main() -> ortcl_core::Result<()> {
//! let ctx = HostContext::new(ContextConfig::default().with_sync_after_launch(true));
//! let input = ctx.queue().create_image2d(8, 8, 16);
//! let output = ctx.queue().create_image2d(8, 8, 16);
//!
//! // Stage input pixels
//! let mut mapped = map_image2d(&ctx, input, 8, 8, MapAccess::Write)?;
//! mapped.copy_from_slice(&vec![[1.0f32; 4]; 64])?;
//! mapped.unmap()?;
//!
//! // Launch
//! let kernel = HostKernel::new(ctx.queue(), "copy_image", &[8, 8]);
//! KernelLauncher::new(&kernel)
//!     .set_image2d(input)
//!     .set_image2d(output)
//!     .launch(&ctx, &NdRange::new2(8, 8), &NdRange::empty())?;
//!
//! assert_eq!(ctx.queue().launches()[0].name, "copy_image");
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod launcher;
pub mod mapped;
pub mod status;

// Re-export public API
pub use backend::{
    CommandQueue, EventHandle, ExecutionContext, Kernel, KernelHandle, LaunchProfiler, MapAccess, MapInfo, MemHandle,
    NdRange,
};
pub use config::ContextConfig;
pub use error::{Error, Result, Stage};
pub use launcher::KernelLauncher;
pub use mapped::{map_image2d, MappedImage};
pub use status::{error_string, ErrorCategory, StatusCode};
