//! Collaborator traits and shared handle types

mod traits;
mod types;

pub use traits::{CommandQueue, ExecutionContext, Kernel, LaunchProfiler};
pub use types::{EventHandle, KernelHandle, MapAccess, MapInfo, MemHandle, NdRange};
