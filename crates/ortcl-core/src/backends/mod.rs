//! Device implementations of the collaborator traits
//!
//! - `host` - Host-memory reference device used by tests and benchmarks

pub mod host;

pub use host::{HostContext, HostKernel, HostQueue};
