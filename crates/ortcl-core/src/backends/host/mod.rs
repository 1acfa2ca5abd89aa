//! Host reference device
//!
//! An [`ExecutionContext`] backed entirely by host memory. It implements the
//! collaborator traits with the same status codes an OpenCL runtime reports,
//! so the launcher and the image mapper can be exercised without a GPU.
//!
//! # Architecture
//!
//! ```text
//! HostContext
//! ├── HostQueue     - Launch log, fault injection, call counters
//! │   └── ImageStore - Pitched 2D images + live mappings
//! ├── ContextConfig - Flush/finish after launch, profiling
//! └── EventLog      - Profiled launch events
//! ```
//!
//! Kernels are validated and recorded but their code is never executed.

mod memory;
mod queue;

pub use memory::ROW_ALIGNMENT;
pub use queue::{HostKernel, HostQueue, LaunchRecord, QueueOp, QueueStats, MAX_WORK_GROUP_SIZE};

use crate::backend::{CommandQueue, EventHandle, ExecutionContext, LaunchProfiler};
use crate::config::ContextConfig;
use crate::error::{Error, Result};
use parking_lot::Mutex;

/// Profiler that keeps every launch event in memory.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<(String, EventHandle)>>,
}

impl EventLog {
    /// Recorded `(kernel name, event)` pairs, oldest first.
    pub fn events(&self) -> Vec<(String, EventHandle)> {
        self.events.lock().clone()
    }
}

impl LaunchProfiler for EventLog {
    fn kernel_enqueued(&self, kernel_name: &str, event: EventHandle) {
        self.events.lock().push((kernel_name.to_string(), event));
    }
}

/// Execution context of the host reference device.
pub struct HostContext {
    queue: HostQueue,
    config: ContextConfig,
    events: EventLog,
}

impl Default for HostContext {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}

impl HostContext {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            queue: HostQueue::new(),
            config,
            events: EventLog::default(),
        }
    }

    pub fn queue(&self) -> &HostQueue {
        &self.queue
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn event_log(&self) -> &EventLog {
        &self.events
    }
}

impl ExecutionContext for HostContext {
    fn command_queue(&self) -> &dyn CommandQueue {
        &self.queue
    }

    fn after_launch(&self) -> Result<()> {
        if self.config.flush_after_launch {
            self.queue.flush().check().map_err(|s| Error::device(s, "flush"))?;
        }
        if self.config.sync_after_launch {
            self.queue.finish().check().map_err(|s| Error::device(s, "finish"))?;
        }
        Ok(())
    }

    fn profiler(&self) -> Option<&dyn LaunchProfiler> {
        self.config.profiling.then_some(&self.events as &dyn LaunchProfiler)
    }
}
