//! Command queue and kernels of the host reference device

use super::memory::ImageStore;
use crate::backend::{CommandQueue, EventHandle, Kernel, KernelHandle, MapAccess, MapInfo, MemHandle, NdRange};
use crate::status::StatusCode;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::Arc;

/// Largest work-group the host device accepts.
pub const MAX_WORK_GROUP_SIZE: u64 = 1024;

/// Queue operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueOp {
    Enqueue,
    Map,
    Unmap,
    Flush,
    Finish,
}

/// Number of calls the queue received, successful or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    pub enqueues: usize,
    pub maps: usize,
    pub unmaps: usize,
    pub flushes: usize,
    pub finishes: usize,
}

/// A kernel enqueue accepted by the host queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRecord {
    pub kernel: KernelHandle,
    pub name: String,
    pub global: NdRange,
    pub local: NdRange,
    /// Bound argument bytes; local-memory arguments are empty.
    pub args: Vec<Vec<u8>>,
    /// Total bytes of work-group local memory requested.
    pub local_memory: usize,
    pub event: Option<EventHandle>,
}

#[derive(Debug, Clone)]
enum ArgValue {
    Bytes(Vec<u8>),
    Local(usize),
}

struct KernelSlots {
    name: String,
    /// Expected byte size per argument; 0 marks a local-memory argument.
    arg_sizes: Vec<usize>,
    args: Vec<Option<ArgValue>>,
}

impl KernelSlots {
    fn set_arg(&mut self, index: u32, size: usize, value: Option<&[u8]>) -> StatusCode {
        let Some(&expected) = self.arg_sizes.get(index as usize) else {
            return StatusCode::INVALID_ARG_INDEX;
        };
        let arg = match value {
            None if expected == 0 && size > 0 => ArgValue::Local(size),
            None => return StatusCode::INVALID_ARG_VALUE,
            Some(_) if expected == 0 => return StatusCode::INVALID_ARG_VALUE,
            Some(bytes) if size != expected || bytes.len() != size => return StatusCode::INVALID_ARG_SIZE,
            Some(bytes) => ArgValue::Bytes(bytes.to_vec()),
        };
        self.args[index as usize] = Some(arg);
        StatusCode::SUCCESS
    }

    /// Snapshot of all arguments with the local memory total, or `None` if
    /// one is unset.
    fn bound_args(&self) -> Option<(Vec<Vec<u8>>, usize)> {
        let mut local_memory = 0;
        let args = self
            .args
            .iter()
            .map(|arg| match arg.as_ref()? {
                ArgValue::Bytes(bytes) => Some(bytes.clone()),
                ArgValue::Local(size) => {
                    local_memory += size;
                    Some(Vec::new())
                }
            })
            .collect::<Option<Vec<_>>>()?;
        Some((args, local_memory))
    }
}

type KernelTable = Arc<Mutex<HashMap<u64, KernelSlots>>>;

#[derive(Default)]
struct QueueState {
    stats: QueueStats,
    launches: Vec<LaunchRecord>,
    failures: HashMap<QueueOp, StatusCode>,
    next_event_id: u64,
}

impl QueueState {
    fn take_failure(&mut self, op: QueueOp) -> StatusCode {
        self.failures.remove(&op).unwrap_or(StatusCode::SUCCESS)
    }
}

/// In-memory command queue.
///
/// Validates and records every command the way an OpenCL device would
/// report it, but does not execute kernel code. Intended for tests,
/// benchmarks and for staging data without a device.
pub struct HostQueue {
    images: Mutex<ImageStore>,
    kernels: KernelTable,
    state: Mutex<QueueState>,
    next_kernel_id: Mutex<u64>,
}

impl Default for HostQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl HostQueue {
    pub fn new() -> Self {
        Self {
            images: Mutex::new(ImageStore::new()),
            kernels: Arc::new(Mutex::new(HashMap::new())),
            state: Mutex::new(QueueState {
                next_event_id: 1,
                ..QueueState::default()
            }),
            next_kernel_id: Mutex::new(1),
        }
    }

    /// Allocate a zeroed `width × height` image with `pixel_size`-byte pixels.
    pub fn create_image2d(&self, width: usize, height: usize, pixel_size: usize) -> MemHandle {
        self.images.lock().create_image2d(width, height, pixel_size)
    }

    pub fn release_image(&self, image: MemHandle) -> StatusCode {
        self.images.lock().release(image)
    }

    pub fn contains_image(&self, image: MemHandle) -> bool {
        self.images.lock().contains(image)
    }

    /// Device row pitch of `image` in bytes.
    pub fn image_row_pitch(&self, image: MemHandle) -> Option<usize> {
        self.images.lock().row_pitch(image)
    }

    /// Live host mappings of `image`.
    pub fn mapping_count(&self, image: MemHandle) -> usize {
        self.images.lock().mapping_count(image)
    }

    /// Upload tightly packed pixel bytes.
    pub fn write_image(&self, image: MemHandle, bytes: &[u8]) -> StatusCode {
        self.images.lock().write_packed(image, bytes)
    }

    /// Download the image as tightly packed pixel bytes.
    pub fn read_image(&self, image: MemHandle) -> Result<Vec<u8>, StatusCode> {
        self.images.lock().read_packed(image)
    }

    /// Make the next call of `op` fail with `status`.
    pub fn fail_next(&self, op: QueueOp, status: StatusCode) {
        self.state.lock().failures.insert(op, status);
    }

    pub fn stats(&self) -> QueueStats {
        self.state.lock().stats
    }

    /// Accepted kernel enqueues, oldest first.
    pub fn launches(&self) -> Vec<LaunchRecord> {
        self.state.lock().launches.clone()
    }

    /// Forget recorded launches; counters are kept.
    pub fn clear_launches(&self) {
        self.state.lock().launches.clear();
    }

    fn register_kernel(&self, name: &str, arg_sizes: &[usize]) -> KernelHandle {
        let mut next = self.next_kernel_id.lock();
        let handle = KernelHandle::new(*next);
        *next += 1;
        self.kernels.lock().insert(
            handle.id(),
            KernelSlots {
                name: name.to_string(),
                arg_sizes: arg_sizes.to_vec(),
                args: vec![None; arg_sizes.len()],
            },
        );
        handle
    }
}

/// Device-side work size rules.
fn check_work_sizes(global: &NdRange, local: &NdRange) -> Result<(), StatusCode> {
    if global.is_empty() || (!local.is_empty() && local.dims() != global.dims()) {
        return Err(StatusCode::INVALID_WORK_DIMENSION);
    }
    if global.as_slice().contains(&0) {
        return Err(StatusCode::INVALID_GLOBAL_WORK_SIZE);
    }
    if local.is_empty() {
        return Ok(());
    }
    let divides = global
        .as_slice()
        .iter()
        .zip(local.as_slice())
        .all(|(&g, &l)| l > 0 && g % l == 0);
    if !divides || local.total() > MAX_WORK_GROUP_SIZE {
        return Err(StatusCode::INVALID_WORK_GROUP_SIZE);
    }
    Ok(())
}

impl CommandQueue for HostQueue {
    fn enqueue_nd_range_kernel(
        &self,
        kernel: KernelHandle,
        global: &NdRange,
        local: &NdRange,
        want_event: bool,
    ) -> Result<Option<EventHandle>, StatusCode> {
        let mut state = self.state.lock();
        state.stats.enqueues += 1;
        state.take_failure(QueueOp::Enqueue).check()?;

        let kernels = self.kernels.lock();
        let slots = kernels.get(&kernel.id()).ok_or(StatusCode::INVALID_KERNEL)?;
        let (args, local_memory) = slots.bound_args().ok_or(StatusCode::INVALID_KERNEL_ARGS)?;
        check_work_sizes(global, local)?;

        let event = want_event.then(|| {
            let event = EventHandle::new(state.next_event_id);
            state.next_event_id += 1;
            event
        });
        state.launches.push(LaunchRecord {
            kernel,
            name: slots.name.clone(),
            global: *global,
            local: *local,
            args,
            local_memory,
            event,
        });
        Ok(event)
    }

    fn enqueue_map_image(
        &self,
        image: MemHandle,
        blocking: bool,
        access: MapAccess,
        origin: [usize; 3],
        region: [usize; 3],
    ) -> Result<MapInfo, StatusCode> {
        {
            let mut state = self.state.lock();
            state.stats.maps += 1;
            state.take_failure(QueueOp::Map).check()?;
        }
        // host memory is always coherent, so only blocking maps are supported
        if !blocking {
            return Err(StatusCode::INVALID_OPERATION);
        }
        self.images.lock().map(image, access, origin, region)
    }

    fn enqueue_unmap_mem_object(&self, image: MemHandle, ptr: NonNull<u8>) -> StatusCode {
        {
            let mut state = self.state.lock();
            state.stats.unmaps += 1;
            let injected = state.take_failure(QueueOp::Unmap);
            if !injected.is_success() {
                return injected;
            }
        }
        self.images.lock().unmap(image, ptr)
    }

    fn flush(&self) -> StatusCode {
        let mut state = self.state.lock();
        state.stats.flushes += 1;
        state.take_failure(QueueOp::Flush)
    }

    fn finish(&self) -> StatusCode {
        let mut state = self.state.lock();
        state.stats.finishes += 1;
        state.take_failure(QueueOp::Finish)
    }
}

/// Kernel registered with a [`HostQueue`].
///
/// Arguments are checked against the declared sizes; a size of 0 declares a
/// local-memory argument.
pub struct HostKernel {
    handle: KernelHandle,
    name: String,
    kernels: KernelTable,
}

impl HostKernel {
    pub fn new(queue: &HostQueue, name: &str, arg_sizes: &[usize]) -> Self {
        Self {
            handle: queue.register_kernel(name, arg_sizes),
            name: name.to_string(),
            kernels: Arc::clone(&queue.kernels),
        }
    }
}

impl Kernel for HostKernel {
    fn handle(&self) -> KernelHandle {
        self.handle
    }

    fn function_name(&self) -> &str {
        &self.name
    }

    fn set_arg(&self, index: u32, size: usize, value: Option<&[u8]>) -> StatusCode {
        match self.kernels.lock().get_mut(&self.handle.id()) {
            Some(slots) => slots.set_arg(index, size, value),
            None => StatusCode::INVALID_KERNEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_arg_checks_index_and_size() {
        let queue = HostQueue::new();
        let kernel = HostKernel::new(&queue, "k", &[4, 0]);

        assert_eq!(kernel.set_arg(0, 4, Some(&[0; 4])), StatusCode::SUCCESS);
        assert_eq!(kernel.set_arg(0, 8, Some(&[0; 8])), StatusCode::INVALID_ARG_SIZE);
        assert_eq!(kernel.set_arg(1, 128, None), StatusCode::SUCCESS);
        assert_eq!(kernel.set_arg(1, 4, Some(&[0; 4])), StatusCode::INVALID_ARG_VALUE);
        assert_eq!(kernel.set_arg(0, 4, None), StatusCode::INVALID_ARG_VALUE);
        assert_eq!(kernel.set_arg(2, 4, Some(&[0; 4])), StatusCode::INVALID_ARG_INDEX);
    }

    #[test]
    fn test_enqueue_requires_all_args() {
        let queue = HostQueue::new();
        let kernel = HostKernel::new(&queue, "k", &[4, 4]);
        kernel.set_arg(0, 4, Some(&[1; 4]));

        let result = queue.enqueue_nd_range_kernel(kernel.handle(), &NdRange::new1(4), &NdRange::empty(), false);
        assert_eq!(result, Err(StatusCode::INVALID_KERNEL_ARGS));

        kernel.set_arg(1, 4, Some(&[2; 4]));
        let result = queue.enqueue_nd_range_kernel(kernel.handle(), &NdRange::new1(4), &NdRange::empty(), false);
        assert_eq!(result, Ok(None));

        let launches = queue.launches();
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].name, "k");
        assert_eq!(launches[0].args, vec![vec![1; 4], vec![2; 4]]);
        assert_eq!(queue.stats().enqueues, 2);
    }

    #[test]
    fn test_enqueue_checks_work_sizes() {
        let queue = HostQueue::new();
        let kernel = HostKernel::new(&queue, "k", &[]);
        let handle = kernel.handle();

        let cases = [
            (NdRange::empty(), NdRange::empty(), StatusCode::INVALID_WORK_DIMENSION),
            (NdRange::new2(8, 8), NdRange::new1(8), StatusCode::INVALID_WORK_DIMENSION),
            (NdRange::new1(0), NdRange::empty(), StatusCode::INVALID_GLOBAL_WORK_SIZE),
            (NdRange::new1(10), NdRange::new1(3), StatusCode::INVALID_WORK_GROUP_SIZE),
            (NdRange::new1(8), NdRange::new1(0), StatusCode::INVALID_WORK_GROUP_SIZE),
            (NdRange::new2(2048, 2048), NdRange::new2(64, 64), StatusCode::INVALID_WORK_GROUP_SIZE),
        ];
        for (global, local, expected) in cases {
            assert_eq!(
                queue.enqueue_nd_range_kernel(handle, &global, &local, false),
                Err(expected),
                "global {global} local {local}"
            );
        }
        assert!(queue.launches().is_empty());

        let ok = queue.enqueue_nd_range_kernel(handle, &NdRange::new2(64, 64), &NdRange::new2(8, 8), true);
        assert_eq!(ok, Ok(Some(EventHandle::new(1))));
    }

    #[test]
    fn test_unknown_kernel_is_rejected() {
        let queue = HostQueue::new();
        let result = queue.enqueue_nd_range_kernel(KernelHandle::new(77), &NdRange::new1(1), &NdRange::empty(), false);
        assert_eq!(result, Err(StatusCode::INVALID_KERNEL));
    }

    #[test]
    fn test_injected_failures_fire_once() {
        let queue = HostQueue::new();
        queue.fail_next(QueueOp::Finish, StatusCode::OUT_OF_RESOURCES);
        assert_eq!(queue.finish(), StatusCode::OUT_OF_RESOURCES);
        assert_eq!(queue.finish(), StatusCode::SUCCESS);

        let image = queue.create_image2d(2, 2, 4);
        queue.fail_next(QueueOp::Map, StatusCode::MAP_FAILURE);
        assert_eq!(
            queue.enqueue_map_image(image, true, MapAccess::Read, [0, 0, 0], [2, 2, 1]),
            Err(StatusCode::MAP_FAILURE)
        );
        assert_eq!(queue.mapping_count(image), 0);
        assert_eq!(queue.stats().maps, 1);
        assert_eq!(queue.stats().finishes, 2);
    }

    #[test]
    fn test_non_blocking_map_is_unsupported() {
        let queue = HostQueue::new();
        let image = queue.create_image2d(2, 2, 4);
        assert_eq!(
            queue.enqueue_map_image(image, false, MapAccess::Read, [0, 0, 0], [2, 2, 1]),
            Err(StatusCode::INVALID_OPERATION)
        );
    }
}
