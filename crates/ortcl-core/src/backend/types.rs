//! Handles and launch geometry shared with the device collaborators

use std::fmt;
use std::ptr::NonNull;

/// Handle to a compiled kernel object owned by the kernel cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelHandle(pub u64);

impl KernelHandle {
    pub const fn new(id: u64) -> Self {
        KernelHandle(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for KernelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kernel{}", self.0)
    }
}

/// Handle to a device memory object (buffer or image).
///
/// The object itself is owned by the tensor allocator; the dispatch core only
/// ever borrows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemHandle(pub u64);

impl MemHandle {
    pub const fn new(id: u64) -> Self {
        MemHandle(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }

    /// Bytes bound as a kernel argument for this object.
    pub const fn arg_bytes(self) -> [u8; 8] {
        self.0.to_ne_bytes()
    }
}

impl fmt::Display for MemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mem{}", self.0)
    }
}

/// Handle to an event produced by an enqueue, used for profiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(pub u64);

impl EventHandle {
    pub const fn new(id: u64) -> Self {
        EventHandle(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event{}", self.0)
    }
}

/// Work sizes for a kernel launch, one entry per dimension.
///
/// A range has zero to three dimensions. The empty range stands for "let the
/// device decide" when used as a local size and is invalid as a global size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NdRange {
    sizes: [usize; 3],
    dims: u8,
}

impl NdRange {
    /// Maximum number of dimensions a range can hold.
    pub const MAX_DIMS: usize = 3;

    /// Unspecified range.
    pub const fn empty() -> Self {
        Self { sizes: [0; 3], dims: 0 }
    }

    pub const fn new1(x: usize) -> Self {
        Self { sizes: [x, 0, 0], dims: 1 }
    }

    pub const fn new2(x: usize, y: usize) -> Self {
        Self { sizes: [x, y, 0], dims: 2 }
    }

    pub const fn new3(x: usize, y: usize, z: usize) -> Self {
        Self { sizes: [x, y, z], dims: 3 }
    }

    /// Build a range from a slice of up to three sizes.
    pub fn from_slice(sizes: &[usize]) -> Option<Self> {
        if sizes.len() > Self::MAX_DIMS {
            return None;
        }
        let mut range = Self::empty();
        range.sizes[..sizes.len()].copy_from_slice(sizes);
        range.dims = sizes.len() as u8;
        Some(range)
    }

    /// Number of dimensions (0 for the unspecified range).
    pub const fn dims(&self) -> usize {
        self.dims as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.dims == 0
    }

    /// Sizes for each populated dimension.
    pub fn as_slice(&self) -> &[usize] {
        &self.sizes[..self.dims()]
    }

    /// Product of all sizes; zero for the unspecified range.
    pub fn total(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        self.as_slice().iter().map(|&s| s as u64).product()
    }
}

impl fmt::Display for NdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, size) in self.as_slice().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{size}")?;
        }
        write!(f, "}}")
    }
}

impl From<usize> for NdRange {
    fn from(x: usize) -> Self {
        NdRange::new1(x)
    }
}

impl From<[usize; 2]> for NdRange {
    fn from([x, y]: [usize; 2]) -> Self {
        NdRange::new2(x, y)
    }
}

impl From<[usize; 3]> for NdRange {
    fn from([x, y, z]: [usize; 3]) -> Self {
        NdRange::new3(x, y, z)
    }
}

/// Host access requested for a mapping. Read and write are never combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapAccess {
    Read,
    Write,
}

impl MapAccess {
    pub const fn is_write(self) -> bool {
        matches!(self, MapAccess::Write)
    }
}

impl fmt::Display for MapAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapAccess::Read => f.write_str("read"),
            MapAccess::Write => f.write_str("write"),
        }
    }
}

/// Result of a successful image map as reported by the device.
///
/// Pitches are in bytes and describe the actual layout behind `ptr`; they
/// may be larger than the tightly packed row size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapInfo {
    pub ptr: NonNull<u8>,
    pub row_pitch: usize,
    pub slice_pitch: usize,
}
