//! Image storage for the host reference device
//!
//! Images live in host memory with rows padded to [`ROW_ALIGNMENT`] bytes,
//! so the reported row pitch differs from the packed row size the way it
//! does on real devices.

use crate::backend::{MapAccess, MapInfo, MemHandle};
use crate::status::StatusCode;
use std::collections::HashMap;
use std::ptr::{self, NonNull};
use std::slice;

/// Row pitch alignment in bytes.
pub const ROW_ALIGNMENT: usize = 64;

/// One 2D image.
///
/// The pixel storage is one heap allocation owned through a raw base
/// pointer. Mapped host pointers are derived from that base, so creating a
/// new mapping never re-borrows memory an earlier mapping still points into.
struct HostImage {
    width: usize,
    height: usize,
    pixel_size: usize,
    row_pitch: usize,
    /// u64 words keep every pixel type up to 8-byte alignment valid.
    base: NonNull<u64>,
    words: usize,
    /// Host pointers of live mappings with their access mode.
    mappings: Vec<(usize, MapAccess)>,
}

// SAFETY: `base` is a uniquely owned allocation, released only in `Drop`.
unsafe impl Send for HostImage {}

impl HostImage {
    fn new(width: usize, height: usize, pixel_size: usize) -> Self {
        let row_pitch = (width * pixel_size).div_ceil(ROW_ALIGNMENT) * ROW_ALIGNMENT;
        let words = (row_pitch * height).div_ceil(8);
        let storage: Box<[u64]> = vec![0u64; words].into_boxed_slice();
        Self {
            width,
            height,
            pixel_size,
            row_pitch,
            base: NonNull::from(Box::leak(storage)).cast::<u64>(),
            words,
            mappings: Vec::new(),
        }
    }

    fn base_ptr(&self) -> *mut u8 {
        self.base.as_ptr().cast::<u8>()
    }

    fn len_bytes(&self) -> usize {
        self.words * 8
    }

    /// Whole storage as bytes. Only sound while no mapping is live.
    fn bytes(&self) -> &[u8] {
        debug_assert!(self.mappings.is_empty());
        // SAFETY: `base` owns `len_bytes` initialised bytes and no host
        // pointer into them is outstanding.
        unsafe { slice::from_raw_parts(self.base_ptr(), self.len_bytes()) }
    }

    /// Mutable storage. Only sound while no mapping is live.
    fn bytes_mut(&mut self) -> &mut [u8] {
        debug_assert!(self.mappings.is_empty());
        // SAFETY: as in `bytes`; `&mut self` excludes other views.
        unsafe { slice::from_raw_parts_mut(self.base_ptr(), self.len_bytes()) }
    }

    fn packed_row(&self) -> usize {
        self.width * self.pixel_size
    }
}

impl Drop for HostImage {
    fn drop(&mut self) {
        // SAFETY: `base` and `words` come from the boxed slice leaked in `new`.
        unsafe {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(self.base.as_ptr(), self.words)));
        }
    }
}

/// All images of one host queue.
pub(crate) struct ImageStore {
    images: HashMap<u64, HostImage>,
    next_image_id: u64,
}

impl ImageStore {
    pub(crate) fn new() -> Self {
        Self {
            images: HashMap::new(),
            next_image_id: 1,
        }
    }

    pub(crate) fn create_image2d(&mut self, width: usize, height: usize, pixel_size: usize) -> MemHandle {
        let handle = MemHandle::new(self.next_image_id);
        self.next_image_id += 1;
        self.images.insert(handle.id(), HostImage::new(width, height, pixel_size));
        handle
    }

    /// Release an image. Mapped images cannot be released.
    pub(crate) fn release(&mut self, handle: MemHandle) -> StatusCode {
        match self.images.get(&handle.id()) {
            None => StatusCode::INVALID_MEM_OBJECT,
            Some(image) if !image.mappings.is_empty() => StatusCode::INVALID_OPERATION,
            Some(_) => {
                self.images.remove(&handle.id());
                StatusCode::SUCCESS
            }
        }
    }

    pub(crate) fn contains(&self, handle: MemHandle) -> bool {
        self.images.contains_key(&handle.id())
    }

    /// Number of live mappings of `handle`.
    pub(crate) fn mapping_count(&self, handle: MemHandle) -> usize {
        self.images.get(&handle.id()).map_or(0, |image| image.mappings.len())
    }

    pub(crate) fn row_pitch(&self, handle: MemHandle) -> Option<usize> {
        self.images.get(&handle.id()).map(|image| image.row_pitch)
    }

    pub(crate) fn map(
        &mut self,
        handle: MemHandle,
        access: MapAccess,
        origin: [usize; 3],
        region: [usize; 3],
    ) -> Result<MapInfo, StatusCode> {
        let image = self
            .images
            .get_mut(&handle.id())
            .ok_or(StatusCode::INVALID_MEM_OBJECT)?;

        let in_bounds = origin[2] == 0
            && region[2] == 1
            && region[0] > 0
            && region[1] > 0
            && origin[0] + region[0] <= image.width
            && origin[1] + region[1] <= image.height;
        if !in_bounds {
            return Err(StatusCode::INVALID_VALUE);
        }

        // a write mapping never overlaps another mapping
        let conflicting = match access {
            MapAccess::Write => !image.mappings.is_empty(),
            MapAccess::Read => image.mappings.iter().any(|(_, a)| a.is_write()),
        };
        if conflicting {
            return Err(StatusCode::INVALID_OPERATION);
        }

        let offset = origin[1] * image.row_pitch + origin[0] * image.pixel_size;
        // SAFETY: `offset` is inside the allocation by the bounds check above.
        let ptr = NonNull::new(unsafe { image.base_ptr().add(offset) }).ok_or(StatusCode::MAP_FAILURE)?;
        image.mappings.push((ptr.as_ptr() as usize, access));

        Ok(MapInfo {
            ptr,
            row_pitch: image.row_pitch,
            slice_pitch: 0,
        })
    }

    pub(crate) fn unmap(&mut self, handle: MemHandle, ptr: NonNull<u8>) -> StatusCode {
        let Some(image) = self.images.get_mut(&handle.id()) else {
            return StatusCode::INVALID_MEM_OBJECT;
        };
        let addr = ptr.as_ptr() as usize;
        match image.mappings.iter().position(|(p, _)| *p == addr) {
            Some(index) => {
                image.mappings.swap_remove(index);
                StatusCode::SUCCESS
            }
            None => StatusCode::INVALID_VALUE,
        }
    }

    /// Copy tightly packed pixel bytes into the image. Refused while mapped.
    pub(crate) fn write_packed(&mut self, handle: MemHandle, bytes: &[u8]) -> StatusCode {
        let Some(image) = self.images.get_mut(&handle.id()) else {
            return StatusCode::INVALID_MEM_OBJECT;
        };
        if !image.mappings.is_empty() {
            return StatusCode::INVALID_OPERATION;
        }
        let packed = image.packed_row();
        if bytes.len() != packed * image.height {
            return StatusCode::INVALID_VALUE;
        }
        let pitch = image.row_pitch;
        let data = image.bytes_mut();
        for (y, src) in bytes.chunks_exact(packed).enumerate() {
            data[y * pitch..y * pitch + packed].copy_from_slice(src);
        }
        StatusCode::SUCCESS
    }

    /// Tightly packed copy of the image's pixel bytes. Refused while mapped.
    pub(crate) fn read_packed(&self, handle: MemHandle) -> Result<Vec<u8>, StatusCode> {
        let image = self.images.get(&handle.id()).ok_or(StatusCode::INVALID_MEM_OBJECT)?;
        if !image.mappings.is_empty() {
            return Err(StatusCode::INVALID_OPERATION);
        }
        let packed = image.packed_row();
        let data = image.bytes();
        let mut out = Vec::with_capacity(packed * image.height);
        for y in 0..image.height {
            let start = y * image.row_pitch;
            out.extend_from_slice(&data[start..start + packed]);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_padded_to_alignment() {
        let mut store = ImageStore::new();
        let small = store.create_image2d(3, 2, 4);
        let exact = store.create_image2d(16, 2, 4);
        let wide = store.create_image2d(17, 2, 4);
        assert_eq!(store.row_pitch(small), Some(64));
        assert_eq!(store.row_pitch(exact), Some(64));
        assert_eq!(store.row_pitch(wide), Some(128));
        assert_eq!(store.row_pitch(MemHandle::new(99)), None);
    }

    #[test]
    fn test_map_and_unmap_bookkeeping() {
        let mut store = ImageStore::new();
        let image = store.create_image2d(4, 4, 4);

        let info = store.map(image, MapAccess::Read, [0, 0, 0], [4, 4, 1]).unwrap();
        assert_eq!(info.row_pitch, 64);
        assert_eq!(store.mapping_count(image), 1);

        // second read mapping is fine, a write mapping is not
        let second = store.map(image, MapAccess::Read, [0, 0, 0], [2, 2, 1]).unwrap();
        assert_eq!(
            store.map(image, MapAccess::Write, [0, 0, 0], [4, 4, 1]),
            Err(StatusCode::INVALID_OPERATION)
        );

        assert_eq!(store.unmap(image, info.ptr), StatusCode::SUCCESS);
        assert_eq!(store.unmap(image, second.ptr), StatusCode::SUCCESS);
        assert_eq!(store.unmap(image, info.ptr), StatusCode::INVALID_VALUE);
        assert_eq!(store.mapping_count(image), 0);
    }

    #[test]
    fn test_map_rejects_bad_regions_and_handles() {
        let mut store = ImageStore::new();
        let image = store.create_image2d(4, 4, 4);
        assert_eq!(
            store.map(image, MapAccess::Read, [0, 0, 0], [5, 4, 1]),
            Err(StatusCode::INVALID_VALUE)
        );
        assert_eq!(
            store.map(image, MapAccess::Read, [0, 0, 0], [4, 4, 2]),
            Err(StatusCode::INVALID_VALUE)
        );
        assert_eq!(
            store.map(MemHandle::new(42), MapAccess::Read, [0, 0, 0], [1, 1, 1]),
            Err(StatusCode::INVALID_MEM_OBJECT)
        );
    }

    #[test]
    fn test_release_refuses_mapped_images() {
        let mut store = ImageStore::new();
        let image = store.create_image2d(2, 2, 4);
        let info = store.map(image, MapAccess::Write, [0, 0, 0], [2, 2, 1]).unwrap();
        assert_eq!(store.release(image), StatusCode::INVALID_OPERATION);
        assert_eq!(store.unmap(image, info.ptr), StatusCode::SUCCESS);
        assert_eq!(store.release(image), StatusCode::SUCCESS);
        assert!(!store.contains(image));
        assert_eq!(store.release(image), StatusCode::INVALID_MEM_OBJECT);
    }

    #[test]
    fn test_packed_copies_skip_padding() {
        let mut store = ImageStore::new();
        let image = store.create_image2d(2, 3, 4);
        let pixels: Vec<f32> = (0..6).map(|i| i as f32).collect();
        assert_eq!(store.write_packed(image, bytemuck::cast_slice(&pixels)), StatusCode::SUCCESS);

        let back = store.read_packed(image).unwrap();
        assert_eq!(bytemuck::pod_collect_to_vec::<u8, f32>(&back), pixels);
        assert_eq!(store.write_packed(image, &[0u8; 4]), StatusCode::INVALID_VALUE);
    }

    #[test]
    fn test_packed_copies_refused_while_mapped() {
        let mut store = ImageStore::new();
        let image = store.create_image2d(2, 2, 4);
        let info = store.map(image, MapAccess::Read, [0, 0, 0], [2, 2, 1]).unwrap();

        assert_eq!(store.write_packed(image, &[1u8; 16]), StatusCode::INVALID_OPERATION);
        assert_eq!(store.read_packed(image), Err(StatusCode::INVALID_OPERATION));
        // SAFETY: the mapping is live and covers at least one byte.
        assert_eq!(unsafe { *info.ptr.as_ptr() }, 0);

        assert_eq!(store.unmap(image, info.ptr), StatusCode::SUCCESS);
        assert_eq!(store.write_packed(image, &[1u8; 16]), StatusCode::SUCCESS);
    }

    #[test]
    fn test_later_mappings_keep_earlier_pointers_valid() {
        let mut store = ImageStore::new();
        let image = store.create_image2d(4, 1, 4);
        assert_eq!(store.write_packed(image, &[5u8; 16]), StatusCode::SUCCESS);

        let first = store.map(image, MapAccess::Read, [0, 0, 0], [4, 1, 1]).unwrap();
        let second = store.map(image, MapAccess::Read, [2, 0, 0], [2, 1, 1]).unwrap();
        // other images allocated meanwhile must not move this one
        for _ in 0..32 {
            store.create_image2d(8, 8, 4);
        }

        // SAFETY: both mappings are live and point inside the image.
        unsafe {
            assert_eq!(*first.ptr.as_ptr(), 5);
            assert_eq!(second.ptr.as_ptr().offset_from(first.ptr.as_ptr()), 8);
            assert_eq!(*second.ptr.as_ptr(), 5);
        }
        assert_eq!(store.unmap(image, first.ptr), StatusCode::SUCCESS);
        assert_eq!(store.unmap(image, second.ptr), StatusCode::SUCCESS);
    }
}
