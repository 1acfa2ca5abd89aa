//! Scoped host access to device images
//!
//! [`map_image2d`] performs a blocking map of a `width × height` region at
//! the image origin and returns a [`MappedImage`] guard. The guard is the
//! only way to reach the host pointer, borrows the command queue, and issues
//! exactly one unmap when it is dropped or explicitly released with
//! [`MappedImage::unmap`].
//!
//! Rows are addressed through the row pitch the device reported for the
//! mapping, which can be larger than the packed row size.
//!
//! ```rust
//! use ortcl_core::backends::host::HostContext;
//! use ortcl_core::{map_image2d, ContextConfig, MapAccess};
//!
//! # fn main() -> ortcl_core::Result<()> {
//! let ctx = HostContext::new(ContextConfig::default());
//! let image = ctx.queue().create_image2d(4, 2, 4);
//!
//! {
//!     let mut mapped = map_image2d(&ctx, image, 4, 2, MapAccess::Write)?;
//!     mapped.row_mut::<f32>(1)?.copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
//! } // unmapped here
//!
//! let mapped = map_image2d(&ctx, image, 4, 2, MapAccess::Read)?;
//! assert_eq!(mapped.row::<f32>(1)?, &[1.0, 2.0, 3.0, 4.0]);
//! mapped.unmap()?;
//! # Ok(())
//! # }
//! ```

use crate::backend::{CommandQueue, ExecutionContext, MapAccess, MemHandle};
use crate::error::{Error, Result};
use crate::status::StatusCode;
use ortcl_tracing::{perf_event, perf_span};
use ortcl_tracing::performance::record_map;
use std::mem;
use std::ptr::NonNull;
use std::slice;

/// Blocking map of the region `(0,0,0)..(width,height,1)` of a 2D image.
///
/// Fails on an empty region or when the device rejects the map; no host
/// pointer is handed out in either case.
pub fn map_image2d<'q>(
    ctx: &'q dyn ExecutionContext,
    image: MemHandle,
    width: usize,
    height: usize,
    access: MapAccess,
) -> Result<MappedImage<'q>> {
    MappedImage::map(ctx.command_queue(), image, width, height, access)
}

/// Host view of a mapped image region.
///
/// Move-only; dropping it unmaps the region. The view cannot outlive the
/// queue it was mapped on.
pub struct MappedImage<'q> {
    queue: &'q dyn CommandQueue,
    image: MemHandle,
    ptr: NonNull<u8>,
    width: usize,
    height: usize,
    row_pitch: usize,
    slice_pitch: usize,
    access: MapAccess,
    released: bool,
}

impl<'q> MappedImage<'q> {
    /// Map `image` on `queue`. See [`map_image2d`].
    pub fn map(
        queue: &'q dyn CommandQueue,
        image: MemHandle,
        width: usize,
        height: usize,
        access: MapAccess,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidRegion { width, height });
        }

        let origin = [0, 0, 0];
        let region = [width, height, 1];

        let span = perf_span!("enqueue_map_image", image = image.id());
        let info = queue
            .enqueue_map_image(image, true, access, origin, region)
            .map_err(|status| Error::Map {
                status,
                image,
                width,
                height,
                access,
            })?;
        record_map(width, height, info.row_pitch, access.is_write(), span.elapsed_us());

        tracing::debug!(
            %image,
            width,
            height,
            row_pitch = info.row_pitch,
            slice_pitch = info.slice_pitch,
            %access,
            "mapped image"
        );

        Ok(Self {
            queue,
            image,
            ptr: info.ptr,
            width,
            height,
            row_pitch: info.row_pitch,
            slice_pitch: info.slice_pitch,
            access,
            released: false,
        })
    }

    pub fn image(&self) -> MemHandle {
        self.image
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn access(&self) -> MapAccess {
        self.access
    }

    /// Row pitch in bytes as reported by the device.
    pub fn row_pitch(&self) -> usize {
        self.row_pitch
    }

    /// Slice pitch in bytes as reported by the device (0 for 2D images).
    pub fn slice_pitch(&self) -> usize {
        self.slice_pitch
    }

    /// Raw host pointer to the first mapped byte.
    ///
    /// Valid only while `self` is alive.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Pixels of row `y`, viewed as `T` (e.g. `f32` or `[f32; 4]`).
    pub fn row<T: bytemuck::Pod>(&self, y: usize) -> Result<&[T]> {
        let (offset, len) = self.row_span::<T>(y)?;
        // SAFETY: the device guarantees `len` readable bytes at `offset`
        // until unmap, and unmap needs `self` by value or by drop.
        let bytes = unsafe { slice::from_raw_parts(self.ptr.as_ptr().add(offset), len) };
        bytemuck::try_cast_slice(bytes).map_err(|e| Error::layout(e.to_string()))
    }

    /// Mutable pixels of row `y`. Only available on write mappings.
    pub fn row_mut<T: bytemuck::Pod>(&mut self, y: usize) -> Result<&mut [T]> {
        if !self.access.is_write() {
            return Err(Error::ReadOnlyMapping { image: self.image });
        }
        let (offset, len) = self.row_span::<T>(y)?;
        // SAFETY: as in `row`; `&mut self` rules out other views.
        let bytes = unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr().add(offset), len) };
        bytemuck::try_cast_slice_mut(bytes).map_err(|e| Error::layout(e.to_string()))
    }

    /// Whole mapped span for pixels of type `T`: every padded row but the
    /// last, plus the packed bytes of the last row.
    pub fn as_bytes<T: bytemuck::Pod>(&self) -> Result<&[u8]> {
        let len = self.span_len::<T>()?;
        // SAFETY: the span ends inside the last mapped row, see `row`.
        Ok(unsafe { slice::from_raw_parts(self.ptr.as_ptr(), len) })
    }

    /// Mutable [`as_bytes`](Self::as_bytes). Only available on write
    /// mappings.
    pub fn as_bytes_mut<T: bytemuck::Pod>(&mut self) -> Result<&mut [u8]> {
        if !self.access.is_write() {
            return Err(Error::ReadOnlyMapping { image: self.image });
        }
        let len = self.span_len::<T>()?;
        // SAFETY: as in `as_bytes`; `&mut self` rules out other views.
        Ok(unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), len) })
    }

    /// Copy the region into a tightly packed vector of `width * height`
    /// pixels.
    pub fn to_vec<T: bytemuck::Pod>(&self) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            out.extend_from_slice(self.row::<T>(y)?);
        }
        Ok(out)
    }

    /// Fill the region from tightly packed pixels.
    pub fn copy_from_slice<T: bytemuck::Pod>(&mut self, pixels: &[T]) -> Result<()> {
        let expected = self.width * self.height;
        if pixels.len() != expected {
            return Err(Error::layout(format!(
                "expected {expected} pixels, got {}",
                pixels.len()
            )));
        }
        let width = self.width;
        for (y, src) in pixels.chunks_exact(width).enumerate() {
            self.row_mut::<T>(y)?.copy_from_slice(src);
        }
        Ok(())
    }

    /// Unmap now and report the device status.
    pub fn unmap(mut self) -> Result<()> {
        self.release().map_err(|status| Error::Unmap {
            status,
            image: self.image,
        })
    }

    /// Issue the one unmap this guard owns.
    fn release(&mut self) -> std::result::Result<(), StatusCode> {
        self.released = true;
        self.queue.enqueue_unmap_mem_object(self.image, self.ptr).check()?;
        perf_event!("unmap_image", image = self.image.id(), access = self.access.is_write());
        Ok(())
    }

    /// `(height - 1) * pitch + width * size_of::<T>()`.
    fn span_len<T>(&self) -> Result<usize> {
        let (offset, len) = self.row_span::<T>(self.height - 1)?;
        Ok(offset + len)
    }

    /// Byte offset and length of row `y` holding `width` pixels of `T`.
    fn row_span<T>(&self, y: usize) -> Result<(usize, usize)> {
        if y >= self.height {
            return Err(Error::RowOutOfRange {
                row: y,
                height: self.height,
            });
        }
        let packed = self.width * mem::size_of::<T>();
        let pitch = if self.row_pitch == 0 { packed } else { self.row_pitch };
        if packed > pitch {
            return Err(Error::layout(format!(
                "{} pixels of {} bytes exceed row pitch {pitch}",
                self.width,
                mem::size_of::<T>()
            )));
        }
        Ok((y * pitch, packed))
    }
}

impl Drop for MappedImage<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(status) = self.release() {
            tracing::error!(image = %self.image, %status, "failed to unmap image");
        }
    }
}

impl std::fmt::Debug for MappedImage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedImage")
            .field("image", &self.image)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("row_pitch", &self.row_pitch)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}
