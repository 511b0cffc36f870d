use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::element::{DType, Element};
use crate::error::{DeviceError, Result};

/// Backing allocation shared between the host handle and device views.
struct Allocation<T> {
    cells: Box<[UnsafeCell<T>]>,
    /// Set while a `DeviceSliceMut` of this allocation is alive.
    writer: AtomicBool,
}

// Concurrent access is governed by the host/device access rules below:
// host access needs exclusive ownership of the `Arc`, a writable view
// excludes every other view, and device stores are `unsafe` with a
// one-unit-per-slot contract.
unsafe impl<T: Send + Sync> Sync for Allocation<T> {}

impl<T> Allocation<T> {
    fn as_ptr(&self) -> *const [T] {
        // `UnsafeCell<T>` is `repr(transparent)` over `T`.
        &*self.cells as *const [UnsafeCell<T>] as *const [T]
    }
}

/// Memory addressable by both the host and the device.
///
/// The host reads and writes through [`as_slice`](Self::as_slice) and
/// [`as_mut_slice`](Self::as_mut_slice). Kernels receive
/// [`DeviceSlice`]/[`DeviceSliceMut`] views, which keep the allocation
/// alive until the launch using them has finished. While any view exists
/// the host accessors return [`DeviceError::BufferInFlight`].
///
/// Views follow a single-writer rule: a writable view can only be taken
/// when no other view exists, and read views are refused while a writable
/// view is alive.
pub struct UnifiedBuffer<T: Element> {
    inner: Arc<Allocation<T>>,
}

impl<T: Element> UnifiedBuffer<T> {
    /// Allocate `len` zero-initialized elements.
    ///
    /// # Errors
    /// `AllocationTooLarge` if the byte size overflows, `OutOfMemory` if the
    /// allocator refuses the request.
    pub fn zeroed(len: usize) -> Result<Self> {
        let bytes = len
            .checked_mul(T::DTYPE.size_in_bytes())
            .filter(|b| *b <= isize::MAX as usize)
            .ok_or_else(|| DeviceError::AllocationTooLarge {
                len,
                dtype: T::DTYPE.to_string(),
            })?;

        let mut cells: Vec<UnsafeCell<T>> = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| DeviceError::OutOfMemory { bytes })?;
        cells.extend((0..len).map(|_| UnsafeCell::new(T::ZERO)));

        Ok(UnifiedBuffer {
            inner: Arc::new(Allocation {
                cells: cells.into_boxed_slice(),
                writer: AtomicBool::new(false),
            }),
        })
    }

    /// Allocate a buffer holding a copy of `data`.
    pub fn from_slice(data: &[T]) -> Result<Self> {
        let mut buf = Self::zeroed(data.len())?;
        buf.as_mut_slice()?.copy_from_slice(data);
        Ok(buf)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.inner.cells.len()
    }

    /// Returns true if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type of this buffer.
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Size of the allocation in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.len() * T::DTYPE.size_in_bytes()
    }

    /// Returns true while a device view of this buffer is alive.
    pub fn is_in_flight(&self) -> bool {
        Arc::strong_count(&self.inner) > 1
    }

    /// Host read access.
    ///
    /// # Errors
    /// `BufferInFlight` if a launch still holds a view of this buffer.
    pub fn as_slice(&self) -> Result<&[T]> {
        if self.is_in_flight() {
            return Err(DeviceError::BufferInFlight);
        }
        // SAFETY: no device view exists, and new writable views need
        // `&mut self`, which the returned borrow excludes.
        Ok(unsafe { &*self.inner.as_ptr() })
    }

    /// Host write access.
    ///
    /// # Errors
    /// `BufferInFlight` if a launch still holds a view of this buffer.
    pub fn as_mut_slice(&mut self) -> Result<&mut [T]> {
        let alloc = Arc::get_mut(&mut self.inner).ok_or(DeviceError::BufferInFlight)?;
        // SAFETY: `get_mut` proved this handle is the only reference.
        Ok(unsafe { &mut *(alloc.as_ptr() as *mut [T]) })
    }

    /// Copy the contents out to a host vector.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        Ok(self.as_slice()?.to_vec())
    }

    /// A read-only view for kernels.
    ///
    /// # Errors
    /// `BufferInFlight` while a writable view of this buffer is alive.
    pub fn device_view(&self) -> Result<DeviceSlice<T>> {
        // A new writer needs `&mut self`, so none can appear after this check.
        if self.inner.writer.load(Ordering::Acquire) {
            return Err(DeviceError::BufferInFlight);
        }
        Ok(DeviceSlice {
            inner: Arc::clone(&self.inner),
        })
    }

    /// A writable view for kernels.
    ///
    /// Taking `&mut self` ensures no host slice of this buffer is borrowed
    /// when the view is created.
    ///
    /// # Errors
    /// `BufferInFlight` while any other view of this buffer is alive.
    pub fn device_view_mut(&mut self) -> Result<DeviceSliceMut<T>> {
        if self.is_in_flight() {
            return Err(DeviceError::BufferInFlight);
        }
        self.inner.writer.store(true, Ordering::Release);
        Ok(DeviceSliceMut {
            inner: Arc::clone(&self.inner),
        })
    }
}

impl<T: Element> std::fmt::Debug for UnifiedBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnifiedBuffer")
            .field("dtype", &T::DTYPE)
            .field("len", &self.len())
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

/// Read-only device view of a [`UnifiedBuffer`].
pub struct DeviceSlice<T: Element> {
    inner: Arc<Allocation<T>>,
}

impl<T: Element> DeviceSlice<T> {
    pub fn len(&self) -> usize {
        self.inner.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load the element at `idx`.
    ///
    /// # Panics
    /// Panics on an out-of-bounds index; the device reports it as a fault.
    #[inline]
    pub fn load(&self, idx: usize) -> T {
        // SAFETY: no writable view exists while a read view is alive.
        unsafe { *self.inner.cells[idx].get() }
    }
}

/// Writable device view of a [`UnifiedBuffer`].
///
/// Write-only: kernels never read back through it.
pub struct DeviceSliceMut<T: Element> {
    inner: Arc<Allocation<T>>,
}

impl<T: Element> DeviceSliceMut<T> {
    pub fn len(&self) -> usize {
        self.inner.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `value` at `idx`.
    ///
    /// # Panics
    /// Panics on an out-of-bounds index; the device reports it as a fault.
    ///
    /// # Safety
    /// No other thread may load or store `idx` through this view while the
    /// store runs. Other views of the buffer cannot exist while this one
    /// is alive.
    #[inline]
    pub unsafe fn store(&self, idx: usize, value: T) {
        *self.inner.cells[idx].get() = value;
    }
}

impl<T: Element> std::fmt::Debug for DeviceSlice<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSlice").field("len", &self.len()).finish()
    }
}

impl<T: Element> std::fmt::Debug for DeviceSliceMut<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSliceMut").field("len", &self.len()).finish()
    }
}

impl<T: Element> Drop for DeviceSliceMut<T> {
    fn drop(&mut self) {
        self.inner.writer.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed() {
        let b = UnifiedBuffer::<i32>::zeroed(5).unwrap();
        assert_eq!(b.len(), 5);
        assert!(!b.is_empty());
        assert_eq!(b.as_slice().unwrap(), &[0; 5]);
        assert_eq!(b.size_in_bytes(), 20);
        assert_eq!(b.dtype(), DType::I32);
    }

    #[test]
    fn test_from_slice() {
        let b = UnifiedBuffer::from_slice(&[1u64, 2, 3]).unwrap();
        assert_eq!(b.to_vec().unwrap(), vec![1, 2, 3]);
        assert_eq!(b.size_in_bytes(), 24);
    }

    #[test]
    fn test_mut_slice() {
        let mut b = UnifiedBuffer::<i32>::zeroed(2).unwrap();
        b.as_mut_slice().unwrap()[0] = 42;
        assert_eq!(b.as_slice().unwrap()[0], 42);
    }

    #[test]
    fn test_too_large() {
        let err = UnifiedBuffer::<i64>::zeroed(usize::MAX / 4).unwrap_err();
        assert!(matches!(err, DeviceError::AllocationTooLarge { .. }));
    }

    #[test]
    fn test_view_blocks_host_access() {
        let mut b = UnifiedBuffer::<i32>::zeroed(4).unwrap();
        let view = b.device_view().unwrap();
        assert!(b.is_in_flight());
        assert_eq!(b.as_slice().unwrap_err(), DeviceError::BufferInFlight);
        assert_eq!(b.as_mut_slice().unwrap_err(), DeviceError::BufferInFlight);
        drop(view);
        assert!(!b.is_in_flight());
        assert!(b.as_mut_slice().is_ok());
    }

    #[test]
    fn test_view_load_store() {
        let mut b = UnifiedBuffer::from_slice(&[1i32, 2, 3]).unwrap();
        let out = b.device_view_mut().unwrap();
        assert_eq!(out.len(), 3);
        unsafe { out.store(1, 20) };
        drop(out);

        let input = b.device_view().unwrap();
        assert_eq!(input.load(0), 1);
        assert_eq!(input.load(1), 20);
        drop(input);
        assert_eq!(b.to_vec().unwrap(), vec![1, 20, 3]);
    }

    #[test]
    #[should_panic]
    fn test_view_out_of_bounds_panics() {
        let b = UnifiedBuffer::<u32>::zeroed(2).unwrap();
        let v = b.device_view().unwrap();
        let _ = v.load(2);
    }

    #[test]
    fn test_read_view_refused_while_writer_alive() {
        let mut b = UnifiedBuffer::<i32>::zeroed(4).unwrap();
        let writer = b.device_view_mut().unwrap();
        assert_eq!(b.device_view().unwrap_err(), DeviceError::BufferInFlight);
        drop(writer);
        assert!(b.device_view().is_ok());
    }

    #[test]
    fn test_writer_refused_while_any_view_alive() {
        let mut b = UnifiedBuffer::<i32>::zeroed(4).unwrap();
        let reader = b.device_view().unwrap();
        assert_eq!(b.device_view_mut().unwrap_err(), DeviceError::BufferInFlight);
        drop(reader);

        let writer = b.device_view_mut().unwrap();
        assert_eq!(b.device_view_mut().unwrap_err(), DeviceError::BufferInFlight);
        drop(writer);
        assert!(b.device_view_mut().is_ok());
    }
}
