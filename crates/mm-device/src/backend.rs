use std::fmt::Debug;

use crate::element::Element;
use crate::error::Result;
use crate::launch::{LaunchConfig, UnitPos};
use crate::storage::UnifiedBuffer;

/// A routine executed once per unit of a launch.
///
/// Kernels own their device views and scalar arguments. The device runs
/// [`execute`](Kernel::execute) for every unit in the launch grid, in no
/// particular order and possibly concurrently, then drops the kernel,
/// which releases its views.
pub trait Kernel: Send + Sync + 'static {
    /// Returns the name used in logs and fault reports.
    fn name(&self) -> &str;

    /// Body run by the unit at `pos`.
    ///
    /// # Safety
    /// Over the lifetime of the kernel, every call passes a position from
    /// the same launch grid and no position is executed twice.
    /// Implementations rely on this to write through `DeviceSliceMut`
    /// without synchronization.
    unsafe fn execute(&self, pos: UnitPos);
}

/// Trait for accelerator runtimes.
///
/// Launches are asynchronous: `launch` queues work and returns. Work runs
/// in submission order; `synchronize` is the only blocking point and
/// reports any failure since the last call.
pub trait Accelerator: Send + Sync + Debug {
    /// Returns the name of this device (e.g., "cpu").
    fn name(&self) -> &str;

    /// Number of execution resources the device schedules groups onto.
    fn parallelism(&self) -> usize;

    /// Allocate `len` zeroed elements of unified memory.
    fn alloc_unified<T: Element>(&self, len: usize) -> Result<UnifiedBuffer<T>>
    where
        Self: Sized,
    {
        UnifiedBuffer::zeroed(len)
    }

    /// Queue `kernel` to run over `config`.
    fn launch<K: Kernel>(&self, kernel: K, config: LaunchConfig) -> Result<()>
    where
        Self: Sized;

    /// Block until all queued launches have completed.
    ///
    /// # Errors
    /// Returns the first fault recorded since the previous call.
    fn synchronize(&self) -> Result<()>;
}
