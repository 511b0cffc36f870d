use mm_device::{
    Accelerator, DeviceSlice, DeviceSliceMut, Element, Kernel, LaunchConfig, UnifiedBuffer, UnitPos,
};
use tracing::debug;

use crate::error::{KernelError, Result};

/// Units per group for 1-D launches.
pub const DEFAULT_BLOCK: usize = 1024;

/// Element-wise `out[i] = x[i] + y[i]` over a 1-D grid.
///
/// The last group is masked: units with `i >= len` do nothing.
pub struct VectorAddKernel<T: Element> {
    x: DeviceSlice<T>,
    y: DeviceSlice<T>,
    out: DeviceSliceMut<T>,
    len: usize,
}

impl<T: Element> VectorAddKernel<T> {
    /// Bind the kernel to equally sized operands.
    ///
    /// # Errors
    /// `LengthMismatch` on differing lengths, `BufferInFlight` if a buffer
    /// is still bound to another launch.
    pub fn new(x: &UnifiedBuffer<T>, y: &UnifiedBuffer<T>, out: &mut UnifiedBuffer<T>) -> Result<Self> {
        let len = out.len();
        for (name, got) in [("x", x.len()), ("y", y.len())] {
            if got != len {
                return Err(KernelError::LengthMismatch {
                    name,
                    expected: len,
                    got,
                });
            }
        }
        Ok(VectorAddKernel {
            x: x.device_view()?,
            y: y.device_view()?,
            out: out.device_view_mut()?,
            len,
        })
    }
}

impl<T: Element> Kernel for VectorAddKernel<T> {
    fn name(&self) -> &str {
        "vector_add"
    }

    #[inline]
    unsafe fn execute(&self, pos: UnitPos) {
        let i = pos.group.x * pos.group_dim.x + pos.unit.x;
        if i >= self.len {
            return;
        }
        let sum = self.x.load(i).wrapping_add(self.y.load(i));
        // SAFETY: positions run once each and map to distinct `i`.
        unsafe { self.out.store(i, sum) };
    }
}

/// Queue `out = x + y` with 1-D groups of `block` units.
pub fn launch_vector_add<D: Accelerator, T: Element>(
    device: &D,
    x: &UnifiedBuffer<T>,
    y: &UnifiedBuffer<T>,
    out: &mut UnifiedBuffer<T>,
    block: usize,
) -> Result<LaunchConfig> {
    let config = LaunchConfig::for_linear(out.len(), block)?;
    let kernel = VectorAddKernel::new(x, y, out)?;
    debug!(len = out.len(), %config, "launching vector_add");
    device.launch(kernel, config)?;
    Ok(config)
}
