use mm_device::{
    Accelerator, DeviceSlice, DeviceSliceMut, Element, Kernel, LaunchConfig, UnifiedBuffer, UnitPos,
};
use tracing::debug;

use crate::coord::{element_count, unit_coord};
use crate::error::{KernelError, Result};

/// Group side used when the caller has no preference.
pub const DEFAULT_GROUP_SIDE: usize = 16;

/// Square matrix product, one unit per output element.
///
/// The unit at `(row, col)` computes `sum_k A[row, k] * B[k, col]` with
/// wrapping arithmetic and writes it to `C[row, col]`. Units mapped past
/// the edge of the matrix return without touching memory.
pub struct MatmulKernel<T: Element> {
    a: DeviceSlice<T>,
    b: DeviceSlice<T>,
    c: DeviceSliceMut<T>,
    n: usize,
}

impl<T: Element> MatmulKernel<T> {
    /// Bind the kernel to `n` x `n` operands.
    ///
    /// # Errors
    /// `SizeOverflow` if `n * n` overflows, `LengthMismatch` if any buffer
    /// does not hold exactly `n * n` elements, `BufferInFlight` if a buffer
    /// is still bound to another launch.
    pub fn new(
        a: &UnifiedBuffer<T>,
        b: &UnifiedBuffer<T>,
        c: &mut UnifiedBuffer<T>,
        n: usize,
    ) -> Result<Self> {
        let expected = element_count(n)?;
        for (name, len) in [("A", a.len()), ("B", b.len()), ("C", c.len())] {
            if len != expected {
                return Err(KernelError::LengthMismatch {
                    name,
                    expected,
                    got: len,
                });
            }
        }
        Ok(MatmulKernel {
            a: a.device_view()?,
            b: b.device_view()?,
            c: c.device_view_mut()?,
            n,
        })
    }
}

impl<T: Element> Kernel for MatmulKernel<T> {
    fn name(&self) -> &str {
        "matmul"
    }

    #[inline]
    unsafe fn execute(&self, pos: UnitPos) {
        let n = self.n;
        let coord = unit_coord(pos);
        if !coord.in_bounds(n) {
            return;
        }

        let mut sum = T::ZERO;
        for k in 0..n {
            let prod = self.a.load(coord.row * n + k).wrapping_mul(self.b.load(k * n + coord.col));
            sum = sum.wrapping_add(prod);
        }
        // SAFETY: positions come from one grid and run once each, and
        // `unit_coord` is injective over a grid (unit.x < group_dim.x,
        // unit.y < group_dim.y), so this slot has exactly one writer.
        unsafe { self.c.store(coord.offset(n), sum) };
    }
}

/// Queue `C = A x B` on `device` with `group_side` x `group_side` groups.
///
/// Returns once the launch is queued; call [`Accelerator::synchronize`]
/// before touching `c` from the host.
pub fn launch_matmul<D: Accelerator, T: Element>(
    device: &D,
    a: &UnifiedBuffer<T>,
    b: &UnifiedBuffer<T>,
    c: &mut UnifiedBuffer<T>,
    n: usize,
    group_side: usize,
) -> Result<LaunchConfig> {
    let config = LaunchConfig::for_square(n, group_side)?;
    let kernel = MatmulKernel::new(a, b, c, n)?;
    debug!(n, %config, dtype = %T::DTYPE, "launching matmul");
    device.launch(kernel, config)?;
    Ok(config)
}

/// Allocate C, run the product and wait for it.
pub fn matmul<D: Accelerator, T: Element>(
    device: &D,
    a: &UnifiedBuffer<T>,
    b: &UnifiedBuffer<T>,
    n: usize,
    group_side: usize,
) -> Result<UnifiedBuffer<T>> {
    let mut c = device.alloc_unified::<T>(element_count(n)?)?;
    launch_matmul(device, a, b, &mut c, n, group_side)?;
    device.synchronize()?;
    Ok(c)
}
