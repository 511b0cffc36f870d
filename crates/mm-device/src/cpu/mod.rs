mod stream;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace};

use crate::backend::{Accelerator, Kernel};
use crate::error::{DeviceError, Result};
use crate::launch::{LaunchConfig, UnitPos};

use stream::Stream;

/// Host-emulated accelerator.
///
/// Each execution group of a launch becomes one task on a `rayon` pool and
/// runs its units sequentially. Launches are queued on a single in-order
/// stream, so `launch` returns before the kernel has run.
pub struct CpuDevice {
    pool: Arc<ThreadPool>,
    stream: Stream,
}

impl CpuDevice {
    /// Create a device using one worker per available core.
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    /// Create a device with exactly `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(DeviceError::Init("thread count must be > 0".to_string()));
        }
        Self::build(Some(threads))
    }

    fn build(threads: Option<usize>) -> Result<Self> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("mm-unit-{}", i));
        if let Some(n) = threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| DeviceError::Init(e.to_string()))?;
        let stream = Stream::spawn("mm-stream")?;
        debug!(workers = pool.current_num_threads(), "cpu device ready");
        Ok(CpuDevice {
            pool: Arc::new(pool),
            stream,
        })
    }
}

impl fmt::Debug for CpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CpuDevice")
            .field("workers", &self.pool.current_num_threads())
            .finish()
    }
}

impl Accelerator for CpuDevice {
    fn name(&self) -> &str {
        "cpu"
    }

    fn parallelism(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn launch<K: Kernel>(&self, kernel: K, config: LaunchConfig) -> Result<()> {
        debug!(
            kernel = kernel.name(),
            %config,
            units = config.total_units(),
            "queueing launch"
        );
        let pool = Arc::clone(&self.pool);
        self.stream
            .submit(Box::new(move || run_grid(&pool, &kernel, config)))
    }

    fn synchronize(&self) -> Result<()> {
        trace!("synchronize");
        self.stream.fence()
    }
}

/// Run every unit of `config` on `pool`, turning a unit panic into a fault.
fn run_grid<K: Kernel>(pool: &ThreadPool, kernel: &K, config: LaunchConfig) -> Result<()> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pool.install(|| {
            (0..config.num_groups())
                .into_par_iter()
                .for_each(|linear| {
                    let group = config.grid.unflatten(linear);
                    for unit in config.group.iter() {
                        let pos = UnitPos {
                            group,
                            unit,
                            group_dim: config.group,
                        };
                        // SAFETY: every (group, unit) pair of the grid is
                        // visited once, and the kernel is owned by this launch.
                        unsafe { kernel.execute(pos) };
                    }
                })
        })
    }));

    match outcome {
        Ok(()) => {
            trace!(kernel = kernel.name(), "launch complete");
            Ok(())
        }
        Err(payload) => Err(DeviceError::KernelFault {
            kernel: kernel.name().to_string(),
            reason: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::Dim2;
    use crate::storage::{DeviceSlice, DeviceSliceMut};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn device() -> CpuDevice {
        CpuDevice::with_threads(4).unwrap()
    }

    struct CountUnits {
        hits: Arc<AtomicUsize>,
    }

    impl Kernel for CountUnits {
        fn name(&self) -> &str {
            "count_units"
        }

        unsafe fn execute(&self, _pos: UnitPos) {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Writes a tag of each unit's group position into its slot.
    struct TagGroups {
        out: DeviceSliceMut<u32>,
        width: usize,
    }

    impl Kernel for TagGroups {
        fn name(&self) -> &str {
            "tag_groups"
        }

        unsafe fn execute(&self, pos: UnitPos) {
            let col = pos.group.x * pos.group_dim.x + pos.unit.x;
            let row = pos.group.y * pos.group_dim.y + pos.unit.y;
            let tag = (pos.group.y * 100 + pos.group.x) as u32;
            // SAFETY: each unit owns a distinct (row, col) and runs once.
            unsafe { self.out.store(row * self.width + col, tag) };
        }
    }

    struct OutOfBounds {
        input: DeviceSlice<i32>,
    }

    impl Kernel for OutOfBounds {
        fn name(&self) -> &str {
            "out_of_bounds"
        }

        unsafe fn execute(&self, pos: UnitPos) {
            let _ = self.input.load(pos.unit.x + self.input.len());
        }
    }

    #[test]
    fn test_every_unit_runs_once() {
        let dev = device();
        let hits = Arc::new(AtomicUsize::new(0));
        let cfg = LaunchConfig::for_square(33, 16).unwrap();
        dev.launch(
            CountUnits {
                hits: Arc::clone(&hits),
            },
            cfg,
        )
        .unwrap();
        dev.synchronize().unwrap();
        assert_eq!(hits.load(Ordering::Relaxed), 48 * 48);
    }

    #[test]
    fn test_group_positions() {
        let dev = device();
        let mut out = dev.alloc_unified::<u32>(4 * 4).unwrap();
        let cfg = LaunchConfig::new(Dim2::square(2), Dim2::square(2)).unwrap();
        dev.launch(
            TagGroups {
                out: out.device_view_mut().unwrap(),
                width: 4,
            },
            cfg,
        )
        .unwrap();
        dev.synchronize().unwrap();
        assert_eq!(
            out.to_vec().unwrap(),
            vec![0, 0, 1, 1, 0, 0, 1, 1, 100, 100, 101, 101, 100, 100, 101, 101]
        );
    }

    #[test]
    fn test_fault_reported_by_synchronize() {
        let dev = device();
        let input = dev.alloc_unified::<i32>(8).unwrap();
        let cfg = LaunchConfig::for_linear(8, 8).unwrap();
        dev.launch(
            OutOfBounds {
                input: input.device_view().unwrap(),
            },
            cfg,
        )
        .unwrap();
        match dev.synchronize() {
            Err(DeviceError::KernelFault { kernel, .. }) => assert_eq!(kernel, "out_of_bounds"),
            other => panic!("expected fault, got {:?}", other),
        }
        // Fault is reported once and the device stays usable.
        assert!(dev.synchronize().is_ok());
        assert!(input.as_slice().is_ok());
    }

    #[test]
    fn test_synchronize_releases_views() {
        let dev = device();
        let mut out = dev.alloc_unified::<u32>(16).unwrap();
        let cfg = LaunchConfig::new(Dim2::square(2), Dim2::square(2)).unwrap();
        dev.launch(
            TagGroups {
                out: out.device_view_mut().unwrap(),
                width: 4,
            },
            cfg,
        )
        .unwrap();
        dev.synchronize().unwrap();
        assert!(!out.is_in_flight());
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(matches!(
            CpuDevice::with_threads(0),
            Err(DeviceError::Init(_))
        ));
    }

    #[test]
    fn test_name_and_parallelism() {
        let dev = device();
        assert_eq!(dev.name(), "cpu");
        assert_eq!(dev.parallelism(), 4);
    }
}
