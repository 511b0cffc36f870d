use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use mm_device::{Accelerator, CpuDevice, Element};
use mm_kernel::{
    check_partition, element_count, fill_random, fill_uniform, input_rng, launch_matmul,
    launch_vector_add, verify, Outcome,
};
use tracing::{error, info};

use crate::config::RunConfig;

/// Summary of a verified matrix product.
#[derive(Debug)]
pub struct MatmulReport {
    pub size: usize,
    pub kernel_time: Duration,
    pub verify_time: Duration,
}

impl MatmulReport {
    /// Integer multiply-adds per second achieved by the kernel, in billions.
    pub fn giga_ops(&self) -> f64 {
        let ops = 2.0 * (self.size as f64).powi(3);
        ops / self.kernel_time.as_secs_f64().max(f64::EPSILON) / 1e9
    }
}

pub fn open_device(threads: Option<usize>) -> Result<CpuDevice> {
    let device = match threads {
        Some(n) => CpuDevice::with_threads(n),
        None => CpuDevice::new(),
    }
    .context("failed to initialize device")?;
    info!(device = device.name(), workers = device.parallelism(), "device ready");
    Ok(device)
}

/// Multiply two random `size` x `size` matrices and verify the product.
///
/// # Errors
/// Any device failure, or a mismatch against the reference.
pub fn run_matmul(config: &RunConfig) -> Result<MatmulReport> {
    let device = open_device(config.threads)?;
    let n = config.size;
    let len = element_count(n)?;

    let mut a = device.alloc_unified::<i32>(len)?;
    let mut b = device.alloc_unified::<i32>(len)?;
    let mut c = device.alloc_unified::<i32>(len)?;

    let mut rng = input_rng(config.seed);
    fill_random(a.as_mut_slice()?, n, &mut rng)?;
    fill_random(b.as_mut_slice()?, n, &mut rng)?;

    let started = Instant::now();
    let launch = launch_matmul(&device, &a, &b, &mut c, n, config.group)?;
    info!(n, %launch, units = launch.total_units(), "matmul dispatched");

    // Runs on the host while the device works.
    check_partition(n, &launch)?;

    device.synchronize().context("matmul launch failed")?;
    let kernel_time = started.elapsed();

    let started = Instant::now();
    let outcome = verify(a.as_slice()?, b.as_slice()?, c.as_slice()?, n)?;
    let verify_time = started.elapsed();

    if let Outcome::Mismatch(m) = outcome {
        error!(
            row = m.coord.row,
            col = m.coord.col,
            expected = m.expected,
            actual = m.actual,
            "kernel result disagrees with reference"
        );
        outcome.into_result()?;
    }

    let report = MatmulReport {
        size: n,
        kernel_time,
        verify_time,
    };
    info!(
        kernel_ms = report.kernel_time.as_millis() as u64,
        verify_ms = report.verify_time.as_millis() as u64,
        gops = report.giga_ops(),
        "matmul verified"
    );
    Ok(report)
}

/// Add two random vectors of `len` elements and check the sum.
pub fn run_vector_add(config: &RunConfig, len: usize, block: usize) -> Result<Duration> {
    let device = open_device(config.threads)?;
    let mut rng = input_rng(config.seed);

    let mut x = device.alloc_unified::<i32>(len)?;
    let mut y = device.alloc_unified::<i32>(len)?;
    let mut out = device.alloc_unified::<i32>(len)?;
    fill_uniform(x.as_mut_slice()?, &mut rng);
    fill_uniform(y.as_mut_slice()?, &mut rng);

    let started = Instant::now();
    let launch = launch_vector_add(&device, &x, &y, &mut out, block)?;
    info!(len, %launch, "vector_add dispatched");
    device.synchronize().context("vector_add launch failed")?;
    let elapsed = started.elapsed();

    let (x, y, out) = (x.as_slice()?, y.as_slice()?, out.as_slice()?);
    if let Some(i) = (0..len).find(|&i| out[i] != x[i].wrapping_add(y[i])) {
        bail!(
            "vector_add mismatch at {}: expected {}, got {}",
            i,
            x[i].wrapping_add(y[i]),
            out[i]
        );
    }

    let bytes = 3 * len * <i32 as Element>::DTYPE.size_in_bytes();
    info!(
        elapsed_us = elapsed.as_micros() as u64,
        gbps = bytes as f64 / elapsed.as_secs_f64().max(f64::EPSILON) / 1e9,
        "vector_add verified"
    );
    Ok(elapsed)
}
