//! `mm-device` - Emulated accelerator runtime for matmul-runtime.
//!
//! This crate provides:
//! - `UnifiedBuffer`, memory addressable by host code and kernels alike
//! - A two-level launch descriptor (`LaunchConfig`: grid of groups of units)
//! - The `Kernel` and `Accelerator` traits
//! - `CpuDevice`, which schedules groups on a thread pool behind an
//!   asynchronous in-order stream
//! - Integer element types (`Element`, `DType`)

pub mod backend;
pub mod cpu;
pub mod dim;
pub mod element;
pub mod error;
pub mod launch;
pub mod storage;

pub use backend::{Accelerator, Kernel};
pub use cpu::CpuDevice;
pub use dim::Dim2;
pub use element::{DType, Element};
pub use error::{DeviceError, Result};
pub use launch::{LaunchConfig, UnitPos, MAX_UNITS_PER_GROUP};
pub use storage::{DeviceSlice, DeviceSliceMut, UnifiedBuffer};
