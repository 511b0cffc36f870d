//! `mm-kernel` - Square integer matrix multiplication, one unit per output element.
//!
//! This crate provides:
//! - The coordinate mapping from launch position to output element, and a
//!   structural check that a launch partitions the output exactly once
//! - `MatmulKernel` and its host-side launcher
//! - A bounded random matrix initializer
//! - A sequential reference verifier with a structured outcome
//! - A 1-D masked vector-addition kernel

pub mod coord;
pub mod error;
pub mod init;
pub mod matmul;
pub mod vector_add;
pub mod verify;

pub use coord::{
    check_partition, coverage, element_count, global_coord, unit_coord, Coord, Coverage,
};
pub use error::{KernelError, Result};
pub use init::{fill_random, fill_uniform, input_rng, VALUE_BOUND};
pub use matmul::{launch_matmul, matmul, MatmulKernel, DEFAULT_GROUP_SIDE};
pub use vector_add::{launch_vector_add, VectorAddKernel, DEFAULT_BLOCK};
pub use verify::{reference_matmul, verify, Mismatch, Outcome};
