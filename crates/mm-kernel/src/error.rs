use thiserror::Error;

use crate::coord::Coord;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("device error: {0}")]
    Device(#[from] mm_device::DeviceError),
    #[error("result mismatch at {coord}: expected {expected}, got {actual}")]
    Mismatch {
        coord: Coord,
        expected: String,
        actual: String,
    },
    #[error("{name} has {got} elements, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("buffer holds {capacity} elements but {needed} are required")]
    BufferTooSmall { needed: usize, capacity: usize },
    #[error("matrix side {n} overflows the element count")]
    SizeOverflow { n: usize },
    #[error("launch does not partition the output: {0}")]
    Partition(String),
}

pub type Result<T> = std::result::Result<T, KernelError>;
