//! Mapping from launch positions to output coordinates, and the check that
//! a launch partitions the output exactly.

use std::fmt;

use mm_device::{Dim2, LaunchConfig, UnitPos};

use crate::error::{KernelError, Result};

/// Number of elements in an `n` x `n` matrix.
///
/// # Errors
/// `SizeOverflow` if `n * n` does not fit in `usize`.
pub fn element_count(n: usize) -> Result<usize> {
    n.checked_mul(n).ok_or(KernelError::SizeOverflow { n })
}

/// A `(row, col)` position in an output matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }

    /// Returns true if the coordinate lies inside an `n` x `n` matrix.
    #[inline]
    pub fn in_bounds(&self, n: usize) -> bool {
        self.row < n && self.col < n
    }

    /// Row-major offset inside an `n` x `n` matrix.
    #[inline]
    pub fn offset(&self, n: usize) -> usize {
        self.row * n + self.col
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Global output coordinate of a unit.
///
/// `row = group.y * group_dim.y + unit.y` and
/// `col = group.x * group_dim.x + unit.x`. No bounds are applied here.
#[inline]
pub fn global_coord(group: Dim2, unit: Dim2, group_dim: Dim2) -> Coord {
    Coord {
        row: group.y * group_dim.y + unit.y,
        col: group.x * group_dim.x + unit.x,
    }
}

/// [`global_coord`] for a scheduled unit.
#[inline]
pub fn unit_coord(pos: UnitPos) -> Coord {
    global_coord(pos.group, pos.unit, pos.group_dim)
}

/// How a launch maps onto an `n` x `n` output.
#[derive(Debug, Clone)]
pub struct Coverage {
    n: usize,
    owners: Vec<u32>,
    guarded: usize,
}

impl Coverage {
    /// Number of units mapped to `coord`.
    pub fn owners(&self, coord: Coord) -> u32 {
        self.owners[coord.offset(self.n)]
    }

    /// Units whose coordinate fell outside the matrix.
    pub fn guarded(&self) -> usize {
        self.guarded
    }

    /// First coordinate (row-major) not owned by exactly one unit.
    pub fn first_violation(&self) -> Option<(Coord, u32)> {
        self.owners
            .iter()
            .position(|&count| count != 1)
            .map(|i| (Coord::new(i / self.n, i % self.n), self.owners[i]))
    }
}

/// Count how many units of `config` map to each coordinate of an `n` x `n`
/// output, using the same guard the kernels apply.
pub fn coverage(n: usize, config: &LaunchConfig) -> Result<Coverage> {
    let mut owners = vec![0u32; element_count(n)?];
    let mut guarded = 0;
    for pos in config.units() {
        let coord = unit_coord(pos);
        if coord.in_bounds(n) {
            owners[coord.offset(n)] += 1;
        } else {
            guarded += 1;
        }
    }
    Ok(Coverage { n, owners, guarded })
}

/// Verify that every output coordinate is computed by exactly one unit.
///
/// # Errors
/// `Partition` naming the first coordinate that is uncovered or covered
/// more than once.
pub fn check_partition(n: usize, config: &LaunchConfig) -> Result<()> {
    match coverage(n, config)?.first_violation() {
        None => Ok(()),
        Some((coord, 0)) => Err(KernelError::Partition(format!(
            "{} is not covered by {}",
            coord, config
        ))),
        Some((coord, count)) => Err(KernelError::Partition(format!(
            "{} is covered {} times by {}",
            coord, count, config
        ))),
    }
}
