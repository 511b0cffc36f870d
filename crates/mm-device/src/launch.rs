use std::fmt;

use crate::dim::Dim2;
use crate::error::{DeviceError, Result};

/// Upper bound on the number of units in a single execution group.
pub const MAX_UNITS_PER_GROUP: usize = 1024;

/// Two-level launch descriptor: a grid of groups, each a fixed array of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Number of groups along each axis.
    pub grid: Dim2,
    /// Number of units in each group along each axis.
    pub group: Dim2,
}

impl LaunchConfig {
    /// Build a descriptor from explicit grid and group extents.
    ///
    /// # Errors
    /// Returns `InvalidLaunch` if the group has a zero axis or more than
    /// [`MAX_UNITS_PER_GROUP`] units.
    pub fn new(grid: Dim2, group: Dim2) -> Result<Self> {
        if group.is_empty() {
            return Err(DeviceError::InvalidLaunch(format!(
                "group extent {} has a zero axis",
                group
            )));
        }
        if group.numel() > MAX_UNITS_PER_GROUP {
            return Err(DeviceError::InvalidLaunch(format!(
                "group extent {} has {} units, limit is {}",
                group,
                group.numel(),
                MAX_UNITS_PER_GROUP
            )));
        }
        Ok(LaunchConfig { grid, group })
    }

    /// Cover an `n` x `n` output with `side` x `side` groups.
    ///
    /// The grid has `ceil(n / side)` groups per axis, so the high edge may be
    /// over-covered; kernels must guard against coordinates `>= n`.
    pub fn for_square(n: usize, side: usize) -> Result<Self> {
        let group = Dim2::square(side);
        if side == 0 {
            return Self::new(Dim2::square(0), group);
        }
        Self::new(Dim2::square(n.div_ceil(side)), group)
    }

    /// Cover `len` elements with 1-D groups of `block` units.
    pub fn for_linear(len: usize, block: usize) -> Result<Self> {
        let group = Dim2::linear(block);
        if block == 0 {
            return Self::new(Dim2::linear(0), group);
        }
        Self::new(Dim2::linear(len.div_ceil(block)), group)
    }

    /// Total number of groups in the grid.
    pub fn num_groups(&self) -> usize {
        self.grid.numel()
    }

    /// Total number of units the launch schedules, guarded or not.
    pub fn total_units(&self) -> usize {
        self.grid.numel() * self.group.numel()
    }

    /// Iterates the position of every unit in the launch, group by group.
    pub fn units(&self) -> impl Iterator<Item = UnitPos> {
        let group_dim = self.group;
        self.grid.iter().flat_map(move |group| {
            group_dim.iter().map(move |unit| UnitPos {
                group,
                unit,
                group_dim,
            })
        })
    }
}

impl fmt::Display for LaunchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grid={} group={}", self.grid, self.group)
    }
}

/// Where a unit sits in the launch hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitPos {
    /// Index of the owning group within the grid.
    pub group: Dim2,
    /// Index of the unit within its group.
    pub unit: Dim2,
    /// Extent of every group in the launch.
    pub group_dim: Dim2,
}
