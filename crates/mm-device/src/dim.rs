use std::fmt;

/// A 2-D extent or index.
///
/// `x` runs along columns and `y` along rows, so a group at grid position
/// `(x, y)` covers output columns starting at `x * group.x` and rows
/// starting at `y * group.y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dim2 {
    pub x: usize,
    pub y: usize,
}

impl Dim2 {
    pub const fn new(x: usize, y: usize) -> Self {
        Dim2 { x, y }
    }

    /// A square extent `side` x `side`.
    pub const fn square(side: usize) -> Self {
        Dim2 { x: side, y: side }
    }

    /// A 1-D extent along `x`.
    pub const fn linear(len: usize) -> Self {
        Dim2 { x: len, y: 1 }
    }

    /// Total number of positions covered (`x * y`).
    pub fn numel(&self) -> usize {
        self.x * self.y
    }

    /// Returns true if either axis is zero.
    pub fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    /// Converts a row-major linear position into an index within this extent.
    ///
    /// # Panics
    /// Panics if `x` is zero.
    pub fn unflatten(&self, linear: usize) -> Dim2 {
        Dim2 {
            x: linear % self.x,
            y: linear / self.x,
        }
    }

    /// Iterates every index inside this extent in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Dim2> {
        let extent = *self;
        (0..extent.y).flat_map(move |y| (0..extent.x).map(move |x| Dim2 { x, y }))
    }
}

impl fmt::Display for Dim2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numel() {
        assert_eq!(Dim2::new(3, 4).numel(), 12);
        assert_eq!(Dim2::square(16).numel(), 256);
        assert_eq!(Dim2::linear(7).numel(), 7);
        assert!(Dim2::new(0, 5).is_empty());
    }

    #[test]
    fn test_unflatten() {
        let d = Dim2::new(3, 2);
        assert_eq!(d.unflatten(0), Dim2::new(0, 0));
        assert_eq!(d.unflatten(2), Dim2::new(2, 0));
        assert_eq!(d.unflatten(4), Dim2::new(1, 1));
    }

    #[test]
    fn test_iter_row_major() {
        let all: Vec<Dim2> = Dim2::new(2, 2).iter().collect();
        assert_eq!(
            all,
            vec![
                Dim2::new(0, 0),
                Dim2::new(1, 0),
                Dim2::new(0, 1),
                Dim2::new(1, 1)
            ]
        );
        assert_eq!(Dim2::new(0, 3).iter().count(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Dim2::new(16, 8).to_string(), "(16, 8)");
    }
}
