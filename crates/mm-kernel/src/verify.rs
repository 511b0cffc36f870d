use mm_device::Element;

use crate::coord::{element_count, Coord};
use crate::error::{KernelError, Result};

/// The first element where a result disagrees with the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch<T> {
    pub coord: Coord,
    pub expected: T,
    pub actual: T,
}

/// Result of comparing a product against the reference computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
    Pass,
    Mismatch(Mismatch<T>),
}

impl<T: Element> Outcome<T> {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    /// Turn a mismatch into a [`KernelError::Mismatch`].
    pub fn into_result(self) -> Result<()> {
        match self {
            Outcome::Pass => Ok(()),
            Outcome::Mismatch(m) => Err(KernelError::Mismatch {
                coord: m.coord,
                expected: m.expected.to_string(),
                actual: m.actual.to_string(),
            }),
        }
    }
}

fn check_len(name: &'static str, len: usize, expected: usize) -> Result<()> {
    if len != expected {
        return Err(KernelError::LengthMismatch {
            name,
            expected,
            got: len,
        });
    }
    Ok(())
}

/// Sequential triple-loop product of two `n` x `n` row-major matrices.
pub fn reference_matmul<T: Element>(a: &[T], b: &[T], n: usize) -> Result<Vec<T>> {
    let len = element_count(n)?;
    check_len("A", a.len(), len)?;
    check_len("B", b.len(), len)?;

    let mut c = vec![T::ZERO; len];
    for i in 0..n {
        for j in 0..n {
            let mut sum = T::ZERO;
            for p in 0..n {
                sum = sum.wrapping_add(a[i * n + p].wrapping_mul(b[p * n + j]));
            }
            c[i * n + j] = sum;
        }
    }
    Ok(c)
}

/// Recompute every element of `c` and compare it exactly.
///
/// Elements are checked in row-major order and the first disagreement is
/// returned. The check is a pure function of its inputs.
///
/// # Errors
/// `SizeOverflow` if `n * n` overflows, `LengthMismatch` if any operand
/// does not hold `n * n` elements.
pub fn verify<T: Element>(a: &[T], b: &[T], c: &[T], n: usize) -> Result<Outcome<T>> {
    check_len("C", c.len(), element_count(n)?)?;
    let expected = reference_matmul(a, b, n)?;

    let first = expected
        .iter()
        .zip(c)
        .position(|(e, got)| e != got);
    Ok(match first {
        None => Outcome::Pass,
        Some(i) => Outcome::Mismatch(Mismatch {
            coord: Coord::new(i / n, i % n),
            expected: expected[i],
            actual: c[i],
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_basic() {
        // [1,2;3,4] @ [5,6;7,8] = [19,22;43,50]
        let c = reference_matmul(&[1, 2, 3, 4], &[5, 6, 7, 8], 2).unwrap();
        assert_eq!(c, vec![19, 22, 43, 50]);
    }

    #[test]
    fn test_reference_single() {
        assert_eq!(reference_matmul(&[7u32], &[6], 1).unwrap(), vec![42]);
    }

    #[test]
    fn test_verify_pass() {
        let outcome = verify(&[1, 2, 3, 4], &[5, 6, 7, 8], &[19, 22, 43, 50], 2).unwrap();
        assert_eq!(outcome, Outcome::Pass);
        assert!(outcome.into_result().is_ok());
    }

    #[test]
    fn test_verify_reports_first_mismatch() {
        let outcome = verify(&[1, 2, 3, 4], &[5, 6, 7, 8], &[19, 22, 0, 51], 2).unwrap();
        assert_eq!(
            outcome,
            Outcome::Mismatch(Mismatch {
                coord: Coord::new(1, 0),
                expected: 43,
                actual: 0,
            })
        );
        let err = outcome.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "result mismatch at (1, 0): expected 43, got 0"
        );
    }

    #[test]
    fn test_verify_is_idempotent() {
        let a = [3i64, 1, 4, 1, 5, 9, 2, 6, 5];
        let b = [2i64, 7, 1, 8, 2, 8, 1, 8, 2];
        let bad = [0i64; 9];
        let good = reference_matmul(&a, &b, 3).unwrap();
        for _ in 0..3 {
            assert!(verify(&a, &b, &good, 3).unwrap().is_pass());
            assert!(!verify(&a, &b, &bad, 3).unwrap().is_pass());
        }
    }

    #[test]
    fn test_verify_length_mismatch() {
        let err = verify(&[1, 2, 3, 4], &[5, 6, 7, 8], &[19, 22, 43], 2).unwrap_err();
        assert!(matches!(err, KernelError::LengthMismatch { name: "C", .. }));
        assert!(reference_matmul(&[1, 2, 3], &[1, 2, 3, 4], 2).is_err());
    }

    #[test]
    fn test_verify_side_overflow() {
        let n = 1usize << (usize::BITS / 2);
        let empty: [u32; 0] = [];
        assert_eq!(
            verify(&empty, &empty, &empty, n),
            Err(KernelError::SizeOverflow { n })
        );
        assert!(reference_matmul(&empty, &empty, n).is_err());
    }

    #[test]
    fn test_verify_empty() {
        let empty: [i32; 0] = [];
        assert!(verify(&empty, &empty, &empty, 0).unwrap().is_pass());
    }
}
