use mm_device::Element;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::coord::element_count;
use crate::error::{KernelError, Result};

/// Exclusive upper bound of generated values.
pub const VALUE_BOUND: u8 = 100;

/// Fill the first `n * n` slots of `buf` with integers in `[0, 100)`.
///
/// Slots past `n * n` are left untouched.
///
/// # Errors
/// `SizeOverflow` if `n * n` overflows, `BufferTooSmall` if `buf` holds
/// fewer than `n * n` elements.
pub fn fill_random<T: Element, R: Rng>(buf: &mut [T], n: usize, rng: &mut R) -> Result<()> {
    let needed = element_count(n)?;
    if buf.len() < needed {
        return Err(KernelError::BufferTooSmall {
            needed,
            capacity: buf.len(),
        });
    }
    fill_uniform(&mut buf[..needed], rng);
    Ok(())
}

/// Fill every slot of `buf` with integers in `[0, 100)`.
pub fn fill_uniform<T: Element, R: Rng>(buf: &mut [T], rng: &mut R) {
    for slot in buf {
        *slot = T::from_u8(rng.gen_range(0..VALUE_BOUND));
    }
}

/// Source of matrix inputs: reproducible when seeded, fresh otherwise.
pub fn input_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}
