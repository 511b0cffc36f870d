use std::fmt;

/// Integer element types a unified buffer can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 32-bit unsigned integer.
    U32,
    /// 64-bit unsigned integer.
    U64,
}

impl DType {
    /// Returns the size in bytes of a single element.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::I32 | DType::U32 => 4,
            DType::I64 | DType::U64 => 8,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::I32 => write!(f, "i32"),
            DType::I64 => write!(f, "i64"),
            DType::U32 => write!(f, "u32"),
            DType::U64 => write!(f, "u64"),
        }
    }
}

/// A fixed-width integer that kernels can load, store and accumulate.
///
/// Arithmetic wraps on overflow, matching native device integer behaviour.
pub trait Element:
    Copy + Default + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// The runtime tag for this type.
    const DTYPE: DType;

    /// Additive identity.
    const ZERO: Self;

    /// Widens a small non-negative value into this type.
    fn from_u8(v: u8) -> Self;

    /// Addition that wraps at the type's bounds.
    fn wrapping_add(self, rhs: Self) -> Self;

    /// Multiplication that wraps at the type's bounds.
    fn wrapping_mul(self, rhs: Self) -> Self;
}

macro_rules! impl_element {
    ($ty:ty, $dtype:expr) => {
        impl Element for $ty {
            const DTYPE: DType = $dtype;
            const ZERO: Self = 0;

            fn from_u8(v: u8) -> Self {
                v as $ty
            }

            fn wrapping_add(self, rhs: Self) -> Self {
                <$ty>::wrapping_add(self, rhs)
            }

            fn wrapping_mul(self, rhs: Self) -> Self {
                <$ty>::wrapping_mul(self, rhs)
            }
        }
    };
}

impl_element!(i32, DType::I32);
impl_element!(i64, DType::I64);
impl_element!(u32, DType::U32);
impl_element!(u64, DType::U64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_in_bytes() {
        assert_eq!(DType::I32.size_in_bytes(), 4);
        assert_eq!(DType::U32.size_in_bytes(), 4);
        assert_eq!(DType::I64.size_in_bytes(), 8);
        assert_eq!(DType::U64.size_in_bytes(), 8);
    }

    #[test]
    fn test_dtype_tags() {
        assert_eq!(<i32 as Element>::DTYPE, DType::I32);
        assert_eq!(<u64 as Element>::DTYPE, DType::U64);
        assert_eq!(DType::I32.to_string(), "i32");
    }

    #[test]
    fn test_wrapping_arithmetic() {
        assert_eq!(Element::wrapping_add(i32::MAX, 1), i32::MIN);
        assert_eq!(Element::wrapping_mul(u32::MAX, 2u32), u32::MAX - 1);
        assert_eq!(<i64 as Element>::from_u8(99), 99i64);
        assert_eq!(<u32 as Element>::ZERO, 0);
    }
}
