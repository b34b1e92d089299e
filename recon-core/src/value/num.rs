//! Numeric values.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A Recon number.
///
/// `Uint` is reserved for hexadecimal literals (`0x...`); decimal integers
/// parse as `Int`, falling back to `Float` on overflow.
#[derive(Debug, Clone, Copy)]
pub enum Num {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl Num {
    pub fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Uint(n) => n as f64,
            Num::Float(n) => n,
        }
    }

    /// The value as an `i64`, if it is integral and in range.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Num::Int(n) => Some(n),
            Num::Uint(n) => i64::try_from(n).ok(),
            Num::Float(n) if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 => {
                Some(n as i64)
            }
            Num::Float(_) => None,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Num::Float(_))
    }

    /// Whether the number has a literal form.
    pub fn is_finite(self) -> bool {
        match self {
            Num::Float(n) => n.is_finite(),
            _ => true,
        }
    }
}

impl PartialEq for Num {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a == b,
            (Num::Uint(a), Num::Uint(b)) => a == b,
            (Num::Float(a), Num::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Num {}

impl Hash for Num {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Num::Int(n) => n.hash(state),
            Num::Uint(n) => n.hash(state),
            Num::Float(n) => n.to_bits().hash(state),
        }
    }
}

/// Recon literal form. Floats always carry a `.` or an exponent; unsigned
/// values print as zero-padded uppercase hex.
impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Num::Int(n) => write!(f, "{}", n),
            Num::Uint(n) if *n <= u32::MAX as u64 => write!(f, "0x{:08X}", n),
            Num::Uint(n) => write!(f, "0x{:016X}", n),
            Num::Float(n) => write!(f, "{:?}", n),
        }
    }
}

impl From<i32> for Num {
    fn from(n: i32) -> Self {
        Num::Int(n as i64)
    }
}

impl From<i64> for Num {
    fn from(n: i64) -> Self {
        Num::Int(n)
    }
}

impl From<u32> for Num {
    fn from(n: u32) -> Self {
        Num::Int(n as i64)
    }
}

impl From<u64> for Num {
    fn from(n: u64) -> Self {
        Num::Uint(n)
    }
}

impl From<f32> for Num {
    fn from(n: f32) -> Self {
        Num::Float(n as f64)
    }
}

impl From<f64> for Num {
    fn from(n: f64) -> Self {
        Num::Float(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(Num::Int(-42).to_string(), "-42");
        assert_eq!(Num::Float(1.0).to_string(), "1.0");
        assert_eq!(Num::Float(1e-7).to_string(), "1e-7");
        assert_eq!(Num::Uint(255).to_string(), "0x000000FF");
        assert_eq!(Num::Uint(1 << 40).to_string(), "0x0000010000000000");
    }

    #[test]
    fn test_equality_is_variant_sensitive() {
        assert_eq!(Num::Int(1), Num::Int(1));
        assert_ne!(Num::Int(1), Num::Uint(1));
        assert_ne!(Num::Int(1), Num::Float(1.0));
        assert_eq!(Num::Float(f64::NAN), Num::Float(f64::NAN));
        assert_ne!(Num::Float(0.0), Num::Float(-0.0));
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(Num::Float(3.0).as_i64(), Some(3));
        assert_eq!(Num::Float(3.5).as_i64(), None);
        assert_eq!(Num::Uint(u64::MAX).as_i64(), None);
    }
}
