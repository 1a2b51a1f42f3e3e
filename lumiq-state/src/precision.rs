//! Amplitude precision

use crate::error::StateError;
use num_complex::{Complex, Complex64};
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

/// Width of the complex amplitudes a state vector stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecisionKind {
    /// `Complex<f32>`
    #[serde(alias = "complex64", alias = "c64")]
    Single,
    /// `Complex<f64>`
    #[default]
    #[serde(alias = "complex128", alias = "c128")]
    Double,
}

impl PrecisionKind {
    /// Bytes occupied by one amplitude
    pub fn amplitude_bytes(self) -> usize {
        match self {
            PrecisionKind::Single => std::mem::size_of::<Complex<f32>>(),
            PrecisionKind::Double => std::mem::size_of::<Complex<f64>>(),
        }
    }
}

impl fmt::Display for PrecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecisionKind::Single => f.write_str("complex64"),
            PrecisionKind::Double => f.write_str("complex128"),
        }
    }
}

impl FromStr for PrecisionKind {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complex64" | "c64" | "single" => Ok(PrecisionKind::Single),
            "complex128" | "c128" | "double" => Ok(PrecisionKind::Double),
            other => Err(StateError::UnsupportedPrecision(other.to_string())),
        }
    }
}

/// Real component type of a state vector
pub trait Precision: Float + Default + Sum + Send + Sync + fmt::Debug + 'static {
    const KIND: PrecisionKind;

    fn cast_from(v: f64) -> Self;

    fn as_f64(self) -> f64;

    #[inline]
    fn complex(z: Complex64) -> Complex<Self> {
        Complex::new(Self::cast_from(z.re), Self::cast_from(z.im))
    }

    #[inline]
    fn widen(z: Complex<Self>) -> Complex64 {
        Complex64::new(z.re.as_f64(), z.im.as_f64())
    }
}

impl Precision for f32 {
    const KIND: PrecisionKind = PrecisionKind::Single;

    #[inline]
    fn cast_from(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Precision for f64 {
    const KIND: PrecisionKind = PrecisionKind::Double;

    #[inline]
    fn cast_from(v: f64) -> Self {
        v
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("complex64".parse::<PrecisionKind>().unwrap(), PrecisionKind::Single);
        assert_eq!("c128".parse::<PrecisionKind>().unwrap(), PrecisionKind::Double);
        assert!(matches!(
            "float16".parse::<PrecisionKind>(),
            Err(StateError::UnsupportedPrecision(_))
        ));
    }

    #[test]
    fn test_amplitude_bytes() {
        assert_eq!(PrecisionKind::Single.amplitude_bytes(), 8);
        assert_eq!(PrecisionKind::Double.amplitude_bytes(), 16);
        assert_eq!(f32::KIND, PrecisionKind::Single);
    }
}
