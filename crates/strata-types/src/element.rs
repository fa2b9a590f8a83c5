use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Element kind of a numeric array.
///
/// Names follow the numpy dtype names (`"uint8"`, `"complex128"`, ...) since
/// those are the strings recorded in stored element-kind attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    Bool,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float16,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl ElementKind {
    /// Every element kind, in declaration order.
    pub const ALL: [ElementKind; 14] = [
        Self::Bool,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Float16,
        Self::Float32,
        Self::Float64,
        Self::Complex64,
        Self::Complex128,
    ];

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
        }
    }

    /// Size of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::Bool | Self::UInt8 | Self::Int8 => 1,
            Self::UInt16 | Self::Int16 | Self::Float16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 => 4,
            Self::UInt64 | Self::Int64 | Self::Float64 | Self::Complex64 => 8,
            Self::Complex128 => 16,
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex64 | Self::Complex128)
    }

    /// The real kind with the same component width (`complex64` -> `float32`).
    /// Non-complex kinds map to themselves.
    pub fn real_counterpart(&self) -> Self {
        match self {
            Self::Complex64 => Self::Float32,
            Self::Complex128 => Self::Float64,
            other => *other,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| TypeError::UnknownElementKind(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Element scalar types
// ---------------------------------------------------------------------------

/// A complex number with independent real and imaginary parts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T> Complex<T> {
    pub fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
}

/// IEEE 754 half-precision value carried as its raw bit pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Float16(pub u16);

impl Float16 {
    pub fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub fn to_bits(self) -> u16 {
        self.0
    }
}

/// A Rust type that can be stored as one element of a [`NumericArray`].
///
/// Elements are packed little-endian.
///
/// [`NumericArray`]: crate::NumericArray
pub trait Element: Copy {
    const KIND: ElementKind;

    fn write_le(&self, out: &mut Vec<u8>);

    /// Decode from exactly `KIND.size()` bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

impl Element for bool {
    const KIND: ElementKind = ElementKind::Bool;

    fn write_le(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

macro_rules! primitive_element {
    ($ty:ty, $kind:ident) => {
        impl Element for $ty {
            const KIND: ElementKind = ElementKind::$kind;

            fn write_le(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                <$ty>::from_le_bytes(raw)
            }
        }
    };
}

primitive_element!(u8, UInt8);
primitive_element!(u16, UInt16);
primitive_element!(u32, UInt32);
primitive_element!(u64, UInt64);
primitive_element!(i8, Int8);
primitive_element!(i16, Int16);
primitive_element!(i32, Int32);
primitive_element!(i64, Int64);
primitive_element!(f32, Float32);
primitive_element!(f64, Float64);

impl Element for Float16 {
    const KIND: ElementKind = ElementKind::Float16;

    fn write_le(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        Self(u16::read_le(bytes))
    }
}

impl Element for Complex<f32> {
    const KIND: ElementKind = ElementKind::Complex64;

    fn write_le(&self, out: &mut Vec<u8>) {
        self.re.write_le(out);
        self.im.write_le(out);
    }

    fn read_le(bytes: &[u8]) -> Self {
        Self::new(f32::read_le(&bytes[..4]), f32::read_le(&bytes[4..8]))
    }
}

impl Element for Complex<f64> {
    const KIND: ElementKind = ElementKind::Complex128;

    fn write_le(&self, out: &mut Vec<u8>) {
        self.re.write_le(out);
        self.im.write_le(out);
    }

    fn read_le(bytes: &[u8]) -> Self {
        Self::new(f64::read_le(&bytes[..8]), f64::read_le(&bytes[8..16]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip_through_from_str() {
        for kind in ElementKind::ALL {
            let parsed: ElementKind = kind.name().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "float128".parse::<ElementKind>().unwrap_err();
        assert_eq!(err, TypeError::UnknownElementKind("float128".into()));
    }

    #[test]
    fn complex_kinds_demote_to_matching_float() {
        assert_eq!(ElementKind::Complex64.real_counterpart(), ElementKind::Float32);
        assert_eq!(ElementKind::Complex128.real_counterpart(), ElementKind::Float64);
        assert_eq!(ElementKind::Int16.real_counterpart(), ElementKind::Int16);
    }

    #[test]
    fn sizes_match_rust_types() {
        assert_eq!(ElementKind::Complex128.size(), 16);
        assert_eq!(ElementKind::Float16.size(), 2);
        assert_eq!(ElementKind::Bool.size(), 1);
    }

    #[test]
    fn complex_packing_keeps_nan_bits() {
        let value = Complex::new(f64::NAN, 2.5);
        let mut buf = Vec::new();
        value.write_le(&mut buf);
        assert_eq!(buf.len(), 16);
        let back = Complex::<f64>::read_le(&buf);
        assert!(back.re.is_nan());
        assert_eq!(back.re.to_bits(), f64::NAN.to_bits());
        assert_eq!(back.im, 2.5);
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(format!("{}", ElementKind::UInt64), "uint64");
    }
}
