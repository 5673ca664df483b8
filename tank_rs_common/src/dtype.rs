use std::fmt::Display;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use half::f16;

use crate::{NpyError, Result};

/// Element type of an array, as described by the `descr` field of an npy header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F16,
    F32,
    F64,
    /// Fixed width UTF-32 text, width in characters.
    Unicode(usize),
    /// Fixed width byte string, width in bytes.
    Bytes(usize),
}

/// Byte order of the stored elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
    NotApplicable,
}

impl DType {
    /// Size in bytes of one element. Saturates for text widths that do not fit a `usize`,
    /// which `parse_descr` never produces.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::F16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::Unicode(n) => n.saturating_mul(4),
            Self::Bytes(n) => *n,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Unicode(_) | Self::Bytes(_))
    }

    /// Parse a descriptor such as `<f4`, `|b1` or `<U12`.
    pub fn parse_descr(descr: &str) -> Result<(Self, Endian)> {
        let unsupported = || NpyError::UnsupportedDType(descr.to_string());
        let mut chars = descr.chars();
        let endian = match chars.next().ok_or_else(unsupported)? {
            '<' => Endian::Little,
            '>' => Endian::Big,
            '|' => Endian::NotApplicable,
            '=' if cfg!(target_endian = "big") => Endian::Big,
            '=' => Endian::Little,
            _ => return Err(unsupported()),
        };
        let kind = chars.next().ok_or_else(unsupported)?;
        let size: usize = chars.as_str().parse().map_err(|_| unsupported())?;
        let dtype = match (kind, size) {
            ('b', 1) => Self::Bool,
            ('u', 1) => Self::U8,
            ('i', 1) => Self::I8,
            ('u', 2) => Self::U16,
            ('i', 2) => Self::I16,
            ('u', 4) => Self::U32,
            ('i', 4) => Self::I32,
            ('u', 8) => Self::U64,
            ('i', 8) => Self::I64,
            ('f', 2) => Self::F16,
            ('f', 4) => Self::F32,
            ('f', 8) => Self::F64,
            ('U', n) if n.checked_mul(4).is_some() => Self::Unicode(n),
            ('S', n) => Self::Bytes(n),
            _ => return Err(unsupported()),
        };
        Ok((dtype, endian))
    }

    /// Descriptor used when writing. Multi-byte types are always little-endian.
    pub fn descr(&self) -> String {
        match self {
            Self::Bool => "|b1".to_string(),
            Self::U8 => "|u1".to_string(),
            Self::I8 => "|i1".to_string(),
            Self::Bytes(n) => format!("|S{n}"),
            Self::Unicode(n) => format!("<U{n}"),
            other => format!("<{}{}", other.kind(), other.size_in_bytes()),
        }
    }

    fn kind(&self) -> char {
        match self {
            Self::Bool => 'b',
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => 'u',
            Self::I8 | Self::I16 | Self::I32 | Self::I64 => 'i',
            Self::F16 | Self::F32 | Self::F64 => 'f',
            Self::Unicode(_) => 'U',
            Self::Bytes(_) => 'S',
        }
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::U8 => write!(f, "uint8"),
            Self::I8 => write!(f, "int8"),
            Self::U16 => write!(f, "uint16"),
            Self::I16 => write!(f, "int16"),
            Self::U32 => write!(f, "uint32"),
            Self::I32 => write!(f, "int32"),
            Self::U64 => write!(f, "uint64"),
            Self::I64 => write!(f, "int64"),
            Self::F16 => write!(f, "float16"),
            Self::F32 => write!(f, "float32"),
            Self::F64 => write!(f, "float64"),
            Self::Unicode(n) => write!(f, "str{n}"),
            Self::Bytes(n) => write!(f, "bytes{n}"),
        }
    }
}

/// A numeric element type which can be extracted from, or stored into, an array.
pub trait NpyElement: Copy {
    const DTYPE: DType;
    const NAME: &'static str;

    /// Decode one element from exactly `DTYPE.size_in_bytes()` bytes.
    fn decode(bytes: &[u8], endian: Endian) -> Self;

    /// Append the little-endian encoding of this element.
    fn encode(self, out: &mut Vec<u8>);
}

macro_rules! impl_npy_element {
    ($ty:ty, $dtype:expr, $name:literal, $read:ident, $write:ident) => {
        impl NpyElement for $ty {
            const DTYPE: DType = $dtype;
            const NAME: &'static str = $name;

            fn decode(bytes: &[u8], endian: Endian) -> Self {
                match endian {
                    Endian::Big => BigEndian::$read(bytes),
                    Endian::Little | Endian::NotApplicable => LittleEndian::$read(bytes),
                }
            }

            fn encode(self, out: &mut Vec<u8>) {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                LittleEndian::$write(&mut buf, self);
                out.extend_from_slice(&buf);
            }
        }
    };
}

impl_npy_element!(u16, DType::U16, "uint16", read_u16, write_u16);
impl_npy_element!(i16, DType::I16, "int16", read_i16, write_i16);
impl_npy_element!(u32, DType::U32, "uint32", read_u32, write_u32);
impl_npy_element!(i32, DType::I32, "int32", read_i32, write_i32);
impl_npy_element!(u64, DType::U64, "uint64", read_u64, write_u64);
impl_npy_element!(i64, DType::I64, "int64", read_i64, write_i64);
impl_npy_element!(f32, DType::F32, "float32", read_f32, write_f32);
impl_npy_element!(f64, DType::F64, "float64", read_f64, write_f64);

impl NpyElement for u8 {
    const DTYPE: DType = DType::U8;
    const NAME: &'static str = "uint8";

    fn decode(bytes: &[u8], _: Endian) -> Self {
        bytes[0]
    }

    fn encode(self, out: &mut Vec<u8>) {
        out.push(self);
    }
}

impl NpyElement for i8 {
    const DTYPE: DType = DType::I8;
    const NAME: &'static str = "int8";

    #[allow(clippy::cast_possible_wrap)]
    fn decode(bytes: &[u8], _: Endian) -> Self {
        bytes[0] as i8
    }

    #[allow(clippy::cast_sign_loss)]
    fn encode(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }
}

impl NpyElement for bool {
    const DTYPE: DType = DType::Bool;
    const NAME: &'static str = "bool";

    fn decode(bytes: &[u8], _: Endian) -> Self {
        bytes[0] != 0
    }

    fn encode(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }
}

impl NpyElement for f16 {
    const DTYPE: DType = DType::F16;
    const NAME: &'static str = "float16";

    fn decode(bytes: &[u8], endian: Endian) -> Self {
        f16::from_bits(u16::decode(bytes, endian))
    }

    fn encode(self, out: &mut Vec<u8>) {
        self.to_bits().encode(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_descriptors() -> Result<()> {
        assert_eq!(DType::parse_descr("<f4")?, (DType::F32, Endian::Little));
        assert_eq!(DType::parse_descr(">i8")?, (DType::I64, Endian::Big));
        assert_eq!(DType::parse_descr("|b1")?, (DType::Bool, Endian::NotApplicable));
        assert_eq!(DType::parse_descr("<U64")?, (DType::Unicode(64), Endian::Little));
        assert_eq!(DType::parse_descr("|S7")?, (DType::Bytes(7), Endian::NotApplicable));
        Ok(())
    }

    #[test]
    fn rejects_object_and_complex() {
        assert!(matches!(
            DType::parse_descr("|O"),
            Err(NpyError::UnsupportedDType(_))
        ));
        assert!(matches!(
            DType::parse_descr("<c8"),
            Err(NpyError::UnsupportedDType(_))
        ));
    }

    #[test]
    fn rejects_text_width_past_usize() {
        let descr = format!("<U{}", usize::MAX / 2);
        assert!(matches!(
            DType::parse_descr(&descr),
            Err(NpyError::UnsupportedDType(_))
        ));
        assert_eq!(DType::Unicode(usize::MAX).size_in_bytes(), usize::MAX);
    }

    #[test]
    fn descr_matches_numpy_spelling() {
        assert_eq!(DType::F16.descr(), "<f2");
        assert_eq!(DType::I32.descr(), "<i4");
        assert_eq!(DType::U8.descr(), "|u1");
        assert_eq!(DType::Unicode(3).descr(), "<U3");
        assert_eq!(DType::Unicode(3).size_in_bytes(), 12);
    }

    #[test]
    fn big_endian_decode() {
        assert_eq!(f32::decode(&[0x3f, 0x80, 0, 0], Endian::Big), 1.0);
        assert_eq!(f32::decode(&[0, 0, 0x80, 0x3f], Endian::Little), 1.0);
    }
}
