//! Reading and writing single arrays in the `.npy` format.
//!
//! Layout of a file:
//! - 6 byte magic string `\x93NUMPY`
//! - major and minor version bytes
//! - header length, a little-endian `u16` for version 1.0 and a `u32` for 2.0 and 3.0
//! - header, a Python dict literal with the keys `descr`, `fortran_order` and `shape`
//! - raw element data

use std::{
    fmt::Debug,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{DType, Endian, NpyElement, NpyError, Result};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const HEADER_ALIGN: usize = 64;

/// An array read from (or destined for) an `.npy` file.
///
/// Element data is kept in storage order. For `fortran_order` arrays this is column major.
#[derive(Clone, PartialEq)]
pub struct NpyArray {
    dtype: DType,
    endian: Endian,
    shape: Vec<usize>,
    fortran_order: bool,
    data: Vec<u8>,
}

impl Debug for NpyArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NpyArray")
            .field("dtype", &self.dtype)
            .field("shape", &self.shape)
            .field("fortran_order", &self.fortran_order)
            .finish()
    }
}

#[derive(Debug, PartialEq)]
struct Header {
    descr: String,
    fortran_order: bool,
    shape: Vec<usize>,
}

/// Slice of the header which follows `key` and its colon.
fn value_after_key<'a>(header: &'a str, key: &str) -> Result<&'a str> {
    let start = [format!("'{key}'"), format!("\"{key}\"")]
        .iter()
        .find_map(|quoted| header.find(quoted.as_str()).map(|i| i + quoted.len()))
        .ok_or_else(|| NpyError::MalformedHeader(format!("missing key `{key}`")))?;
    header[start..]
        .trim_start()
        .strip_prefix(':')
        .map(str::trim_start)
        .ok_or_else(|| NpyError::MalformedHeader(format!("expected `:` after `{key}`")))
}

fn parse_header(header: &str) -> Result<Header> {
    let header = header.trim();
    if !header.starts_with('{') || !header.ends_with('}') {
        return Err(NpyError::MalformedHeader(
            "header is not a dict literal".to_string(),
        ));
    }

    let descr_value = value_after_key(header, "descr")?;
    let descr = match descr_value.chars().next() {
        Some(quote @ ('\'' | '"')) => {
            let rest = &descr_value[1..];
            let end = rest.find(quote).ok_or_else(|| {
                NpyError::MalformedHeader("unterminated `descr` string".to_string())
            })?;
            rest[..end].to_string()
        }
        // Structured dtypes are spelled as a list of fields.
        Some('[') => return Err(NpyError::UnsupportedDType("structured dtype".to_string())),
        _ => return Err(NpyError::MalformedHeader("bad `descr` value".to_string())),
    };

    let fortran_value = value_after_key(header, "fortran_order")?;
    let fortran_order = if fortran_value.starts_with("True") {
        true
    } else if fortran_value.starts_with("False") {
        false
    } else {
        return Err(NpyError::MalformedHeader(
            "bad `fortran_order` value".to_string(),
        ));
    };

    let shape_value = value_after_key(header, "shape")?;
    let shape_body = shape_value
        .strip_prefix('(')
        .and_then(|rest| rest.find(')').map(|end| &rest[..end]))
        .ok_or_else(|| NpyError::MalformedHeader("bad `shape` value".to_string()))?;
    let shape = shape_body
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|e| NpyError::MalformedHeader(format!("bad dimension `{dim}`: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Header {
        descr,
        fortran_order,
        shape,
    })
}

fn format_shape(shape: &[usize]) -> String {
    match shape {
        [] => "()".to_string(),
        [n] => format!("({n},)"),
        dims => format!(
            "({})",
            dims.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

impl NpyArray {
    /// Build an array from elements in row major order.
    pub fn from_vec<T: NpyElement>(shape: Vec<usize>, values: Vec<T>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(NpyError::ShapeMismatch(values.len(), shape));
        }
        let mut data = Vec::with_capacity(values.len() * T::DTYPE.size_in_bytes());
        for v in values {
            v.encode(&mut data);
        }
        let endian = if T::DTYPE.size_in_bytes() == 1 {
            Endian::NotApplicable
        } else {
            Endian::Little
        };
        Ok(Self {
            dtype: T::DTYPE,
            endian,
            shape,
            fortran_order: false,
            data,
        })
    }

    /// A zero dimensional text array, which is what `np.save(path, "some string")` produces.
    pub fn from_text(text: &str) -> Self {
        let chars = text.chars().collect::<Vec<_>>();
        let mut data = Vec::with_capacity(chars.len() * 4);
        for c in &chars {
            u32::from(*c).encode(&mut data);
        }
        Self {
            dtype: DType::Unicode(chars.len()),
            endian: Endian::Little,
            shape: Vec::new(),
            fortran_order: false,
            data,
        }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn fortran_order(&self) -> bool {
        self.fortran_order
    }

    /// Number of elements. A zero dimensional array holds one element.
    pub fn elem_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Raw element bytes in the stored byte order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Extract all elements as `T`. The array dtype must be exactly `T`'s dtype.
    pub fn to_vec<T: NpyElement>(&self) -> Result<Vec<T>> {
        if self.dtype != T::DTYPE {
            return Err(NpyError::DTypeMismatch {
                expected: T::NAME,
                got: self.dtype,
            });
        }
        Ok(self
            .data
            .chunks_exact(self.dtype.size_in_bytes())
            .map(|chunk| T::decode(chunk, self.endian))
            .collect())
    }

    /// Extract the single element of a scalar (or one element) array.
    pub fn to_scalar<T: NpyElement>(&self) -> Result<T> {
        match self.to_vec::<T>()?.as_slice() {
            [v] => Ok(*v),
            _ => Err(NpyError::NotAScalar(self.shape.clone())),
        }
    }

    /// Decode every element of a text array. Trailing NULs are padding and are removed.
    pub fn to_strings(&self) -> Result<Vec<String>> {
        let width = self.dtype.size_in_bytes();
        match self.dtype {
            // Zero width strings have no data at all.
            DType::Unicode(0) | DType::Bytes(0) => Ok(vec![String::new(); self.elem_count()]),
            DType::Unicode(_) => self
                .data
                .chunks_exact(width)
                .map(|chunk| {
                    chunk
                        .chunks_exact(4)
                        .map(|c| u32::decode(c, self.endian))
                        .take_while(|c| *c != 0)
                        .map(|c| {
                            char::from_u32(c).ok_or_else(|| {
                                NpyError::MalformedHeader(format!("invalid code point {c:#x}"))
                            })
                        })
                        .collect::<Result<String>>()
                })
                .collect(),
            DType::Bytes(_) => Ok(self
                .data
                .chunks_exact(width)
                .map(|chunk| {
                    let end = chunk.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
                    String::from_utf8_lossy(&chunk[..end]).into_owned()
                })
                .collect()),
            other => Err(NpyError::DTypeMismatch {
                expected: "str",
                got: other,
            }),
        }
    }

    /// Decode the single element of a text array.
    pub fn to_text(&self) -> Result<String> {
        let mut strings = self.to_strings()?;
        match strings.len() {
            1 => Ok(strings.remove(0)),
            _ => Err(NpyError::NotAScalar(self.shape.clone())),
        }
    }

    /// Read an array from a reader positioned at the magic string.
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let mut magic = [0u8; 6];
        r.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(NpyError::BadMagic);
        }
        let major = r.read_u8()?;
        let minor = r.read_u8()?;
        let header_len = match major {
            1 => r.read_u16::<LittleEndian>()? as usize,
            2 | 3 => r.read_u32::<LittleEndian>()? as usize,
            _ => return Err(NpyError::UnsupportedVersion { major, minor }),
        };

        let mut header = Vec::new();
        r.take(header_len as u64).read_to_end(&mut header)?;
        if header.len() != header_len {
            return Err(NpyError::Truncated {
                expected: header_len,
                got: header.len(),
            });
        }
        // Versions 1 and 2 use latin1, which is ascii for every header numpy writes.
        let header = String::from_utf8(header)
            .map_err(|e| NpyError::MalformedHeader(format!("header is not text: {e}")))?;
        let Header {
            descr,
            fortran_order,
            shape,
        } = parse_header(&header)?;
        let (dtype, endian) = DType::parse_descr(&descr)?;

        let expected = shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .and_then(|count| count.checked_mul(dtype.size_in_bytes()))
            .ok_or_else(|| {
                NpyError::MalformedHeader(format!(
                    "shape {} of {dtype} does not fit in memory",
                    format_shape(&shape)
                ))
            })?;
        // Sized by what is read, not by the header.
        let mut data = Vec::new();
        r.take(expected as u64).read_to_end(&mut data)?;
        if data.len() != expected {
            return Err(NpyError::Truncated {
                expected,
                got: data.len(),
            });
        }

        Ok(Self {
            dtype,
            endian,
            shape,
            fortran_order,
            data,
        })
    }

    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self> {
        Self::read(&mut bytes)
    }

    /// Read an array from an `.npy` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read(&mut reader)
    }

    /// Write the array in format version 1.0.
    ///
    /// Multi-byte elements stored big-endian are written with a big-endian descriptor.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        let descr = match self.endian {
            Endian::Big => self.dtype.descr().replacen('<', ">", 1),
            Endian::Little | Endian::NotApplicable => self.dtype.descr(),
        };
        let mut header = format!(
            "{{'descr': '{descr}', 'fortran_order': {}, 'shape': {}, }}",
            if self.fortran_order { "True" } else { "False" },
            format_shape(&self.shape)
        );
        // magic + version + u16 length + header + newline, padded to the alignment
        let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
        let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
        header.push_str(&" ".repeat(padding));
        header.push('\n');
        let header_len = u16::try_from(header.len())
            .map_err(|_| NpyError::MalformedHeader("header is too long".to_string()))?;

        w.write_all(MAGIC)?;
        w.write_all(&[1, 0])?;
        w.write_u16::<LittleEndian>(header_len)?;
        w.write_all(header.as_bytes())?;
        w.write_all(&self.data)?;
        Ok(())
    }

    /// Write the array to an `.npy` file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
