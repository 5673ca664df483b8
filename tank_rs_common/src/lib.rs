//! Array archive support for tank_rs.
//!
//! Model fixtures in the tank are stored in numpy's formats: single arrays in `.npy`
//! files and ordered collections of named arrays in `.npz` zip archives.

mod dtype;
mod error;
mod npy;
mod npz;

pub use dtype::{DType, Endian, NpyElement};
pub use error::{NpyError, Result};
pub use npy::NpyArray;
pub use npz::{NpzArchive, NpzWriter};
