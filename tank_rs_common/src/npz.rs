use std::{
    fs::File,
    io::{Cursor, Read, Seek, Write},
    path::Path,
};

use memmap2::Mmap;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::{NpyArray, NpyError, Result};

const NPY_SUFFIX: &str = ".npy";

/// Archive of named arrays, i.e. a zip file of `.npy` members as written by `np.savez`.
///
/// Member order is the order in the archive's central directory, which is the insertion
/// order of the writer.
pub struct NpzArchive<R: Read + Seek = Cursor<Mmap>> {
    archive: ZipArchive<R>,
}

impl NpzArchive {
    /// Open an `.npz` file through a memory map.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::new(Cursor::new(mmap))
    }
}

fn key_for(member: &str) -> String {
    member
        .strip_suffix(NPY_SUFFIX)
        .unwrap_or(member)
        .to_string()
}

impl<R: Read + Seek> NpzArchive<R> {
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
        })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Array names in archive order, without the `.npy` suffix.
    pub fn names(&mut self) -> Result<Vec<String>> {
        (0..self.archive.len())
            .map(|i| -> Result<String> { Ok(key_for(self.archive.by_index(i)?.name())) })
            .collect()
    }

    /// Read one array by name. The `.npy` suffix may be omitted.
    pub fn by_name(&mut self, name: &str) -> Result<NpyArray> {
        let member = if name.ends_with(NPY_SUFFIX) {
            name.to_string()
        } else {
            format!("{name}{NPY_SUFFIX}")
        };
        let mut file = match self.archive.by_name(&member) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(NpyError::MissingArray(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        NpyArray::read(&mut file)
    }

    /// Read every array, in archive order.
    pub fn read_all(&mut self) -> Result<Vec<(String, NpyArray)>> {
        let mut arrays = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let mut file = self.archive.by_index(i)?;
            let name = key_for(file.name());
            arrays.push((name, NpyArray::read(&mut file)?));
        }
        Ok(arrays)
    }
}

/// Writes an uncompressed `.npz` archive.
pub struct NpzWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
}

impl NpzWriter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write + Seek> NpzWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
        }
    }

    /// Append an array. Names are stored with a `.npy` suffix, as numpy does.
    pub fn add(&mut self, name: &str, array: &NpyArray) -> Result<()> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .large_file(array.data().len() >= u32::MAX as usize);
        self.zip.start_file(format!("{name}{NPY_SUFFIX}"), options)?;
        array.write(&mut self.zip)?;
        Ok(())
    }

    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}
