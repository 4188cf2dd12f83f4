//! Bounds-checked, big-endian accessors over a read-only byte slice.
//!
//! Mirrors the shape of `object`'s `Bytes`/`ReadRef` wrapper, but specialized
//! to the one layout this tool ever reads (ELF32, big-endian), so every
//! accessor is a plain checked slice read instead of an unsafe `Pod` cast.

use crate::error::{Error, Result};

#[derive(Clone, Copy)]
pub struct Reader<'data> {
    data: &'data [u8],
}

impl<'data> Reader<'data> {
    pub fn new(data: &'data [u8]) -> Self {
        Reader { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        self.data
            .get(offset)
            .copied()
            .ok_or_else(|| Error::invalid_input("read past end of file"))
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16> {
        let bytes = self
            .data
            .get(offset..offset + 2)
            .ok_or_else(|| Error::invalid_input("read past end of file"))?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32> {
        let bytes = self
            .data
            .get(offset..offset + 4)
            .ok_or_else(|| Error::invalid_input("read past end of file"))?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn slice_at(&self, offset: usize, len: usize) -> Result<&'data [u8]> {
        self.data
            .get(offset..offset + len)
            .ok_or_else(|| Error::invalid_input("read past end of file"))
    }

    /// Reads a NUL-terminated string starting at `offset` out of a string table.
    pub fn str_at(&self, offset: usize) -> Result<&'data [u8]> {
        let rest = self
            .data
            .get(offset..)
            .ok_or_else(|| Error::invalid_input("string offset past end of file"))?;
        let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        Ok(&rest[..end])
    }
}
