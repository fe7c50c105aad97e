//! Byte cursor utilities for parsing the chart and audio containers.
//!
//! This module provides `ByteCursor`, a position-tracking reader over an
//! immutable byte slice, together with the NUL-terminated text helpers used
//! for the fixed-width string fields of the chart header.

use encoding_rs::Encoding;
use tracing::debug;

use crate::error::{Error, Result};

/// A position-tracking reader over a fixed byte buffer.
///
/// Sequential reads advance the cursor; the `*_at` variants read at an
/// absolute offset and leave the position alone. All reads are bounds
/// checked and fail with [`Error::OutOfBounds`] instead of panicking.
///
/// # Example
///
/// ```
/// use o2jam_core::bytes::ByteCursor;
///
/// let data = [0x78, 0x56, 0x34, 0x12, 0x00, 0x00, 0x80, 0x3F];
/// let mut cursor = ByteCursor::new(&data);
///
/// assert_eq!(cursor.read_u32().unwrap(), 0x12345678);
/// assert_eq!(cursor.read_f32().unwrap(), 1.0);
/// assert_eq!(cursor.position(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a new cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of bytes remaining from the current position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Skips the specified number of bytes.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    /// Returns `len` bytes at `offset` without advancing the position.
    pub fn slice_at(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| self.out_of_bounds(offset, len))?;
        if end > self.data.len() {
            return Err(self.out_of_bounds(offset, len));
        }
        Ok(&self.data[offset..end])
    }

    /// Reads the specified number of bytes and advances the position.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.slice_at(self.pos, count)?;
        self.pos += count;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn array_at<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let bytes = self.slice_at(offset, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads an unsigned 16-bit integer (little-endian) and advances the position.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Reads an unsigned 32-bit integer (little-endian) and advances the position.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Reads an IEEE-754 single (little-endian) and advances the position.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u16_at(&self, offset: usize) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array_at(offset)?))
    }

    pub fn read_u32_at(&self, offset: usize) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array_at(offset)?))
    }

    pub fn read_f32_at(&self, offset: usize) -> Result<f32> {
        Ok(f32::from_le_bytes(self.array_at(offset)?))
    }

    fn out_of_bounds(&self, offset: usize, len: usize) -> Error {
        Error::OutOfBounds {
            offset,
            len,
            size: self.data.len(),
        }
    }
}

/// Returns the portion of `bytes` before the first NUL.
///
/// Fixed-width fields often carry leftover garbage after the terminator,
/// so everything past it is discarded rather than filtered.
pub fn nul_terminated(bytes: &[u8]) -> &[u8] {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..len]
}

/// Decodes a NUL-terminated field with `encoding`, trimming surrounding whitespace.
///
/// Leading bytes are never sniffed as a BOM. Returns the text and whether
/// any malformed sequences were replaced.
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> (String, bool) {
    let bytes = nul_terminated(bytes);
    let (decoded, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        debug!(
            "{} decoding had errors for bytes: {:?}",
            encoding.name(),
            &bytes[..bytes.len().min(20)]
        );
    }
    (decoded.trim().to_string(), had_errors)
}
