//! Byte-slice utilities for bounds-oriented parsing.
//!
//! There are two layers:
//! - **Option layer** (`read_*`): helpers that return `Option<T>`.
//! - **Result layer** (`*_r`): wrappers that map `None` to `ArscError::Truncated`.
//!
//! All numeric reads are **little-endian** (every ARSC structure is LE), and offsets are
//! interpreted relative to the slice you pass in.

use crate::err::ArscError;
use byteorder::{ByteOrder, LittleEndian};

/// Borrow `len` bytes at `offset`, returning `None` if the range is out of bounds.
pub(crate) fn slice(buf: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    let end = offset.checked_add(len)?;
    buf.get(offset..end)
}

/// Read a single byte at `offset`.
pub(crate) fn read_u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

/// Read a `u16` (little-endian) at `offset`.
pub(crate) fn read_u16_le(buf: &[u8], offset: usize) -> Option<u16> {
    slice(buf, offset, 2).map(LittleEndian::read_u16)
}

/// Read a `u32` (little-endian) at `offset`.
pub(crate) fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    slice(buf, offset, 4).map(LittleEndian::read_u32)
}

#[inline]
pub(crate) fn truncated(what: &'static str, offset: usize, need: usize, len: usize) -> ArscError {
    ArscError::Truncated {
        what,
        offset: offset as u64,
        need,
        have: len.saturating_sub(offset),
    }
}

pub(crate) fn slice_r<'a>(
    buf: &'a [u8],
    offset: usize,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8], ArscError> {
    slice(buf, offset, len).ok_or_else(|| truncated(what, offset, len, buf.len()))
}

/// Read a `u16` (little-endian) at `offset`, or return `ArscError::Truncated`.
pub(crate) fn read_u16_le_r(buf: &[u8], offset: usize, what: &'static str) -> Result<u16, ArscError> {
    read_u16_le(buf, offset).ok_or_else(|| truncated(what, offset, 2, buf.len()))
}

/// Read a `u32` (little-endian) at `offset`, or return `ArscError::Truncated`.
pub(crate) fn read_u32_le_r(buf: &[u8], offset: usize, what: &'static str) -> Result<u32, ArscError> {
    read_u32_le(buf, offset).ok_or_else(|| truncated(what, offset, 4, buf.len()))
}

/// Read a `count`-element `u32` (little-endian) table at `offset`.
///
/// This does a single bounds check for the whole table and then decodes it in one go.
pub(crate) fn read_u32_vec_le_r(
    buf: &[u8],
    offset: usize,
    count: usize,
    what: &'static str,
) -> Result<Vec<u32>, ArscError> {
    let len = count
        .checked_mul(4)
        .ok_or_else(|| truncated(what, offset, usize::MAX, buf.len()))?;
    let bytes = slice_r(buf, offset, len, what)?;

    let mut out = vec![0u32; count];
    LittleEndian::read_u32_into(bytes, &mut out);
    Ok(out)
}

/// Read a `count`-element `u16` (little-endian) table at `offset`.
pub(crate) fn read_u16_vec_le_r(
    buf: &[u8],
    offset: usize,
    count: usize,
    what: &'static str,
) -> Result<Vec<u16>, ArscError> {
    let len = count
        .checked_mul(2)
        .ok_or_else(|| truncated(what, offset, usize::MAX, buf.len()))?;
    let bytes = slice_r(buf, offset, len, what)?;

    let mut out = vec![0u16; count];
    LittleEndian::read_u16_into(bytes, &mut out);
    Ok(out)
}
