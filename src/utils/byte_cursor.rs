use crate::err::Result;
use crate::utils::bytes;
use crate::utils::decode_utf16le_bytes_z;

use log::warn;

/// A lightweight cursor over an immutable byte slice.
///
/// This is the slice/offset equivalent of `Cursor<&[u8]>`. Every chunk of a resource table is
/// located by absolute offsets (chunk start + header-declared sizes), so the cursor exposes its
/// position directly and lets callers jump to wherever a header says the next structure is.
///
/// All reads are little-endian and advance the cursor on success.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    #[inline]
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub(crate) fn buf(&self) -> &'a [u8] {
        self.buf
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn position(&self) -> u64 {
        self.pos as u64
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    #[inline]
    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    #[inline]
    pub(crate) fn set_pos(&mut self, pos: usize, what: &'static str) -> Result<()> {
        let _ = bytes::slice_r(self.buf, pos, 0, what)?;
        self.pos = pos;
        Ok(())
    }

    #[inline]
    pub(crate) fn advance(&mut self, n: usize, what: &'static str) -> Result<()> {
        let new_pos = self
            .pos
            .checked_add(n)
            .ok_or_else(|| bytes::truncated(what, self.pos, n, self.buf.len()))?;
        if new_pos > self.buf.len() {
            return Err(bytes::truncated(what, self.pos, n, self.buf.len()));
        }
        self.pos = new_pos;
        Ok(())
    }

    #[inline]
    pub(crate) fn take_bytes(&mut self, len: usize, what: &'static str) -> Result<&'a [u8]> {
        let out = bytes::slice_r(self.buf, self.pos, len, what)?;
        self.pos += len;
        Ok(out)
    }

    #[inline]
    pub(crate) fn u8_named(&mut self, what: &'static str) -> Result<u8> {
        let b = bytes::read_u8(self.buf, self.pos)
            .ok_or_else(|| bytes::truncated(what, self.pos, 1, self.buf.len()))?;
        self.pos += 1;
        Ok(b)
    }

    #[inline]
    pub(crate) fn u16_named(&mut self, what: &'static str) -> Result<u16> {
        let v = bytes::read_u16_le_r(self.buf, self.pos, what)?;
        self.pos += 2;
        Ok(v)
    }

    #[inline]
    pub(crate) fn i16_named(&mut self, what: &'static str) -> Result<i16> {
        Ok(self.u16_named(what)? as i16)
    }

    #[inline]
    pub(crate) fn u32_named(&mut self, what: &'static str) -> Result<u32> {
        let v = bytes::read_u32_le_r(self.buf, self.pos, what)?;
        self.pos += 4;
        Ok(v)
    }

    pub(crate) fn u32_vec(&mut self, count: usize, what: &'static str) -> Result<Vec<u32>> {
        let out = bytes::read_u32_vec_le_r(self.buf, self.pos, count, what)?;
        self.pos += count * 4;
        Ok(out)
    }

    pub(crate) fn u16_vec(&mut self, count: usize, what: &'static str) -> Result<Vec<u16>> {
        let out = bytes::read_u16_vec_le_r(self.buf, self.pos, count, what)?;
        self.pos += count * 2;
        Ok(out)
    }

    /// Read a fixed-width block of `char_count` UTF-16 code units and decode it up to the first
    /// NUL. The whole block is consumed regardless of where the NUL is.
    pub(crate) fn utf16_fixed_z(&mut self, char_count: usize, what: &'static str) -> Result<String> {
        let start = self.pos;
        let raw = self.take_bytes(char_count * 2, what)?;
        match decode_utf16le_bytes_z(raw) {
            Ok(name) => Ok(name),
            Err(_) => {
                let units = bytes::read_u16_vec_le_r(raw, 0, char_count, what)?;
                let end = units.iter().position(|&c| c == 0).unwrap_or(units.len());
                warn!("Offset `0x{start:08x}`: {what} is not valid UTF-16, decoding lossily");
                Ok(String::from_utf16_lossy(&units[..end]))
            }
        }
    }

    /// Read a fixed-width block of `len` bytes as ASCII, stopping at the first NUL.
    pub(crate) fn ascii_fixed_z(&mut self, len: usize, what: &'static str) -> Result<String> {
        let bytes = self.take_bytes(len, what)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(bytes[..end].iter().map(|&b| b as char).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_tracks_consumed_bytes() {
        let buf = [0x02, 0x00, 0x0c, 0x00, 0x10, 0x00, 0x00, 0x00, 0xff];
        let mut cursor = ByteCursor::new(&buf);

        assert_eq!(cursor.u16_named("type").unwrap(), 2);
        assert_eq!(cursor.u16_named("header size").unwrap(), 12);
        assert_eq!(cursor.u32_named("size").unwrap(), 16);
        assert_eq!(cursor.pos(), 8);
        assert_eq!(cursor.remaining(), 1);

        assert!(cursor.u16_named("past the end").is_err());
        // A failed read leaves the position untouched.
        assert_eq!(cursor.pos(), 8);
        assert_eq!(cursor.u8_named("tail").unwrap(), 0xff);
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_set_pos_allows_eof_but_not_beyond() {
        let buf = [0u8; 4];
        let mut cursor = ByteCursor::new(&buf);
        assert!(cursor.set_pos(4, "eof").is_ok());
        assert!(cursor.set_pos(5, "beyond").is_err());
        assert!(cursor.advance(1, "beyond").is_err());
    }

    #[test]
    fn test_fixed_width_utf16_name_with_lone_surrogate_is_lossy() {
        let mut buf = vec![0u8; 8];
        buf[0] = b'a';
        buf[2..4].copy_from_slice(&0xD800u16.to_le_bytes());
        buf[4] = b'b';
        let mut cursor = ByteCursor::new(&buf);

        assert_eq!(
            cursor.utf16_fixed_z(4, "package name").unwrap(),
            "a\u{FFFD}b"
        );
        assert_eq!(cursor.pos(), 8);
    }

    #[test]
    fn test_fixed_width_utf16_name_stops_at_nul() {
        let mut buf = Vec::new();
        for unit in "app".encode_utf16() {
            buf.extend_from_slice(&unit.to_le_bytes());
        }
        buf.resize(16, 0);
        buf.push(0x42);

        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.utf16_fixed_z(8, "name").unwrap(), "app");
        assert_eq!(cursor.pos(), 16);
    }
}
