use crate::err::{ArscError, Result};
use crate::utils::ByteCursor;

use log::trace;
use std::fmt;

pub const CHUNK_HEADER_SIZE: usize = 8;

/// The kind of a chunk, as found in the first `u16` of every chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkType {
    Null,
    StringPool,
    Table,
    Package,
    Type,
    TypeSpec,
    Library,
    Overlayable,
    OverlayablePolicy,
    StagedAlias,
    Unknown(u16),
    /// Returned instead of an error when the stream has no room left for another header.
    Eof,
}

impl ChunkType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0000 => ChunkType::Null,
            0x0001 => ChunkType::StringPool,
            0x0002 => ChunkType::Table,
            0x0200 => ChunkType::Package,
            0x0201 => ChunkType::Type,
            0x0202 => ChunkType::TypeSpec,
            0x0203 => ChunkType::Library,
            0x0204 => ChunkType::Overlayable,
            0x0205 => ChunkType::OverlayablePolicy,
            0x0206 => ChunkType::StagedAlias,
            other => ChunkType::Unknown(other),
        }
    }

    /// Numeric code; `-1` for the end-of-stream sentinel.
    pub fn code(self) -> i32 {
        match self {
            ChunkType::Null => 0x0000,
            ChunkType::StringPool => 0x0001,
            ChunkType::Table => 0x0002,
            ChunkType::Package => 0x0200,
            ChunkType::Type => 0x0201,
            ChunkType::TypeSpec => 0x0202,
            ChunkType::Library => 0x0203,
            ChunkType::Overlayable => 0x0204,
            ChunkType::OverlayablePolicy => 0x0205,
            ChunkType::StagedAlias => 0x0206,
            ChunkType::Unknown(other) => i32::from(other),
            ChunkType::Eof => -1,
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkType::Eof => write!(f, "NONE"),
            ChunkType::Unknown(code) => write!(f, "UNKNOWN(0x{code:04x})"),
            other => write!(f, "{:?}(0x{:04x})", other, other.code()),
        }
    }
}

/// The common 8 byte header every chunk starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_type: ChunkType,
    pub header_size: u16,
    pub chunk_size: u32,
    /// Absolute offset of the first header byte.
    pub start: usize,
}

impl ChunkHeader {
    /// Read the next chunk header.
    ///
    /// Running out of input is not an error here: the caller gets a header of type
    /// [`ChunkType::Eof`] and decides whether that is acceptable.
    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> Result<ChunkHeader> {
        let start = cursor.pos();
        if cursor.remaining() < CHUNK_HEADER_SIZE {
            trace!("Offset `0x{start:08x}`: end of stream");
            return Ok(ChunkHeader {
                chunk_type: ChunkType::Eof,
                header_size: 0,
                chunk_size: 0,
                start,
            });
        }

        let chunk_type = ChunkType::from_u16(cursor.u16_named("chunk type")?);
        let header_size = cursor.u16_named("chunk header size")?;
        let chunk_size = cursor.u32_named("chunk size")?;

        trace!(
            "Offset `0x{start:08x}`: chunk {chunk_type} (header {header_size}, size {chunk_size})"
        );

        Ok(ChunkHeader {
            chunk_type,
            header_size,
            chunk_size,
            start,
        })
    }

    /// Read the next chunk header and require it to be of type `expected`.
    pub(crate) fn read_expecting(
        cursor: &mut ByteCursor<'_>,
        expected: ChunkType,
    ) -> Result<ChunkHeader> {
        let header = Self::read(cursor)?;
        header.expect(expected)?;
        Ok(header)
    }

    pub fn expect(&self, expected: ChunkType) -> Result<()> {
        if self.chunk_type != expected {
            return Err(ArscError::InvalidChunkType {
                expected,
                found: self.chunk_type,
                offset: self.start as u64,
            });
        }
        Ok(())
    }

    /// Absolute offset one past the last byte of this chunk.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.chunk_size as usize)
    }

    /// Absolute offset of the chunk body (just past the declared header).
    pub fn body_start(&self) -> usize {
        self.start.saturating_add(usize::from(self.header_size))
    }

    pub fn is_eof(&self) -> bool {
        self.chunk_type == ChunkType::Eof
    }
}
