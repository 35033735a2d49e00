use crate::chunk_header::ChunkType;
use crate::model::ResourceId;

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArscError>;

/// Errors raised while decoding a resource table.
///
/// Everything here aborts the decode. Anomalies the decoder can recover from are reported
/// through [`crate::Anomaly`] instead.
#[derive(Debug, Error)]
pub enum ArscError {
    #[error("buffer too small for {what} at offset {offset} (need {need} bytes, have {have})")]
    Truncated {
        what: &'static str,
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("Offset {offset}: expected chunk of type {expected}, found {found}")]
    InvalidChunkType {
        expected: ChunkType,
        found: ChunkType,
        offset: u64,
    },

    #[error("Offset {offset}: invalid string pool header `0x{found:08x}`, expected `0x001c0001`")]
    InvalidStringPoolHeader { found: u32, offset: u64 },

    #[error("Offset {offset}: entry has a negative size ({size})")]
    NegativeEntrySize { size: i16, offset: u64 },

    #[error("Offset {offset}: invalid value header (size {size}, reserved {reserved})")]
    InvalidValueHeader { size: u16, reserved: u8, offset: u64 },

    #[error("Offset {offset}: invalid value type `0x{data_type:02x}`")]
    UnknownValueType { data_type: u8, offset: u64 },

    #[error("unsupported res type name for bags: `{type_name}`")]
    UnsupportedBagType { type_name: String },

    #[error("could not decode attr members, unknown attr kind `0x{kind:08x}`")]
    UnsupportedAttrKind { kind: u32 },

    #[error("Offset {offset}: config size {size} is smaller than the 28 byte minimum")]
    ConfigTooSmall { size: u32, offset: u64 },

    #[error("arsc file contains zero packages")]
    NoPackages,

    #[error("multiple packages: id={id}")]
    DuplicatePackageId { id: u8 },

    #[error("multiple packages: name={name}")]
    DuplicatePackageName { name: String },

    #[error("multiple resource specs: {id}")]
    DuplicateSpec { id: ResourceId },

    #[error("multiple resources: spec={id}, config={config}")]
    DuplicateRecord { id: ResourceId, config: String },

    #[error("undefined package with id {id}")]
    UndefinedPackage { id: u8 },

    #[error("failed to load framework package {id}: {message}")]
    FrameworkLoad { id: u8, message: String },

    #[error("An I/O error has occurred")]
    Io(#[from] io::Error),
}
