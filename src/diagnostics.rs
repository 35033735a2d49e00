//! Tolerated anomalies met while decoding.
//!
//! None of these stop a decode. Each one is logged when it happens and also handed back in
//! [`crate::ArscData::diagnostics`], so callers can inspect them without scraping logs.

use crate::chunk_header::ChunkType;
use crate::model::ResourceId;

use log::warn;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// The cursor was not where a header said the next structure starts.
    ByteDrift {
        what: &'static str,
        expected: u64,
        actual: u64,
    },
    /// A configuration carried unknown non-zero data.
    InvalidConfig { type_name: String, config: String },
    /// Two records for the same resource and configuration; the later one was kept.
    DuplicateRecord { id: ResourceId, config: String },
    /// Two type ids share a name.
    DuplicateTypeSpec { name: String, id: u8, existing: u8 },
    /// A type was declared again with a different entry count.
    EntryCountMismatch {
        type_id: u8,
        previous: u32,
        current: u32,
    },
    SparseResources { type_id: u8 },
    /// A type chunk named a type id with no preceding type spec.
    UnknownTypeId { type_id: u8, offset: u64 },
    SkippedChunk {
        chunk_type: ChunkType,
        offset: u64,
        size: u32,
    },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::ByteDrift {
                what,
                expected,
                actual,
            } => {
                let delta = *expected as i64 - *actual as i64;
                write!(
                    f,
                    "{what}: expected offset {expected}, cursor at {actual} ({delta:+} bytes)"
                )
            }
            Anomaly::InvalidConfig { type_name, config } => {
                write!(f, "invalid config `{config}` for type `{type_name}`")
            }
            Anomaly::DuplicateRecord { id, config } => {
                write!(f, "Duplicate Resource Detected: {id} in config `{config}`")
            }
            Anomaly::DuplicateTypeSpec { name, id, existing } => write!(
                f,
                "type `{name}` declared with id 0x{id:02x}, already declared as 0x{existing:02x}"
            ),
            Anomaly::EntryCountMismatch {
                type_id,
                previous,
                current,
            } => write!(
                f,
                "type 0x{type_id:02x} redeclared with {current} entries (was {previous})"
            ),
            Anomaly::SparseResources { type_id } => {
                write!(f, "type 0x{type_id:02x} uses sparse resources")
            }
            Anomaly::UnknownTypeId { type_id, offset } => {
                write!(f, "unknown type id 0x{type_id:02x} at offset {offset}")
            }
            Anomaly::SkippedChunk {
                chunk_type,
                offset,
                size,
            } => write!(f, "skipped {chunk_type} chunk at offset {offset} ({size} bytes)"),
        }
    }
}

/// Collects anomalies during one decode.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    anomalies: Vec<Anomaly>,
}

impl Diagnostics {
    /// Log `anomaly` and keep it.
    pub(crate) fn warn(&mut self, anomaly: Anomaly) {
        warn!("{anomaly}");
        self.anomalies.push(anomaly);
    }

    /// Keep `anomaly` without logging it; for anomalies the model already logged.
    pub(crate) fn push(&mut self, anomaly: Anomaly) {
        self.anomalies.push(anomaly);
    }

    pub(crate) fn into_vec(self) -> Vec<Anomaly> {
        self.anomalies
    }
}
