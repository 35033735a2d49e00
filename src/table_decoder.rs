//! Walks the chunk tree of a resource table and populates the model.
//!
//! The layout is `TABLE { STRING_POOL, PACKAGE* }` where each package is
//! `PACKAGE { STRING_POOL (type names), STRING_POOL (key names), (LIBRARY | TYPE_SPEC | TYPE)* }`.
//! Every `TYPE` chunk belongs to the type spec with the same id, which must come first.

use crate::arsc_parser::{ArscData, FlagsOffset, ParserSettings};
use crate::chunk_header::{ChunkHeader, ChunkType, CHUNK_HEADER_SIZE};
use crate::config::ConfigDescriptor;
use crate::diagnostics::{Anomaly, Diagnostics};
use crate::err::{ArscError, Result};
use crate::model::{
    ConfigId, DEFAULT_PACKAGE_ID, Package, RecordAdded, ResourceId, ResourceTable, TypeSpecId,
    dummy_name,
};
use crate::string_pool::StringPool;
use crate::utils::ByteCursor;
use crate::value::{ScalarValue, Value, bag_value, decode_scalar, read_value};
use crate::FastMap;

use bitflags::bitflags;
use log::{debug, info, trace, warn};

/// Header size of a package chunk that carries the `typeIdOffset` field.
const PACKAGE_HEADER_WITH_TYPE_ID_OFFSET: u16 = 288;
const PACKAGE_NAME_CHARS: usize = 128;

const TYPE_SPEC_SPARSE: u8 = 0x01;

const NO_ENTRY: u32 = 0xFFFF_FFFF;
const NO_ENTRY_16: u16 = 0xFFFF;

bitflags! {
    /// `ResTable_type::flags`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct TypeFlags: u8 {
        const SPARSE = 0x01;
        const OFFSET16 = 0x02;
    }
}

bitflags! {
    /// `ResTable_entry::flags`. In compact entries the high byte holds the value type instead.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct EntryFlags: u16 {
        const COMPLEX = 0x0001;
        const PUBLIC = 0x0002;
        const WEAK = 0x0004;
        const COMPACT = 0x0008;
        const USES_FEATURE_FLAGS = 0x0010;
    }
}

/// One decoded `ResTable_entry`, before it is attached to a spec.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EntryData {
    pub(crate) key: u32,
    pub(crate) flags: EntryFlags,
    pub(crate) value: Value,
}

/// Where a package body walk stands. Type chunks are only legal once a type spec was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PackageState {
    AwaitLibraryOrSpec,
    ReadingSpec(TypeSpecId),
    AwaitType(TypeSpecId),
}

impl PackageState {
    fn current(self) -> Option<TypeSpecId> {
        match self {
            PackageState::AwaitLibraryOrSpec => None,
            PackageState::ReadingSpec(id) | PackageState::AwaitType(id) => Some(id),
        }
    }
}

/// Per-package decode state.
struct PackageContext {
    package: Package,
    res_id_base: u32,
    type_id_offset: u32,
    key_names: StringPool,
}

pub(crate) struct TableDecoder<'a> {
    cursor: ByteCursor<'a>,
    settings: &'a ParserSettings,
    table: &'a mut ResourceTable,
    diagnostics: Diagnostics,
    flags_offsets: Option<Vec<FlagsOffset>>,
    table_strings: StringPool,
}

impl<'a> TableDecoder<'a> {
    pub(crate) fn new(
        data: &'a [u8],
        settings: &'a ParserSettings,
        table: &'a mut ResourceTable,
    ) -> Self {
        TableDecoder {
            cursor: ByteCursor::new(data),
            settings,
            table,
            diagnostics: Diagnostics::default(),
            flags_offsets: settings.should_collect_flags_offsets().then(Vec::new),
            table_strings: StringPool::default(),
        }
    }

    pub(crate) fn decode(mut self) -> Result<ArscData> {
        let header = ChunkHeader::read_expecting(&mut self.cursor, ChunkType::Table)?;
        let package_count = self.cursor.u32_named("package count")?;
        self.seek_to(header.body_start(), "table header")?;
        debug!("table declares {package_count} package(s)");

        self.table_strings = StringPool::read(&mut self.cursor)?;

        let mut packages = Vec::new();
        for idx in 0..package_count {
            let chunk = ChunkHeader::read(&mut self.cursor)?;
            if chunk.is_eof() {
                warn!("table declares {package_count} packages but ends after {idx}");
                break;
            }
            chunk.expect(ChunkType::Package)?;
            packages.push(self.read_package(&chunk)?);
        }

        Ok(ArscData {
            packages,
            flags_offsets: self.flags_offsets,
            diagnostics: self.diagnostics.into_vec(),
        })
    }

    /// Move to `pos`, recording drift if the cursor was not already there.
    fn seek_to(&mut self, pos: usize, what: &'static str) -> Result<()> {
        let actual = self.cursor.pos();
        if actual != pos {
            self.diagnostics.warn(Anomaly::ByteDrift {
                what,
                expected: pos as u64,
                actual: actual as u64,
            });
            self.cursor.set_pos(pos, what)?;
        }
        Ok(())
    }

    fn read_package(&mut self, header: &ChunkHeader) -> Result<Package> {
        let mut id = self.cursor.u32_named("package id")? as u8;
        if id == 0 {
            id = DEFAULT_PACKAGE_ID;
            if !self.table.is_renamed() {
                self.table.set_shared_library(true);
            }
        }

        let name = self
            .cursor
            .utf16_fixed_z(PACKAGE_NAME_CHARS, "package name")?;
        let type_strings = self.cursor.u32_named("type strings offset")?;
        let _last_public_type = self.cursor.u32_named("last public type")?;
        let key_strings = self.cursor.u32_named("key strings offset")?;
        let _last_public_key = self.cursor.u32_named("last public key")?;

        let type_id_offset = if header.header_size == PACKAGE_HEADER_WITH_TYPE_ID_OFFSET {
            self.cursor.u32_named("type id offset")?
        } else {
            0
        };
        if type_id_offset > 0 {
            warn!("package `{name}` uses a type id offset of {type_id_offset}");
        }

        debug!(
            "Offset `0x{:08x}`: package `{name}` (0x{id:02x})",
            header.start
        );

        if type_strings != 0 {
            self.seek_to(header.start + type_strings as usize, "type strings")?;
        }
        let type_names = StringPool::read(&mut self.cursor)?;
        if key_strings != 0 {
            self.seek_to(header.start + key_strings as usize, "key strings")?;
        }
        let key_names = StringPool::read(&mut self.cursor)?;

        let mut ctx = PackageContext {
            package: Package::new(id, name),
            res_id_base: u32::from(id) << 24,
            type_id_offset,
            key_names,
        };

        let package_end = header.end();
        let mut state = PackageState::AwaitLibraryOrSpec;
        while self.cursor.pos() < package_end {
            let chunk = ChunkHeader::read(&mut self.cursor)?;
            if chunk.is_eof() {
                break;
            }
            if (chunk.chunk_size as usize) < CHUNK_HEADER_SIZE {
                warn!(
                    "Offset `0x{:08x}`: {} chunk declares size {}, stopping package",
                    chunk.start, chunk.chunk_type, chunk.chunk_size
                );
                break;
            }

            match chunk.chunk_type {
                ChunkType::Library => self.read_library(&chunk)?,
                ChunkType::TypeSpec => {
                    let type_spec = self.read_type_spec(&chunk, &mut ctx, &type_names)?;
                    state = PackageState::ReadingSpec(type_spec);
                }
                ChunkType::Type => {
                    let Some(current) = state.current() else {
                        return Err(ArscError::InvalidChunkType {
                            expected: ChunkType::TypeSpec,
                            found: ChunkType::Type,
                            offset: chunk.start as u64,
                        });
                    };
                    let type_spec = self.read_type(&chunk, &mut ctx, current)?;
                    state = PackageState::AwaitType(type_spec);
                }
                ChunkType::Overlayable
                | ChunkType::OverlayablePolicy
                | ChunkType::StagedAlias
                | ChunkType::Unknown(_) => {
                    self.diagnostics.warn(Anomaly::SkippedChunk {
                        chunk_type: chunk.chunk_type,
                        offset: chunk.start as u64,
                        size: chunk.chunk_size,
                    });
                }
                ChunkType::Package
                | ChunkType::Table
                | ChunkType::StringPool
                | ChunkType::Null
                | ChunkType::Eof => {
                    debug!(
                        "Offset `0x{:08x}`: {} chunk ends package `{}`",
                        chunk.start,
                        chunk.chunk_type,
                        ctx.package.name()
                    );
                    self.cursor.set_pos(chunk.start, "package end")?;
                    break;
                }
            }
            trace!("package state: {state:?}");
            self.seek_to(chunk.end(), "chunk end")?;
        }

        if self.cursor.pos() > package_end {
            self.diagnostics.warn(Anomaly::ByteDrift {
                what: "package end",
                expected: package_end as u64,
                actual: self.cursor.pos() as u64,
            });
        }

        let synthesized = ctx.package.complete_synthesized_specs()?;
        if synthesized > 0 {
            debug!(
                "package `{}`: added {synthesized} placeholder(s) for attr members",
                ctx.package.name()
            );
        }
        Ok(ctx.package)
    }

    fn read_library(&mut self, header: &ChunkHeader) -> Result<()> {
        let count = self.cursor.u32_named("library count")?;
        self.seek_to(header.body_start(), "library header")?;
        for _ in 0..count {
            let id = self.cursor.u32_named("library package id")?;
            let name = self
                .cursor
                .utf16_fixed_z(PACKAGE_NAME_CHARS, "library package name")?;
            info!("Decoding Shared Library ({name}), pkgId: {id}");
        }
        Ok(())
    }

    fn read_type_spec(
        &mut self,
        header: &ChunkHeader,
        ctx: &mut PackageContext,
        type_names: &StringPool,
    ) -> Result<TypeSpecId> {
        let id = self.cursor.u8_named("type spec id")?;
        let res0 = self.cursor.u8_named("type spec res0")?;
        let _types_count = self.cursor.u16_named("type spec types count")?;
        let entry_count = self.cursor.u32_named("type spec entry count")?;
        self.seek_to(header.body_start(), "type spec header")?;

        if let Some(offsets) = self.flags_offsets.as_mut() {
            offsets.push(FlagsOffset {
                offset: self.cursor.pos(),
                count: entry_count,
            });
        }
        self.cursor
            .advance(entry_count as usize * 4, "type spec flags")?;

        let name = match id
            .checked_sub(1)
            .and_then(|idx| type_names.get_string(usize::from(idx)))
        {
            Some(name) => name,
            None => {
                let name = format!("type_0x{id:02x}");
                warn!("type spec 0x{id:02x} has no name, using `{name}`");
                name
            }
        };
        trace!("type spec 0x{id:02x} `{name}` with {entry_count} entries");

        if res0 & TYPE_SPEC_SPARSE != 0 {
            info!("Sparse type flags detected: {name}");
            self.table.set_sparse_resources(true);
            self.diagnostics
                .push(Anomaly::SparseResources { type_id: id });
        }

        let package = &mut ctx.package;
        if let Some(existing) = package.type_spec_by_id(id) {
            let previous = package.type_spec(existing).entry_count();
            if previous != entry_count {
                self.diagnostics.warn(Anomaly::EntryCountMismatch {
                    type_id: id,
                    previous,
                    current: entry_count,
                });
            }
        } else if let Some(existing) = package.type_spec_by_name(&name) {
            // The model logs the clash itself.
            self.diagnostics.push(Anomaly::DuplicateTypeSpec {
                name: name.clone(),
                id,
                existing: package.type_spec(existing).id(),
            });
        }

        Ok(package.add_type_spec(id, name, entry_count))
    }

    /// Decode one type chunk. Returns the type spec it was attributed to.
    fn read_type(
        &mut self,
        header: &ChunkHeader,
        ctx: &mut PackageContext,
        current: TypeSpecId,
    ) -> Result<TypeSpecId> {
        let raw_id = self.cursor.u8_named("type id")?;
        let type_id = raw_id.wrapping_sub(ctx.type_id_offset as u8);
        let flags = TypeFlags::from_bits_retain(self.cursor.u8_named("type flags")?);
        let _reserved = self.cursor.u16_named("type reserved")?;
        let entry_count = self.cursor.u32_named("type entry count")?;
        let entries_start = self.cursor.u32_named("type entries start")?;
        let config = ConfigDescriptor::read(&mut self.cursor)?;

        let type_spec = match ctx.package.type_spec_by_id(type_id) {
            Some(type_spec) => type_spec,
            None => {
                self.diagnostics.warn(Anomaly::UnknownTypeId {
                    type_id,
                    offset: header.start as u64,
                });
                current
            }
        };
        let (spec_type_id, type_name, spec_entry_count) = {
            let ts = ctx.package.type_spec(type_spec);
            (ts.id(), ts.name().to_owned(), ts.entry_count())
        };

        if flags.contains(TypeFlags::SPARSE) {
            info!("Sparse type flags detected: {type_name}");
            self.table.set_sparse_resources(true);
            self.diagnostics.push(Anomaly::SparseResources {
                type_id: spec_type_id,
            });
        }

        let table_len = entry_count as usize * if flags.contains(TypeFlags::OFFSET16) { 2 } else { 4 };
        let entries_base = header.start + entries_start as usize;
        if let Some(expected) = entries_base.checked_sub(table_len) {
            self.seek_to(expected, "entry offsets")?;
        }
        let (present, slot_count) =
            read_entry_offsets(&mut self.cursor, flags, entry_count, spec_entry_count)?;

        let instance = if config.is_invalid {
            self.diagnostics.warn(Anomaly::InvalidConfig {
                type_name: type_name.clone(),
                config: config.qualifiers(),
            });
            if self.settings.should_keep_broken() {
                Some(ctx.package.get_or_create_config(config))
            } else {
                debug!("dropping resources of `{type_name}` under an invalid config");
                None
            }
        } else {
            Some(ctx.package.get_or_create_config(config))
        };

        let mut furthest = self.cursor.pos();
        let mut decoded: FastMap<u32, EntryData> = FastMap::default();
        for &(_, offset) in &present {
            if decoded.contains_key(&offset) {
                continue;
            }
            self.cursor
                .set_pos(entries_base + offset as usize, "entry")?;
            let entry = read_entry_data(
                &mut self.cursor,
                &self.table_strings,
                &type_name,
                &mut ctx.package,
            )?;
            furthest = furthest.max(self.cursor.pos());
            decoded.insert(offset, entry);
        }

        for &(slot, offset) in &present {
            if let Some(entry) = decoded.get(&offset) {
                self.add_entry(ctx, type_spec, instance, slot, entry.clone())?;
            }
        }

        if furthest < header.end() {
            debug!(
                "Offset `0x{furthest:08x}`: skipping {} byte(s) after the last entry of `{type_name}`",
                header.end() - furthest
            );
        }
        self.cursor
            .set_pos(furthest.max(header.end()), "type chunk")?;

        self.add_missing_specs(ctx, type_spec, instance, &present, slot_count)?;
        Ok(type_spec)
    }

    fn add_entry(
        &mut self,
        ctx: &mut PackageContext,
        type_spec: TypeSpecId,
        instance: Option<ConfigId>,
        slot: u32,
        entry: EntryData,
    ) -> Result<()> {
        let type_id = ctx.package.type_spec(type_spec).id();
        let mut value = entry.value;
        if ctx.package.type_spec(type_spec).is_string() {
            if let Value::Scalar(ScalarValue::File(path)) = value {
                value = Value::Scalar(ScalarValue::String(path));
            }
        }
        let Some(config) = instance else {
            return Ok(());
        };

        let id = ResourceId::new(ctx.res_id_base | u32::from(type_id) << 16 | (slot & 0xFFFF));
        let name = ctx
            .key_names
            .get_string(entry.key as usize)
            .filter(|name| !name.is_empty());
        let unnamed = name.is_none();
        let name = name.unwrap_or_else(|| dummy_name(id.entry_id()));

        let package = &mut ctx.package;
        let spec = match package.spec_id(id) {
            Some(spec) => {
                if !unnamed && package.spec_at(spec).is_dummy() {
                    package.upgrade_dummy(spec, name);
                }
                spec
            }
            None => package.add_spec(type_spec, id, name, unnamed)?,
        };

        let keep_broken = self.settings.should_keep_broken();
        if let RecordAdded::Replaced(_) = package.add_record(spec, config, value, keep_broken)? {
            self.diagnostics.warn(Anomaly::DuplicateRecord {
                id,
                config: package.config(config).config().to_string(),
            });
        }
        Ok(())
    }

    /// Give every slot without an entry a placeholder spec holding a null reference.
    fn add_missing_specs(
        &mut self,
        ctx: &mut PackageContext,
        type_spec: TypeSpecId,
        instance: Option<ConfigId>,
        present: &[(u32, u32)],
        slot_count: usize,
    ) -> Result<()> {
        let type_id = ctx.package.type_spec(type_spec).id();
        let mut filled = vec![false; slot_count];
        for &(slot, _) in present {
            if let Some(flag) = filled.get_mut(slot as usize) {
                *flag = true;
            }
        }

        let package = &mut ctx.package;
        let mut added = 0usize;
        for (slot, _) in filled.iter().enumerate().filter(|(_, filled)| !**filled) {
            let id = ResourceId::new(ctx.res_id_base | u32::from(type_id) << 16 | slot as u32);
            if package.has_spec(id) {
                continue;
            }
            let spec = package.add_spec(type_spec, id, dummy_name(id.entry_id()), true)?;
            let config = match instance {
                Some(config) => config,
                None => package.get_or_create_config(ConfigDescriptor::new()),
            };
            package.add_record(spec, config, Value::null_reference(), false)?;
            added += 1;
        }
        if added > 0 {
            trace!("added {added} placeholder(s) to type 0x{type_id:02x}");
        }
        Ok(())
    }
}

/// Read the entry offset table of a type chunk.
///
/// Returns `(slot, offset)` for every present entry, in table order, and the number of slots
/// the type has.
pub(crate) fn read_entry_offsets(
    cursor: &mut ByteCursor<'_>,
    flags: TypeFlags,
    entry_count: u32,
    spec_entry_count: u32,
) -> Result<(Vec<(u32, u32)>, usize)> {
    let count = entry_count as usize;
    if flags.contains(TypeFlags::SPARSE) {
        let words = cursor.u32_vec(count, "sparse entry offsets")?;
        let present: Vec<(u32, u32)> = words
            .into_iter()
            .map(|word| (word & 0xFFFF, (word >> 16) * 4))
            .collect();
        let highest = present.iter().map(|&(slot, _)| slot as usize + 1).max();
        let slots = highest.unwrap_or(0).max(spec_entry_count as usize);
        return Ok((present, slots));
    }

    let present = if flags.contains(TypeFlags::OFFSET16) {
        cursor
            .u16_vec(count, "entry offsets")?
            .into_iter()
            .enumerate()
            .filter(|&(_, offset)| offset != NO_ENTRY_16)
            .map(|(slot, offset)| (slot as u32, u32::from(offset) * 4))
            .collect()
    } else {
        cursor
            .u32_vec(count, "entry offsets")?
            .into_iter()
            .enumerate()
            .filter(|&(_, offset)| offset != NO_ENTRY)
            .map(|(slot, offset)| (slot as u32, offset))
            .collect()
    };
    Ok((present, count))
}

/// Decode one `ResTable_entry` at the cursor. Bags are interpreted against `type_name`; attr
/// members are registered on `package`.
pub(crate) fn read_entry_data(
    cursor: &mut ByteCursor<'_>,
    strings: &StringPool,
    type_name: &str,
    package: &mut Package,
) -> Result<EntryData> {
    let offset = cursor.position();
    let size_or_key = cursor.u16_named("entry size")?;
    let raw_flags = cursor.u16_named("entry flags")?;
    let flags = EntryFlags::from_bits_retain(raw_flags & 0x00FF);

    if flags.contains(EntryFlags::COMPACT) {
        let data_type = (raw_flags >> 8) as u8;
        let data = cursor.u32_named("compact entry data")?;
        let value = decode_scalar(data_type, data, strings, offset)?;
        return Ok(EntryData {
            key: u32::from(size_or_key),
            flags,
            value: value.into(),
        });
    }

    let size = size_or_key as i16;
    if size < 0 {
        return Err(ArscError::NegativeEntrySize { size, offset });
    }
    let key = cursor.u32_named("entry key")?;

    let value = if flags.contains(EntryFlags::COMPLEX) {
        let parent = cursor.u32_named("bag parent")?;
        let count = cursor.u32_named("bag count")?;
        let mut items = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            let item_key = cursor.u32_named("bag item key")?;
            items.push((item_key, read_value(cursor, strings)?));
        }
        bag_value(parent, items, type_name, package)?
    } else {
        read_value(cursor, strings)?.into()
    };

    Ok(EntryData { key, flags, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{BagKind, IntFormat, TYPE_INT_DEC, TYPE_REFERENCE};
    use pretty_assertions::assert_eq;

    fn words(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn package() -> Package {
        Package::new(0x7f, "com.example".to_owned())
    }

    #[test]
    fn test_dense_offsets_skip_absent_slots() {
        crate::ensure_env_logger_initialized();
        let buf = words(&[0, NO_ENTRY, 8, NO_ENTRY, NO_ENTRY]);
        let mut cursor = ByteCursor::new(&buf);
        let (present, slots) =
            read_entry_offsets(&mut cursor, TypeFlags::empty(), 5, 5).unwrap();
        assert_eq!(present, vec![(0, 0), (2, 8)]);
        assert_eq!(slots, 5);
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_offset16_table_is_scaled() {
        let buf: Vec<u8> = [0u16, 0xFFFF, 4]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let mut cursor = ByteCursor::new(&buf);
        let (present, slots) =
            read_entry_offsets(&mut cursor, TypeFlags::OFFSET16, 3, 3).unwrap();
        assert_eq!(present, vec![(0, 0), (2, 16)]);
        assert_eq!(slots, 3);
    }

    #[test]
    fn test_sparse_table_covers_declared_entries() {
        // (index 1, offset 0), (index 6, offset 8)
        let buf = words(&[0x0000_0001, 0x0002_0006]);
        let mut cursor = ByteCursor::new(&buf);
        let (present, slots) =
            read_entry_offsets(&mut cursor, TypeFlags::SPARSE, 2, 4).unwrap();
        assert_eq!(present, vec![(1, 0), (6, 8)]);
        assert_eq!(slots, 7);
    }

    #[test]
    fn test_compact_entry() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u16.to_le_bytes());
        buf.extend_from_slice(&(0x0008u16 | u16::from(TYPE_INT_DEC) << 8).to_le_bytes());
        buf.extend_from_slice(&42u32.to_le_bytes());

        let mut cursor = ByteCursor::new(&buf);
        let entry =
            read_entry_data(&mut cursor, &StringPool::default(), "integer", &mut package())
                .unwrap();
        assert_eq!(entry.key, 3);
        assert!(entry.flags.contains(EntryFlags::COMPACT));
        assert_eq!(
            entry.value,
            Value::Scalar(ScalarValue::Int {
                data: 42,
                format: IntFormat::Dec
            })
        );
    }

    #[test]
    fn test_negative_entry_size_is_fatal() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0xFFF0u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());

        let mut cursor = ByteCursor::new(&buf);
        let err = read_entry_data(&mut cursor, &StringPool::default(), "integer", &mut package())
            .unwrap_err();
        assert!(matches!(err, ArscError::NegativeEntrySize { size: -16, .. }));
    }

    #[test]
    fn test_complex_entry_under_array() {
        crate::ensure_env_logger_initialized();
        let mut buf = Vec::new();
        buf.extend_from_slice(&16u16.to_le_bytes());
        buf.extend_from_slice(&EntryFlags::COMPLEX.bits().to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes()); // key
        buf.extend_from_slice(&0u32.to_le_bytes()); // parent
        buf.extend_from_slice(&2u32.to_le_bytes()); // count
        for (key, data) in [(0x7f01_0000u32, 0x7f02_0000u32), (0x7f01_0001, 0x7f02_0001)] {
            buf.extend_from_slice(&key.to_le_bytes());
            buf.extend_from_slice(&8u16.to_le_bytes());
            buf.push(0);
            buf.push(TYPE_REFERENCE);
            buf.extend_from_slice(&data.to_le_bytes());
        }

        let mut cursor = ByteCursor::new(&buf);
        let entry = read_entry_data(&mut cursor, &StringPool::default(), "array", &mut package())
            .unwrap();
        let bag = entry.value.as_bag().unwrap();
        match &bag.kind {
            BagKind::Array(items) => assert_eq!(items.len(), 2),
            other => panic!("expected an array, got {other:?}"),
        }
        assert!(cursor.is_eof());
    }
}
