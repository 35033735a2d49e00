use crate::diagnostics::Anomaly;
use crate::err::{ArscError, Result};
use crate::model::{Package, ResourceTable};
use crate::table_decoder::TableDecoder;

use log::info;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Options for a single decode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserSettings {
    keep_broken: bool,
    collect_flags_offsets: bool,
}

impl ParserSettings {
    pub fn new() -> Self {
        ParserSettings::default()
    }

    /// Keep records under invalid configurations, and let duplicate records overwrite each
    /// other instead of failing the decode.
    pub fn keep_broken(mut self, keep_broken: bool) -> Self {
        self.keep_broken = keep_broken;
        self
    }

    /// Record where the flags array of every type spec lives in the input.
    pub fn collect_flags_offsets(mut self, collect: bool) -> Self {
        self.collect_flags_offsets = collect;
        self
    }

    pub fn should_keep_broken(&self) -> bool {
        self.keep_broken
    }

    pub fn should_collect_flags_offsets(&self) -> bool {
        self.collect_flags_offsets
    }
}

/// Position and length of the per-entry flags array of one type spec chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagsOffset {
    /// Absolute offset of the first flags word.
    pub offset: usize,
    pub count: u32,
}

/// Everything one decode produced.
#[derive(Debug)]
pub struct ArscData {
    pub packages: Vec<Package>,
    /// `Some` only when [`ParserSettings::collect_flags_offsets`] was set.
    pub flags_offsets: Option<Vec<FlagsOffset>>,
    /// Anomalies the decode tolerated, in the order they were met.
    pub diagnostics: Vec<Anomaly>,
}

impl ArscData {
    fn main_index(&self) -> Result<usize> {
        match self.packages.len() {
            0 => Err(ArscError::NoPackages),
            1 => Ok(0),
            _ => {
                let idx = self.index_with_most_specs();
                info!(
                    "table contains {} packages, using `{}` as the main one",
                    self.packages.len(),
                    self.packages[idx].name()
                );
                Ok(idx)
            }
        }
    }

    // Ties go to the later package.
    fn index_with_most_specs(&self) -> usize {
        let mut best = 0;
        let mut count = 0;
        for (idx, package) in self.packages.iter().enumerate() {
            if package.spec_count() >= count {
                count = package.spec_count();
                best = idx;
            }
        }
        best
    }

    /// The single package of the table, or the most populated one if there are several.
    pub fn one_package(&self) -> Result<&Package> {
        let idx = self.main_index()?;
        Ok(&self.packages[idx])
    }

    pub fn package_with_most_specs(&self) -> Option<&Package> {
        if self.packages.is_empty() {
            return None;
        }
        Some(&self.packages[self.index_with_most_specs()])
    }

    pub(crate) fn split_main(mut self) -> Result<(Package, Vec<Package>)> {
        let idx = self.main_index()?;
        let main = self.packages.remove(idx);
        Ok((main, self.packages))
    }

    /// A fresh table holding these packages. See [`ResourceTable::load_decoded`].
    pub fn into_table(self) -> Result<ResourceTable> {
        let mut table = ResourceTable::new();
        table.load_decoded(self)?;
        Ok(table)
    }
}

/// Decodes a compiled resource table (`resources.arsc`).
///
/// ```no_run
/// use arsc_decoder::{ArscParser, ParserSettings};
///
/// let parser = ArscParser::from_path("resources.arsc")?
///     .with_configuration(ParserSettings::new().keep_broken(true));
/// let data = parser.decode()?;
/// for package in &data.packages {
///     println!("{} has {} resources", package.name(), package.spec_count());
/// }
/// # Ok::<(), arsc_decoder::ArscError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ArscParser {
    data: Vec<u8>,
    config: ParserSettings,
}

impl ArscParser {
    pub fn from_buffer(buffer: Vec<u8>) -> Self {
        ArscParser {
            data: buffer,
            config: ParserSettings::default(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_buffer(fs::read(path)?))
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Ok(Self::from_buffer(buffer))
    }

    pub fn with_configuration(mut self, configuration: ParserSettings) -> Self {
        self.config = configuration;
        self
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.config
    }

    pub fn decode(&self) -> Result<ArscData> {
        let mut table = ResourceTable::new();
        self.decode_into(&mut table)
    }

    /// Decode against an existing table. The table supplies rename context and receives the
    /// table-wide flags (shared library, sparse resources); the packages are returned, not
    /// added.
    pub fn decode_into(&self, table: &mut ResourceTable) -> Result<ArscData> {
        TableDecoder::new(&self.data, &self.config, table).decode()
    }

    /// Decode into a fresh table with the packages already loaded.
    pub fn decode_table(&self) -> Result<ResourceTable> {
        let mut table = ResourceTable::new();
        let data = self.decode_into(&mut table)?;
        table.load_decoded(data)?;
        Ok(table)
    }
}
