use crate::config::ConfigDescriptor;
use crate::err::{ArscError, Result};
use crate::model::{
    ConfigId, Record, RecordId, ResourceId, ResourceSpec, SpecId, TypeInstance, TypeSpec,
    TypeSpecId,
};
use crate::value::{ScalarValue, Value};
use crate::{FastMap, FastSet};

use log::{debug, warn};

/// Prefix of the names given to placeholder specs.
pub const DUMMY_NAME_PREFIX: &str = "DUMMY_RES_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAdded {
    New(RecordId),
    /// A record for the same spec and configuration existed and was overwritten.
    Replaced(RecordId),
}

#[derive(Debug, Clone)]
pub struct Package {
    id: u8,
    name: String,
    specs: Vec<ResourceSpec>,
    spec_index: FastMap<ResourceId, SpecId>,
    type_specs: Vec<TypeSpec>,
    type_by_id: FastMap<u8, TypeSpecId>,
    type_by_name: FastMap<String, TypeSpecId>,
    configs: Vec<TypeInstance>,
    config_index: FastMap<ConfigDescriptor, ConfigId>,
    records: Vec<Record>,
    synthesized: FastSet<ResourceId>,
}

impl Package {
    pub fn new(id: u8, name: String) -> Self {
        Package {
            id,
            name,
            specs: Vec::new(),
            spec_index: FastMap::default(),
            type_specs: Vec::new(),
            type_by_id: FastMap::default(),
            type_by_name: FastMap::default(),
            configs: Vec::new(),
            config_index: FastMap::default(),
            records: Vec::new(),
            synthesized: FastSet::default(),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // Type specs

    pub fn type_specs(&self) -> &[TypeSpec] {
        &self.type_specs
    }

    pub fn type_spec(&self, id: TypeSpecId) -> &TypeSpec {
        &self.type_specs[id.0]
    }

    pub fn type_spec_by_id(&self, type_id: u8) -> Option<TypeSpecId> {
        self.type_by_id.get(&type_id).copied()
    }

    pub fn type_spec_by_name(&self, name: &str) -> Option<TypeSpecId> {
        self.type_by_name.get(name).copied()
    }

    /// Register a type. A type id seen before updates that type in place (latest entry count
    /// wins); a new id reusing an existing name is kept but only reachable by id.
    pub fn add_type_spec(&mut self, type_id: u8, name: String, entry_count: u32) -> TypeSpecId {
        if let Some(existing) = self.type_spec_by_id(type_id) {
            let type_spec = &mut self.type_specs[existing.0];
            if type_spec.entry_count != entry_count {
                debug!(
                    "type `{}` redeclared with {} entries (was {})",
                    type_spec.name, entry_count, type_spec.entry_count
                );
            }
            type_spec.entry_count = entry_count;
            return existing;
        }

        let idx = TypeSpecId(self.type_specs.len());
        if self.type_by_name.contains_key(&name) {
            warn!(
                "package `{}` already has a type named `{name}`, keeping the first one",
                self.name
            );
        } else {
            self.type_by_name.insert(name.clone(), idx);
        }
        self.type_by_id.insert(type_id, idx);
        self.type_specs.push(TypeSpec::new(type_id, name, entry_count));
        idx
    }

    // Specs

    pub fn specs(&self) -> impl Iterator<Item = &ResourceSpec> {
        self.specs.iter()
    }

    pub fn spec_count(&self) -> usize {
        self.specs.len()
    }

    pub fn spec_id(&self, id: ResourceId) -> Option<SpecId> {
        self.spec_index.get(&id).copied()
    }

    pub fn has_spec(&self, id: ResourceId) -> bool {
        self.spec_index.contains_key(&id)
    }

    pub fn spec(&self, id: ResourceId) -> Option<&ResourceSpec> {
        self.spec_id(id).map(|idx| &self.specs[idx.0])
    }

    pub fn spec_at(&self, idx: SpecId) -> &ResourceSpec {
        &self.specs[idx.0]
    }

    pub fn spec_by_name(&self, type_name: &str, name: &str) -> Option<&ResourceSpec> {
        let type_spec = self.type_spec(self.type_spec_by_name(type_name)?);
        type_spec.spec_by_name(name).map(|idx| &self.specs[idx.0])
    }

    pub fn add_spec(
        &mut self,
        type_spec: TypeSpecId,
        id: ResourceId,
        name: String,
        dummy: bool,
    ) -> Result<SpecId> {
        if self.spec_index.contains_key(&id) {
            return Err(ArscError::DuplicateSpec { id });
        }

        let idx = SpecId(self.specs.len());
        let ts = &mut self.type_specs[type_spec.0];
        ts.add_spec(idx, &name);
        self.specs.push(ResourceSpec {
            id,
            name,
            package_id: self.id,
            type_spec,
            type_name: ts.name.clone(),
            dummy,
            records: Vec::new(),
        });
        self.spec_index.insert(id, idx);
        Ok(idx)
    }

    /// Give a dummy spec its real name. The spec keeps its index and its records.
    ///
    /// Returns `false` if the spec was not a dummy.
    pub fn upgrade_dummy(&mut self, idx: SpecId, name: String) -> bool {
        let spec = &mut self.specs[idx.0];
        if !spec.dummy {
            return false;
        }
        let old = std::mem::replace(&mut spec.name, name);
        spec.dummy = false;
        let type_spec = spec.type_spec;
        self.type_specs[type_spec.0].rename_spec(idx, &old, &self.specs[idx.0].name);
        true
    }

    // Configurations and records

    pub fn configs(&self) -> &[TypeInstance] {
        &self.configs
    }

    pub fn config(&self, idx: ConfigId) -> &TypeInstance {
        &self.configs[idx.0]
    }

    pub fn config_id(&self, config: &ConfigDescriptor) -> Option<ConfigId> {
        self.config_index.get(config).copied()
    }

    pub fn get_or_create_config(&mut self, config: ConfigDescriptor) -> ConfigId {
        if let Some(idx) = self.config_id(&config) {
            return idx;
        }
        let idx = ConfigId(self.configs.len());
        self.config_index.insert(config.clone(), idx);
        self.configs.push(TypeInstance {
            config,
            records: Vec::new(),
        });
        idx
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, idx: RecordId) -> &Record {
        &self.records[idx.0]
    }

    /// Record of `spec` under `config`, if any.
    pub fn record_for(&self, spec: SpecId, config: ConfigId) -> Option<&Record> {
        self.specs[spec.0]
            .records
            .iter()
            .map(|r| &self.records[r.0])
            .find(|r| r.config == config)
    }

    /// Add `value` for `spec` under `config`.
    ///
    /// A second value for the same pair is an error unless `overwrite` is set, in which case
    /// it replaces the first.
    pub fn add_record(
        &mut self,
        spec: SpecId,
        config: ConfigId,
        value: Value,
        overwrite: bool,
    ) -> Result<RecordAdded> {
        let existing = self.specs[spec.0]
            .records
            .iter()
            .copied()
            .find(|r| self.records[r.0].config == config);

        if let Some(existing) = existing {
            if !overwrite {
                return Err(ArscError::DuplicateRecord {
                    id: self.specs[spec.0].id,
                    config: self.configs[config.0].config.to_string(),
                });
            }
            self.records[existing.0].value = value;
            return Ok(RecordAdded::Replaced(existing));
        }

        let idx = RecordId(self.records.len());
        self.records.push(Record {
            spec,
            config,
            value,
        });
        self.specs[spec.0].records.push(idx);
        self.configs[config.0].records.push(idx);
        Ok(RecordAdded::New(idx))
    }

    /// Records whose value is a path into the package, with the spec they belong to.
    pub fn files(&self) -> impl Iterator<Item = (&ResourceSpec, &str)> {
        self.records.iter().filter_map(|record| match &record.value {
            Value::Scalar(ScalarValue::File(path)) => Some((&self.specs[record.spec.0], path.as_str())),
            _ => None,
        })
    }

    // Synthesized ids

    pub fn add_synthesized(&mut self, id: ResourceId) {
        self.synthesized.insert(id);
    }

    pub fn is_synthesized(&self, id: ResourceId) -> bool {
        self.synthesized.contains(&id)
    }

    /// Give every synthesized id of this package that has no spec a dummy spec holding a null
    /// reference in the default configuration. Ids whose type is unknown are left alone.
    ///
    /// Returns the number of specs created.
    pub fn complete_synthesized_specs(&mut self) -> Result<usize> {
        let mut missing: Vec<ResourceId> = self
            .synthesized
            .iter()
            .copied()
            .filter(|id| id.package_id() == self.id && !self.has_spec(*id))
            .collect();
        missing.sort();

        let mut created = 0;
        for id in missing {
            let Some(type_spec) = self.type_spec_by_id(id.type_id()) else {
                debug!("synthesized id {id} has no type in package `{}`", self.name);
                continue;
            };
            let name = dummy_name(id.entry_id());
            let spec = self.add_spec(type_spec, id, name, true)?;
            let config = self.get_or_create_config(ConfigDescriptor::new());
            self.add_record(spec, config, Value::null_reference(), false)?;
            created += 1;
        }
        Ok(created)
    }
}

pub(crate) fn dummy_name(entry: u16) -> String {
    format!("{DUMMY_NAME_PREFIX}{entry:x}")
}
