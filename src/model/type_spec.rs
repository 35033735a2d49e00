use crate::FastMap;
use crate::model::SpecId;

use log::warn;

/// A resource type (`string`, `drawable`, ...) within a package.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub(crate) id: u8,
    pub(crate) name: String,
    pub(crate) entry_count: u32,
    specs: Vec<SpecId>,
    by_name: FastMap<String, SpecId>,
}

impl TypeSpec {
    pub(crate) fn new(id: u8, name: String, entry_count: u32) -> Self {
        TypeSpec {
            id,
            name,
            entry_count,
            specs: Vec::new(),
            by_name: FastMap::default(),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_count(&self) -> u32 {
        self.entry_count
    }

    pub fn is_string(&self) -> bool {
        self.name == "string"
    }

    /// Specs in insertion order.
    pub fn specs(&self) -> &[SpecId] {
        &self.specs
    }

    pub fn spec_by_name(&self, name: &str) -> Option<SpecId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub(crate) fn add_spec(&mut self, spec: SpecId, name: &str) {
        self.specs.push(spec);
        if self.by_name.contains_key(name) {
            warn!("type `{}` already has a resource named `{name}`", self.name);
            return;
        }
        self.by_name.insert(name.to_owned(), spec);
    }

    /// Re-key `spec` from `old` to `new`; its position in [`TypeSpec::specs`] is unchanged.
    pub(crate) fn rename_spec(&mut self, spec: SpecId, old: &str, new: &str) {
        if self.by_name.get(old) == Some(&spec) {
            self.by_name.remove(old);
        }
        if self.by_name.contains_key(new) {
            warn!("type `{}` already has a resource named `{new}`", self.name);
            return;
        }
        self.by_name.insert(new.to_owned(), spec);
    }
}
