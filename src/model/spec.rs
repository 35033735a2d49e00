use crate::config::ConfigDescriptor;
use crate::model::{ConfigId, RecordId, ResourceId, SpecId, TypeSpecId};
use crate::value::Value;

/// A named resource identity (`@type/name`), independent of configuration.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    pub(crate) id: ResourceId,
    pub(crate) name: String,
    pub(crate) package_id: u8,
    pub(crate) type_spec: TypeSpecId,
    pub(crate) type_name: String,
    pub(crate) dummy: bool,
    pub(crate) records: Vec<RecordId>,
}

impl ResourceSpec {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package_id(&self) -> u8 {
        self.package_id
    }

    pub fn type_spec(&self) -> TypeSpecId {
        self.type_spec
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Placeholder for a declared but unpopulated slot.
    pub fn is_dummy(&self) -> bool {
        self.dummy
    }

    /// One record per configuration this spec has a value for.
    pub fn records(&self) -> &[RecordId] {
        &self.records
    }

    /// `[package:][type/]name`. The package prefix is omitted when `package_name` is `None`.
    pub fn full_name(&self, package_name: Option<&str>, exclude_type: bool) -> String {
        let mut out = String::new();
        if let Some(package) = package_name {
            out.push_str(package);
            out.push(':');
        }
        if !exclude_type {
            out.push_str(&self.type_name);
            out.push('/');
        }
        out.push_str(&self.name);
        out
    }
}

/// All records of a package realized under one configuration.
#[derive(Debug, Clone)]
pub struct TypeInstance {
    pub(crate) config: ConfigDescriptor,
    pub(crate) records: Vec<RecordId>,
}

impl TypeInstance {
    pub fn config(&self) -> &ConfigDescriptor {
        &self.config
    }

    pub fn records(&self) -> &[RecordId] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A value of one spec under one configuration.
#[derive(Debug, Clone)]
pub struct Record {
    pub(crate) spec: SpecId,
    pub(crate) config: ConfigId,
    pub(crate) value: Value,
}

impl Record {
    pub fn spec(&self) -> SpecId {
        self.spec
    }

    pub fn config(&self) -> ConfigId {
        self.config
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ResourceSpec {
        ResourceSpec {
            id: ResourceId::new(0x7f01_0002),
            name: "app_name".to_owned(),
            package_id: 0x7f,
            type_spec: TypeSpecId(0),
            type_name: "string".to_owned(),
            dummy: false,
            records: Vec::new(),
        }
    }

    #[test]
    fn test_full_name_variants() {
        let spec = spec();
        assert_eq!(spec.full_name(None, false), "string/app_name");
        assert_eq!(spec.full_name(Some("android"), false), "android:string/app_name");
        assert_eq!(spec.full_name(None, true), "app_name");
    }
}
