use crate::arsc_parser::ArscData;
use crate::err::{ArscError, Result};
use crate::model::{DEFAULT_PACKAGE_ID, Package, ResourceId, ResourceSpec};
use crate::value::{Reference, Value};
use crate::FastMap;

use log::{debug, info, warn};
use std::fmt;

/// Supplies packages that a table references but does not contain, usually the platform
/// framework (`android`, id 1).
///
/// Any `Fn(u8, Option<&str>) -> Result<Package>` is a loader.
pub trait FrameworkLoader {
    fn load_framework(&self, id: u8, tag: Option<&str>) -> Result<Package>;
}

impl<F> FrameworkLoader for F
where
    F: Fn(u8, Option<&str>) -> Result<Package>,
{
    fn load_framework(&self, id: u8, tag: Option<&str>) -> Result<Package> {
        self(id, tag)
    }
}

/// All packages known while decoding an application, split into the "main" ones (decoded from
/// the application itself) and framework ones (dependencies).
#[derive(Default)]
pub struct ResourceTable {
    packages: Vec<Package>,
    by_id: FastMap<u8, usize>,
    by_name: FastMap<String, usize>,
    main: Vec<u8>,
    framework: Vec<u8>,
    package_id: Option<u8>,
    package_renamed: Option<String>,
    package_original: Option<String>,
    framework_tag: Option<String>,
    shared_library: bool,
    sparse_resources: bool,
    loader: Option<Box<dyn FrameworkLoader>>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_framework_loader(mut self, loader: impl FrameworkLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    pub fn with_framework_tag(mut self, tag: impl Into<String>) -> Self {
        self.framework_tag = Some(tag.into());
        self
    }

    /// Own package id, used for ids whose package byte is zero.
    pub fn with_package_id(mut self, id: u8) -> Self {
        self.package_id = Some(id);
        self
    }

    pub fn with_package_renamed(mut self, name: impl Into<String>) -> Self {
        self.package_renamed = Some(name.into());
        self
    }

    pub fn with_package_original(mut self, name: impl Into<String>) -> Self {
        self.package_original = Some(name.into());
        self
    }

    pub fn package_id(&self) -> Option<u8> {
        self.package_id
    }

    pub fn package_renamed(&self) -> Option<&str> {
        self.package_renamed.as_deref()
    }

    pub fn package_original(&self) -> Option<&str> {
        self.package_original.as_deref()
    }

    pub fn framework_tag(&self) -> Option<&str> {
        self.framework_tag.as_deref()
    }

    /// Whether the package was renamed at build time. Id 0 packages of renamed applications are
    /// not shared libraries.
    pub fn is_renamed(&self) -> bool {
        self.package_renamed.is_some() || self.package_original.is_some()
    }

    pub fn is_shared_library(&self) -> bool {
        self.shared_library
    }

    pub(crate) fn set_shared_library(&mut self, shared: bool) {
        self.shared_library = shared;
    }

    pub fn sparse_resources(&self) -> bool {
        self.sparse_resources
    }

    pub(crate) fn set_sparse_resources(&mut self, sparse: bool) {
        self.sparse_resources = sparse;
    }

    // Packages

    pub fn add_package(&mut self, package: Package, main: bool) -> Result<()> {
        let id = package.id();
        if self.by_id.contains_key(&id) {
            return Err(ArscError::DuplicatePackageId { id });
        }
        if self.by_name.contains_key(package.name()) {
            return Err(ArscError::DuplicatePackageName {
                name: package.name().to_owned(),
            });
        }

        debug!(
            "adding {} package `{}` (0x{id:02x})",
            if main { "main" } else { "framework" },
            package.name()
        );
        let idx = self.packages.len();
        self.by_id.insert(id, idx);
        self.by_name.insert(package.name().to_owned(), idx);
        self.packages.push(package);
        if main {
            self.main.push(id);
        } else {
            self.framework.push(id);
        }
        Ok(())
    }

    /// Add the packages of a decode: the most populated one as main, the others as framework.
    ///
    /// Returns the id of the main package.
    pub fn load_decoded(&mut self, data: ArscData) -> Result<u8> {
        let (main, rest) = data.split_main()?;
        let id = main.id();
        self.add_package(main, true)?;
        for package in rest {
            self.add_package(package, false)?;
        }
        if self.package_id.is_none() {
            self.package_id = Some(id);
        }
        Ok(id)
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    pub fn main_packages(&self) -> impl Iterator<Item = &Package> {
        self.main.iter().filter_map(|id| self.package(*id))
    }

    pub fn framework_packages(&self) -> impl Iterator<Item = &Package> {
        self.framework.iter().filter_map(|id| self.package(*id))
    }

    pub fn is_main(&self, id: u8) -> bool {
        self.main.contains(&id)
    }

    pub fn has_package(&self, id: u8) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn package(&self, id: u8) -> Option<&Package> {
        self.by_id.get(&id).map(|idx| &self.packages[*idx])
    }

    pub fn package_by_name(&self, name: &str) -> Option<&Package> {
        self.by_name.get(name).map(|idx| &self.packages[*idx])
    }

    /// The package with `id`, asking the framework loader for it if it is not loaded yet.
    pub fn package_or_load(&mut self, id: u8) -> Result<&Package> {
        if !self.has_package(id) {
            let loaded = match &self.loader {
                Some(loader) => loader.load_framework(id, self.framework_tag.as_deref())?,
                None => return Err(ArscError::UndefinedPackage { id }),
            };
            if loaded.id() != id {
                return Err(ArscError::FrameworkLoad {
                    id,
                    message: format!(
                        "loader returned package `{}` with id 0x{:02x}",
                        loaded.name(),
                        loaded.id()
                    ),
                });
            }
            info!("loaded framework package `{}` (0x{id:02x})", loaded.name());
            self.add_package(loaded, false)?;
        }
        self.package(id).ok_or(ArscError::UndefinedPackage { id })
    }

    /// The package with the most specs, ignoring the platform package. Falls back to loading
    /// the framework when only the platform package is present.
    pub fn highest_spec_package(&mut self) -> Result<&Package> {
        let mut best: Option<(u8, usize)> = None;
        for package in &self.packages {
            if package.name().eq_ignore_ascii_case("android") {
                continue;
            }
            let count = package.spec_count();
            if count > best.map_or(0, |(_, c)| c) {
                best = Some((package.id(), count));
            }
        }
        match best {
            Some((id, _)) => self.package_or_load(id),
            None => self.package_or_load(1),
        }
    }

    /// The package unqualified references are relative to.
    pub fn current_package(&mut self) -> Result<&Package> {
        if let Some(id) = self.package_id {
            return self.package_or_load(id);
        }
        if let [id] = self.main[..] {
            return self.package_or_load(id);
        }
        self.highest_spec_package()
    }

    // Ids

    /// `id` with a zero package byte replaced by this table's own package id.
    pub fn normalize(&self, id: ResourceId) -> ResourceId {
        if id.raw() >> 24 != 0 {
            return id;
        }
        let package = match self.package_id {
            Some(0) | None => DEFAULT_PACKAGE_ID,
            Some(pkg) => pkg,
        };
        ResourceId::from_parts(package, id.type_id(), id.entry_id())
    }

    /// Spec for `id` among the loaded packages.
    pub fn spec(&self, id: ResourceId) -> Option<&ResourceSpec> {
        let id = self.normalize(id);
        self.package(id.package_id())?.spec(id)
    }

    /// Spec for `id`, loading its package through the framework loader if needed. Load failures
    /// are logged and resolve to `None`.
    pub fn resolve_spec(&mut self, id: ResourceId) -> Option<&ResourceSpec> {
        let id = self.normalize(id);
        if let Err(e) = self.package_or_load(id.package_id()) {
            warn!("cannot resolve {id}: {e}");
            return None;
        }
        self.spec(id)
    }

    /// Value of `id` in the default configuration, or in the first configuration it has one in.
    pub fn default_value(&self, id: ResourceId) -> Option<&Value> {
        let id = self.normalize(id);
        let package = self.package(id.package_id())?;
        let spec = package.spec(id)?;
        let records = spec.records().iter().map(|r| package.record(*r));
        let mut first = None;
        for record in records {
            if package.config(record.config()).config().is_default() {
                return Some(record.value());
            }
            first.get_or_insert(record.value());
        }
        first
    }

    /// `@type/name`, `@package:type/name` for specs outside the main packages, `?` for theme
    /// attributes, and `@null` for null or dangling references.
    pub fn reference_name(&self, reference: &Reference) -> String {
        if reference.is_null() {
            return "@null".to_owned();
        }
        let Some(spec) = self.spec(reference.id) else {
            return "@null".to_owned();
        };
        let prefix = if reference.theme { '?' } else { '@' };
        let package_name = if self.is_main(spec.package_id()) {
            None
        } else {
            self.package(spec.package_id()).map(|p| p.name())
        };
        format!("{prefix}{}", spec.full_name(package_name, false))
    }
}

impl fmt::Debug for ResourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTable")
            .field("packages", &self.packages)
            .field("main", &self.main)
            .field("framework", &self.framework)
            .field("package_id", &self.package_id)
            .field("package_renamed", &self.package_renamed)
            .field("package_original", &self.package_original)
            .field("framework_tag", &self.framework_tag)
            .field("shared_library", &self.shared_library)
            .field("sparse_resources", &self.sparse_resources)
            .field("loader", &self.loader.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigDescriptor;
    use pretty_assertions::assert_eq;

    fn package(id: u8, name: &str, specs: u16) -> Package {
        let mut pkg = Package::new(id, name.to_owned());
        let ts = pkg.add_type_spec(0x01, "attr".to_owned(), u32::from(specs));
        let config = pkg.get_or_create_config(ConfigDescriptor::new());
        for entry in 0..specs {
            let spec = pkg
                .add_spec(
                    ts,
                    ResourceId::from_parts(id, 0x01, entry),
                    format!("attr{entry}"),
                    false,
                )
                .unwrap();
            pkg.add_record(spec, config, Value::null_reference(), false)
                .unwrap();
        }
        pkg
    }

    #[test]
    fn test_duplicate_packages_are_rejected() {
        let mut table = ResourceTable::new();
        table.add_package(package(0x7f, "app", 1), true).unwrap();

        assert!(matches!(
            table.add_package(package(0x7f, "other", 1), true),
            Err(ArscError::DuplicatePackageId { id: 0x7f })
        ));
        assert!(matches!(
            table.add_package(package(0x10, "app", 1), false),
            Err(ArscError::DuplicatePackageName { .. })
        ));
        assert_eq!(table.packages().count(), 1);
    }

    #[test]
    fn test_zero_package_ids_resolve_against_own_package() {
        let mut table = ResourceTable::new();
        assert_eq!(
            table.normalize(ResourceId::new(0x0001_0002)),
            ResourceId::new(0x0201_0002)
        );

        table = table.with_package_id(0x7f);
        table.add_package(package(0x7f, "app", 3), true).unwrap();
        let spec = table.spec(ResourceId::new(0x0001_0002)).unwrap();
        assert_eq!(spec.id(), ResourceId::new(0x7f01_0002));
        assert_eq!(spec.name(), "attr2");
    }

    #[test]
    fn test_framework_is_loaded_on_demand() {
        let mut table = ResourceTable::new()
            .with_framework_tag("tv")
            .with_framework_loader(|id: u8, tag: Option<&str>| -> Result<Package> {
                assert_eq!(tag, Some("tv"));
                Ok(package(id, "android", 2))
            });
        table.add_package(package(0x7f, "app", 1), true).unwrap();

        assert!(table.spec(ResourceId::new(0x0101_0001)).is_none());
        let spec = table.resolve_spec(ResourceId::new(0x0101_0001)).unwrap();
        assert_eq!(spec.name(), "attr1");
        assert_eq!(table.framework_packages().count(), 1);
        assert_eq!(
            table.reference_name(&Reference::new(ResourceId::new(0x0101_0001))),
            "@android:attr/attr1"
        );
    }

    #[test]
    fn test_loader_returning_wrong_package_is_an_error() {
        let mut table = ResourceTable::new()
            .with_framework_loader(|_: u8, _: Option<&str>| -> Result<Package> {
                Ok(package(0x03, "other", 0))
            });
        assert!(matches!(
            table.package_or_load(0x01),
            Err(ArscError::FrameworkLoad { id: 0x01, .. })
        ));
        assert!(table.resolve_spec(ResourceId::new(0x0101_0000)).is_none());
    }

    #[test]
    fn test_unresolvable_references_render_as_null() {
        let mut table = ResourceTable::new();
        table.add_package(package(0x7f, "app", 1), true).unwrap();

        assert_eq!(table.reference_name(&Reference::null()), "@null");
        assert_eq!(
            table.reference_name(&Reference::new(ResourceId::new(0x7f05_0000))),
            "@null"
        );
        assert!(table.resolve_spec(ResourceId::new(0x0101_0000)).is_none());

        let theme = Reference {
            id: ResourceId::new(0x7f01_0000),
            theme: true,
            dynamic: false,
        };
        assert_eq!(table.reference_name(&theme), "?attr/attr0");
    }

    #[test]
    fn test_highest_spec_package_skips_platform() {
        let mut table = ResourceTable::new();
        table.add_package(package(0x01, "android", 9), false).unwrap();
        table.add_package(package(0x7f, "app", 2), true).unwrap();
        table.add_package(package(0x80, "feature", 3), true).unwrap();

        assert_eq!(table.highest_spec_package().unwrap().id(), 0x80);
        assert_eq!(table.current_package().unwrap().id(), 0x80);

        table = table.with_package_id(0x7f);
        assert_eq!(table.current_package().unwrap().id(), 0x7f);
    }
}
