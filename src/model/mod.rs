//! The in-memory resource model.
//!
//! A [`ResourceTable`] owns [`Package`]s. Each package owns its specs, type specs, type
//! instances (one per configuration) and records in flat arenas, addressed by the small index
//! types below. Cross references between them are indices, never pointers, so a package can be
//! moved between tables as a unit.

mod package;
mod resource_id;
mod spec;
mod table;
mod type_spec;

pub(crate) use self::package::dummy_name;
pub use self::package::{DUMMY_NAME_PREFIX, Package, RecordAdded};
pub use self::resource_id::{DEFAULT_PACKAGE_ID, ResourceId};
pub use self::spec::{Record, ResourceSpec, TypeInstance};
pub use self::table::{FrameworkLoader, ResourceTable};
pub use self::type_spec::TypeSpec;

macro_rules! arena_index {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub(crate) usize);

            impl $name {
                pub fn index(self) -> usize {
                    self.0
                }
            }
        )*
    };
}

arena_index!(
    /// Index of a [`ResourceSpec`] within its package.
    SpecId,
    /// Index of a [`TypeSpec`] within its package.
    TypeSpecId,
    /// Index of a [`TypeInstance`] within its package.
    ConfigId,
    /// Index of a [`Record`] within its package.
    RecordId,
);
