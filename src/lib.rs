//! A decoder for Android compiled resource tables (`resources.arsc`).
//!
//! The table is decoded in one sequential pass into an index-based model: a
//! [`ResourceTable`] of [`Package`]s, each owning its [`TypeSpec`]s, per-configuration
//! [`TypeInstance`]s, [`ResourceSpec`]s and their values.
//!
//! ```no_run
//! use arsc_decoder::ArscParser;
//!
//! let table = ArscParser::from_path("resources.arsc")?.decode_table()?;
//! for package in table.main_packages() {
//!     for spec in package.specs() {
//!         println!("{} {}", spec.id(), spec.full_name(None, false));
//!     }
//! }
//! # Ok::<(), arsc_decoder::ArscError>(())
//! ```
//!
//! Malformed input that can be worked around is logged through the `log` facade and returned in
//! [`ArscData::diagnostics`]; anything else fails the decode with an [`ArscError`].
#![deny(unused_must_use)]
#![forbid(unsafe_code)]

pub mod chunk_header;
pub mod config;
pub mod diagnostics;
pub mod err;
pub mod json_output;
pub mod model;
pub mod string_pool;
pub mod value;

mod arsc_parser;
mod table_decoder;
mod utils;

pub use self::arsc_parser::{ArscData, ArscParser, FlagsOffset, ParserSettings};
pub use self::config::ConfigDescriptor;
pub use self::diagnostics::Anomaly;
pub use self::err::{ArscError, Result};
pub use self::model::{
    FrameworkLoader, Package, Record, ResourceId, ResourceSpec, ResourceTable, TypeInstance,
    TypeSpec,
};
pub use self::string_pool::StringPool;
pub use self::value::{BagKind, BagValue, Reference, ScalarValue, Value};

pub(crate) type FastMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;
pub(crate) type FastSet<T> = hashbrown::HashSet<T, ahash::RandomState>;

#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub(crate) fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
