//! `crudform` - A local competitor registry with validated forms
//!
//! This library provides the record store, the declarative validation schema,
//! name search, the postal code (CEP) lookup and the headless form session
//! that ties them together.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod postal;
pub mod record;
pub mod search;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use form::{FormMode, FormSession};
pub use logging::init_logging;
pub use postal::{PostalLookup, ViaCepClient};
pub use record::{AddressFields, Record, RecordId};
pub use search::filter_by_name;
pub use storage::{KeyValueStore, MemoryKeyValueStore, RecordStore, SqliteKeyValueStore};
pub use validation::{Field, Schema, ValidationReport};
