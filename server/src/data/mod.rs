//! Data storage layer
//!
//! - `sqlite` - Embedded database holding tenants, data sources, records and dashboards
//! - `traits` - `TransactionalRepository` and the read-only `RecordStore`
//! - `types` - Row types, chart definitions, record payloads and pipeline stages
//! - `error` - Unified error type

pub mod error;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use error::DataError;
pub use sqlite::SqliteService;
pub use traits::{RecordStore, TransactionalRepository};
