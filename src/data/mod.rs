//! Data layer: schema, core record types, and loading.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader  │  parse file → rows of named fields
//!   └──────────┘
//!        │  RawRecord::from_fields (field names checked against schema)
//!        ▼
//!   ┌──────────────────┐
//!   │ ReferenceDataset │  Arc<[RawRecord]>, observed values, fingerprint
//!   └──────────────────┘
//! ```

pub mod loader;
pub mod model;
pub mod schema;
