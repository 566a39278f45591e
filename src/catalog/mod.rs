//! Catalog module
//!
//! The Singer catalog model shared by discovery and sync: streams, schemas
//! and the metadata that drives stream and field selection.

mod types;

pub use types::{Catalog, CatalogEntry, FieldMetadata, Inclusion, MetadataEntry};

#[cfg(test)]
mod tests;
