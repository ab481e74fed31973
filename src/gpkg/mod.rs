//! GeoPackage container writer.
//!
//! Creates the SQLite file with the mandatory `gpkg_*` metadata tables,
//! appends feature and tile layers, and builds RTree spatial indexes.

mod container;
mod entry;
mod features;
mod functions;
mod geometry;
mod sql;
mod tiles;

pub use container::GeoPackage;
pub use entry::{ContentsEntry, EntryType, FeatureEntry, TileEntry};
