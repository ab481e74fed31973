//! GeoPackage assembly for WPS-style build requests, built on top of rusqlite.
//!
//! ## Overview
//!
//! - [`BuildRequest`] describes which layers go into the container, parsed
//!   from the XML dialect via [`parse_request`] or constructed directly.
//! - [`Assembler`] runs a request against a set of host capabilities and
//!   produces the finished `.gpkg` file.
//! - [`GeoPackage`] is the container writer underneath, usable on its own for
//!   writing feature tables and tile pyramids.
//!
//! The assembler never talks to a catalog, feature engine, renderer or
//! reference-system database directly. The host supplies those behind the
//! [`Catalog`], [`FeatureSource`], [`TileRenderer`], [`SrsRegistry`] and
//! [`ResourceManager`] traits, and the assembler orchestrates them:
//!
//! ```no_run
//! use gpkg_assembly::{Assembler, parse_request};
//! # fn capabilities() -> (
//! #     Box<dyn gpkg_assembly::Catalog>,
//! #     Box<dyn gpkg_assembly::FeatureSource>,
//! #     Box<dyn gpkg_assembly::TileRenderer>,
//! #     Box<dyn gpkg_assembly::SrsRegistry>,
//! #     Box<dyn gpkg_assembly::ResourceManager>,
//! # ) { unimplemented!() }
//!
//! let request = parse_request(
//!     r#"<geopackage name="world">
//!          <features name="roads">
//!            <featuretype>topp:roads</featuretype>
//!          </features>
//!        </geopackage>"#,
//! )?;
//!
//! let (catalog, features, renderer, srs, resources) = capabilities();
//! let assembler = Assembler::new(&*catalog, &*features, &*renderer, &*srs, &*resources);
//! let output = assembler.execute(&request)?;
//! println!("{output:?}");
//! # Ok::<(), gpkg_assembly::AssemblyError>(())
//! ```
//!
//! ## Container writing
//!
//! [`GeoPackage`] writes the mandatory `gpkg_*` metadata tables, feature
//! tables with GeoPackage binary geometries, tile pyramids, and RTree spatial
//! indexes:
//!
//! ```no_run
//! use gpkg_assembly::{
//!     BoundingBox, ColumnSpec, ColumnType, FeatureEntry, GeoPackage, SimpleCollection,
//!     SimpleSchema, SourceFeature, Value,
//! };
//!
//! let gpkg = GeoPackage::create("data.gpkg")?;
//! let collection = SimpleCollection {
//!     schema: SimpleSchema {
//!         geometry_column: "geom".to_string(),
//!         geometry_type: gpkg_assembly::GeometryType::Point,
//!         geometry_dimension: gpkg_assembly::Dimension::Xy,
//!         srs_id: 4326,
//!         columns: vec![ColumnSpec::new("name", ColumnType::Varchar)],
//!     },
//!     features: vec![SourceFeature {
//!         geometry: None,
//!         properties: vec![Value::Text("alpha".to_string())],
//!     }],
//!     bounds: Some(BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
//! };
//! let entry = FeatureEntry {
//!     table_name: "points".to_string(),
//!     identifier: None,
//!     description: None,
//!     bounds: collection.bounds,
//! };
//! gpkg.add_features(&entry, &collection)?;
//! gpkg.create_spatial_index("points")?;
//! gpkg.close()?;
//! # Ok::<(), gpkg_assembly::AssemblyError>(())
//! ```
mod assembler;
mod bounds;
mod catalog;
mod error;
mod features;
mod gpkg;
mod render;
mod request;
mod resource;
mod srs;
mod types;
mod xml;

pub use assembler::{Assembler, AssemblyOutput};
pub use bounds::BoundingBox;
pub use catalog::{Catalog, FeatureTypeInfo, LayerInfo, Style};
pub use error::{AssemblyError, Result};
pub use features::{
    FeatureCollection, FeatureQuery, FeatureSource, Filter, SimpleCollection, SimpleSchema,
    SourceFeature, Value,
};
pub use gpkg::{ContentsEntry, EntryType, FeatureEntry, GeoPackage, TileEntry};
pub use render::{FormatOptions, MapRequest, Tile, TileMatrix, TilePyramid, TileRenderer};
pub use request::{
    BuildRequest, FeaturesLayer, LayerRef, LayerSpec, TileCoverage, TileGrid, TilesLayer,
};
pub use resource::{
    ExecutionResourceManager, GPKG_MIME_TYPE, ResourceManager, create_temp_dir,
};
pub use srs::{EPSG_4326, SrsRegistry, srs_code};
pub use types::{ColumnSpec, ColumnType};
pub use xml::parse_request;

// Re-export types used in public fields to keep the public API stable.
pub use wkb::reader::{Dimension, GeometryType};
