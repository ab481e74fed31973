//! Read-only view of the host layer catalog.

use crate::bounds::BoundingBox;
use crate::request::LayerRef;

/// Style selection handed to the tile renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Style {
    /// Named style resolved from the catalog.
    Named(String),
    /// Inline style document body.
    Body(String),
    /// External style document URL.
    Url(String),
}

/// Catalog metadata for a vector feature type.
#[derive(Clone, Debug)]
pub struct FeatureTypeInfo {
    pub name: LayerRef,
    /// Declared spatial reference, e.g. `EPSG:4326`.
    pub srs: String,
    /// Default geometry property, used to synthesize bounding-box filters.
    pub geometry_column: String,
}

/// Catalog metadata for a renderable layer.
#[derive(Clone, Debug)]
pub struct LayerInfo {
    pub name: LayerRef,
    /// Native spatial reference of the layer.
    pub srs: String,
    /// Bounds in the native reference.
    pub native_bounds: Option<BoundingBox>,
    /// Bounds in geographic (long/lat) coordinates.
    pub lat_lon_bounds: Option<BoundingBox>,
    pub default_style: Style,
}

/// Lookup interface over the host catalog. A missing entry is `None`; the
/// assembler decides whether that is an error.
pub trait Catalog {
    fn feature_type(&self, reference: &LayerRef) -> Option<FeatureTypeInfo>;
    fn layer(&self, reference: &LayerRef) -> Option<LayerInfo>;
    fn style(&self, name: &str) -> Option<Style>;
}
