//! Parsed representation of a GeoPackage build request.
//!
//! A [`BuildRequest`] is constructed once, either programmatically or from the
//! XML dialect via [`crate::parse_request`], and never mutated during
//! assembly. Each requested layer is a [`LayerSpec`], a tagged union of the
//! two layer kinds the container supports.

use std::fmt;
use std::path::PathBuf;

use crate::bounds::BoundingBox;

/// Qualified reference to a hosted layer or feature type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayerRef {
    pub namespace: Option<String>,
    pub local: String,
}

impl LayerRef {
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    pub fn qualified(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }

    /// Split a `prefix:name` string into a qualified reference; a bare name
    /// yields an unqualified one.
    pub fn parse(value: &str) -> Self {
        match value.split_once(':') {
            Some((namespace, local)) if !namespace.is_empty() => {
                Self::qualified(namespace, local)
            }
            _ => Self::new(value),
        }
    }
}

impl fmt::Display for LayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}:{}", self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// A complete build request: which layers go into the container and where the
/// finished file should end up.
#[derive(Clone, Debug, Default)]
pub struct BuildRequest {
    /// Output package name; the file is written as `<name>.gpkg`.
    pub name: String,
    pub layers: Vec<LayerSpec>,
    /// Caller-specified output directory. Only honored together with
    /// `remove = false`.
    pub path: Option<PathBuf>,
    /// Whether the output is managed (and eventually removed) by the host
    /// resource store. Defaults to `true` when unset.
    pub remove: Option<bool>,
}

impl BuildRequest {
    pub fn should_remove(&self) -> bool {
        self.remove.unwrap_or(true)
    }
}

/// One requested layer, either vector features or a rendered tile pyramid.
#[derive(Clone, Debug)]
pub enum LayerSpec {
    Features(FeaturesLayer),
    Tiles(TilesLayer),
}

impl LayerSpec {
    /// Name of the user table this layer produces in the container.
    pub fn table_name(&self) -> &str {
        match self {
            Self::Features(layer) => &layer.name,
            Self::Tiles(layer) => &layer.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Features(layer) => layer.description.as_deref(),
            Self::Tiles(layer) => layer.description.as_deref(),
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Features(layer) => layer.identifier.as_deref(),
            Self::Tiles(layer) => layer.identifier.as_deref(),
        }
    }
}

/// Specification of a vector feature layer.
#[derive(Clone, Debug)]
pub struct FeaturesLayer {
    pub name: String,
    pub description: Option<String>,
    pub identifier: Option<String>,
    /// Source feature type in the host catalog.
    pub feature_type: LayerRef,
    /// Explicit spatial reference; when unset, the feature type's declared
    /// reference is used.
    pub srs: Option<String>,
    /// Optional property subset; `None` selects all properties.
    pub property_names: Option<Vec<String>>,
    /// Optional filter predicate in the host's filter dialect.
    pub filter: Option<String>,
    pub bbox: Option<BoundingBox>,
    /// Whether to build a spatial index for the written table.
    pub indexed: bool,
}

/// Specification of a rendered tile pyramid layer.
#[derive(Clone, Debug)]
pub struct TilesLayer {
    pub name: String,
    pub description: Option<String>,
    pub identifier: Option<String>,
    /// Source layers in the host catalog, rendered together.
    pub layers: Vec<LayerRef>,
    /// Explicit bounding box; when unset, derived from the source layers.
    pub bbox: Option<BoundingBox>,
    /// Explicit spatial reference; when unset, the first source layer's
    /// declared reference is used.
    pub srs: Option<String>,
    pub bg_color: Option<String>,
    pub transparent: bool,
    /// Style document URL, applied to the whole rendering.
    pub sld_url: Option<String>,
    /// Inline style document body; takes precedence over `sld_url`.
    pub sld_body: Option<String>,
    /// Named catalog styles, order-matched to `layers`.
    pub styles: Option<Vec<String>>,
    /// Raw tile image format, e.g. `image/png`.
    pub format: Option<String>,
    pub coverage: Option<TileCoverage>,
    pub grid_set_name: Option<String>,
    pub grids: Option<Vec<TileGrid>>,
}

/// Zoom/row/column window restricting which tiles are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileCoverage {
    pub min_zoom: Option<u32>,
    pub max_zoom: Option<u32>,
    pub min_column: Option<u64>,
    pub max_column: Option<u64>,
    pub min_row: Option<u64>,
    pub max_row: Option<u64>,
}

/// Explicit definition of one zoom level of a tile grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGrid {
    pub zoom_level: u32,
    pub matrix_width: u64,
    pub matrix_height: u64,
    pub tile_width: u32,
    pub tile_height: u32,
    pub pixel_x_size: f64,
    pub pixel_y_size: f64,
}
