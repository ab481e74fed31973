//! Map rendering model and the tile-renderer capability.

use crate::bounds::BoundingBox;
use crate::catalog::{LayerInfo, Style};
use crate::error::Result;
use crate::request::{TileCoverage, TileGrid};

/// Options mapped onto the tile renderer alongside the map request proper.
#[derive(Clone, Debug)]
pub struct FormatOptions {
    /// GeoPackage tile (0,0) is the upper-left corner of the matrix at every
    /// zoom level, so the renderer must invert its native bottom-up row
    /// ordering. The assembler always sets this.
    pub flip_rows: bool,
    /// Raw tile image format; required when the renderer cannot infer one.
    pub image_format: Option<String>,
    pub coverage: Option<TileCoverage>,
    /// Well-known grid set to render against.
    pub grid_set_name: Option<String>,
    /// Explicit per-zoom grid definitions; takes precedence over
    /// `grid_set_name`.
    pub grids: Option<Vec<TileGrid>>,
}

/// One rendering request covering all source layers of a tiles entry.
#[derive(Clone, Debug)]
pub struct MapRequest {
    pub layers: Vec<LayerInfo>,
    pub bounds: BoundingBox,
    pub srs: String,
    pub styles: Vec<Style>,
    pub bg_color: Option<String>,
    pub transparent: bool,
    pub options: FormatOptions,
}

/// Tile matrix definition for one zoom level, as recorded in
/// `gpkg_tile_matrix`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileMatrix {
    pub zoom_level: u32,
    pub matrix_width: u64,
    pub matrix_height: u64,
    pub tile_width: u32,
    pub tile_height: u32,
    pub pixel_x_size: f64,
    pub pixel_y_size: f64,
}

impl From<TileGrid> for TileMatrix {
    fn from(grid: TileGrid) -> Self {
        Self {
            zoom_level: grid.zoom_level,
            matrix_width: grid.matrix_width,
            matrix_height: grid.matrix_height,
            tile_width: grid.tile_width,
            tile_height: grid.tile_height,
            pixel_x_size: grid.pixel_x_size,
            pixel_y_size: grid.pixel_y_size,
        }
    }
}

/// One rendered tile. Row ordering follows the request's `flip_rows` option.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub zoom_level: u32,
    pub column: u64,
    pub row: u64,
    pub data: Vec<u8>,
}

/// A rendered tile pyramid: matrix definitions plus the tiles themselves.
#[derive(Clone, Debug, Default)]
pub struct TilePyramid {
    pub matrices: Vec<TileMatrix>,
    pub tiles: Vec<Tile>,
}

/// Capability interface over the host map-rendering engine. The assembler
/// never rasterizes tiles itself.
pub trait TileRenderer {
    fn render_pyramid(&self, request: &MapRequest) -> Result<TilePyramid>;
}
