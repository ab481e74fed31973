use crate::bounds::BoundingBox;

/// Metadata recorded in `gpkg_contents` for a feature table. The table's
/// SRS comes from the collection schema being written.
#[derive(Clone, Debug)]
pub struct FeatureEntry {
    pub table_name: String,
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub bounds: Option<BoundingBox>,
}

/// Metadata recorded in `gpkg_contents` and `gpkg_tile_matrix_set` for a
/// tile pyramid.
#[derive(Clone, Debug)]
pub struct TileEntry {
    pub table_name: String,
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub srs_id: u32,
    pub bounds: BoundingBox,
}

/// Kind of content a `gpkg_contents` row describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryType {
    Features,
    Tiles,
}

impl EntryType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Features => "features",
            Self::Tiles => "tiles",
        }
    }

    pub(crate) fn from_str(value: &str) -> Option<Self> {
        match value {
            "features" => Some(Self::Features),
            "tiles" => Some(Self::Tiles),
            _ => None,
        }
    }
}

/// Read-back view of one `gpkg_contents` row.
#[derive(Clone, Debug)]
pub struct ContentsEntry {
    pub table_name: String,
    pub entry_type: Option<EntryType>,
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub bounds: Option<BoundingBox>,
    pub srs_id: Option<u32>,
}
