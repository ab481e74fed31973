//! Feature query model and the feature-source capability.

use crate::bounds::BoundingBox;
use crate::error::Result;
use crate::request::LayerRef;
use crate::types::ColumnSpec;

pub use rusqlite::types::Value;

/// Filter predicate handed to the feature source.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Opaque predicate in the host's filter dialect.
    Predicate(String),
    /// Bounding-box clause against a named geometry property.
    Bbox {
        property: String,
        bounds: BoundingBox,
    },
    And(Box<Filter>, Box<Filter>),
}

impl Filter {
    /// Combine an optional existing filter with an additional clause.
    pub fn and(existing: Option<Filter>, clause: Filter) -> Filter {
        match existing {
            Some(filter) => Filter::And(Box::new(filter), Box::new(clause)),
            None => clause,
        }
    }
}

/// One query against the host feature engine.
#[derive(Clone, Debug)]
pub struct FeatureQuery {
    pub type_name: LayerRef,
    pub srs: Option<String>,
    /// Property subset; `None` selects all properties.
    pub property_names: Option<Vec<String>>,
    pub filter: Option<Filter>,
}

/// Flat schema of a simple feature collection.
#[derive(Clone, Debug)]
pub struct SimpleSchema {
    pub geometry_column: String,
    pub geometry_type: wkb::reader::GeometryType,
    pub geometry_dimension: wkb::reader::Dimension,
    pub srs_id: u32,
    pub columns: Vec<ColumnSpec>,
}

/// One source feature: plain WKB geometry bytes plus property values in
/// schema column order.
#[derive(Clone, Debug)]
pub struct SourceFeature {
    pub geometry: Option<Vec<u8>>,
    pub properties: Vec<Value>,
}

/// A flat-schema collection ready to be written as a feature table.
#[derive(Clone, Debug)]
pub struct SimpleCollection {
    pub schema: SimpleSchema,
    pub features: Vec<SourceFeature>,
    /// Natural bounds of the collection as reported by the source.
    pub bounds: Option<BoundingBox>,
}

/// Result element of a feature query. Complex collections carry a nested
/// schema the GeoPackage format cannot represent; encountering one aborts the
/// build.
#[derive(Clone, Debug)]
pub enum FeatureCollection {
    Simple(SimpleCollection),
    Complex { type_name: String },
}

/// Capability interface over the host feature-query engine. One query may
/// yield several collections; each is written as its own table.
pub trait FeatureSource {
    fn get_features(&self, query: &FeatureQuery) -> Result<Vec<FeatureCollection>>;
}

#[cfg(test)]
mod tests {
    use super::Filter;
    use crate::bounds::BoundingBox;

    #[test]
    fn and_with_no_existing_filter_returns_the_clause() {
        let bbox = Filter::Bbox {
            property: "geom".to_string(),
            bounds: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
        };
        assert_eq!(Filter::and(None, bbox.clone()), bbox);
    }

    #[test]
    fn and_wraps_existing_filter() {
        let predicate = Filter::Predicate("speed > 50".to_string());
        let bbox = Filter::Bbox {
            property: "geom".to_string(),
            bounds: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
        };
        let combined = Filter::and(Some(predicate.clone()), bbox.clone());
        assert_eq!(combined, Filter::And(Box::new(predicate), Box::new(bbox)));
    }
}
