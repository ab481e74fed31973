//! Host spatial reference system registry.

use crate::bounds::BoundingBox;
use crate::error::Result;

/// Capability interface over the host's reference-system machinery. The
/// assembler never does CRS math itself; it only asks whether a reference is
/// geographic and requests bounding-box reprojection.
pub trait SrsRegistry {
    /// Whether the reference system uses geographic (lat/long) coordinates.
    fn is_geographic(&self, srs: &str) -> Result<bool>;

    /// Reproject a bounding box from one reference system to another.
    fn transform(&self, bounds: &BoundingBox, from: &str, to: &str) -> Result<BoundingBox>;
}

/// Identifier of the geographic reference used for lat/long catalog bounds.
pub const EPSG_4326: &str = "EPSG:4326";

/// Numeric code for `gpkg_spatial_ref_sys`, parsed from identifiers like
/// `EPSG:4326` or a bare `4326`.
pub fn srs_code(srs: &str) -> Option<u32> {
    srs.rsplit(':').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::srs_code;

    #[test]
    fn srs_code_accepts_common_shapes() {
        assert_eq!(srs_code("EPSG:4326"), Some(4326));
        assert_eq!(srs_code("urn:ogc:def:crs:EPSG:3857"), Some(3857));
        assert_eq!(srs_code("26918"), Some(26918));
        assert_eq!(srs_code("EPSG:WGS84"), None);
    }
}
