//! XML dialect for GeoPackage build requests.
//!
//! The document root is `<geopackage name="..." path="..." remove="...">`
//! with one `<features>` or `<tiles>` element per requested layer:
//!
//! ```xml
//! <geopackage name="world">
//!   <features name="roads" identifier="road network">
//!     <description>all roads</description>
//!     <featuretype>topp:roads</featuretype>
//!     <srs>EPSG:26918</srs>
//!     <bbox minx="0" miny="0" maxx="100" maxy="100"/>
//!     <propertynames>name,lanes</propertynames>
//!     <filter>lanes &gt; 2</filter>
//!     <indexed>true</indexed>
//!   </features>
//!   <tiles name="parks">
//!     <layers>topp:parks,topp:lakes</layers>
//!     <styles>green,blue</styles>
//!     <srs>EPSG:3857</srs>
//!     <bgcolor>0xFFFFFF</bgcolor>
//!     <transparent>false</transparent>
//!     <format>image/png</format>
//!     <coverage minZoom="10" maxZoom="12"/>
//!     <gridset>
//!       <name>EPSG:3857</name>
//!     </gridset>
//!   </tiles>
//! </geopackage>
//! ```
//!
//! A `<gridset>` may instead carry explicit per-zoom definitions as
//! `<grids><grid zoom="..." width="..." height="..." tilewidth="..."
//! tileheight="..." pixelxsize="..." pixelysize="..."/></grids>`, and a
//! `<tiles>` element accepts `<sld>` (style document URL) or `<sldbody>`
//! (inline document) in place of `<styles>`. Unknown elements are rejected.

use std::path::PathBuf;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::bounds::BoundingBox;
use crate::error::{AssemblyError, Result};
use crate::request::{
    BuildRequest, FeaturesLayer, LayerRef, LayerSpec, TileCoverage, TileGrid, TilesLayer,
};

/// Parse a build request document.
pub fn parse_request(xml: &str) -> Result<BuildRequest> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut request: Option<BuildRequest> = None;
    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.name().as_ref() {
                b"geopackage" if request.is_none() => {
                    request = Some(parse_root_attributes(&start)?);
                }
                b"features" => {
                    let request = request.as_mut().ok_or_else(missing_root)?;
                    request
                        .layers
                        .push(LayerSpec::Features(parse_features(&mut reader, &start)?));
                }
                b"tiles" => {
                    let request = request.as_mut().ok_or_else(missing_root)?;
                    request
                        .layers
                        .push(LayerSpec::Tiles(parse_tiles(&mut reader, &start)?));
                }
                other => return Err(unexpected_element(other)),
            },
            Event::Empty(start) => match start.name().as_ref() {
                b"geopackage" if request.is_none() => {
                    request = Some(parse_root_attributes(&start)?);
                }
                other => return Err(unexpected_element(other)),
            },
            Event::End(_) => {}
            Event::Eof => break,
            _ => {}
        }
    }

    request.ok_or_else(missing_root)
}

fn missing_root() -> AssemblyError {
    AssemblyError::InvalidRequest("missing <geopackage> root element".to_string())
}

fn unexpected_element(name: &[u8]) -> AssemblyError {
    AssemblyError::InvalidRequest(format!(
        "unexpected element <{}>",
        String::from_utf8_lossy(name)
    ))
}

fn parse_root_attributes(start: &BytesStart<'_>) -> Result<BuildRequest> {
    let mut request = BuildRequest {
        name: require_attr(start, "name")?,
        ..BuildRequest::default()
    };
    if let Some(path) = attr_value(start, "path")? {
        // The original dialect allows a file URL here.
        let path = path.strip_prefix("file://").unwrap_or(&path);
        request.path = Some(PathBuf::from(path));
    }
    if let Some(remove) = attr_value(start, "remove")? {
        request.remove = Some(parse_bool(&remove)?);
    }
    Ok(request)
}

fn parse_features(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<FeaturesLayer> {
    let mut layer = FeaturesLayer {
        name: require_attr(start, "name")?,
        description: None,
        identifier: attr_value(start, "identifier")?,
        feature_type: LayerRef::new(""),
        srs: None,
        property_names: None,
        filter: None,
        bbox: None,
        indexed: false,
    };
    let mut feature_type = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => match element.name().as_ref() {
                b"description" => layer.description = Some(read_text(reader, &element)?),
                b"featuretype" => {
                    feature_type = Some(LayerRef::parse(&read_text(reader, &element)?));
                }
                b"srs" => layer.srs = Some(read_text(reader, &element)?),
                b"propertynames" => {
                    layer.property_names = Some(parse_list(&read_text(reader, &element)?));
                }
                b"filter" => layer.filter = Some(read_text(reader, &element)?),
                b"indexed" => layer.indexed = parse_bool(&read_text(reader, &element)?)?,
                b"bbox" => {
                    layer.bbox = Some(parse_bbox(&element)?);
                    reader.read_to_end(element.name())?;
                }
                other => return Err(unexpected_element(other)),
            },
            Event::Empty(element) => match element.name().as_ref() {
                b"bbox" => layer.bbox = Some(parse_bbox(&element)?),
                other => return Err(unexpected_element(other)),
            },
            Event::End(end) if end.name() == start.name() => break,
            Event::Eof => return Err(missing_end(start)),
            _ => {}
        }
    }

    layer.feature_type = feature_type.ok_or_else(|| {
        AssemblyError::InvalidRequest(format!(
            "features layer {} is missing <featuretype>",
            layer.name
        ))
    })?;
    Ok(layer)
}

fn parse_tiles(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<TilesLayer> {
    let mut layer = TilesLayer {
        name: require_attr(start, "name")?,
        description: None,
        identifier: attr_value(start, "identifier")?,
        layers: Vec::new(),
        bbox: None,
        srs: None,
        bg_color: None,
        transparent: false,
        sld_url: None,
        sld_body: None,
        styles: None,
        format: None,
        coverage: None,
        grid_set_name: None,
        grids: None,
    };

    loop {
        match reader.read_event()? {
            Event::Start(element) => match element.name().as_ref() {
                b"description" => layer.description = Some(read_text(reader, &element)?),
                b"layers" => {
                    layer.layers = parse_list(&read_text(reader, &element)?)
                        .iter()
                        .map(|name| LayerRef::parse(name))
                        .collect();
                }
                b"styles" => layer.styles = Some(parse_list(&read_text(reader, &element)?)),
                b"sld" => layer.sld_url = Some(read_text(reader, &element)?),
                b"sldbody" => layer.sld_body = Some(read_text(reader, &element)?),
                b"srs" => layer.srs = Some(read_text(reader, &element)?),
                b"bgcolor" => layer.bg_color = Some(read_text(reader, &element)?),
                b"transparent" => layer.transparent = parse_bool(&read_text(reader, &element)?)?,
                b"format" => layer.format = Some(read_text(reader, &element)?),
                b"bbox" => {
                    layer.bbox = Some(parse_bbox(&element)?);
                    reader.read_to_end(element.name())?;
                }
                b"coverage" => {
                    layer.coverage = Some(parse_coverage(&element)?);
                    reader.read_to_end(element.name())?;
                }
                b"gridset" => parse_grid_set(reader, &element, &mut layer)?,
                other => return Err(unexpected_element(other)),
            },
            Event::Empty(element) => match element.name().as_ref() {
                b"bbox" => layer.bbox = Some(parse_bbox(&element)?),
                b"coverage" => layer.coverage = Some(parse_coverage(&element)?),
                other => return Err(unexpected_element(other)),
            },
            Event::End(end) if end.name() == start.name() => break,
            Event::Eof => return Err(missing_end(start)),
            _ => {}
        }
    }

    if layer.layers.is_empty() {
        return Err(AssemblyError::InvalidRequest(format!(
            "tiles layer {} is missing <layers>",
            layer.name
        )));
    }
    Ok(layer)
}

fn parse_grid_set(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    layer: &mut TilesLayer,
) -> Result<()> {
    loop {
        match reader.read_event()? {
            Event::Start(element) => match element.name().as_ref() {
                b"name" => layer.grid_set_name = Some(read_text(reader, &element)?),
                b"grids" => layer.grids = Some(parse_grids(reader, &element)?),
                other => return Err(unexpected_element(other)),
            },
            Event::End(end) if end.name() == start.name() => return Ok(()),
            Event::Eof => return Err(missing_end(start)),
            _ => {}
        }
    }
}

fn parse_grids(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Vec<TileGrid>> {
    let mut grids = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Empty(element) if element.name().as_ref() == b"grid" => {
                grids.push(parse_grid(&element)?);
            }
            Event::Start(element) if element.name().as_ref() == b"grid" => {
                grids.push(parse_grid(&element)?);
                reader.read_to_end(element.name())?;
            }
            Event::Start(element) | Event::Empty(element) => {
                return Err(unexpected_element(element.name().as_ref()));
            }
            Event::End(end) if end.name() == start.name() => return Ok(grids),
            Event::Eof => return Err(missing_end(start)),
            _ => {}
        }
    }
}

fn parse_grid(element: &BytesStart<'_>) -> Result<TileGrid> {
    Ok(TileGrid {
        zoom_level: parse_number(element, "zoom")?,
        matrix_width: parse_number(element, "width")?,
        matrix_height: parse_number(element, "height")?,
        tile_width: parse_number(element, "tilewidth")?,
        tile_height: parse_number(element, "tileheight")?,
        pixel_x_size: parse_number(element, "pixelxsize")?,
        pixel_y_size: parse_number(element, "pixelysize")?,
    })
}

fn parse_bbox(element: &BytesStart<'_>) -> Result<BoundingBox> {
    Ok(BoundingBox::new(
        parse_number(element, "minx")?,
        parse_number(element, "miny")?,
        parse_number(element, "maxx")?,
        parse_number(element, "maxy")?,
    ))
}

fn parse_coverage(element: &BytesStart<'_>) -> Result<TileCoverage> {
    Ok(TileCoverage {
        min_zoom: parse_optional_number(element, "minZoom")?,
        max_zoom: parse_optional_number(element, "maxZoom")?,
        min_column: parse_optional_number(element, "minColumn")?,
        max_column: parse_optional_number(element, "maxColumn")?,
        min_row: parse_optional_number(element, "minRow")?,
        max_row: parse_optional_number(element, "maxRow")?,
    })
}

fn read_text(reader: &mut Reader<&[u8]>, element: &BytesStart<'_>) -> Result<String> {
    let text = reader.read_text(element.name())?;
    Ok(text.into_owned())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(AssemblyError::InvalidRequest(format!(
            "expected a boolean, got '{other}'"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(element: &BytesStart<'_>, name: &str) -> Result<T> {
    let value = require_attr(element, name)?;
    value.trim().parse().map_err(|_| {
        AssemblyError::InvalidRequest(format!("attribute {name} has invalid value '{value}'"))
    })
}

fn parse_optional_number<T: std::str::FromStr>(
    element: &BytesStart<'_>,
    name: &str,
) -> Result<Option<T>> {
    match attr_value(element, name)? {
        Some(value) => {
            let parsed = value.trim().parse().map_err(|_| {
                AssemblyError::InvalidRequest(format!(
                    "attribute {name} has invalid value '{value}'"
                ))
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn attr_value(element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn require_attr(element: &BytesStart<'_>, name: &str) -> Result<String> {
    attr_value(element, name)?.ok_or_else(|| {
        AssemblyError::InvalidRequest(format!(
            "<{}> requires a {name} attribute",
            String::from_utf8_lossy(element.name().as_ref())
        ))
    })
}

fn missing_end(start: &BytesStart<'_>) -> AssemblyError {
    AssemblyError::InvalidRequest(format!(
        "unclosed <{}> element",
        String::from_utf8_lossy(start.name().as_ref())
    ))
}

#[cfg(test)]
mod tests {
    use super::parse_request;
    use crate::AssemblyError;
    use crate::bounds::BoundingBox;
    use crate::request::{LayerRef, LayerSpec};
    use std::path::Path;

    #[test]
    fn parses_a_full_request() {
        let xml = r#"
            <geopackage name="world" path="file:///data/out" remove="false">
              <features name="roads" identifier="road network">
                <description>all roads</description>
                <featuretype>topp:roads</featuretype>
                <srs>EPSG:26918</srs>
                <bbox minx="0" miny="10" maxx="100" maxy="110"/>
                <propertynames>name, lanes</propertynames>
                <filter>lanes &gt; 2</filter>
                <indexed>true</indexed>
              </features>
              <tiles name="parks">
                <layers>topp:parks,topp:lakes</layers>
                <styles>green,blue</styles>
                <srs>EPSG:3857</srs>
                <bgcolor>0xFFFFFF</bgcolor>
                <transparent>true</transparent>
                <format>image/png</format>
                <coverage minZoom="10" maxZoom="12"/>
                <gridset>
                  <grids>
                    <grid zoom="10" width="1024" height="1024" tilewidth="256"
                          tileheight="256" pixelxsize="152.87" pixelysize="152.87"/>
                  </grids>
                </gridset>
              </tiles>
            </geopackage>
        "#;
        let request = parse_request(xml).expect("valid request");

        assert_eq!(request.name, "world");
        assert_eq!(request.path.as_deref(), Some(Path::new("/data/out")));
        assert_eq!(request.remove, Some(false));
        assert_eq!(request.layers.len(), 2);

        let features = match &request.layers[0] {
            LayerSpec::Features(layer) => layer,
            other => panic!("expected features layer, got {other:?}"),
        };
        assert_eq!(features.name, "roads");
        assert_eq!(features.identifier.as_deref(), Some("road network"));
        assert_eq!(features.description.as_deref(), Some("all roads"));
        assert_eq!(features.feature_type, LayerRef::qualified("topp", "roads"));
        assert_eq!(features.srs.as_deref(), Some("EPSG:26918"));
        assert_eq!(features.bbox, Some(BoundingBox::new(0.0, 10.0, 100.0, 110.0)));
        assert_eq!(
            features.property_names,
            Some(vec!["name".to_string(), "lanes".to_string()])
        );
        assert_eq!(features.filter.as_deref(), Some("lanes > 2"));
        assert!(features.indexed);

        let tiles = match &request.layers[1] {
            LayerSpec::Tiles(layer) => layer,
            other => panic!("expected tiles layer, got {other:?}"),
        };
        assert_eq!(tiles.name, "parks");
        assert_eq!(
            tiles.layers,
            vec![
                LayerRef::qualified("topp", "parks"),
                LayerRef::qualified("topp", "lakes")
            ]
        );
        assert_eq!(
            tiles.styles,
            Some(vec!["green".to_string(), "blue".to_string()])
        );
        assert_eq!(tiles.srs.as_deref(), Some("EPSG:3857"));
        assert_eq!(tiles.bg_color.as_deref(), Some("0xFFFFFF"));
        assert!(tiles.transparent);
        assert_eq!(tiles.format.as_deref(), Some("image/png"));

        let coverage = tiles.coverage.expect("coverage");
        assert_eq!(coverage.min_zoom, Some(10));
        assert_eq!(coverage.max_zoom, Some(12));
        assert_eq!(coverage.min_row, None);

        let grids = tiles.grids.as_ref().expect("grids");
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].zoom_level, 10);
        assert_eq!(grids[0].matrix_width, 1024);
        assert_eq!(grids[0].tile_width, 256);
        assert_eq!(grids[0].pixel_x_size, 152.87);
    }

    #[test]
    fn gridset_may_name_a_well_known_grid() {
        let xml = r#"
            <geopackage name="world">
              <tiles name="parks">
                <layers>parks</layers>
                <gridset>
                  <name>EPSG:4326</name>
                </gridset>
              </tiles>
            </geopackage>
        "#;
        let request = parse_request(xml).expect("valid request");
        let tiles = match &request.layers[0] {
            LayerSpec::Tiles(layer) => layer,
            other => panic!("expected tiles layer, got {other:?}"),
        };
        assert_eq!(tiles.grid_set_name.as_deref(), Some("EPSG:4326"));
        assert!(tiles.grids.is_none());
    }

    #[test]
    fn rejects_unknown_elements() {
        let xml = r#"
            <geopackage name="world">
              <features name="roads">
                <featuretype>roads</featuretype>
                <mystery/>
              </features>
            </geopackage>
        "#;
        let err = parse_request(xml).expect_err("unknown element");
        assert!(matches!(err, AssemblyError::InvalidRequest(_)));
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn rejects_features_without_a_feature_type() {
        let xml = r#"
            <geopackage name="world">
              <features name="roads"/>
            </geopackage>
        "#;
        let err = parse_request(xml).expect_err("missing featuretype");
        assert!(matches!(err, AssemblyError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_a_missing_root() {
        let err = parse_request("<features name='roads'/>").expect_err("no root");
        assert!(err.to_string().contains("unexpected element"));
    }
}
