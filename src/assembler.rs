//! Orchestration of a GeoPackage build.
//!
//! The [`Assembler`] turns a [`BuildRequest`] into a finished container file,
//! delegating catalog lookups, feature queries, tile rendering, reference
//! system math and output placement to host-provided capabilities.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::bounds::BoundingBox;
use crate::catalog::{Catalog, LayerInfo, Style};
use crate::error::{AssemblyError, Result};
use crate::features::{FeatureCollection, FeatureQuery, FeatureSource, Filter};
use crate::gpkg::{FeatureEntry, GeoPackage, TileEntry};
use crate::render::{FormatOptions, MapRequest, TileRenderer};
use crate::request::{BuildRequest, FeaturesLayer, LayerSpec, TilesLayer};
use crate::resource::{GPKG_MIME_TYPE, ResourceManager};
use crate::srs::{EPSG_4326, SrsRegistry, srs_code};

/// Where the finished container ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssemblyOutput {
    /// Caller-specified directory the file was written into.
    Path(PathBuf),
    /// URL under which the managed output is served.
    Url(String),
}

/// Builds GeoPackage containers against a set of host capabilities.
pub struct Assembler<'a> {
    catalog: &'a dyn Catalog,
    features: &'a dyn FeatureSource,
    renderer: &'a dyn TileRenderer,
    srs: &'a dyn SrsRegistry,
    resources: &'a dyn ResourceManager,
}

impl<'a> Assembler<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        features: &'a dyn FeatureSource,
        renderer: &'a dyn TileRenderer,
        srs: &'a dyn SrsRegistry,
        resources: &'a dyn ResourceManager,
    ) -> Self {
        Self {
            catalog,
            features,
            renderer,
            srs,
            resources,
        }
    }

    /// Run one build request to completion.
    ///
    /// The file is placed in the caller-specified directory when the request
    /// opts out of managed storage with `remove = false`; otherwise it lands
    /// in the resource store and the returned URL serves it.
    pub fn execute(&self, request: &BuildRequest) -> Result<AssemblyOutput> {
        let output_name = format!("{}.gpkg", request.name);
        let keep_at_path = !request.should_remove() && request.path.is_some();

        let file = match (&request.path, keep_at_path) {
            (Some(path), true) => {
                fs::create_dir_all(path)?;
                path.join(&output_name)
            }
            _ => self.resources.output_file(&output_name)?,
        };
        info!(name = %request.name, file = %file.display(), "assembling geopackage");

        if let Err(err) = self.assemble(request, &file) {
            if !keep_at_path {
                // Managed output; do not leave a partial file behind.
                let _ = fs::remove_file(&file);
            }
            return Err(err);
        }

        match (&request.path, keep_at_path) {
            (Some(path), true) => Ok(AssemblyOutput::Path(path.clone())),
            _ => Ok(AssemblyOutput::Url(
                self.resources.output_url(&output_name, GPKG_MIME_TYPE),
            )),
        }
    }

    fn assemble(&self, request: &BuildRequest, file: &std::path::Path) -> Result<()> {
        let gpkg = GeoPackage::create(file)?;
        for layer in &request.layers {
            match layer {
                LayerSpec::Features(layer) => self.add_features_layer(&gpkg, layer)?,
                LayerSpec::Tiles(layer) => self.add_tiles_layer(&gpkg, layer)?,
            }
        }
        gpkg.close()
    }

    fn add_features_layer(&self, gpkg: &GeoPackage, layer: &FeaturesLayer) -> Result<()> {
        debug!(table = %layer.name, source = %layer.feature_type, "adding features layer");

        let feature_type = self.catalog.feature_type(&layer.feature_type).ok_or_else(|| {
            AssemblyError::FeatureTypeNotFound {
                type_name: layer.feature_type.to_string(),
            }
        })?;
        let srs = layer.srs.clone().unwrap_or_else(|| feature_type.srs.clone());

        let mut filter = layer.filter.clone().map(Filter::Predicate);
        let requested_bounds = layer.bbox;
        if let Some(bbox) = layer.bbox {
            // The query protocol expects geographic boxes in lat/long order
            // while requests supply long/lat. The flip is a shim for that
            // protocol only; recorded bounds keep the supplied order.
            let query_bbox = if self.srs.is_geographic(&srs)? {
                bbox.flipped_xy()
            } else {
                bbox
            };
            filter = Some(Filter::and(
                filter,
                Filter::Bbox {
                    property: feature_type.geometry_column.clone(),
                    bounds: query_bbox,
                },
            ));
        }

        let query = FeatureQuery {
            type_name: layer.feature_type.clone(),
            srs: Some(srs.clone()),
            property_names: layer.property_names.clone(),
            filter,
        };

        for collection in self.features.get_features(&query)? {
            let collection = match collection {
                FeatureCollection::Simple(collection) => collection,
                FeatureCollection::Complex { .. } => {
                    return Err(AssemblyError::ComplexFeaturesUnsupported);
                }
            };

            let bounds = match (collection.bounds, requested_bounds) {
                (Some(natural), Some(requested)) => Some(natural.intersection(&requested)),
                (natural, requested) => natural.or(requested),
            };

            let entry = FeatureEntry {
                table_name: layer.name.clone(),
                identifier: layer.identifier.clone(),
                description: layer.description.clone(),
                bounds,
            };
            gpkg.add_features(&entry, &collection)?;
            if layer.indexed {
                gpkg.create_spatial_index(&layer.name)?;
            }
        }
        Ok(())
    }

    fn add_tiles_layer(&self, gpkg: &GeoPackage, layer: &TilesLayer) -> Result<()> {
        debug!(table = %layer.name, "adding tiles layer");

        if layer.layers.is_empty() {
            return Err(AssemblyError::InvalidRequest(format!(
                "tiles layer {} names no source layers",
                layer.name
            )));
        }
        let sources = layer
            .layers
            .iter()
            .map(|reference| {
                self.catalog
                    .layer(reference)
                    .ok_or_else(|| AssemblyError::LayerNotFound {
                        layer: reference.to_string(),
                    })
            })
            .collect::<Result<Vec<LayerInfo>>>()?;

        let srs = layer.srs.clone().unwrap_or_else(|| sources[0].srs.clone());
        let bounds = match layer.bbox {
            Some(bbox) => bbox,
            None => self.derive_tile_bounds(&sources, layer.srs.as_deref(), &srs)?,
        };
        let styles = self.resolve_styles(layer, &sources);

        let map_request = MapRequest {
            layers: sources,
            bounds,
            srs: srs.clone(),
            styles,
            bg_color: layer.bg_color.clone(),
            transparent: layer.transparent,
            options: FormatOptions {
                flip_rows: true,
                image_format: layer.format.clone(),
                coverage: layer.coverage,
                grid_set_name: layer.grid_set_name.clone(),
                grids: layer.grids.clone(),
            },
        };
        let pyramid = self.renderer.render_pyramid(&map_request)?;

        let srs_id = srs_code(&srs).ok_or_else(|| AssemblyError::Srs {
            srs: srs.clone(),
            reason: "no numeric code".to_string(),
        })?;
        let entry = TileEntry {
            table_name: layer.name.clone(),
            identifier: layer.identifier.clone(),
            description: layer.description.clone(),
            srs_id,
            bounds,
        };
        gpkg.add_tiles(&entry, &pyramid)
    }

    /// Union of the source layer bounds, reprojected to the target reference.
    ///
    /// With an explicit request reference the geographic catalog bounds are
    /// reprojected into it; otherwise the first layer's native reference is
    /// the target and the other layers' native bounds are brought into it.
    fn derive_tile_bounds(
        &self,
        sources: &[LayerInfo],
        explicit_srs: Option<&str>,
        target_srs: &str,
    ) -> Result<BoundingBox> {
        let mut union: Option<BoundingBox> = None;

        for source in sources {
            let bounds = match explicit_srs {
                Some(target) => {
                    let lat_lon = source.lat_lon_bounds.ok_or_else(|| {
                        AssemblyError::BoundsUnavailable {
                            reason: format!("layer {} has no geographic bounds", source.name),
                        }
                    })?;
                    self.srs
                        .transform(&lat_lon, EPSG_4326, target)
                        .map_err(|err| AssemblyError::BoundsUnavailable {
                            reason: err.to_string(),
                        })?
                }
                None => {
                    let native = source.native_bounds.ok_or_else(|| {
                        AssemblyError::BoundsUnavailable {
                            reason: format!("layer {} has no native bounds", source.name),
                        }
                    })?;
                    if source.srs == target_srs {
                        native
                    } else {
                        self.srs
                            .transform(&native, &source.srs, target_srs)
                            .map_err(|err| AssemblyError::BoundsUnavailable {
                                reason: err.to_string(),
                            })?
                    }
                }
            };
            union = Some(match union {
                Some(existing) => existing.union(&bounds),
                None => bounds,
            });
        }

        union.ok_or_else(|| AssemblyError::BoundsUnavailable {
            reason: "no source layers".to_string(),
        })
    }

    /// Style resolution order: inline style document body, style document
    /// URL, named catalog styles, then each source layer's default style.
    /// Missing named styles are skipped.
    fn resolve_styles(&self, layer: &TilesLayer, sources: &[LayerInfo]) -> Vec<Style> {
        if let Some(body) = &layer.sld_body {
            return vec![Style::Body(body.clone())];
        }
        if let Some(url) = &layer.sld_url {
            return vec![Style::Url(url.clone())];
        }
        if let Some(names) = &layer.styles {
            return names
                .iter()
                .filter_map(|name| self.catalog.style(name))
                .collect();
        }
        sources
            .iter()
            .map(|source| source.default_style.clone())
            .collect()
    }
}
