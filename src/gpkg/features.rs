use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::error::Result;
use crate::features::SimpleCollection;

use super::GeoPackage;
use super::entry::{EntryType, FeatureEntry};
use super::geometry::{
    column_type_to_str, dimension_to_zm, geometry_type_to_str, wkb_to_gpkg_geometry,
};
use super::sql;

impl GeoPackage {
    /// Write a simple feature collection as a new feature table, registering
    /// it in `gpkg_contents` and `gpkg_geometry_columns`.
    ///
    /// Geometries arrive as plain WKB and are stored with the GeoPackage
    /// binary header carrying the schema's SRS id.
    pub fn add_features(&self, entry: &FeatureEntry, collection: &SimpleCollection) -> Result<()> {
        self.assert_table_free(&entry.table_name)?;

        let schema = &collection.schema;
        self.ensure_srs(schema.srs_id)?;
        let geom = schema.geometry_column.as_str();

        let mut column_defs =
            format!(r#"fid INTEGER PRIMARY KEY AUTOINCREMENT, "{geom}" BLOB"#);
        for column in &schema.columns {
            column_defs.push_str(&format!(
                r#", "{}" {}"#,
                column.name,
                column_type_to_str(column.column_type)
            ));
        }
        self.connection().execute_batch(&sql::sql_create_feature_table(
            &entry.table_name,
            &column_defs,
        ))?;

        let identifier = entry.identifier.as_deref().unwrap_or(&entry.table_name);
        let description = entry.description.as_deref().unwrap_or("");
        self.connection().execute(
            sql::SQL_INSERT_CONTENTS,
            rusqlite::params![
                entry.table_name,
                EntryType::Features.as_str(),
                identifier,
                description,
                entry.bounds.as_ref().map(|b| b.min_x),
                entry.bounds.as_ref().map(|b| b.min_y),
                entry.bounds.as_ref().map(|b| b.max_x),
                entry.bounds.as_ref().map(|b| b.max_y),
                schema.srs_id,
            ],
        )?;

        let (z, m) = dimension_to_zm(schema.geometry_dimension);
        self.connection().execute(
            sql::SQL_INSERT_GEOMETRY_COLUMNS,
            rusqlite::params![
                entry.table_name,
                geom,
                geometry_type_to_str(schema.geometry_type),
                schema.srs_id,
                z,
                m,
            ],
        )?;

        let mut columns = format!(r#""{geom}""#);
        let mut values = "?1".to_string();
        for (i, column) in schema.columns.iter().enumerate() {
            columns.push_str(&format!(r#", "{}""#, column.name));
            values.push_str(&format!(", ?{}", i + 2));
        }
        let mut stmt = self
            .connection()
            .prepare(&sql::sql_insert_feature(&entry.table_name, &columns, &values))?;

        for feature in &collection.features {
            let geometry = match &feature.geometry {
                Some(wkb) => Value::Blob(wkb_to_gpkg_geometry(wkb, schema.srs_id)?),
                None => Value::Null,
            };
            stmt.execute(params_from_iter(
                std::iter::once(geometry).chain(feature.properties.iter().cloned()),
            ))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::bounds::BoundingBox;
    use crate::features::{SimpleCollection, SimpleSchema, SourceFeature, Value};
    use crate::gpkg::{EntryType, FeatureEntry, GeoPackage};
    use crate::types::{ColumnSpec, ColumnType};
    use crate::{AssemblyError, Result};
    use geo_types::Point;

    fn point_wkb(x: f64, y: f64) -> Result<Vec<u8>> {
        let mut wkb = Vec::new();
        wkb::writer::write_geometry(&mut wkb, &Point::new(x, y), &Default::default())?;
        Ok(wkb)
    }

    fn roads_collection() -> Result<SimpleCollection> {
        Ok(SimpleCollection {
            schema: SimpleSchema {
                geometry_column: "geom".to_string(),
                geometry_type: wkb::reader::GeometryType::Point,
                geometry_dimension: wkb::reader::Dimension::Xy,
                srs_id: 4326,
                columns: vec![
                    ColumnSpec::new("name", ColumnType::Varchar),
                    ColumnSpec::new("lanes", ColumnType::Integer),
                ],
            },
            features: vec![
                SourceFeature {
                    geometry: Some(point_wkb(1.0, 2.0)?),
                    properties: vec![Value::Text("main".to_string()), Value::Integer(4)],
                },
                SourceFeature {
                    geometry: None,
                    properties: vec![Value::Text("unmapped".to_string()), Value::Null],
                },
            ],
            bounds: Some(BoundingBox::new(1.0, 2.0, 1.0, 2.0)),
        })
    }

    #[test]
    fn add_features_registers_entry_and_rows() -> Result<()> {
        let gpkg = GeoPackage::create_in_memory()?;
        let entry = FeatureEntry {
            table_name: "roads".to_string(),
            identifier: None,
            description: Some("road network".to_string()),
            bounds: Some(BoundingBox::new(1.0, 2.0, 1.0, 2.0)),
        };
        gpkg.add_features(&entry, &roads_collection()?)?;

        let stored = gpkg.entry("roads")?.ok_or_else(|| {
            AssemblyError::Message("roads entry missing".to_string())
        })?;
        assert_eq!(stored.entry_type, Some(EntryType::Features));
        assert_eq!(stored.identifier.as_deref(), Some("roads"));
        assert_eq!(stored.description.as_deref(), Some("road network"));
        assert_eq!(stored.srs_id, Some(4326));

        let row_count: i64 =
            gpkg.connection()
                .query_row("SELECT COUNT(*) FROM roads", [], |row| row.get(0))?;
        assert_eq!(row_count, 2);

        let geometry_type: String = gpkg.connection().query_row(
            "SELECT geometry_type_name FROM gpkg_geometry_columns WHERE table_name = 'roads'",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(geometry_type, "POINT");
        Ok(())
    }

    #[test]
    fn add_features_rejects_duplicate_table() -> Result<()> {
        let gpkg = GeoPackage::create_in_memory()?;
        let entry = FeatureEntry {
            table_name: "roads".to_string(),
            identifier: None,
            description: None,
            bounds: None,
        };
        let collection = roads_collection()?;
        gpkg.add_features(&entry, &collection)?;

        let result = gpkg.add_features(&entry, &collection);
        assert!(matches!(
            result,
            Err(AssemblyError::LayerAlreadyExists { layer_name }) if layer_name == "roads"
        ));
        Ok(())
    }

    #[test]
    fn spatial_index_covers_written_features() -> Result<()> {
        let gpkg = GeoPackage::create_in_memory()?;
        let entry = FeatureEntry {
            table_name: "roads".to_string(),
            identifier: None,
            description: None,
            bounds: None,
        };
        gpkg.add_features(&entry, &roads_collection()?)?;
        gpkg.create_spatial_index("roads")?;

        // Only the feature with a geometry lands in the index.
        let indexed: i64 = gpkg.connection().query_row(
            "SELECT COUNT(*) FROM rtree_roads_geom",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(indexed, 1);

        let extension: String = gpkg.connection().query_row(
            "SELECT extension_name FROM gpkg_extensions WHERE table_name = 'roads'",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(extension, "gpkg_rtree_index");
        Ok(())
    }
}
