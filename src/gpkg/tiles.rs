use crate::error::Result;
use crate::render::TilePyramid;

use super::GeoPackage;
use super::entry::{EntryType, TileEntry};
use super::sql;

impl GeoPackage {
    /// Write a rendered tile pyramid as a new tile table, registering it in
    /// `gpkg_contents`, `gpkg_tile_matrix_set` and `gpkg_tile_matrix`.
    pub fn add_tiles(&self, entry: &TileEntry, pyramid: &TilePyramid) -> Result<()> {
        self.assert_table_free(&entry.table_name)?;
        self.ensure_srs(entry.srs_id)?;

        self.connection()
            .execute_batch(&sql::sql_create_tile_table(&entry.table_name))?;

        let identifier = entry.identifier.as_deref().unwrap_or(&entry.table_name);
        let description = entry.description.as_deref().unwrap_or("");
        self.connection().execute(
            sql::SQL_INSERT_CONTENTS,
            rusqlite::params![
                entry.table_name,
                EntryType::Tiles.as_str(),
                identifier,
                description,
                entry.bounds.min_x,
                entry.bounds.min_y,
                entry.bounds.max_x,
                entry.bounds.max_y,
                entry.srs_id,
            ],
        )?;
        self.connection().execute(
            sql::SQL_INSERT_TILE_MATRIX_SET,
            rusqlite::params![
                entry.table_name,
                entry.srs_id,
                entry.bounds.min_x,
                entry.bounds.min_y,
                entry.bounds.max_x,
                entry.bounds.max_y,
            ],
        )?;

        for matrix in &pyramid.matrices {
            self.connection().execute(
                sql::SQL_INSERT_TILE_MATRIX,
                rusqlite::params![
                    entry.table_name,
                    matrix.zoom_level,
                    matrix.matrix_width as i64,
                    matrix.matrix_height as i64,
                    matrix.tile_width,
                    matrix.tile_height,
                    matrix.pixel_x_size,
                    matrix.pixel_y_size,
                ],
            )?;
        }

        let mut stmt = self
            .connection()
            .prepare(&sql::sql_insert_tile(&entry.table_name))?;
        for tile in &pyramid.tiles {
            stmt.execute(rusqlite::params![
                tile.zoom_level,
                tile.column as i64,
                tile.row as i64,
                tile.data,
            ])?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::bounds::BoundingBox;
    use crate::gpkg::{EntryType, GeoPackage, TileEntry};
    use crate::render::{Tile, TileMatrix, TilePyramid};
    use crate::{AssemblyError, Result};

    fn parks_pyramid() -> TilePyramid {
        TilePyramid {
            matrices: vec![
                TileMatrix {
                    zoom_level: 0,
                    matrix_width: 1,
                    matrix_height: 1,
                    tile_width: 256,
                    tile_height: 256,
                    pixel_x_size: 156543.03,
                    pixel_y_size: 156543.03,
                },
                TileMatrix {
                    zoom_level: 1,
                    matrix_width: 2,
                    matrix_height: 2,
                    tile_width: 256,
                    tile_height: 256,
                    pixel_x_size: 78271.52,
                    pixel_y_size: 78271.52,
                },
            ],
            tiles: vec![
                Tile {
                    zoom_level: 0,
                    column: 0,
                    row: 0,
                    data: vec![0x89, 0x50, 0x4e, 0x47],
                },
                Tile {
                    zoom_level: 1,
                    column: 1,
                    row: 0,
                    data: vec![0x89, 0x50, 0x4e, 0x47, 0x01],
                },
            ],
        }
    }

    fn parks_entry() -> TileEntry {
        TileEntry {
            table_name: "parks".to_string(),
            identifier: Some("city parks".to_string()),
            description: None,
            srs_id: 3857,
            bounds: BoundingBox::new(-20037508.34, -20037508.34, 20037508.34, 20037508.34),
        }
    }

    #[test]
    fn add_tiles_registers_entry_matrices_and_rows() -> Result<()> {
        let gpkg = GeoPackage::create_in_memory()?;
        gpkg.add_tiles(&parks_entry(), &parks_pyramid())?;

        let stored = gpkg
            .entry("parks")?
            .ok_or_else(|| AssemblyError::Message("parks entry missing".to_string()))?;
        assert_eq!(stored.entry_type, Some(EntryType::Tiles));
        assert_eq!(stored.identifier.as_deref(), Some("city parks"));
        assert_eq!(stored.srs_id, Some(3857));

        let matrix_count: i64 = gpkg.connection().query_row(
            "SELECT COUNT(*) FROM gpkg_tile_matrix WHERE table_name = 'parks'",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(matrix_count, 2);

        let (srs_id, min_x): (i64, f64) = gpkg.connection().query_row(
            "SELECT srs_id, min_x FROM gpkg_tile_matrix_set WHERE table_name = 'parks'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        assert_eq!(srs_id, 3857);
        assert_eq!(min_x, -20037508.34);

        let data: Vec<u8> = gpkg.connection().query_row(
            "SELECT tile_data FROM parks WHERE zoom_level = 1 AND tile_column = 1 AND tile_row = 0",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(data, vec![0x89, 0x50, 0x4e, 0x47, 0x01]);
        Ok(())
    }

    #[test]
    fn add_tiles_rejects_duplicate_table() -> Result<()> {
        let gpkg = GeoPackage::create_in_memory()?;
        gpkg.add_tiles(&parks_entry(), &parks_pyramid())?;

        let result = gpkg.add_tiles(&parks_entry(), &parks_pyramid());
        assert!(matches!(
            result,
            Err(AssemblyError::LayerAlreadyExists { layer_name }) if layer_name == "parks"
        ));
        Ok(())
    }
}
