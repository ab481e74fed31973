use std::path::Path;

use rusqlite::OpenFlags;

use crate::bounds::BoundingBox;
use crate::error::{AssemblyError, Result};

use super::entry::{ContentsEntry, EntryType};
use super::functions::register_spatial_functions;
use super::sql;

/// The GeoPackage file under construction.
///
/// The container is exclusively owned by one build: appends are sequential
/// and there is no transactional guarantee across layers. [`GeoPackage::close`]
/// finalizes the file and must be called exactly once.
#[derive(Debug)]
pub struct GeoPackage {
    conn: rusqlite::Connection,
}

impl GeoPackage {
    /// Open or create the container file and run the idempotent structural
    /// setup, so subsequent reads and writes do not fail on missing
    /// `gpkg_*` tables.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = rusqlite::Connection::open(path)?;
        sql::initialize(&conn)?;
        register_spatial_functions(&conn)?;
        Ok(Self { conn })
    }

    /// Create a transient in-memory container.
    pub fn create_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        sql::initialize(&conn)?;
        register_spatial_functions(&conn)?;
        Ok(Self { conn })
    }

    /// Open an existing container without write access.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = rusqlite::Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    /// All recorded contents rows, features and tiles alike.
    pub fn entries(&self) -> Result<Vec<ContentsEntry>> {
        let mut stmt = self.conn.prepare(sql::SQL_LIST_ENTRIES)?;
        let entries = stmt
            .query_map([], entry_from_row)?
            .collect::<std::result::Result<Vec<ContentsEntry>, _>>()?;
        Ok(entries)
    }

    /// The contents row for one table, if recorded.
    pub fn entry(&self, table_name: &str) -> Result<Option<ContentsEntry>> {
        let mut stmt = self.conn.prepare(sql::SQL_SELECT_ENTRY)?;
        let mut rows = stmt.query_map([table_name], entry_from_row)?;
        match rows.next() {
            Some(entry) => Ok(Some(entry?)),
            None => Ok(None),
        }
    }

    /// Build the RTree spatial index for an already-written feature table.
    pub fn create_spatial_index(&self, table_name: &str) -> Result<()> {
        let geometry_column: String = self
            .conn
            .query_row(sql::SQL_SELECT_GEOMETRY_COLUMN, [table_name], |row| {
                row.get(0)
            })?;

        sql::execute_rtree_sqls(&self.conn, table_name, &geometry_column, "fid")?;
        self.conn.execute(
            sql::SQL_INSERT_RTREE_EXTENSION,
            rusqlite::params![table_name, geometry_column],
        )?;
        Ok(())
    }

    /// Finalize the container and release the file handle.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }

    pub(crate) fn connection(&self) -> &rusqlite::Connection {
        &self.conn
    }

    pub(crate) fn assert_table_free(&self, table_name: &str) -> Result<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM gpkg_contents WHERE table_name = ?1)",
            [table_name],
            |row| row.get(0),
        )?;
        if exists != 0 {
            return Err(AssemblyError::LayerAlreadyExists {
                layer_name: table_name.to_string(),
            });
        }
        Ok(())
    }

    /// Make sure `gpkg_spatial_ref_sys` carries a row for the id. Entries
    /// beyond the defaults are registered with minimal EPSG metadata; the
    /// host is the authority for full definitions.
    pub(crate) fn ensure_srs(&self, srs_id: u32) -> Result<()> {
        self.conn.execute(
            sql::SQL_INSERT_SRS,
            rusqlite::params![
                format!("EPSG:{srs_id}"),
                srs_id,
                "EPSG",
                srs_id,
                "undefined",
                Option::<String>::None
            ],
        )?;
        Ok(())
    }
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContentsEntry> {
    let data_type: String = row.get(1)?;
    let min_x: Option<f64> = row.get(4)?;
    let min_y: Option<f64> = row.get(5)?;
    let max_x: Option<f64> = row.get(6)?;
    let max_y: Option<f64> = row.get(7)?;

    let bounds = match (min_x, min_y, max_x, max_y) {
        (Some(min_x), Some(min_y), Some(max_x), Some(max_y)) => {
            Some(BoundingBox::new(min_x, min_y, max_x, max_y))
        }
        _ => None,
    };

    Ok(ContentsEntry {
        table_name: row.get(0)?,
        entry_type: EntryType::from_str(&data_type),
        identifier: row.get(2)?,
        description: row.get(3)?,
        bounds,
        srs_id: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::GeoPackage;
    use crate::Result;

    #[test]
    fn create_is_idempotent_on_existing_file() -> Result<()> {
        let dir = tempfile::tempdir().map_err(crate::AssemblyError::from)?;
        let path = dir.path().join("twice.gpkg");

        let first = GeoPackage::create(&path)?;
        first.close()?;

        // Re-opening must not fail on the already-initialized structure.
        let second = GeoPackage::create(&path)?;
        assert!(second.entries()?.is_empty());
        second.close()?;
        Ok(())
    }

    #[test]
    fn ensure_srs_registers_missing_ids_once() -> Result<()> {
        let gpkg = GeoPackage::create_in_memory()?;
        gpkg.ensure_srs(3857)?;
        gpkg.ensure_srs(3857)?;

        let count: i64 = gpkg.connection().query_row(
            "SELECT COUNT(*) FROM gpkg_spatial_ref_sys WHERE srs_id = 3857",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(count, 1);
        Ok(())
    }

    #[test]
    fn unknown_entry_is_none() -> Result<()> {
        let gpkg = GeoPackage::create_in_memory()?;
        assert!(gpkg.entry("missing")?.is_none());
        Ok(())
    }
}
