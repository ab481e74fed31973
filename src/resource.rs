//! Managed output storage for finished containers.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::error::{AssemblyError, Result};

/// Media type under which finished containers are served.
pub const GPKG_MIME_TYPE: &str = "application/x-gpkg";

/// Host-managed store for transient process outputs.
pub trait ResourceManager {
    /// Allocate a writable file location for the named output.
    fn output_file(&self, name: &str) -> Result<PathBuf>;

    /// Dereferenceable URL that streams the named output with the given
    /// media type.
    fn output_url(&self, name: &str, mime_type: &str) -> String;
}

const TEMP_DIR_ATTEMPTS: u32 = 10_000;

/// Create a uniquely named directory under `base_dir`, retrying with an
/// incrementing suffix for up to `TEMP_DIR_ATTEMPTS` candidates.
pub fn create_temp_dir(base_dir: &Path) -> Result<PathBuf> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let base_name = format!("{millis}-");

    for counter in 0..TEMP_DIR_ATTEMPTS {
        let candidate = base_dir.join(format!("{base_name}{counter}"));
        if std::fs::create_dir(&candidate).is_ok() {
            return Ok(candidate);
        }
    }
    Err(AssemblyError::TempDirExhausted {
        attempts: TEMP_DIR_ATTEMPTS,
    })
}

/// Filesystem-backed resource manager producing WPS execution-result URLs.
#[derive(Clone, Debug)]
pub struct ExecutionResourceManager {
    base_dir: PathBuf,
    base_url: String,
    execution_id: String,
}

impl ExecutionResourceManager {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        base_url: impl Into<String>,
        execution_id: impl Into<String>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            base_url: base_url.into(),
            execution_id: execution_id.into(),
        }
    }
}

impl ResourceManager for ExecutionResourceManager {
    fn output_file(&self, name: &str) -> Result<PathBuf> {
        let dir = create_temp_dir(&self.base_dir)?;
        let file = dir.join(name);
        debug!(file = %file.display(), "allocated managed output file");
        Ok(file)
    }

    fn output_url(&self, name: &str, mime_type: &str) -> String {
        format!(
            "{}/ows?service=WPS&version=1.0.0&request=GetExecutionResult&executionId={}&outputId={}&mimetype={}",
            self.base_url.trim_end_matches('/'),
            self.execution_id,
            name,
            mime_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{ExecutionResourceManager, GPKG_MIME_TYPE, ResourceManager, create_temp_dir};

    #[test]
    fn temp_dirs_are_distinct() {
        let base = tempfile::tempdir().expect("base dir");
        let first = create_temp_dir(base.path()).expect("first dir");
        let second = create_temp_dir(base.path()).expect("second dir");
        assert_ne!(first, second);
        assert!(first.is_dir());
        assert!(second.is_dir());
    }

    #[test]
    fn output_url_carries_name_and_mime_type() {
        let base = tempfile::tempdir().expect("base dir");
        let resources =
            ExecutionResourceManager::new(base.path(), "http://localhost:8080/geoserver", "abc123");
        let url = resources.output_url("test.gpkg", GPKG_MIME_TYPE);
        assert_eq!(
            url,
            "http://localhost:8080/geoserver/ows?service=WPS&version=1.0.0&request=GetExecutionResult&executionId=abc123&outputId=test.gpkg&mimetype=application/x-gpkg"
        );
    }

    #[test]
    fn output_file_lands_under_the_base_dir() {
        let base = tempfile::tempdir().expect("base dir");
        let resources = ExecutionResourceManager::new(base.path(), "http://localhost", "exec");
        let file = resources.output_file("out.gpkg").expect("output file");
        assert!(file.starts_with(base.path()));
        assert_eq!(file.file_name().and_then(|n| n.to_str()), Some("out.gpkg"));
    }
}
