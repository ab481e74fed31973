use std::error::Error;
use std::fmt;

/// Crate error type for GeoPackage assembly operations.
#[derive(Debug)]
pub enum AssemblyError {
    /// Wraps errors returned by `rusqlite`.
    Sql(rusqlite::Error),
    /// Wraps errors returned by the `wkb` crate.
    Wkb(wkb::error::WkbError),
    /// Wraps filesystem errors.
    Io(std::io::Error),
    /// Wraps errors returned by the XML reader.
    Xml(quick_xml::Error),
    /// The request document does not match the expected dialect.
    InvalidRequest(String),
    /// A tiles layer references a source layer the catalog does not know.
    LayerNotFound {
        layer: String,
    },
    /// A features layer references a feature type the catalog does not know.
    FeatureTypeNotFound {
        type_name: String,
    },
    /// The feature source returned a nested-schema collection, which the
    /// GeoPackage format cannot represent.
    ComplexFeaturesUnsupported,
    /// A spatial reference identifier could not be decoded or used.
    Srs {
        srs: String,
        reason: String,
    },
    /// No bounding box was given and one could not be derived from the
    /// requested source layers.
    BoundsUnavailable {
        reason: String,
    },
    /// Temporary directory allocation gave up after the bounded number of
    /// attempts.
    TempDirExhausted {
        attempts: u32,
    },
    /// A table with the same name already exists in the container.
    LayerAlreadyExists {
        layer_name: String,
    },
    /// Invalid GeoPackage geometry flags byte.
    InvalidGpkgGeometryFlags(u8),
    Message(String),
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql(err) => write!(f, "{err}"),
            Self::Wkb(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Xml(err) => write!(f, "{err}"),
            Self::InvalidRequest(reason) => write!(f, "invalid geopackage request: {reason}"),
            Self::LayerNotFound { layer } => write!(f, "Layer not found: {layer}"),
            Self::FeatureTypeNotFound { type_name } => {
                write!(f, "Feature type not found: {type_name}")
            }
            Self::ComplexFeaturesUnsupported => {
                write!(f, "GeoPackage output does not support complex features")
            }
            Self::Srs { srs, reason } => {
                write!(f, "unusable spatial reference '{srs}': {reason}")
            }
            Self::BoundsUnavailable { reason } => write!(
                f,
                "must specify bbox, unable to derive from requested layers: {reason}"
            ),
            Self::TempDirExhausted { attempts } => {
                write!(f, "failed to create directory within {attempts} attempts")
            }
            Self::LayerAlreadyExists { layer_name } => {
                write!(f, "layer already exists: {layer_name}")
            }
            Self::InvalidGpkgGeometryFlags(flags) => {
                write!(f, "invalid gpkg geometry flags: {flags:#04x}")
            }
            Self::Message(message) => write!(f, "{message}"),
        }
    }
}

impl Error for AssemblyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sql(err) => Some(err),
            Self::Wkb(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Xml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for AssemblyError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sql(err)
    }
}

impl From<wkb::error::WkbError> for AssemblyError {
    fn from(err: wkb::error::WkbError) -> Self {
        Self::Wkb(err)
    }
}

impl From<std::io::Error> for AssemblyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<quick_xml::Error> for AssemblyError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err)
    }
}

impl From<quick_xml::events::attributes::AttrError> for AssemblyError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.into())
    }
}

pub type Result<T> = std::result::Result<T, AssemblyError>;
