//! Errors raised while exposing NGW layers to `DataFusion`.

use datafusion::error::DataFusionError;
use thiserror::Error;

/// Errors from converting or registering NGW layers.
#[derive(Debug, Error)]
pub enum NgwFormatError {
    /// The layer's records have not been fetched.
    #[error("Layer {layer} is not fully cached; call reset_reading first")]
    NotCached {
        /// Layer name
        layer: String,
    },

    /// Two output columns would share a name.
    #[error("Layer {layer}: duplicate column name '{column}'")]
    DuplicateColumn {
        /// Layer name
        layer: String,
        /// Clashing column name
        column: String,
    },

    /// WKT could not be converted to the layer's `GeoArrow` type.
    #[error("Layer {layer}: failed to build geometry column: {message}")]
    Geometry {
        /// Layer name
        layer: String,
        /// Underlying error text
        message: String,
    },

    /// Arrow rejected the assembled batch.
    #[error(transparent)]
    Arrow(#[from] arrow_schema::ArrowError),
}

impl From<NgwFormatError> for DataFusionError {
    fn from(err: NgwFormatError) -> Self {
        DataFusionError::External(Box::new(err))
    }
}

/// Result type alias that uses [`NgwFormatError`].
pub type NgwFormatResult<T> = Result<T, NgwFormatError>;
