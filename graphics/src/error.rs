//! Graphics error types.

use lumen_core::mesh::GeometryError;
use lumen_core::texture::{DataType, PixelFormat};

use crate::types::ShaderStage;

/// Errors that can occur in the graphics system.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphicsError {
    /// A shader stage failed to compile.
    #[error("{stage} shader failed to compile: {log}")]
    CompileError { stage: ShaderStage, log: String },

    /// The program failed to link.
    #[error("program failed to link: {log}")]
    LinkError { log: String },

    /// An introspection lookup missed. The variable may have been optimized out.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// An invalid parameter was provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// New contents do not match the existing image.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// The device rejected a format combination.
    #[error(
        "unsupported format: internal {internal_format:?}, pixel {pixel_format:?}, type {data_type:?}"
    )]
    FormatUnsupported {
        internal_format: PixelFormat,
        pixel_format: PixelFormat,
        data_type: DataType,
    },

    /// An attachment cannot be bound to a framebuffer slot.
    #[error("incompatible attachment: {0}")]
    IncompatibleAttachment(String),

    /// A multi-step conversion failed; transient resources were released.
    #[error("conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        #[source]
        source: Box<GraphicsError>,
    },

    /// The resource is disposed or not ready for the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The device returned no object.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Geometry validation failed.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl GraphicsError {
    /// Wrap an error as a [`GraphicsError::ConversionFailed`].
    pub fn conversion(reason: impl Into<String>, source: GraphicsError) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn disposed(what: &str) -> Self {
        Self::InvalidState(format!("{what} has been disposed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::CompileError {
            stage: ShaderStage::Fragment,
            log: "syntax error".to_string(),
        };
        assert_eq!(err.to_string(), "fragment shader failed to compile: syntax error");

        let err = GraphicsError::NotFound {
            kind: "attribute",
            key: "nonexistent".to_string(),
        };
        assert_eq!(err.to_string(), "attribute not found: nonexistent");
    }

    #[test]
    fn test_conversion_source_chain() {
        let inner = GraphicsError::IncompatibleAttachment("size".to_string());
        let err = GraphicsError::conversion("attach face", inner.clone());
        assert_eq!(err.to_string(), "conversion failed: attach face");
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source, Some(inner.to_string()));
    }

    #[test]
    fn test_geometry_error_from() {
        let err: GraphicsError = GeometryError::MalformedInput("bad".into()).into();
        assert!(matches!(err, GraphicsError::Geometry(_)));
    }
}
