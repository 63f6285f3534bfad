//! Named-attribute geometry.
//!
//! This module provides:
//! - [`PrimitiveTopology`] - How vertices are assembled into primitives
//! - [`AttributeData`] - A flat float array with a per-vertex component count
//! - [`Geometry`] - Named attributes plus optional `u32` indices
//! - [`GeometryError`] - Validation failures

use std::collections::BTreeMap;

/// Name of the position attribute.
pub const POSITION: &str = "position";
/// Name of the normal attribute.
pub const NORMAL: &str = "normal";
/// Name of the texture coordinate attribute.
pub const UV: &str = "uv";

/// Errors produced while building or validating geometry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// Input data has the wrong shape (length not a multiple of the stride, ...).
    #[error("Malformed geometry input: {0}")]
    MalformedInput(String),

    /// Two attributes disagree on the vertex count.
    #[error("Attribute '{attribute}' has {actual} vertices, expected {expected}")]
    VertexCountMismatch {
        attribute: String,
        expected: usize,
        actual: usize,
    },

    /// An index refers past the last vertex.
    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// Primitive topology describing how vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices form a connected strip of lines.
    LineStrip,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
}

impl PrimitiveTopology {
    /// Get the number of vertices per primitive (for non-strip topologies).
    pub fn vertices_per_primitive(&self) -> Option<u32> {
        match self {
            Self::PointList => Some(1),
            Self::LineList => Some(2),
            Self::TriangleList => Some(3),
            Self::LineStrip | Self::TriangleStrip => None, // Variable
        }
    }
}

/// A flat array of floats interpreted as `components` values per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeData {
    values: Vec<f32>,
    components: u32,
}

impl AttributeData {
    /// Wrap `values` as an attribute with `components` floats per vertex.
    pub fn new(values: Vec<f32>, components: u32) -> Self {
        Self { values, components }
    }

    /// The raw values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Mutable access to the raw values.
    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Number of floats per vertex (1 to 4).
    pub fn components(&self) -> u32 {
        self.components
    }

    /// Number of vertices described by this attribute.
    pub fn count(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.values.len() / self.components as usize
        }
    }

    fn check_shape(&self, name: &str) -> Result<(), GeometryError> {
        if !(1..=4).contains(&self.components) {
            return Err(GeometryError::MalformedInput(format!(
                "attribute '{}' has {} components, expected 1..=4",
                name, self.components
            )));
        }
        if self.values.len() % self.components as usize != 0 {
            return Err(GeometryError::MalformedInput(format!(
                "attribute '{}' length {} is not a multiple of {}",
                name,
                self.values.len(),
                self.components
            )));
        }
        Ok(())
    }
}

/// CPU-side geometry: named per-vertex attributes and optional indices.
///
/// Attributes are stored in a sorted map so iteration order is stable,
/// which keeps upload order (and thus handle assignment) deterministic.
///
/// # Example
///
/// ```
/// use lumen_core::mesh::{AttributeData, Geometry};
///
/// let geometry = Geometry::new()
///     .with_attribute("position", AttributeData::new(vec![0.0; 9], 3))
///     .with_label("triangle");
/// assert_eq!(geometry.vertex_count(), 3);
/// assert!(geometry.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    attributes: BTreeMap<String, AttributeData>,
    indices: Option<Vec<u32>>,
    topology: PrimitiveTopology,
    label: Option<String>,
}

impl Geometry {
    /// Create empty triangle-list geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, data: AttributeData) -> Self {
        self.set_attribute(name, data);
        self
    }

    /// Set the index list.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Set the primitive topology.
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add or replace an attribute in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, data: AttributeData) {
        self.attributes.insert(name.into(), data);
    }

    /// Remove an attribute, returning it if present.
    pub fn remove_attribute(&mut self, name: &str) -> Option<AttributeData> {
        self.attributes.remove(name)
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeData> {
        self.attributes.get(name)
    }

    /// Mutable lookup of an attribute by name.
    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut AttributeData> {
        self.attributes.get_mut(name)
    }

    /// Iterate attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeData)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The index list, if indexed.
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// Whether this geometry is drawn with indices.
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of vertices.
    ///
    /// Taken from the position attribute, or the first attribute when there
    /// is no position.
    pub fn vertex_count(&self) -> usize {
        self.attributes
            .get(POSITION)
            .or_else(|| self.attributes.values().next())
            .map(AttributeData::count)
            .unwrap_or(0)
    }

    /// Number of elements a draw call consumes (indices, or vertices).
    pub fn element_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len(),
            None => self.vertex_count(),
        }
    }

    /// Number of triangles for triangle-list geometry.
    pub fn triangle_count(&self) -> usize {
        match self.topology {
            PrimitiveTopology::TriangleList => self.element_count() / 3,
            PrimitiveTopology::TriangleStrip => self.element_count().saturating_sub(2),
            _ => 0,
        }
    }

    /// Check that every attribute is well-formed, all attributes agree on the
    /// vertex count, and every index is in range.
    ///
    /// # Errors
    ///
    /// Returns the first [`GeometryError`] found.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let expected = self.vertex_count();
        for (name, data) in &self.attributes {
            data.check_shape(name)?;
            if data.count() != expected {
                return Err(GeometryError::VertexCountMismatch {
                    attribute: name.clone(),
                    expected,
                    actual: data.count(),
                });
            }
        }

        if let Some(indices) = &self.indices {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= expected) {
                return Err(GeometryError::IndexOutOfRange {
                    index,
                    vertex_count: expected,
                });
            }
        }

        Ok(())
    }
}
