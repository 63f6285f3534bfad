//! Uniform values supplied per draw.

use std::collections::BTreeMap;

use lumen_core::math::{Vec2, Vec3};

use crate::resources::Texture;

/// A value for one uniform.
///
/// Samplers take a [`Texture`], which is bound to the uniform's texture
/// unit when the values are applied.
#[derive(Debug, Clone, Copy)]
pub enum UniformValue<'a> {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
    IntVec2([i32; 2]),
    IntVec3([i32; 3]),
    IntVec4([i32; 4]),
    Bool(bool),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    /// Column-major.
    Mat4([f32; 16]),
    Texture(&'a Texture),
}

impl From<f32> for UniformValue<'_> {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<i32> for UniformValue<'_> {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for UniformValue<'_> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<[f32; 2]> for UniformValue<'_> {
    fn from(value: [f32; 2]) -> Self {
        Self::Vec2(value)
    }
}

impl From<[f32; 3]> for UniformValue<'_> {
    fn from(value: [f32; 3]) -> Self {
        Self::Vec3(value)
    }
}

impl From<[f32; 4]> for UniformValue<'_> {
    fn from(value: [f32; 4]) -> Self {
        Self::Vec4(value)
    }
}

impl From<Vec2> for UniformValue<'_> {
    fn from(value: Vec2) -> Self {
        Self::Vec2([value.x, value.y])
    }
}

impl From<Vec3> for UniformValue<'_> {
    fn from(value: Vec3) -> Self {
        Self::Vec3([value.x, value.y, value.z])
    }
}

impl From<nalgebra::Matrix4<f32>> for UniformValue<'_> {
    fn from(value: nalgebra::Matrix4<f32>) -> Self {
        let mut columns = [0.0; 16];
        columns.copy_from_slice(value.as_slice());
        Self::Mat4(columns)
    }
}

impl<'a> From<&'a Texture> for UniformValue<'a> {
    fn from(texture: &'a Texture) -> Self {
        Self::Texture(texture)
    }
}

/// A named set of uniform values.
///
/// # Example
///
/// ```
/// use lumen_graphics::program::Uniforms;
///
/// let uniforms = Uniforms::new()
///     .with("faceIndex", 2)
///     .with("exposure", 1.5f32);
/// assert_eq!(uniforms.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Uniforms<'a> {
    values: BTreeMap<String, UniformValue<'a>>,
}

impl<'a> Uniforms<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, replacing any previous value for `name`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<UniformValue<'a>>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a value, replacing any previous value for `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<UniformValue<'a>>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue<'a>> {
        self.values.get(name)
    }

    /// Values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue<'a>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
