//! Shader stages and program variable types.

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// Scalar type underlying a program variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Float,
    Int,
    Bool,
    Sampler,
}

/// Type of an attribute or uniform as reported by program introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    Float,
    FloatVec2,
    FloatVec3,
    FloatVec4,
    Int,
    IntVec2,
    IntVec3,
    IntVec4,
    Bool,
    FloatMat2,
    FloatMat3,
    FloatMat4,
    Sampler2D,
    SamplerCube,
}

impl VariableType {
    /// Parse a GLSL type name.
    pub fn from_glsl(name: &str) -> Option<Self> {
        Some(match name {
            "float" => Self::Float,
            "vec2" => Self::FloatVec2,
            "vec3" => Self::FloatVec3,
            "vec4" => Self::FloatVec4,
            "int" => Self::Int,
            "ivec2" => Self::IntVec2,
            "ivec3" => Self::IntVec3,
            "ivec4" => Self::IntVec4,
            "bool" => Self::Bool,
            "mat2" => Self::FloatMat2,
            "mat3" => Self::FloatMat3,
            "mat4" => Self::FloatMat4,
            "sampler2D" => Self::Sampler2D,
            "samplerCube" => Self::SamplerCube,
            _ => return None,
        })
    }

    /// Number of scalar components (columns times rows for matrices).
    pub fn components(&self) -> u32 {
        match self {
            Self::Float | Self::Int | Self::Bool | Self::Sampler2D | Self::SamplerCube => 1,
            Self::FloatVec2 | Self::IntVec2 => 2,
            Self::FloatVec3 | Self::IntVec3 => 3,
            Self::FloatVec4 | Self::IntVec4 | Self::FloatMat2 => 4,
            Self::FloatMat3 => 9,
            Self::FloatMat4 => 16,
        }
    }

    /// The underlying scalar type.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Self::Float
            | Self::FloatVec2
            | Self::FloatVec3
            | Self::FloatVec4
            | Self::FloatMat2
            | Self::FloatMat3
            | Self::FloatMat4 => ScalarType::Float,
            Self::Int | Self::IntVec2 | Self::IntVec3 | Self::IntVec4 => ScalarType::Int,
            Self::Bool => ScalarType::Bool,
            Self::Sampler2D | Self::SamplerCube => ScalarType::Sampler,
        }
    }

    /// Check if this is a sampler type.
    pub fn is_sampler(&self) -> bool {
        self.scalar_type() == ScalarType::Sampler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_glsl() {
        assert_eq!(VariableType::from_glsl("vec3"), Some(VariableType::FloatVec3));
        assert_eq!(VariableType::from_glsl("samplerCube"), Some(VariableType::SamplerCube));
        assert_eq!(VariableType::from_glsl("dvec3"), None);
    }

    #[test]
    fn test_components_and_scalars() {
        assert_eq!(VariableType::FloatMat4.components(), 16);
        assert_eq!(VariableType::IntVec2.scalar_type(), ScalarType::Int);
        assert!(VariableType::Sampler2D.is_sampler());
        assert!(!VariableType::FloatVec4.is_sampler());
    }
}
