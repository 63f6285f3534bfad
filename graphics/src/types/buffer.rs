//! Buffer targets, usage hints and vertex component types.

/// Binding point a buffer is uploaded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferTarget {
    /// Per-vertex attribute data.
    #[default]
    Array,
    /// Index data for indexed draws.
    ElementArray,
}

/// How often the buffer contents are expected to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsageHint {
    /// Written once, drawn many times.
    #[default]
    StaticDraw,
    /// Rewritten repeatedly, drawn many times.
    DynamicDraw,
    /// Written once, drawn a few times.
    StreamDraw,
}

/// Scalar type of one vertex attribute component in buffer memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    HalfFloat,
    #[default]
    Float,
}

impl ComponentType {
    /// Size of one component in bytes.
    pub fn size(&self) -> u32 {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort | Self::HalfFloat => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
        }
    }

    /// Check if this is an integer type that may be normalized.
    pub fn is_integer(&self) -> bool {
        !matches!(self, Self::HalfFloat | Self::Float)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_sizes() {
        assert_eq!(ComponentType::UnsignedByte.size(), 1);
        assert_eq!(ComponentType::HalfFloat.size(), 2);
        assert_eq!(ComponentType::Float.size(), 4);
        assert!(ComponentType::Short.is_integer());
        assert!(!ComponentType::Float.is_integer());
    }
}
