//! User-declared material parameters.

/// Type of a uniform parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UniformType {
    Bool,
    Bool2,
    Bool3,
    Bool4,
    Float,
    Float2,
    Float3,
    Float4,
    Int,
    Int2,
    Int3,
    Int4,
    Uint,
    Uint2,
    Uint3,
    Uint4,
    Mat3,
    Mat4,
}

impl UniformType {
    pub fn glsl_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Bool2 => "bvec2",
            Self::Bool3 => "bvec3",
            Self::Bool4 => "bvec4",
            Self::Float => "float",
            Self::Float2 => "vec2",
            Self::Float3 => "vec3",
            Self::Float4 => "vec4",
            Self::Int => "int",
            Self::Int2 => "ivec2",
            Self::Int3 => "ivec3",
            Self::Int4 => "ivec4",
            Self::Uint => "uint",
            Self::Uint2 => "uvec2",
            Self::Uint3 => "uvec3",
            Self::Uint4 => "uvec4",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
        }
    }

    /// Number of 32-bit components.
    pub fn components(self) -> u32 {
        match self {
            Self::Bool | Self::Float | Self::Int | Self::Uint => 1,
            Self::Bool2 | Self::Float2 | Self::Int2 | Self::Uint2 => 2,
            Self::Bool3 | Self::Float3 | Self::Int3 | Self::Uint3 => 3,
            Self::Bool4 | Self::Float4 | Self::Int4 | Self::Uint4 => 4,
            // mat3 columns are padded to vec4 under std140
            Self::Mat3 => 12,
            Self::Mat4 => 16,
        }
    }

    /// std140 base alignment in bytes.
    pub fn std140_alignment(self) -> u32 {
        match self.components() {
            1 => 4,
            2 => 8,
            _ => 16,
        }
    }

    /// std140 size in bytes of a single (non-array) element.
    pub fn std140_size(self) -> u32 {
        self.components() * 4
    }
}

/// Type of a sampler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SamplerType {
    Sampler2d,
    Sampler2dArray,
    SamplerCubemap,
    SamplerExternal,
    Sampler3d,
    SamplerCubemapArray,
}

impl SamplerType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sampler2d => "sampler2D",
            Self::Sampler2dArray => "sampler2DArray",
            Self::SamplerCubemap => "samplerCube",
            Self::SamplerExternal => "samplerExternalOES",
            Self::Sampler3d => "sampler3D",
            Self::SamplerCubemapArray => "samplerCubeArray",
        }
    }

    /// GLSL type for the given format.
    pub fn glsl_name(self, format: SamplerFormat) -> String {
        let base = self.name();
        match format {
            SamplerFormat::Float => base.to_string(),
            SamplerFormat::Int => format!("i{base}"),
            SamplerFormat::Uint => format!("u{base}"),
            SamplerFormat::Shadow => format!("{base}Shadow"),
        }
    }
}

/// Sampled component format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SamplerFormat {
    Int,
    Uint,
    #[default]
    Float,
    Shadow,
}

/// Precision qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Precision {
    Low,
    Medium,
    High,
    #[default]
    Default,
}

impl Precision {
    /// Qualifier keyword, empty for [`Precision::Default`].
    pub fn qualifier(self) -> &'static str {
        match self {
            Self::Low => "lowp",
            Self::Medium => "mediump",
            Self::High => "highp",
            Self::Default => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SubpassType {
    #[default]
    SubpassInput,
}

/// A parameter declared on a material.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Uniform {
        name: String,
        ty: UniformType,
        /// `None` for a scalar declaration, `Some(n)` for an array.
        array_size: Option<u32>,
        precision: Precision,
    },
    Sampler {
        name: String,
        ty: SamplerType,
        format: SamplerFormat,
        precision: Precision,
    },
    Subpass {
        name: String,
        ty: SubpassType,
        format: SamplerFormat,
        precision: Precision,
    },
}

impl Parameter {
    pub fn name(&self) -> &str {
        match self {
            Self::Uniform { name, .. } | Self::Sampler { name, .. } | Self::Subpass { name, .. } => {
                name
            }
        }
    }

    pub fn is_sampler(&self) -> bool {
        matches!(self, Self::Sampler { .. })
    }

    pub fn is_subpass(&self) -> bool {
        matches!(self, Self::Subpass { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std140_rules() {
        assert_eq!(UniformType::Float.std140_alignment(), 4);
        assert_eq!(UniformType::Float2.std140_alignment(), 8);
        assert_eq!(UniformType::Float3.std140_alignment(), 16);
        assert_eq!(UniformType::Float3.std140_size(), 12);
        assert_eq!(UniformType::Mat3.std140_size(), 48);
    }

    #[test]
    fn sampler_glsl_names() {
        assert_eq!(SamplerType::Sampler2d.glsl_name(SamplerFormat::Float), "sampler2D");
        assert_eq!(SamplerType::Sampler2d.glsl_name(SamplerFormat::Int), "isampler2D");
        assert_eq!(
            SamplerType::Sampler2dArray.glsl_name(SamplerFormat::Shadow),
            "sampler2DArrayShadow"
        );
    }

    #[test]
    fn parameter_accessors() {
        let p = Parameter::Sampler {
            name: "albedo".into(),
            ty: SamplerType::Sampler2d,
            format: SamplerFormat::Float,
            precision: Precision::Default,
        };
        assert_eq!(p.name(), "albedo");
        assert!(p.is_sampler());
        assert!(!p.is_subpass());
    }
}
