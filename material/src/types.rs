//! Enumerations and capability sets shared across the material compiler.
//!
//! Every enum that is written into a package carries an explicit `#[repr(u8)]`
//! discriminant; the discriminant is the serialized value.

use bitflags::bitflags;

// ---------------------------------------------------------------------------
// Build targets
// ---------------------------------------------------------------------------

/// Shader model a program is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ShaderModel {
    /// OpenGL ES 3.0 / Vulkan mobile class hardware.
    Mobile = 1,
    /// Desktop class hardware.
    Desktop = 2,
}

impl ShaderModel {
    /// Both shader models in enumeration order.
    pub const ALL: [ShaderModel; 2] = [ShaderModel::Mobile, ShaderModel::Desktop];

    /// Membership flag of this model in a [`ShaderModels`] set.
    pub fn flag(self) -> ShaderModels {
        match self {
            Self::Mobile => ShaderModels::MOBILE,
            Self::Desktop => ShaderModels::DESKTOP,
        }
    }
}

bitflags! {
    /// Set of shader models a package contains.
    ///
    /// The bit position of each flag equals the [`ShaderModel`] discriminant.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderModels: u32 {
        const MOBILE = 1 << 1;
        const DESKTOP = 1 << 2;
    }
}

impl ShaderModels {
    /// Iterates the contained models, mobile first.
    pub fn models(self) -> impl Iterator<Item = ShaderModel> {
        ShaderModel::ALL
            .into_iter()
            .filter(move |model| self.contains(model.flag()))
    }
}

/// A single graphics API a program is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Api {
    OpenGl = 0x01,
    Vulkan = 0x02,
    Metal = 0x04,
}

impl Api {
    /// Membership flag of this API in a [`TargetApis`] request.
    pub fn flag(self) -> TargetApis {
        match self {
            Self::OpenGl => TargetApis::OPENGL,
            Self::Vulkan => TargetApis::VULKAN,
            Self::Metal => TargetApis::METAL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OpenGl => "OpenGL",
            Self::Vulkan => "Vulkan",
            Self::Metal => "Metal",
        }
    }
}

bitflags! {
    /// APIs requested for a build. Only used to accumulate requests; compiled
    /// programs always carry a single [`Api`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TargetApis: u8 {
        const OPENGL = 0x01;
        const VULKAN = 0x02;
        const METAL = 0x04;
    }
}

/// Language a program is compiled through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TargetLanguage {
    /// GLSL source is kept as-is (no intermediate).
    Glsl = 0,
    /// GLSL is compiled to SPIR-V, then optionally cross-compiled.
    Spirv = 1,
}

/// Platform selection, mapped to shader models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    Desktop,
    Mobile,
    #[default]
    All,
}

impl Platform {
    pub fn shader_models(self) -> ShaderModels {
        match self {
            Self::Desktop => ShaderModels::DESKTOP,
            Self::Mobile => ShaderModels::MOBILE,
            Self::All => ShaderModels::all(),
        }
    }
}

/// Optimization tier, ordered from least to most aggressive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Optimization {
    None,
    Preprocessor,
    Size,
    #[default]
    Performance,
}

/// Programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ShaderStage {
    Vertex = 0,
    Fragment = 1,
}

impl ShaderStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }

    pub fn flag(self) -> ShaderStageFlags {
        match self {
            Self::Vertex => ShaderStageFlags::VERTEX,
            Self::Fragment => ShaderStageFlags::FRAGMENT,
        }
    }
}

bitflags! {
    /// Shader stages that can access a binding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderStageFlags: u8 {
        /// Vertex shader stage.
        const VERTEX = 1 << 0;
        /// Fragment shader stage.
        const FRAGMENT = 1 << 1;
    }
}

impl std::fmt::Display for ShaderStageFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.contains(Self::VERTEX), self.contains(Self::FRAGMENT)) {
            (true, true) => write!(f, "{{ vertex | fragment }}"),
            (true, false) => write!(f, "{{ vertex }}"),
            (false, true) => write!(f, "{{ fragment }}"),
            (false, false) => write!(f, "{{ }}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Material description
// ---------------------------------------------------------------------------

/// Kind of material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum MaterialDomain {
    #[default]
    Surface = 0,
    PostProcess = 1,
}

/// Lighting model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Shading {
    #[default]
    Lit = 0,
    Unlit = 1,
    Subsurface = 2,
    Cloth = 3,
    SpecularGlossiness = 4,
}

impl Shading {
    pub fn define_name(self) -> &'static str {
        match self {
            Self::Lit => "SHADING_MODEL_LIT",
            Self::Unlit => "SHADING_MODEL_UNLIT",
            Self::Subsurface => "SHADING_MODEL_SUBSURFACE",
            Self::Cloth => "SHADING_MODEL_CLOTH",
            Self::SpecularGlossiness => "SHADING_MODEL_SPECULAR_GLOSSINESS",
        }
    }
}

/// Interpolation of custom variables between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Interpolation {
    #[default]
    Smooth = 0,
    Flat = 1,
}

/// Color blending of the material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum BlendingMode {
    #[default]
    Opaque = 0,
    Transparent = 1,
    Add = 2,
    Masked = 3,
    Fade = 4,
    Multiply = 5,
    Screen = 6,
}

impl BlendingMode {
    pub fn define_name(self) -> &'static str {
        match self {
            Self::Opaque => "BLEND_MODE_OPAQUE",
            Self::Transparent => "BLEND_MODE_TRANSPARENT",
            Self::Add => "BLEND_MODE_ADD",
            Self::Masked => "BLEND_MODE_MASKED",
            Self::Fade => "BLEND_MODE_FADE",
            Self::Multiply => "BLEND_MODE_MULTIPLY",
            Self::Screen => "BLEND_MODE_SCREEN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TransparencyMode {
    #[default]
    Default = 0,
    TwoPassesOneSide = 1,
    TwoPassesTwoSides = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ReflectionMode {
    #[default]
    Default = 0,
    ScreenSpace = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum RefractionMode {
    #[default]
    None = 0,
    Cubemap = 1,
    ScreenSpace = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum RefractionType {
    #[default]
    Solid = 0,
    Thin = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ShaderQuality {
    #[default]
    Default = 0,
    Low = 1,
    Normal = 2,
    High = 3,
}

/// Space the vertex position is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum VertexDomain {
    #[default]
    Object = 0,
    World = 1,
    View = 2,
    Device = 3,
}

impl VertexDomain {
    pub fn define_name(self) -> &'static str {
        match self {
            Self::Object => "VERTEX_DOMAIN_OBJECT",
            Self::World => "VERTEX_DOMAIN_WORLD",
            Self::View => "VERTEX_DOMAIN_VIEW",
            Self::Device => "VERTEX_DOMAIN_DEVICE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CullingMode {
    None = 0,
    Front = 1,
    #[default]
    Back = 2,
    FrontAndBack = 3,
}

/// Capability tier a material must fit into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum FeatureLevel {
    #[default]
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
}

impl FeatureLevel {
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Largest number of material samplers allowed, if capped.
    pub fn max_samplers(self) -> Option<usize> {
        match self {
            Self::Level1 => Some(9),
            Self::Level2 => Some(12),
            Self::Level3 => None,
        }
    }

    /// Whether cubemap array samplers may be declared.
    pub fn allows_cubemap_arrays(self) -> bool {
        self != Self::Level1
    }
}

/// Custom interpolated variable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Variable {
    Custom0 = 0,
    Custom1 = 1,
    Custom2 = 2,
    Custom3 = 3,
}

impl Variable {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Custom0),
            1 => Some(Self::Custom1),
            2 => Some(Self::Custom2),
            3 => Some(Self::Custom3),
            _ => None,
        }
    }
}

bitflags! {
    /// Vertex attributes a material requires from meshes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VertexAttributes: u32 {
        const POSITION = 1 << 0;
        const TANGENTS = 1 << 1;
        const COLOR = 1 << 2;
        const UV0 = 1 << 3;
        const UV1 = 1 << 4;
        const BONE_INDICES = 1 << 5;
        const BONE_WEIGHTS = 1 << 6;
        const CUSTOM0 = 1 << 8;
        const CUSTOM1 = 1 << 9;
        const CUSTOM2 = 1 << 10;
        const CUSTOM3 = 1 << 11;
        const CUSTOM4 = 1 << 12;
        const CUSTOM5 = 1 << 13;
        const CUSTOM6 = 1 << 14;
        const CUSTOM7 = 1 << 15;
    }
}

impl VertexAttributes {
    /// Shader-visible declarations `(location, glsl type, name)` in location order.
    pub fn declarations(self) -> impl Iterator<Item = (u32, &'static str, &'static str)> {
        const TABLE: [(VertexAttributes, &str, &str); 15] = [
            (VertexAttributes::POSITION, "vec4", "mesh_position"),
            (VertexAttributes::TANGENTS, "vec4", "mesh_tangents"),
            (VertexAttributes::COLOR, "vec4", "mesh_color"),
            (VertexAttributes::UV0, "vec2", "mesh_uv0"),
            (VertexAttributes::UV1, "vec2", "mesh_uv1"),
            (VertexAttributes::BONE_INDICES, "uvec4", "mesh_bone_indices"),
            (VertexAttributes::BONE_WEIGHTS, "vec4", "mesh_bone_weights"),
            (VertexAttributes::CUSTOM0, "vec4", "mesh_custom0"),
            (VertexAttributes::CUSTOM1, "vec4", "mesh_custom1"),
            (VertexAttributes::CUSTOM2, "vec4", "mesh_custom2"),
            (VertexAttributes::CUSTOM3, "vec4", "mesh_custom3"),
            (VertexAttributes::CUSTOM4, "vec4", "mesh_custom4"),
            (VertexAttributes::CUSTOM5, "vec4", "mesh_custom5"),
            (VertexAttributes::CUSTOM6, "vec4", "mesh_custom6"),
            (VertexAttributes::CUSTOM7, "vec4", "mesh_custom7"),
        ];
        TABLE.into_iter().filter_map(move |(flag, ty, name)| {
            self.contains(flag)
                .then(|| (flag.bits().trailing_zeros(), ty, name))
        })
    }
}

bitflags! {
    /// Features a user can strip from the generated variant set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UserVariantFilter: u32 {
        const DIRECTIONAL_LIGHTING = 1 << 0;
        const DYNAMIC_LIGHTING = 1 << 1;
        const SHADOW_RECEIVER = 1 << 2;
        const SKINNING = 1 << 3;
        const FOG = 1 << 4;
        const VSM = 1 << 5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_model_flags_match_discriminants() {
        assert_eq!(ShaderModels::MOBILE.bits(), 1 << ShaderModel::Mobile as u32);
        assert_eq!(ShaderModels::DESKTOP.bits(), 1 << ShaderModel::Desktop as u32);
    }

    #[test]
    fn platform_all_iterates_mobile_first() {
        let models: Vec<_> = Platform::All.shader_models().models().collect();
        assert_eq!(models, vec![ShaderModel::Mobile, ShaderModel::Desktop]);
    }

    #[test]
    fn optimization_is_ordered() {
        assert!(Optimization::None < Optimization::Preprocessor);
        assert!(Optimization::Preprocessor < Optimization::Size);
        assert!(Optimization::Size < Optimization::Performance);
    }

    #[test]
    fn feature_level_limits() {
        assert_eq!(FeatureLevel::Level1.max_samplers(), Some(9));
        assert_eq!(FeatureLevel::Level2.max_samplers(), Some(12));
        assert_eq!(FeatureLevel::Level3.max_samplers(), None);
        assert!(!FeatureLevel::Level1.allows_cubemap_arrays());
        assert!(FeatureLevel::Level2.allows_cubemap_arrays());
    }

    #[test]
    fn attribute_declarations_use_bit_positions() {
        let attributes = VertexAttributes::POSITION | VertexAttributes::UV0;
        let decls: Vec<_> = attributes.declarations().collect();
        assert_eq!(decls, vec![(0, "vec4", "mesh_position"), (3, "vec2", "mesh_uv0")]);
    }

    #[test]
    fn stage_flags_display() {
        assert_eq!(ShaderStageFlags::all().to_string(), "{ vertex | fragment }");
        assert_eq!(ShaderStageFlags::FRAGMENT.to_string(), "{ fragment }");
    }

    #[test]
    fn variable_index_round_trip() {
        assert_eq!(Variable::from_index(2), Some(Variable::Custom2));
        assert_eq!(Variable::from_index(4), None);
    }
}
