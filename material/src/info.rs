//! Material description derived from the builder configuration.
//!
//! [`RenderState`] holds the plain render-state settings the builder collects.
//! [`MaterialInfo`] is the read-only view handed to collaborators once a build
//! is prepared: the render state plus interface blocks, binding maps and the
//! attributes a mesh must provide.

use crate::interface_block::{
    MATERIAL_PARAMS, SamplerBindingMap, SamplerInterfaceBlock, SubpassInfo, UniformInterfaceBlock,
};
use crate::parameter::{Parameter, Precision, SamplerType, UniformType};
use crate::types::{
    BlendingMode, CullingMode, FeatureLevel, Interpolation, MaterialDomain, RefractionMode,
    RefractionType, ReflectionMode, ShaderQuality, ShaderStageFlags, Shading, TransparencyMode,
    VertexAttributes, VertexDomain,
};

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Storage qualifier of a fragment output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputQualifier {
    #[default]
    Out,
    InOut,
}

impl OutputQualifier {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Out => "out",
            Self::InOut => "inout",
        }
    }
}

/// Attachment a fragment output writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputTarget {
    #[default]
    Color,
    Depth,
}

/// Type of a fragment output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputType {
    Float,
    Float2,
    Float3,
    #[default]
    Float4,
}

impl OutputType {
    pub fn glsl_name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Float2 => "vec2",
            Self::Float3 => "vec3",
            Self::Float4 => "vec4",
        }
    }
}

/// A post-process fragment output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Output {
    pub name: String,
    pub qualifier: OutputQualifier,
    pub target: OutputTarget,
    pub ty: OutputType,
    pub location: u32,
}

impl Output {
    /// Output injected into post-process materials that declare none.
    pub fn default_color() -> Self {
        Self {
            name: "color".to_string(),
            qualifier: OutputQualifier::Out,
            target: OutputTarget::Color,
            ty: OutputType::Float4,
            location: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Render state
// ---------------------------------------------------------------------------

/// Render-state settings of a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub domain: MaterialDomain,
    pub shading: Shading,
    pub interpolation: Interpolation,
    pub blending: BlendingMode,
    pub post_lighting_blending: BlendingMode,
    pub transparency: TransparencyMode,
    pub reflection: ReflectionMode,
    pub refraction_mode: RefractionMode,
    pub refraction_type: RefractionType,
    pub quality: ShaderQuality,
    pub vertex_domain: VertexDomain,
    pub culling: CullingMode,
    pub feature_level: FeatureLevel,

    pub double_sided_capability: bool,
    pub double_sided: bool,
    pub double_sided_set: bool,
    pub color_write: bool,
    pub depth_write: bool,
    pub depth_write_set: bool,
    pub depth_test: bool,
    pub instanced: bool,

    pub mask_threshold: f32,
    pub shadow_multiplier: bool,
    pub transparent_shadow: bool,
    pub specular_anti_aliasing: bool,
    pub specular_anti_aliasing_variance: f32,
    pub specular_anti_aliasing_threshold: f32,
    pub clear_coat_ior_change: bool,
    pub flip_uv: bool,
    pub custom_surface_shading: bool,
    pub multi_bounce_ao: bool,
    pub multi_bounce_ao_set: bool,
    pub specular_ao: bool,
    pub specular_ao_set: bool,

    pub framebuffer_fetch: bool,
    pub vertex_domain_device_jittered: bool,
    pub legacy_morphing: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            domain: MaterialDomain::Surface,
            shading: Shading::Lit,
            interpolation: Interpolation::Smooth,
            blending: BlendingMode::Opaque,
            post_lighting_blending: BlendingMode::Transparent,
            transparency: TransparencyMode::Default,
            reflection: ReflectionMode::Default,
            refraction_mode: RefractionMode::None,
            refraction_type: RefractionType::Solid,
            quality: ShaderQuality::Default,
            vertex_domain: VertexDomain::Object,
            culling: CullingMode::Back,
            feature_level: FeatureLevel::Level1,

            double_sided_capability: false,
            double_sided: false,
            double_sided_set: false,
            color_write: true,
            depth_write: true,
            depth_write_set: false,
            depth_test: true,
            instanced: false,

            mask_threshold: 0.4,
            shadow_multiplier: false,
            transparent_shadow: false,
            specular_anti_aliasing: false,
            specular_anti_aliasing_variance: 0.15,
            specular_anti_aliasing_threshold: 0.2,
            clear_coat_ior_change: true,
            flip_uv: true,
            custom_surface_shading: false,
            multi_bounce_ao: false,
            multi_bounce_ao_set: false,
            specular_ao: false,
            specular_ao_set: false,

            framebuffer_fetch: false,
            vertex_domain_device_jittered: false,
            legacy_morphing: false,
        }
    }
}

impl RenderState {
    pub fn is_lit(&self) -> bool {
        self.shading != Shading::Unlit
    }

    /// Depth write after defaults are applied: explicit settings win, blended
    /// materials otherwise do not write depth.
    pub fn effective_depth_write(&self) -> bool {
        if self.depth_write_set {
            self.depth_write
        } else {
            matches!(self.blending, BlendingMode::Opaque | BlendingMode::Masked)
        }
    }
}

// ---------------------------------------------------------------------------
// Material info
// ---------------------------------------------------------------------------

/// Everything derived from the configuration before shaders are generated.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInfo {
    pub name: String,
    pub state: RenderState,
    pub uniform_block: UniformInterfaceBlock,
    pub sampler_block: SamplerInterfaceBlock,
    pub subpass: Option<SubpassInfo>,
    pub sampler_bindings: SamplerBindingMap,
    pub required_attributes: VertexAttributes,
    pub has_external_samplers: bool,
}

impl MaterialInfo {
    /// Derives interface blocks and attributes from the declared parameters.
    pub fn new(
        name: impl Into<String>,
        state: RenderState,
        parameters: &[Parameter],
        required_attributes: VertexAttributes,
    ) -> Self {
        let mut uniforms = UniformInterfaceBlock::builder(MATERIAL_PARAMS);
        let mut samplers = SamplerInterfaceBlock::new(MATERIAL_PARAMS, ShaderStageFlags::all());
        let mut subpass = None;

        for parameter in parameters {
            match parameter {
                Parameter::Uniform {
                    name,
                    ty,
                    array_size,
                    precision,
                } => {
                    uniforms = uniforms.add(name.as_str(), array_size.unwrap_or(0), *ty, *precision);
                }
                Parameter::Sampler {
                    name,
                    ty,
                    format,
                    precision,
                } => {
                    samplers = samplers.with_sampler(name.as_str(), *ty, *format, *precision);
                }
                Parameter::Subpass {
                    name,
                    ty,
                    format,
                    precision,
                } => {
                    subpass = Some(SubpassInfo {
                        block: MATERIAL_PARAMS.to_string(),
                        name: name.clone(),
                        ty: *ty,
                        format: *format,
                        precision: *precision,
                        attachment_index: 0,
                        binding: 0,
                    });
                }
            }
        }

        // reserved members go after the user uniforms
        if state.specular_anti_aliasing {
            uniforms = uniforms
                .add("_specularAntiAliasingVariance", 0, UniformType::Float, Precision::Default)
                .add("_specularAntiAliasingThreshold", 0, UniformType::Float, Precision::Default);
        }
        if state.blending == BlendingMode::Masked {
            uniforms = uniforms.add("_maskThreshold", 0, UniformType::Float, Precision::Default);
        }
        if state.double_sided_capability {
            uniforms = uniforms.add("_doubleSided", 0, UniformType::Bool, Precision::Default);
        }

        let mut required_attributes = required_attributes | VertexAttributes::POSITION;
        if state.is_lit() || state.shadow_multiplier {
            required_attributes |= VertexAttributes::TANGENTS;
        }

        let has_external_samplers = samplers
            .samplers()
            .iter()
            .any(|s| s.ty == SamplerType::SamplerExternal);
        let sampler_bindings = SamplerBindingMap::new(state.domain, &samplers);

        Self {
            name: name.into(),
            state,
            uniform_block: uniforms.build(),
            sampler_block: samplers,
            subpass,
            sampler_bindings,
            required_attributes,
            has_external_samplers,
        }
    }

    pub fn domain(&self) -> MaterialDomain {
        self.state.domain
    }

    pub fn is_lit(&self) -> bool {
        self.state.is_lit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{SamplerFormat, SubpassType};

    fn uniform(name: &str, ty: UniformType) -> Parameter {
        Parameter::Uniform {
            name: name.into(),
            ty,
            array_size: None,
            precision: Precision::Default,
        }
    }

    #[test]
    fn lit_materials_require_tangents() {
        let info = MaterialInfo::new("m", RenderState::default(), &[], VertexAttributes::UV0);
        assert_eq!(
            info.required_attributes,
            VertexAttributes::POSITION | VertexAttributes::TANGENTS | VertexAttributes::UV0
        );
    }

    #[test]
    fn unlit_materials_only_require_position() {
        let state = RenderState {
            shading: Shading::Unlit,
            ..Default::default()
        };
        let info = MaterialInfo::new("m", state, &[], VertexAttributes::empty());
        assert_eq!(info.required_attributes, VertexAttributes::POSITION);
    }

    #[test]
    fn reserved_uniforms_follow_user_uniforms() {
        let state = RenderState {
            blending: BlendingMode::Masked,
            specular_anti_aliasing: true,
            double_sided_capability: true,
            ..Default::default()
        };
        let info = MaterialInfo::new("m", state, &[uniform("tint", UniformType::Float4)], VertexAttributes::empty());
        let names: Vec<_> = info
            .uniform_block
            .fields()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "tint",
                "_specularAntiAliasingVariance",
                "_specularAntiAliasingThreshold",
                "_maskThreshold",
                "_doubleSided",
            ]
        );
    }

    #[test]
    fn samplers_and_subpass_are_split_out() {
        let parameters = [
            uniform("roughnessScale", UniformType::Float),
            Parameter::Sampler {
                name: "video".into(),
                ty: SamplerType::SamplerExternal,
                format: SamplerFormat::Float,
                precision: Precision::Default,
            },
            Parameter::Subpass {
                name: "previous".into(),
                ty: SubpassType::SubpassInput,
                format: SamplerFormat::Float,
                precision: Precision::Default,
            },
        ];
        let info = MaterialInfo::new("m", RenderState::default(), &parameters, VertexAttributes::empty());
        assert_eq!(info.uniform_block.fields().len(), 1);
        assert_eq!(info.sampler_block.len(), 1);
        assert!(info.has_external_samplers);
        assert_eq!(info.subpass.as_ref().map(|s| s.name.as_str()), Some("previous"));
        assert_eq!(info.sampler_bindings.binding_of("video"), Some(11));
    }

    #[test]
    fn depth_write_defaults_follow_blending() {
        let mut state = RenderState::default();
        assert!(state.effective_depth_write());
        state.blending = BlendingMode::Transparent;
        assert!(!state.effective_depth_write());
        state.depth_write_set = true;
        state.depth_write = true;
        assert!(state.effective_depth_write());
    }
}
