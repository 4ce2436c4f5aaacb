//! Material configuration surface.
//!
//! [`MaterialBuilder`] collects everything a build needs: user code, declared
//! parameters and outputs, render state and target selection. Setters consume
//! and return the builder; setters that can violate a limit return
//! `Result<Self, ConfigError>`.
//!
//! # Example
//!
//! ```
//! use matforge_material::{MaterialBuilder, Platform, TargetApis, UniformType};
//!
//! let builder = MaterialBuilder::new()
//!     .with_name("brick")
//!     .with_platform(Platform::All)
//!     .with_target_api(TargetApis::OPENGL)
//!     .with_uniform("roughness", UniformType::Float)
//!     .unwrap()
//!     .with_fragment_code("void material(inout MaterialInputs m) { prepareMaterial(m); }", 0);
//! assert_eq!(builder.parameters().len(), 1);
//! ```

use crate::error::ConfigError;
use crate::info::{Output, OutputQualifier, OutputTarget, OutputType, RenderState};
use crate::parameter::{Parameter, Precision, SamplerFormat, SamplerType, SubpassType, UniformType};
use crate::shader::{IncludeCallback, ShaderCode};
use crate::types::{
    BlendingMode, CullingMode, FeatureLevel, Interpolation, MaterialDomain, Optimization, Platform,
    RefractionMode, RefractionType, ReflectionMode, ShaderQuality, Shading, TargetApis,
    TransparencyMode, UserVariantFilter, Variable, VertexAttributes, VertexDomain,
};

/// Maximum number of parameters (uniforms, samplers and subpasses together).
pub const MAX_PARAMETERS: usize = 48;
/// Maximum number of subpass parameters.
pub const MAX_SUBPASSES: usize = 1;
/// Maximum number of color outputs.
pub const MAX_COLOR_OUTPUTS: usize = 8;
/// Maximum number of depth outputs.
pub const MAX_DEPTH_OUTPUTS: usize = 1;

/// Name given to materials that never call [`MaterialBuilder::with_name`].
pub const DEFAULT_MATERIAL_NAME: &str = "Unnamed";

/// Description of one material and the targets to build it for.
#[derive(Clone)]
pub struct MaterialBuilder {
    pub(crate) name: String,
    pub(crate) file_name: String,
    pub(crate) fragment: ShaderCode,
    pub(crate) vertex: ShaderCode,
    pub(crate) include_callback: Option<IncludeCallback>,
    pub(crate) variables: [String; Variable::COUNT],
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) outputs: Vec<Output>,
    pub(crate) required_attributes: VertexAttributes,
    pub(crate) state: RenderState,
    pub(crate) platform: Platform,
    pub(crate) target_apis: TargetApis,
    pub(crate) optimization: Optimization,
    pub(crate) print_shaders: bool,
    pub(crate) generate_debug_info: bool,
    pub(crate) variant_filter: UserVariantFilter,
    pub(crate) defines: Vec<(String, String)>,
}

impl Default for MaterialBuilder {
    fn default() -> Self {
        Self {
            name: DEFAULT_MATERIAL_NAME.to_string(),
            file_name: String::new(),
            fragment: ShaderCode::default(),
            vertex: ShaderCode::default(),
            include_callback: None,
            variables: Default::default(),
            parameters: Vec::new(),
            outputs: Vec::new(),
            required_attributes: VertexAttributes::empty(),
            state: RenderState::default(),
            platform: Platform::default(),
            target_apis: TargetApis::empty(),
            optimization: Optimization::default(),
            print_shaders: false,
            generate_debug_info: false,
            variant_filter: UserVariantFilter::empty(),
            defines: Vec::new(),
        }
    }
}

impl MaterialBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Identity and code
    // -----------------------------------------------------------------------

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// File name reported to the include callback as the including file.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Sets the fragment code; `line_offset` is its first line in the material file.
    pub fn with_fragment_code(mut self, code: impl Into<String>, line_offset: u32) -> Self {
        self.fragment = ShaderCode::new(code, line_offset);
        self
    }

    /// Sets the vertex code; `line_offset` is its first line in the material file.
    pub fn with_vertex_code(mut self, code: impl Into<String>, line_offset: u32) -> Self {
        self.vertex = ShaderCode::new(code, line_offset);
        self
    }

    pub fn with_include_callback(mut self, callback: IncludeCallback) -> Self {
        self.include_callback = Some(callback);
        self
    }

    pub fn with_shader_define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.push((name.into(), value.into()));
        self
    }

    // -----------------------------------------------------------------------
    // Variables, parameters and outputs
    // -----------------------------------------------------------------------

    /// Names a custom interpolated variable.
    pub fn with_variable(mut self, variable: Variable, name: impl Into<String>) -> Self {
        self.variables[variable.index()] = name.into();
        self
    }

    /// Names a custom interpolated variable by raw index.
    pub fn with_variable_index(
        self,
        index: usize,
        name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let variable = Variable::from_index(index).ok_or(ConfigError::VariableIndex(index))?;
        Ok(self.with_variable(variable, name))
    }

    /// Declares a parameter after checking the parameter limits.
    pub fn with_parameter(mut self, parameter: Parameter) -> Result<Self, ConfigError> {
        if self.parameters.len() >= MAX_PARAMETERS {
            return Err(ConfigError::TooManyParameters { max: MAX_PARAMETERS });
        }
        if self.parameters.iter().any(|p| p.name() == parameter.name()) {
            return Err(ConfigError::DuplicateParameter(parameter.name().to_string()));
        }
        if let Parameter::Subpass { name, format, .. } = &parameter {
            if *format != SamplerFormat::Float {
                return Err(ConfigError::SubpassFormat(name.clone()));
            }
            let subpasses = self.parameters.iter().filter(|p| p.is_subpass()).count();
            if subpasses >= MAX_SUBPASSES {
                return Err(ConfigError::TooManySubpasses { max: MAX_SUBPASSES });
            }
        }
        self.parameters.push(parameter);
        Ok(self)
    }

    /// Declares a scalar uniform with default precision.
    pub fn with_uniform(self, name: impl Into<String>, ty: UniformType) -> Result<Self, ConfigError> {
        self.with_parameter(Parameter::Uniform {
            name: name.into(),
            ty,
            array_size: None,
            precision: Precision::Default,
        })
    }

    /// Declares a uniform array with default precision.
    pub fn with_uniform_array(
        self,
        name: impl Into<String>,
        ty: UniformType,
        size: u32,
    ) -> Result<Self, ConfigError> {
        self.with_parameter(Parameter::Uniform {
            name: name.into(),
            ty,
            array_size: Some(size),
            precision: Precision::Default,
        })
    }

    /// Declares a float-format sampler with default precision.
    pub fn with_sampler(self, name: impl Into<String>, ty: SamplerType) -> Result<Self, ConfigError> {
        self.with_parameter(Parameter::Sampler {
            name: name.into(),
            ty,
            format: SamplerFormat::Float,
            precision: Precision::Default,
        })
    }

    /// Declares the subpass input.
    pub fn with_subpass(self, name: impl Into<String>) -> Result<Self, ConfigError> {
        self.with_parameter(Parameter::Subpass {
            name: name.into(),
            ty: SubpassType::SubpassInput,
            format: SamplerFormat::Float,
            precision: Precision::Default,
        })
    }

    /// Declares a fragment output.
    ///
    /// A `None` location takes the previous output's location plus one, or 0
    /// for the first output. Following an output at `u32::MAX` fails.
    pub fn with_output(
        mut self,
        qualifier: OutputQualifier,
        target: OutputTarget,
        ty: OutputType,
        name: impl Into<String>,
        location: Option<u32>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if target == OutputTarget::Depth {
            if ty != OutputType::Float {
                return Err(ConfigError::DepthOutputType(name));
            }
            if qualifier != OutputQualifier::Out {
                return Err(ConfigError::DepthOutputQualifier(name));
            }
        }

        let count = |t: OutputTarget| self.outputs.iter().filter(|o| o.target == t).count();
        match target {
            OutputTarget::Color if count(OutputTarget::Color) >= MAX_COLOR_OUTPUTS => {
                return Err(ConfigError::TooManyColorOutputs {
                    max: MAX_COLOR_OUTPUTS,
                });
            }
            OutputTarget::Depth if count(OutputTarget::Depth) >= MAX_DEPTH_OUTPUTS => {
                return Err(ConfigError::TooManyDepthOutputs {
                    max: MAX_DEPTH_OUTPUTS,
                });
            }
            _ => {}
        }

        let location = match (location, self.outputs.last()) {
            (Some(location), _) => location,
            (None, None) => 0,
            (None, Some(previous)) => previous
                .location
                .checked_add(1)
                .ok_or_else(|| ConfigError::OutputLocation(name.clone()))?,
        };
        self.outputs.push(Output {
            name,
            qualifier,
            target,
            ty,
            location,
        });
        Ok(self)
    }

    /// Adds required vertex attributes; POSITION is always required.
    pub fn with_required_attributes(mut self, attributes: VertexAttributes) -> Self {
        self.required_attributes |= attributes;
        self
    }

    // -----------------------------------------------------------------------
    // Render state
    // -----------------------------------------------------------------------

    pub fn with_domain(mut self, domain: MaterialDomain) -> Self {
        self.state.domain = domain;
        self
    }

    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.state.shading = shading;
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.state.interpolation = interpolation;
        self
    }

    pub fn with_blending(mut self, blending: BlendingMode) -> Self {
        self.state.blending = blending;
        self
    }

    /// Blending of the post-lighting color.
    pub fn with_post_lighting_blending(mut self, blending: BlendingMode) -> Self {
        self.state.post_lighting_blending = blending;
        self
    }

    pub fn with_transparency_mode(mut self, mode: TransparencyMode) -> Self {
        self.state.transparency = mode;
        self
    }

    pub fn with_reflection_mode(mut self, mode: ReflectionMode) -> Self {
        self.state.reflection = mode;
        self
    }

    pub fn with_refraction_mode(mut self, mode: RefractionMode) -> Self {
        self.state.refraction_mode = mode;
        self
    }

    pub fn with_refraction_type(mut self, ty: RefractionType) -> Self {
        self.state.refraction_type = ty;
        self
    }

    pub fn with_quality(mut self, quality: ShaderQuality) -> Self {
        self.state.quality = quality;
        self
    }

    pub fn with_feature_level(mut self, level: FeatureLevel) -> Self {
        self.state.feature_level = level;
        self
    }

    pub fn with_vertex_domain(mut self, domain: VertexDomain) -> Self {
        self.state.vertex_domain = domain;
        self
    }

    pub fn with_vertex_domain_device_jittered(mut self, enabled: bool) -> Self {
        self.state.vertex_domain_device_jittered = enabled;
        self
    }

    pub fn with_culling(mut self, culling: CullingMode) -> Self {
        self.state.culling = culling;
        self
    }

    pub fn with_color_write(mut self, enabled: bool) -> Self {
        self.state.color_write = enabled;
        self
    }

    /// Overrides the blending-derived depth write default.
    pub fn with_depth_write(mut self, enabled: bool) -> Self {
        self.state.depth_write = enabled;
        self.state.depth_write_set = true;
        self
    }

    pub fn with_depth_culling(mut self, enabled: bool) -> Self {
        self.state.depth_test = enabled;
        self
    }

    pub fn with_instanced(mut self, enabled: bool) -> Self {
        self.state.instanced = enabled;
        self
    }

    /// Sets double-sidedness, which also enables the capability.
    pub fn with_double_sided(mut self, enabled: bool) -> Self {
        self.state.double_sided = enabled;
        self.state.double_sided_set = true;
        self.state.double_sided_capability = true;
        self
    }

    /// Lets double-sidedness be toggled at runtime.
    pub fn with_double_sided_capability(mut self, enabled: bool) -> Self {
        self.state.double_sided_capability = enabled;
        self
    }

    pub fn with_mask_threshold(mut self, threshold: f32) -> Self {
        self.state.mask_threshold = threshold;
        self
    }

    pub fn with_shadow_multiplier(mut self, enabled: bool) -> Self {
        self.state.shadow_multiplier = enabled;
        self
    }

    pub fn with_transparent_shadow(mut self, enabled: bool) -> Self {
        self.state.transparent_shadow = enabled;
        self
    }

    pub fn with_specular_anti_aliasing(mut self, enabled: bool) -> Self {
        self.state.specular_anti_aliasing = enabled;
        self
    }

    pub fn with_specular_anti_aliasing_variance(mut self, variance: f32) -> Self {
        self.state.specular_anti_aliasing_variance = variance;
        self
    }

    pub fn with_specular_anti_aliasing_threshold(mut self, threshold: f32) -> Self {
        self.state.specular_anti_aliasing_threshold = threshold;
        self
    }

    pub fn with_clear_coat_ior_change(mut self, enabled: bool) -> Self {
        self.state.clear_coat_ior_change = enabled;
        self
    }

    pub fn with_flip_uv(mut self, enabled: bool) -> Self {
        self.state.flip_uv = enabled;
        self
    }

    /// Requires the user code to provide `surfaceShading()`. Lit materials only.
    pub fn with_custom_surface_shading(mut self, enabled: bool) -> Self {
        self.state.custom_surface_shading = enabled;
        self
    }

    pub fn with_multi_bounce_ambient_occlusion(mut self, enabled: bool) -> Self {
        self.state.multi_bounce_ao = enabled;
        self.state.multi_bounce_ao_set = true;
        self
    }

    pub fn with_specular_ambient_occlusion(mut self, enabled: bool) -> Self {
        self.state.specular_ao = enabled;
        self.state.specular_ao_set = true;
        self
    }

    /// Enables framebuffer fetch, which forces Vulkan semantics.
    pub fn with_framebuffer_fetch(mut self) -> Self {
        self.state.framebuffer_fetch = true;
        self
    }

    pub fn with_legacy_morphing(mut self) -> Self {
        self.state.legacy_morphing = true;
        self
    }

    // -----------------------------------------------------------------------
    // Targets and output control
    // -----------------------------------------------------------------------

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Adds APIs to build for. Calls accumulate; no API means OpenGL.
    pub fn with_target_api(mut self, apis: TargetApis) -> Self {
        self.target_apis |= apis;
        self
    }

    pub fn with_optimization(mut self, optimization: Optimization) -> Self {
        self.optimization = optimization;
        self
    }

    /// Logs every generated program at info level.
    pub fn with_print_shaders(mut self, enabled: bool) -> Self {
        self.print_shaders = enabled;
        self
    }

    /// Keeps debug instructions in stored SPIR-V.
    pub fn with_generate_debug_info(mut self, enabled: bool) -> Self {
        self.generate_debug_info = enabled;
        self
    }

    /// Features stripped from the generated variants.
    pub fn with_variant_filter(mut self, filter: UserVariantFilter) -> Self {
        self.variant_filter = filter;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn render_state(&self) -> &RenderState {
        &self.state
    }

    pub fn target_apis(&self) -> TargetApis {
        self.target_apis
    }

    /// Whether any custom interpolated variable was named.
    pub fn has_custom_variables(&self) -> bool {
        self.variables.iter().any(|name| !name.is_empty())
    }
}

impl std::fmt::Debug for MaterialBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialBuilder")
            .field("name", &self.name)
            .field("domain", &self.state.domain)
            .field("shading", &self.state.shading)
            .field("parameters", &self.parameters.len())
            .field("outputs", &self.outputs.len())
            .field("platform", &self.platform)
            .field("target_apis", &self.target_apis)
            .field("optimization", &self.optimization)
            .field("include_callback", &self.include_callback.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let builder = MaterialBuilder::new();
        assert_eq!(builder.name(), DEFAULT_MATERIAL_NAME);
        assert!(builder.target_apis().is_empty());
        assert_eq!(builder.optimization, Optimization::Performance);
        assert!(builder.parameters().is_empty());
        assert!(!builder.has_custom_variables());
    }

    #[test]
    fn parameter_limit() {
        let mut builder = MaterialBuilder::new();
        for i in 0..MAX_PARAMETERS {
            builder = builder.with_uniform(format!("u{i}"), UniformType::Float).unwrap();
        }
        let err = builder.with_uniform("one_too_many", UniformType::Float).unwrap_err();
        assert_eq!(err, ConfigError::TooManyParameters { max: MAX_PARAMETERS });
    }

    #[test]
    fn duplicate_parameters_are_rejected() {
        let err = MaterialBuilder::new()
            .with_uniform("tint", UniformType::Float3)
            .unwrap()
            .with_sampler("tint", SamplerType::Sampler2d)
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateParameter("tint".into()));
    }

    #[test]
    fn single_float_subpass() {
        let builder = MaterialBuilder::new().with_subpass("color").unwrap();
        assert_eq!(
            builder.clone().with_subpass("other").unwrap_err(),
            ConfigError::TooManySubpasses { max: MAX_SUBPASSES }
        );

        let err = MaterialBuilder::new()
            .with_parameter(Parameter::Subpass {
                name: "depth".into(),
                ty: SubpassType::SubpassInput,
                format: SamplerFormat::Int,
                precision: Precision::Default,
            })
            .unwrap_err();
        assert_eq!(err, ConfigError::SubpassFormat("depth".into()));
    }

    #[test]
    fn output_locations_follow_the_previous_one() {
        let builder = MaterialBuilder::new()
            .with_output(OutputQualifier::Out, OutputTarget::Color, OutputType::Float4, "a", None)
            .unwrap()
            .with_output(OutputQualifier::Out, OutputTarget::Color, OutputType::Float4, "b", Some(3))
            .unwrap()
            .with_output(OutputQualifier::InOut, OutputTarget::Color, OutputType::Float2, "c", None)
            .unwrap();
        let locations: Vec<u32> = builder.outputs().iter().map(|o| o.location).collect();
        assert_eq!(locations, [0, 3, 4]);
    }

    #[test]
    fn output_location_after_the_last_one_fails() {
        let builder = MaterialBuilder::new()
            .with_output(OutputQualifier::Out, OutputTarget::Color, OutputType::Float4, "last", Some(u32::MAX))
            .unwrap();
        let err = builder
            .with_output(OutputQualifier::Out, OutputTarget::Color, OutputType::Float4, "next", None)
            .unwrap_err();
        assert_eq!(err, ConfigError::OutputLocation("next".into()));
    }

    #[rstest]
    #[case::not_float(OutputQualifier::Out, OutputType::Float4, ConfigError::DepthOutputType("d".into()))]
    #[case::inout(OutputQualifier::InOut, OutputType::Float, ConfigError::DepthOutputQualifier("d".into()))]
    fn depth_output_constraints(
        #[case] qualifier: OutputQualifier,
        #[case] ty: OutputType,
        #[case] expected: ConfigError,
    ) {
        let err = MaterialBuilder::new()
            .with_output(qualifier, OutputTarget::Depth, ty, "d", None)
            .unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn output_count_limits() {
        let mut builder = MaterialBuilder::new();
        for i in 0..MAX_COLOR_OUTPUTS {
            builder = builder
                .with_output(OutputQualifier::Out, OutputTarget::Color, OutputType::Float4, format!("c{i}"), None)
                .unwrap();
        }
        let builder = builder
            .with_output(OutputQualifier::Out, OutputTarget::Depth, OutputType::Float, "depth", None)
            .unwrap();
        assert_eq!(
            builder
                .clone()
                .with_output(OutputQualifier::Out, OutputTarget::Color, OutputType::Float4, "extra", None)
                .unwrap_err(),
            ConfigError::TooManyColorOutputs { max: MAX_COLOR_OUTPUTS }
        );
        assert_eq!(
            builder
                .with_output(OutputQualifier::Out, OutputTarget::Depth, OutputType::Float, "depth2", None)
                .unwrap_err(),
            ConfigError::TooManyDepthOutputs { max: MAX_DEPTH_OUTPUTS }
        );
    }

    #[test]
    fn target_apis_accumulate() {
        let builder = MaterialBuilder::new()
            .with_target_api(TargetApis::OPENGL)
            .with_target_api(TargetApis::METAL);
        assert_eq!(builder.target_apis(), TargetApis::OPENGL | TargetApis::METAL);
    }

    #[test]
    fn set_flags_track_explicit_calls() {
        let builder = MaterialBuilder::new()
            .with_depth_write(false)
            .with_double_sided(false)
            .with_multi_bounce_ambient_occlusion(true);
        let state = builder.render_state();
        assert!(state.depth_write_set && !state.depth_write);
        assert!(state.double_sided_set && state.double_sided_capability && !state.double_sided);
        assert!(state.multi_bounce_ao_set);
        assert!(!state.specular_ao_set);
    }

    #[test]
    fn variable_index_range() {
        let builder = MaterialBuilder::new().with_variable_index(3, "extra").unwrap();
        assert!(builder.has_custom_variables());
        assert_eq!(
            MaterialBuilder::new().with_variable_index(4, "nope").unwrap_err(),
            ConfigError::VariableIndex(4)
        );
    }
}
