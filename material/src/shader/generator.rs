use std::fmt::Display;

use super::{ShaderCode, ShaderRequest, ShaderSourceProvider};
use crate::info::{MaterialInfo, OutputQualifier, OutputTarget};
use crate::parameter::{Precision, SamplerType};
use crate::property::Property;
use crate::types::{
    Api, Interpolation, MaterialDomain, RefractionMode, ShaderModel, ShaderStage, TargetLanguage,
    VertexAttributes,
};
use crate::variant::VariantKey;

/// Extension required by `samplerExternalOES` on OpenGL ES.
const EXTERNAL_SAMPLER_EXTENSION: &str = "#extension GL_OES_EGL_image_external_essl3 : require";

/// Location of the surface world-position varying, after the custom variables.
const WORLD_POSITION_LOCATION: usize = 4;

/// Assembles GLSL programs from a material description.
///
/// Output depends only on the request, so repeated builds produce identical
/// text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShaderGenerator;

impl ShaderGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl ShaderSourceProvider for ShaderGenerator {
    fn generate(&self, request: &ShaderRequest<'_>) -> String {
        let mut out = Glsl::default();
        write_header(&mut out, request);
        write_defines(&mut out, request);
        out.blank();

        match (request.info.domain(), request.stage) {
            (MaterialDomain::Surface, ShaderStage::Vertex) => surface_vertex(&mut out, request),
            (MaterialDomain::Surface, ShaderStage::Fragment) => surface_fragment(&mut out, request),
            (MaterialDomain::PostProcess, ShaderStage::Vertex) => {
                post_process_vertex(&mut out, request)
            }
            (MaterialDomain::PostProcess, ShaderStage::Fragment) => {
                post_process_fragment(&mut out, request)
            }
        }
        out.text
    }

    fn fixup_external_samplers(&self, shader: &mut String, request: &ShaderRequest<'_>) {
        let info = request.info;
        if !info.has_external_samplers || request.permutation.shader_model != ShaderModel::Mobile {
            return;
        }

        for sampler in info.sampler_block.samplers() {
            if sampler.ty != SamplerType::SamplerExternal {
                continue;
            }
            let declared = format!("sampler2D {};", sampler_name(&sampler.name));
            let external = format!("samplerExternalOES {};", sampler_name(&sampler.name));
            *shader = shader.replace(&declared, &external);
        }

        if shader.contains(EXTERNAL_SAMPLER_EXTENSION) {
            return;
        }
        let insert_at = shader.find('\n').map_or(shader.len(), |i| i + 1);
        shader.insert_str(insert_at, &format!("{EXTERNAL_SAMPLER_EXTENSION}\n"));
    }
}

// ---------------------------------------------------------------------------
// Text assembly
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Glsl {
    text: String,
}

impl Glsl {
    fn line(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    fn blank(&mut self) {
        self.text.push('\n');
    }

    fn define(&mut self, name: impl AsRef<str>) {
        self.line(format!("#define {}", name.as_ref()));
    }

    fn define_value(&mut self, name: impl AsRef<str>, value: impl Display) {
        self.line(format!("#define {} {}", name.as_ref(), value));
    }

    fn user_code(&mut self, code: &ShaderCode) {
        if code.line_offset > 0 {
            self.line(format!("#line {}", code.line_offset));
        }
        self.line(code.code.trim_end());
    }
}

fn qualified(precision: Precision, ty: &str) -> String {
    match precision.qualifier() {
        "" => ty.to_string(),
        qualifier => format!("{qualifier} {ty}"),
    }
}

fn sampler_name(name: &str) -> String {
    format!("materialParams_{name}")
}

fn interpolation_prefix(interpolation: Interpolation) -> &'static str {
    match interpolation {
        Interpolation::Smooth => "",
        Interpolation::Flat => "flat ",
    }
}

// ---------------------------------------------------------------------------
// Common sections
// ---------------------------------------------------------------------------

fn write_header(out: &mut Glsl, request: &ShaderRequest<'_>) {
    let permutation = request.permutation;
    let uses_spirv = permutation.language == TargetLanguage::Spirv;
    out.line(match (permutation.language, permutation.shader_model) {
        (TargetLanguage::Spirv, _) => "#version 450",
        (TargetLanguage::Glsl, ShaderModel::Mobile) => "#version 300 es",
        (TargetLanguage::Glsl, ShaderModel::Desktop) => "#version 410 core",
    });
    if !uses_spirv
        && permutation.shader_model == ShaderModel::Mobile
        && request.info.has_external_samplers
    {
        out.line(EXTERNAL_SAMPLER_EXTENSION);
    }
    out.blank();

    out.define(match permutation.api {
        Api::OpenGl => "TARGET_GL_ENVIRONMENT",
        Api::Vulkan => "TARGET_VULKAN_ENVIRONMENT",
        Api::Metal => "TARGET_METAL_ENVIRONMENT",
    });
    if uses_spirv {
        out.define("TARGET_LANGUAGE_SPIRV");
    }
    out.define(match permutation.shader_model {
        ShaderModel::Mobile => "TARGET_MOBILE",
        ShaderModel::Desktop => "TARGET_DESKTOP",
    });
    out.define(match request.stage {
        ShaderStage::Vertex => "SHADER_TYPE_VERTEX",
        ShaderStage::Fragment => "SHADER_TYPE_FRAGMENT",
    });

    if permutation.shader_model == ShaderModel::Mobile {
        out.line("precision highp float;");
        out.line("precision highp int;");
    }
}

fn write_defines(out: &mut Glsl, request: &ShaderRequest<'_>) {
    let info = request.info;
    let state = &info.state;
    out.blank();

    match state.domain {
        MaterialDomain::Surface => {
            for (name, _) in request.variant.iter_names() {
                out.define(format!("VARIANT_HAS_{name}"));
            }
        }
        MaterialDomain::PostProcess => {
            let opaque = request.variant == VariantKey::POST_PROCESS_OPAQUE;
            out.define_value("POST_PROCESS_OPAQUE", u8::from(opaque));
        }
    }

    out.define(state.shading.define_name());
    out.define(state.blending.define_name());
    out.define(format!(
        "POST_LIGHTING_{}",
        state.post_lighting_blending.define_name()
    ));
    out.define(state.vertex_domain.define_name());
    out.define_value("MATERIAL_FEATURE_LEVEL", state.feature_level.number());
    out.define_value("SHADER_QUALITY", state.quality as u8);

    let flags = [
        (state.double_sided_capability, "MATERIAL_HAS_DOUBLE_SIDED_CAPABILITY"),
        (state.specular_anti_aliasing, "GEOMETRIC_SPECULAR_AA"),
        (state.custom_surface_shading, "MATERIAL_HAS_CUSTOM_SURFACE_SHADING"),
        (state.shadow_multiplier, "MATERIAL_HAS_SHADOW_MULTIPLIER"),
        (state.transparent_shadow, "MATERIAL_HAS_TRANSPARENT_SHADOW"),
        (state.clear_coat_ior_change, "CLEAR_COAT_IOR_CHANGE"),
        (state.instanced, "MATERIAL_HAS_INSTANCES"),
        (state.vertex_domain_device_jittered, "VERTEX_DOMAIN_DEVICE_JITTERED"),
        (state.legacy_morphing, "LEGACY_MORPHING"),
        (state.framebuffer_fetch, "MATERIAL_HAS_FRAMEBUFFER_FETCH"),
        (state.flip_uv && request.stage == ShaderStage::Vertex, "FLIP_UV_ATTRIBUTE"),
    ];
    for (enabled, name) in flags {
        if enabled {
            out.define(name);
        }
    }
    if state.multi_bounce_ao_set {
        out.define_value("MULTI_BOUNCE_AMBIENT_OCCLUSION", u8::from(state.multi_bounce_ao));
    }
    if state.specular_ao_set {
        out.define_value("SPECULAR_AMBIENT_OCCLUSION", u8::from(state.specular_ao));
    }
    if state.refraction_mode != RefractionMode::None {
        out.define("MATERIAL_HAS_REFRACTION");
        out.define_value("REFRACTION_MODE", state.refraction_mode as u8);
        out.define_value("REFRACTION_TYPE", state.refraction_type as u8);
    }

    for property in request.properties.iter() {
        out.define(property.define_name());
    }
    for (name, value) in &request.source.defines {
        if value.is_empty() {
            out.define(name);
        } else {
            out.define_value(name, value);
        }
    }
}

fn write_uniforms(out: &mut Glsl, request: &ShaderRequest<'_>) {
    let block = &request.info.uniform_block;
    if block.is_empty() {
        return;
    }
    if request.permutation.language == TargetLanguage::Spirv {
        out.line(format!("layout(std140, set = 1, binding = 0) uniform {} {{", block.name()));
    } else {
        out.line(format!("layout(std140) uniform {} {{", block.name()));
    }
    for field in block.fields() {
        let ty = qualified(field.precision, field.ty.glsl_name());
        if field.array_size > 0 {
            out.line(format!("    {ty} {}[{}];", field.name, field.array_size));
        } else {
            out.line(format!("    {ty} {};", field.name));
        }
    }
    out.line("} materialParams;");
    out.blank();
}

fn write_samplers(out: &mut Glsl, request: &ShaderRequest<'_>) {
    let info = request.info;
    if info.sampler_block.is_empty() || !info.sampler_block.stage_flags().contains(request.stage.flag()) {
        return;
    }
    let uses_spirv = request.permutation.language == TargetLanguage::Spirv;
    for sampler in info.sampler_block.samplers() {
        // external samplers go through SPIR-V as sampler2D, see fixup_external_samplers
        let ty = if uses_spirv && sampler.ty == SamplerType::SamplerExternal {
            SamplerType::Sampler2d.glsl_name(sampler.format)
        } else {
            sampler.ty.glsl_name(sampler.format)
        };
        let declaration = format!("{} {};", qualified(sampler.precision, &ty), sampler_name(&sampler.name));
        match info.sampler_bindings.binding_of(&sampler.name) {
            Some(binding) if uses_spirv => {
                out.line(format!("layout(set = 2, binding = {binding}) uniform {declaration}"));
            }
            _ => out.line(format!("uniform {declaration}")),
        }
    }
    out.blank();
}

fn write_subpass(out: &mut Glsl, request: &ShaderRequest<'_>) {
    let Some(subpass) = &request.info.subpass else {
        return;
    };
    if request.permutation.language != TargetLanguage::Spirv {
        return;
    }
    out.line(format!(
        "layout(input_attachment_index = {}, set = 3, binding = {}) uniform {} {};",
        subpass.attachment_index,
        subpass.binding,
        qualified(subpass.precision, "subpassInput"),
        sampler_name(&subpass.name)
    ));
    out.blank();
}

/// Declares the custom variables as varyings of the given direction.
fn write_variables(out: &mut Glsl, request: &ShaderRequest<'_>, direction: &str) {
    let prefix = interpolation_prefix(request.info.state.interpolation);
    for (location, name) in request.source.variables.iter().enumerate() {
        if !name.is_empty() {
            out.line(format!(
                "layout(location = {location}) {prefix}{direction} highp vec4 {name};"
            ));
        }
    }
}

fn property_default(property: Property) -> &'static str {
    match property {
        Property::BaseColor => "vec4(1.0)",
        Property::Roughness
        | Property::AmbientOcclusion
        | Property::ClearCoatRoughness
        | Property::Glossiness
        | Property::Thickness
        | Property::SpecularFactor
        | Property::Ior => "1.0",
        Property::Reflectance => "0.5",
        Property::SubsurfacePower => "12.234",
        Property::Normal | Property::ClearCoatNormal | Property::BentNormal => "vec3(0.0, 0.0, 1.0)",
        Property::AnisotropyDirection => "vec3(1.0, 0.0, 0.0)",
        Property::SpecularColorFactor => "vec3(1.0)",
        Property::ClipSpaceTransform => "mat4(1.0)",
        _ => match property.glsl_type() {
            "vec4" => "vec4(0.0)",
            "vec3" => "vec3(0.0)",
            _ => "0.0",
        },
    }
}

// ---------------------------------------------------------------------------
// Surface programs
// ---------------------------------------------------------------------------

fn surface_vertex(out: &mut Glsl, request: &ShaderRequest<'_>) {
    let info: &MaterialInfo = request.info;
    let mut attributes = info.required_attributes;
    if request.variant.contains(VariantKey::SKINNING) {
        attributes |= VertexAttributes::BONE_INDICES | VertexAttributes::BONE_WEIGHTS;
    }
    for (location, ty, name) in attributes.declarations() {
        out.line(format!("layout(location = {location}) in {ty} {name};"));
    }
    out.blank();

    write_variables(out, request, "out");
    out.line(format!(
        "layout(location = {WORLD_POSITION_LOCATION}) out highp vec3 vertex_worldPosition;"
    ));
    out.blank();

    write_uniforms(out, request);
    write_samplers(out, request);

    let transform = request.properties.contains(Property::ClipSpaceTransform);
    out.line("struct MaterialVertexInputs {");
    out.line("    vec4 worldPosition;");
    for name in request.source.variables.iter().filter(|n| !n.is_empty()) {
        out.line(format!("    vec4 {name};"));
    }
    if transform {
        out.line("    mat4 clipSpaceTransform;");
    }
    out.line("};");
    out.blank();

    out.line("void initMaterialVertex(out MaterialVertexInputs material) {");
    out.line("    material.worldPosition = mesh_position;");
    for name in request.source.variables.iter().filter(|n| !n.is_empty()) {
        out.line(format!("    material.{name} = vec4(0.0);"));
    }
    if transform {
        out.line("    material.clipSpaceTransform = mat4(1.0);");
    }
    out.line("}");
    out.blank();

    if request.source.vertex.is_empty() {
        out.line("void materialVertex(inout MaterialVertexInputs material) {");
        out.line("}");
    } else {
        out.user_code(&request.source.vertex);
    }
    out.blank();

    out.line("void main() {");
    out.line("    MaterialVertexInputs material;");
    out.line("    initMaterialVertex(material);");
    out.line("    materialVertex(material);");
    out.line("    vertex_worldPosition = material.worldPosition.xyz;");
    for name in request.source.variables.iter().filter(|n| !n.is_empty()) {
        out.line(format!("    {name} = material.{name};"));
    }
    if transform {
        out.line("    gl_Position = material.clipSpaceTransform * material.worldPosition;");
    } else {
        out.line("    gl_Position = material.worldPosition;");
    }
    out.line("}");
}

fn surface_fragment(out: &mut Glsl, request: &ShaderRequest<'_>) {
    write_variables(out, request, "in");
    out.line(format!(
        "layout(location = {WORLD_POSITION_LOCATION}) in highp vec3 vertex_worldPosition;"
    ));
    out.blank();
    out.line("layout(location = 0) out vec4 fragColor;");
    out.blank();

    write_uniforms(out, request);
    write_samplers(out, request);
    write_subpass(out, request);

    let fields: Vec<Property> = std::iter::once(Property::BaseColor)
        .chain(
            request
                .properties
                .iter()
                .filter(|p| *p != Property::BaseColor && !p.is_vertex()),
        )
        .collect();

    out.line("struct MaterialInputs {");
    for property in &fields {
        out.line(format!("    {} {};", property.glsl_type(), property.name()));
    }
    out.line("};");
    out.blank();

    out.line("void initMaterial(out MaterialInputs material) {");
    for property in &fields {
        out.line(format!(
            "    material.{} = {};",
            property.name(),
            property_default(*property)
        ));
    }
    out.line("}");
    out.blank();

    out.line("void prepareMaterial(const MaterialInputs material) {");
    out.line("}");
    out.blank();

    if request.source.fragment.is_empty() {
        out.line("void material(inout MaterialInputs material) {");
        out.line("    prepareMaterial(material);");
        out.line("}");
    } else {
        out.user_code(&request.source.fragment);
    }
    out.blank();

    out.line("void main() {");
    out.line("    MaterialInputs inputs;");
    out.line("    initMaterial(inputs);");
    out.line("    material(inputs);");
    if request.variant.is_depth() {
        out.line("    fragColor = vec4(gl_FragCoord.z);");
    } else {
        out.line("    fragColor = inputs.baseColor;");
    }
    out.line("}");
}

// ---------------------------------------------------------------------------
// Post-process programs
// ---------------------------------------------------------------------------

fn post_process_vertex(out: &mut Glsl, request: &ShaderRequest<'_>) {
    out.line("layout(location = 0) in vec4 position;");
    out.blank();
    write_variables(out, request, "out");
    out.blank();

    write_uniforms(out, request);
    write_samplers(out, request);

    out.line("struct PostProcessVertexInputs {");
    out.line("    vec4 position;");
    out.line("    vec2 normalizedUV;");
    for name in request.source.variables.iter().filter(|n| !n.is_empty()) {
        out.line(format!("    vec4 {name};"));
    }
    out.line("};");
    out.blank();

    if request.source.vertex.is_empty() {
        out.line("void postProcessVertex(inout PostProcessVertexInputs postProcess) {");
        out.line("}");
    } else {
        out.user_code(&request.source.vertex);
    }
    out.blank();

    out.line("void main() {");
    out.line("    PostProcessVertexInputs inputs;");
    out.line("    inputs.position = position;");
    out.line("    inputs.normalizedUV = position.xy * 0.5 + 0.5;");
    for name in request.source.variables.iter().filter(|n| !n.is_empty()) {
        out.line(format!("    inputs.{name} = vec4(0.0);"));
    }
    out.line("    postProcessVertex(inputs);");
    for name in request.source.variables.iter().filter(|n| !n.is_empty()) {
        out.line(format!("    {name} = inputs.{name};"));
    }
    out.line("    gl_Position = inputs.position;");
    out.line("}");
}

fn post_process_fragment(out: &mut Glsl, request: &ShaderRequest<'_>) {
    let outputs = &request.source.outputs;
    write_variables(out, request, "in");
    out.blank();

    for output in outputs.iter().filter(|o| o.target == OutputTarget::Color) {
        out.line(format!(
            "layout(location = {}) {} {} output_{};",
            output.location,
            output.qualifier.keyword(),
            output.ty.glsl_name(),
            output.name
        ));
    }
    out.blank();

    write_uniforms(out, request);
    write_samplers(out, request);
    write_subpass(out, request);

    out.line("struct PostProcessInputs {");
    for output in outputs {
        out.line(format!("    {} {};", output.ty.glsl_name(), output.name));
    }
    out.line("};");
    out.blank();

    if request.source.fragment.is_empty() {
        out.line("void postProcess(inout PostProcessInputs postProcess) {");
        out.line("}");
    } else {
        out.user_code(&request.source.fragment);
    }
    out.blank();

    out.line("void main() {");
    out.line("    PostProcessInputs inputs;");
    for output in outputs {
        let initial = match (output.target, output.qualifier) {
            (OutputTarget::Color, OutputQualifier::InOut) => format!("output_{}", output.name),
            (OutputTarget::Depth, _) => "gl_FragCoord.z".to_string(),
            _ => format!("{}(0.0)", output.ty.glsl_name()),
        };
        out.line(format!("    inputs.{} = {initial};", output.name));
    }
    out.line("    postProcess(inputs);");
    for output in outputs {
        match output.target {
            OutputTarget::Color => {
                out.line(format!("    output_{0} = inputs.{0};", output.name));
            }
            OutputTarget::Depth => out.line(format!("    gl_FragDepth = inputs.{};", output.name)),
        }
    }
    out.line("}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{Output, OutputType, RenderState};
    use crate::parameter::{Parameter, SamplerFormat, UniformType};
    use crate::permutation::Permutation;
    use crate::property::PropertySet;
    use crate::shader::MaterialSource;

    fn surface_info(parameters: &[Parameter]) -> MaterialInfo {
        MaterialInfo::new("test", RenderState::default(), parameters, VertexAttributes::empty())
    }

    fn generate(
        stage: ShaderStage,
        permutation: Permutation,
        variant: VariantKey,
        source: &MaterialSource,
        info: &MaterialInfo,
        properties: &PropertySet,
    ) -> String {
        ShaderGenerator::new().generate(&ShaderRequest {
            stage,
            permutation,
            variant,
            source,
            info,
            properties,
        })
    }

    fn gl(model: ShaderModel) -> Permutation {
        Permutation::new(model, Api::OpenGl, TargetLanguage::Glsl)
    }

    #[test]
    fn version_follows_target() {
        let info = surface_info(&[]);
        let source = MaterialSource::default();
        let props = PropertySet::new();
        let version = |p: Permutation| {
            generate(ShaderStage::Fragment, p, VariantKey::empty(), &source, &info, &props)
                .lines()
                .next()
                .map(str::to_string)
        };
        assert_eq!(version(gl(ShaderModel::Mobile)).as_deref(), Some("#version 300 es"));
        assert_eq!(version(gl(ShaderModel::Desktop)).as_deref(), Some("#version 410 core"));
        assert_eq!(
            version(Permutation::new(ShaderModel::Desktop, Api::Vulkan, TargetLanguage::Spirv))
                .as_deref(),
            Some("#version 450")
        );
    }

    #[test]
    fn generation_is_deterministic() {
        let info = surface_info(&[Parameter::Uniform {
            name: "tint".into(),
            ty: UniformType::Float4,
            array_size: None,
            precision: Precision::High,
        }]);
        let source = MaterialSource::default();
        let props: PropertySet = [Property::Roughness].into_iter().collect();
        let a = generate(ShaderStage::Fragment, gl(ShaderModel::Mobile), VariantKey::FOG, &source, &info, &props);
        let b = generate(ShaderStage::Fragment, gl(ShaderModel::Mobile), VariantKey::FOG, &source, &info, &props);
        assert_eq!(a, b);
        assert!(a.contains("#define VARIANT_HAS_FOG"));
        assert!(a.contains("    highp vec4 tint;"));
    }

    #[test]
    fn material_inputs_only_carry_used_properties() {
        let info = surface_info(&[]);
        let source = MaterialSource::default();
        let props: PropertySet = [Property::Metallic].into_iter().collect();
        let text = generate(ShaderStage::Fragment, gl(ShaderModel::Desktop), VariantKey::empty(), &source, &info, &props);
        assert!(text.contains("    vec4 baseColor;"));
        assert!(text.contains("    float metallic;"));
        assert!(!text.contains("roughness;"));
        assert!(text.contains("#define MATERIAL_HAS_METALLIC"));
        assert!(text.contains("prepareMaterial(material);"));
    }

    #[test]
    fn user_code_gets_line_directive() {
        let info = surface_info(&[]);
        let source = MaterialSource {
            fragment: ShaderCode::new(
                "void material(inout MaterialInputs material) {\n    prepareMaterial(material);\n}",
                12,
            ),
            ..Default::default()
        };
        let text = generate(ShaderStage::Fragment, gl(ShaderModel::Desktop), VariantKey::empty(), &source, &info, &PropertySet::new());
        assert!(text.contains("#line 12\nvoid material("));
    }

    #[test]
    fn external_samplers_are_fixed_up_after_cross_compilation() {
        let info = surface_info(&[Parameter::Sampler {
            name: "video".into(),
            ty: SamplerType::SamplerExternal,
            format: SamplerFormat::Float,
            precision: Precision::Default,
        }]);
        let source = MaterialSource::default();
        let props = PropertySet::new();
        let permutation = Permutation::new(ShaderModel::Mobile, Api::OpenGl, TargetLanguage::Spirv);
        let request = ShaderRequest {
            stage: ShaderStage::Fragment,
            permutation,
            variant: VariantKey::empty(),
            source: &source,
            info: &info,
            properties: &props,
        };
        let generator = ShaderGenerator::new();
        let mut text = generator.generate(&request);
        assert!(text.contains("sampler2D materialParams_video;"));
        assert!(!text.contains(EXTERNAL_SAMPLER_EXTENSION));

        generator.fixup_external_samplers(&mut text, &request);
        assert!(text.contains("samplerExternalOES materialParams_video;"));
        assert_eq!(text.lines().nth(1), Some(EXTERNAL_SAMPLER_EXTENSION));
    }

    #[test]
    fn post_process_writes_declared_outputs() {
        let state = RenderState {
            domain: MaterialDomain::PostProcess,
            ..Default::default()
        };
        let info = MaterialInfo::new("pp", state, &[], VertexAttributes::empty());
        let source = MaterialSource {
            outputs: vec![
                Output::default_color(),
                Output {
                    name: "depth".into(),
                    qualifier: OutputQualifier::Out,
                    target: OutputTarget::Depth,
                    ty: OutputType::Float,
                    location: 0,
                },
            ],
            ..Default::default()
        };
        let text = generate(
            ShaderStage::Fragment,
            gl(ShaderModel::Desktop),
            VariantKey::POST_PROCESS_TRANSLUCENT,
            &source,
            &info,
            &PropertySet::new(),
        );
        assert!(text.contains("layout(location = 0) out vec4 output_color;"));
        assert!(text.contains("gl_FragDepth = inputs.depth;"));
        assert!(text.contains("#define POST_PROCESS_OPAQUE 0"));
        assert!(text.contains("void postProcess(inout PostProcessInputs postProcess)"));
    }
}
