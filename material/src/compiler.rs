//! Top-level build pipeline.
//!
//! A build moves through four stages, each returning `Result` so the first
//! failure short-circuits the rest:
//!
//! 1. **prepare** - backend check, default outputs, include resolution,
//!    derived [`MaterialInfo`], permutations and variants
//! 2. **validate** - feature level limits, property discovery, semantic analysis
//! 3. **compile** - every `(permutation, variant)` program through the [`Orchestrator`]
//! 4. **package** - chunks in their fixed order, flattened into a [`Package`]
//!
//! [`MaterialCompiler::build`] reports the error and returns
//! [`Package::invalid`]; [`MaterialCompiler::try_build`] hands the error back.

use std::sync::Arc;

use matforge_core::compute::JobSystem;
use matforge_core::diagnostics::DiagnosticBuffer;
use matforge_core::profiling::profile_scope;

use crate::analysis::{ShaderAnalyzer, StaticAnalyzer};
use crate::backend::{BackendCompiler, BackendLifecycle, BackendSession};
use crate::builder::MaterialBuilder;
use crate::chunk::{
    ChunkContainer, ChunkType, SamplerBindingsChunk, SamplerInterfaceBlockChunk, ShaderTableChunk,
    SpirvDictionaryChunk, SubpassChunk, TextDictionaryChunk, UniformBindingsChunk,
    UniformInterfaceBlockChunk,
};
use crate::entries::ShaderTables;
use crate::error::BuildError;
use crate::info::{MaterialInfo, Output};
use crate::interface_block::{MATERIAL_PARAMS, uniform_block_bindings};
use crate::orchestrator::{BuildContext, Orchestrator};
use crate::package::Package;
use crate::parameter::SamplerType;
use crate::permutation::{PermutationPlan, PermutationRequest, plan_permutations};
use crate::property::PropertySet;
use crate::shader::{
    MaterialSource, ShaderCode, ShaderGenerator, ShaderRequest, ShaderSourceProvider,
    resolve_includes,
};
use crate::types::{BlendingMode, MaterialDomain, Shading, ShaderStage};
use crate::variant::{Variant, VariantKey, post_process_variants, surface_variants};

/// Version written into every package.
pub const MATERIAL_VERSION: u32 = 1;

/// Diagnostic target of build failures.
pub const DIAGNOSTIC_TARGET: &str = "matforge::build";

/// Compiler-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerSettings {
    /// Workers compiling the programs of one permutation.
    pub worker_threads: usize,
    /// Diagnostics retained by [`MaterialCompiler::diagnostics`].
    pub diagnostics_capacity: usize,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            worker_threads: std::thread::available_parallelism().map_or(1, |n| n.get()),
            diagnostics_capacity: DiagnosticBuffer::DEFAULT_CAPACITY,
        }
    }
}

/// Output of the prepare stage.
struct Prepared {
    info: MaterialInfo,
    source: MaterialSource,
    plan: PermutationPlan,
    variants: Vec<Variant>,
}

/// Builds [`MaterialBuilder`] descriptions into packages.
///
/// The backend must be acquired (see [`MaterialCompiler::session`]) for the
/// duration of any build.
pub struct MaterialCompiler {
    lifecycle: Arc<BackendLifecycle>,
    backend: Arc<dyn BackendCompiler>,
    provider: Arc<dyn ShaderSourceProvider>,
    analyzer: Arc<dyn ShaderAnalyzer>,
    jobs: JobSystem,
    diagnostics: DiagnosticBuffer,
}

impl MaterialCompiler {
    /// Creates a compiler with the default generator and analyzer.
    pub fn new(backend: Arc<dyn BackendCompiler>) -> Self {
        let settings = CompilerSettings::default();
        Self {
            lifecycle: Arc::new(BackendLifecycle::new(Arc::clone(&backend))),
            backend,
            provider: Arc::new(ShaderGenerator::new()),
            analyzer: Arc::new(StaticAnalyzer::new()),
            jobs: JobSystem::new(settings.worker_threads),
            diagnostics: DiagnosticBuffer::new(settings.diagnostics_capacity),
        }
    }

    pub fn with_settings(mut self, settings: CompilerSettings) -> Self {
        self.jobs = JobSystem::new(settings.worker_threads);
        self.diagnostics = DiagnosticBuffer::new(settings.diagnostics_capacity);
        self
    }

    pub fn with_source_provider(mut self, provider: Arc<dyn ShaderSourceProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn ShaderAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn lifecycle(&self) -> &Arc<BackendLifecycle> {
        &self.lifecycle
    }

    /// Acquires the backend until the returned guard is dropped.
    pub fn session(&self) -> BackendSession {
        self.lifecycle.session()
    }

    /// Diagnostics reported by builds of this compiler.
    pub fn diagnostics(&self) -> &DiagnosticBuffer {
        &self.diagnostics
    }

    /// Builds a package, or the invalid package after reporting the failure.
    pub fn build(&self, builder: &MaterialBuilder) -> Package {
        match self.try_build(builder) {
            Ok(package) => package,
            Err(err) => {
                self.diagnostics.error(
                    DIAGNOSTIC_TARGET,
                    format!("failed to build material \"{}\": {err}", builder.name),
                );
                Package::invalid()
            }
        }
    }

    /// Builds a package, returning why the build failed.
    pub fn try_build(&self, builder: &MaterialBuilder) -> Result<Package, BuildError> {
        profile_scope!("build_material");

        let prepared = self.prepare(builder)?;
        let properties = self.validate(&prepared)?;
        let tables = self.compile(builder, &prepared, &properties)?;
        let package = package(builder, &prepared, &properties, tables);

        log::debug!(
            "built material \"{}\": {} bytes",
            builder.name,
            package.len()
        );
        Ok(package)
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    fn prepare(&self, builder: &MaterialBuilder) -> Result<Prepared, BuildError> {
        profile_scope!("prepare");

        if !self.lifecycle.is_active() {
            return Err(BuildError::NotInitialized);
        }

        let state = builder.state;
        let mut outputs = builder.outputs.clone();
        if state.domain == MaterialDomain::PostProcess && outputs.is_empty() {
            outputs.push(Output::default_color());
        }

        let callback = builder.include_callback.as_ref();
        let fragment = ShaderCode::new(
            resolve_includes(&builder.fragment.code, &builder.file_name, callback)?,
            builder.fragment.line_offset,
        );
        let vertex = ShaderCode::new(
            resolve_includes(&builder.vertex.code, &builder.file_name, callback)?,
            builder.vertex.line_offset,
        );

        if state.custom_surface_shading && state.shading != Shading::Lit {
            return Err(BuildError::IncompatibleShading(
                "custom surface shading requires lit shading".into(),
            ));
        }

        let info = MaterialInfo::new(
            builder.name.clone(),
            state,
            &builder.parameters,
            builder.required_attributes,
        );

        let plan = plan_permutations(&PermutationRequest {
            platform: builder.platform,
            target_apis: builder.target_apis,
            optimization: builder.optimization,
            vulkan_semantics: state.framebuffer_fetch,
        });
        if plan.permutations.is_empty() {
            return Err(BuildError::NoPermutations);
        }

        let variants = match state.domain {
            MaterialDomain::Surface => {
                surface_variants(builder.variant_filter, info.is_lit(), state.shadow_multiplier)
            }
            MaterialDomain::PostProcess => post_process_variants(),
        };

        Ok(Prepared {
            info,
            source: MaterialSource {
                fragment,
                vertex,
                variables: builder.variables.clone(),
                outputs,
                defines: builder.defines.clone(),
            },
            plan,
            variants,
        })
    }

    fn validate(&self, prepared: &Prepared) -> Result<PropertySet, BuildError> {
        profile_scope!("validate");

        self.check_feature_level(&prepared.info)?;

        let properties = match prepared.info.domain() {
            MaterialDomain::Surface => self.find_properties(prepared)?,
            MaterialDomain::PostProcess => PropertySet::new(),
        };
        self.run_semantic_analysis(prepared, &properties)?;
        Ok(properties)
    }

    fn compile(
        &self,
        builder: &MaterialBuilder,
        prepared: &Prepared,
        properties: &PropertySet,
    ) -> Result<ShaderTables, BuildError> {
        let ctx = BuildContext {
            name: &builder.name,
            source: &prepared.source,
            info: &prepared.info,
            properties,
            optimization: prepared.plan.optimization,
            generate_debug_info: builder.generate_debug_info,
            print_shaders: builder.print_shaders,
        };
        Orchestrator {
            jobs: &self.jobs,
            provider: self.provider.as_ref(),
            backend: self.backend.as_ref(),
            diagnostics: &self.diagnostics,
        }
        .generate_shaders(&prepared.plan.permutations, &prepared.variants, &ctx)
    }

    // -----------------------------------------------------------------------
    // Validation steps
    // -----------------------------------------------------------------------

    fn check_feature_level(&self, info: &MaterialInfo) -> Result<(), BuildError> {
        let level = info.state.feature_level;
        let samplers = info.sampler_block.samplers();

        let reason = match level.max_samplers() {
            Some(max) if samplers.len() > max => Some(format!("more than {max} samplers")),
            _ if !level.allows_cubemap_arrays()
                && samplers.iter().any(|s| s.ty == SamplerType::SamplerCubemapArray) =>
            {
                Some("uses a samplerCubemapArray".to_string())
            }
            _ => None,
        };
        let Some(reason) = reason else {
            return Ok(());
        };

        let stages = info.sampler_block.stage_flags();
        for sampler in samplers {
            self.diagnostics.error(
                DIAGNOSTIC_TARGET,
                format!("\"{}\" {} {stages}", sampler.name, sampler.ty.name()),
            );
        }
        Err(BuildError::FeatureLevel {
            material: info.name.clone(),
            level,
            reason,
        })
    }

    /// Probes each stage with every property present and records the ones
    /// the user code writes.
    fn find_properties(&self, prepared: &Prepared) -> Result<PropertySet, BuildError> {
        let all = PropertySet::all();
        let mut found = PropertySet::new();
        for stage in [ShaderStage::Fragment, ShaderStage::Vertex] {
            let probe = self.peek(prepared, stage, &all);
            self.analyzer
                .find_properties(stage, &probe, &mut found, &prepared.plan.semantic)
                .map_err(BuildError::PropertyDiscovery)?;
        }
        log::debug!(
            "material \"{}\" uses {} properties",
            prepared.info.name,
            found.len()
        );
        Ok(found)
    }

    fn run_semantic_analysis(
        &self,
        prepared: &Prepared,
        properties: &PropertySet,
    ) -> Result<(), BuildError> {
        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            let source = self.peek(prepared, stage, properties);
            self.analyzer
                .analyze(stage, &source, &prepared.plan.semantic, &prepared.info)
                .map_err(BuildError::SemanticAnalysis)?;
        }
        Ok(())
    }

    /// Generates the base variant of `stage` for the semantic target.
    fn peek(&self, prepared: &Prepared, stage: ShaderStage, properties: &PropertySet) -> String {
        self.provider.generate(&ShaderRequest {
            stage,
            permutation: prepared.plan.semantic,
            variant: VariantKey::empty(),
            source: &prepared.source,
            info: &prepared.info,
            properties,
        })
    }
}

#[cfg(feature = "naga-backend")]
impl Default for MaterialCompiler {
    fn default() -> Self {
        Self::new(Arc::new(crate::backend::NagaCompiler::new()))
    }
}

impl std::fmt::Debug for MaterialCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialCompiler")
            .field("lifecycle", &self.lifecycle)
            .field("jobs", &self.jobs)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Packaging
// ---------------------------------------------------------------------------

/// Whether the depth pass needs the material's own vertex program.
fn has_custom_depth_shader(builder: &MaterialBuilder, source: &MaterialSource) -> bool {
    let state = &builder.state;
    !source.vertex.is_empty()
        || source.has_custom_variables()
        || state.blending == BlendingMode::Masked
        || (state.transparent_shadow
            && matches!(state.blending, BlendingMode::Transparent | BlendingMode::Fade))
}

fn package(
    builder: &MaterialBuilder,
    prepared: &Prepared,
    properties: &PropertySet,
    tables: ShaderTables,
) -> Package {
    profile_scope!("package");

    let mut container = ChunkContainer::new();
    write_common_chunks(&mut container, prepared, properties);
    if prepared.info.domain() == MaterialDomain::Surface {
        write_surface_chunks(&mut container, &prepared.info);
    }
    write_shader_chunks(
        &mut container,
        tables,
        has_custom_depth_shader(builder, &prepared.source),
        builder.generate_debug_info,
    );
    Package::from_container(&container)
}

fn write_common_chunks(container: &mut ChunkContainer, prepared: &Prepared, properties: &PropertySet) {
    let info = &prepared.info;
    let state = &info.state;

    container.add_simple(ChunkType::MaterialVersion, MATERIAL_VERSION);
    container.add_simple(ChunkType::MaterialFeatureLevel, state.feature_level.number());
    container.add_simple(ChunkType::MaterialName, info.name.as_str());
    container.add_simple(ChunkType::MaterialShaderModels, prepared.plan.shader_models.bits());
    container.add_simple(ChunkType::MaterialDomain, state.domain as u8);

    container.add_child(UniformBindingsChunk::new(uniform_block_bindings(MATERIAL_PARAMS)));
    container.add_child(SamplerBindingsChunk::new(info.sampler_bindings.clone()));
    container.add_child(UniformInterfaceBlockChunk::new(info.uniform_block.clone()));
    container.add_child(SamplerInterfaceBlockChunk::new(info.sampler_block.clone()));
    container.add_child(SubpassChunk::new(MATERIAL_PARAMS, info.subpass.clone()));

    container.add_simple(ChunkType::MaterialDoubleSidedSet, state.double_sided_set);
    container.add_simple(ChunkType::MaterialDoubleSided, state.double_sided);
    container.add_simple(ChunkType::MaterialBlendingMode, state.blending as u8);
    container.add_simple(ChunkType::MaterialTransparencyMode, state.transparency as u8);
    container.add_simple(ChunkType::MaterialReflectionMode, state.reflection as u8);
    container.add_simple(ChunkType::MaterialDepthWriteSet, state.depth_write_set);
    container.add_simple(ChunkType::MaterialColorWrite, state.color_write);
    container.add_simple(ChunkType::MaterialDepthWrite, state.effective_depth_write());
    container.add_simple(ChunkType::MaterialDepthTest, state.depth_test);
    container.add_simple(ChunkType::MaterialInstanced, state.instanced);
    container.add_simple(ChunkType::MaterialCullingMode, state.culling as u8);
    container.add_simple(ChunkType::MaterialProperties, properties.to_bits());
}

fn write_surface_chunks(container: &mut ChunkContainer, info: &MaterialInfo) {
    let state = &info.state;

    if state.blending == BlendingMode::Masked {
        container.add_simple(ChunkType::MaterialMaskThreshold, state.mask_threshold);
    }
    container.add_simple(ChunkType::MaterialShading, state.shading as u8);
    if state.shading == Shading::Unlit {
        container.add_simple(ChunkType::MaterialShadowMultiplier, state.shadow_multiplier);
    }
    container.add_simple(ChunkType::MaterialRefraction, state.refraction_mode as u8);
    container.add_simple(ChunkType::MaterialRefractionType, state.refraction_type as u8);
    container.add_simple(ChunkType::MaterialClearCoatIorChange, state.clear_coat_ior_change);
    container.add_simple(ChunkType::MaterialRequiredAttributes, info.required_attributes.bits());
    container.add_simple(ChunkType::MaterialSpecularAntiAliasing, state.specular_anti_aliasing);
    container.add_simple(
        ChunkType::MaterialSpecularAntiAliasingVariance,
        state.specular_anti_aliasing_variance,
    );
    container.add_simple(
        ChunkType::MaterialSpecularAntiAliasingThreshold,
        state.specular_anti_aliasing_threshold,
    );
    container.add_simple(ChunkType::MaterialVertexDomain, state.vertex_domain as u8);
    container.add_simple(ChunkType::MaterialInterpolation, state.interpolation as u8);
}

fn write_shader_chunks(
    container: &mut ChunkContainer,
    tables: ShaderTables,
    has_custom_depth: bool,
    keep_debug_info: bool,
) {
    container.add_simple(ChunkType::MaterialHasCustomDepthShader, has_custom_depth);

    let encoded = tables.encode();
    // the text dictionary precedes the GLSL and Metal tables that index into it
    if !encoded.glsl.is_empty() || !encoded.metal.is_empty() {
        container.add_child(TextDictionaryChunk::new(encoded.text_dictionary));
    }
    if !encoded.glsl.is_empty() {
        container.add_child(ShaderTableChunk::new(ChunkType::MaterialGlsl, encoded.glsl));
    }
    if !encoded.spirv.is_empty() {
        container.add_child(SpirvDictionaryChunk::new(encoded.spirv_dictionary, keep_debug_info));
        container.add_child(ShaderTableChunk::new(ChunkType::MaterialSpirv, encoded.spirv));
    }
    if !encoded.metal.is_empty() {
        container.add_child(ShaderTableChunk::new(ChunkType::MaterialMetal, encoded.metal));
    }
}
