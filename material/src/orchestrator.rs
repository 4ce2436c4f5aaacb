//! Parallel compilation of every `(permutation, variant)` program.
//!
//! One job scope is opened per permutation and acts as its join point. The
//! first program of the whole build runs on the calling thread before anything
//! else is dispatched. Results are appended to shared tables under a single
//! lock; the first failure cancels every task that has not started compiling
//! yet.

use matforge_core::compute::{CancellationToken, JobSystem};
use matforge_core::diagnostics::DiagnosticBuffer;
use matforge_core::profiling::profile_scope;
use parking_lot::Mutex;

use crate::backend::{BackendCompiler, CompileRequest, CompilerOutput};
use crate::entries::{ShaderTables, SpirvEntry, TextEntry};
use crate::error::{BuildError, CompilationFailure, CompileError};
use crate::info::MaterialInfo;
use crate::permutation::Permutation;
use crate::property::PropertySet;
use crate::shader::{MaterialSource, ShaderRequest, ShaderSourceProvider};
use crate::types::{Api, Optimization, TargetLanguage};
use crate::variant::Variant;

/// Diagnostic target of compilation failures.
pub const DIAGNOSTIC_TARGET: &str = "matforge::compile";

/// Per-build inputs shared by every task.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub name: &'a str,
    pub source: &'a MaterialSource,
    pub info: &'a MaterialInfo,
    pub properties: &'a PropertySet,
    pub optimization: Optimization,
    pub generate_debug_info: bool,
    pub print_shaders: bool,
}

/// Schedules generation and compilation tasks on a [`JobSystem`].
pub struct Orchestrator<'a> {
    pub jobs: &'a JobSystem,
    pub provider: &'a dyn ShaderSourceProvider,
    pub backend: &'a dyn BackendCompiler,
    pub diagnostics: &'a DiagnosticBuffer,
}

/// State every task reads or appends to.
struct SharedState {
    token: CancellationToken,
    tables: Mutex<ShaderTables>,
    failure: Mutex<Option<CompilationFailure>>,
}

enum Collected {
    Glsl(TextEntry),
    Spirv(SpirvEntry),
    Metal(TextEntry),
}

impl<'a> Orchestrator<'a> {
    /// Compiles every variant of every permutation.
    ///
    /// Returns the tables sorted by `(shader model, variant, stage)`, or the
    /// first compilation failure.
    pub fn generate_shaders(
        &self,
        permutations: &[Permutation],
        variants: &[Variant],
        ctx: &BuildContext<'_>,
    ) -> Result<ShaderTables, BuildError> {
        profile_scope!("generate_shaders");

        let shared = SharedState {
            token: CancellationToken::new(),
            tables: Mutex::new(ShaderTables::default()),
            failure: Mutex::new(None),
        };
        let mut first = true;

        for &permutation in permutations {
            if shared.token.is_cancelled() {
                log::debug!("skipping {permutation} after a failed task");
                break;
            }
            log::debug!(
                "compiling {} programs of \"{}\" for {permutation}",
                variants.len(),
                ctx.name
            );

            let shared = &shared;
            self.jobs.scope(|s| {
                for &variant in variants {
                    let task = move || self.run_task(permutation, variant, ctx, shared);
                    if first {
                        first = false;
                        s.run_and_wait(task);
                    } else {
                        s.spawn(task);
                    }
                }
            });
        }

        if let Some(failure) = shared.failure.into_inner() {
            return Err(BuildError::Compilation(Box::new(failure)));
        }
        shared.token.check()?;

        let mut tables = shared.tables.into_inner();
        tables.sort();
        Ok(tables)
    }

    fn run_task(
        &self,
        permutation: Permutation,
        variant: Variant,
        ctx: &BuildContext<'_>,
        shared: &SharedState,
    ) {
        if shared.token.is_cancelled() {
            return;
        }

        let request = ShaderRequest {
            stage: variant.stage,
            permutation,
            variant: variant.key,
            source: ctx.source,
            info: ctx.info,
            properties: ctx.properties,
        };
        let mut shader = self.provider.generate(&request);
        if ctx.print_shaders {
            log::info!(
                "\"{}\" {permutation} variant 0x{:02x} {} shader:\n{shader}",
                ctx.name,
                variant.key.bits(),
                variant.stage.name()
            );
        }

        let compile = CompileRequest {
            stage: variant.stage,
            permutation,
            variant: variant.key,
            optimization: ctx.optimization,
            generate_debug_info: ctx.generate_debug_info,
        };
        let result = self
            .backend
            .process(&mut shader, &compile)
            .and_then(|output| self.collect(&request, &mut shader, output));

        match result {
            Ok(collected) => {
                let mut tables = shared.tables.lock();
                match collected {
                    Collected::Glsl(entry) => tables.glsl.push(entry),
                    Collected::Spirv(entry) => tables.spirv.push(entry),
                    Collected::Metal(entry) => tables.metal.push(entry),
                }
            }
            Err(source) => {
                self.diagnostics.error(
                    DIAGNOSTIC_TARGET,
                    format!(
                        "error in \"{}\", variant 0x{:02x}, {}, {} stage: {source}\n{shader}",
                        ctx.name,
                        variant.key.bits(),
                        permutation.api.name(),
                        variant.stage.name()
                    ),
                );
                let mut failure = shared.failure.lock();
                if failure.is_none() {
                    *failure = Some(CompilationFailure {
                        material: ctx.name.to_string(),
                        variant: variant.key,
                        api: permutation.api,
                        stage: variant.stage,
                        source,
                    });
                }
                shared.token.cancel();
            }
        }
    }

    /// Picks the table a compiled program belongs to.
    fn collect(
        &self,
        request: &ShaderRequest<'_>,
        shader: &mut String,
        output: CompilerOutput,
    ) -> Result<Collected, CompileError> {
        let permutation = request.permutation;
        let model = permutation.shader_model;
        match permutation.api {
            Api::OpenGl => {
                if permutation.language == TargetLanguage::Spirv {
                    self.provider.fixup_external_samplers(shader, request);
                }
                Ok(Collected::Glsl(TextEntry::new(
                    model,
                    request.variant,
                    request.stage,
                    shader.clone(),
                )))
            }
            Api::Vulkan => {
                let words = output.spirv.ok_or(CompileError::MissingOutput("SPIR-V"))?;
                Ok(Collected::Spirv(SpirvEntry::new(
                    model,
                    request.variant,
                    request.stage,
                    words,
                )))
            }
            Api::Metal => {
                let msl = output.msl.ok_or(CompileError::MissingOutput("MSL"))?;
                Ok(Collected::Metal(TextEntry::new(
                    model,
                    request.variant,
                    request.stage,
                    msl,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::info::RenderState;
    use crate::types::{ShaderModel, ShaderStage, VertexAttributes};
    use crate::variant::VariantKey;

    /// Emits a one-line program naming its inputs; later variants sleep less
    /// so tasks finish out of creation order.
    struct EchoProvider;

    impl ShaderSourceProvider for EchoProvider {
        fn generate(&self, request: &ShaderRequest<'_>) -> String {
            let delay = 8u64.saturating_sub(u64::from(request.variant.bits()) % 8);
            std::thread::sleep(Duration::from_millis(delay));
            format!(
                "// {} {} {}\nvoid main() {{}}\n",
                request.permutation,
                request.variant.bits(),
                request.stage.name()
            )
        }
    }

    /// Succeeds with both secondary outputs and counts calls; fails on `fail_on`.
    #[derive(Default)]
    struct ScriptedBackend {
        calls: AtomicUsize,
        fail_on: Option<VariantKey>,
    }

    impl BackendCompiler for ScriptedBackend {
        fn process(
            &self,
            shader: &mut String,
            request: &CompileRequest,
        ) -> Result<CompilerOutput, CompileError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(request.variant) {
                return Err(CompileError::Parse("scripted failure".into()));
            }
            Ok(CompilerOutput {
                spirv: Some(vec![crate::spirv::MAGIC, shader.len() as u32]),
                msl: Some(format!("// msl\n{shader}")),
            })
        }
    }

    fn variants() -> Vec<Variant> {
        (0u8..6)
            .flat_map(|bits| {
                let key = VariantKey::from_bits_retain(bits);
                [
                    Variant::new(key, ShaderStage::Vertex),
                    Variant::new(key, ShaderStage::Fragment),
                ]
            })
            .collect()
    }

    fn run(
        backend: &ScriptedBackend,
        permutations: &[Permutation],
        diagnostics: &DiagnosticBuffer,
    ) -> Result<ShaderTables, BuildError> {
        let jobs = JobSystem::new(4);
        let info = MaterialInfo::new("echo", RenderState::default(), &[], VertexAttributes::empty());
        let source = MaterialSource::default();
        let properties = PropertySet::new();
        let ctx = BuildContext {
            name: "echo",
            source: &source,
            info: &info,
            properties: &properties,
            optimization: Optimization::Performance,
            generate_debug_info: false,
            print_shaders: false,
        };
        Orchestrator {
            jobs: &jobs,
            provider: &EchoProvider,
            backend,
            diagnostics,
        }
        .generate_shaders(permutations, &variants(), &ctx)
    }

    #[test]
    fn tables_are_sorted_after_out_of_order_completion() {
        let backend = ScriptedBackend::default();
        let permutations = [
            Permutation::new(ShaderModel::Mobile, Api::OpenGl, TargetLanguage::Glsl),
            Permutation::new(ShaderModel::Desktop, Api::OpenGl, TargetLanguage::Glsl),
        ];
        let tables = run(&backend, &permutations, &DiagnosticBuffer::default()).unwrap();

        assert_eq!(tables.glsl.len(), 24);
        assert!(tables.spirv.is_empty());
        assert!(tables.metal.is_empty());
        assert!(tables.glsl.windows(2).all(|w| w[0].key() <= w[1].key()));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 24);
    }

    #[test]
    fn apis_route_to_their_tables() {
        let backend = ScriptedBackend::default();
        let permutations = [
            Permutation::new(ShaderModel::Mobile, Api::Vulkan, TargetLanguage::Spirv),
            Permutation::new(ShaderModel::Mobile, Api::Metal, TargetLanguage::Spirv),
        ];
        let tables = run(&backend, &permutations, &DiagnosticBuffer::default()).unwrap();

        assert!(tables.glsl.is_empty());
        assert_eq!(tables.spirv.len(), 12);
        assert_eq!(tables.metal.len(), 12);
        assert!(tables.metal.iter().all(|e| e.text.starts_with("// msl")));
    }

    #[test]
    fn first_failure_cancels_the_build() {
        let backend = ScriptedBackend {
            fail_on: Some(VariantKey::empty()),
            ..Default::default()
        };
        let diagnostics = DiagnosticBuffer::default();
        let permutations = [
            Permutation::new(ShaderModel::Mobile, Api::OpenGl, TargetLanguage::Glsl),
            Permutation::new(ShaderModel::Desktop, Api::OpenGl, TargetLanguage::Glsl),
        ];
        let err = run(&backend, &permutations, &diagnostics).unwrap_err();

        let failure = match err {
            BuildError::Compilation(failure) => failure,
            other => panic!("expected a compilation failure, got {other:?}"),
        };
        assert_eq!(failure.material, "echo");
        assert_eq!(failure.stage, ShaderStage::Vertex);
        // the synchronous first task failed, nothing else reached the backend
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert!(diagnostics.contains("variant 0x00"));
        assert!(diagnostics.contains("void main() {}"));
    }

    #[test]
    fn late_failure_keeps_remaining_permutations_out() {
        let backend = ScriptedBackend {
            fail_on: Some(VariantKey::from_bits_retain(5)),
            ..Default::default()
        };
        let permutations = [
            Permutation::new(ShaderModel::Mobile, Api::OpenGl, TargetLanguage::Glsl),
            Permutation::new(ShaderModel::Desktop, Api::OpenGl, TargetLanguage::Glsl),
        ];
        let err = run(&backend, &permutations, &DiagnosticBuffer::default()).unwrap_err();

        assert!(matches!(err, BuildError::Compilation(_)));
        // the second permutation never starts
        assert!(backend.calls.load(Ordering::SeqCst) <= 12);
    }
}
