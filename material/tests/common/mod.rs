//! Shared fixtures for the material build integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use matforge_material::chunk::ChunkType;
use matforge_material::chunk::TableRecord;
use matforge_material::chunk::reader::{read_shader_table, read_spirv_dictionary, read_text_dictionary};
use matforge_material::error::CompileError;
use matforge_material::spirv::MAGIC;
use matforge_material::{
    BackendCompiler, CompileRequest, CompilerOutput, MaterialBuilder, MaterialCompiler, Optimization,
    Package, PreprocessorCompiler, ShaderGenerator, ShaderRequest, ShaderSourceProvider, ShaderStage,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A material whose fragment code writes the base color from a parameter.
pub fn tinted() -> MaterialBuilder {
    MaterialBuilder::new()
        .with_name("tinted")
        .with_optimization(Optimization::Preprocessor)
        .with_uniform("tint", matforge_material::UniformType::Float)
        .expect("tint is a valid parameter")
        .with_fragment_code(
            "void material(inout MaterialInputs material) {\n\
             \x20   prepareMaterial(material);\n\
             \x20   material.baseColor.rgb = vec3(materialParams.tint);\n\
             }\n",
            4,
        )
}

pub fn glsl_compiler() -> MaterialCompiler {
    MaterialCompiler::new(Arc::new(PreprocessorCompiler::new()))
}

// ============================================================================
// Providers
// ============================================================================

/// Wraps the default generator and sleeps so tasks finish out of order.
///
/// `seed` changes which variants are slow.
pub struct JitterProvider {
    inner: ShaderGenerator,
    seed: u64,
}

impl JitterProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ShaderGenerator::new(),
            seed,
        }
    }
}

impl ShaderSourceProvider for JitterProvider {
    fn generate(&self, request: &ShaderRequest<'_>) -> String {
        let bits = u64::from(request.variant.bits());
        let delay = (bits.wrapping_mul(7) ^ self.seed) % 4;
        std::thread::sleep(Duration::from_millis(delay));
        self.inner.generate(request)
    }

    fn fixup_external_samplers(&self, shader: &mut String, request: &ShaderRequest<'_>) {
        self.inner.fixup_external_samplers(shader, request);
    }
}

// ============================================================================
// Backends
// ============================================================================

const OP_SOURCE: u32 = 3;
const OP_NAME: u32 = 5;
const OP_CAPABILITY: u32 = 17;

fn instruction(opcode: u32, operands: &[u32]) -> Vec<u32> {
    let mut words = vec![((operands.len() as u32 + 1) << 16) | opcode];
    words.extend_from_slice(operands);
    words
}

/// Emits a tiny module per stage: a header, debug instructions and a
/// capability. Every program of a stage compiles to the same module.
#[derive(Default)]
pub struct FakeSpirvCompiler {
    pub calls: AtomicUsize,
}

impl FakeSpirvCompiler {
    pub fn module(stage: ShaderStage) -> Vec<u32> {
        let mut words = vec![MAGIC, 0x0001_0000, 0, 16, 0];
        words.extend(instruction(OP_SOURCE, &[2, 450]));
        words.extend(instruction(OP_NAME, &[1, u32::from_le_bytes(*b"main"), 0]));
        words.extend(instruction(OP_CAPABILITY, &[1 + stage as u32]));
        words
    }
}

impl BackendCompiler for FakeSpirvCompiler {
    fn process(
        &self,
        _shader: &mut String,
        request: &CompileRequest,
    ) -> Result<CompilerOutput, CompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !request.needs_spirv() {
            return Ok(CompilerOutput::default());
        }
        Ok(CompilerOutput {
            spirv: Some(Self::module(request.stage)),
            msl: request
                .needs_msl()
                .then(|| format!("// {} stage\nkernel void main0() {{}}\n", request.stage.name())),
        })
    }
}

/// Rejects every program.
#[derive(Default)]
pub struct FailingCompiler {
    pub calls: AtomicUsize,
}

impl BackendCompiler for FailingCompiler {
    fn process(
        &self,
        _shader: &mut String,
        _request: &CompileRequest,
    ) -> Result<CompilerOutput, CompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CompileError::Parse("0:1: syntax error".into()))
    }
}

// ============================================================================
// Package inspection
// ============================================================================

pub fn table(package: &Package, chunk_type: ChunkType) -> Vec<TableRecord> {
    let payload = package
        .payload(chunk_type)
        .expect("package is readable")
        .unwrap_or_else(|| panic!("missing {chunk_type:?}"));
    read_shader_table(payload).expect("table decodes")
}

pub fn texts(package: &Package) -> Vec<String> {
    let payload = package
        .payload(ChunkType::DictionaryText)
        .expect("package is readable")
        .expect("text dictionary present");
    read_text_dictionary(payload).expect("dictionary decodes")
}

pub fn modules(package: &Package) -> Vec<Vec<u32>> {
    let payload = package
        .payload(ChunkType::DictionarySpirv)
        .expect("package is readable")
        .expect("SPIR-V dictionary present");
    read_spirv_dictionary(payload).expect("dictionary decodes")
}

pub fn has_chunk(package: &Package, chunk_type: ChunkType) -> bool {
    package
        .chunk_types()
        .expect("package is readable")
        .contains(&chunk_type)
}
