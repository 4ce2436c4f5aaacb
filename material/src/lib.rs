//! # matforge material
//!
//! Compiles one material description into a package holding a program for
//! every shader model, graphics API and feature variant the material targets.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`MaterialBuilder`] - Configuration of a material and its build targets
//! - [`MaterialCompiler`] - The build pipeline producing a [`Package`]
//! - [`permutation`] / [`variant`] - Enumeration of build targets and feature variants
//! - [`orchestrator`] - Parallel, fail-fast compilation of every program
//! - [`dictionary`] - Line and blob deduplication of generated programs
//! - [`chunk`] - The tagged, ordered chunk container and its reader
//! - Pluggable collaborators: [`ShaderSourceProvider`], [`ShaderAnalyzer`], [`BackendCompiler`]
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use matforge_material::{MaterialBuilder, MaterialCompiler, PreprocessorCompiler, Optimization};
//!
//! let compiler = MaterialCompiler::new(Arc::new(PreprocessorCompiler::new()));
//! let _session = compiler.session();
//! let package = compiler.build(
//!     &MaterialBuilder::new()
//!         .with_name("flat")
//!         .with_optimization(Optimization::Preprocessor)
//!         .with_fragment_code("void material(inout MaterialInputs m) { prepareMaterial(m); }", 0),
//! );
//! assert!(package.is_valid());
//! ```

pub mod analysis;
pub mod backend;
pub mod builder;
pub mod chunk;
pub mod compiler;
pub mod dictionary;
pub mod entries;
pub mod error;
pub mod info;
pub mod interface_block;
pub mod orchestrator;
pub mod package;
pub mod parameter;
pub mod permutation;
pub mod property;
pub mod shader;
pub mod spirv;
pub mod types;
pub mod variant;

// Re-export main types for convenience
pub use analysis::{ShaderAnalyzer, StaticAnalyzer};
#[cfg(feature = "naga-backend")]
pub use backend::NagaCompiler;
pub use backend::{
    BackendCompiler, BackendLifecycle, BackendSession, CompileRequest, CompilerOutput,
    PreprocessorCompiler,
};
pub use builder::MaterialBuilder;
pub use compiler::{CompilerSettings, MATERIAL_VERSION, MaterialCompiler};
pub use dictionary::{BlobDictionary, LineDictionary};
pub use error::{AnalysisError, BuildError, ChunkReadError, CompilationFailure, CompileError, ConfigError};
pub use info::{MaterialInfo, Output, OutputQualifier, OutputTarget, OutputType, RenderState};
pub use package::Package;
pub use parameter::{Parameter, Precision, SamplerFormat, SamplerType, SubpassType, UniformType};
pub use permutation::{Permutation, PermutationPlan, PermutationRequest, plan_permutations};
pub use property::{Property, PropertySet};
pub use shader::{IncludeCallback, MaterialSource, ShaderCode, ShaderGenerator, ShaderRequest, ShaderSourceProvider};
pub use types::{
    Api, BlendingMode, CullingMode, FeatureLevel, Interpolation, MaterialDomain, Optimization,
    Platform, RefractionMode, RefractionType, ReflectionMode, ShaderModel, ShaderModels,
    ShaderQuality, ShaderStage, Shading, TargetApis, TargetLanguage, TransparencyMode,
    UserVariantFilter, Variable, VertexAttributes, VertexDomain,
};
pub use variant::{Variant, VariantKey};

/// Material library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
