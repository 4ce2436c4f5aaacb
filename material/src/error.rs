//! Error types of the material compiler.

use thiserror::Error;

use matforge_core::compute::Cancelled;

use crate::types::{Api, FeatureLevel, ShaderStage};
use crate::variant::VariantKey;

/// A configuration precondition was violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("too many parameters: at most {max} are allowed")]
    TooManyParameters { max: usize },
    #[error("too many subpasses: at most {max} is allowed")]
    TooManySubpasses { max: usize },
    #[error("subpass \"{0}\" must use the FLOAT format")]
    SubpassFormat(String),
    #[error("depth output \"{0}\" must be of type FLOAT")]
    DepthOutputType(String),
    #[error("depth output \"{0}\" must use the OUT qualifier")]
    DepthOutputQualifier(String),
    #[error("too many color outputs: at most {max} are allowed")]
    TooManyColorOutputs { max: usize },
    #[error("too many depth outputs: at most {max} is allowed")]
    TooManyDepthOutputs { max: usize },
    #[error("custom variable index {0} is out of range")]
    VariableIndex(usize),
    #[error("parameter \"{0}\" is declared twice")]
    DuplicateParameter(String),
    #[error("output \"{0}\" has no location left after u32::MAX")]
    OutputLocation(String),
}

/// A backend compiler rejected or could not produce a program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("code generation error: {0}")]
    Codegen(String),
    #[error("unsupported request: {0}")]
    Unsupported(String),
    #[error("compiler produced no {0} output")]
    MissingOutput(&'static str),
}

/// The static analyzer rejected a program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} shader: {message}", .stage.name())]
pub struct AnalysisError {
    pub stage: ShaderStage,
    pub message: String,
}

impl AnalysisError {
    pub fn new(stage: ShaderStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Context of the first failed compilation task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "material \"{material}\" failed to compile (variant 0x{:02x}, {}, {} stage): {source}",
    .variant.bits(),
    .api.name(),
    .stage.name()
)]
pub struct CompilationFailure {
    pub material: String,
    pub variant: VariantKey,
    pub api: Api,
    pub stage: ShaderStage,
    #[source]
    pub source: CompileError,
}

/// Reasons a build ends in the failed state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("the backend compiler was not initialized; acquire a backend session before building")]
    NotInitialized,
    #[error("could not resolve include \"{include}\" from \"{file}\"")]
    IncludeResolution { include: String, file: String },
    #[error("incompatible shading configuration: {0}")]
    IncompatibleShading(String),
    #[error("material \"{material}\" exceeds feature level {}: {reason}", .level.number())]
    FeatureLevel {
        material: String,
        level: FeatureLevel,
        reason: String,
    },
    #[error("property discovery failed: {0}")]
    PropertyDiscovery(#[source] AnalysisError),
    #[error("semantic analysis failed: {0}")]
    SemanticAnalysis(#[source] AnalysisError),
    #[error(transparent)]
    Compilation(Box<CompilationFailure>),
    #[error("build was cancelled")]
    Cancelled(#[from] Cancelled),
    #[error("no permutation to build")]
    NoPermutations,
}

/// A package could not be read back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkReadError {
    #[error("truncated package: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },
    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 { offset: usize },
}
