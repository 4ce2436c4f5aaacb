//! Shader source generation.
//!
//! - [`ShaderSourceProvider`] - Produces the program text of one `(stage, target, variant)`
//! - [`ShaderGenerator`] - Default provider assembling GLSL from the material description
//! - [`resolve_includes`] - Expands `#include` directives in user code

mod generator;
mod includes;

pub use generator::ShaderGenerator;
pub use includes::{IncludeCallback, resolve_includes};

use crate::info::{MaterialInfo, Output};
use crate::permutation::Permutation;
use crate::property::PropertySet;
use crate::types::{ShaderStage, Variable};
use crate::variant::VariantKey;

/// User code of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderCode {
    pub code: String,
    /// Line of the material file the code starts at.
    pub line_offset: u32,
}

impl ShaderCode {
    pub fn new(code: impl Into<String>, line_offset: u32) -> Self {
        Self {
            code: code.into(),
            line_offset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.code.trim().is_empty()
    }
}

/// User-provided program parts, with includes resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaterialSource {
    pub fragment: ShaderCode,
    pub vertex: ShaderCode,
    /// Names of the custom interpolated variables; empty when unused.
    pub variables: [String; Variable::COUNT],
    pub outputs: Vec<Output>,
    pub defines: Vec<(String, String)>,
}

impl MaterialSource {
    pub fn has_custom_variables(&self) -> bool {
        self.variables.iter().any(|name| !name.is_empty())
    }
}

/// Everything a provider needs to generate one program.
#[derive(Debug, Clone, Copy)]
pub struct ShaderRequest<'a> {
    pub stage: ShaderStage,
    pub permutation: Permutation,
    pub variant: VariantKey,
    pub source: &'a MaterialSource,
    pub info: &'a MaterialInfo,
    pub properties: &'a PropertySet,
}

/// Produces the text of a program.
///
/// Implementations must be deterministic: identical requests yield identical
/// text, otherwise packages are not reproducible.
pub trait ShaderSourceProvider: Send + Sync {
    fn generate(&self, request: &ShaderRequest<'_>) -> String;

    /// Patches GLSL cross-compiled from SPIR-V so external samplers keep
    /// their type. Called only for OpenGL targets built through SPIR-V.
    fn fixup_external_samplers(&self, _shader: &mut String, _request: &ShaderRequest<'_>) {}
}
