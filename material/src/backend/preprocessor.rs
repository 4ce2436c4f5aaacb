use super::{BackendCompiler, CompileRequest, CompilerOutput};
use crate::error::CompileError;
use crate::types::Optimization;

/// Keeps GLSL as GLSL.
///
/// With [`Optimization::None`] the text is untouched; any other level strips
/// comments and blank lines. Requests that need SPIR-V or MSL are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreprocessorCompiler;

impl PreprocessorCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl BackendCompiler for PreprocessorCompiler {
    fn process(
        &self,
        shader: &mut String,
        request: &CompileRequest,
    ) -> Result<CompilerOutput, CompileError> {
        if request.needs_spirv() || request.needs_msl() {
            return Err(CompileError::Unsupported(format!(
                "{} requires an optimizing backend",
                request.permutation
            )));
        }
        if request.optimization != Optimization::None {
            *shader = strip_comments_and_blank_lines(shader);
        }
        Ok(CompilerOutput::default())
    }
}

/// Removes `//` and `/* */` comments and empty lines.
///
/// Preprocessor directives and string-free GLSL are assumed; comment markers
/// inside `#define` values are stripped like any other.
pub fn strip_comments_and_blank_lines(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut in_block = false;
    for line in source.lines() {
        let mut kept = String::with_capacity(line.len());
        let mut rest = line;
        loop {
            if in_block {
                match rest.find("*/") {
                    Some(end) => {
                        rest = &rest[end + 2..];
                        in_block = false;
                    }
                    None => break,
                }
            } else {
                let line_comment = rest.find("//");
                let block_comment = rest.find("/*");
                match (line_comment, block_comment) {
                    (Some(l), Some(b)) if b < l => {
                        kept.push_str(&rest[..b]);
                        rest = &rest[b + 2..];
                        in_block = true;
                    }
                    (None, Some(b)) => {
                        kept.push_str(&rest[..b]);
                        rest = &rest[b + 2..];
                        in_block = true;
                    }
                    (Some(l), _) => {
                        kept.push_str(&rest[..l]);
                        break;
                    }
                    (None, None) => {
                        kept.push_str(rest);
                        break;
                    }
                }
            }
        }
        let kept = kept.trim_end();
        if !kept.trim().is_empty() {
            out.push_str(kept);
            out.push('\n');
        }
    }
    out
}
