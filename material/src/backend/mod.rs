//! Backend compilers turning generated GLSL into target programs.
//!
//! - [`BackendCompiler`] - Rewrites a program and emits SPIR-V and/or MSL
//! - [`BackendLifecycle`] - Reference-counted global initialization of a backend
//! - [`PreprocessorCompiler`] - GLSL pass-through with comment stripping
//! - [`NagaCompiler`] - naga based GLSL to SPIR-V/MSL/GLSL compiler (feature `naga-backend`)

#[cfg(feature = "naga-backend")]
mod naga_compiler;
mod preprocessor;

#[cfg(feature = "naga-backend")]
pub use naga_compiler::NagaCompiler;
pub use preprocessor::{PreprocessorCompiler, strip_comments_and_blank_lines};

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::CompileError;
use crate::permutation::Permutation;
use crate::types::{Api, Optimization, ShaderStage, TargetLanguage};
use crate::variant::VariantKey;

/// Parameters of one backend invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileRequest {
    pub stage: ShaderStage,
    pub permutation: Permutation,
    pub variant: VariantKey,
    pub optimization: Optimization,
    pub generate_debug_info: bool,
}

impl CompileRequest {
    /// Whether the program goes through SPIR-V.
    pub fn needs_spirv(&self) -> bool {
        self.permutation.language == TargetLanguage::Spirv
    }

    /// Whether MSL must be produced.
    pub fn needs_msl(&self) -> bool {
        self.permutation.api == Api::Metal
    }
}

/// Secondary outputs of a backend invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompilerOutput {
    pub spirv: Option<Vec<u32>>,
    pub msl: Option<String>,
}

/// Compiles one generated program.
///
/// `process` may rewrite the GLSL text in place (optimization, cross
/// compilation back to GLSL). Implementations are called concurrently and
/// must only touch the buffers they are given.
pub trait BackendCompiler: Send + Sync {
    /// One-time global setup, run when the first [`BackendSession`] starts.
    fn initialize(&self) {}

    /// Global teardown, run when the last [`BackendSession`] ends.
    fn shutdown(&self) {}

    fn process(
        &self,
        shader: &mut String,
        request: &CompileRequest,
    ) -> Result<CompilerOutput, CompileError>;
}

/// Reference-counted initialization state of a backend.
///
/// Builds are refused while no acquisition is active.
pub struct BackendLifecycle {
    backend: Arc<dyn BackendCompiler>,
    acquisitions: Mutex<usize>,
}

impl BackendLifecycle {
    pub fn new(backend: Arc<dyn BackendCompiler>) -> Self {
        Self {
            backend,
            acquisitions: Mutex::new(0),
        }
    }

    /// Adds an acquisition, initializing the backend on the first one.
    pub fn acquire(&self) {
        let mut count = self.acquisitions.lock();
        if *count == 0 {
            log::debug!("initializing shader backend");
            self.backend.initialize();
        }
        *count += 1;
    }

    /// Drops an acquisition, shutting the backend down on the last one.
    pub fn release(&self) {
        let mut count = self.acquisitions.lock();
        match *count {
            0 => log::warn!("backend released more often than acquired"),
            1 => {
                *count = 0;
                log::debug!("shutting down shader backend");
                self.backend.shutdown();
            }
            _ => *count -= 1,
        }
    }

    pub fn is_active(&self) -> bool {
        *self.acquisitions.lock() > 0
    }

    /// Acquires the backend for the lifetime of the returned guard.
    pub fn session(self: &Arc<Self>) -> BackendSession {
        self.acquire();
        BackendSession {
            lifecycle: Arc::clone(self),
        }
    }
}

impl std::fmt::Debug for BackendLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendLifecycle")
            .field("acquisitions", &*self.acquisitions.lock())
            .finish_non_exhaustive()
    }
}

/// RAII acquisition of a [`BackendLifecycle`].
#[derive(Debug)]
pub struct BackendSession {
    lifecycle: Arc<BackendLifecycle>,
}

impl Drop for BackendSession {
    fn drop(&mut self) {
        self.lifecycle.release();
    }
}
