//! # matforge core
//!
//! Runtime utilities shared by the matforge material compiler: the job system
//! and cancellation token used to compile shader permutations in parallel,
//! captured diagnostics, and optional Tracy profiling.

pub mod compute;
pub mod diagnostics;
pub mod profiling;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
