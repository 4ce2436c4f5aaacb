//! Build-target enumeration.

use crate::types::{Api, Optimization, Platform, ShaderModel, ShaderModels, TargetApis, TargetLanguage};

/// One build target: a shader model, a single API and the language used to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permutation {
    pub shader_model: ShaderModel,
    pub api: Api,
    pub language: TargetLanguage,
}

impl Permutation {
    pub fn new(shader_model: ShaderModel, api: Api, language: TargetLanguage) -> Self {
        Self {
            shader_model,
            api,
            language,
        }
    }
}

impl std::fmt::Display for Permutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}/{}/{:?}",
            self.shader_model,
            self.api.name(),
            self.language
        )
    }
}

/// Inputs of [`plan_permutations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermutationRequest {
    pub platform: Platform,
    pub target_apis: TargetApis,
    pub optimization: Optimization,
    /// Framebuffer fetch requires Vulkan semantics even when targeting OpenGL.
    pub vulkan_semantics: bool,
}

/// Result of enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermutationPlan {
    pub permutations: Vec<Permutation>,
    pub shader_models: ShaderModels,
    /// Optimization after Vulkan semantics were applied.
    pub optimization: Optimization,
    /// Target used for semantic analysis and property discovery.
    pub semantic: Permutation,
}

/// Derives the ordered list of build targets.
///
/// For each selected shader model (mobile first), one permutation per requested
/// API is emitted in the order OpenGL, Vulkan, Metal. OpenGL goes through
/// SPIR-V whenever optimizing beyond the preprocessor; Vulkan semantics force
/// full optimization and SPIR-V.
pub fn plan_permutations(request: &PermutationRequest) -> PermutationPlan {
    let shader_models = request.platform.shader_models();

    let mut optimization = request.optimization;
    let mut gl_language = if optimization > Optimization::Preprocessor {
        TargetLanguage::Spirv
    } else {
        TargetLanguage::Glsl
    };
    if request.vulkan_semantics {
        optimization = Optimization::Performance;
        gl_language = TargetLanguage::Spirv;
    }

    let target_apis = if request.target_apis.is_empty() {
        TargetApis::OPENGL
    } else {
        request.target_apis
    };

    let mut permutations = Vec::new();
    for model in shader_models.models() {
        for (api, language) in [
            (Api::OpenGl, gl_language),
            (Api::Vulkan, TargetLanguage::Spirv),
            (Api::Metal, TargetLanguage::Spirv),
        ] {
            if target_apis.contains(api.flag()) {
                permutations.push(Permutation::new(model, api, language));
            }
        }
    }

    let semantic = if request.vulkan_semantics {
        Permutation::new(ShaderModel::Mobile, Api::Vulkan, TargetLanguage::Spirv)
    } else {
        Permutation::new(ShaderModel::Mobile, Api::OpenGl, TargetLanguage::Glsl)
    };

    PermutationPlan {
        permutations,
        shader_models,
        optimization,
        semantic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn request(platform: Platform, apis: TargetApis, optimization: Optimization) -> PermutationRequest {
        PermutationRequest {
            platform,
            target_apis: apis,
            optimization,
            vulkan_semantics: false,
        }
    }

    #[rstest]
    #[case::mobile(Platform::Mobile, 1)]
    #[case::desktop(Platform::Desktop, 1)]
    #[case::all(Platform::All, 2)]
    fn one_permutation_per_model(#[case] platform: Platform, #[case] expected: usize) {
        let plan = plan_permutations(&request(platform, TargetApis::OPENGL, Optimization::None));
        assert_eq!(plan.permutations.len(), expected);
    }

    #[rstest]
    #[case::none(Optimization::None, TargetLanguage::Glsl)]
    #[case::preprocessor(Optimization::Preprocessor, TargetLanguage::Glsl)]
    #[case::size(Optimization::Size, TargetLanguage::Spirv)]
    #[case::performance(Optimization::Performance, TargetLanguage::Spirv)]
    fn opengl_language_follows_optimization(
        #[case] optimization: Optimization,
        #[case] language: TargetLanguage,
    ) {
        let plan = plan_permutations(&request(Platform::Mobile, TargetApis::OPENGL, optimization));
        assert_eq!(plan.permutations[0].language, language);
    }

    #[test]
    fn empty_api_request_defaults_to_opengl() {
        let plan = plan_permutations(&request(Platform::All, TargetApis::empty(), Optimization::None));
        assert!(plan.permutations.iter().all(|p| p.api == Api::OpenGl));
        assert_eq!(plan.permutations.len(), 2);
    }

    #[test]
    fn apis_ordered_per_model() {
        let plan = plan_permutations(&request(Platform::All, TargetApis::all(), Optimization::None));
        let targets: Vec<_> = plan
            .permutations
            .iter()
            .map(|p| (p.shader_model, p.api, p.language))
            .collect();
        assert_eq!(
            targets,
            vec![
                (ShaderModel::Mobile, Api::OpenGl, TargetLanguage::Glsl),
                (ShaderModel::Mobile, Api::Vulkan, TargetLanguage::Spirv),
                (ShaderModel::Mobile, Api::Metal, TargetLanguage::Spirv),
                (ShaderModel::Desktop, Api::OpenGl, TargetLanguage::Glsl),
                (ShaderModel::Desktop, Api::Vulkan, TargetLanguage::Spirv),
                (ShaderModel::Desktop, Api::Metal, TargetLanguage::Spirv),
            ]
        );
        assert_eq!(plan.shader_models, ShaderModels::all());
    }

    #[test]
    fn vulkan_semantics_force_spirv_and_performance() {
        let mut req = request(Platform::All, TargetApis::OPENGL, Optimization::None);
        req.vulkan_semantics = true;
        let plan = plan_permutations(&req);
        assert_eq!(plan.optimization, Optimization::Performance);
        assert!(plan.permutations.iter().all(|p| p.language == TargetLanguage::Spirv));
        assert_eq!(plan.semantic.api, Api::Vulkan);
    }

    #[test]
    fn vulkan_is_always_spirv() {
        let plan = plan_permutations(&request(Platform::All, TargetApis::VULKAN, Optimization::None));
        assert!(plan.permutations.iter().all(|p| p.language == TargetLanguage::Spirv));
    }
}
