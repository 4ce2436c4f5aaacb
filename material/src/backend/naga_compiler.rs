use matforge_core::profiling::profile_scope;

use super::{BackendCompiler, CompileRequest, CompilerOutput, strip_comments_and_blank_lines};
use crate::error::CompileError;
use crate::types::{Api, Optimization, ShaderModel, ShaderStage};

/// Compiles generated GLSL with naga.
///
/// Programs targeting SPIR-V are parsed, validated and written as SPIR-V.
/// Metal targets additionally get MSL; OpenGL targets built through SPIR-V
/// have their text replaced by GLSL written back from the validated module.
/// Plain GLSL targets are only preprocessed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NagaCompiler;

impl NagaCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl BackendCompiler for NagaCompiler {
    fn initialize(&self) {
        log::debug!("naga backend ready");
    }

    fn process(
        &self,
        shader: &mut String,
        request: &CompileRequest,
    ) -> Result<CompilerOutput, CompileError> {
        profile_scope!("naga_process");

        if !request.needs_spirv() {
            if request.optimization != Optimization::None {
                *shader = strip_comments_and_blank_lines(shader);
            }
            return Ok(CompilerOutput::default());
        }

        let stage = naga_stage(request.stage);
        let module = parse(shader, stage)?;
        let info = validate(&module)?;
        let spirv = write_spirv(&module, &info, stage, request.generate_debug_info)?;

        let mut output = CompilerOutput {
            spirv: Some(spirv),
            msl: None,
        };
        match request.permutation.api {
            Api::Metal => output.msl = Some(write_msl(&module, &info)?),
            Api::OpenGl => {
                *shader = write_glsl(&module, &info, stage, request.permutation.shader_model)?;
            }
            Api::Vulkan => {}
        }
        Ok(output)
    }
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

fn parse(source: &str, stage: naga::ShaderStage) -> Result<naga::Module, CompileError> {
    let options = naga::front::glsl::Options {
        stage,
        defines: naga::FastHashMap::default(),
    };
    let mut frontend = naga::front::glsl::Frontend::default();
    frontend
        .parse(&options, source)
        .map_err(|errors| CompileError::Parse(format!("{errors}")))
}

fn validate(module: &naga::Module) -> Result<naga::valid::ModuleInfo, CompileError> {
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(module)
        .map_err(|e| CompileError::Validation(format!("{e}")))
}

fn write_spirv(
    module: &naga::Module,
    info: &naga::valid::ModuleInfo,
    stage: naga::ShaderStage,
    debug: bool,
) -> Result<Vec<u32>, CompileError> {
    let mut flags = naga::back::spv::WriterFlags::ADJUST_COORDINATE_SPACE
        | naga::back::spv::WriterFlags::LABEL_VARYINGS;
    if debug {
        flags |= naga::back::spv::WriterFlags::DEBUG;
    }
    let options = naga::back::spv::Options {
        lang_version: (1, 3),
        flags,
        ..Default::default()
    };
    let pipeline_options = naga::back::spv::PipelineOptions {
        shader_stage: stage,
        entry_point: "main".to_string(),
    };
    naga::back::spv::write_vec(module, info, &options, Some(&pipeline_options))
        .map_err(|e| CompileError::Codegen(format!("SPIR-V generation error: {e}")))
}

fn write_msl(module: &naga::Module, info: &naga::valid::ModuleInfo) -> Result<String, CompileError> {
    let (msl, _) = naga::back::msl::write_string(
        module,
        info,
        &naga::back::msl::Options::default(),
        &naga::back::msl::PipelineOptions::default(),
    )
    .map_err(|e| CompileError::Codegen(format!("MSL generation error: {e}")))?;
    Ok(msl)
}

fn write_glsl(
    module: &naga::Module,
    info: &naga::valid::ModuleInfo,
    stage: naga::ShaderStage,
    model: ShaderModel,
) -> Result<String, CompileError> {
    let version = match model {
        ShaderModel::Mobile => naga::back::glsl::Version::Embedded {
            version: 300,
            is_webgl: false,
        },
        ShaderModel::Desktop => naga::back::glsl::Version::Desktop(410),
    };
    let options = naga::back::glsl::Options {
        version,
        ..Default::default()
    };
    let pipeline_options = naga::back::glsl::PipelineOptions {
        shader_stage: stage,
        entry_point: "main".to_string(),
        multiview: None,
    };

    let mut glsl = String::new();
    let mut writer = naga::back::glsl::Writer::new(
        &mut glsl,
        module,
        info,
        &options,
        &pipeline_options,
        naga::proc::BoundsCheckPolicies::default(),
    )
    .map_err(|e| CompileError::Codegen(format!("GLSL generation error: {e}")))?;
    writer
        .write()
        .map_err(|e| CompileError::Codegen(format!("GLSL generation error: {e}")))?;
    Ok(glsl)
}
