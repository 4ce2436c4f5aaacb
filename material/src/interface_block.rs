//! Uniform and sampler interface blocks derived from material parameters.

use crate::parameter::{Precision, SamplerFormat, SamplerType, SubpassType, UniformType};
use crate::types::{MaterialDomain, ShaderStageFlags};

/// Name shared by the per-material uniform block, sampler block and subpass.
pub const MATERIAL_PARAMS: &str = "MaterialParams";

// ---------------------------------------------------------------------------
// Uniform block
// ---------------------------------------------------------------------------

/// A member of a [`UniformInterfaceBlock`].
#[derive(Debug, Clone, PartialEq)]
pub struct UniformField {
    pub name: String,
    /// Zero for non-array members.
    pub array_size: u32,
    pub ty: UniformType,
    pub precision: Precision,
    /// std140 byte offset inside the block.
    pub offset: u32,
}

/// A std140 uniform block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UniformInterfaceBlock {
    name: String,
    fields: Vec<UniformField>,
    size: u32,
}

impl UniformInterfaceBlock {
    pub fn builder(name: impl Into<String>) -> UniformBlockBuilder {
        UniformBlockBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Total std140 size in bytes, rounded to 16.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Accumulates uniform members and lays them out on [`UniformBlockBuilder::build`].
#[derive(Debug, Clone)]
pub struct UniformBlockBuilder {
    name: String,
    fields: Vec<(String, u32, UniformType, Precision)>,
}

impl UniformBlockBuilder {
    pub fn add(
        mut self,
        name: impl Into<String>,
        array_size: u32,
        ty: UniformType,
        precision: Precision,
    ) -> Self {
        self.fields.push((name.into(), array_size, ty, precision));
        self
    }

    pub fn build(self) -> UniformInterfaceBlock {
        let mut offset = 0u32;
        let mut fields = Vec::with_capacity(self.fields.len());
        for (name, array_size, ty, precision) in self.fields {
            let (alignment, size) = if array_size > 0 {
                // array elements are rounded up to vec4 stride
                let stride = ty.std140_size().next_multiple_of(16);
                (16, stride * array_size)
            } else {
                (ty.std140_alignment(), ty.std140_size())
            };
            offset = offset.next_multiple_of(alignment);
            fields.push(UniformField {
                name,
                array_size,
                ty,
                precision,
                offset,
            });
            offset += size;
        }
        UniformInterfaceBlock {
            name: self.name,
            fields,
            size: offset.next_multiple_of(16),
        }
    }
}

// ---------------------------------------------------------------------------
// Sampler block
// ---------------------------------------------------------------------------

/// A sampler of a [`SamplerInterfaceBlock`].
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerInfo {
    pub name: String,
    pub ty: SamplerType,
    pub format: SamplerFormat,
    pub precision: Precision,
    /// Index within the block.
    pub offset: u8,
}

/// An ordered list of samplers visible to a set of stages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SamplerInterfaceBlock {
    name: String,
    stage_flags: ShaderStageFlags,
    samplers: Vec<SamplerInfo>,
}

impl SamplerInterfaceBlock {
    pub fn new(name: impl Into<String>, stage_flags: ShaderStageFlags) -> Self {
        Self {
            name: name.into(),
            stage_flags,
            samplers: Vec::new(),
        }
    }

    pub fn with_sampler(
        mut self,
        name: impl Into<String>,
        ty: SamplerType,
        format: SamplerFormat,
        precision: Precision,
    ) -> Self {
        let offset = self.samplers.len() as u8;
        self.samplers.push(SamplerInfo {
            name: name.into(),
            ty,
            format,
            precision,
            offset,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage_flags(&self) -> ShaderStageFlags {
        self.stage_flags
    }

    pub fn samplers(&self) -> &[SamplerInfo] {
        &self.samplers
    }

    pub fn len(&self) -> usize {
        self.samplers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Subpass
// ---------------------------------------------------------------------------

/// The optional subpass input of a material.
#[derive(Debug, Clone, PartialEq)]
pub struct SubpassInfo {
    pub block: String,
    pub name: String,
    pub ty: SubpassType,
    pub format: SamplerFormat,
    pub precision: Precision,
    pub attachment_index: u8,
    pub binding: u8,
}

// ---------------------------------------------------------------------------
// Binding points
// ---------------------------------------------------------------------------

/// Uniform buffer binding points used by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UniformBindingPoint {
    PerView = 0,
    PerRenderable = 1,
    Lights = 2,
    Shadows = 3,
    FroxelRecords = 4,
    PerRenderableBones = 5,
    PerRenderableMorphing = 6,
    PerMaterialInstance = 7,
}

/// Engine uniform blocks and their binding points, material block last.
pub fn uniform_block_bindings(material_block: &str) -> Vec<(String, UniformBindingPoint)> {
    [
        ("FrameUniforms", UniformBindingPoint::PerView),
        ("ObjectUniforms", UniformBindingPoint::PerRenderable),
        ("LightsUniforms", UniformBindingPoint::Lights),
        ("ShadowUniforms", UniformBindingPoint::Shadows),
        ("FroxelRecordUniforms", UniformBindingPoint::FroxelRecords),
        ("BonesUniforms", UniformBindingPoint::PerRenderableBones),
        ("MorphingUniforms", UniformBindingPoint::PerRenderableMorphing),
    ]
    .into_iter()
    .map(|(name, point)| (name.to_string(), point))
    .chain(std::iter::once((
        material_block.to_string(),
        UniformBindingPoint::PerMaterialInstance,
    )))
    .collect()
}

/// Sampler binding points used by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SamplerBindingPoint {
    PerView = 0,
    PerRenderableMorphing = 1,
    PerMaterialInstance = 2,
}

/// A contiguous range of sampler bindings owned by one binding point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerBlockRange {
    pub point: SamplerBindingPoint,
    pub first_binding: u8,
    pub count: u8,
}

/// Global sampler binding assignment for a material.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SamplerBindingMap {
    ranges: Vec<SamplerBlockRange>,
    /// `(sampler name, binding)` for every material sampler.
    material_bindings: Vec<(String, u8)>,
}

impl SamplerBindingMap {
    /// Samplers reserved by the engine's per-view block for surface materials.
    pub const PER_VIEW_SAMPLERS: u8 = 9;
    /// Samplers reserved for morph targets on surface materials.
    pub const MORPHING_SAMPLERS: u8 = 2;

    /// Assigns bindings, reserving the engine blocks first.
    pub fn new(domain: MaterialDomain, material: &SamplerInterfaceBlock) -> Self {
        let mut ranges = Vec::new();
        let mut next = 0u8;
        if domain == MaterialDomain::Surface {
            for (point, count) in [
                (SamplerBindingPoint::PerView, Self::PER_VIEW_SAMPLERS),
                (
                    SamplerBindingPoint::PerRenderableMorphing,
                    Self::MORPHING_SAMPLERS,
                ),
            ] {
                ranges.push(SamplerBlockRange {
                    point,
                    first_binding: next,
                    count,
                });
                next += count;
            }
        }

        let material_first = next;
        ranges.push(SamplerBlockRange {
            point: SamplerBindingPoint::PerMaterialInstance,
            first_binding: material_first,
            count: material.len() as u8,
        });
        let material_bindings = material
            .samplers()
            .iter()
            .map(|s| (s.name.clone(), material_first + s.offset))
            .collect();

        Self {
            ranges,
            material_bindings,
        }
    }

    pub fn ranges(&self) -> &[SamplerBlockRange] {
        &self.ranges
    }

    pub fn material_bindings(&self) -> &[(String, u8)] {
        &self.material_bindings
    }

    /// Binding of the named material sampler.
    pub fn binding_of(&self, name: &str) -> Option<u8> {
        self.material_bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| *b)
    }
}
