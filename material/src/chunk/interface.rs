use super::{Chunk, ChunkType, Flattener};
use crate::interface_block::{
    SamplerBindingMap, SamplerInterfaceBlock, SubpassInfo, UniformBindingPoint,
    UniformInterfaceBlock,
};

/// Uniform block names and binding points, needed by OpenGL backends
/// without `layout(binding = ...)` support.
///
/// Payload: `u8` count, then per block a name and a `u8` binding point.
#[derive(Debug, Clone)]
pub struct UniformBindingsChunk {
    bindings: Vec<(String, UniformBindingPoint)>,
}

impl UniformBindingsChunk {
    pub fn new(bindings: Vec<(String, UniformBindingPoint)>) -> Self {
        Self { bindings }
    }
}

impl Chunk for UniformBindingsChunk {
    fn chunk_type(&self) -> ChunkType {
        ChunkType::MaterialUniformBindings
    }

    fn flatten(&self, f: &mut Flattener) {
        f.write_u8(self.bindings.len() as u8);
        for (name, point) in &self.bindings {
            f.write_str(name);
            f.write_u8(*point as u8);
        }
    }
}

/// Sampler binding ranges and the binding of every material sampler.
///
/// Payload: `u8` range count, per range `u8` binding point, `u8` first
/// binding, `u8` count; then `u8` sampler count, per sampler a name and a
/// `u8` binding.
#[derive(Debug, Clone)]
pub struct SamplerBindingsChunk {
    map: SamplerBindingMap,
}

impl SamplerBindingsChunk {
    pub fn new(map: SamplerBindingMap) -> Self {
        Self { map }
    }
}

impl Chunk for SamplerBindingsChunk {
    fn chunk_type(&self) -> ChunkType {
        ChunkType::MaterialSamplerBindings
    }

    fn flatten(&self, f: &mut Flattener) {
        f.write_u8(self.map.ranges().len() as u8);
        for range in self.map.ranges() {
            f.write_u8(range.point as u8);
            f.write_u8(range.first_binding);
            f.write_u8(range.count);
        }
        f.write_u8(self.map.material_bindings().len() as u8);
        for (name, binding) in self.map.material_bindings() {
            f.write_str(name);
            f.write_u8(*binding);
        }
    }
}

/// The material uniform block.
///
/// Payload: block name, `u32` size, `u64` field count, then per field name,
/// `u32` array size, `u32` offset, `u8` type and `u8` precision.
#[derive(Debug, Clone)]
pub struct UniformInterfaceBlockChunk {
    block: UniformInterfaceBlock,
}

impl UniformInterfaceBlockChunk {
    pub fn new(block: UniformInterfaceBlock) -> Self {
        Self { block }
    }
}

impl Chunk for UniformInterfaceBlockChunk {
    fn chunk_type(&self) -> ChunkType {
        ChunkType::MaterialUniformInterfaceBlock
    }

    fn flatten(&self, f: &mut Flattener) {
        f.write_str(self.block.name());
        f.write_u32(self.block.size());
        f.write_u64(self.block.fields().len() as u64);
        for field in self.block.fields() {
            f.write_str(&field.name);
            f.write_u32(field.array_size);
            f.write_u32(field.offset);
            f.write_u8(field.ty as u8);
            f.write_u8(field.precision as u8);
        }
    }
}

/// The material sampler block.
///
/// Payload: block name, `u8` stage flags, `u64` sampler count, then per
/// sampler name, `u8` type, `u8` format, `u8` precision and `u8` offset.
#[derive(Debug, Clone)]
pub struct SamplerInterfaceBlockChunk {
    block: SamplerInterfaceBlock,
}

impl SamplerInterfaceBlockChunk {
    pub fn new(block: SamplerInterfaceBlock) -> Self {
        Self { block }
    }
}

impl Chunk for SamplerInterfaceBlockChunk {
    fn chunk_type(&self) -> ChunkType {
        ChunkType::MaterialSamplerInterfaceBlock
    }

    fn flatten(&self, f: &mut Flattener) {
        f.write_str(self.block.name());
        f.write_u8(self.block.stage_flags().bits());
        f.write_u64(self.block.len() as u64);
        for sampler in self.block.samplers() {
            f.write_str(&sampler.name);
            f.write_u8(sampler.ty as u8);
            f.write_u8(sampler.format as u8);
            f.write_u8(sampler.precision as u8);
            f.write_u8(sampler.offset);
        }
    }
}

/// The optional subpass input.
///
/// Payload: block name, `u64` count (0 or 1), then name, `u8` type, `u8`
/// format, `u8` precision, `u8` attachment index and `u8` binding.
#[derive(Debug, Clone)]
pub struct SubpassChunk {
    block: String,
    subpass: Option<SubpassInfo>,
}

impl SubpassChunk {
    pub fn new(block: impl Into<String>, subpass: Option<SubpassInfo>) -> Self {
        Self {
            block: block.into(),
            subpass,
        }
    }
}

impl Chunk for SubpassChunk {
    fn chunk_type(&self) -> ChunkType {
        ChunkType::MaterialSubpass
    }

    fn flatten(&self, f: &mut Flattener) {
        f.write_str(&self.block);
        match &self.subpass {
            Some(subpass) => {
                f.write_u64(1);
                f.write_str(&subpass.name);
                f.write_u8(subpass.ty as u8);
                f.write_u8(subpass.format as u8);
                f.write_u8(subpass.precision as u8);
                f.write_u8(subpass.attachment_index);
                f.write_u8(subpass.binding);
            }
            None => f.write_u64(0),
        }
    }
}
