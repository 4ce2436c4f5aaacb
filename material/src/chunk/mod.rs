//! Chunked package container.
//!
//! A package is an ordered sequence of records:
//!
//! ```text
//! tag: u64 LE | size: u32 LE | payload: [u8; size]
//! ```
//!
//! Tags are eight ASCII characters packed little-endian. Simple chunks carry a
//! single scalar or string; compound chunks serialize a structure through their
//! own [`Chunk::flatten`] routine. Readers must consume records in emission
//! order.
//!
//! Serialization goes through a [`Flattener`], which either writes into a
//! buffer or only counts bytes. The byte count of a chunk is obtained by
//! flattening it once in counting mode, so a chunk's size and its bytes can
//! never disagree.

mod dictionary;
mod interface;
pub mod reader;
mod shader_table;

pub use dictionary::{SpirvDictionaryChunk, TextDictionaryChunk};
pub use interface::{
    SamplerBindingsChunk, SamplerInterfaceBlockChunk, SubpassChunk, UniformBindingsChunk,
    UniformInterfaceBlockChunk,
};
pub use reader::{ChunkIter, ChunkRecord, PayloadReader};
pub use shader_table::{ShaderTableChunk, TableRecord};

/// Packs an eight character tag.
pub const fn tag(code: &[u8; 8]) -> u64 {
    u64::from_le_bytes(*code)
}

/// Identifier of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum ChunkType {
    MaterialVersion = tag(b"MAT_VERS"),
    MaterialFeatureLevel = tag(b"MAT_FEAT"),
    MaterialName = tag(b"MAT_NAME"),
    MaterialShaderModels = tag(b"MAT_SMDL"),
    MaterialDomain = tag(b"MAT_DOMN"),
    MaterialUniformBindings = tag(b"MAT_UBND"),
    MaterialSamplerBindings = tag(b"MAT_SBND"),
    MaterialUniformInterfaceBlock = tag(b"MAT_UIB_"),
    MaterialSamplerInterfaceBlock = tag(b"MAT_SIB_"),
    MaterialSubpass = tag(b"MAT_SUBP"),
    MaterialDoubleSidedSet = tag(b"MAT_DSDS"),
    MaterialDoubleSided = tag(b"MAT_DBSD"),
    MaterialBlendingMode = tag(b"MAT_BLEN"),
    MaterialTransparencyMode = tag(b"MAT_TRMD"),
    MaterialReflectionMode = tag(b"MAT_REFL"),
    MaterialDepthWriteSet = tag(b"MAT_DWST"),
    MaterialColorWrite = tag(b"MAT_CWRT"),
    MaterialDepthWrite = tag(b"MAT_DWRT"),
    MaterialDepthTest = tag(b"MAT_DTST"),
    MaterialInstanced = tag(b"MAT_INST"),
    MaterialCullingMode = tag(b"MAT_CULL"),
    MaterialProperties = tag(b"MAT_PROP"),
    MaterialMaskThreshold = tag(b"MAT_MTHR"),
    MaterialShading = tag(b"MAT_SHAD"),
    MaterialShadowMultiplier = tag(b"MAT_SHML"),
    MaterialRefraction = tag(b"MAT_REFM"),
    MaterialRefractionType = tag(b"MAT_REFT"),
    MaterialClearCoatIorChange = tag(b"MAT_CIOR"),
    MaterialRequiredAttributes = tag(b"MAT_REQA"),
    MaterialSpecularAntiAliasing = tag(b"MAT_SPAA"),
    MaterialSpecularAntiAliasingVariance = tag(b"MAT_SVAR"),
    MaterialSpecularAntiAliasingThreshold = tag(b"MAT_STHR"),
    MaterialVertexDomain = tag(b"MAT_VDOM"),
    MaterialInterpolation = tag(b"MAT_INTR"),
    MaterialHasCustomDepthShader = tag(b"MAT_CSDP"),
    DictionaryText = tag(b"DIC_TEXT"),
    DictionarySpirv = tag(b"DIC_SPRV"),
    MaterialGlsl = tag(b"MAT_GLSL"),
    MaterialSpirv = tag(b"MAT_SPRV"),
    MaterialMetal = tag(b"MAT_METL"),
}

impl ChunkType {
    pub const ALL: [ChunkType; 40] = [
        ChunkType::MaterialVersion,
        ChunkType::MaterialFeatureLevel,
        ChunkType::MaterialName,
        ChunkType::MaterialShaderModels,
        ChunkType::MaterialDomain,
        ChunkType::MaterialUniformBindings,
        ChunkType::MaterialSamplerBindings,
        ChunkType::MaterialUniformInterfaceBlock,
        ChunkType::MaterialSamplerInterfaceBlock,
        ChunkType::MaterialSubpass,
        ChunkType::MaterialDoubleSidedSet,
        ChunkType::MaterialDoubleSided,
        ChunkType::MaterialBlendingMode,
        ChunkType::MaterialTransparencyMode,
        ChunkType::MaterialReflectionMode,
        ChunkType::MaterialDepthWriteSet,
        ChunkType::MaterialColorWrite,
        ChunkType::MaterialDepthWrite,
        ChunkType::MaterialDepthTest,
        ChunkType::MaterialInstanced,
        ChunkType::MaterialCullingMode,
        ChunkType::MaterialProperties,
        ChunkType::MaterialMaskThreshold,
        ChunkType::MaterialShading,
        ChunkType::MaterialShadowMultiplier,
        ChunkType::MaterialRefraction,
        ChunkType::MaterialRefractionType,
        ChunkType::MaterialClearCoatIorChange,
        ChunkType::MaterialRequiredAttributes,
        ChunkType::MaterialSpecularAntiAliasing,
        ChunkType::MaterialSpecularAntiAliasingVariance,
        ChunkType::MaterialSpecularAntiAliasingThreshold,
        ChunkType::MaterialVertexDomain,
        ChunkType::MaterialInterpolation,
        ChunkType::MaterialHasCustomDepthShader,
        ChunkType::DictionaryText,
        ChunkType::DictionarySpirv,
        ChunkType::MaterialGlsl,
        ChunkType::MaterialSpirv,
        ChunkType::MaterialMetal,
    ];

    pub fn tag(self) -> u64 {
        self as u64
    }

    pub fn from_tag(tag: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    /// The tag as its eight ASCII characters.
    pub fn code(self) -> [u8; 8] {
        self.tag().to_le_bytes()
    }
}

/// Size in bytes of a record header (tag and payload size).
pub const RECORD_HEADER_SIZE: usize = 8 + 4;

// ---------------------------------------------------------------------------
// Flattener
// ---------------------------------------------------------------------------

/// Byte sink used to serialize chunks.
///
/// All integers are little-endian. Strings are NUL-terminated.
#[derive(Debug, Default)]
pub struct Flattener {
    buffer: Option<Vec<u8>>,
    len: usize,
}

impl Flattener {
    /// A flattener that only counts bytes.
    pub fn counting() -> Self {
        Self {
            buffer: None,
            len: 0,
        }
    }

    /// A flattener writing into a buffer of the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Some(Vec::with_capacity(capacity)),
            len: 0,
        }
    }

    /// Bytes written (or counted) so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if let Some(buffer) = &mut self.buffer {
            buffer.extend_from_slice(bytes);
        }
        self.len += bytes.len();
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_str(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
        self.write_u8(0);
    }

    /// Writes a `u32` length followed by the bytes.
    pub fn write_blob(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.write_bytes(bytes);
    }

    /// Returns the written bytes; empty in counting mode.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Chunks
// ---------------------------------------------------------------------------

/// A tagged unit of the package.
pub trait Chunk: Send {
    fn chunk_type(&self) -> ChunkType;

    /// Writes the payload (without record header).
    fn flatten(&self, f: &mut Flattener);

    /// Payload size in bytes.
    fn payload_size(&self) -> usize {
        let mut counter = Flattener::counting();
        self.flatten(&mut counter);
        counter.len()
    }
}

/// Values storable in a simple chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleValue {
    Bool(bool),
    U8(u8),
    U32(u32),
    U64(u64),
    F32(f32),
    Str(String),
}

macro_rules! simple_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SimpleValue {
                fn from(value: $ty) -> Self {
                    SimpleValue::$variant(value.into())
                }
            }
        )*
    };
}

simple_value_from!(
    bool => Bool,
    u8 => U8,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    String => Str,
    &str => Str,
);

/// A chunk holding a single value.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleChunk {
    chunk_type: ChunkType,
    value: SimpleValue,
}

impl SimpleChunk {
    pub fn new(chunk_type: ChunkType, value: impl Into<SimpleValue>) -> Self {
        Self {
            chunk_type,
            value: value.into(),
        }
    }
}

impl Chunk for SimpleChunk {
    fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    fn flatten(&self, f: &mut Flattener) {
        match &self.value {
            SimpleValue::Bool(v) => f.write_bool(*v),
            SimpleValue::U8(v) => f.write_u8(*v),
            SimpleValue::U32(v) => f.write_u32(*v),
            SimpleValue::U64(v) => f.write_u64(*v),
            SimpleValue::F32(v) => f.write_f32(*v),
            SimpleValue::Str(v) => f.write_str(v),
        }
    }
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// Ordered, append-only sequence of chunks.
#[derive(Default)]
pub struct ChunkContainer {
    children: Vec<Box<dyn Chunk>>,
}

impl ChunkContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk holding a single value.
    pub fn add_simple(&mut self, chunk_type: ChunkType, value: impl Into<SimpleValue>) {
        self.children.push(Box::new(SimpleChunk::new(chunk_type, value)));
    }

    /// Appends a compound chunk, taking ownership of it.
    pub fn add_child(&mut self, chunk: impl Chunk + 'static) {
        self.children.push(Box::new(chunk));
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Chunk types in append order.
    pub fn chunk_types(&self) -> Vec<ChunkType> {
        self.children.iter().map(|c| c.chunk_type()).collect()
    }

    /// Serialized size of every record.
    pub fn size(&self) -> usize {
        self.children
            .iter()
            .map(|c| RECORD_HEADER_SIZE + c.payload_size())
            .sum()
    }

    /// Writes every chunk in append order.
    pub fn flatten(&self, f: &mut Flattener) {
        for child in &self.children {
            let payload = child.payload_size();
            f.write_u64(child.chunk_type().tag());
            f.write_u32(payload as u32);
            let start = f.len();
            child.flatten(f);
            debug_assert_eq!(f.len() - start, payload);
        }
    }
}

impl std::fmt::Debug for ChunkContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkContainer")
            .field("chunks", &self.chunk_types())
            .finish()
    }
}
