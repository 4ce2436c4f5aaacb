use super::{Chunk, ChunkType, Flattener};

/// One row of a shader table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRecord {
    pub shader_model: u8,
    pub variant: u8,
    pub stage: u8,
    /// Index into the dictionary chunk the table refers to.
    pub dictionary_index: u32,
}

impl TableRecord {
    /// Sort key of the table.
    pub fn key(&self) -> (u8, u8, u8) {
        (self.shader_model, self.variant, self.stage)
    }
}

/// A table mapping `(shader model, variant, stage)` to dictionary indices.
///
/// Payload: `u64` record count, then per record `u8` shader model, `u8`
/// variant, `u8` stage and `u32` dictionary index.
#[derive(Debug, Clone)]
pub struct ShaderTableChunk {
    chunk_type: ChunkType,
    records: Vec<TableRecord>,
}

impl ShaderTableChunk {
    pub fn new(chunk_type: ChunkType, records: Vec<TableRecord>) -> Self {
        Self {
            chunk_type,
            records,
        }
    }

    pub fn records(&self) -> &[TableRecord] {
        &self.records
    }
}

impl Chunk for ShaderTableChunk {
    fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    fn flatten(&self, f: &mut Flattener) {
        f.write_u64(self.records.len() as u64);
        for record in &self.records {
            f.write_u8(record.shader_model);
            f.write_u8(record.variant);
            f.write_u8(record.stage);
            f.write_u32(record.dictionary_index);
        }
    }
}
