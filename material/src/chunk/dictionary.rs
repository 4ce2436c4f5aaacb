use super::{Chunk, ChunkType, Flattener};
use crate::dictionary::{BlobDictionary, LineDictionary};
use crate::spirv;

/// Serialized [`LineDictionary`].
///
/// Payload: `u32` line count, NUL-terminated lines, `u32` program count, then
/// per program a `u32` line count followed by `u32` line indices.
#[derive(Debug)]
pub struct TextDictionaryChunk {
    dictionary: LineDictionary,
}

impl TextDictionaryChunk {
    pub fn new(dictionary: LineDictionary) -> Self {
        Self { dictionary }
    }

    pub fn dictionary(&self) -> &LineDictionary {
        &self.dictionary
    }
}

impl Chunk for TextDictionaryChunk {
    fn chunk_type(&self) -> ChunkType {
        ChunkType::DictionaryText
    }

    fn flatten(&self, f: &mut Flattener) {
        f.write_u32(self.dictionary.line_count() as u32);
        for line in self.dictionary.lines() {
            f.write_str(line);
        }
        f.write_u32(self.dictionary.len() as u32);
        for text in self.dictionary.texts() {
            f.write_u32(text.len() as u32);
            for &index in text {
                f.write_u32(index);
            }
        }
    }
}

/// Serialized [`BlobDictionary`] of SPIR-V modules.
///
/// Payload: `u32` module count, then per module a `u32` byte length and the bytes.
#[derive(Debug)]
pub struct SpirvDictionaryChunk {
    blobs: Vec<Vec<u8>>,
}

impl SpirvDictionaryChunk {
    /// Takes the dictionary, removing debug instructions unless `keep_debug_info` is set.
    pub fn new(dictionary: BlobDictionary, keep_debug_info: bool) -> Self {
        let blobs = dictionary
            .iter()
            .map(|blob| {
                if keep_debug_info {
                    blob.to_vec()
                } else {
                    spirv::strip_debug_info_bytes(blob)
                }
            })
            .collect();
        Self { blobs }
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl Chunk for SpirvDictionaryChunk {
    fn chunk_type(&self) -> ChunkType {
        ChunkType::DictionarySpirv
    }

    fn flatten(&self, f: &mut Flattener) {
        f.write_u32(self.blobs.len() as u32);
        for blob in &self.blobs {
            f.write_blob(blob);
        }
    }
}
