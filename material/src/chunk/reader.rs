//! Reading packages back.

use super::{ChunkType, RECORD_HEADER_SIZE, TableRecord};
use crate::error::ChunkReadError;

/// One record of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRecord<'a> {
    pub tag: u64,
    pub payload: &'a [u8],
    /// Offset of the payload in the package.
    pub offset: usize,
}

impl<'a> ChunkRecord<'a> {
    /// Known chunk type of the tag, if any.
    pub fn chunk_type(&self) -> Option<ChunkType> {
        ChunkType::from_tag(self.tag)
    }

    pub fn reader(&self) -> PayloadReader<'a> {
        PayloadReader::new(self.payload, self.offset)
    }
}

/// Iterator over the records of a package, in emission order.
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct ChunkIter<'a> {
    data: &'a [u8],
    cursor: usize,
    failed: bool,
}

impl<'a> ChunkIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            cursor: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Result<ChunkRecord<'a>, ChunkReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor >= self.data.len() {
            return None;
        }
        let mut header = PayloadReader::new(&self.data[self.cursor..], self.cursor);
        let record = header.read_u64().and_then(|tag| {
            let size = header.read_u32()? as usize;
            let start = self.cursor + RECORD_HEADER_SIZE;
            let payload = self
                .data
                .get(start..start + size)
                .ok_or(ChunkReadError::Truncated {
                    offset: start,
                    needed: size,
                })?;
            Ok(ChunkRecord {
                tag,
                payload,
                offset: start,
            })
        });
        match record {
            Ok(record) => {
                self.cursor = record.offset + record.payload.len();
                Some(Ok(record))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Little-endian cursor over a chunk payload.
#[derive(Debug, Clone)]
pub struct PayloadReader<'a> {
    data: &'a [u8],
    cursor: usize,
    base: usize,
}

impl<'a> PayloadReader<'a> {
    /// `base` is the offset of `data` in the package, used in error reports.
    pub fn new(data: &'a [u8], base: usize) -> Self {
        Self {
            data,
            cursor: 0,
            base,
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ChunkReadError> {
        let bytes = self
            .data
            .get(self.cursor..self.cursor + len)
            .ok_or(ChunkReadError::Truncated {
                offset: self.base + self.cursor,
                needed: len,
            })?;
        self.cursor += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ChunkReadError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, ChunkReadError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, ChunkReadError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u32(&mut self) -> Result<u32, ChunkReadError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, ChunkReadError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, ChunkReadError> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Reads a NUL-terminated string.
    pub fn read_str(&mut self) -> Result<&'a str, ChunkReadError> {
        let start = self.cursor;
        let rest = &self.data[start..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ChunkReadError::Truncated {
                offset: self.base + start,
                needed: rest.len() + 1,
            })?;
        let text = std::str::from_utf8(&rest[..len]).map_err(|_| ChunkReadError::InvalidUtf8 {
            offset: self.base + start,
        })?;
        self.cursor += len + 1;
        Ok(text)
    }

    /// Reads a `u32` length-prefixed byte string.
    pub fn read_blob(&mut self) -> Result<&'a [u8], ChunkReadError> {
        let len = self.read_u32()? as usize;
        self.read_bytes(len)
    }
}

// ---------------------------------------------------------------------------
// Compound chunk decoders
// ---------------------------------------------------------------------------

/// Decodes a shader table payload.
pub fn read_shader_table(payload: &[u8]) -> Result<Vec<TableRecord>, ChunkReadError> {
    let mut reader = PayloadReader::new(payload, 0);
    let count = reader.read_u64()? as usize;
    let mut records = Vec::with_capacity(count.min(payload.len()));
    for _ in 0..count {
        records.push(TableRecord {
            shader_model: reader.read_u8()?,
            variant: reader.read_u8()?,
            stage: reader.read_u8()?,
            dictionary_index: reader.read_u32()?,
        });
    }
    Ok(records)
}

/// Decodes a text dictionary payload into complete programs, in index order.
pub fn read_text_dictionary(payload: &[u8]) -> Result<Vec<String>, ChunkReadError> {
    let mut reader = PayloadReader::new(payload, 0);
    let line_count = reader.read_u32()? as usize;
    let mut lines = Vec::with_capacity(line_count.min(payload.len()));
    for _ in 0..line_count {
        lines.push(reader.read_str()?);
    }
    let text_count = reader.read_u32()? as usize;
    let mut texts = Vec::with_capacity(text_count.min(payload.len()));
    for _ in 0..text_count {
        let len = reader.read_u32()? as usize;
        let mut text = Vec::with_capacity(len.min(payload.len()));
        for _ in 0..len {
            let index = reader.read_u32()? as usize;
            let line = lines.get(index).ok_or(ChunkReadError::Truncated {
                offset: 0,
                needed: index + 1,
            })?;
            text.push(*line);
        }
        texts.push(text.join("\n"));
    }
    Ok(texts)
}

/// Decodes a SPIR-V dictionary payload into word streams, in index order.
pub fn read_spirv_dictionary(payload: &[u8]) -> Result<Vec<Vec<u32>>, ChunkReadError> {
    let mut reader = PayloadReader::new(payload, 0);
    let count = reader.read_u32()? as usize;
    let mut modules = Vec::with_capacity(count.min(payload.len()));
    for _ in 0..count {
        let bytes = reader.read_blob()?;
        modules.push(bytemuck::pod_collect_to_vec(bytes));
    }
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkContainer, Flattener, ShaderTableChunk, TextDictionaryChunk};
    use crate::dictionary::LineDictionary;

    fn flatten(container: &ChunkContainer) -> Vec<u8> {
        let mut f = Flattener::with_capacity(container.size());
        container.flatten(&mut f);
        f.into_bytes()
    }

    #[test]
    fn iterates_records_in_order() {
        let mut container = ChunkContainer::new();
        container.add_simple(ChunkType::MaterialVersion, 9u32);
        container.add_simple(ChunkType::MaterialName, "glass");
        let bytes = flatten(&container);

        let records: Vec<_> = ChunkIter::new(&bytes).collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chunk_type(), Some(ChunkType::MaterialVersion));
        assert_eq!(records[0].reader().read_u32().unwrap(), 9);
        assert_eq!(records[1].reader().read_str().unwrap(), "glass");
    }

    #[test]
    fn truncated_package_reports_error_once() {
        let mut container = ChunkContainer::new();
        container.add_simple(ChunkType::MaterialName, "truncated");
        let bytes = flatten(&container);
        let cut = &bytes[..bytes.len() - 3];

        let mut iter = ChunkIter::new(cut);
        assert!(matches!(iter.next(), Some(Err(ChunkReadError::Truncated { .. }))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let data = [0xff, 0xfe, 0x00];
        let mut reader = PayloadReader::new(&data, 100);
        assert_eq!(
            reader.read_str(),
            Err(ChunkReadError::InvalidUtf8 { offset: 100 })
        );
    }

    #[test]
    fn decodes_compound_chunks() {
        let mut dict = LineDictionary::new();
        let index = dict.add_text("void main() {\n}\n");
        let mut container = ChunkContainer::new();
        container.add_child(TextDictionaryChunk::new(dict));
        container.add_child(ShaderTableChunk::new(
            ChunkType::MaterialGlsl,
            vec![TableRecord {
                shader_model: 2,
                variant: 0,
                stage: 1,
                dictionary_index: index,
            }],
        ));
        let bytes = flatten(&container);
        let records: Vec<_> = ChunkIter::new(&bytes).collect::<Result<_, _>>().unwrap();

        let texts = read_text_dictionary(records[0].payload).unwrap();
        assert_eq!(texts, vec!["void main() {\n}\n".to_string()]);
        let table = read_shader_table(records[1].payload).unwrap();
        assert_eq!(table[0].shader_model, 2);
        assert_eq!(table[0].dictionary_index, 0);
    }
}
