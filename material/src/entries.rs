//! Per-target result tables filled by the orchestrator.

use crate::chunk::TableRecord;
use crate::dictionary::{BlobDictionary, LineDictionary};
use crate::types::{ShaderModel, ShaderStage};
use crate::variant::VariantKey;

/// A generated human-readable program (GLSL or MSL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    pub shader_model: u8,
    pub variant: u8,
    pub stage: u8,
    pub text: String,
    pub dictionary_index: u32,
}

impl TextEntry {
    pub fn new(model: ShaderModel, variant: VariantKey, stage: ShaderStage, text: String) -> Self {
        Self {
            shader_model: model as u8,
            variant: variant.bits(),
            stage: stage as u8,
            text,
            dictionary_index: 0,
        }
    }

    pub fn key(&self) -> (u8, u8, u8) {
        (self.shader_model, self.variant, self.stage)
    }

    fn record(&self) -> TableRecord {
        TableRecord {
            shader_model: self.shader_model,
            variant: self.variant,
            stage: self.stage,
            dictionary_index: self.dictionary_index,
        }
    }
}

/// A generated SPIR-V module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpirvEntry {
    pub shader_model: u8,
    pub variant: u8,
    pub stage: u8,
    pub words: Vec<u32>,
    pub dictionary_index: u32,
}

impl SpirvEntry {
    pub fn new(model: ShaderModel, variant: VariantKey, stage: ShaderStage, words: Vec<u32>) -> Self {
        Self {
            shader_model: model as u8,
            variant: variant.bits(),
            stage: stage as u8,
            words,
            dictionary_index: 0,
        }
    }

    pub fn key(&self) -> (u8, u8, u8) {
        (self.shader_model, self.variant, self.stage)
    }

    fn record(&self) -> TableRecord {
        TableRecord {
            shader_model: self.shader_model,
            variant: self.variant,
            stage: self.stage,
            dictionary_index: self.dictionary_index,
        }
    }
}

/// Results of every compilation task, grouped by output kind.
#[derive(Debug, Clone, Default)]
pub struct ShaderTables {
    pub glsl: Vec<TextEntry>,
    pub spirv: Vec<SpirvEntry>,
    pub metal: Vec<TextEntry>,
}

impl ShaderTables {
    pub fn len(&self) -> usize {
        self.glsl.len() + self.spirv.len() + self.metal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorts every table by `(shader model, variant, stage)`.
    ///
    /// Tasks finish in arbitrary order; sorting makes packages reproducible.
    pub fn sort(&mut self) {
        self.glsl.sort_by_key(TextEntry::key);
        self.spirv.sort_by_key(SpirvEntry::key);
        self.metal.sort_by_key(TextEntry::key);
    }

    /// Assigns dictionary indices and consumes the tables.
    ///
    /// Must run after [`ShaderTables::sort`] so indices follow table order.
    pub fn encode(self) -> EncodedTables {
        let mut text_dictionary = LineDictionary::new();
        let mut spirv_dictionary = BlobDictionary::new();

        let mut encode_text = |entries: Vec<TextEntry>| -> Vec<TableRecord> {
            entries
                .into_iter()
                .map(|mut entry| {
                    entry.dictionary_index = text_dictionary.add_text(&entry.text);
                    entry.record()
                })
                .collect()
        };
        let glsl = encode_text(self.glsl);
        let metal = encode_text(self.metal);

        let spirv = self
            .spirv
            .into_iter()
            .map(|mut entry| {
                entry.dictionary_index =
                    spirv_dictionary.add_blob(bytemuck::cast_slice(&entry.words));
                entry.record()
            })
            .collect();

        EncodedTables {
            text_dictionary,
            spirv_dictionary,
            glsl,
            spirv,
            metal,
        }
    }
}

/// Tables whose payloads moved into the dictionaries.
#[derive(Debug, Clone)]
pub struct EncodedTables {
    pub text_dictionary: LineDictionary,
    pub spirv_dictionary: BlobDictionary,
    pub glsl: Vec<TableRecord>,
    pub spirv: Vec<TableRecord>,
    pub metal: Vec<TableRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(model: ShaderModel, variant: u8, stage: ShaderStage, body: &str) -> TextEntry {
        TextEntry::new(model, VariantKey::from_bits_retain(variant), stage, body.to_string())
    }

    #[test]
    fn sort_orders_by_model_variant_stage() {
        let mut tables = ShaderTables::default();
        tables.glsl = vec![
            text(ShaderModel::Desktop, 0, ShaderStage::Vertex, "d"),
            text(ShaderModel::Mobile, 4, ShaderStage::Fragment, "c"),
            text(ShaderModel::Mobile, 4, ShaderStage::Vertex, "b"),
            text(ShaderModel::Mobile, 1, ShaderStage::Fragment, "a"),
        ];
        tables.sort();
        let keys: Vec<_> = tables.glsl.iter().map(TextEntry::key).collect();
        assert_eq!(keys, vec![(1, 1, 1), (1, 4, 0), (1, 4, 1), (2, 0, 0)]);
    }

    #[test]
    fn encode_deduplicates_payloads() {
        let mut tables = ShaderTables::default();
        tables.glsl = vec![
            text(ShaderModel::Mobile, 0, ShaderStage::Vertex, "same"),
            text(ShaderModel::Mobile, 0, ShaderStage::Fragment, "other"),
            text(ShaderModel::Desktop, 0, ShaderStage::Vertex, "same"),
        ];
        tables.spirv = vec![
            SpirvEntry::new(ShaderModel::Mobile, VariantKey::empty(), ShaderStage::Vertex, vec![1, 2]),
            SpirvEntry::new(ShaderModel::Desktop, VariantKey::empty(), ShaderStage::Vertex, vec![1, 2]),
        ];
        tables.sort();
        let encoded = tables.encode();

        let indices: Vec<_> = encoded.glsl.iter().map(|r| r.dictionary_index).collect();
        assert_eq!(indices, vec![0, 1, 0]);
        assert_eq!(encoded.text_dictionary.len(), 2);
        assert_eq!(encoded.spirv_dictionary.len(), 1);
        assert!(encoded.spirv.iter().all(|r| r.dictionary_index == 0));
    }
}
