//! Deduplicating payload stores.
//!
//! - [`LineDictionary`] stores shader text at line granularity. Every distinct
//!   line is kept once, and every distinct line sequence (a whole program) is
//!   kept once as a list of line indices.
//! - [`BlobDictionary`] stores binary payloads compared by full content.
//!
//! Indices are assigned in insertion order and never change.

use std::collections::HashMap;
use std::sync::Arc;

/// Line-granularity text dictionary.
#[derive(Debug, Clone, Default)]
pub struct LineDictionary {
    lines: Vec<Arc<str>>,
    line_indices: HashMap<Arc<str>, u32>,
    texts: Vec<Arc<[u32]>>,
    text_indices: HashMap<Arc<[u32]>, u32>,
}

impl LineDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a program and returns its index.
    ///
    /// Adding a text whose line sequence is already stored returns the
    /// existing index without growing the dictionary.
    pub fn add_text(&mut self, text: &str) -> u32 {
        let sequence: Vec<u32> = text.split('\n').map(|line| self.add_line(line)).collect();
        if let Some(&index) = self.text_indices.get(sequence.as_slice()) {
            return index;
        }
        let index = self.texts.len() as u32;
        let sequence: Arc<[u32]> = sequence.into();
        self.texts.push(sequence.clone());
        self.text_indices.insert(sequence, index);
        index
    }

    fn add_line(&mut self, line: &str) -> u32 {
        if let Some(&index) = self.line_indices.get(line) {
            return index;
        }
        let index = self.lines.len() as u32;
        let line: Arc<str> = line.into();
        self.lines.push(line.clone());
        self.line_indices.insert(line, index);
        index
    }

    /// Number of stored programs.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Number of distinct lines across all programs.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.as_ref())
    }

    /// Line indices of every program, in index order.
    pub fn texts(&self) -> impl Iterator<Item = &[u32]> {
        self.texts.iter().map(|t| t.as_ref())
    }

    /// Reassembles the program stored at `index`.
    pub fn text(&self, index: u32) -> Option<String> {
        let sequence = self.texts.get(index as usize)?;
        let lines: Vec<&str> = sequence
            .iter()
            .map(|&i| self.lines[i as usize].as_ref())
            .collect();
        Some(lines.join("\n"))
    }
}

/// Content-compared binary dictionary.
#[derive(Debug, Clone, Default)]
pub struct BlobDictionary {
    blobs: Vec<Arc<[u8]>>,
    indices: HashMap<Arc<[u8]>, u32>,
}

impl BlobDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a payload and returns its index, reusing the index of an equal payload.
    pub fn add_blob(&mut self, bytes: &[u8]) -> u32 {
        if let Some(&index) = self.indices.get(bytes) {
            return index;
        }
        let index = self.blobs.len() as u32;
        let blob: Arc<[u8]> = bytes.into();
        self.blobs.push(blob.clone());
        self.indices.insert(blob, index);
        index
    }

    pub fn get(&self, index: u32) -> Option<&[u8]> {
        self.blobs.get(index as usize).map(|b| b.as_ref())
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.blobs.iter().map(|b| b.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM_A: &str = "#version 450\nvoid main() {\n}\n";

    #[test]
    fn identical_texts_share_one_entry() {
        let mut dict = LineDictionary::new();
        let first = dict.add_text(PROGRAM_A);
        let second = dict.add_text(&PROGRAM_A.to_string());
        assert_eq!(first, second);
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn near_duplicates_share_lines() {
        let mut dict = LineDictionary::new();
        dict.add_text("#version 450\n#define FOG\nvoid main() {}\n");
        let lines_before = dict.line_count();
        let index = dict.add_text("#version 450\n#define SKINNING\nvoid main() {}\n");
        assert_eq!(index, 1);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.line_count(), lines_before + 1);
    }

    #[test]
    fn text_reassembles_exactly() {
        let mut dict = LineDictionary::new();
        let index = dict.add_text(PROGRAM_A);
        assert_eq!(dict.text(index).as_deref(), Some(PROGRAM_A));
        assert_eq!(dict.text(7), None);
    }

    #[test]
    fn indices_are_insertion_ordered() {
        let mut dict = LineDictionary::new();
        assert_eq!(dict.add_text("a"), 0);
        assert_eq!(dict.add_text("b"), 1);
        assert_eq!(dict.add_text("a"), 0);
        assert_eq!(dict.add_text("c"), 2);
    }

    #[test]
    fn blobs_compare_by_content() {
        let mut dict = BlobDictionary::new();
        let a = vec![1u8, 2, 3, 4];
        let b = a.clone();
        assert_eq!(dict.add_blob(&a), 0);
        assert_eq!(dict.add_blob(&b), 0);
        assert_eq!(dict.add_blob(&[9, 9]), 1);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get(1), Some(&[9u8, 9][..]));
    }
}
