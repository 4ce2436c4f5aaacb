//! The final build artifact.

use crate::chunk::{ChunkContainer, ChunkIter, ChunkType, Flattener};
use crate::error::ChunkReadError;

/// A flattened material package, or the invalid sentinel returned on failure.
///
/// The invalid package has no bytes.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Package {
    data: Box<[u8]>,
}

impl Package {
    /// The sentinel for a failed build.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Flattens every chunk of the container, in order.
    pub fn from_container(container: &ChunkContainer) -> Self {
        let mut flattener = Flattener::with_capacity(container.size());
        container.flatten(&mut flattener);
        Self {
            data: flattener.into_bytes().into_boxed_slice(),
        }
    }

    /// Wraps bytes produced elsewhere.
    pub fn from_bytes(data: impl Into<Box<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data.into_vec()
    }

    /// Records of the package in emission order.
    pub fn chunks(&self) -> ChunkIter<'_> {
        ChunkIter::new(&self.data)
    }

    /// Chunk types in emission order; unknown tags are skipped.
    pub fn chunk_types(&self) -> Result<Vec<ChunkType>, ChunkReadError> {
        let mut types = Vec::new();
        for record in self.chunks() {
            if let Some(ty) = record?.chunk_type() {
                types.push(ty);
            }
        }
        Ok(types)
    }

    /// Payload of the first record with the given type.
    pub fn payload(&self, chunk_type: ChunkType) -> Result<Option<&[u8]>, ChunkReadError> {
        for record in self.chunks() {
            let record = record?;
            if record.tag == chunk_type.tag() {
                return Ok(Some(record.payload));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("valid", &self.is_valid())
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_package_is_empty() {
        let package = Package::invalid();
        assert!(!package.is_valid());
        assert!(package.is_empty());
        assert_eq!(package.chunks().count(), 0);
    }

    #[test]
    fn package_from_container() {
        let mut container = ChunkContainer::new();
        container.add_simple(ChunkType::MaterialVersion, 1u32);
        container.add_simple(ChunkType::MaterialDomain, 0u8);
        let package = Package::from_container(&container);

        assert!(package.is_valid());
        assert_eq!(package.len(), container.size());
        assert_eq!(
            package.chunk_types().unwrap(),
            vec![ChunkType::MaterialVersion, ChunkType::MaterialDomain]
        );
        assert_eq!(
            package.payload(ChunkType::MaterialDomain).unwrap(),
            Some(&[0u8][..])
        );
        assert_eq!(package.payload(ChunkType::MaterialGlsl).unwrap(), None);
    }
}
