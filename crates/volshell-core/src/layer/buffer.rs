use crate::error::{Error, Result};
use crate::layer::{LayerArchitecture, MemoryLayer};

/// A layer backed by an in-memory buffer mapped at `base`.
#[derive(Debug, Clone)]
pub struct BufferLayer {
    name: String,
    base: u64,
    data: Vec<u8>,
    architecture: LayerArchitecture,
}

impl BufferLayer {
    pub fn new(name: impl Into<String>, base: u64, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            base,
            data,
            architecture: LayerArchitecture::Other,
        }
    }

    pub fn with_architecture(mut self, architecture: LayerArchitecture) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn base(&self) -> u64 {
        self.base
    }
}

impl MemoryLayer for BufferLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn architecture(&self) -> LayerArchitecture {
        self.architecture
    }

    fn read(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
        let start = offset
            .checked_sub(self.base)
            .ok_or_else(|| Error::read(&self.name, offset, length, "address below layer base"))?;
        let end = start
            .checked_add(length as u64)
            .filter(|&end| end <= self.data.len() as u64)
            .ok_or_else(|| Error::read(&self.name, offset, length, "address out of range"))?;

        Ok(self.data[start as usize..end as usize].to_vec())
    }

    fn maximum_address(&self) -> u64 {
        self.base
            .saturating_add(self.data.len() as u64)
            .saturating_sub(1)
    }
}
