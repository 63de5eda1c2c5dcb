use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::layer::{LayerArchitecture, MemoryLayer};

/// A read-only layer over a raw memory image on disk.
///
/// Byte `n` of the file is mapped at address `base + n`.
#[derive(Debug)]
pub struct FileLayer {
    name: String,
    base: u64,
    size: u64,
    file: File,
    architecture: LayerArchitecture,
}

impl FileLayer {
    pub fn open<P: AsRef<Path>>(
        name: impl Into<String>,
        path: P,
        base: u64,
        architecture: LayerArchitecture,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        let name = name.into();
        debug!("Opened layer '{}' from {:?} ({} bytes)", name, path, size);

        Ok(Self {
            name,
            base,
            size,
            file,
            architecture,
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl MemoryLayer for FileLayer {
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
        if start
            .checked_add(length as u64)
            .is_none_or(|end| end > self.size)
        {
            return Err(Error::read(&self.name, offset, length, "address out of range"));
        }

        let mut buffer = vec![0u8; length];
        let mut file = &self.file;
        file.seek(SeekFrom::Start(start))
            .and_then(|_| file.read_exact(&mut buffer))
            .map_err(|e| Error::read(&self.name, offset, length, e.to_string()))?;

        Ok(buffer)
    }

    fn maximum_address(&self) -> u64 {
        self.base.saturating_add(self.size).saturating_sub(1)
    }
}
