use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::layer::{LayerArchitecture, LayerSource, MemoryLayer};

/// Owns the layers of a session, keyed by name.
#[derive(Default)]
pub struct LayerRegistry {
    layers: HashMap<String, Box<dyn MemoryLayer>>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a layer under its own name, replacing any layer of the same name.
    pub fn add<L: MemoryLayer + 'static>(&mut self, layer: L) {
        debug!(
            "Registered layer '{}' ({}, max {:#x})",
            layer.name(),
            layer.architecture(),
            layer.maximum_address()
        );
        self.layers.insert(layer.name().to_string(), Box::new(layer));
    }

    pub fn get(&self, name: &str) -> Result<&dyn MemoryLayer> {
        self.layers
            .get(name)
            .map(|layer| &**layer)
            .ok_or_else(|| Error::LayerNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    /// Layer names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.layers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl LayerSource for LayerRegistry {
    fn read(&self, layer: &str, offset: u64, length: usize) -> Result<Vec<u8>> {
        self.get(layer)?.read(offset, length)
    }

    fn architecture_of(&self, layer: &str) -> Result<LayerArchitecture> {
        Ok(self.get(layer)?.architecture())
    }
}
