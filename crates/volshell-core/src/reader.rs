use tracing::debug;

use crate::error::Result;
use crate::layer::LayerSource;
use crate::selector::LayerSelector;

/// Number of bytes read when a command does not give a count.
pub const DEFAULT_READ_COUNT: usize = 128;

/// Reads byte ranges from named layers, defaulting to the current layer.
///
/// Every call goes to the layer source; nothing is cached.
pub struct ByteReader<'a, S: LayerSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: LayerSource + ?Sized> ByteReader<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Read `count` bytes at `offset` from `layer`, or from the selector's
    /// current layer when `layer` is `None`.
    ///
    /// Layer and read errors are returned unmodified.
    pub fn read(
        &self,
        selector: &LayerSelector,
        layer: Option<&str>,
        offset: u64,
        count: usize,
    ) -> Result<Vec<u8>> {
        let layer = selector.resolve(layer);
        debug!("Reading {} bytes at {:#x} from '{}'", count, offset, layer);
        self.source.read(layer, offset, count)
    }
}
