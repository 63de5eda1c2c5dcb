//! Memory layers as seen by the shell.
//!
//! Layers themselves (paging, stacking, image formats) belong to the layer
//! subsystem. The shell only needs two things from it, captured by
//! [`LayerSource`]: a ranged read by layer name and the architecture tag of a
//! layer. [`LayerRegistry`] is the owning implementation used by the binary
//! and the tests.

mod buffer;
mod file;
mod registry;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::Result;

pub use buffer::BufferLayer;
pub use file::FileLayer;
pub use registry::LayerRegistry;

/// Architecture tag reported by a layer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
pub enum LayerArchitecture {
    /// 32-bit paged layer
    #[serde(rename = "intel")]
    #[strum(serialize = "intel")]
    Intel,
    /// 32-bit paged layer with physical address extension
    #[serde(rename = "intel-pae")]
    #[strum(serialize = "intel-pae")]
    IntelPae,
    /// 64-bit (4-level) paged layer
    #[serde(rename = "intel64")]
    #[strum(serialize = "intel64")]
    Intel64,
    /// Anything without paging semantics (physical images, files)
    #[default]
    #[serde(rename = "other")]
    #[strum(serialize = "other")]
    Other,
}

impl LayerArchitecture {
    pub fn is_paged(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// A single addressable byte space.
pub trait MemoryLayer {
    /// The registry name of this layer.
    fn name(&self) -> &str;

    fn architecture(&self) -> LayerArchitecture;

    /// Read `length` bytes starting at `offset`.
    ///
    /// Fails with [`crate::Error::Read`] when any part of the range is not
    /// backed by data.
    fn read(&self, offset: u64, length: usize) -> Result<Vec<u8>>;

    /// Highest valid address in this layer.
    fn maximum_address(&self) -> u64;
}

/// Name-addressed access to a set of layers.
pub trait LayerSource {
    /// Read `length` bytes at `offset` from the layer called `layer`.
    fn read(&self, layer: &str, offset: u64, length: usize) -> Result<Vec<u8>>;

    /// Architecture tag of the layer called `layer`.
    fn architecture_of(&self, layer: &str) -> Result<LayerArchitecture>;
}
