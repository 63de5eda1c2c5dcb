//! Instruction decoding for the `dis` command.
//!
//! Decoder backends are optional capabilities handed to the
//! [`DisassemblyDispatcher`]. Without one that handles the resolved mode, or
//! without a known architecture, disassembly degrades to a
//! [`DisassemblyUnavailable`] notice instead of failing the command.

#[cfg(feature = "disasm-arm")]
mod arm;
#[cfg(feature = "disasm")]
mod iced;

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;
use tracing::{debug, warn};

use crate::layer::LayerArchitecture;

#[cfg(feature = "disasm-arm")]
pub use arm::CapstoneBackend;
#[cfg(feature = "disasm")]
pub use iced::IcedBackend;

/// Architecture names accepted as an explicit override.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Display,
)]
pub enum Architecture {
    #[serde(rename = "intel")]
    #[strum(serialize = "intel")]
    Intel,
    #[serde(rename = "intel64")]
    #[strum(serialize = "intel64")]
    Intel64,
    #[serde(rename = "arm")]
    #[strum(serialize = "arm")]
    Arm,
    #[serde(rename = "arm64")]
    #[strum(serialize = "arm64")]
    Arm64,
}

impl Architecture {
    pub fn decode_mode(self) -> DecodeMode {
        match self {
            Self::Intel => DecodeMode::X86_32,
            Self::Intel64 => DecodeMode::X86_64,
            Self::Arm => DecodeMode::Arm,
            Self::Arm64 => DecodeMode::Arm64,
        }
    }

    /// Architecture implied by a layer: 64-bit paging decodes as x86-64,
    /// any other paging as x86-32, anything unpaged has no architecture.
    pub fn from_layer(layer: LayerArchitecture) -> Option<Self> {
        match layer {
            LayerArchitecture::Intel64 => Some(Self::Intel64),
            LayerArchitecture::Intel | LayerArchitecture::IntelPae => Some(Self::Intel),
            LayerArchitecture::Other => None,
        }
    }
}

/// Instruction set and bitness handed to a decoder backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display)]
#[allow(non_camel_case_types)]
pub enum DecodeMode {
    #[strum(serialize = "x86-32")]
    X86_32,
    #[strum(serialize = "x86-64")]
    X86_64,
    #[strum(serialize = "arm")]
    Arm,
    #[strum(serialize = "arm64")]
    Arm64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedInstruction {
    pub address: u64,
    pub mnemonic: String,
    pub operands: String,
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}:\t{}\t{}", self.address, self.mnemonic, self.operands)
    }
}

/// Lazily decoded instruction stream.
pub type Instructions<'a> = Box<dyn Iterator<Item = DecodedInstruction> + 'a>;

/// Translates raw bytes into instructions for a given mode.
pub trait DecoderBackend {
    fn name(&self) -> &str;

    fn supports(&self, mode: DecodeMode) -> bool;

    /// Decode `data` linearly, the first byte sitting at `address`.
    ///
    /// The stream ends when the data is exhausted. How undecodable bytes are
    /// skipped is up to the backend.
    fn decode<'a>(&'a self, mode: DecodeMode, data: &'a [u8], address: u64) -> Instructions<'a>;
}

/// Why a disassembly request produced no instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DisassemblyUnavailable {
    #[error("No disassembler backend available - rebuild with the `disasm` or `disasm-arm` feature to use the disassemble command")]
    NoBackend,
    #[error("Disassembly not supported for this layer - pass an architecture (intel, intel64, arm, arm64)")]
    UnknownArchitecture,
    #[error("No disassembler backend supports {0} code")]
    UnsupportedMode(DecodeMode),
}

/// Chooses the decode mode for a request and hands the bytes to the first
/// backend that supports it.
pub struct DisassemblyDispatcher {
    backends: Vec<Box<dyn DecoderBackend>>,
}

impl DisassemblyDispatcher {
    pub fn new(backend: Option<Box<dyn DecoderBackend>>) -> Self {
        Self {
            backends: backend.into_iter().collect(),
        }
    }

    /// Add a backend, consulted after the ones already registered.
    pub fn with_backend(mut self, backend: Box<dyn DecoderBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Dispatcher with whichever backends this build ships, if any.
    pub fn with_default_backend() -> Self {
        #[allow(unused_mut)]
        let mut dispatcher = Self::unavailable();
        #[cfg(feature = "disasm")]
        {
            dispatcher = dispatcher.with_backend(Box::new(IcedBackend::new()));
        }
        #[cfg(feature = "disasm-arm")]
        {
            dispatcher = dispatcher.with_backend(Box::new(CapstoneBackend::new()));
        }
        dispatcher
    }

    /// Dispatcher with no backend at all.
    pub fn unavailable() -> Self {
        Self::new(None)
    }

    pub fn has_backend(&self) -> bool {
        !self.backends.is_empty()
    }

    /// Names of the registered backends, in dispatch order.
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|backend| backend.name()).collect()
    }

    /// Explicit override first, then whatever the layer implies.
    pub fn resolve(
        layer: LayerArchitecture,
        architecture: Option<Architecture>,
    ) -> Option<Architecture> {
        architecture.or_else(|| Architecture::from_layer(layer))
    }

    /// Decode `data`, read at `offset` from a layer tagged `layer`.
    pub fn disassemble<'a>(
        &'a self,
        offset: u64,
        data: &'a [u8],
        layer: LayerArchitecture,
        architecture: Option<Architecture>,
    ) -> Result<Instructions<'a>, DisassemblyUnavailable> {
        if self.backends.is_empty() {
            warn!("Disassembly requested but no backend is available");
            return Err(DisassemblyUnavailable::NoBackend);
        }

        let architecture =
            Self::resolve(layer, architecture).ok_or(DisassemblyUnavailable::UnknownArchitecture)?;
        let mode = architecture.decode_mode();
        let Some(backend) = self
            .backends
            .iter()
            .map(|backend| backend.as_ref())
            .find(|backend| backend.supports(mode))
        else {
            warn!("No backend among {:?} can decode {}", self.backend_names(), mode);
            return Err(DisassemblyUnavailable::UnsupportedMode(mode));
        };

        debug!(
            "Disassembling {} bytes at {:#x} as {} ({}) with '{}'",
            data.len(),
            offset,
            architecture,
            mode,
            backend.name()
        );
        Ok(backend.decode(mode, data, offset))
    }
}

impl Default for DisassemblyDispatcher {
    fn default() -> Self {
        Self::with_default_backend()
    }
}
