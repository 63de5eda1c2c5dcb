//! # volshell-core
//!
//! Core library for the volshell memory-inspection shell.
//!
//! This crate provides:
//! - Name-addressed reads from memory layers (`LayerSource`, `LayerRegistry`)
//! - Hex dumps in byte, word, double-word and quad-word cells
//! - Architecture-aware disassembly with an optional decoder backend
//! - Current-layer tracking and switching
//! - Column-aligned structured type listings
//! - The named command table used by interactive front ends
//!
//! ## Feature Flags
//!
//! - `disasm` (default): x86 disassembly through `iced-x86`.
//! - `disasm-arm` (default): 32-bit ARM and AArch64 disassembly through
//!   `capstone`.
//!
//! With neither, the disassemble command prints an "unavailable" notice.

pub mod disasm;
pub mod dump;
pub mod error;
pub mod layer;
pub mod reader;
pub mod selector;
pub mod session;
pub mod types;

pub use disasm::{
    Architecture, DecodeMode, DecodedInstruction, DecoderBackend, DisassemblyDispatcher,
    DisassemblyUnavailable, Instructions,
};
#[cfg(feature = "disasm-arm")]
pub use disasm::CapstoneBackend;
#[cfg(feature = "disasm")]
pub use disasm::IcedBackend;
pub use dump::{DumpLines, ElementWidth, ROW_WIDTH};
pub use error::{Error, Result};
pub use layer::{
    BufferLayer, FileLayer, LayerArchitecture, LayerRegistry, LayerSource, MemoryLayer,
};
pub use reader::{ByteReader, DEFAULT_READ_COUNT};
pub use selector::LayerSelector;
pub use session::{Command, DumpRequest, Session, SessionConfig, parse_number};
pub use types::{MemberLayout, ObjectHandle, ObjectMember, StructLayout, TypeCatalog, describe};
