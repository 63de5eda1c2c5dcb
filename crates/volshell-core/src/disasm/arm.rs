use capstone::arch::{self, BuildsCapstone};
use capstone::{Capstone, CsResult};
use tracing::{debug, warn};

use super::{DecodeMode, DecodedInstruction, DecoderBackend, Instructions};

/// 32-bit ARM and AArch64 decoding through `capstone`.
///
/// Decoding stops at the first word capstone cannot decode.
#[derive(Debug, Default)]
pub struct CapstoneBackend;

impl CapstoneBackend {
    pub fn new() -> Self {
        Self
    }

    fn engine(mode: DecodeMode) -> Option<CsResult<Capstone>> {
        match mode {
            DecodeMode::Arm => Some(Capstone::new().arm().mode(arch::arm::ArchMode::Arm).build()),
            DecodeMode::Arm64 => Some(
                Capstone::new()
                    .arm64()
                    .mode(arch::arm64::ArchMode::Arm)
                    .build(),
            ),
            DecodeMode::X86_32 | DecodeMode::X86_64 => None,
        }
    }
}

impl DecoderBackend for CapstoneBackend {
    fn name(&self) -> &str {
        "capstone"
    }

    fn supports(&self, mode: DecodeMode) -> bool {
        matches!(mode, DecodeMode::Arm | DecodeMode::Arm64)
    }

    fn decode<'a>(&'a self, mode: DecodeMode, data: &'a [u8], address: u64) -> Instructions<'a> {
        let engine = match Self::engine(mode) {
            Some(Ok(engine)) => engine,
            Some(Err(e)) => {
                warn!("Failed to initialise capstone for {}: {}", mode, e);
                return Box::new(std::iter::empty());
            }
            None => return Box::new(std::iter::empty()),
        };

        let instructions = match engine.disasm_all(data, address) {
            Ok(instructions) => instructions,
            Err(e) => {
                warn!("capstone failed to decode at {:#x}: {}", address, e);
                return Box::new(std::iter::empty());
            }
        };

        // The handle owns the decoded buffer, so the listing is copied out
        let decoded: Vec<DecodedInstruction> = instructions
            .iter()
            .map(|insn| DecodedInstruction {
                address: insn.address(),
                mnemonic: insn.mnemonic().unwrap_or_default().to_string(),
                operands: insn.op_str().unwrap_or_default().to_string(),
            })
            .collect();
        debug!("Decoded {} {} instructions", decoded.len(), mode);

        Box::new(decoded.into_iter())
    }
}
