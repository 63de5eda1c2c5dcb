use iced_x86::{Decoder, DecoderOptions, Formatter, IntelFormatter};
use tracing::debug;

use super::{DecodeMode, DecodedInstruction, DecoderBackend, Instructions};

/// x86 decoding through `iced-x86`, Intel syntax.
#[derive(Debug, Default)]
pub struct IcedBackend;

impl IcedBackend {
    pub fn new() -> Self {
        Self
    }

    fn bitness(mode: DecodeMode) -> Option<u32> {
        match mode {
            DecodeMode::X86_32 => Some(32),
            DecodeMode::X86_64 => Some(64),
            DecodeMode::Arm | DecodeMode::Arm64 => None,
        }
    }
}

impl DecoderBackend for IcedBackend {
    fn name(&self) -> &str {
        "iced-x86"
    }

    fn supports(&self, mode: DecodeMode) -> bool {
        Self::bitness(mode).is_some()
    }

    fn decode<'a>(&'a self, mode: DecodeMode, data: &'a [u8], address: u64) -> Instructions<'a> {
        let Some(bitness) = Self::bitness(mode) else {
            return Box::new(std::iter::empty());
        };

        let mut formatter = IntelFormatter::new();
        let options = formatter.options_mut();
        options.set_hex_prefix("0x");
        options.set_hex_suffix("");
        options.set_uppercase_hex(false);
        options.set_space_after_operand_separator(true);

        Box::new(IcedInstructions {
            decoder: Decoder::with_ip(bitness, data, address, DecoderOptions::NONE),
            formatter,
        })
    }
}

struct IcedInstructions<'a> {
    decoder: Decoder<'a>,
    formatter: IntelFormatter,
}

impl Iterator for IcedInstructions<'_> {
    type Item = DecodedInstruction;

    fn next(&mut self) -> Option<DecodedInstruction> {
        while self.decoder.can_decode() {
            let instruction = self.decoder.decode();
            if instruction.is_invalid() {
                // The decoder has already moved past the bad bytes
                debug!("Skipping undecodable bytes at {:#x}", instruction.ip());
                continue;
            }

            let mut mnemonic = String::new();
            self.formatter.format_mnemonic(&instruction, &mut mnemonic);
            let mut operands = String::new();
            self.formatter.format_all_operands(&instruction, &mut operands);

            return Some(DecodedInstruction {
                address: instruction.ip(),
                mnemonic,
                operands,
            });
        }
        None
    }
}
