//! Hex dump rendering for the `db`/`dw`/`dd`/`dq` commands.
//!
//! # Output Format
//!
//! ```text
//! 0x1010    00000041 00000041 00000041 00000041    ...A ...A ...A ...A
//! ```
//!
//! The ASCII panel spells out each cell's rendered value, most significant
//! byte first, so it reads in the same order as the hex digits.
//!
//! Each row covers 16 bytes. The address printed on a row is the row start
//! plus 16: the label is advanced before the row is printed. Existing
//! transcripts depend on this, so it is kept as is.

use strum::{Display, EnumIter, IntoStaticStr};

use crate::error::{Error, Result};

/// Bytes per dump row.
pub const ROW_WIDTH: usize = 16;

/// Separator between the address, the hex block and the ASCII panel.
const COLUMN_SEPARATOR: &str = "    ";

/// Size of one numeric cell within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Display)]
#[repr(usize)]
pub enum ElementWidth {
    #[strum(serialize = "byte")]
    Byte = 1,
    #[strum(serialize = "word")]
    Word = 2,
    #[strum(serialize = "doubleword")]
    DoubleWord = 4,
    #[strum(serialize = "quadword")]
    QuadWord = 8,
}

impl ElementWidth {
    pub fn bytes(self) -> usize {
        self as usize
    }

    /// Number of cells in a full row.
    pub fn cells_per_row(self) -> usize {
        ROW_WIDTH / self.bytes()
    }

    /// Characters used by one rendered cell.
    pub fn hex_digits(self) -> usize {
        self.bytes() * 2
    }

    /// Decode `cell` as an unsigned integer in native byte order.
    ///
    /// `cell` must be exactly `self.bytes()` long.
    fn value(self, cell: &[u8]) -> u64 {
        let mut raw = [0u8; 8];
        raw[..cell.len()].copy_from_slice(cell);
        match self {
            Self::Byte => u64::from(raw[0]),
            Self::Word => u64::from(u16::from_ne_bytes([raw[0], raw[1]])),
            Self::DoubleWord => u64::from(u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]])),
            Self::QuadWord => u64::from_ne_bytes(raw),
        }
    }

    /// Bytes of a cell value in display order, most significant first.
    fn display_bytes(self, value: u64) -> impl Iterator<Item = u8> {
        value.to_be_bytes().into_iter().skip(8 - self.bytes())
    }
}

impl TryFrom<usize> for ElementWidth {
    type Error = Error;

    fn try_from(width: usize) -> Result<Self> {
        match width {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Word),
            4 => Ok(Self::DoubleWord),
            8 => Ok(Self::QuadWord),
            other => Err(Error::InvalidWidth(other)),
        }
    }
}

/// Printable form of a byte in the ASCII panel.
pub fn ascii_char(byte: u8) -> char {
    if byte.is_ascii_graphic() {
        byte as char
    } else {
        '.'
    }
}

/// Number of bytes a dump of `len` bytes actually renders.
pub fn consumed_len(len: usize, width: ElementWidth) -> usize {
    len - len % width.bytes()
}

/// Iterator over the rendered rows of a dump.
pub struct DumpLines<'a> {
    address: u64,
    remaining: &'a [u8],
    width: ElementWidth,
    show_ascii: bool,
}

impl<'a> DumpLines<'a> {
    pub fn new(offset: u64, data: &'a [u8], width: ElementWidth, show_ascii: bool) -> Self {
        Self {
            address: offset,
            remaining: &data[..consumed_len(data.len(), width)],
            width,
            show_ascii,
        }
    }

    fn render_row(&self, row: &[u8]) -> String {
        let width = self.width;
        let values: Vec<u64> = row.chunks(width.bytes()).map(|cell| width.value(cell)).collect();

        let mut hex = Vec::with_capacity(width.cells_per_row());
        for value in &values {
            hex.push(format!("{:0digits$x}", value, digits = width.hex_digits()));
        }
        for _ in values.len()..width.cells_per_row() {
            hex.push(" ".repeat(width.hex_digits()));
        }

        let ascii = if self.show_ascii {
            let connector = if width == ElementWidth::Byte { "" } else { " " };
            values
                .iter()
                .map(|&value| width.display_bytes(value).map(ascii_char).collect::<String>())
                .collect::<Vec<_>>()
                .join(connector)
        } else {
            String::new()
        };

        format!(
            "{:#x}{sep}{}{sep}{}",
            self.address,
            hex.join(" "),
            ascii,
            sep = COLUMN_SEPARATOR
        )
    }
}

impl Iterator for DumpLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.remaining.is_empty() {
            return None;
        }

        let split = self.remaining.len().min(ROW_WIDTH);
        let (row, rest) = self.remaining.split_at(split);
        self.remaining = rest;
        self.address = self.address.wrapping_add(ROW_WIDTH as u64);

        Some(self.render_row(row))
    }
}

/// Render `data` read at `offset` as dump rows.
pub fn format(offset: u64, data: &[u8], width: ElementWidth, show_ascii: bool) -> Vec<String> {
    DumpLines::new(offset, data, width, show_ascii).collect()
}

/// Same as [`format`] but with the width given as a byte count.
pub fn format_with_width(
    offset: u64,
    data: &[u8],
    width: usize,
    show_ascii: bool,
) -> Result<Vec<String>> {
    let width = ElementWidth::try_from(width)?;
    Ok(format(offset, data, width, show_ascii))
}
