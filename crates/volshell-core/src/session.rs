//! Named shell commands on top of the reader, formatter and dispatcher.
//!
//! [`Command`] is the stable name table an interactive front end can list
//! and invoke; [`Session`] carries the current layer and runs commands,
//! printing to whatever writer it is handed.

use std::io::Write;
use std::str::FromStr;

use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::debug;

use crate::disasm::{Architecture, DisassemblyDispatcher};
use crate::dump::{DumpLines, ElementWidth};
use crate::error::{Error, Result};
use crate::layer::LayerSource;
use crate::reader::{ByteReader, DEFAULT_READ_COUNT};
use crate::selector::LayerSelector;
use crate::types::{TypeCatalog, describe};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Layer the session starts on and returns to on a bare layer switch.
    pub primary_layer: String,
    /// Bytes read by dump and disassemble commands when no count is given.
    pub default_count: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            primary_layer: "primary".to_string(),
            default_count: DEFAULT_READ_COUNT,
        }
    }
}

/// Shell commands. Parsing accepts the long name and every alias.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, IntoStaticStr, Display,
)]
pub enum Command {
    #[strum(to_string = "read-bytes", serialize = "db", serialize = "display_bytes")]
    ReadBytes,
    #[strum(to_string = "read-words", serialize = "dw", serialize = "display_words")]
    ReadWords,
    #[strum(
        to_string = "read-doublewords",
        serialize = "dd",
        serialize = "display_doublewords"
    )]
    ReadDoublewords,
    #[strum(
        to_string = "read-quadwords",
        serialize = "dq",
        serialize = "display_quadwords"
    )]
    ReadQuadwords,
    #[strum(to_string = "disassemble", serialize = "dis")]
    Disassemble,
    #[strum(to_string = "switch-layer", serialize = "cl", serialize = "change_layer")]
    SwitchLayer,
    #[strum(to_string = "describe-type", serialize = "dt", serialize = "display_type")]
    DescribeType,
    #[strum(to_string = "help", serialize = "hh")]
    Help,
}

impl Command {
    /// Look up a command by name or alias.
    pub fn lookup(name: &str) -> Result<Self> {
        Self::from_str(name).map_err(|_| Error::UnknownCommand(name.to_string()))
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::ReadBytes => &["db", "display_bytes"],
            Self::ReadWords => &["dw", "display_words"],
            Self::ReadDoublewords => &["dd", "display_doublewords"],
            Self::ReadQuadwords => &["dq", "display_quadwords"],
            Self::Disassemble => &["dis"],
            Self::SwitchLayer => &["cl", "change_layer"],
            Self::DescribeType => &["dt", "display_type"],
            Self::Help => &["hh"],
        }
    }

    pub fn usage(self) -> &'static str {
        match self {
            Self::ReadBytes
            | Self::ReadWords
            | Self::ReadDoublewords
            | Self::ReadQuadwords => "<offset> [count] [layer]",
            Self::Disassemble => "<offset> [count] [layer] [architecture]",
            Self::SwitchLayer => "[layer]",
            Self::DescribeType => "<type>",
            Self::Help => "",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::ReadBytes => "Displays byte values and ASCII characters",
            Self::ReadWords => "Displays word values (2 bytes) and corresponding ASCII characters",
            Self::ReadDoublewords => {
                "Displays double-word values (4 bytes) and corresponding ASCII characters"
            }
            Self::ReadQuadwords => {
                "Displays quad-word values (8 bytes) and corresponding ASCII characters"
            }
            Self::Disassemble => "Disassembles a number of instructions from the code at offset",
            Self::SwitchLayer => "Changes the current default layer",
            Self::DescribeType => "Describes the members of a structured type",
            Self::Help => "Describes the available commands",
        }
    }

    /// Cell width of the dump commands.
    pub fn element_width(self) -> Option<ElementWidth> {
        match self {
            Self::ReadBytes => Some(ElementWidth::Byte),
            Self::ReadWords => Some(ElementWidth::Word),
            Self::ReadDoublewords => Some(ElementWidth::DoubleWord),
            Self::ReadQuadwords => Some(ElementWidth::QuadWord),
            _ => None,
        }
    }
}

/// Parse a number given as `0x`-prefixed hex or as decimal.
pub fn parse_number(s: &str) -> Result<u64> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| Error::InvalidArgument(format!("'{}' is not a number: {}", s, e)))
}

/// A ranged read to be rendered as a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpRequest<'a> {
    pub offset: u64,
    pub count: usize,
    pub layer: Option<&'a str>,
    pub width: ElementWidth,
}

impl<'a> DumpRequest<'a> {
    pub fn new(offset: u64, width: ElementWidth) -> Self {
        Self {
            offset,
            count: DEFAULT_READ_COUNT,
            layer: None,
            width,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn on_layer(mut self, layer: Option<&'a str>) -> Self {
        self.layer = layer;
        self
    }
}

/// Positional arguments of a single command line.
struct Args<'a> {
    command: Command,
    args: std::slice::Iter<'a, &'a str>,
}

impl<'a> Args<'a> {
    fn new(command: Command, args: &'a [&'a str]) -> Self {
        Self {
            command,
            args: args.iter(),
        }
    }

    fn next_arg(&mut self) -> Option<&'a str> {
        self.args.next().copied()
    }

    fn required_number(&mut self, what: &str) -> Result<u64> {
        let arg = self.next_arg().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "missing {} (usage: {} {})",
                what,
                self.command,
                self.command.usage()
            ))
        })?;
        parse_number(arg)
    }

    fn optional_count(&mut self) -> Result<Option<usize>> {
        self.next_arg()
            .map(|arg| {
                let count = parse_number(arg)?;
                usize::try_from(count)
                    .map_err(|_| Error::InvalidArgument(format!("count {} is too large", count)))
            })
            .transpose()
    }

    fn finish(mut self) -> Result<()> {
        match self.next_arg() {
            Some(extra) => Err(Error::InvalidArgument(format!(
                "unexpected argument '{}' (usage: {} {})",
                extra,
                self.command,
                self.command.usage()
            ))),
            None => Ok(()),
        }
    }
}

/// An inspection session over a set of layers.
pub struct Session<'a, S: LayerSource + ?Sized> {
    source: &'a S,
    selector: LayerSelector,
    dispatcher: DisassemblyDispatcher,
    types: TypeCatalog,
    default_count: usize,
}

impl<'a, S: LayerSource + ?Sized> Session<'a, S> {
    pub fn new(source: &'a S, config: SessionConfig) -> Self {
        Self {
            source,
            selector: LayerSelector::new(config.primary_layer),
            dispatcher: DisassemblyDispatcher::with_default_backend(),
            types: TypeCatalog::new(),
            default_count: config.default_count,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: DisassemblyDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_types(mut self, types: TypeCatalog) -> Self {
        self.types = types;
        self
    }

    pub fn current_layer(&self) -> &str {
        self.selector.current()
    }

    pub fn selector(&self) -> &LayerSelector {
        &self.selector
    }

    pub fn types(&self) -> &TypeCatalog {
        &self.types
    }

    /// Prompt text showing the current layer.
    pub fn prompt(&self) -> String {
        format!("({}) >>> ", self.current_layer())
    }

    /// Read bytes for a command, from `layer` or the current layer.
    pub fn read(&self, layer: Option<&str>, offset: u64, count: usize) -> Result<Vec<u8>> {
        ByteReader::new(self.source).read(&self.selector, layer, offset, count)
    }

    /// Read and print a dump.
    pub fn display_data<W: Write>(&self, out: &mut W, request: &DumpRequest<'_>) -> Result<()> {
        let data = self.read(request.layer, request.offset, request.count)?;
        for line in DumpLines::new(request.offset, &data, request.width, true) {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    pub fn display_bytes<W: Write>(
        &self,
        out: &mut W,
        offset: u64,
        count: Option<usize>,
        layer: Option<&str>,
    ) -> Result<()> {
        self.display_width(out, offset, count, layer, ElementWidth::Byte)
    }

    pub fn display_words<W: Write>(
        &self,
        out: &mut W,
        offset: u64,
        count: Option<usize>,
        layer: Option<&str>,
    ) -> Result<()> {
        self.display_width(out, offset, count, layer, ElementWidth::Word)
    }

    pub fn display_doublewords<W: Write>(
        &self,
        out: &mut W,
        offset: u64,
        count: Option<usize>,
        layer: Option<&str>,
    ) -> Result<()> {
        self.display_width(out, offset, count, layer, ElementWidth::DoubleWord)
    }

    pub fn display_quadwords<W: Write>(
        &self,
        out: &mut W,
        offset: u64,
        count: Option<usize>,
        layer: Option<&str>,
    ) -> Result<()> {
        self.display_width(out, offset, count, layer, ElementWidth::QuadWord)
    }

    fn display_width<W: Write>(
        &self,
        out: &mut W,
        offset: u64,
        count: Option<usize>,
        layer: Option<&str>,
        width: ElementWidth,
    ) -> Result<()> {
        let request = DumpRequest::new(offset, width)
            .with_count(count.unwrap_or(self.default_count))
            .on_layer(layer);
        self.display_data(out, &request)
    }

    /// Read `count` bytes and print the decoded instructions.
    ///
    /// When no decoder can be chosen the notice is printed instead and the
    /// command still succeeds.
    pub fn disassemble<W: Write>(
        &self,
        out: &mut W,
        offset: u64,
        count: Option<usize>,
        layer: Option<&str>,
        architecture: Option<Architecture>,
    ) -> Result<()> {
        let layer = self.selector.resolve(layer);
        let data = self.read(Some(layer), offset, count.unwrap_or(self.default_count))?;
        let layer_architecture = self.source.architecture_of(layer)?;

        match self
            .dispatcher
            .disassemble(offset, &data, layer_architecture, architecture)
        {
            Ok(instructions) => {
                for instruction in instructions {
                    writeln!(out, "{}", instruction)?;
                }
            }
            Err(unavailable) => writeln!(out, "{}", unavailable)?,
        }
        Ok(())
    }

    /// Switch the current layer; `None` returns to the primary layer.
    pub fn change_layer(&mut self, layer: Option<&str>) {
        self.selector.switch(layer);
    }

    /// Print the member table of a named type.
    pub fn display_type<W: Write>(&self, out: &mut W, type_name: &str) -> Result<()> {
        let layout = self.types.get(type_name)?;
        for line in describe(layout) {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    /// Print every command with its aliases, arguments and description.
    pub fn help<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out)?;
        writeln!(out, "Methods:")?;
        for command in Command::iter() {
            writeln!(
                out,
                "* {} ({}) {}",
                command,
                command.aliases().join(", "),
                command.usage()
            )?;
            writeln!(out, "    {}", command.description())?;
        }
        writeln!(out)?;
        writeln!(out, "Variables:")?;
        writeln!(out, "  current layer: {}", self.current_layer())?;
        writeln!(out, "  primary layer: {}", self.selector.primary())?;
        Ok(())
    }

    /// Run `command` with its positional arguments.
    pub fn execute<W: Write>(&mut self, out: &mut W, command: Command, args: &[&str]) -> Result<()> {
        debug!("Executing {} {:?}", command, args);
        let mut args = Args::new(command, args);

        match command {
            Command::ReadBytes
            | Command::ReadWords
            | Command::ReadDoublewords
            | Command::ReadQuadwords => {
                let offset = args.required_number("offset")?;
                let count = args.optional_count()?;
                let layer = args.next_arg();
                args.finish()?;
                let width = command
                    .element_width()
                    .ok_or_else(|| Error::UnknownCommand(command.to_string()))?;
                self.display_width(out, offset, count, layer, width)
            }
            Command::Disassemble => {
                let offset = args.required_number("offset")?;
                let count = args.optional_count()?;
                let layer = args.next_arg();
                let architecture = args
                    .next_arg()
                    .map(|name| {
                        Architecture::from_str(name)
                            .map_err(|_| Error::UnknownArchitecture(name.to_string()))
                    })
                    .transpose()?;
                args.finish()?;
                self.disassemble(out, offset, count, layer, architecture)
            }
            Command::SwitchLayer => {
                let layer = args.next_arg();
                args.finish()?;
                self.change_layer(layer);
                Ok(())
            }
            Command::DescribeType => {
                let type_name = args.next_arg().ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "missing type name (usage: {} {})",
                        command,
                        command.usage()
                    ))
                })?;
                args.finish()?;
                self.display_type(out, type_name)
            }
            Command::Help => {
                args.finish()?;
                self.help(out)
            }
        }
    }

    /// Parse and run one line of input. Blank lines do nothing.
    pub fn execute_line<W: Write>(&mut self, out: &mut W, line: &str) -> Result<()> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(());
        };
        let command = Command::lookup(name)?;
        let args: Vec<&str> = words.collect();
        self.execute(out, command, &args)
    }
}
