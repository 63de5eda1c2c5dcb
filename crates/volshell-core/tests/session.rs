use volshell_core::{
    BufferLayer, Command, DecodeMode, DecodedInstruction, DecoderBackend, DisassemblyDispatcher,
    Error, Instructions, LayerArchitecture, LayerRegistry, Session, SessionConfig, StructLayout,
    TypeCatalog,
};

const KERNEL_BASE: u64 = 0xFFFF_F800_0000_0000;

fn registry() -> LayerRegistry {
    let mut registry = LayerRegistry::new();
    registry.add(BufferLayer::new("primary", 0x1000, b"ABCDEFGHIJKLMNOPQRSTUVWXYZ012345".to_vec()));
    registry.add(BufferLayer::new("memory_layer", 0, vec![0xFF; 64]));
    registry.add(
        BufferLayer::new("kernel", KERNEL_BASE, vec![0x55, 0x48, 0x89, 0xE5, 0xC3])
            .with_architecture(LayerArchitecture::Intel64),
    );
    registry
}

fn session(registry: &LayerRegistry) -> Session<'_, LayerRegistry> {
    Session::new(registry, SessionConfig::default())
}

fn run(session: &mut Session<'_, LayerRegistry>, line: &str) -> Result<String, Error> {
    let mut out = Vec::new();
    session.execute_line(&mut out, line)?;
    Ok(String::from_utf8(out).unwrap())
}

/// Decodes every byte as a one-byte `byte` instruction.
struct ByteBackend;

impl DecoderBackend for ByteBackend {
    fn name(&self) -> &str {
        "byte"
    }

    fn supports(&self, _mode: DecodeMode) -> bool {
        true
    }

    fn decode<'a>(&'a self, _mode: DecodeMode, data: &'a [u8], address: u64) -> Instructions<'a> {
        Box::new(data.iter().enumerate().map(move |(i, byte)| DecodedInstruction {
            address: address + i as u64,
            mnemonic: "byte".to_string(),
            operands: format!("{:#04x}", byte),
        }))
    }
}

#[test]
fn test_display_bytes_on_current_layer() {
    let registry = registry();
    let mut session = session(&registry);

    let output = run(&mut session, "db 0x1000 32").unwrap();
    assert_eq!(
        output,
        "0x1010    41 42 43 44 45 46 47 48 49 4a 4b 4c 4d 4e 4f 50    ABCDEFGHIJKLMNOP\n\
         0x1020    51 52 53 54 55 56 57 58 59 5a 30 31 32 33 34 35    QRSTUVWXYZ012345\n"
    );
}

#[test]
fn test_long_names_and_aliases_agree() {
    let registry = registry();
    let mut session = session(&registry);

    let short = run(&mut session, "dd 0x1000 16").unwrap();
    let long = run(&mut session, "read-doublewords 0x1000 16").unwrap();
    let python_style = run(&mut session, "display_doublewords 4096 16").unwrap();
    assert_eq!(short, long);
    assert_eq!(short, python_style);
}

#[test]
#[cfg(target_endian = "little")]
fn test_doubleword_panel_reads_like_the_hex() {
    let registry = registry();
    let mut session = session(&registry);

    let output = run(&mut session, "dd 0x1000 16").unwrap();
    assert_eq!(
        output,
        "0x1010    44434241 48474645 4c4b4a49 504f4e4d    DCBA HGFE LKJI PONM\n"
    );
}

#[test]
fn test_display_words_partial_count() {
    let registry = registry();
    let mut session = session(&registry);

    // 5 bytes read, the odd byte is dropped
    let output = run(&mut session, "dw 0x1000 5 memory_layer").unwrap_err();
    assert!(matches!(output, Error::Read { .. }));

    let output = run(&mut session, "dw 0 5 memory_layer").unwrap();
    let expected = format!("0x10    ffff ffff{}    .. ..\n", "     ".repeat(6));
    assert_eq!(output, expected);
}

#[test]
fn test_quadwords_default_count() {
    let registry = registry();
    let mut session = session(&registry);
    session.change_layer(Some("memory_layer"));

    let output = run(&mut session, "dq 0").unwrap_err();
    // Default count is 128 and the layer only holds 64 bytes
    assert!(matches!(output, Error::Read { length: 128, .. }));

    let output = run(&mut session, "dq 0 64").unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[3],
        "0x40    ffffffffffffffff ffffffffffffffff    ........ ........"
    );
}

#[test]
fn test_switch_layer_and_reset() {
    let registry = registry();
    let mut session = session(&registry);
    assert_eq!(session.prompt(), "(primary) >>> ");

    run(&mut session, "cl memory_layer").unwrap();
    assert_eq!(session.current_layer(), "memory_layer");
    assert_eq!(session.prompt(), "(memory_layer) >>> ");
    assert!(run(&mut session, "db 0 16").unwrap().contains("ff ff ff"));

    run(&mut session, "change_layer").unwrap();
    assert_eq!(session.current_layer(), "primary");
    assert!(run(&mut session, "db 0x1000 16").unwrap().contains("ABCDEFGHIJKLMNOP"));
}

#[test]
fn test_switch_to_missing_layer_fails_on_next_read() {
    let registry = registry();
    let mut session = session(&registry);

    run(&mut session, "switch-layer nowhere").unwrap();
    assert_eq!(session.current_layer(), "nowhere");
    assert!(matches!(
        run(&mut session, "db 0 16"),
        Err(Error::LayerNotFound(name)) if name == "nowhere"
    ));

    // The session carries on after the failure
    run(&mut session, "cl").unwrap();
    assert!(run(&mut session, "db 0x1000 16").is_ok());
}

#[test]
fn test_explicit_layer_does_not_switch() {
    let registry = registry();
    let mut session = session(&registry);

    assert!(run(&mut session, "db 0 16 memory_layer").is_ok());
    assert_eq!(session.current_layer(), "primary");
}

#[test]
fn test_disassemble_infers_architecture_from_layer() {
    let registry = registry();
    let mut session = session(&registry)
        .with_dispatcher(DisassemblyDispatcher::new(Some(Box::new(ByteBackend))));

    let output = run(&mut session, "dis 0xFFFFF80000000000 2 kernel").unwrap();
    assert_eq!(
        output,
        "0xfffff80000000000:\tbyte\t0x55\n0xfffff80000000001:\tbyte\t0x48\n"
    );
}

#[test]
fn test_disassemble_unknown_architecture_prints_notice() {
    let registry = registry();
    let mut session = session(&registry)
        .with_dispatcher(DisassemblyDispatcher::new(Some(Box::new(ByteBackend))));

    let output = run(&mut session, "dis 0x1000 4").unwrap();
    assert_eq!(output.lines().count(), 1);
    assert!(output.contains("not supported"));

    let output = run(&mut session, "dis 0x1000 2 primary intel").unwrap();
    assert_eq!(output.lines().count(), 2);
}

#[test]
fn test_disassemble_without_backend_prints_notice() {
    let registry = registry();
    let mut session = session(&registry).with_dispatcher(DisassemblyDispatcher::unavailable());

    let output = run(&mut session, "disassemble 0xFFFFF80000000000 5 kernel").unwrap();
    assert_eq!(output.lines().count(), 1);
    assert!(output.contains("No disassembler backend"));
}

#[test]
fn test_disassemble_rejects_unknown_architecture_name() {
    let registry = registry();
    let mut session = session(&registry);
    assert!(matches!(
        run(&mut session, "dis 0x1000 4 primary z80"),
        Err(Error::UnknownArchitecture(name)) if name == "z80"
    ));
}

#[cfg(feature = "disasm")]
#[test]
fn test_disassemble_with_iced_backend() {
    let registry = registry();
    let mut session = session(&registry);

    let output = run(&mut session, "dis 0xFFFFF80000000000 5 kernel").unwrap();
    assert_eq!(
        output,
        "0xfffff80000000000:\tpush\trbp\n\
         0xfffff80000000001:\tmov\trbp, rsp\n\
         0xfffff80000000004:\tret\t\n"
    );
}

#[cfg(feature = "disasm-arm")]
#[test]
fn test_disassemble_arm_code_with_override() {
    let mut registry = registry();
    // AArch64 nop; ret, then ARM bx lr
    registry.add(BufferLayer::new(
        "firmware",
        0x4000_0000,
        vec![0x1F, 0x20, 0x03, 0xD5, 0xC0, 0x03, 0x5F, 0xD6, 0x1E, 0xFF, 0x2F, 0xE1],
    ));
    let mut session = session(&registry);

    let output = run(&mut session, "dis 0x40000000 8 firmware arm64").unwrap();
    assert_eq!(output, "0x40000000:\tnop\t\n0x40000004:\tret\t\n");

    let output = run(&mut session, "dis 0x40000008 4 firmware arm").unwrap();
    assert_eq!(output, "0x40000008:\tbx\tlr\n");
}

#[test]
fn test_describe_type() {
    let registry = registry();
    let mut catalog = TypeCatalog::new();
    catalog.insert(
        StructLayout::new("_UNICODE_STRING", 16)
            .with_member("Length", 0, "unsigned short")
            .with_member("MaximumLength", 2, "unsigned short")
            .with_member("Buffer", 8, "Pointer(unsigned short)"),
    );
    catalog.insert(StructLayout::new("_EMPTY", 0));
    let mut session = session(&registry).with_types(catalog);

    let output = run(&mut session, "dt _UNICODE_STRING").unwrap();
    assert_eq!(
        output,
        "0x0 Length        unsigned short\n\
         0x2 MaximumLength unsigned short\n\
         0x8 Buffer        Pointer(unsigned short)\n"
    );
    assert_eq!(run(&mut session, "display_type _EMPTY").unwrap(), "");
    assert!(matches!(
        run(&mut session, "dt _MISSING"),
        Err(Error::TypeNotFound(_))
    ));
}

#[test]
fn test_help_lists_every_command() {
    let registry = registry();
    let mut session = session(&registry);

    let output = run(&mut session, "hh").unwrap();
    for command in [
        "read-bytes",
        "read-words",
        "read-doublewords",
        "read-quadwords",
        "disassemble",
        "switch-layer",
        "describe-type",
        "help",
    ] {
        assert!(output.contains(&format!("* {} (", command)), "{}", command);
    }
    assert!(output.contains("current layer: primary"));
}

#[test]
fn test_argument_errors() {
    let registry = registry();
    let mut session = session(&registry);

    assert!(matches!(run(&mut session, "db"), Err(Error::InvalidArgument(_))));
    assert!(matches!(
        run(&mut session, "db 0x1000 16 primary extra"),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(run(&mut session, "dt"), Err(Error::InvalidArgument(_))));
    assert!(matches!(run(&mut session, "help me"), Err(Error::InvalidArgument(_))));
    assert!(matches!(run(&mut session, "rm -rf"), Err(Error::UnknownCommand(_))));
    assert_eq!(run(&mut session, "   ").unwrap(), "");
}

#[test]
fn test_execute_by_command_value() {
    let registry = registry();
    let mut session = session(&registry);
    let mut out = Vec::new();

    session
        .execute(&mut out, Command::ReadBytes, &["0x1010", "16"])
        .unwrap();
    let output = String::from_utf8(out).unwrap();
    assert!(output.starts_with("0x1020    51 52"));
}
