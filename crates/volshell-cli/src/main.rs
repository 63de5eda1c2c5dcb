mod config;
mod shell;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use volshell_core::{
    FileLayer, LayerArchitecture, LayerRegistry, Session, SessionConfig, TypeCatalog,
    parse_number,
};

use crate::config::{Config, LayerConfig};

#[derive(Parser)]
#[command(name = "volshell")]
#[command(about = "Interactive memory image inspection shell")]
struct Args {
    #[arg(short, long, default_value = "volshell.toml")]
    config: PathBuf,

    /// Raw memory image to register as an additional layer
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Name of the layer created from --image
    #[arg(long, default_value = "memory")]
    layer_name: String,

    /// Address of the first byte of --image
    #[arg(long, value_parser = parse_address)]
    base: Option<u64>,

    /// Architecture tag of --image (intel, intel-pae, intel64, other)
    #[arg(short, long)]
    architecture: Option<LayerArchitecture>,

    /// Layer the session starts on
    #[arg(short, long)]
    primary: Option<String>,

    /// Type layout export used by describe-type
    #[arg(short, long)]
    types: Option<PathBuf>,

    /// Default byte count for dump and disassemble commands
    #[arg(long)]
    count: Option<usize>,

    /// Command to run instead of starting the prompt (e.g. `db 0x1000 64`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn parse_address(s: &str) -> std::result::Result<u64, String> {
    parse_number(s).map_err(|e| e.to_string())
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("volshell=warn".parse()?))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = if args.config.exists() {
        match Config::load(&args.config) {
            Ok(c) => {
                info!("Loaded config from {:?}", args.config);
                c
            }
            Err(e) => {
                warn!("Failed to load config: {:#}, using defaults", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    let mut layers = config.layers.clone();
    if let Some(ref image) = args.image {
        layers.push(LayerConfig {
            name: args.layer_name.clone(),
            path: image.clone(),
            base: args.base.unwrap_or(0),
            architecture: args.architecture.unwrap_or_default(),
        });
    }
    let registry = open_layers(&layers)?;
    info!("Layers: {}", registry.names().join(", "));

    let primary = args
        .primary
        .clone()
        .or(config.primary.clone())
        .or_else(|| layers.first().map(|layer| layer.name.clone()))
        .context("No primary layer")?;
    if !registry.contains(&primary) {
        warn!("Primary layer '{}' is not registered", primary);
    }

    let types = match args.types.as_ref().or(config.types.as_ref()) {
        Some(path) => TypeCatalog::load(path)
            .with_context(|| format!("loading type layouts from {}", path.display()))?,
        None => TypeCatalog::new(),
    };
    info!("{} type layouts available", types.len());

    let session_config = SessionConfig {
        primary_layer: primary,
        default_count: args.count.unwrap_or(config.default_count),
    };
    let mut session = Session::new(&registry, session_config).with_types(types);

    let mut stdout = io::stdout().lock();
    if !args.command.is_empty() {
        let ok = shell::run_command(&mut session, &args.command, &mut stdout);
        return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    if !io::stdin().is_terminal() {
        info!("Reading commands from stdin");
    }
    shell::run_interactive(&mut session, io::stdin().lock(), &mut stdout)?;

    Ok(ExitCode::SUCCESS)
}

fn open_layers(layers: &[LayerConfig]) -> Result<LayerRegistry> {
    if layers.is_empty() {
        bail!("No layers configured; pass --image or add [[layers]] to the config file");
    }

    let mut registry = LayerRegistry::new();
    for layer in layers {
        let opened = FileLayer::open(&layer.name, &layer.path, layer.base, layer.architecture)
            .with_context(|| {
                format!(
                    "opening layer '{}' from {}",
                    layer.name,
                    layer.path.display()
                )
            })?;
        info!(
            "Layer '{}': {} bytes at {:#x} ({})",
            layer.name,
            opened.size(),
            layer.base,
            layer.architecture
        );
        registry.add(opened);
    }

    Ok(registry)
}
