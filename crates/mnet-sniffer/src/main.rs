//! M-NET bus sniffer
//!
//! Listens on a serial port attached to the bus and appends a decoded trace
//! of every frame to a log file. Stops cleanly on Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use mnet_core::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "mnet-sniffer", version, about = "Passive M-NET HVAC bus sniffer")]
struct Args {
    /// Serial device attached to the bus
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Idle time in milliseconds before resynchronising
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Only show frames for this unit address (decimal or 0x-prefixed hex)
    #[arg(short, long, value_parser = parse_address)]
    filter: Option<u8>,

    /// Trace file (appended)
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not echo the trace to stdout
    #[arg(short, long)]
    quiet: bool,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn parse_address(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid unit address '{s}': {e}"))
}

impl Args {
    fn into_config(self) -> Result<SnifferConfig> {
        let mut config = match &self.config {
            Some(path) => SnifferConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => SnifferConfig::default(),
        };

        if let Some(port) = self.port {
            config.port_name = port;
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if self.filter.is_some() {
            config.filter_unit = self.filter;
        }
        if let Some(log) = self.log {
            config.log_path = log;
        }
        if self.quiet {
            config.echo = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_ports {
        for port in list_ports() {
            match port.product {
                Some(product) => println!("{}  ({})", port.name, product),
                None => println!("{}", port.name),
            }
        }
        return Ok(());
    }

    let print_config = args.print_config;
    let config = args.into_config()?;
    if print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }
    tracing::info!(version = mnet_core::VERSION, ?config, "mnet-sniffer starting");

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst))
            .context("installing Ctrl-C handler")?;
    }

    let sink = TraceLog::open(&config.log_path, config.echo)
        .with_context(|| format!("opening trace file {}", config.log_path.display()))?;
    let source = open_port(&config.port_name, Some(config.baud_rate))
        .with_context(|| format!("opening serial port {}", config.port_name))?;

    let decoder = Decoder::new(config.address_filter());
    let mut sniffer = Sniffer::new(source, sink, decoder, config.timeout(), cancel);
    let stats = sniffer.run().context("capture failed")?;

    tracing::info!(
        frames = stats.frames,
        filtered = stats.filtered,
        unrecognized = stats.unrecognized,
        checksum_errors = stats.checksum_errors,
        overflows = stats.overflows,
        timeouts = stats.timeouts,
        "capture summary"
    );
    Ok(())
}
