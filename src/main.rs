// src/main.rs  —  seatalk-remote  entry point
mod config;
mod dispatch;
mod feedback;
mod helm;
mod input;
mod mirror;
mod seatalk;

use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use config::{AppConfig, Cli};
use dispatch::Dispatcher;
use feedback::Pattern;
use helm::{FileWindVane, Helm};
use input::decoder::{DebounceTiming, PressDecoder};
use input::AuxSlot;
use mirror::MirrorNotifier;
use seatalk::{CommandSink, SerialBus};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    // ── --print-config  ───────────────────────────────────────────────────────
    if cli.print_config {
        print!("{}", config::DEFAULT_CONFIG_TOML);
        return Ok(());
    }

    // ── --write-config  ───────────────────────────────────────────────────────
    if cli.write_config {
        let path = AppConfig::write_default_config(&cli)?;
        println!("Config written to: {}", path.display());
        println!("Edit it to set your serial port, pins and listen address.");
        return Ok(());
    }

    // ── --list-ports  ─────────────────────────────────────────────────────────
    if cli.list_ports {
        let ports = list_serial_ports();
        if ports.is_empty() {
            println!("No serial ports found.");
        } else {
            println!("Available serial ports:");
            for p in &ports {
                println!("  {p}");
            }
        }
        return Ok(());
    }

    // ── Load config ───────────────────────────────────────────────────────────
    let cfg = AppConfig::load(&cli)?;

    // ── One-shot utility modes: bypass input decoding entirely ────────────────
    if let Some(key_cmd) = cli.send {
        let mut bus = SerialBus::new(&cfg.port);
        bus.send(key_cmd.into())?;
        return Ok(());
    }
    if let Some(degrees) = cli.steer {
        let mut bus = SerialBus::new(&cfg.port);
        let mut helm = Helm::new(
            Box::new(FileWindVane::new(cfg.awa_file.clone())),
            Duration::from_millis(cfg.pace_ms),
        );
        helm.steer_to_offset(&mut bus, degrees)?;
        return Ok(());
    }

    // ── Switch sources + network key input ────────────────────────────────────
    let sources = input::build_sources(&cfg)?;
    let aux = AuxSlot::default();

    let mut aux_up = false;
    if cfg.aux_enabled {
        match input::net::spawn_listener(&cfg.listen, aux.clone()) {
            Ok(_) => aux_up = true,
            Err(e) => log::warn!("[net] network key input disabled: {e:#}"),
        }
    }
    if sources.is_empty() && !aux_up {
        bail!(
            "No way to press keys: built without the gpio feature and the \
             network input is off. Build with --features gpio or enable [aux]."
        );
    }

    // ── Decoder + dispatcher ──────────────────────────────────────────────────
    let mut decoder = PressDecoder::new(sources, aux, DebounceTiming::from_config(&cfg));

    let mut annunciator = feedback::build_annunciator(&cfg);
    // power-on chirp: tells the operator the relay is up
    annunciator.play(Pattern::DoubleShort);

    let helm = Helm::new(
        Box::new(FileWindVane::new(cfg.awa_file.clone())),
        Duration::from_millis(cfg.pace_ms),
    );
    let mirror = cfg
        .mirror_enabled
        .then(|| MirrorNotifier::new(&cfg.mirror_addr));
    let mut dispatcher = Dispatcher::new(
        Box::new(SerialBus::new(&cfg.port)),
        helm,
        annunciator,
        mirror,
        cfg.long_press_feedback,
    );

    log::info!("[main] ready on {} (bus {})", cfg.listen, cfg.port);

    // ── Main loop ─────────────────────────────────────────────────────────────
    loop {
        let press = decoder.next_press();
        log::info!("[main] key {} ({:?})", press.key.bits(), press.kind);
        if let Err(e) = dispatcher.handle(&press) {
            // dropped, never retried: the operator presses again
            log::warn!("[dispatch] command dropped: {e}");
        }
        log::debug!("[main] mode {:?}", dispatcher.mode());
    }
}

fn list_serial_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports
            .iter()
            .map(|p| {
                let detail = match &p.port_type {
                    serialport::SerialPortType::UsbPort(info) => format!(
                        "USB VID:{:04x} PID:{:04x}{}",
                        info.vid,
                        info.pid,
                        info.product
                            .as_deref()
                            .map(|s| format!(" \"{s}\""))
                            .unwrap_or_default()
                    ),
                    serialport::SerialPortType::BluetoothPort => "Bluetooth".into(),
                    _ => "Serial".into(),
                };
                format!("{}  ({detail})", p.port_name)
            })
            .collect(),
        Err(e) => vec![format!("Serial port enumeration failed: {e}")],
    }
}
