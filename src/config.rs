// src/config.rs  —  Runtime configuration (CLI + TOML)
use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The example config is embedded directly in the binary at compile time.
/// Users can write it out with:  seatalk-remote --write-config
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config.toml.example");

// ── CLI ───────────────────────────────────────────────────────────────────────
#[derive(Parser, Debug)]
#[command(
    name    = "seatalk-remote",
    about   = "SeaTalk autopilot remote  |  keypad + network relay for ST2000-class tillerpilots",
    version,
)]
pub struct Cli {
    /// Config file path (default: ~/.config/seatalk-remote/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SeaTalk serial device (e.g. /dev/serial0)
    #[arg(long)]
    pub port: Option<String>,

    /// Listen address for the network key input (e.g. 0.0.0.0:5005)
    #[arg(long)]
    pub listen: Option<String>,

    /// Disable the network key input even if enabled in the config
    #[arg(long, action)]
    pub no_listen: bool,

    /// File holding the apparent wind angle in degrees [0,360)
    #[arg(long)]
    pub awa_file: Option<PathBuf>,

    /// Mirror host for the decoded-key echo (e.g. 10.10.10.3:5006)
    #[arg(long)]
    pub mirror: Option<String>,

    /// Long-press threshold in milliseconds
    #[arg(long)]
    pub long_press_ms: Option<u64>,

    /// Transmit a single autopilot command and exit (no keypad needed)
    #[arg(long, value_name = "COMMAND")]
    pub send: Option<KeyCommand>,

    /// Steer by a signed heading offset in degrees and exit (e.g. --steer=-25)
    #[arg(long, value_name = "DEGREES", allow_hyphen_values = true)]
    pub steer: Option<i32>,

    /// List available serial ports and exit
    #[arg(long, action)]
    pub list_ports: bool,

    /// Write the built-in default config.toml to the config path and exit.
    /// Use --config <PATH> to write to a custom location.
    #[arg(long, action)]
    pub write_config: bool,

    /// Print the built-in default config.toml to stdout and exit
    #[arg(long, action)]
    pub print_config: bool,
}

// ── Enums shared across CLI + TOML ────────────────────────────────────────────

/// Keypad commands addressable from the CLI (--send).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum KeyCommand {
    Standby,
    Auto,
    Plus1,
    Plus10,
    Minus10,
    Minus1,
    Track,
    TackPort,
    TackStarboard,
    ToggleSeastate,
}

/// Which buzzer pattern a long-press remap plays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LongPressFeedback {
    /// Pattern of the key the press was remapped to (+10 / -10)
    Remapped,
    /// The long-press's own long pulse
    Own,
}

/// BCM pin numbers for one bank of keypad switches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PinMap {
    pub standby: u8,
    pub auto:    u8,
    pub plus1:   u8,
    pub plus10:  u8,
    pub minus10: u8,
    pub minus1:  u8,
}

// ── TOML file structure ───────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    pub bus:      Option<BusCfg>,
    pub input:    Option<InputCfg>,
    pub gpio:     Option<GpioCfg>,
    pub steering: Option<SteeringCfg>,
    pub aux:      Option<AuxCfg>,
    pub mirror:   Option<MirrorCfg>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusCfg {
    pub port: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputCfg {
    pub poll_ms:             Option<u64>,
    pub settle_ms:           Option<u64>,
    pub long_press_ms:       Option<u64>,
    pub long_press_feedback: Option<LongPressFeedback>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpioCfg {
    pub pins:       Option<PinMap>,
    pub rf_pins:    Option<PinMap>,
    pub buzzer_pin: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteeringCfg {
    pub pace_ms:  Option<u64>,
    pub awa_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuxCfg {
    pub enabled: Option<bool>,
    pub listen:  Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorCfg {
    pub enabled: Option<bool>,
    pub addr:    Option<String>,
}

// ── Resolved / merged config ──────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SeaTalk serial device
    pub port:                String,
    pub poll_ms:             u64,
    pub settle_ms:           u64,
    pub long_press_ms:       u64,
    pub long_press_feedback: LongPressFeedback,
    /// Primary keypad bank (BCM numbering)
    pub pins:                PinMap,
    /// Optional second bank (short-range RF receiver) on the same roles
    pub rf_pins:             Option<PinMap>,
    pub buzzer_pin:          Option<u8>,
    /// Delay between keystrokes of a steering sequence
    pub pace_ms:             u64,
    pub awa_file:            PathBuf,
    pub aux_enabled:         bool,
    pub listen:              String,
    pub mirror_enabled:      bool,
    pub mirror_addr:         String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port:                "/dev/serial0".into(),
            poll_ms:             50,
            settle_ms:           50,
            long_press_ms:       1000,
            long_press_feedback: LongPressFeedback::Remapped,
            // wiring of the original handset build
            pins: PinMap {
                standby: 23,
                auto:    24,
                plus1:   18,
                plus10:  17,
                minus10: 27,
                minus1:  22,
            },
            rf_pins:        None,
            buzzer_pin:     Some(25),
            pace_ms:        200,
            awa_file:       "/tmp/AWA".into(),
            aux_enabled:    true,
            listen:         "0.0.0.0:5005".into(),
            mirror_enabled: false,
            mirror_addr:    "10.10.10.3:5006".into(),
        }
    }
}

// ── Config loader ─────────────────────────────────────────────────────────────
impl AppConfig {
    /// Write the embedded default config to disk.
    /// Returns the path it was written to.
    pub fn write_default_config(cli: &Cli) -> Result<PathBuf> {
        let path = cli.config.clone().unwrap_or_else(default_config_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Creating config directory {:?}", parent))?;
        }
        std::fs::write(&path, DEFAULT_CONFIG_TOML)
            .with_context(|| format!("Writing config to {:?}", path))?;
        Ok(path)
    }

    pub fn load(cli: &Cli) -> Result<Self> {
        let mut cfg = Self::default();

        // 1. Load TOML file
        let path = cli.config.clone().unwrap_or_else(default_config_path);
        if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Reading config {:?}", path))?;
            let fc: FileConfig = toml::from_str(&raw)
                .with_context(|| format!("Parsing config {:?}", path))?;
            cfg.apply_file(&fc);
        } else {
            log::info!(
                "[config] no config file at {}, using built-in defaults \
                 (seatalk-remote --write-config creates one)",
                path.display()
            );
        }

        // 2. Apply CLI overrides
        cfg.apply_cli(cli);
        Ok(cfg)
    }

    fn apply_file(&mut self, fc: &FileConfig) {
        if let Some(b) = &fc.bus {
            if let Some(v) = &b.port { self.port = v.clone(); }
        }
        if let Some(i) = &fc.input {
            if let Some(v) = i.poll_ms             { self.poll_ms             = v; }
            if let Some(v) = i.settle_ms           { self.settle_ms           = v; }
            if let Some(v) = i.long_press_ms       { self.long_press_ms       = v; }
            if let Some(v) = i.long_press_feedback { self.long_press_feedback = v; }
        }
        if let Some(g) = &fc.gpio {
            if let Some(v) = g.pins       { self.pins       = v; }
            if let Some(v) = g.rf_pins    { self.rf_pins    = Some(v); }
            if let Some(v) = g.buzzer_pin { self.buzzer_pin = Some(v); }
        }
        if let Some(s) = &fc.steering {
            if let Some(v) = s.pace_ms   { self.pace_ms  = v; }
            if let Some(v) = &s.awa_file { self.awa_file = v.clone(); }
        }
        if let Some(a) = &fc.aux {
            if let Some(v) = a.enabled { self.aux_enabled = v; }
            if let Some(v) = &a.listen { self.listen      = v.clone(); }
        }
        if let Some(m) = &fc.mirror {
            if let Some(v) = m.enabled { self.mirror_enabled = v; }
            if let Some(v) = &m.addr   { self.mirror_addr    = v.clone(); }
        }
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = &cli.port         { self.port          = v.clone(); }
        if let Some(v) = &cli.listen       { self.listen        = v.clone(); self.aux_enabled = true; }
        if cli.no_listen                   { self.aux_enabled   = false; }
        if let Some(v) = &cli.awa_file     { self.awa_file      = v.clone(); }
        if let Some(v) = &cli.mirror       { self.mirror_addr   = v.clone(); self.mirror_enabled = true; }
        if let Some(v) = cli.long_press_ms { self.long_press_ms = v; }
    }
}

fn default_config_path() -> PathBuf {
    config_dir().join("seatalk-remote").join("config.toml")
}

fn config_dir() -> PathBuf {
    if let Ok(v) = std::env::var("XDG_CONFIG_HOME") { return PathBuf::from(v); }
    let home = std::env::var("HOME").unwrap_or_default();
    PathBuf::from(home).join(".config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_example_parses_and_matches_defaults() {
        let fc: FileConfig = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        let mut cfg = AppConfig::default();
        cfg.apply_file(&fc);

        let def = AppConfig::default();
        assert_eq!(cfg.port, def.port);
        assert_eq!(cfg.poll_ms, def.poll_ms);
        assert_eq!(cfg.long_press_ms, def.long_press_ms);
        assert_eq!(cfg.pins.standby, def.pins.standby);
        assert_eq!(cfg.buzzer_pin, def.buzzer_pin);
        assert_eq!(cfg.listen, def.listen);
        // the example ships with the mirror off
        assert!(!cfg.mirror_enabled);
    }

    #[test]
    fn file_sections_override_defaults() {
        let raw = r#"
            [bus]
            port = "/dev/ttyUSB1"
            [input]
            long_press_ms = 750
            [aux]
            enabled = false
        "#;
        let fc: FileConfig = toml::from_str(raw).unwrap();
        let mut cfg = AppConfig::default();
        cfg.apply_file(&fc);
        assert_eq!(cfg.port, "/dev/ttyUSB1");
        assert_eq!(cfg.long_press_ms, 750);
        assert!(!cfg.aux_enabled);
        // untouched sections keep their defaults
        assert_eq!(cfg.pace_ms, 200);
    }

    #[test]
    fn cli_overrides_enable_their_subsystem() {
        let mut cfg = AppConfig::default();
        cfg.mirror_enabled = false;
        let cli = Cli::parse_from(["seatalk-remote", "--mirror", "192.168.1.9:7000"]);
        cfg.apply_cli(&cli);
        assert!(cfg.mirror_enabled);
        assert_eq!(cfg.mirror_addr, "192.168.1.9:7000");
    }
}
