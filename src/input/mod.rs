// src/input/mod.rs  —  Key model, switch sources, shared network-key slot
pub mod decoder;
#[cfg(feature = "gpio")]
pub mod gpio;
pub mod net;

use std::ops::BitOr;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::config::AppConfig;

/// One press cycle's worth of keypad state: a bitmask over the six switch
/// roles. Combinations are first-class (Track, the tacks, seastate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key(u8);

impl Key {
    pub const NONE:     Key = Key(0);
    pub const STANDBY:  Key = Key(1);
    pub const AUTO:     Key = Key(2);
    pub const PLUS_1:   Key = Key(4);
    pub const PLUS_10:  Key = Key(8);
    pub const MINUS_10: Key = Key(16);
    pub const MINUS_1:  Key = Key(32);

    // Defined chords
    pub const TRACK:           Key = Key(8 | 16);  // +10 & -10
    pub const TACK_PORT:       Key = Key(32 | 16); // -1 & -10
    pub const TACK_STARBOARD:  Key = Key(4 | 8);   // +1 & +10
    pub const TOGGLE_SEASTATE: Key = Key(4 | 32);  // +1 & -1

    /// Masks off anything outside the six role bits.
    pub fn from_bits(bits: u8) -> Key {
        Key(bits & 0x3F)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Key {
    type Output = Key;
    fn bitor(self, rhs: Key) -> Key {
        Key(self.0 | rhs.0)
    }
}

/// How long the key was held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    Short,
    Long,
}

/// One fully debounced press cycle, as handed to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key:  Key,
    pub kind: PressKind,
    /// Long-press remap was applied (+1 held → +10, -1 held → -10)
    pub remapped: bool,
}

/// A bank of momentary switches. `read` returns the roles currently held
/// down; the decoder ORs all sources together per press cycle.
pub trait SwitchSource: Send {
    fn read(&mut self) -> Key;
    /// Human-readable source name
    fn name(&self) -> &str;
}

/// Single-producer single-consumer cell carrying the last key delivered by
/// the network listener. Writes overwrite (last value wins); the decoder
/// takes-and-clears exactly once per press cycle.
#[derive(Clone, Default)]
pub struct AuxSlot(Arc<Mutex<u8>>);

impl AuxSlot {
    pub fn post(&self, key: Key) {
        *self.0.lock().unwrap() = key.bits();
    }

    /// Non-clearing look, for idle-state activity detection.
    pub fn peek(&self) -> Key {
        Key::from_bits(*self.0.lock().unwrap())
    }

    /// Read and clear.
    pub fn take(&self) -> Key {
        Key::from_bits(std::mem::take(&mut *self.0.lock().unwrap()))
    }
}

/// Open every switch bank this build and config provide.
#[cfg(feature = "gpio")]
pub fn build_sources(cfg: &AppConfig) -> Result<Vec<Box<dyn SwitchSource>>> {
    let mut sources: Vec<Box<dyn SwitchSource>> =
        vec![Box::new(gpio::GpioSwitchBank::open(&cfg.pins, "keypad")?)];
    if let Some(rf) = &cfg.rf_pins {
        sources.push(Box::new(gpio::GpioSwitchBank::open(rf, "rf receiver")?));
    }
    for s in &sources {
        log::info!("[input] switch source: {}", s.name());
    }
    Ok(sources)
}

/// Without the `gpio` feature there are no switch banks; the network input
/// is the only way to press keys.
#[cfg(not(feature = "gpio"))]
pub fn build_sources(_cfg: &AppConfig) -> Result<Vec<Box<dyn SwitchSource>>> {
    log::info!("[input] built without gpio, network key input only");
    Ok(Vec::new())
}
