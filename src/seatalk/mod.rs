// src/seatalk/mod.rs  —  SeaTalk datagram transmit path
//
// SeaTalk is a single-wire 4800 baud bus. Framing relies on the 9th bit:
// the first byte of every datagram is sent with the parity bit SET
// (a "command" byte), all following bytes with it CLEAR ("data" bytes).
// A keystroke from a remote handset is the four-byte datagram
//
//      86 11 KK ~KK        (KK = key code, ~KK = its fixed complement)
//
// Protocol reference: Thomas Knauf's SeaTalk pages.
//
// The serialport crate only exposes Even/Odd/None parity, so the 9th bit
// is produced per byte: pick Even or Odd so the parity bit the UART
// computes comes out as the wanted class bit. The port is flushed after
// every byte so a parity-mode change never clobbers a queued byte.

pub mod commands;

use std::io::{self, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};
use thiserror::Error;

use self::commands::Command;

/// Datagram lead-in: "keystroke sent from a remote controller".
const MARKER: u8 = 0x86;
const ATTENTION: u8 = 0x11;

const BAUD: u32 = 4800;
const WRITE_TIMEOUT: Duration = Duration::from_millis(250);

/// Class of a byte on the wire, encoded in the 9th (parity) bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    /// Datagram lead-in, parity bit set ("mark")
    Command,
    /// Everything after the lead-in, parity bit clear ("space")
    Data,
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("cannot open SeaTalk port {port}: {source}")]
    Open {
        port:   String,
        source: serialport::Error,
    },
    #[error("write to SeaTalk port {port} failed: {source}")]
    Write {
        port:   String,
        source: io::Error,
    },
}

/// Anything that can carry an autopilot keystroke.
/// The production implementation is [`SerialBus`]; tests record the stream.
pub trait CommandSink {
    fn send(&mut self, cmd: Command) -> Result<(), BusError>;
}

/// Byte-level port surface the framing layer writes against.
/// Kept minimal so tests can capture the exact (byte, class) sequence.
pub trait DatagramPort {
    fn write_byte(&mut self, byte: u8, class: ByteClass) -> Result<(), BusError>;
}

/// Pick the parity mode that makes the UART's parity bit equal the class bit.
///
/// Even parity emits a 1 when the data byte has an odd number of ones,
/// Odd parity the opposite. So: want a 1 (command byte) → Even iff the
/// byte's ones-count is odd; want a 0 (data byte) → the other way around.
fn parity_for(byte: u8, class: ByteClass) -> Parity {
    let ones_odd = byte.count_ones() % 2 == 1;
    let want_set = class == ByteClass::Command;
    if ones_odd == want_set { Parity::Even } else { Parity::Odd }
}

/// Write the full keystroke datagram through `port`.
/// One call is one exclusive bus transaction; it is never retried.
fn send_datagram(port: &mut dyn DatagramPort, cmd: Command) -> Result<(), BusError> {
    let [code, complement] = cmd.code();
    port.write_byte(MARKER, ByteClass::Command)?;
    port.write_byte(ATTENTION, ByteClass::Data)?;
    port.write_byte(code, ByteClass::Data)?;
    port.write_byte(complement, ByteClass::Data)?;
    Ok(())
}

// ── Serial implementation ─────────────────────────────────────────────────────

struct SerialDatagramPort {
    port: Box<dyn serialport::SerialPort>,
    path: String,
}

impl DatagramPort for SerialDatagramPort {
    fn write_byte(&mut self, byte: u8, class: ByteClass) -> Result<(), BusError> {
        let path = self.path.clone();
        let wrap = move |source: io::Error| BusError::Write {
            port: path.clone(),
            source,
        };
        self.port
            .set_parity(parity_for(byte, class))
            .map_err(io::Error::from)
            .map_err(&wrap)?;
        self.port.write_all(&[byte]).map_err(&wrap)?;
        // Drain before the next parity change touches the line settings.
        self.port.flush().map_err(&wrap)?;
        log::debug!("[bus] {byte:#04x} {class:?}");
        Ok(())
    }
}

/// Opens the device fresh for every keystroke and drops it afterwards,
/// so the bus handle is held only for the few milliseconds a datagram takes.
pub struct SerialBus {
    path: String,
}

impl SerialBus {
    pub fn new(path: &str) -> Self {
        Self { path: path.to_string() }
    }
}

impl CommandSink for SerialBus {
    fn send(&mut self, cmd: Command) -> Result<(), BusError> {
        let port = serialport::new(&self.path, BAUD)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|source| BusError::Open {
                port: self.path.clone(),
                source,
            })?;

        let mut port = SerialDatagramPort {
            port,
            path: self.path.clone(),
        };
        send_datagram(&mut port, cmd)?;
        log::info!("[bus] sent {cmd:?}");
        Ok(())
    }
}
