// src/helm.rs  —  Closed-loop heading-offset steering
//
// The course computer only understands ±1 and ±10 keystrokes, so any target
// offset is walked down greedily: tens while ten or more degrees remain,
// ones for the rest. Each keystroke is paced so the pilot has time to act
// on it before the next one lands on the bus.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::seatalk::commands::Command;
use crate::seatalk::{BusError, CommandSink};

/// Source of the apparent wind angle, degrees [0,360).
/// Read failures fall back to 0.
pub trait WindVane: Send {
    fn awa(&mut self) -> i32;
}

/// Reads the angle from a file maintained by the instrument decoder.
pub struct FileWindVane {
    path: PathBuf,
}

impl FileWindVane {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl WindVane for FileWindVane {
    fn awa(&mut self) -> i32 {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("[helm] no wind angle at {}: {e}", self.path.display());
                return 0;
            }
        };
        match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("[helm] unparseable wind angle {raw:?}");
                0
            }
        }
    }
}

/// Fold an absolute bearing into a signed port/starboard offset.
pub fn normalize_angle(awa: i32) -> i32 {
    (awa + 180).rem_euclid(360) - 180
}

pub struct Helm {
    vane: Box<dyn WindVane>,
    /// Delay between the keystrokes of one steering sequence
    pace: Duration,
    /// Offset applied by the last steer-into-wind, for reversing it
    previous_angle: i32,
}

impl Helm {
    pub fn new(vane: Box<dyn WindVane>, pace: Duration) -> Self {
        Self { vane, pace, previous_angle: 0 }
    }

    /// Walk `target` degrees of heading change down to zero, one keystroke
    /// at a time. Runs to convergence; a bus error aborts the remainder.
    pub fn steer_to_offset(&mut self, bus: &mut dyn CommandSink, target: i32) -> Result<(), BusError> {
        let mut offset = target;
        while offset != 0 {
            let (cmd, step) = if offset <= -10 {
                (Command::Minus10, -10)
            } else if offset < 0 {
                (Command::Minus1, -1)
            } else if offset < 10 {
                (Command::Plus1, 1)
            } else {
                (Command::Plus10, 10)
            };
            bus.send(cmd)?;
            offset -= step;
            log::debug!("[helm] {step:+}, {offset:+} to go");
            if offset != 0 {
                thread::sleep(self.pace);
            }
        }
        Ok(())
    }

    /// Turn onto the apparent wind: read the vane, fold the bearing into a
    /// signed offset, remember it, steer it out.
    pub fn steer_into_wind(&mut self, bus: &mut dyn CommandSink) -> Result<(), BusError> {
        let awa = self.vane.awa();
        let offset = normalize_angle(awa);
        self.previous_angle = offset;
        log::info!("[helm] steer into wind: awa={awa} offset={offset:+}");
        self.steer_to_offset(bus, offset)
    }

    /// Undo the last steer-into-wind by steering the stored offset back.
    pub fn steer_previous_angle(&mut self, bus: &mut dyn CommandSink) -> Result<(), BusError> {
        let back = -self.previous_angle;
        log::info!("[helm] steer back {back:+}");
        self.steer_to_offset(bus, back)
    }
}
