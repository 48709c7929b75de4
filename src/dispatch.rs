// src/dispatch.rs  —  Key resolution, session mode, side effects
//
// Takes one decoded press, resolves it against the command table and the
// session mode, plays the buzzer pattern, transmits, and echoes the key to
// the mirror host. A bus failure drops the command (the operator presses
// again); nothing here retries.

use crate::config::LongPressFeedback;
use crate::feedback::{Annunciator, Pattern};
use crate::helm::Helm;
use crate::input::KeyPress;
use crate::mirror::MirrorNotifier;
use crate::seatalk::commands::Command;
use crate::seatalk::{BusError, CommandSink};

/// Session mode. SteeringIntoWind changes what the Auto key means: instead
/// of engaging the pilot it steers the stored wind offset back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    SteeringIntoWind,
}

pub struct Dispatcher {
    bus:      Box<dyn CommandSink>,
    helm:     Helm,
    feedback: Box<dyn Annunciator>,
    mirror:   Option<MirrorNotifier>,
    long_press_feedback: LongPressFeedback,
    mode:     Mode,
}

impl Dispatcher {
    pub fn new(
        bus:      Box<dyn CommandSink>,
        helm:     Helm,
        feedback: Box<dyn Annunciator>,
        mirror:   Option<MirrorNotifier>,
        long_press_feedback: LongPressFeedback,
    ) -> Self {
        Self {
            bus,
            helm,
            feedback,
            mirror,
            long_press_feedback,
            mode: Mode::Normal,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Handle one press cycle. `Err` means the bus dropped the command.
    pub fn handle(&mut self, press: &KeyPress) -> Result<(), BusError> {
        let key = press.key;
        let resolved = Command::for_key(key);

        // every decoded key is mirrored, resolved or not
        if let Some(m) = &self.mirror {
            m.notify(key);
        }

        let Some(cmd) = resolved else {
            log::debug!("[dispatch] unmapped key {}", key.bits());
            return Ok(());
        };

        match (cmd, self.mode) {
            // Track chord arms the wind maneuver rather than the pilot's
            // own track mode; the table code stays reserved for lookups.
            (Command::Track, Mode::Normal) => {
                self.chirp(press, Pattern::DoubleShort);
                self.mode = Mode::SteeringIntoWind;
                log::info!("[dispatch] steering into wind");
                self.helm.steer_into_wind(&mut *self.bus)
            }
            (Command::Track, Mode::SteeringIntoWind) => {
                log::info!("[dispatch] already steering into wind");
                Ok(())
            }
            (Command::Auto, Mode::SteeringIntoWind) => {
                self.chirp(press, Pattern::DoubleShort);
                self.mode = Mode::Normal;
                log::info!("[dispatch] steering previous wind angle");
                self.helm.steer_previous_angle(&mut *self.bus)
            }
            (Command::StandBy, _) => {
                // always drops back to normal, without any steering
                self.mode = Mode::Normal;
                self.chirp(press, Pattern::Long);
                self.bus.send(Command::StandBy)
            }
            (cmd, _) => {
                self.chirp(press, pattern_for(cmd));
                self.bus.send(cmd)
            }
        }
    }

    fn chirp(&mut self, press: &KeyPress, pattern: Pattern) {
        let pattern = if press.remapped && self.long_press_feedback == LongPressFeedback::Own {
            Pattern::Long
        } else {
            pattern
        };
        self.feedback.play(pattern);
    }
}

fn pattern_for(cmd: Command) -> Pattern {
    match cmd {
        Command::Auto | Command::Plus1 | Command::Minus1 => Pattern::Short,
        Command::StandBy | Command::Plus10 | Command::Minus10 => Pattern::Long,
        Command::Track
        | Command::TackPort
        | Command::TackStarboard
        | Command::ToggleSeastate => Pattern::DoubleShort,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::feedback::NullAnnunciator;
    use crate::helm::WindVane;
    use crate::input::{Key, PressKind};

    /// Sink whose transcript outlives the dispatcher that owns it.
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<Command>>>);

    impl SharedSink {
        fn sent(&self) -> Vec<Command> {
            self.0.lock().unwrap().clone()
        }
        fn clear(&self) {
            self.0.lock().unwrap().clear();
        }
    }

    impl CommandSink for SharedSink {
        fn send(&mut self, cmd: Command) -> Result<(), BusError> {
            self.0.lock().unwrap().push(cmd);
            Ok(())
        }
    }

    struct FixedVane(i32);

    impl WindVane for FixedVane {
        fn awa(&mut self) -> i32 {
            self.0
        }
    }

    fn short(bits: u8) -> KeyPress {
        KeyPress {
            key:      Key::from_bits(bits),
            kind:     PressKind::Short,
            remapped: false,
        }
    }

    fn dispatcher(awa: i32) -> (Dispatcher, SharedSink) {
        let sink = SharedSink::default();
        let helm = Helm::new(Box::new(FixedVane(awa)), Duration::ZERO);
        let d = Dispatcher::new(
            Box::new(sink.clone()),
            helm,
            Box::new(NullAnnunciator),
            None,
            LongPressFeedback::Remapped,
        );
        (d, sink)
    }

    #[test]
    fn track_then_auto_then_auto_again() {
        let (mut d, sink) = dispatcher(200);

        // Track chord: into wind mode, -160 steered out as 16 tens
        d.handle(&short(24)).unwrap();
        assert_eq!(d.mode(), Mode::SteeringIntoWind);
        assert_eq!(sink.sent(), vec![Command::Minus10; 16]);

        // Auto while steering into wind: reverse, back to normal
        sink.clear();
        d.handle(&short(2)).unwrap();
        assert_eq!(d.mode(), Mode::Normal);
        assert_eq!(sink.sent(), vec![Command::Plus10; 16]);

        // Auto again: plain Auto command
        sink.clear();
        d.handle(&short(2)).unwrap();
        assert_eq!(sink.sent(), vec![Command::Auto]);
    }

    #[test]
    fn standby_cancels_wind_mode_without_steering() {
        let (mut d, sink) = dispatcher(90);
        d.handle(&short(24)).unwrap();
        assert_eq!(d.mode(), Mode::SteeringIntoWind);

        sink.clear();
        d.handle(&short(1)).unwrap();
        assert_eq!(d.mode(), Mode::Normal);
        assert_eq!(sink.sent(), vec![Command::StandBy]);
    }

    #[test]
    fn track_chord_is_inert_while_already_steering() {
        let (mut d, sink) = dispatcher(90);
        d.handle(&short(24)).unwrap();
        sink.clear();
        d.handle(&short(24)).unwrap();
        assert!(sink.sent().is_empty());
        assert_eq!(d.mode(), Mode::SteeringIntoWind);
    }

    #[test]
    fn unmapped_key_transmits_nothing() {
        let (mut d, sink) = dispatcher(0);
        d.handle(&short(5)).unwrap();
        d.handle(&short(0)).unwrap();
        assert!(sink.sent().is_empty());
        assert_eq!(d.mode(), Mode::Normal);
    }

    #[test]
    fn plain_keys_pass_through_in_any_mode() {
        let (mut d, sink) = dispatcher(90);
        d.handle(&short(12)).unwrap();
        assert_eq!(sink.sent(), vec![Command::TackStarboard]);

        sink.clear();
        d.handle(&short(24)).unwrap(); // into wind mode
        sink.clear();
        d.handle(&short(36)).unwrap();
        assert_eq!(sink.sent(), vec![Command::ToggleSeastate]);
        assert_eq!(d.mode(), Mode::SteeringIntoWind);
    }

    #[test]
    fn remapped_long_press_sends_the_remapped_command() {
        let (mut d, sink) = dispatcher(0);
        let press = KeyPress {
            key:      Key::PLUS_10,
            kind:     PressKind::Long,
            remapped: true,
        };
        d.handle(&press).unwrap();
        assert_eq!(sink.sent(), vec![Command::Plus10]);
    }
}
