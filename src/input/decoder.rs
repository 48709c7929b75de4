// src/input/decoder.rs  —  Debounce + short/long press state machine
//
// One press cycle:
//   idle      poll until any switch closes or a network key is pending
//   settle    wait once for a near-simultaneous second contact / bounce
//   assemble  OR all switch banks with the pending network key (slot cleared)
//   held      while any switch stays closed; past the threshold the press
//             turns Long and the +1/-1 remap is applied, exactly once
//   released  emit (key, kind) and go back to idle
//
// The network key takes part in assembly only: a key that arrives over the
// wire has no physical hold time, so it never extends a press into Long.

use std::thread;
use std::time::{Duration, Instant};

use super::{AuxSlot, Key, KeyPress, PressKind, SwitchSource};

#[derive(Debug, Clone, Copy)]
pub struct DebounceTiming {
    /// Idle/held poll interval
    pub poll:       Duration,
    /// One-shot wait between first contact and assembly
    pub settle:     Duration,
    /// Hold duration at which a press turns Long
    pub long_press: Duration,
}

impl DebounceTiming {
    pub fn from_config(cfg: &crate::config::AppConfig) -> Self {
        Self {
            poll:       Duration::from_millis(cfg.poll_ms),
            settle:     Duration::from_millis(cfg.settle_ms),
            long_press: Duration::from_millis(cfg.long_press_ms),
        }
    }
}

pub struct PressDecoder {
    sources: Vec<Box<dyn SwitchSource>>,
    aux:     AuxSlot,
    timing:  DebounceTiming,
}

impl PressDecoder {
    pub fn new(sources: Vec<Box<dyn SwitchSource>>, aux: AuxSlot, timing: DebounceTiming) -> Self {
        Self { sources, aux, timing }
    }

    /// Currently-closed switches across every bank.
    fn sample(&mut self) -> Key {
        self.sources
            .iter_mut()
            .fold(Key::NONE, |acc, s| acc | s.read())
    }

    /// Block until one full press cycle completes.
    pub fn next_press(&mut self) -> KeyPress {
        loop {
            // idle
            while self.sample().is_empty() && self.aux.peek().is_empty() {
                thread::sleep(self.timing.poll);
            }

            // settle
            thread::sleep(self.timing.settle);

            // assemble: the network slot is consumed here and only here
            let mut key = self.sample() | self.aux.take();
            if key.is_empty() {
                // contact opened again before assembly; nothing to report
                continue;
            }

            // held
            let pressed_at = Instant::now();
            let mut kind = PressKind::Short;
            let mut remapped = false;
            while !self.sample().is_empty() {
                if kind == PressKind::Short && pressed_at.elapsed() >= self.timing.long_press {
                    kind = PressKind::Long;
                    let long_key = remap_long(key);
                    remapped = long_key != key;
                    key = long_key;
                    log::debug!("[decoder] long press, key {}", key.bits());
                }
                thread::sleep(self.timing.poll);
            }

            // released
            return KeyPress { key, kind, remapped };
        }
    }
}

/// An extended +1 hold steps by ten; likewise -1. Everything else keeps its
/// meaning when held.
fn remap_long(key: Key) -> Key {
    match key {
        Key::PLUS_1  => Key::PLUS_10,
        Key::MINUS_1 => Key::MINUS_10,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed sequence of raw bitmasks, one per `read` call,
    /// then reads open forever.
    struct Script {
        frames: Vec<u8>,
        at:     usize,
    }

    impl Script {
        fn new(frames: &[u8]) -> Self {
            Self { frames: frames.to_vec(), at: 0 }
        }
    }

    impl SwitchSource for Script {
        fn read(&mut self) -> Key {
            let f = self.frames.get(self.at).copied().unwrap_or(0);
            self.at += 1;
            Key::from_bits(f)
        }
        fn name(&self) -> &str {
            "script"
        }
    }

    fn instant_timing() -> DebounceTiming {
        DebounceTiming {
            poll:       Duration::ZERO,
            settle:     Duration::ZERO,
            // far beyond what any scripted press can hold
            long_press: Duration::from_secs(60),
        }
    }

    fn decoder_for(scripts: Vec<Script>, timing: DebounceTiming) -> PressDecoder {
        let sources: Vec<Box<dyn SwitchSource>> =
            scripts.into_iter().map(|s| Box::new(s) as Box<dyn SwitchSource>).collect();
        PressDecoder::new(sources, AuxSlot::default(), timing)
    }

    #[test]
    fn single_key_short_press() {
        // idle sees 4, assembly samples 4, held loop sees release
        let mut dec = decoder_for(vec![Script::new(&[4, 4, 0])], instant_timing());
        let press = dec.next_press();
        assert_eq!(press.key, Key::PLUS_1);
        assert_eq!(press.kind, PressKind::Short);
        assert!(!press.remapped);
    }

    #[test]
    fn two_banks_assemble_commutatively() {
        let press_a = {
            let mut dec = decoder_for(
                vec![Script::new(&[8, 8, 0]), Script::new(&[16, 16, 0])],
                instant_timing(),
            );
            dec.next_press()
        };
        let press_b = {
            let mut dec = decoder_for(
                vec![Script::new(&[16, 16, 0]), Script::new(&[8, 8, 0])],
                instant_timing(),
            );
            dec.next_press()
        };
        assert_eq!(press_a.key.bits(), 24);
        assert_eq!(press_a, press_b);
    }

    #[test]
    fn network_key_merges_once_and_clears() {
        let aux = AuxSlot::default();
        aux.post(Key::AUTO);
        let mut dec = PressDecoder::new(
            vec![Box::new(Script::new(&[])) as Box<dyn SwitchSource>],
            aux.clone(),
            instant_timing(),
        );
        let press = dec.next_press();
        assert_eq!(press.key, Key::AUTO);
        // a wire-only key has no hold time
        assert_eq!(press.kind, PressKind::Short);
        assert_eq!(aux.peek(), Key::NONE);
    }

    #[test]
    fn network_key_ors_with_switches() {
        let aux = AuxSlot::default();
        aux.post(Key::MINUS_10);
        let mut dec = PressDecoder::new(
            vec![Box::new(Script::new(&[8, 8, 0])) as Box<dyn SwitchSource>],
            aux,
            instant_timing(),
        );
        assert_eq!(dec.next_press().key.bits(), 24);
    }

    #[test]
    fn held_press_turns_long_and_remaps_plus1() {
        let timing = DebounceTiming {
            poll:       Duration::from_millis(5),
            settle:     Duration::ZERO,
            long_press: Duration::from_millis(10),
        };
        // held well past the threshold (~10 polls at 5 ms)
        let mut frames = vec![4; 12];
        frames.push(0);
        let mut dec = decoder_for(vec![Script::new(&frames)], timing);
        let press = dec.next_press();
        assert_eq!(press.kind, PressKind::Long);
        assert_eq!(press.key, Key::PLUS_10);
        assert!(press.remapped);
    }

    #[test]
    fn held_minus10_turns_long_without_remap() {
        let timing = DebounceTiming {
            poll:       Duration::from_millis(5),
            settle:     Duration::ZERO,
            long_press: Duration::from_millis(10),
        };
        let mut frames = vec![16; 12];
        frames.push(0);
        let mut dec = decoder_for(vec![Script::new(&frames)], timing);
        let press = dec.next_press();
        assert_eq!(press.kind, PressKind::Long);
        assert_eq!(press.key, Key::MINUS_10);
        assert!(!press.remapped);
    }

    #[test]
    fn bounce_that_clears_before_assembly_is_ignored() {
        // active for the idle sample only, then a clean press later
        let mut dec = decoder_for(vec![Script::new(&[2, 0, 1, 1, 0])], instant_timing());
        let press = dec.next_press();
        assert_eq!(press.key, Key::STANDBY);
    }
}
