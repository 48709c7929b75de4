// src/feedback.rs  —  Audible operator feedback (piezo buzzer)

/// The three feedback patterns the handset knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// 100 ms pulse: single-degree keys and Auto
    Short,
    /// 200 ms pulse: ten-degree keys and StandBy
    Long,
    /// two short pulses: chords and steering maneuvers
    DoubleShort,
}

pub trait Annunciator: Send {
    fn play(&mut self, pattern: Pattern);
}

/// Stands in when no buzzer is fitted or the build has no gpio support.
pub struct NullAnnunciator;

impl Annunciator for NullAnnunciator {
    fn play(&mut self, pattern: Pattern) {
        log::debug!("[feedback] {pattern:?}");
    }
}

#[cfg(feature = "gpio")]
pub use buzzer::GpioBuzzer;

#[cfg(feature = "gpio")]
mod buzzer {
    use std::thread;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use rppal::gpio::{Gpio, OutputPin};

    use super::*;

    const SHORT: Duration = Duration::from_millis(100);
    const LONG:  Duration = Duration::from_millis(200);
    const GAP:   Duration = Duration::from_millis(100);

    pub struct GpioBuzzer {
        pin: OutputPin,
    }

    impl GpioBuzzer {
        pub fn open(bcm: u8) -> Result<Self> {
            let pin = Gpio::new()
                .context("Opening GPIO for the buzzer")?
                .get(bcm)
                .with_context(|| format!("Claiming GPIO {bcm} for the buzzer"))?
                .into_output_low();
            Ok(Self { pin })
        }

        fn pulse(&mut self, on: Duration) {
            self.pin.set_high();
            thread::sleep(on);
            self.pin.set_low();
        }
    }

    impl Annunciator for GpioBuzzer {
        fn play(&mut self, pattern: Pattern) {
            match pattern {
                Pattern::Short => self.pulse(SHORT),
                Pattern::Long  => self.pulse(LONG),
                Pattern::DoubleShort => {
                    self.pulse(SHORT);
                    thread::sleep(GAP);
                    self.pulse(SHORT);
                }
            }
        }
    }
}

/// Buzzer when configured and compiled in, otherwise the null device.
pub fn build_annunciator(cfg: &crate::config::AppConfig) -> Box<dyn Annunciator> {
    #[cfg(feature = "gpio")]
    if let Some(bcm) = cfg.buzzer_pin {
        match GpioBuzzer::open(bcm) {
            Ok(b) => return Box::new(b),
            Err(e) => log::warn!("[feedback] buzzer disabled: {e:#}"),
        }
    }
    #[cfg(not(feature = "gpio"))]
    let _ = cfg;
    Box::new(NullAnnunciator)
}
