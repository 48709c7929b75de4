// src/input/gpio.rs  —  Raspberry Pi keypad switch banks (rppal)
//
// Each switch connects its BCM pin to ground; the internal pull-up is
// enabled, so an open switch reads high and a pressed one reads low.
// The RF receiver bank (when fitted) is wired the same way on its own pins
// and simply ORs onto the same six roles.
//
// Runtime permission: /dev/gpiomem, add the user to the `gpio` group.

use anyhow::{Context, Result};
use rppal::gpio::{Gpio, InputPin};

use crate::config::PinMap;

use super::{Key, SwitchSource};

pub struct GpioSwitchBank {
    pins:  Vec<(InputPin, Key)>,
    label: String,
}

impl GpioSwitchBank {
    pub fn open(map: &PinMap, label: &str) -> Result<Self> {
        let gpio = Gpio::new().context(
            "Opening GPIO. Check /dev/gpiomem permissions \
             (usermod -aG gpio $USER, then re-login)",
        )?;

        let roles = [
            (map.standby, Key::STANDBY),
            (map.auto,    Key::AUTO),
            (map.plus1,   Key::PLUS_1),
            (map.plus10,  Key::PLUS_10),
            (map.minus10, Key::MINUS_10),
            (map.minus1,  Key::MINUS_1),
        ];

        let mut pins = Vec::with_capacity(roles.len());
        for (bcm, role) in roles {
            let pin = gpio
                .get(bcm)
                .with_context(|| format!("Claiming GPIO {bcm} for the {label}"))?
                .into_input_pullup();
            pins.push((pin, role));
        }

        log::info!(
            "[input] {label} on BCM {}/{}/{}/{}/{}/{}",
            map.standby, map.auto, map.plus1, map.plus10, map.minus10, map.minus1
        );
        Ok(Self { pins, label: label.to_string() })
    }
}

impl SwitchSource for GpioSwitchBank {
    fn read(&mut self) -> Key {
        self.pins
            .iter()
            .filter(|(pin, _)| pin.is_low())
            .fold(Key::NONE, |acc, &(_, role)| acc | role)
    }

    fn name(&self) -> &str {
        &self.label
    }
}
