// src/seatalk/commands.rs  —  Keystroke command codes
//
// Each keypad action maps to a fixed (code, complement) byte pair in the
// 86 11 KK ~KK keystroke datagram. The pairs are opaque protocol constants;
// nothing here computes the complement.

use crate::input::Key;

/// One discrete autopilot instruction of the ST2000-class course computer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StandBy,
    Auto,
    Plus1,
    Plus10,
    Minus10,
    Minus1,
    /// Follow the programmed track (-10 & +10 together)
    Track,
    /// Tack through the wind to port (-1 & -10 together)
    TackPort,
    /// Tack through the wind to starboard (+1 & +10 together)
    TackStarboard,
    /// Toggle the automatic seastate response (+1 & -1 together)
    ToggleSeastate,
}

impl Command {
    /// The (code, complement) pair sent after the 86 11 lead-in.
    pub fn code(self) -> [u8; 2] {
        match self {
            Command::StandBy        => [0x02, 0xFD],
            Command::Auto           => [0x01, 0xFE],
            Command::Plus1          => [0x07, 0xF8],
            Command::Plus10         => [0x08, 0xF7],
            Command::Minus10        => [0x06, 0xF9],
            Command::Minus1         => [0x05, 0xFA],
            Command::Track          => [0x28, 0xD7],
            Command::TackPort       => [0x21, 0xDE],
            Command::TackStarboard  => [0x22, 0xDD],
            Command::ToggleSeastate => [0x20, 0xDF],
        }
    }

    /// Resolve a decoded key (single switch or combination) to its command.
    /// Unlisted combinations are wiring glitches and resolve to nothing.
    pub fn for_key(key: Key) -> Option<Command> {
        match key {
            Key::STANDBY => Some(Command::StandBy),
            Key::AUTO    => Some(Command::Auto),
            Key::PLUS_1  => Some(Command::Plus1),
            Key::PLUS_10 => Some(Command::Plus10),
            Key::MINUS_10 => Some(Command::Minus10),
            Key::MINUS_1  => Some(Command::Minus1),
            Key::TRACK          => Some(Command::Track),
            Key::TACK_PORT      => Some(Command::TackPort),
            Key::TACK_STARBOARD => Some(Command::TackStarboard),
            Key::TOGGLE_SEASTATE => Some(Command::ToggleSeastate),
            _ => None,
        }
    }
}

/// CLI spelling (--send) of the same commands.
impl From<crate::config::KeyCommand> for Command {
    fn from(k: crate::config::KeyCommand) -> Command {
        use crate::config::KeyCommand as K;
        match k {
            K::Standby        => Command::StandBy,
            K::Auto           => Command::Auto,
            K::Plus1          => Command::Plus1,
            K::Plus10         => Command::Plus10,
            K::Minus10        => Command::Minus10,
            K::Minus1         => Command::Minus1,
            K::Track          => Command::Track,
            K::TackPort       => Command::TackPort,
            K::TackStarboard  => Command::TackStarboard,
            K::ToggleSeastate => Command::ToggleSeastate,
        }
    }
}
