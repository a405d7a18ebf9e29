//! Display modes, timing encoding, and animation descriptions.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::color::Color;
use crate::protocol::*;

/// Mode byte written to [`OFF_CONFIG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Off,
    Constant,
    BlinkOnce,
    BlinkRepeating,
    FadeOnce,
    FadeRepeating,
    BlinkOnceNotify,
    BlinkRepeatingNotify,
    FadeOnceNotify,
    FadeRepeatingNotify,
}

impl DisplayMode {
    pub fn as_byte(self) -> u8 {
        match self {
            DisplayMode::Off => MODE_OFF,
            DisplayMode::Constant => MODE_CONSTANT,
            DisplayMode::BlinkOnce => MODE_BLINK_ONCE,
            DisplayMode::BlinkRepeating => MODE_BLINK_REPEATING,
            DisplayMode::FadeOnce => MODE_FADE_ONCE,
            DisplayMode::FadeRepeating => MODE_FADE_REPEATING,
            DisplayMode::BlinkOnceNotify => MODE_BLINK_ONCE_NOTIFY,
            DisplayMode::BlinkRepeatingNotify => MODE_BLINK_REPEATING_NOTIFY,
            DisplayMode::FadeOnceNotify => MODE_FADE_ONCE_NOTIFY,
            DisplayMode::FadeRepeatingNotify => MODE_FADE_REPEATING_NOTIFY,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            MODE_OFF => DisplayMode::Off,
            MODE_CONSTANT => DisplayMode::Constant,
            MODE_BLINK_ONCE => DisplayMode::BlinkOnce,
            MODE_BLINK_REPEATING => DisplayMode::BlinkRepeating,
            MODE_FADE_ONCE => DisplayMode::FadeOnce,
            MODE_FADE_REPEATING => DisplayMode::FadeRepeating,
            MODE_BLINK_ONCE_NOTIFY => DisplayMode::BlinkOnceNotify,
            MODE_BLINK_REPEATING_NOTIFY => DisplayMode::BlinkRepeatingNotify,
            MODE_FADE_ONCE_NOTIFY => DisplayMode::FadeOnceNotify,
            MODE_FADE_REPEATING_NOTIFY => DisplayMode::FadeRepeatingNotify,
            _ => return None,
        })
    }

    /// Whether the mode arms the completion interrupt.
    pub fn is_notify(self) -> bool {
        matches!(
            self,
            DisplayMode::BlinkOnceNotify
                | DisplayMode::BlinkRepeatingNotify
                | DisplayMode::FadeOnceNotify
                | DisplayMode::FadeRepeatingNotify
        )
    }

    /// Whether the unit will ever raise a completion interrupt in this mode.
    ///
    /// Repeating animations never finish, so their notify variants never fire.
    pub fn completes(self) -> bool {
        matches!(
            self,
            DisplayMode::BlinkOnceNotify | DisplayMode::FadeOnceNotify
        )
    }

    /// Anything other than `Off` and `Constant`.
    pub fn is_animated(self) -> bool {
        !matches!(self, DisplayMode::Off | DisplayMode::Constant)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayMode::Off => "off",
            DisplayMode::Constant => "constant",
            DisplayMode::BlinkOnce => "blink once",
            DisplayMode::BlinkRepeating => "blink repeating",
            DisplayMode::FadeOnce => "fade once",
            DisplayMode::FadeRepeating => "fade repeating",
            DisplayMode::BlinkOnceNotify => "blink once (notify)",
            DisplayMode::BlinkRepeatingNotify => "blink repeating (notify)",
            DisplayMode::FadeOnceNotify => "fade once (notify)",
            DisplayMode::FadeRepeatingNotify => "fade repeating (notify)",
        };
        f.write_str(name)
    }
}

// ── Timing ──

/// Duration as the unit stores it: whole microseconds in a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct TimingInterval(u32);

impl TimingInterval {
    pub const ZERO: TimingInterval = TimingInterval(0);

    pub fn from_micros(micros: u32) -> Self {
        TimingInterval(micros)
    }

    /// Truncates to whole microseconds; saturates at `u32::MAX` (about 71 minutes).
    pub fn from_duration(duration: Duration) -> Self {
        let micros = duration.as_micros();
        match u32::try_from(micros) {
            Ok(us) => TimingInterval(us),
            Err(_) => {
                log::warn!("interval {duration:?} exceeds the register range, saturating");
                TimingInterval(u32::MAX)
            }
        }
    }

    pub fn as_micros(self) -> u32 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_micros(u64::from(self.0))
    }

    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        TimingInterval(u32::from_le_bytes(bytes))
    }
}

impl From<Duration> for TimingInterval {
    fn from(d: Duration) -> Self {
        Self::from_duration(d)
    }
}

// ── Animations ──

/// Blink switches between the two slots; fade interpolates between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Blink,
    Fade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    /// Run one cycle; `notify` arms the completion interrupt.
    Once { notify: bool },
    Forever,
}

/// A two-slot animation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Animation {
    pub effect: Effect,
    pub repeat: Repeat,
    pub color1: Color,
    pub time1: TimingInterval,
    pub color2: Color,
    pub time2: TimingInterval,
}

impl Animation {
    /// One cycle of `color` for `duration`, ending on black, with completion notify.
    pub fn once(effect: Effect, color: Color, duration: Duration) -> Self {
        Animation {
            effect,
            repeat: Repeat::Once { notify: true },
            color1: color,
            time1: duration.into(),
            color2: Color::BLACK,
            time2: TimingInterval::ZERO,
        }
    }

    /// Endless alternation between two colors.
    pub fn repeating(
        effect: Effect,
        color1: Color,
        time1: Duration,
        color2: Color,
        time2: Duration,
    ) -> Self {
        Animation {
            effect,
            repeat: Repeat::Forever,
            color1,
            time1: time1.into(),
            color2,
            time2: time2.into(),
        }
    }

    /// Replace the second slot (once animations keep `time2` at zero).
    pub fn ending_on(mut self, color2: Color) -> Self {
        self.color2 = color2;
        self
    }

    /// Enable or disable the completion interrupt. No effect on repeating animations.
    pub fn with_notify(mut self, notify: bool) -> Self {
        if let Repeat::Once { .. } = self.repeat {
            self.repeat = Repeat::Once { notify };
        }
        self
    }

    pub fn mode(&self) -> DisplayMode {
        match (self.effect, self.repeat) {
            (Effect::Blink, Repeat::Once { notify: true }) => DisplayMode::BlinkOnceNotify,
            (Effect::Blink, Repeat::Once { notify: false }) => DisplayMode::BlinkOnce,
            (Effect::Blink, Repeat::Forever) => DisplayMode::BlinkRepeating,
            (Effect::Fade, Repeat::Once { notify: true }) => DisplayMode::FadeOnceNotify,
            (Effect::Fade, Repeat::Once { notify: false }) => DisplayMode::FadeOnce,
            (Effect::Fade, Repeat::Forever) => DisplayMode::FadeRepeating,
        }
    }
}

// ── Unit state ──

/// Decoded configuration block, as read back from a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitState {
    pub mode: DisplayMode,
    pub color1: Color,
    pub color2: Color,
    pub time1: TimingInterval,
    pub time2: TimingInterval,
}

impl UnitState {
    /// Decode a [`CONFIG_BLOCK_LEN`]-byte block read from [`OFF_CONFIG`].
    ///
    /// Returns `None` if the block is short or the mode byte is undefined.
    pub fn decode(block: &[u8], swapped: bool) -> Option<Self> {
        if block.len() < CONFIG_BLOCK_LEN {
            return None;
        }
        let slot = |off: u16| -> usize { (off - OFF_CONFIG) as usize };
        let color_at = |off: u16| {
            let i = slot(off);
            Color::from_wire([block[i], block[i + 1], block[i + 2]], swapped)
        };
        let time_at = |off: u16| {
            let i = slot(off);
            TimingInterval::from_le_bytes([block[i], block[i + 1], block[i + 2], block[i + 3]])
        };
        Some(UnitState {
            mode: DisplayMode::from_byte(block[0])?,
            color1: color_at(OFF_COLOR1),
            color2: color_at(OFF_COLOR2),
            time1: time_at(OFF_TIME1),
            time2: time_at(OFF_TIME2),
        })
    }
}
