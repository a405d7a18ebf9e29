//! Register layout and wire constants for the daisy-chained multicolor LED module.
//!
//! All offsets are relative to the per-unit register base. The module exposes
//! one contiguous register block:
//!
//! ```text
//! 0      channel R
//! 1      channel G   (B on swapped units)
//! 2      channel B   (G on swapped units)
//! 3      mode
//! 4      reset-timers / arm trigger
//! 5..8   color slot 1 (R, G, B; G/B swapped on swapped units)
//! 8..11  color slot 2
//! 11..15 time 1, u32 little-endian microseconds
//! 15..19 time 2, u32 little-endian microseconds
//! ```

use std::time::Duration;

// ── Register offsets ──

/// Live channel intensity, red.
pub const OFF_CHANNEL_R: u16 = 0;

/// Live channel intensity, green (blue on swapped units).
pub const OFF_CHANNEL_G: u16 = 1;

/// Live channel intensity, blue (green on swapped units).
pub const OFF_CHANNEL_B: u16 = 2;

/// Start of the configuration block: mode byte, then the arm byte.
pub const OFF_CONFIG: u16 = 3;

/// Reset-timers trigger. Written alongside the mode: 0 while disabling, 1 on activate.
pub const OFF_RESET_TIMERS: u16 = 4;

/// Color slot 1 (3 bytes).
pub const OFF_COLOR1: u16 = 5;

/// Color slot 2 (3 bytes).
pub const OFF_COLOR2: u16 = 8;

/// Time 1 (4 bytes, little-endian microseconds).
pub const OFF_TIME1: u16 = 11;

/// Time 2 (4 bytes, little-endian microseconds).
pub const OFF_TIME2: u16 = 15;

/// Bytes in the configuration block starting at [`OFF_CONFIG`]:
/// mode + arm + two color slots + two timings.
pub const CONFIG_BLOCK_LEN: usize = 2 + 3 + 3 + 4 + 4;

/// Total size of the register block.
pub const REGISTER_BLOCK_LEN: u16 = OFF_TIME2 + 4;

// ── Arm byte values ──

/// Arm byte written with the disable phase.
pub const ARM_DISARMED: u8 = 0;

/// Arm byte written with the activate phase.
pub const ARM_ACTIVE: u8 = 1;

// ── Mode byte values ──

pub const MODE_OFF: u8 = 0;
pub const MODE_CONSTANT: u8 = 1;
pub const MODE_BLINK_ONCE: u8 = 2;
pub const MODE_BLINK_REPEATING: u8 = 3;
pub const MODE_FADE_ONCE: u8 = 4;
pub const MODE_FADE_REPEATING: u8 = 5;
pub const MODE_BLINK_ONCE_NOTIFY: u8 = 6;
pub const MODE_BLINK_REPEATING_NOTIFY: u8 = 7;
pub const MODE_FADE_ONCE_NOTIFY: u8 = 8;
pub const MODE_FADE_REPEATING_NOTIFY: u8 = 9;

// ── Defaults ──

/// Duration used by blink/fade helpers that take no explicit interval.
pub const DEFAULT_DURATION: Duration = Duration::from_secs(1);
