//! LED control: color model, display modes, and the per-unit command encoder.

mod color;
mod encoder;
mod listeners;
mod mode;

pub use color::{Channel, Color, clamp_intensity, format_color, parse_color};
pub use encoder::{MulticolorLed, activate_block, disable_block};
pub use listeners::{AnimationFinished, ListenerId};
pub use mode::{Animation, DisplayMode, Effect, Repeat, TimingInterval, UnitState};
