//! daisyled: glitch-free command encoding for daisy-chained multicolor LED modules.

pub mod bus;
pub mod chain;
pub mod config;
pub mod error;
pub mod led;
pub mod protocol;

pub use error::DaisyledError;
