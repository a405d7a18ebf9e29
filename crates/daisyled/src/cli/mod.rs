//! CLI subcommands: drive one unit of a simulated chain and show its register traffic.

mod action;
mod config_cmd;
mod state;
mod status;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Args, Subcommand};
use serde::Serialize;

pub(super) use daisyled_lib::DaisyledError;
pub(super) use daisyled_lib::bus::mock::{MockBus, MockChain};
pub(super) use daisyled_lib::chain::{ChainRegistry, discover_chain};
pub(super) use daisyled_lib::config::Config;
pub(super) use daisyled_lib::error::Result;
pub(super) use daisyled_lib::led::{self, Channel, Color, MulticolorLed, UnitState};

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    println!("{text}");
    Ok(())
}

/// Space-separated uppercase hex, e.g. `00 FF 10`.
pub(super) fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct WriteJson {
    pub register: u16,
    pub bytes: Vec<u8>,
}

#[derive(Serialize)]
pub(super) struct UnitOutput {
    pub bus_address: u8,
    pub unit: u32,
    pub swapped: bool,
    pub writes: Vec<WriteJson>,
    pub state: UnitState,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
    pub errors: Vec<String>,
}

// ── Commands ──

/// Options shared by `blink` and `fade`.
#[derive(Args, Debug, Clone)]
pub struct AnimationArgs {
    /// Color (hex or name; default from config)
    pub color: Option<Color>,
    /// First interval in milliseconds (default from config)
    #[arg(long)]
    pub duration_ms: Option<u64>,
    /// Second color (default: black)
    #[arg(long)]
    pub end: Option<Color>,
    /// Repeat forever instead of running once
    #[arg(long)]
    pub repeat: bool,
    /// Second interval in milliseconds, repeating only (default: same as --duration-ms)
    #[arg(long, requires = "repeat")]
    pub end_duration_ms: Option<u64>,
    /// Do not arm the completion interrupt (once only)
    #[arg(long, conflicts_with = "repeat")]
    pub no_notify: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show a steady color, replacing any animation
    Steady {
        /// Color (hex or name)
        color: Color,
    },

    /// Turn the unit off (steady black)
    Off,

    /// Blink once or repeatedly
    Blink(AnimationArgs),

    /// Fade once or repeatedly
    Fade(AnimationArgs),

    /// Set one channel's intensity, keeping any running animation
    Channel {
        /// r, g or b
        channel: Channel,
        /// Intensity; values outside 0-255 are clamped
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },

    /// Set one channel to full intensity
    Add {
        /// r, g or b
        channel: Channel,
    },

    /// Set one channel to zero
    Remove {
        /// r, g or b
        channel: Channel,
    },

    /// Show the decoded state of the selected unit
    Status,

    /// Raise the selected unit's completion interrupt and report who was notified
    Interrupt,

    /// Show current configuration and file path
    Config,
}

/// Global options every command needs.
pub struct Context {
    pub json: bool,
    pub unit: u32,
    pub config_path: Option<PathBuf>,
    /// Register snapshot carried between invocations; `None` starts every unit Off.
    pub state_path: Option<PathBuf>,
}

/// Load config from `custom` or the platform path, logging parse warnings.
pub(super) fn load_config(custom: Option<&Path>) -> Config {
    let (config, warnings) = match custom {
        Some(path) => Config::load_from(path),
        None => Config::load_with_warnings(),
    };
    for w in &warnings {
        log::warn!("{w}");
    }
    config
}

/// A discovered simulated chain plus the bus handles behind it.
pub(super) struct SimulatedChain {
    pub chain: MockChain,
    pub units: Vec<MulticolorLed<Rc<MockBus>>>,
    pub bus_address: u8,
}

impl SimulatedChain {
    /// Build and enumerate a chain shaped by `config`, restoring registers from `state`.
    pub fn discover(config: &Config, state: Option<&Path>) -> Result<Self> {
        if let Err(errors) = config.validate() {
            let joined = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(DaisyledError::Config(joined));
        }
        let mut chain = MockChain::new(config.chain_length);
        if let Some(path) = state {
            state::restore(path, config, &chain)?;
        }
        let units = discover_chain(
            ChainRegistry::global(),
            &mut chain,
            config.bus_address,
            &config.chain_layout(),
        )?;
        Ok(SimulatedChain {
            chain,
            units,
            bus_address: config.bus_address,
        })
    }

    pub fn unit(&self, position: u32) -> Result<&MulticolorLed<Rc<MockBus>>> {
        self.units.get(position as usize).ok_or_else(|| {
            DaisyledError::Config(format!(
                "unit {position} is not on the chain ({} unit{})",
                self.units.len(),
                if self.units.len() == 1 { "" } else { "s" }
            ))
        })
    }

    /// Persist every unit's register block to `state`, if one was given.
    pub fn save(&self, config: &Config, state: Option<&Path>) -> Result<()> {
        match state {
            Some(path) => state::save(path, config, &self.chain),
            None => Ok(()),
        }
    }

    /// Writes recorded on `position` so far, in order.
    pub fn writes(&self, position: u32) -> Vec<WriteJson> {
        self.chain
            .units
            .get(position as usize)
            .map(|bus| {
                bus.writes
                    .borrow()
                    .iter()
                    .map(|(register, bytes)| WriteJson {
                        register: *register,
                        bytes: bytes.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub fn run(cmd: Command, ctx: &Context) -> Result<()> {
    let config = load_config(ctx.config_path.as_deref());
    match cmd {
        Command::Config => config_cmd::cmd_config(ctx, config),
        Command::Status => status::cmd_status(ctx, &config),
        Command::Interrupt => status::cmd_interrupt(ctx, &config),
        Command::Steady { color } => action::run_action(ctx, &config, |led| {
            led.set_steady_color(color)
        }),
        Command::Off => action::run_action(ctx, &config, |led| led.turn_off()),
        Command::Blink(args) => {
            let animation = action::build_animation(led::Effect::Blink, &args, &config)?;
            action::run_action(ctx, &config, |led| led.play(&animation))
        }
        Command::Fade(args) => {
            let animation = action::build_animation(led::Effect::Fade, &args, &config)?;
            action::run_action(ctx, &config, |led| led.play(&animation))
        }
        Command::Channel { channel, value } => action::run_action(ctx, &config, |led| {
            led.set_channel_clamped(channel, value)
        }),
        Command::Add { channel } => {
            action::run_action(ctx, &config, |led| led.add_channel(channel))
        }
        Command::Remove { channel } => {
            action::run_action(ctx, &config, |led| led.remove_channel(channel))
        }
    }
}
