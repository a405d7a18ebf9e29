use serde::Serialize;

use super::*;
use daisyled_lib::led::{AnimationFinished, DisplayMode};

#[derive(Serialize)]
struct StatusOutput {
    bus_address: u8,
    unit: u32,
    chain_length: usize,
    swapped: bool,
    state: UnitState,
}

#[derive(Serialize)]
struct InterruptOutput {
    unit: u32,
    mode: DisplayMode,
    completes: bool,
    events: Vec<AnimationFinished>,
}

/// Print a decoded block as indented key-values.
pub(super) fn print_state(state: &UnitState, w: usize) {
    kv_indent("Mode:", state.mode, w);
    kv_indent("Color 1:", state.color1, w);
    kv_indent("Time 1:", format!("{} us", state.time1.as_micros()), w);
    kv_indent("Color 2:", state.color2, w);
    kv_indent("Time 2:", format!("{} us", state.time2.as_micros()), w);
}

pub(super) fn cmd_status(ctx: &Context, config: &Config) -> Result<()> {
    let sim = SimulatedChain::discover(config, ctx.state_path.as_deref())?;
    let led = sim.unit(ctx.unit)?;
    let output = StatusOutput {
        bus_address: sim.bus_address,
        unit: ctx.unit,
        chain_length: sim.units.len(),
        swapped: led.is_swapped(),
        state: led.read_state()?,
    };

    if ctx.json {
        return print_json(&output);
    }

    let w = kv_width(&["Bus:", "Unit:", "Swapped:", "State:"], &["Color 1:"]);
    kv("Bus:", format!("0x{:02X}", output.bus_address), w);
    kv(
        "Unit:",
        format!("{} of {}", output.unit, output.chain_length),
        w,
    );
    kv("Swapped:", if output.swapped { "yes" } else { "no" }, w);
    println!("State:");
    print_state(&output.state, w);
    Ok(())
}

/// Simulate the unit's completion interrupt line and deliver it to a queued listener.
pub(super) fn cmd_interrupt(ctx: &Context, config: &Config) -> Result<()> {
    let state_path = ctx.state_path.as_deref();
    let mut sim = SimulatedChain::discover(config, state_path)?;
    sim.unit(ctx.unit)?;
    let led = &mut sim.units[ctx.unit as usize];

    let mode = led.read_mode()?;
    if !mode.completes() {
        log::warn!("unit {} is in mode \"{mode}\", which never raises completion", ctx.unit);
    }

    let events = led.subscribe_queued();
    led.on_animation_finished(|led| {
        log::info!("unit {}: completion interrupt handled", led.position());
    });
    led.handle_interrupt();

    let output = InterruptOutput {
        unit: ctx.unit,
        mode,
        completes: mode.completes(),
        events: events.try_iter().collect(),
    };

    if ctx.json {
        return print_json(&output);
    }

    let w = kv_width(&["Unit:", "Mode:", "Events:"], &[]);
    kv("Unit:", output.unit, w);
    kv("Mode:", output.mode, w);
    if output.events.is_empty() {
        kv("Events:", "none", w);
    } else {
        for event in &output.events {
            kv("Events:", event, w);
        }
    }
    Ok(())
}
