//! Commands that change a unit: steady, off, blink, fade, channel edits.

use std::rc::Rc;
use std::time::Duration;

use super::*;
use daisyled_lib::led::{Animation, Effect, parse_color};

/// Resolve `args` against config defaults into a concrete animation.
pub(super) fn build_animation(
    effect: Effect,
    args: &AnimationArgs,
    config: &Config,
) -> Result<Animation> {
    let color = match args.color {
        Some(c) => c,
        None => parse_color(&config.default_color)?,
    };
    let duration = args
        .duration_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.default_duration());
    let end = args.end.unwrap_or(Color::BLACK);

    if args.repeat {
        let end_duration = args
            .end_duration_ms
            .map(Duration::from_millis)
            .unwrap_or(duration);
        Ok(Animation::repeating(effect, color, duration, end, end_duration))
    } else {
        Ok(Animation::once(effect, color, duration)
            .ending_on(end)
            .with_notify(!args.no_notify))
    }
}

/// Discover the chain, apply `op` to the selected unit, then report what was written.
pub(super) fn run_action(
    ctx: &Context,
    config: &Config,
    op: impl FnOnce(&MulticolorLed<Rc<MockBus>>) -> daisyled_lib::bus::Result<()>,
) -> Result<()> {
    let state_path = ctx.state_path.as_deref();
    let sim = SimulatedChain::discover(config, state_path)?;
    let led = sim.unit(ctx.unit)?;

    op(led)?;
    let state = led.read_state()?;
    sim.save(config, state_path)?;

    let output = UnitOutput {
        bus_address: sim.bus_address,
        unit: ctx.unit,
        swapped: led.is_swapped(),
        writes: sim.writes(ctx.unit),
        state,
    };
    if ctx.json {
        return print_json(&output);
    }
    print_unit_output(&output);
    Ok(())
}

fn print_unit_output(output: &UnitOutput) {
    let w = kv_width(
        &["Unit:", "Swapped:", "Writes:", "State:"],
        &["0x00", "Color 1:"],
    );
    kv(
        "Unit:",
        format!("{} (bus 0x{:02X})", output.unit, output.bus_address),
        w,
    );
    kv("Swapped:", if output.swapped { "yes" } else { "no" }, w);
    println!("Writes:");
    for write in &output.writes {
        kv_indent(
            &format!("0x{:02X}", write.register),
            hex_bytes(&write.bytes),
            w,
        );
    }
    println!("State:");
    super::status::print_state(&output.state, w);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> AnimationArgs {
        AnimationArgs {
            color: None,
            duration_ms: None,
            end: None,
            repeat: false,
            end_duration_ms: None,
            no_notify: false,
        }
    }

    #[test]
    fn once_uses_config_defaults() {
        let config = Config {
            default_color: "cyan".into(),
            default_duration_ms: 250,
            ..Config::default()
        };
        let a = build_animation(Effect::Blink, &args(), &config).unwrap();
        assert_eq!(a.mode(), led::DisplayMode::BlinkOnceNotify);
        assert_eq!(a.color1, Color::new(0, 255, 255));
        assert_eq!(a.time1.as_micros(), 250_000);
        assert_eq!(a.color2, Color::BLACK);
        assert_eq!(a.time2.as_micros(), 0);
    }

    #[test]
    fn once_without_notify() {
        let a = build_animation(
            Effect::Fade,
            &AnimationArgs {
                no_notify: true,
                end: Some(Color::BLUE),
                ..args()
            },
            &Config::default(),
        )
        .unwrap();
        assert_eq!(a.mode(), led::DisplayMode::FadeOnce);
        assert_eq!(a.color2, Color::BLUE);
    }

    #[test]
    fn repeating_second_interval_defaults_to_first() {
        let a = build_animation(
            Effect::Fade,
            &AnimationArgs {
                color: Some(Color::RED),
                duration_ms: Some(400),
                repeat: true,
                ..args()
            },
            &Config::default(),
        )
        .unwrap();
        assert_eq!(a.mode(), led::DisplayMode::FadeRepeating);
        assert_eq!(a.time1, a.time2);
        assert_eq!(a.time2.as_micros(), 400_000);
    }

    #[test]
    fn invalid_default_color_is_reported() {
        let config = Config {
            default_color: "nope".into(),
            ..Config::default()
        };
        assert!(build_animation(Effect::Blink, &args(), &config).is_err());
    }
}
