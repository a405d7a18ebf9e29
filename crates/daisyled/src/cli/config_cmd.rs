//! `config` subcommand: show current configuration and file path.

use super::{Config, ConfigOutput, Context, Result, kv, kv_indent, kv_width, led, print_json};

pub(super) fn cmd_config(ctx: &Context, config: Config) -> Result<()> {
    let config_path = ctx.config_path.clone().or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let errors: Vec<String> = match config.validate() {
        Ok(()) => Vec::new(),
        Err(errs) => errs.iter().map(|e| e.to_string()).collect(),
    };

    if ctx.json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
            errors,
        };
        return print_json(&output);
    }

    let w = kv_width(
        &["Config file:"],
        &[
            "bus_address:",
            "register_base:",
            "chain_length:",
            "swapped_units:",
            "default_duration_ms:",
            "default_color:",
        ],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    kv_indent("bus_address:", format_args!("0x{:02X}", config.bus_address), w);
    kv_indent(
        "register_base:",
        format_args!("0x{:02X}", config.register_base),
        w,
    );
    kv_indent("chain_length:", config.chain_length, w);
    let swapped = if config.swapped_units.is_empty() {
        "(none)".to_string()
    } else {
        config
            .swapped_units
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    kv_indent("swapped_units:", swapped, w);
    kv_indent("default_duration_ms:", config.default_duration_ms, w);
    let color_display = match led::parse_color(&config.default_color) {
        Ok(val) => format!("{} -> {}", config.default_color, led::format_color(val)),
        Err(_) => format!("{} (invalid)", config.default_color),
    };
    kv_indent("default_color:", color_display, w);

    if !errors.is_empty() {
        println!();
        println!("Problems:");
        for e in &errors {
            println!("  {e}");
        }
    }
    Ok(())
}
