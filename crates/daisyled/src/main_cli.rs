//! daisyled CLI: drive daisy-chained multicolor LED units and inspect their registers.
//!
//! Commands run against a simulated chain shaped by the config file; pass
//! `--state` to carry register contents from one invocation to the next.

use std::path::PathBuf;

use clap::Parser;

mod cli;

#[derive(Parser)]
#[command(
    name = "daisyled-cli",
    version,
    about = "Command encoder for daisy-chained multicolor LED units"
)]
struct Args {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log register traffic to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Register snapshot file, created if missing
    #[arg(long, global = true, value_name = "PATH")]
    state: Option<PathBuf>,

    /// Chain position of the unit to address (0 = nearest the host)
    #[arg(long, global = true, default_value_t = 0)]
    unit: u32,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let ctx = cli::Context {
        json: args.json,
        unit: args.unit,
        config_path: args.config,
        state_path: args.state,
    };

    if let Err(e) = cli::run(args.command, &ctx) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
