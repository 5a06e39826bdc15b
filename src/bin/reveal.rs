//! reveal - play a progressive-disclosure page in the terminal.
//!
//! Usage:
//!   reveal                         Play the intro preset
//!   reveal --page features         Play a bundled preset
//!   reveal --page ./page.json      Play a page script from disk
//!   reveal --list                  List bundled presets
//!   reveal --page intro --dump     Print a script as JSON

use std::path::PathBuf;

use clap::Parser;

use spark_reveal::config::EngineConfig;
use spark_reveal::logging::init_logging;
use spark_reveal::page::{preset_names, resolve_script, Page};
use spark_reveal::renderer::{Exit, TerminalHost};
use spark_reveal::state::motion::install_motion_query;
use spark_reveal::state::typewriter::DEFAULT_SPEED_MS;
use spark_reveal::types::TrackerOptions;

#[derive(Parser)]
#[command(
    name = "reveal",
    about = "Typewriter and scroll-reveal pages in the terminal",
    version
)]
struct Cli {
    /// Preset name or path to a page script (JSON)
    #[arg(short, long, default_value = "intro")]
    page: String,

    /// Milliseconds per character (overrides the page script)
    #[arg(short, long)]
    speed: Option<u64>,

    /// Skip all animation
    #[arg(long)]
    reduced_motion: bool,

    /// Log filter, e.g. "debug" or "spark_reveal=trace" (logs go to stderr)
    #[arg(long)]
    log_level: Option<String>,

    /// Engine config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List bundled presets and exit
    #[arg(long)]
    list: bool,

    /// Print the resolved page script as JSON and exit
    #[arg(long)]
    dump: bool,
}

fn main() -> spark_reveal::Result<()> {
    let cli = Cli::parse();

    let mut config = EngineConfig::load_or_default(cli.config.as_deref()).with_env_overrides();
    if cli.reduced_motion {
        config.reduced_motion = Some(true);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging);

    if cli.list {
        for name in preset_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut script = resolve_script(&cli.page)?;

    // Flag beats config/env, which beat the script
    let speed = cli
        .speed
        .or((config.speed_ms != DEFAULT_SPEED_MS).then_some(config.speed_ms));
    if let Some(speed) = speed {
        script = script.with_speed(speed);
    }
    if config.tracker != TrackerOptions::default() {
        script.reveal = config.tracker;
    }

    if cli.dump {
        println!("{}", script.to_json()?);
        return Ok(());
    }

    install_motion_query(config.motion_query());
    tracing::info!(page = %script.slug, speed_ms = script.speed_ms, "starting");

    let mut host = TerminalHost::new()?;
    let page = Page::new(script)?;
    let exit = host.run(&page)?;
    page.dispose();

    match exit {
        Exit::Navigated(route) => println!("→ {route}"),
        Exit::Quit => tracing::info!("quit"),
    }
    Ok(())
}
