use std::process;

use chipotle8::window::MiniFbFrontend;
use chipotle8::{logger, Args, Config, Emulator, Result, Runner};
use clap::Parser;
use slog::{info, o};

fn main() {
    // invalid invocations exit with clap's usage error
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("chipotle8: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = Config::load(args.config.as_deref())?.merge_args(args)?;
    let logger = logger::terminal(config.log_level)?;

    let mut emulator = Emulator::with_game_file(&args.rom, Some(logger.clone()))?;
    let mut window = MiniFbFrontend::new(
        "Chip 8 Emulator (In Rust!)",
        &config,
        logger.new(o!("component" => "window")),
    )?;

    let stats = Runner::new(&config, Some(logger.clone()))?.run(&mut emulator, &mut window)?;
    info!(logger, "exiting"; "steps" => stats.steps, "frames" => stats.frames);
    Ok(())
}
