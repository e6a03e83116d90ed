mod bootstrap;
mod cli;
mod level_file;
mod loop_runner;
mod play;
mod render;

use std::env;
use std::io;
use std::process::ExitCode;

use tracing::{error, info};

use self::cli::Command;
use self::loop_runner::{FramePacer, RealtimePacer, SimulatedPacer};

const LOST_EXIT_CODE: u8 = 2;

pub(crate) fn run() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let command = match cli::parse_args(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}\n\n{}", cli::usage_text());
            return ExitCode::FAILURE;
        }
    };

    bootstrap::init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "=== Cubebot Startup ===");

    let mut stdout = io::stdout();
    match command {
        Command::Help => {
            println!("{}", cli::usage_text());
            ExitCode::SUCCESS
        }
        Command::Levels { progress_file } => {
            match play::list_levels(progress_file.as_deref(), &mut stdout) {
                Ok(()) => ExitCode::SUCCESS,
                Err(message) => {
                    error!(error = %message, "levels_failed");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Play(options) => {
            let config = bootstrap::build_loop_config(options.step_ms, options.instant);
            let mut pacer: Box<dyn FramePacer> = if options.instant {
                Box::new(SimulatedPacer)
            } else {
                Box::new(RealtimePacer::new())
            };
            match play::play(&options, &config, pacer.as_mut(), &mut stdout) {
                Ok(summary) if summary.outcome.is_won() => ExitCode::SUCCESS,
                Ok(_) => ExitCode::from(LOST_EXIT_CODE),
                Err(message) => {
                    error!(error = %message, "play_failed");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
