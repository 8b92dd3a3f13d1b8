use std::{env, io, process::ExitCode};

use log::{LevelFilter, error, warn};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

const LOG_ENV: &str = "AVLCOUNT_LOG";
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Warn;

fn init_logging() {
    let (level, rejected) = match env::var(LOG_ENV) {
        Ok(value) => match value.parse::<LevelFilter>() {
            Ok(level) => (level, None),
            Err(_) => (DEFAULT_LEVEL, Some(value)),
        },
        Err(_) => (DEFAULT_LEVEL, None),
    };
    // Only fails when a logger is already installed.
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
    if let Some(value) = rejected {
        warn!("ignoring {LOG_ENV}={value:?}, using {DEFAULT_LEVEL}");
    }
}

fn main() -> ExitCode {
    init_logging();
    match avlcount::command::run::<i64, _, _>(io::stdin().lock(), io::stdout().lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
