//! hueboard - play the computer keyboard, watch the chord's color
//!
//! Run with: cargo run [config.toml]

mod app;
mod ui;

use std::fs::File;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use env_logger::{Env, Target};

use app::Hueboard;
use hueboard::config::EngineConfig;

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let config = match std::env::args_os().nth(1) {
        Some(path) => EngineConfig::load(path).wrap_err("failed to load config")?,
        None => EngineConfig::default(),
    };
    init_logging(&config)?;

    Hueboard::new(config).run()
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging(config: &EngineConfig) -> EyreResult<()> {
    let file = File::create(&config.log_file)
        .wrap_err_with(|| format!("failed to create log file {}", config.log_file.display()))?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
