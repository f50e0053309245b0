//! Ascend Control - CLI for the learner progression engine
//!
//! Reads and updates one learner's snapshot and command journal.

use anyhow::Result;
use ascend_common::AscendConfig;
use ascendctl::cli::Cli;
use ascendctl::display::Palette;
use ascendctl::{commands, logging};
use clap::Parser;
use std::io::IsTerminal;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AscendConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging.level);

    let palette = Palette::new(!cli.no_color && std::io::stdout().is_terminal());
    let output = commands::run(cli, config, palette)?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
