use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::core::config;

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .context("config path is required")?;

    let dashboard = config::load(&path)?;

    eprintln!(
        "{} {} groups, {} tiles, {} slots",
        "config OK:".green().bold(),
        dashboard.groups.len(),
        dashboard.tile_count(),
        dashboard.slot_count()
    );
    Ok(())
}
