//! Projects command for listing the configured seed projects.

use std::io::Write;

use anyhow::{Context, Result};
use tally_core::ProjectCatalog;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, json: bool) -> Result<()> {
    let catalog =
        ProjectCatalog::seeded(&config.projects).context("invalid project in configuration")?;

    if json {
        let names: Vec<&str> = catalog.iter().map(|p| p.name()).collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&names)?)?;
        return Ok(());
    }

    if catalog.is_empty() {
        writeln!(writer, "No projects configured.")?;
        return Ok(());
    }

    writeln!(writer, "Projects:")?;
    for (position, project) in catalog.iter().enumerate() {
        writeln!(writer, "{:>3}. {}", position + 1, project.name())?;
    }

    Ok(())
}
