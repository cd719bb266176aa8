//! Run command: the interactive tracking session.

use std::io::Write;

use anyhow::{Context, Result};
use tally_core::ProjectCatalog;
use tokio::io::BufReader;

use crate::Config;
use crate::session::{self, Session};
use crate::ticker::IntervalScheduler;

/// Runs a session on stdin/stdout until input ends or the user quits.
pub fn run(config: &Config) -> Result<()> {
    let catalog =
        ProjectCatalog::seeded(&config.projects).context("invalid project in configuration")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let result = runtime.block_on(interactive(catalog));

    // A pending stdin read would otherwise hold shutdown until the next line.
    runtime.shutdown_background();
    result
}

async fn interactive(catalog: ProjectCatalog) -> Result<()> {
    let (scheduler, mut ticks) = IntervalScheduler::channel();
    let mut session = Session::new(scheduler, catalog);
    let input = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout().lock();

    writeln!(stdout, "tally: type 'help' for commands")?;
    tracing::debug!(projects = session.catalog().len(), "session started");
    session::run_loop(&mut session, input, &mut stdout, &mut ticks).await
}
