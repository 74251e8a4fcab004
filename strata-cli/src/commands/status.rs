//! `strata status` - show which migrations are applied.

use crate::context::CliContext;
use crate::error::CliResult;

/// Run the status command
pub fn run(ctx: &mut CliContext) -> CliResult<()> {
    let store = ctx.open_store()?;
    let statuses = ctx.runner.migration_status(&store)?;

    ctx.out.header("Migration Status")?;
    if statuses.is_empty() {
        ctx.out.info("No migrations found")?;
        return Ok(());
    }

    for status in &statuses {
        ctx.out.status_row(status)?;
    }

    let applied = statuses.iter().filter(|s| s.is_up()).count();
    ctx.out.newline()?;
    ctx.out.info(&format!(
        "{} applied, {} pending",
        applied,
        statuses.len() - applied
    ))?;
    Ok(())
}
