//! `strata migrate` - apply pending migrations.

use tracing::info;

use crate::cli::MigrateArgs;
use crate::context::CliContext;
use crate::error::CliResult;

/// Run the migrate command
pub fn run(ctx: &mut CliContext, args: MigrateArgs) -> CliResult<()> {
    ctx.out.header("Migrate")?;
    ctx.out.kv("Database", &ctx.connection.db_path)?;
    ctx.out.kv("Migrations", &ctx.migrations_dir.display().to_string())?;
    if let Some(target) = &args.to {
        ctx.out.kv("Target", target)?;
    }
    ctx.out.newline()?;

    let store = ctx.open_store()?;
    let result = match &args.to {
        Some(target) => ctx.runner.migrate_to(&store, target),
        None => ctx.runner.migrate(&store),
    };
    let report = match result {
        Ok(report) => report,
        Err(err) => {
            // Earlier steps stay committed; say how many are left.
            if let Ok(pending) = ctx.runner.pending_migration_identifiers(&store) {
                ctx.out
                    .info(&format!("Migration stopped, {} pending", pending.len()))?;
            }
            return Err(err.into());
        }
    };
    info!(applied = report.applied.len(), "Migrate command finished");

    for id in &report.applied {
        ctx.out.list_item(&format!("Applied {}", id))?;
    }
    if report.has_changes() {
        ctx.out.newline()?;
    }

    ctx.out
        .success(&format!("Migrations complete: {}", report.summary()))?;
    Ok(())
}
