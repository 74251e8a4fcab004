//! `strata verify` - run the post-migration checks on their own.

use crate::context::CliContext;
use crate::error::CliResult;

/// Run the verify command
pub fn run(ctx: &mut CliContext) -> CliResult<()> {
    ctx.out.header("Verify")?;

    let store = ctx.open_store()?;
    ctx.runner.run_post_migration_checks(&store)?;

    let required = ctx.runner.config().required_indexes.len();
    if required > 0 {
        ctx.out.kv("Required indexes", &required.to_string())?;
    }
    ctx.out.success("Schema verification passed")?;
    Ok(())
}
