//! `strata rollback` - undo the most recently applied migrations.

use crate::cli::RollbackArgs;
use crate::context::CliContext;
use crate::error::CliResult;

/// Run the rollback command
pub fn run(ctx: &mut CliContext, args: RollbackArgs) -> CliResult<()> {
    ctx.out.header("Rollback")?;

    let store = ctx.open_store()?;
    let rolled_back = ctx.runner.rollback_migrations(&store, args.step)?;

    if rolled_back.is_empty() {
        ctx.out.info("Nothing to roll back")?;
        return Ok(());
    }

    for id in &rolled_back {
        ctx.out.list_item(&format!("Rolled back {}", id))?;
    }
    ctx.out.newline()?;
    ctx.out
        .success(&format!("Rolled back {} migration(s)", rolled_back.len()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::MigrateArgs;
    use crate::commands::migrate;
    use crate::commands::testing::{context, project, write_migration};
    use crate::error::CliError;
    use strata_migrate::{IntegrityProbe, MigrationStore};

    #[test]
    fn test_rollback_latest() {
        let tmp = project();
        let (mut ctx, captured) = context(&tmp);
        migrate::run(&mut ctx, MigrateArgs::default()).unwrap();

        run(&mut ctx, RollbackArgs::default()).unwrap();

        assert!(captured.contents().contains("Rolled back 0002_create_tags"));
        let store = ctx.open_store().unwrap();
        assert!(!store.read(|conn| store.table_exists(conn, "tags")).unwrap());
        assert!(store.read(|conn| store.table_exists(conn, "items")).unwrap());
    }

    #[test]
    fn test_rollback_more_than_applied_stops_early() {
        let tmp = project();
        let (mut ctx, captured) = context(&tmp);
        migrate::run(&mut ctx, MigrateArgs::default()).unwrap();

        run(&mut ctx, RollbackArgs { step: 5 }).unwrap();

        assert!(captured.contents().contains("Rolled back 2 migration(s)"));
        let store = ctx.open_store().unwrap();
        assert!(store.read(|conn| store.applied_identifiers(conn)).unwrap().is_empty());
    }

    #[test]
    fn test_rollback_nothing_applied() {
        let tmp = project();
        let (mut ctx, captured) = context(&tmp);

        run(&mut ctx, RollbackArgs::default()).unwrap();
        assert!(captured.contents().contains("Nothing to roll back"));
    }

    #[test]
    fn test_rollback_negative_step_fails() {
        let tmp = project();
        let (mut ctx, _) = context(&tmp);

        let err = run(&mut ctx, RollbackArgs { step: -1 }).unwrap_err();
        assert!(matches!(err, CliError::Migration(_)));
    }

    #[test]
    fn test_rollback_irreversible_fails() {
        let tmp = project();
        write_migration(
            tmp.path(),
            "0003_seed_items",
            "INSERT INTO items (name) VALUES ('first');",
            None,
        );
        let (mut ctx, _) = context(&tmp);
        migrate::run(&mut ctx, MigrateArgs::default()).unwrap();

        let err = run(&mut ctx, RollbackArgs::default()).unwrap_err();
        assert!(err.to_string().contains("does not define a rollback"));
    }
}
