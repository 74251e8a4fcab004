//! `strata schema-dump` - write the canonical schema text.

use strata_sqlite::fingerprint;

use crate::cli::SchemaDumpArgs;
use crate::context::CliContext;
use crate::error::{CliError, CliResult};

/// Run the schema-dump command
pub fn run(ctx: &mut CliContext, args: SchemaDumpArgs) -> CliResult<()> {
    let provider = ctx
        .snapshot
        .as_deref()
        .ok_or_else(|| CliError::config("no schema snapshot provider configured"))?;

    let store = ctx.open_store()?;
    let text = store.schema_snapshot(provider)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &text)?;
            ctx.out.success(&format!(
                "Schema written to {} (sha256 {})",
                path.display(),
                fingerprint(&text)
            ))?;
        }
        None => ctx.out.raw(&text)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::MigrateArgs;
    use crate::commands::migrate;
    use crate::commands::testing::{context, project};

    #[test]
    fn test_dump_to_sink() {
        let tmp = project();
        let (mut ctx, captured) = context(&tmp);
        migrate::run(&mut ctx, MigrateArgs::default()).unwrap();

        let (mut dump_ctx, dumped) = context(&tmp);
        run(&mut dump_ctx, SchemaDumpArgs::default()).unwrap();

        let text = dumped.contents();
        assert!(text.starts_with("table:items\n"));
        assert!(text.contains("idx:idx_items_name:"));
        assert!(text.contains("table:tags\n"));
        assert!(!text.contains("_strata_migrations"));
        assert!(!captured.contents().contains("table:items"));
    }

    #[test]
    fn test_dump_to_file() {
        let tmp = project();
        let (mut ctx, captured) = context(&tmp);
        migrate::run(&mut ctx, MigrateArgs::default()).unwrap();

        let path = tmp.path().join("schema.txt");
        run(
            &mut ctx,
            SchemaDumpArgs {
                output: Some(path.clone()),
            },
        )
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("table:items"));
        assert!(captured.contents().contains(&fingerprint(&text)));
    }

    #[test]
    fn test_dump_without_provider_fails() {
        let tmp = project();
        let (mut ctx, _) = context(&tmp);
        ctx.snapshot = None;

        let err = run(&mut ctx, SchemaDumpArgs::default()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
