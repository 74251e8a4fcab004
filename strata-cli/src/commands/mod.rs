//! CLI command implementations.

pub mod migrate;
pub mod rollback;
pub mod schema_dump;
pub mod status;
pub mod verify;

use crate::cli::Command;
use crate::context::CliContext;
use crate::error::CliResult;

/// Run a parsed command against `ctx`.
pub fn dispatch(ctx: &mut CliContext, command: Command) -> CliResult<()> {
    match command {
        Command::Migrate(args) => migrate::run(ctx, args),
        Command::Status => status::run(ctx),
        Command::Rollback(args) => rollback::run(ctx, args),
        Command::Verify => verify::run(ctx),
        Command::SchemaDump(args) => schema_dump::run(ctx, args),
    }
}
