//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod capabilities;
pub mod config_cmd;
pub mod snapshot;
pub mod status;
pub mod sync;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a parsed command to its handler. Completions are handled
/// before this point.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(global).await,
        Command::Capabilities => capabilities::handle(global).await,
        Command::Snapshot(args) => snapshot::handle(args, global),
        Command::Sync(args) => sync::handle(args, global).await,
        Command::Config(args) => config_cmd::handle(&args, global),
        Command::Completions(_) => Ok(()),
    }
}
