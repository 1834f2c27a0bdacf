//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod apply;
pub mod config_cmd;
pub mod reconcile;
pub mod resolve;
pub mod util;
pub mod wait;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command that reads files or talks to the service.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Reconcile(args) => reconcile::handle(&args, global),
        Command::Resolve(args) => resolve::handle(&args, global),
        Command::Apply(args) => apply::handle(&args, global).await,
        Command::Wait(args) => wait::handle(&args, global).await,
        Command::Config(args) => config_cmd::handle(args, global),
        // Completions are generated before dispatch.
        Command::Completions(_) => Ok(()),
    }
}
