//! Registry-bound command handlers.

pub mod config_cmd;
pub mod hosts;
pub mod util;
pub mod watch;

use hostwatch_core::StateController;

use crate::cli::{Command, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;

/// Dispatch a registry-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &StateController,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Hosts(args) => hosts::handle(controller, args, session, global).await,
        // `--status` is already applied through the session's initial filter.
        Command::Watch(_) => watch::handle(controller, session, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need a registry session".into(),
        )),
    }
}
