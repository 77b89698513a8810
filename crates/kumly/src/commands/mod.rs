//! Command dispatch: bridges CLI args -> session calls -> output formatting.

pub mod config_cmd;
pub mod docker_hosts;
pub mod maintenances;
pub mod monitors;
pub mod notifications;
pub mod proxies;
pub mod status_pages;
pub mod system;
pub mod tags;
pub mod util;

use kumly_core::Session;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Monitors(args) => monitors::handle(session, args, global).await,
        Command::Notifications(args) => notifications::handle(session, args, global).await,
        Command::Proxies(args) => proxies::handle(session, args, global).await,
        Command::DockerHosts(args) => docker_hosts::handle(session, args, global).await,
        Command::Maintenances(args) => maintenances::handle(session, args, global).await,
        Command::StatusPages(args) => status_pages::handle(session, args, global).await,
        Command::Tags(args) => tags::handle(session, args, global).await,
        Command::Info => system::info(session, global).await,
        // Config and Completions are handled before a session is opened
        Command::Config(_) | Command::Completions(_) => Err(CliError::Other(
            "command does not need a server connection".into(),
        )),
    }
}
