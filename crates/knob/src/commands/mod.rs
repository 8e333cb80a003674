//! Command dispatch: bridges CLI args -> API managers -> output formatting.

pub mod bindings;
pub mod config_cmd;
pub mod gates;
pub mod services;
pub mod targets;
pub mod util;

use knob_api::KnobClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a service-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &KnobClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Gate(args) => gates::handle(client, args, global).await,
        Command::Target(args) => targets::handle(client, args, global).await,
        Command::Associate(args) => {
            bindings::handle(&client.associates, "service_id", args, global).await
        }
        Command::Delegate(args) => {
            bindings::handle(&client.delegates, "delegate_id", args, global).await
        }
        Command::Service(args) => services::handle(client, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
