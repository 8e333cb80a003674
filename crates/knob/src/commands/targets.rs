//! Target command handlers.

use serde_json::Value;

use knob_api::KnobClient;

use crate::cli::{GlobalOpts, TargetArgs, TargetCommand};
use crate::error::CliError;

use super::util;

pub async fn handle(
    client: &KnobClient,
    args: TargetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let targets = &client.targets;
    match args.command {
        TargetCommand::List(list) => util::list(targets, &list, global).await,

        TargetCommand::Show { target } => util::show(targets, &target, global).await,

        TargetCommand::Create {
            name,
            hostname,
            gate,
            properties,
        } => {
            let mut body = util::body_from(&properties)?;
            body.insert("name".into(), Value::String(name));
            body.insert("hostname".into(), Value::String(hostname));
            if let Some(gate) = gate {
                body.insert("gate_id".into(), Value::String(gate));
            }
            util::create(targets, body, global).await
        }

        TargetCommand::Update(update) => util::update(targets, update, global).await,

        TargetCommand::Delete { targets: ids } => util::delete(targets, &ids, global).await,
    }
}
