//! Gate command handlers.

use serde_json::Value;

use knob_api::{Info, KnobClient, Resource};

use crate::cli::{
    GateArgs, GateCommand, GateKeyArgs, GateKeyCommand, GateTargetArgs, GateTargetCommand,
    GlobalOpts,
};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    client: &KnobClient,
    args: GateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let gates = &client.gates;
    match args.command {
        GateCommand::List(list) => util::list(gates, &list, global).await,

        GateCommand::Show { gate } => util::show(gates, &gate, global).await,

        GateCommand::Create {
            name,
            net_id,
            public_net_id,
            public_key,
            public_key_file,
            properties,
        } => {
            let mut body = util::body_from(&properties)?;
            body.insert("name".into(), Value::String(name));
            let public_key = match public_key_file {
                Some(path) => Some(util::read_public_key(&path)?),
                None => public_key,
            };
            let optional = [
                ("net_id", net_id),
                ("public_net_id", public_net_id),
                ("public_key", public_key),
            ];
            for (key, value) in optional
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key, v)))
            {
                body.insert(key.into(), Value::String(value));
            }
            util::create(gates, body, global).await
        }

        GateCommand::Update(update) => util::update(gates, update, global).await,

        GateCommand::Delete { gates: ids } => util::delete(gates, &ids, global).await,

        GateCommand::Target(args) => handle_targets(client, args, global).await,

        GateCommand::Key(args) => handle_keys(client, args, global).await,
    }
}

async fn handle_targets(
    client: &KnobClient,
    args: GateTargetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let gates = &client.gates;
    match args.command {
        GateTargetCommand::List { gate } => {
            let targets = gates
                .list_targets(&gate)
                .await
                .map_err(|e| CliError::for_resource(e, "gate", &gate))?;
            let infos: Vec<Info> = targets.into_iter().map(Resource::into_info).collect();
            util::print_infos(&infos, global)
        }

        GateTargetCommand::Add {
            gate,
            target,
            properties,
        } => {
            let mut body = util::body_from(&properties)?;
            body.insert("target_id".into(), Value::String(target.clone()));
            gates
                .add_target(&gate, &Value::Object(body))
                .await
                .map_err(|e| CliError::for_resource(e, "gate", &gate))?;
            output::print_status(
                &format!("Target '{target}' attached to gate '{gate}'"),
                global.quiet,
            );
            Ok(())
        }

        GateTargetCommand::Remove { gate, target } => {
            gates
                .remove_target(&gate, &target)
                .await
                .map_err(|e| CliError::for_resource(e, "target", &target))?;
            output::print_status(
                &format!("Target '{target}' detached from gate '{gate}'"),
                global.quiet,
            );
            Ok(())
        }
    }
}

async fn handle_keys(
    client: &KnobClient,
    args: GateKeyArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let gates = &client.gates;
    match args.command {
        GateKeyCommand::List { gate } => {
            let keys = gates
                .list_keys(&gate)
                .await
                .map_err(|e| CliError::for_resource(e, "gate", &gate))?;
            util::print_infos(&keys, global)
        }

        GateKeyCommand::Add {
            gate,
            public_key,
            public_key_file,
            name,
        } => {
            let key = match (public_key_file, public_key) {
                (Some(path), _) => util::read_public_key(&path)?,
                (None, Some(key)) => key,
                (None, None) => {
                    return Err(CliError::Validation {
                        field: "public-key".into(),
                        reason: "pass --public-key or --public-key-file".into(),
                    });
                }
            };
            let mut body = serde_json::Map::new();
            body.insert("public_key".into(), Value::String(key));
            if let Some(name) = name {
                body.insert("name".into(), Value::String(name));
            }
            let info = gates
                .add_key(&gate, &Value::Object(body))
                .await
                .map_err(|e| CliError::for_resource(e, "gate", &gate))?;
            output::print_status(&format!("Key authorized on gate '{gate}'"), global.quiet);
            util::print_info(&info, global)
        }

        GateKeyCommand::Remove { gate, key } => {
            if !util::confirm(
                &format!("Revoke key '{key}' from gate '{gate}'?"),
                global.yes,
            )? {
                return Ok(());
            }
            gates
                .remove_key(&gate, &key)
                .await
                .map_err(|e| CliError::for_resource(e, "key", &key))?;
            output::print_status(
                &format!("Key '{key}' revoked from gate '{gate}'"),
                global.quiet,
            );
            Ok(())
        }
    }
}
