//! Associate and delegate command handlers.
//!
//! Both collections bind something to a target and share one command shape;
//! only the field naming the bound party differs.

use serde_json::Value;

use knob_api::{ResourceKind, ResourceManager};

use crate::cli::{BindingArgs, BindingCommand, GlobalOpts};
use crate::error::CliError;

use super::util;

/// `party_field` is the body key that `--service` fills in:
/// `service_id` for associates, `delegate_id` for delegates.
pub async fn handle<K: ResourceKind>(
    manager: &ResourceManager<K>,
    party_field: &str,
    args: BindingArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        BindingCommand::List(list) => util::list(manager, &list, global).await,

        BindingCommand::Show { id } => util::show(manager, &id, global).await,

        BindingCommand::Create {
            name,
            target,
            service,
            properties,
        } => {
            let mut body = util::body_from(&properties)?;
            body.insert("name".into(), Value::String(name));
            body.insert("target_id".into(), Value::String(target));
            if let Some(party) = service {
                body.insert(party_field.into(), Value::String(party));
            }
            util::create(manager, body, global).await
        }

        BindingCommand::Update(update) => util::update(manager, update, global).await,

        BindingCommand::Delete { ids } => util::delete(manager, &ids, global).await,
    }
}
