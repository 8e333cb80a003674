//! Shared helpers for command handlers.

use std::path::Path;

use serde_json::{Map, Value};
use tabled::Tabled;

use knob_api::{Identify, Info, ResourceKind, ResourceManager, UpdateMode};

use crate::cli::{GlobalOpts, ListArgs, UpdateArgs};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct ResourceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Info> for ResourceRow {
    fn from(info: &Info) -> Self {
        let text = |value: Option<Value>| {
            value
                .map(|v| output::display_value(&v))
                .unwrap_or_default()
        };
        Self {
            id: id_text(info),
            name: text(info.field("name")),
            project: text(info.field("project_id").or_else(|| info.field("tenant_id"))),
            status: text(info.field("status")),
        }
    }
}

/// The identifier shown for an entity; empty when the server sent none.
pub fn id_text<T: Identify + ?Sized>(item: &T) -> String {
    item.resource_id()
        .map(|id| id.to_string())
        .unwrap_or_default()
}

// ── Argument parsing ────────────────────────────────────────────────

/// Parse a `key=value` pair. Values that are valid JSON (numbers, booleans,
/// arrays, objects) keep their type; anything else is a string.
pub fn parse_property(raw: &str) -> Result<(String, Value), CliError> {
    let (key, value) = raw
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| CliError::Validation {
            field: "property".into(),
            reason: format!("expected KEY=VALUE, got '{raw}'"),
        })?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}

/// Build a request body from `--property` flags.
pub fn body_from(properties: &[String]) -> Result<Map<String, Value>, CliError> {
    properties.iter().map(|raw| parse_property(raw)).collect()
}

/// Query parameters for a list command.
pub fn list_params(args: &ListArgs) -> Result<Vec<(String, String)>, CliError> {
    let mut params = Vec::with_capacity(args.filters.len() + 1);
    if args.all_projects {
        params.push(("all_projects".into(), "true".into()));
    }
    for raw in &args.filters {
        let (key, value) = raw.split_once('=').ok_or_else(|| CliError::Validation {
            field: "filter".into(),
            reason: format!("expected KEY=VALUE, got '{raw}'"),
        })?;
        params.push((key.to_owned(), value.to_owned()));
    }
    Ok(params)
}

/// Read a public key from disk, trimming the trailing newline.
pub fn read_public_key(path: &Path) -> Result<String, CliError> {
    let key = std::fs::read_to_string(path).map_err(|e| CliError::Validation {
        field: "public-key-file".into(),
        reason: format!("{}: {e}", path.display()),
    })?;
    Ok(key.trim_end().to_owned())
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|_| CliError::NonInteractiveRequiresYes {
            action: message.to_owned(),
        })
}

// ── Generic CRUD handlers ───────────────────────────────────────────

fn noun<K: ResourceKind>() -> String {
    K::LABEL.to_ascii_lowercase()
}

pub fn print_infos(infos: &[Info], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(
        &global.output,
        infos,
        |i| ResourceRow::from(i),
        |i| id_text(i),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn print_info(info: &Info, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, info, output::detail, |i| id_text(i))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn list<K: ResourceKind>(
    manager: &ResourceManager<K>,
    args: &ListArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let params = list_params(args)?;
    let infos: Vec<Info> = manager
        .list(&params)
        .await?
        .into_iter()
        .map(knob_api::Resource::into_info)
        .collect();
    print_infos(&infos, global)
}

pub async fn show<K: ResourceKind>(
    manager: &ResourceManager<K>,
    id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let resource = manager
        .get(id)
        .await
        .map_err(|e| CliError::for_resource(e, &noun::<K>(), id))?;
    print_info(resource.info(), global)
}

pub async fn create<K: ResourceKind>(
    manager: &ResourceManager<K>,
    body: Map<String, Value>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let resource = manager.create(&Value::Object(body)).await?;
    output::print_status(
        &format!("{} '{}' created", K::LABEL, id_text(&resource)),
        global.quiet,
    );
    print_info(resource.info(), global)
}

pub async fn update<K: ResourceKind>(
    manager: &ResourceManager<K>,
    args: UpdateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut body = body_from(&args.properties)?;
    if let Some(name) = args.name {
        body.insert("name".into(), Value::String(name));
    }
    if body.is_empty() {
        return Err(CliError::Validation {
            field: "update".into(),
            reason: "nothing to update: pass --name or --property".into(),
        });
    }
    let mode = if args.merge {
        UpdateMode::Merge
    } else {
        UpdateMode::Replace
    };

    let updated = manager
        .update(&args.id, &Value::Object(body), mode)
        .await
        .map_err(|e| CliError::for_resource(e, &noun::<K>(), &args.id))?;
    output::print_status(&format!("{} '{}' updated", K::LABEL, args.id), global.quiet);
    match updated {
        Some(resource) => print_info(resource.info(), global),
        None => Ok(()),
    }
}

pub async fn delete<K: ResourceKind>(
    manager: &ResourceManager<K>,
    ids: &[String],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let noun = noun::<K>();
    let prompt = match ids {
        [one] => format!("Delete {noun} '{one}'?"),
        many => format!("Delete {} {noun}s?", many.len()),
    };
    if !confirm(&prompt, global.yes)? {
        return Ok(());
    }
    for id in ids {
        manager
            .delete(id)
            .await
            .map_err(|e| CliError::for_resource(e, &noun, id))?;
        output::print_status(&format!("{} '{id}' deleted", K::LABEL), global.quiet);
    }
    Ok(())
}
