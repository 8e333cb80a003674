//! Service command handlers.

use knob_api::{KnobClient, ServiceQuery};

use crate::cli::{GlobalOpts, ServiceArgs, ServiceCommand};
use crate::error::CliError;

use super::util;

pub async fn handle(
    client: &KnobClient,
    args: ServiceArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ServiceCommand::List {
            service_type,
            all_projects,
            index,
        } => {
            let mut query = ServiceQuery::default();
            if let Some(service_type) = service_type {
                query = query.service_type(service_type);
            }
            if all_projects {
                query = query.all_projects(true);
            }
            if let Some(index) = index {
                query = query.index(index);
            }
            let services = client.services.list(&query).await?;
            util::print_infos(&services, global)
        }
    }
}
