// ssh-proxy service catalog
//
// Read-only: the service only exposes a filtered listing. Entries are returned
// as raw property bags since there is nothing to update or delete on them.

use std::sync::Arc;

use crate::error::Error;
use crate::http::{ApiPath, RequestAdapter};
use crate::manager::{Envelope, list_infos, unwrap_envelope};
use crate::resource::Info;

const PATH: &str = "ssh_services";
const ENVELOPE: Envelope = Envelope::Optional("services");

/// Filters for `GET /ssh_services`. Unset fields are left off the query
/// string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceQuery {
    pub service_type: Option<String>,
    pub all_projects: Option<bool>,
    pub index: Option<String>,
}

impl ServiceQuery {
    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    pub fn all_projects(mut self, all_projects: bool) -> Self {
        self.all_projects = Some(all_projects);
        self
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Query pairs in wire form. Empty strings count as unset.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(index) = self.index.as_deref().filter(|s| !s.is_empty()) {
            params.push(("index".to_owned(), index.to_owned()));
        }
        if let Some(kind) = self.service_type.as_deref().filter(|s| !s.is_empty()) {
            params.push(("type".to_owned(), kind.to_owned()));
        }
        if let Some(all) = self.all_projects {
            params.push(("all_projects".to_owned(), all.to_string()));
        }
        params
    }
}

/// Lists ssh-proxy offerings.
#[derive(Debug, Clone)]
pub struct ServicesManager {
    http: Arc<RequestAdapter>,
}

impl ServicesManager {
    pub fn new(http: Arc<RequestAdapter>) -> Self {
        Self { http }
    }

    /// `GET /ssh_services`
    pub async fn list(&self, query: &ServiceQuery) -> Result<Vec<Info>, Error> {
        let path = ApiPath::collection(PATH);
        let body = self.http.get_with_params(&path, &query.to_params()).await?;
        match body {
            Some(body) => list_infos(unwrap_envelope(body, ENVELOPE)?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_has_no_params() {
        assert!(ServiceQuery::default().to_params().is_empty());
        assert!(
            ServiceQuery::default()
                .service_type("")
                .to_params()
                .is_empty()
        );
    }

    #[test]
    fn all_projects_false_is_still_sent() {
        let params = ServiceQuery::default().all_projects(false).to_params();
        assert_eq!(params, vec![("all_projects".to_owned(), "false".to_owned())]);
    }

    #[test]
    fn params_use_wire_names() {
        let params = ServiceQuery::default()
            .service_type("bastion")
            .index("2")
            .all_projects(true)
            .to_params();
        assert_eq!(
            params,
            vec![
                ("index".to_owned(), "2".to_owned()),
                ("type".to_owned(), "bastion".to_owned()),
                ("all_projects".to_owned(), "true".to_owned()),
            ]
        );
    }
}
