use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

// Header names are case-insensitive on the wire; `HeaderName::from_static`
// requires the lowercase form.
pub const PROJECT_NAME_HEADER: &str = "x-project-name";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_DOMAIN_ID_HEADER: &str = "x-user-domain-id";
pub const PROJECT_DOMAIN_ID_HEADER: &str = "x-project-domain-id";
pub const PROJECT_ID_HEADER: &str = "x-project-id";
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Caller identity stamped onto every request.
///
/// Rendered into the adapter's default header set once, at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityContext {
    pub project_name: String,
    pub user_name: String,
    pub user_domain_id: String,
    pub project_domain_id: String,
}

impl IdentityContext {
    pub fn new(
        project_name: impl Into<String>,
        user_name: impl Into<String>,
        user_domain_id: impl Into<String>,
        project_domain_id: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            user_name: user_name.into(),
            user_domain_id: user_domain_id.into(),
            project_domain_id: project_domain_id.into(),
        }
    }

    /// Name of the first empty field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("project_name", &self.project_name),
            ("user_name", &self.user_name),
            ("user_domain_id", &self.user_domain_id),
            ("project_domain_id", &self.project_domain_id),
        ]
        .into_iter()
        .find(|(_, v)| v.is_empty())
        .map(|(name, _)| name)
    }

    /// Build the default header set: the four identity headers, plus
    /// `X-Project-Id` when a project id is configured.
    pub fn headers(&self, project_id: Option<&str>) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        insert(&mut headers, PROJECT_NAME_HEADER, &self.project_name)?;
        insert(&mut headers, USER_NAME_HEADER, &self.user_name)?;
        insert(&mut headers, USER_DOMAIN_ID_HEADER, &self.user_domain_id)?;
        insert(&mut headers, PROJECT_DOMAIN_ID_HEADER, &self.project_domain_id)?;
        if let Some(project_id) = project_id {
            insert(&mut headers, PROJECT_ID_HEADER, project_id)?;
        }
        Ok(headers)
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), Error> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| Error::configuration(format!("invalid {name} header value: {e}")))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

// ── Session ─────────────────────────────────────────────────────────

/// One entry of the identity service's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEndpoint {
    pub service_type: String,
    pub service_name: Option<String>,
    pub interface: String,
    pub region: Option<String>,
    pub url: String,
}

/// Filters used to pick an endpoint out of a session's catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointFilter {
    pub service_type: String,
    pub service_name: Option<String>,
    pub interface: String,
    pub region_name: Option<String>,
}

impl EndpointFilter {
    fn matches(&self, ep: &CatalogEndpoint) -> bool {
        ep.service_type == self.service_type
            && ep.interface == self.interface
            && self
                .service_name
                .as_ref()
                .is_none_or(|name| ep.service_name.as_ref() == Some(name))
            && self
                .region_name
                .as_ref()
                .is_none_or(|region| ep.region.as_ref() == Some(region))
    }
}

/// A pre-authenticated context produced by the external identity service.
///
/// The client borrows it for the process lifetime and never mutates it.
#[derive(Debug, Clone)]
pub struct Session {
    token: SecretString,
    project_id: Option<String>,
    catalog: Vec<CatalogEndpoint>,
}

impl Session {
    pub fn new(token: SecretString) -> Self {
        Self {
            token,
            project_id: None,
            catalog: Vec::new(),
        }
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_catalog(mut self, catalog: Vec<CatalogEndpoint>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Whether the session carries a usable token.
    pub fn is_authenticated(&self) -> bool {
        !self.token.expose_secret().is_empty()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// First catalog entry matching `filter`.
    pub fn resolve_endpoint(&self, filter: &EndpointFilter) -> Option<&str> {
        self.catalog
            .iter()
            .find(|ep| filter.matches(ep))
            .map(|ep| ep.url.as_str())
    }

    /// The `X-Auth-Token` header, marked sensitive.
    pub(crate) fn token_header(&self) -> Result<(HeaderName, HeaderValue), Error> {
        let mut value = HeaderValue::from_str(self.token.expose_secret())
            .map_err(|e| Error::configuration(format!("invalid auth token header value: {e}")))?;
        value.set_sensitive(true);
        Ok((HeaderName::from_static(AUTH_TOKEN_HEADER), value))
    }
}
