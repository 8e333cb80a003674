// Client facade
//
// `KnobClient` builds one `RequestAdapter` from a `ClientConfig` and hands a
// shared reference to every resource manager.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::associates::AssociatesManager;
use crate::auth::{EndpointFilter, IdentityContext, Session};
use crate::delegates::DelegatesManager;
use crate::error::Error;
use crate::gates::GatesManager;
use crate::http::RequestAdapter;
use crate::services::ServicesManager;
use crate::targets::TargetsManager;
use crate::transport::TransportConfig;

pub const DEFAULT_SERVICE_TYPE: &str = "ssh";
pub const DEFAULT_INTERFACE: &str = "public";
pub const DEFAULT_API_VERSION: &str = "v1";

/// Everything needed to reach the Knob service.
///
/// Either an authenticated [`Session`] or both `endpoint` and `project_id`
/// must be supplied. The endpoint filters (`service_type`, `service_name`,
/// `interface`, `region_name`) only apply when the endpoint is resolved from
/// the session's catalog.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub session: Option<Session>,
    pub endpoint: Option<String>,
    pub project_id: Option<String>,
    pub identity: IdentityContext,
    pub verify: bool,
    pub ca_cert: Option<PathBuf>,
    pub timeout: Duration,
    pub service_type: String,
    pub service_name: Option<String>,
    pub interface: String,
    pub region_name: Option<String>,
    pub api_version: String,
}

impl ClientConfig {
    pub fn new(identity: IdentityContext) -> Self {
        Self {
            session: None,
            endpoint: None,
            project_id: None,
            identity,
            verify: true,
            ca_cert: None,
            timeout: Duration::from_secs(30),
            service_type: DEFAULT_SERVICE_TYPE.to_owned(),
            service_name: None,
            interface: DEFAULT_INTERFACE.to_owned(),
            region_name: None,
            api_version: DEFAULT_API_VERSION.to_owned(),
        }
    }

    #[must_use]
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    #[must_use]
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    #[must_use]
    pub fn ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = service_type.into();
        self
    }

    #[must_use]
    pub fn service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    #[must_use]
    pub fn interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    #[must_use]
    pub fn region_name(mut self, region_name: impl Into<String>) -> Self {
        self.region_name = Some(region_name.into());
        self
    }

    #[must_use]
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig::new(self.verify, self.ca_cert.clone(), self.timeout)
    }

    fn endpoint_filter(&self) -> EndpointFilter {
        EndpointFilter {
            service_type: self.service_type.clone(),
            service_name: self.service_name.clone(),
            interface: self.interface.clone(),
            region_name: self.region_name.clone(),
        }
    }

    fn authenticated_session(&self) -> Option<&Session> {
        self.session.as_ref().filter(|s| s.is_authenticated())
    }

    /// Check the construction rules and settle the endpoint and project id.
    fn resolve(&self) -> Result<(String, Option<String>), Error> {
        if let Some(field) = self.identity.missing_field() {
            return Err(Error::configuration(format!(
                "identity field '{field}' must be provided"
            )));
        }

        let session = self.authenticated_session();
        let explicit = self.endpoint.as_deref().filter(|e| !e.is_empty());

        let endpoint = match (explicit, session) {
            (Some(endpoint), _) => endpoint.to_owned(),
            (None, Some(session)) => {
                let filter = self.endpoint_filter();
                session
                    .resolve_endpoint(&filter)
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        Error::configuration(format!(
                            "no '{}' endpoint with interface '{}' in the session catalog",
                            filter.service_type, filter.interface
                        ))
                    })?
            }
            (None, None) => {
                return Err(Error::configuration(
                    "Knob endpoint url must be provided when not using an authenticated session",
                ));
            }
        };

        if session.is_none() && self.project_id.is_none() {
            return Err(Error::configuration(
                "Project ID must be provided when not using an authenticated session",
            ));
        }

        let project_id = self
            .project_id
            .clone()
            .or_else(|| session.and_then(|s| s.project_id().map(str::to_owned)));

        Ok((endpoint, project_id))
    }
}

/// Entry point for the Knob API.
///
/// Managers share one adapter; cloning the client is cheap.
#[derive(Debug, Clone)]
pub struct KnobClient {
    pub gates: GatesManager,
    pub targets: TargetsManager,
    pub associates: AssociatesManager,
    pub delegates: DelegatesManager,
    pub services: ServicesManager,
    http: Arc<RequestAdapter>,
}

impl KnobClient {
    /// Validate `config` and build the adapter. No request is made.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let (endpoint, project_id) = config.resolve()?;

        let mut headers = config.identity.headers(project_id.as_deref())?;
        if let Some(session) = config.authenticated_session() {
            let (name, value) = session.token_header()?;
            headers.insert(name, value);
        }

        debug!(%endpoint, project_id = ?project_id, "creating Knob client");
        let adapter = RequestAdapter::new(
            &endpoint,
            &config.api_version,
            headers,
            &config.transport(),
        )?;
        Ok(Self::from_adapter(adapter))
    }

    /// Wrap a pre-built adapter.
    pub fn from_adapter(adapter: RequestAdapter) -> Self {
        let http = Arc::new(adapter);
        Self {
            gates: GatesManager::new(Arc::clone(&http)),
            targets: TargetsManager::new(Arc::clone(&http)),
            associates: AssociatesManager::new(Arc::clone(&http)),
            delegates: DelegatesManager::new(Arc::clone(&http)),
            services: ServicesManager::new(Arc::clone(&http)),
            http,
        }
    }

    pub fn http(&self) -> &RequestAdapter {
        &self.http
    }
}
