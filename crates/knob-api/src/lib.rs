// knob-api: Async Rust client for the Knob SSH-bastion provisioning API

pub mod associates;
pub mod auth;
pub mod client;
pub mod delegates;
pub mod error;
pub mod gates;
pub mod http;
pub mod manager;
pub mod resource;
pub mod services;
pub mod targets;
pub mod transport;

pub use associates::{Associate, AssociatesManager};
pub use auth::{CatalogEndpoint, EndpointFilter, IdentityContext, Session};
pub use client::{ClientConfig, KnobClient};
pub use delegates::{Delegate, DelegatesManager};
pub use error::{Error, StatusClass, classify_status, extract_error_message};
pub use gates::{Gate, GatesManager};
pub use http::{ApiPath, RequestAdapter, RequestParts};
pub use manager::{Envelope, ResourceManager, UpdateMode, unwrap_envelope};
pub use resource::{Identify, Info, Resource, ResourceId, ResourceKind, getid};
pub use services::{ServiceQuery, ServicesManager};
pub use targets::{Target, TargetsManager};
pub use transport::{TlsMode, TransportConfig};
