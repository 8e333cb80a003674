// Generic resource manager.
//
// Turns a relative path plus an optional envelope key into typed results.
// Managers hold nothing but a shared handle on the request adapter: no cache,
// no memory of previously fetched resources. Errors from the adapter are
// propagated unchanged.

use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, is_truthy};
use crate::http::{ApiPath, RequestAdapter, RequestParts};
use crate::resource::{Identify, Info, Resource, ResourceKind};

/// Where a response nests its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// The whole body is the payload.
    Bare,
    /// The payload must be under this key.
    Required(&'static str),
    /// The payload is under this key when present (as an object or array),
    /// otherwise the whole body is the payload.
    Optional(&'static str),
}

/// How an update is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
pub enum UpdateMode {
    /// `PUT`: replace the entity.
    #[default]
    #[strum(to_string = "PUT")]
    Replace,
    /// `PATCH`: change only the supplied fields.
    #[strum(to_string = "PATCH")]
    Merge,
}

impl UpdateMode {
    fn method(self) -> Method {
        match self {
            Self::Replace => Method::PUT,
            Self::Merge => Method::PATCH,
        }
    }
}

/// Strip the envelope from a response body.
pub fn unwrap_envelope(body: Value, envelope: Envelope) -> Result<Value, Error> {
    match envelope {
        Envelope::Bare => Ok(body),
        Envelope::Required(key) => match body {
            Value::Object(mut map) => map.remove(key).ok_or_else(|| Error::MissingEnvelope {
                key: key.to_owned(),
            }),
            _ => Err(Error::MissingEnvelope {
                key: key.to_owned(),
            }),
        },
        Envelope::Optional(key) => match body {
            Value::Object(mut map)
                if matches!(map.get(key), Some(Value::Object(_) | Value::Array(_))) =>
            {
                Ok(map.remove(key).unwrap_or(Value::Null))
            }
            other => Ok(other),
        },
    }
}

/// Some legacy endpoints nest list items one level further, under `values`.
fn unwrap_values(data: Value) -> Value {
    match data {
        Value::Object(mut map) if map.contains_key("values") => {
            map.remove("values").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Turn a list payload into property bags, dropping falsy entries.
pub(crate) fn list_infos(data: Value) -> Result<Vec<Info>, Error> {
    match unwrap_values(data) {
        Value::Array(items) => items
            .into_iter()
            .filter(is_truthy)
            .map(Info::from_value)
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(Error::Deserialization {
            message: "expected a JSON array of resources".into(),
            body: other.to_string(),
        }),
    }
}

fn require_body(body: Option<Value>) -> Result<Value, Error> {
    body.ok_or_else(|| Error::Deserialization {
        message: "empty response body".into(),
        body: String::new(),
    })
}

/// CRUD operations for one resource kind.
pub struct ResourceManager<K> {
    http: Arc<RequestAdapter>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for ResourceManager<K> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
            _kind: PhantomData,
        }
    }
}

impl<K> std::fmt::Debug for ResourceManager<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("base_url", &self.http.base_url().as_str())
            .finish()
    }
}

impl<K: ResourceKind> ResourceManager<K> {
    pub fn new(http: Arc<RequestAdapter>) -> Self {
        Self {
            http,
            _kind: PhantomData,
        }
    }

    /// The shared request adapter.
    pub fn http(&self) -> &Arc<RequestAdapter> {
        &self.http
    }

    /// A manager for another kind sharing the same adapter.
    pub(crate) fn sibling<O: ResourceKind>(&self) -> ResourceManager<O> {
        ResourceManager::new(Arc::clone(&self.http))
    }

    /// `{collection}`.
    pub fn collection_path(&self) -> ApiPath {
        ApiPath::collection(K::COLLECTION)
    }

    /// `{collection}/{id}`.
    pub fn item_path<T: Identify + ?Sized>(&self, item: &T) -> Result<ApiPath, Error> {
        self.collection_path().item(item)
    }

    // ── Path-level operations ────────────────────────────────────────

    /// `GET path`, unwrap, one loaded resource per truthy element, in
    /// response order.
    pub async fn list_at(
        &self,
        path: &ApiPath,
        params: &[(String, String)],
        envelope: Envelope,
    ) -> Result<Vec<Resource<K>>, Error> {
        let infos = self.list_infos_at(path, params, envelope).await?;
        debug!(count = infos.len(), kind = K::LABEL, "listed resources");
        Ok(infos
            .into_iter()
            .map(|info| Resource::new(self.clone(), info, true))
            .collect())
    }

    /// `GET path`, unwrapped into raw property bags.
    pub async fn list_infos_at(
        &self,
        path: &ApiPath,
        params: &[(String, String)],
        envelope: Envelope,
    ) -> Result<Vec<Info>, Error> {
        let body = self.http.get_with_params(path, params).await?;
        match body {
            Some(body) => list_infos(unwrap_envelope(body, envelope)?),
            None => Ok(Vec::new()),
        }
    }

    /// `GET path`, one loaded resource.
    pub async fn get_at(&self, path: &ApiPath, envelope: Envelope) -> Result<Resource<K>, Error> {
        let body = require_body(self.http.get(path).await?)?;
        let info = Info::from_value(unwrap_envelope(body, envelope)?)?;
        Ok(Resource::new(self.clone(), info, true))
    }

    /// `POST path`. The resulting object is not loaded: a create response is
    /// not treated as full server-side state.
    pub async fn create_at(
        &self,
        path: &ApiPath,
        body: &Value,
        envelope: Envelope,
    ) -> Result<Resource<K>, Error> {
        let data = self.create_raw_at(path, body, envelope).await?;
        Ok(Resource::new(self.clone(), Info::from_value(data)?, false))
    }

    /// `POST path`, returning the unwrapped mapping verbatim.
    pub async fn create_raw_at(
        &self,
        path: &ApiPath,
        body: &Value,
        envelope: Envelope,
    ) -> Result<Value, Error> {
        let resp = require_body(self.http.post(path, body).await?)?;
        unwrap_envelope(resp, envelope)
    }

    /// `PUT` / `PATCH path`. Returns `None` when the server sends no body.
    pub async fn update_at(
        &self,
        path: &ApiPath,
        body: &Value,
        envelope: Envelope,
        mode: UpdateMode,
    ) -> Result<Option<Resource<K>>, Error> {
        let resp = self
            .http
            .send(mode.method(), path, RequestParts::body(body))
            .await?;
        let Some(resp) = resp else {
            debug!(kind = K::LABEL, "{mode} returned no body");
            return Ok(None);
        };
        let info = Info::from_value(unwrap_envelope(resp, envelope)?)?;
        Ok(Some(Resource::new(self.clone(), info, false)))
    }

    /// `DELETE path`. Success is silent.
    pub async fn delete_at(&self, path: &ApiPath) -> Result<(), Error> {
        self.http.delete(path).await?;
        Ok(())
    }

    // ── Collection operations ────────────────────────────────────────

    /// List the collection, passing `params` through to the query string.
    pub async fn list(&self, params: &[(String, String)]) -> Result<Vec<Resource<K>>, Error> {
        self.list_at(&self.collection_path(), params, K::LIST_ENVELOPE)
            .await
    }

    pub async fn get<T: Identify + ?Sized>(&self, item: &T) -> Result<Resource<K>, Error> {
        if !K::SUPPORTS_GET {
            return Err(Error::UnsupportedOperation("get on this resource kind"));
        }
        self.get_at(&self.item_path(item)?, K::ITEM_ENVELOPE).await
    }

    pub async fn create(&self, body: &Value) -> Result<Resource<K>, Error> {
        self.create_at(&self.collection_path(), body, K::ITEM_ENVELOPE)
            .await
    }

    pub async fn create_raw(&self, body: &Value) -> Result<Value, Error> {
        self.create_raw_at(&self.collection_path(), body, K::ITEM_ENVELOPE)
            .await
    }

    pub async fn update<T: Identify + ?Sized>(
        &self,
        item: &T,
        body: &Value,
        mode: UpdateMode,
    ) -> Result<Option<Resource<K>>, Error> {
        self.update_at(&self.item_path(item)?, body, K::ITEM_ENVELOPE, mode)
            .await
    }

    pub async fn delete<T: Identify + ?Sized>(&self, item: &T) -> Result<(), Error> {
        self.delete_at(&self.item_path(item)?).await
    }
}
