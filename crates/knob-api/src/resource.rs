// Resource objects: typed handles on one remote entity.
//
// A `Resource<K>` pairs a property bag (`Info`) with the manager that
// produced it, so an object fetched from a listing can later refresh, update
// or delete itself. Identifier resolution (`getid`) accepts either a resource
// or a bare id/name string everywhere a manager needs an identifier.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::http::ApiPath;
use crate::manager::{Envelope, ResourceManager, UpdateMode};

// ── Property bag ────────────────────────────────────────────────────

const TYPED_KEYS: [&str; 4] = ["id", "uuid", "name", "status"];

/// Fields returned by the server for one entity.
///
/// The commonly used fields are typed; everything else is kept verbatim in
/// `extra`, in server order. A key lives in exactly one of the two places:
/// a known key whose value is not a string (or, for `id`/`uuid`, a number)
/// stays in `extra` and leaves the typed slot empty. Numeric `id`/`uuid`
/// values are exposed as strings and serialized back as numbers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info {
    pub id: Option<String>,
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub extra: IndexMap<String, Value>,
    numeric: NumericIds,
}

/// Which identifier slots arrived as JSON numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct NumericIds {
    id: bool,
    uuid: bool,
}

impl Info {
    /// Build from a JSON value. `null` yields an empty bag; anything other
    /// than an object is rejected.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(map) => Ok(Self::from(map)),
            Value::Null => Ok(Self::default()),
            other => Err(Error::Deserialization {
                message: format!("expected a JSON object, got {}", kind_of(&other)),
                body: other.to_string(),
            }),
        }
    }

    fn slot(&self, key: &str) -> Option<&Option<String>> {
        match key {
            "id" => Some(&self.id),
            "uuid" => Some(&self.uuid),
            "name" => Some(&self.name),
            "status" => Some(&self.status),
            _ => None,
        }
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "id" => Some(&mut self.id),
            "uuid" => Some(&mut self.uuid),
            "name" => Some(&mut self.name),
            "status" => Some(&mut self.status),
            _ => None,
        }
    }

    fn is_numeric(&self, key: &str) -> bool {
        match key {
            "id" => self.numeric.id,
            "uuid" => self.numeric.uuid,
            _ => false,
        }
    }

    fn set_numeric(&mut self, key: &str, numeric: bool) {
        match key {
            "id" => self.numeric.id = numeric,
            "uuid" => self.numeric.uuid = numeric,
            _ => {}
        }
    }

    /// The wire form of a typed slot.
    fn typed_value(&self, key: &str) -> Option<Value> {
        let text = self.slot(key)?.as_deref()?;
        let number = self
            .is_numeric(key)
            .then(|| text.parse::<serde_json::Number>().ok())
            .flatten();
        Some(number.map_or_else(|| Value::String(text.to_owned()), Value::Number))
    }

    /// Look up any field, typed or extra, as JSON.
    pub fn field(&self, key: &str) -> Option<Value> {
        self.typed_value(key)
            .or_else(|| self.extra.get(key).cloned())
    }

    /// Every field present, typed fields first.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for key in TYPED_KEYS {
            if let Some(value) = self.typed_value(key) {
                map.insert(key.to_owned(), value);
            }
        }
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        map
    }

    /// Overwrite every field present in `other`; fields absent from `other`
    /// keep their current value. Values are replaced, never deep-merged, and
    /// a replaced key drops its previous representation whether it was typed
    /// or extra.
    pub fn merge(&mut self, other: Self) {
        let Self {
            id,
            uuid,
            name,
            status,
            extra,
            numeric,
        } = other;
        for (key, value, is_numeric) in [
            ("id", id, numeric.id),
            ("uuid", uuid, numeric.uuid),
            ("name", name, false),
            ("status", status, false),
        ] {
            if value.is_some() {
                self.extra.shift_remove(key);
                self.set_numeric(key, is_numeric);
                if let Some(slot) = self.slot_mut(key) {
                    *slot = value;
                }
            }
        }
        for (key, value) in extra {
            if let Some(slot) = self.slot_mut(&key) {
                *slot = None;
                self.set_numeric(&key, false);
            }
            self.extra.insert(key, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.uuid.is_none()
            && self.name.is_none()
            && self.status.is_none()
            && self.extra.is_empty()
    }
}

impl From<Map<String, Value>> for Info {
    fn from(map: Map<String, Value>) -> Self {
        let mut info = Self::default();
        for (key, value) in map {
            let typed = TYPED_KEYS.contains(&key.as_str());
            let is_id = matches!(key.as_str(), "id" | "uuid");
            let text = match value {
                Value::String(s) if typed => s,
                Value::Number(n) if is_id => {
                    info.set_numeric(&key, true);
                    n.to_string()
                }
                value => {
                    info.extra.insert(key, value);
                    continue;
                }
            };
            if let Some(slot) = info.slot_mut(&key) {
                *slot = Some(text);
            }
        }
        info
    }
}

impl Serialize for Info {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map = self.to_map();
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (key, value) in &map {
            out.serialize_entry(key, value)?;
        }
        out.end()
    }
}

impl<'de> Deserialize<'de> for Info {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Self::from)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Identifier resolution ───────────────────────────────────────────

/// Which shape supplied an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceId<'a> {
    /// The object's `uuid` field.
    Uuid(&'a str),
    /// The object's `id` field.
    Id(&'a str),
    /// The object's `name`, used when it has neither `uuid` nor `id`.
    Name(&'a str),
    /// The input was itself an identifier string.
    Bare(&'a str),
}

impl<'a> ResourceId<'a> {
    pub fn as_str(&self) -> &'a str {
        match *self {
            Self::Uuid(s) | Self::Id(s) | Self::Name(s) | Self::Bare(s) => s,
        }
    }
}

impl fmt::Display for ResourceId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything a manager accepts where it needs a resource identifier.
pub trait Identify {
    /// The identifier this value carries, or `None` when it has none.
    fn resource_id(&self) -> Option<ResourceId<'_>>;
}

impl Identify for str {
    fn resource_id(&self) -> Option<ResourceId<'_>> {
        Some(ResourceId::Bare(self))
    }
}

impl Identify for String {
    fn resource_id(&self) -> Option<ResourceId<'_>> {
        Some(ResourceId::Bare(self))
    }
}

impl Identify for Info {
    fn resource_id(&self) -> Option<ResourceId<'_>> {
        present(&self.uuid)
            .map(ResourceId::Uuid)
            .or_else(|| present(&self.id).map(ResourceId::Id))
            .or_else(|| present(&self.name).map(ResourceId::Name))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl<K: ResourceKind> Identify for Resource<K> {
    fn resource_id(&self) -> Option<ResourceId<'_>> {
        self.info.resource_id()
    }
}

impl<T: Identify + ?Sized> Identify for &T {
    fn resource_id(&self) -> Option<ResourceId<'_>> {
        (**self).resource_id()
    }
}

/// Resolve the identifier of a resource object or bare id string.
///
/// Fails with [`Error::InvalidIdentifier`] when the input carries no
/// identifier, or one that cannot stand as a single path segment.
pub fn getid<T: Identify + ?Sized>(item: &T) -> Result<ResourceId<'_>, Error> {
    let id = item.resource_id().ok_or(Error::InvalidIdentifier {
        id: String::new(),
        reason: "object has no uuid, id or name",
    })?;
    let reason = match id.as_str() {
        "" => "identifier is empty",
        "." | ".." => "identifier is a relative path segment",
        _ => return Ok(id),
    };
    Err(Error::InvalidIdentifier {
        id: id.as_str().to_owned(),
        reason,
    })
}

// ── Resource kinds ──────────────────────────────────────────────────

/// Static description of one resource collection.
pub trait ResourceKind: Send + Sync + 'static {
    /// Human-readable singular name, e.g. `"Gate"`.
    const LABEL: &'static str;
    /// Collection path segment, e.g. `"gates"`.
    const COLLECTION: &'static str;
    /// Envelope of list responses.
    const LIST_ENVELOPE: Envelope;
    /// Envelope of single-object responses (get / create / update).
    const ITEM_ENVELOPE: Envelope;
    /// Sub-collection that [`Resource::create`] posts into.
    const CHILD_COLLECTION: Option<&'static str> = None;
    /// Whether the collection exposes `GET /{collection}/{id}`.
    const SUPPORTS_GET: bool = true;
}

// ── Resource object ─────────────────────────────────────────────────

/// A handle on one remote entity.
///
/// `loaded` is `true` when `info` came from a full fetch (list or get) and
/// `false` for objects built from a create response. Deleting the remote
/// entity does not invalidate a handle.
pub struct Resource<K: ResourceKind> {
    manager: ResourceManager<K>,
    info: Info,
    loaded: bool,
}

impl<K: ResourceKind> Resource<K> {
    pub(crate) fn new(manager: ResourceManager<K>, info: Info, loaded: bool) -> Self {
        Self {
            manager,
            info,
            loaded,
        }
    }

    /// The identifier requests about this entity use, if the server sent one.
    pub fn id(&self) -> Option<ResourceId<'_>> {
        self.info.resource_id()
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn into_info(self) -> Info {
        self.info
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn manager(&self) -> &ResourceManager<K> {
        &self.manager
    }

    /// Fetch full state and merge it into `info`.
    ///
    /// The object is marked loaded before the request, so a failed fetch is
    /// not retried implicitly; on failure `info` keeps its last-known state.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.loaded = true;
        if !K::SUPPORTS_GET {
            return Ok(());
        }
        let fresh = self.manager.get(&self.info).await?;
        self.info.merge(fresh.into_info());
        Ok(())
    }

    /// Update the remote entity. The local `info` is not refreshed.
    pub async fn update(&self, fields: &Value, mode: UpdateMode) -> Result<(), Error> {
        self.manager.update(&self.info, fields, mode).await?;
        Ok(())
    }

    /// Delete the remote entity.
    pub async fn delete(&self) -> Result<(), Error> {
        self.manager.delete(&self.info).await
    }

    /// Create a child entity scoped under this one, e.g. a target on a gate.
    /// Returns the unwrapped response mapping.
    pub async fn create(&self, fields: &Value) -> Result<Value, Error> {
        let child = K::CHILD_COLLECTION
            .ok_or(Error::UnsupportedOperation("nested create on this resource kind"))?;
        let path = ApiPath::collection(K::COLLECTION)
            .item(&self.info)?
            .join(child);
        self.manager
            .create_raw_at(&path, fields, Envelope::Bare)
            .await
    }
}

impl<K: ResourceKind> Clone for Resource<K> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            info: self.info.clone(),
            loaded: self.loaded,
        }
    }
}

impl<K: ResourceKind> fmt::Debug for Resource<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::LABEL)
            .field("info", &self.info)
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl<K: ResourceKind> Serialize for Resource<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.info.serialize(serializer)
    }
}
