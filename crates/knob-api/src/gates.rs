// Gate endpoints
//
// A gate is a provisioned SSH bastion. Besides the collection CRUD inherited
// from `ResourceManager`, gates own two sub-collections: the targets reachable
// through the gate and the public keys authorized on it.

use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::http::ApiPath;
use crate::manager::{Envelope, ResourceManager};
use crate::resource::{Identify, Info, Resource, ResourceKind};
use crate::targets::Target;

/// Marker for the `/gates` collection.
#[derive(Debug, Clone, Copy)]
pub struct Gate;

impl ResourceKind for Gate {
    const LABEL: &'static str = "Gate";
    const COLLECTION: &'static str = "gates";
    const LIST_ENVELOPE: Envelope = Envelope::Required("gates");
    const ITEM_ENVELOPE: Envelope = Envelope::Optional("gate");
    const CHILD_COLLECTION: Option<&'static str> = Some("targets");
}

pub type GatesManager = ResourceManager<Gate>;

impl ResourceManager<Gate> {
    fn sub_path<T: Identify + ?Sized>(&self, gate: &T, sub: &str) -> Result<ApiPath, Error> {
        Ok(self.item_path(gate)?.join(sub))
    }

    // ── Targets ──────────────────────────────────────────────────────

    /// `GET /gates/{id}/targets`
    pub async fn list_targets<T: Identify + ?Sized>(
        &self,
        gate: &T,
    ) -> Result<Vec<Resource<Target>>, Error> {
        self.sibling::<Target>()
            .list_at(&self.sub_path(gate, "targets")?, &[], Target::LIST_ENVELOPE)
            .await
    }

    /// `POST /gates/{id}/targets`
    pub async fn add_target<T: Identify + ?Sized>(
        &self,
        gate: &T,
        body: &Value,
    ) -> Result<Resource<Target>, Error> {
        let path = self.sub_path(gate, "targets")?;
        debug!(%path, "adding target to gate");
        self.sibling::<Target>()
            .create_at(&path, body, Target::ITEM_ENVELOPE)
            .await
    }

    /// `DELETE /gates/{id}/targets/{target_id}`
    pub async fn remove_target<G, T>(&self, gate: &G, target: &T) -> Result<(), Error>
    where
        G: Identify + ?Sized,
        T: Identify + ?Sized,
    {
        let path = self.sub_path(gate, "targets")?.item(target)?;
        self.delete_at(&path).await
    }

    // ── Authorized keys ──────────────────────────────────────────────

    /// `GET /gates/{id}/keys`
    pub async fn list_keys<T: Identify + ?Sized>(&self, gate: &T) -> Result<Vec<Info>, Error> {
        self.list_infos_at(&self.sub_path(gate, "keys")?, &[], Envelope::Required("keys"))
            .await
    }

    /// `POST /gates/{id}/keys`
    pub async fn add_key<T: Identify + ?Sized>(&self, gate: &T, body: &Value) -> Result<Info, Error> {
        let path = self.sub_path(gate, "keys")?;
        debug!(%path, "authorizing key on gate");
        let data = self
            .create_raw_at(&path, body, Envelope::Optional("key"))
            .await?;
        Info::from_value(data)
    }

    /// `DELETE /gates/{id}/keys/{key_id}`
    pub async fn remove_key<G, K>(&self, gate: &G, key: &K) -> Result<(), Error>
    where
        G: Identify + ?Sized,
        K: Identify + ?Sized,
    {
        let path = self.sub_path(gate, "keys")?.item(key)?;
        self.delete_at(&path).await
    }
}
