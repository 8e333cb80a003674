// Delegate endpoints: bindings between a target and an identity.

use crate::manager::{Envelope, ResourceManager};
use crate::resource::ResourceKind;

/// Marker for the `/delegates` collection.
#[derive(Debug, Clone, Copy)]
pub struct Delegate;

impl ResourceKind for Delegate {
    const LABEL: &'static str = "Delegate";
    const COLLECTION: &'static str = "delegates";
    const LIST_ENVELOPE: Envelope = Envelope::Required("delegates");
    const ITEM_ENVELOPE: Envelope = Envelope::Optional("delegate");
}

pub type DelegatesManager = ResourceManager<Delegate>;
