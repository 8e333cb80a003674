// Target endpoints: hosts reachable through a gate.

use crate::manager::{Envelope, ResourceManager};
use crate::resource::ResourceKind;

/// Marker for the `/targets` collection.
#[derive(Debug, Clone, Copy)]
pub struct Target;

impl ResourceKind for Target {
    const LABEL: &'static str = "Target";
    const COLLECTION: &'static str = "targets";
    const LIST_ENVELOPE: Envelope = Envelope::Required("targets");
    const ITEM_ENVELOPE: Envelope = Envelope::Optional("target");
}

pub type TargetsManager = ResourceManager<Target>;
