// Associate endpoints: bindings between a target and a service.

use crate::manager::{Envelope, ResourceManager};
use crate::resource::ResourceKind;

/// Marker for the `/associates` collection.
#[derive(Debug, Clone, Copy)]
pub struct Associate;

impl ResourceKind for Associate {
    const LABEL: &'static str = "Associate";
    const COLLECTION: &'static str = "associates";
    const LIST_ENVELOPE: Envelope = Envelope::Required("associates");
    const ITEM_ENVELOPE: Envelope = Envelope::Optional("associate");
}

pub type AssociatesManager = ResourceManager<Associate>;
