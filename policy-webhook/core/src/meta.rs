use policy_webhook_k8s_api::{labels, ObjectMeta, OwnerReference};
use std::collections::BTreeMap;

/// Builds the metadata for an object managed by this controller.
pub fn object_meta(
    name: impl Into<String>,
    annotations: BTreeMap<String, String>,
    owners: Vec<OwnerReference>,
) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        labels: Some(labels::managed_by()),
        annotations: (!annotations.is_empty()).then_some(annotations),
        owner_references: (!owners.is_empty()).then_some(owners),
        ..Default::default()
    }
}
