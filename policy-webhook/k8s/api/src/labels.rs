use std::collections::BTreeMap;

pub type Map = BTreeMap<String, String>;

/// Identifies the tool managing an object.
pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// The [`MANAGED_BY`] value set on every object this controller owns.
pub const MANAGED_BY_VALUE: &str = "policy-webhook";

/// Returns the labels marking an object as managed by this controller.
pub fn managed_by() -> Map {
    Some((MANAGED_BY.to_string(), MANAGED_BY_VALUE.to_string()))
        .into_iter()
        .collect()
}

/// Indicates whether the labels mark an object as managed by this controller.
pub fn is_managed(labels: &Map) -> bool {
    labels.get(MANAGED_BY).map(String::as_str) == Some(MANAGED_BY_VALUE)
}
