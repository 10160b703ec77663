use std::{fmt, str::FromStr};

/// An API group and version. The core group is the empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupVersion {
    pub group: String,
    pub version: String,
}

/// Identifies a resource (or sub-resource, e.g. `pods/exec`) within an API
/// group and version.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid resource {input:?}: {reason}")]
pub struct InvalidGvr {
    input: String,
    reason: &'static str,
}

// === impl GroupVersion ===

impl GroupVersion {
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            return f.write_str(&self.version);
        }
        write!(f, "{}/{}", self.group, self.version)
    }
}

// === impl GroupVersionResource ===

impl GroupVersionResource {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }

    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::new(self.group.clone(), self.version.clone())
    }
}

/// Parses `version/resource` (core group) or `group/version/resource`. The
/// group may be left empty so that core sub-resources can be expressed, as in
/// `/v1/pods/ephemeralcontainers`.
impl FromStr for GroupVersionResource {
    type Err = InvalidGvr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| InvalidGvr {
            input: s.to_string(),
            reason,
        };

        let mut parts = s.splitn(3, '/');
        let first = parts.next().unwrap_or_default();
        let (group, version, resource) = match (parts.next(), parts.next()) {
            (None, _) => return Err(invalid("expected [group/]version/resource")),
            (Some(resource), None) => ("", first, resource),
            (Some(version), Some(resource)) => (first, version, resource),
        };

        if version.is_empty() {
            return Err(invalid("version must not be empty"));
        }
        if resource.is_empty() {
            return Err(invalid("resource must not be empty"));
        }

        Ok(Self::new(group, version, resource))
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() && !self.resource.contains('/') {
            return write!(f, "{}/{}", self.version, self.resource);
        }
        write!(f, "{}/{}/{}", self.group, self.version, self.resource)
    }
}
