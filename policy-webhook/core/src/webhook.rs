//! Aggregates the resources targeted by policies into admission webhook rules.
//!
//! A [`Webhook`] is built for every failure policy the controller registers.
//! It is fed every resource targeted by the current set of policies and then
//! renders the sorted, deduplicated rule list that is embedded in the webhook
//! configuration. Resources are never removed: callers rebuild a `Webhook`
//! from a full scan of the policies whenever they change.

use crate::gvr::{GroupVersion, GroupVersionResource};
use ahash::AHashMap as HashMap;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhook, RuleWithOperations, ValidatingWebhook, WebhookClientConfig,
};
use policy_webhook_k8s_api::FailurePolicy;
use std::{cmp::Ordering, collections::BTreeSet, fmt, str::FromStr};
use tracing::{debug, trace};

const WILDCARD: &str = "*";
const PODS: &str = "pods";
const EPHEMERAL_CONTAINERS: &str = "pods/ephemeralcontainers";

const ADMISSION_REVIEW_VERSION: &str = "v1";
const SIDE_EFFECTS: &str = "NoneOnDryRun";
const REINVOCATION_POLICY: &str = "IfNeeded";

/// The resources targeted by all policies sharing a failure policy, grouped
/// by API group and version.
#[derive(Clone, Debug)]
pub struct Webhook {
    max_timeout: i32,
    failure_policy: FailurePolicy,
    rules: HashMap<GroupVersion, BTreeSet<String>>,
}

/// An API operation routed to the webhook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Connect,
    All,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid operation {0:?}: expected one of CREATE, UPDATE, DELETE, CONNECT or *")]
pub struct InvalidOperation(String);

// === impl Webhook ===

impl Webhook {
    pub fn new(timeout: i32, failure_policy: FailurePolicy) -> Self {
        Self {
            max_timeout: timeout,
            failure_policy,
            rules: HashMap::default(),
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    pub fn max_timeout(&self) -> i32 {
        self.max_timeout
    }

    /// Raises the webhook timeout so that it covers a policy with the given
    /// timeout. The timeout is never lowered.
    pub fn set_timeout(&mut self, timeout: i32) {
        if timeout > self.max_timeout {
            trace!(from = self.max_timeout, to = timeout, "Raising webhook timeout");
            self.max_timeout = timeout;
        }
    }

    /// Registers a resource with the webhook.
    pub fn set(&mut self, gvr: GroupVersionResource) {
        let GroupVersionResource {
            group,
            version,
            resource,
        } = gvr;
        trace!(%group, %version, %resource, "Adding resource");
        self.rules
            .entry(GroupVersion { group, version })
            .or_default()
            .insert(resource);
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Renders one rule per API group and version, applying `ops` to each.
    ///
    /// Pods' ephemeral containers are a distinct sub-resource, so any group
    /// and version that covers pods is extended to cover
    /// `pods/ephemeralcontainers` as well. This extension is recorded on the
    /// webhook and persists across builds.
    ///
    /// Rules are ordered by group, then version, then resources so that the
    /// rendered configuration is stable across builds. When `ops` is empty the
    /// rules carry no operations at all.
    pub fn build_rules(&mut self, ops: &[Operation]) -> Vec<RuleWithOperations> {
        let operations = (!ops.is_empty()).then(|| {
            ops.iter()
                .map(|op| op.as_str().to_string())
                .collect::<Vec<_>>()
        });

        let mut rules = self
            .rules
            .iter_mut()
            .map(|(gv, resources)| {
                if covers_pods(gv, resources)
                    && resources.insert(EPHEMERAL_CONTAINERS.to_string())
                {
                    trace!(group = %gv.group, version = %gv.version, "Adding pods/ephemeralcontainers");
                }
                RuleWithOperations {
                    api_groups: Some(vec![gv.group.clone()]),
                    api_versions: Some(vec![gv.version.clone()]),
                    resources: Some(resources.iter().cloned().collect()),
                    operations: operations.clone(),
                    ..Default::default()
                }
            })
            .collect::<Vec<_>>();
        rules.sort_by(cmp_rules);

        debug!(
            failure_policy = %self.failure_policy,
            rules = rules.len(),
            "Built webhook rules"
        );
        rules
    }

    /// Renders a validating webhook routing `ops` on all registered
    /// resources to `client_config`.
    pub fn to_validating_webhook(
        &mut self,
        name: impl Into<String>,
        client_config: WebhookClientConfig,
        ops: &[Operation],
    ) -> ValidatingWebhook {
        ValidatingWebhook {
            name: name.into(),
            client_config,
            rules: Some(self.build_rules(ops)),
            failure_policy: Some(self.failure_policy.to_string()),
            timeout_seconds: Some(self.max_timeout),
            side_effects: SIDE_EFFECTS.to_string(),
            admission_review_versions: vec![ADMISSION_REVIEW_VERSION.to_string()],
            ..Default::default()
        }
    }

    /// Renders a mutating webhook routing `ops` on all registered resources
    /// to `client_config`.
    pub fn to_mutating_webhook(
        &mut self,
        name: impl Into<String>,
        client_config: WebhookClientConfig,
        ops: &[Operation],
    ) -> MutatingWebhook {
        MutatingWebhook {
            name: name.into(),
            client_config,
            rules: Some(self.build_rules(ops)),
            failure_policy: Some(self.failure_policy.to_string()),
            timeout_seconds: Some(self.max_timeout),
            side_effects: SIDE_EFFECTS.to_string(),
            admission_review_versions: vec![ADMISSION_REVIEW_VERSION.to_string()],
            reinvocation_policy: Some(REINVOCATION_POLICY.to_string()),
            ..Default::default()
        }
    }
}

fn covers_pods(gv: &GroupVersion, resources: &BTreeSet<String>) -> bool {
    (gv.group.is_empty() || gv.group == WILDCARD)
        && (gv.version == "v1" || gv.version == WILDCARD)
        && (resources.contains(PODS) || resources.contains(WILDCARD))
}

fn cmp_rules(a: &RuleWithOperations, b: &RuleWithOperations) -> Ordering {
    cmp_lists(&a.api_groups, &b.api_groups)
        .then_with(|| cmp_lists(&a.api_versions, &b.api_versions))
        .then_with(|| cmp_lists(&a.resources, &b.resources))
}

/// Shorter lists sort first; lists of equal length compare element-wise.
fn cmp_lists(a: &Option<Vec<String>>, b: &Option<Vec<String>>) -> Ordering {
    let a = a.as_deref().unwrap_or_default();
    let b = b.as_deref().unwrap_or_default();
    a.len().cmp(&b.len()).then_with(|| {
        a.iter()
            .zip(b)
            .map(|(a, b)| a.cmp(b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

// === impl Operation ===

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Connect => "CONNECT",
            Self::All => WILDCARD,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = InvalidOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "CONNECT" => Ok(Self::Connect),
            WILDCARD => Ok(Self::All),
            s => Err(InvalidOperation(s.to_string())),
        }
    }
}
