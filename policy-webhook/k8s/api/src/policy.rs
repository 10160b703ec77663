use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A cluster-wide set of admission rules.
#[derive(Clone, Debug, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "policy-webhook.io",
    version = "v1",
    kind = "ClusterPolicy",
    status = "PolicyStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPolicySpec {
    #[serde(default)]
    pub rules: Vec<Rule>,

    /// How the API server treats requests when the webhook cannot be reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_policy: Option<FailurePolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_timeout_seconds: Option<i32>,
}

/// A single policy rule. Its kind is determined by which actions it declares;
/// a rule may declare more than one.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<Validation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutate: Option<Mutation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate: Option<Generation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verify_images: Vec<ImageVerification>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_pattern: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Mutation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_strategic_merge: Option<serde_json::Value>,

    #[serde(
        default,
        rename = "patchesJson6902",
        skip_serializing_if = "Option::is_none"
    )]
    pub patches_json6902: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageVerification {
    #[serde(default)]
    pub image_references: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestors: Option<serde_json::Value>,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize, JsonSchema,
)]
pub enum FailurePolicy {
    Ignore,
    #[default]
    Fail,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid failure policy {0:?}: expected Ignore or Fail")]
pub struct InvalidFailurePolicy(String);

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatus {
    #[serde(default)]
    pub rule_count: RuleCountStatus,
}

/// The number of user-authored rules of each kind in a policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct RuleCountStatus {
    pub validate: usize,
    pub generate: usize,
    pub mutate: usize,
    #[serde(rename = "verifyimages")]
    pub verify_images: usize,
}

// === impl Rule ===

impl Rule {
    /// An empty `validate: {}` block does not make a validation rule.
    pub fn has_validate(&self) -> bool {
        self.validate
            .as_ref()
            .is_some_and(|v| *v != Validation::default())
    }

    pub fn has_mutate(&self) -> bool {
        self.mutate
            .as_ref()
            .is_some_and(|m| *m != Mutation::default())
    }

    pub fn has_generate(&self) -> bool {
        self.generate
            .as_ref()
            .is_some_and(|g| *g != Generation::default())
    }

    pub fn has_verify_images(&self) -> bool {
        !self.verify_images.is_empty()
    }
}

// === impl FailurePolicy ===

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "Ignore",
            Self::Fail => "Fail",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = InvalidFailurePolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ignore" => Ok(Self::Ignore),
            "Fail" => Ok(Self::Fail),
            s => Err(InvalidFailurePolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_policy_manifest() {
        let policy: ClusterPolicy = serde_yaml::from_str(
            r#"
apiVersion: policy-webhook.io/v1
kind: ClusterPolicy
metadata:
  name: require-labels
spec:
  failurePolicy: Ignore
  webhookTimeoutSeconds: 5
  rules:
    - name: check-team
      validate:
        message: "label `team` is required"
        pattern:
          metadata:
            labels:
              team: "?*"
    - name: add-default
      mutate:
        patchStrategicMerge:
          metadata:
            labels:
              +(team): platform
    - name: empty
      validate: {}
    - name: signed
      verifyImages:
        - imageReferences: ["ghcr.io/acme/*"]
"#,
        )
        .expect("policy must parse");

        assert_eq!(policy.spec.failure_policy, Some(FailurePolicy::Ignore));
        assert_eq!(policy.spec.webhook_timeout_seconds, Some(5));

        let kinds = policy
            .spec
            .rules
            .iter()
            .map(|r| {
                (
                    r.name.as_str(),
                    r.has_validate(),
                    r.has_mutate(),
                    r.has_generate(),
                    r.has_verify_images(),
                )
            })
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                ("check-team", true, false, false, false),
                ("add-default", false, true, false, false),
                ("empty", false, false, false, false),
                ("signed", false, false, false, true),
            ]
        );
    }

    #[test]
    fn rule_count_status_wire_names() {
        let status = PolicyStatus {
            rule_count: RuleCountStatus {
                validate: 1,
                generate: 2,
                mutate: 3,
                verify_images: 4,
            },
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ruleCount": {
                    "validate": 1,
                    "generate": 2,
                    "mutate": 3,
                    "verifyimages": 4,
                }
            })
        );
    }

    #[test]
    fn failure_policy_parse() {
        assert_eq!("Fail".parse::<FailurePolicy>().unwrap(), FailurePolicy::Fail);
        assert_eq!(
            "Ignore".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::Ignore
        );
        assert!("fail".parse::<FailurePolicy>().is_err());
        assert_eq!(FailurePolicy::Ignore.to_string(), "Ignore");
    }
}
