use crate::{
    core::set_rule_count,
    k8s::{ClusterPolicy, PolicyStatus, Resource, ResourceExt, TypeMeta},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, trace};

#[derive(Debug, clap::Args)]
pub(crate) struct Args {
    /// Policy manifests. A file may hold several YAML documents.
    #[clap(required = true)]
    pub(crate) files: Vec<PathBuf>,
}

#[derive(Debug, PartialEq, Serialize)]
struct PolicyCount {
    name: String,
    status: PolicyStatus,
}

// === impl Args ===

impl Args {
    pub(crate) fn run(self) -> Result<String> {
        let mut counts = Vec::new();
        for path in &self.files {
            let manifest = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let policies = count_manifest(&manifest)
                .with_context(|| format!("failed to decode {}", path.display()))?;
            counts.extend(policies);
        }
        Ok(serde_yaml::to_string(&counts)?)
    }
}

/// Counts the rules of every `ClusterPolicy` in a manifest. Empty documents
/// and documents of other kinds are skipped.
fn count_manifest(manifest: &str) -> Result<Vec<PolicyCount>> {
    let mut counts = Vec::new();
    for (i, doc) in serde_yaml::Deserializer::from_str(manifest).enumerate() {
        let value = serde_yaml::Value::deserialize(doc)
            .with_context(|| format!("failed to parse document {i}"))?;
        if value.is_null() {
            trace!(document = i, "Skipping empty document");
            continue;
        }

        let types = serde_yaml::from_value::<TypeMeta>(value.clone())
            .with_context(|| format!("document {i} is not a Kubernetes object"))?;
        if types.api_version != *ClusterPolicy::api_version(&())
            || types.kind != *ClusterPolicy::kind(&())
        {
            debug!(
                document = i,
                api_version = %types.api_version,
                kind = %types.kind,
                "Skipping non-policy document"
            );
            continue;
        }

        let mut policy = serde_yaml::from_value::<ClusterPolicy>(value)
            .with_context(|| format!("failed to decode policy in document {i}"))?;
        let name = policy.name_any();
        let status = policy.status.get_or_insert_with(Default::default);
        set_rule_count(&policy.spec.rules, status);
        debug!(%name, rule_count = ?status.rule_count, "Counted rules");
        counts.push(PolicyCount {
            name,
            status: status.clone(),
        });
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::RuleCountStatus;
    use pretty_assertions::assert_eq;

    #[test]
    fn counts_each_document() {
        let counts = count_manifest(
            r#"
apiVersion: policy-webhook.io/v1
kind: ClusterPolicy
metadata:
  name: first
spec:
  rules:
    - name: check
      validate:
        message: denied
        deny: {}
    - name: autogen-check
      validate:
        message: denied
        deny: {}
status:
  ruleCount:
    validate: 9
    generate: 9
    mutate: 9
    verifyimages: 9
---
apiVersion: policy-webhook.io/v1
kind: ClusterPolicy
metadata:
  name: second
spec:
  rules:
    - name: both
      validate:
        message: denied
      mutate:
        patchesJson6902: "[]"
    - name: sync
      generate:
        kind: ConfigMap
        name: shared
"#,
        )
        .expect("manifest must decode");

        assert_eq!(
            counts,
            vec![
                PolicyCount {
                    name: "first".to_string(),
                    status: PolicyStatus {
                        rule_count: RuleCountStatus {
                            validate: 1,
                            ..Default::default()
                        },
                    },
                },
                PolicyCount {
                    name: "second".to_string(),
                    status: PolicyStatus {
                        rule_count: RuleCountStatus {
                            validate: 1,
                            mutate: 1,
                            generate: 1,
                            verify_images: 0,
                        },
                    },
                },
            ]
        );
    }

    #[test]
    fn skips_other_kinds_and_empty_documents() {
        let counts = count_manifest(
            r#"
apiVersion: policy-webhook.io/v1
kind: ClusterPolicy
metadata:
  name: p
spec:
  rules:
    - name: check
      validate:
        message: denied
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: cm
data:
  rules: "[]"
---
---
apiVersion: policy-webhook.io/v2
kind: ClusterPolicy
metadata:
  name: future
spec: {}
---
"#,
        )
        .expect("manifest must decode");

        assert_eq!(
            counts,
            vec![PolicyCount {
                name: "p".to_string(),
                status: PolicyStatus {
                    rule_count: RuleCountStatus {
                        validate: 1,
                        ..Default::default()
                    },
                },
            }]
        );
    }

    #[test]
    fn empty_manifest() {
        assert!(count_manifest("").expect("manifest must decode").is_empty());
        assert!(count_manifest("---\n").expect("manifest must decode").is_empty());
    }

    #[test]
    fn rejects_untyped_document() {
        assert!(count_manifest("metadata:\n  name: orphan\n").is_err());
    }

    #[test]
    fn rejects_malformed_policy() {
        let manifest = "apiVersion: policy-webhook.io/v1\nkind: ClusterPolicy\nspec: 7\n";
        assert!(count_manifest(manifest).is_err());
    }
}
