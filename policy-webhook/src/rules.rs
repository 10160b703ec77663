use crate::{
    core::{object_meta, FailurePolicy, GroupVersionResource, Operation, Webhook},
    k8s::{
        admissionregistration::{
            MutatingWebhookConfiguration, ServiceReference, ValidatingWebhookConfiguration,
            WebhookClientConfig,
        },
        ObjectMeta,
    },
};
use anyhow::{anyhow, Result};
use tracing::info;

#[derive(Debug, clap::Args)]
pub(crate) struct Args {
    /// A resource routed to the webhook, as `[group/]version/resource`.
    #[clap(long = "resource")]
    pub(crate) resources: Vec<GroupVersionResource>,

    /// An operation routed to the webhook.
    #[clap(long = "operation", default_values_t = vec![Operation::Create, Operation::Update])]
    pub(crate) operations: Vec<Operation>,

    #[clap(long, default_value_t = FailurePolicy::Fail)]
    pub(crate) failure_policy: FailurePolicy,

    /// Webhook timeout in seconds.
    #[clap(long, default_value = "10")]
    pub(crate) timeout: i32,

    /// The name of the webhook configuration.
    #[clap(long, default_value = "policy-webhook")]
    name: String,

    /// The name of the webhook within the configuration. Defaults to
    /// `validate.<service-name>.svc` (or `mutate.` with `--mutating`).
    #[clap(long)]
    webhook_name: Option<String>,

    #[clap(long = "annotation", value_parser = parse_annotation)]
    annotations: Vec<(String, String)>,

    #[clap(long, default_value = "policy-webhook")]
    service_name: String,

    #[clap(long, default_value = "policy-webhook")]
    service_namespace: String,

    #[clap(long, default_value = "443")]
    service_port: i32,

    /// Renders a mutating rather than a validating webhook configuration.
    #[clap(long)]
    pub(crate) mutating: bool,
}

fn parse_annotation(s: &str) -> Result<(String, String)> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("annotation must be formatted as KEY=VALUE"))?;
    Ok((k.to_string(), v.to_string()))
}

// === impl Args ===

impl Args {
    pub(crate) fn run(self) -> Result<String> {
        info!(
            resources = self.resources.len(),
            failure_policy = %self.failure_policy,
            mutating = self.mutating,
            "Rendering webhook configuration"
        );
        let yaml = if self.mutating {
            serde_yaml::to_string(&self.mutating_configuration())?
        } else {
            serde_yaml::to_string(&self.validating_configuration())?
        };
        Ok(yaml)
    }

    fn webhook(&self) -> Webhook {
        let mut webhook = Webhook::new(self.timeout, self.failure_policy);
        for gvr in &self.resources {
            webhook.set(gvr.clone());
        }
        webhook
    }

    fn metadata(&self) -> ObjectMeta {
        object_meta(
            self.name.clone(),
            self.annotations.iter().cloned().collect(),
            vec![],
        )
    }

    fn webhook_name(&self, action: &str) -> String {
        self.webhook_name
            .clone()
            .unwrap_or_else(|| format!("{action}.{}.svc", self.service_name))
    }

    fn client_config(&self, path: &str) -> WebhookClientConfig {
        WebhookClientConfig {
            service: Some(ServiceReference {
                name: self.service_name.clone(),
                namespace: self.service_namespace.clone(),
                path: Some(path.to_string()),
                port: Some(self.service_port),
            }),
            ..Default::default()
        }
    }

    pub(crate) fn validating_configuration(&self) -> ValidatingWebhookConfiguration {
        let mut webhook = self.webhook();
        let webhooks = (!webhook.is_empty()).then(|| {
            vec![webhook.to_validating_webhook(
                self.webhook_name("validate"),
                self.client_config("/validate"),
                &self.operations,
            )]
        });
        ValidatingWebhookConfiguration {
            metadata: self.metadata(),
            webhooks,
        }
    }

    pub(crate) fn mutating_configuration(&self) -> MutatingWebhookConfiguration {
        let mut webhook = self.webhook();
        let webhooks = (!webhook.is_empty()).then(|| {
            vec![webhook.to_mutating_webhook(
                self.webhook_name("mutate"),
                self.client_config("/mutate"),
                &self.operations,
            )]
        });
        MutatingWebhookConfiguration {
            metadata: self.metadata(),
            webhooks,
        }
    }
}
