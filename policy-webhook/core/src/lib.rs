#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod gvr;
mod meta;
mod rule_count;
pub mod webhook;

pub use self::{
    gvr::{GroupVersion, GroupVersionResource, InvalidGvr},
    meta::object_meta,
    rule_count::{count_rules, is_autogen, set_rule_count, AUTOGEN_PREFIX},
    webhook::{InvalidOperation, Operation, Webhook},
};
pub use policy_webhook_k8s_api::{FailurePolicy, InvalidFailurePolicy};
