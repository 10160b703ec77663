#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod labels;
pub mod policy;

pub use self::policy::{
    ClusterPolicy, ClusterPolicySpec, FailurePolicy, InvalidFailurePolicy, PolicyStatus, Rule,
    RuleCountStatus,
};
pub use k8s_openapi::{
    api::{self, admissionregistration::v1 as admissionregistration},
    apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference},
};
pub use kube::{core::TypeMeta, Resource, ResourceExt};
