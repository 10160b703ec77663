#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod args;
mod count;
mod rules;

pub use self::args::Args;
pub use policy_webhook_core as core;
pub use policy_webhook_k8s_api as k8s;
