use crate::{count, rules};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[clap(name = "policy-webhook", about = "Admission webhook rules for policies")]
pub struct Args {
    #[clap(
        long,
        default_value = "policy_webhook=info,warn",
        env = "POLICY_WEBHOOK_LOG"
    )]
    log_level: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Renders the webhook configuration covering a set of resources.
    Rules(rules::Args),

    /// Computes the rule counts reported in the status of policies.
    Count(count::Args),
}

impl Args {
    #[inline]
    pub fn parse_and_run() -> Result<()> {
        Self::parse().run()
    }

    pub fn run(self) -> Result<()> {
        let Self { log_level, command } = self;

        tracing_subscriber::registry()
            .with(EnvFilter::try_new(log_level)?)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;

        let out = match command {
            Command::Rules(args) => args.run()?,
            Command::Count(args) => args.run()?,
        };
        print!("{out}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FailurePolicy, Operation};

    #[test]
    fn parses_rules_command() {
        let args = Args::try_parse_from([
            "policy-webhook",
            "rules",
            "--resource=v1/pods",
            "--resource",
            "apps/v1/deployments",
            "--operation=CREATE",
            "--operation=UPDATE",
            "--failure-policy=Ignore",
            "--timeout=15",
            "--mutating",
        ])
        .expect("arguments must parse");

        let Command::Rules(rules) = args.command else {
            panic!("expected rules command");
        };
        assert_eq!(rules.resources.len(), 2);
        assert_eq!(rules.operations, vec![Operation::Create, Operation::Update]);
        assert_eq!(rules.failure_policy, FailurePolicy::Ignore);
        assert_eq!(rules.timeout, 15);
        assert!(rules.mutating);
    }

    #[test]
    fn rejects_invalid_resource() {
        assert!(Args::try_parse_from(["policy-webhook", "rules", "--resource=pods"]).is_err());
    }

    #[test]
    fn parses_count_command() {
        let args = Args::try_parse_from(["policy-webhook", "count", "a.yaml", "b.yaml"])
            .expect("arguments must parse");
        let Command::Count(count) = args.command else {
            panic!("expected count command");
        };
        assert_eq!(count.files.len(), 2);
    }
}
