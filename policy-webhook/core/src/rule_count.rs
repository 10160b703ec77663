use policy_webhook_k8s_api::{PolicyStatus, Rule, RuleCountStatus};

/// Names of rules generated from user-authored rules (e.g. to cover pod
/// controllers) start with this prefix.
pub const AUTOGEN_PREFIX: &str = "autogen-";

pub fn is_autogen(rule: &Rule) -> bool {
    rule.name.starts_with(AUTOGEN_PREFIX)
}

/// Counts the user-authored rules of each kind. A rule declaring several
/// actions is counted once for each of them.
pub fn count_rules<'r>(rules: impl IntoIterator<Item = &'r Rule>) -> RuleCountStatus {
    let mut counts = RuleCountStatus::default();
    for rule in rules.into_iter().filter(|r| !is_autogen(r)) {
        if rule.has_validate() {
            counts.validate += 1;
        }
        if rule.has_mutate() {
            counts.mutate += 1;
        }
        if rule.has_generate() {
            counts.generate += 1;
        }
        if rule.has_verify_images() {
            counts.verify_images += 1;
        }
    }
    counts
}

/// Replaces the status' rule counts with those of `rules`.
pub fn set_rule_count(rules: &[Rule], status: &mut PolicyStatus) {
    status.rule_count = count_rules(rules);
}
