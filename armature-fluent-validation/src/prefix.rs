// Rule set prefixing for nested and repeated structures

use crate::config::ValidatorConfig;
use crate::rules::{Rule, RuleSet, RuleSpec, DEFAULT_RULE_DELIMITER};
use tracing::trace;

/// Rules whose arguments are names of sibling fields
pub const CONDITIONAL_REQUIREMENTS: [&str; 7] = [
    "required_if",
    "required_if_accepted",
    "required_if_declined",
    "required_without",
    "required_without_all",
    "required_with",
    "required_with_all",
];

/// Tokens marking a field as optional
const OPTIONAL_MARKERS: [&str; 2] = ["nullable", "sometimes"];

/// Rewrites rule sets under a field prefix.
///
/// Nested and repeated structures (`address.*`, `items.*.price`) are
/// validated by re-keying a rule set under a namespace. Rules that reference
/// sibling fields, such as `required_with:street`, are rewritten to point at
/// the prefixed siblings as well.
///
/// ```
/// use armature_fluent_validation::{prefix_rules, rule_set, RuleSpec};
///
/// let rules = rule_set([("city", "required_with:street")]);
/// let prefixed = prefix_rules(&rules, Some("address"), &[]);
///
/// assert_eq!(
///     prefixed["address.city"],
///     RuleSpec::list(["required_with:address.street"])
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RuleSetPrefixer {
    delimiter: char,
}

impl Default for RuleSetPrefixer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&ValidatorConfig> for RuleSetPrefixer {
    fn from(config: &ValidatorConfig) -> Self {
        Self::new().with_delimiter(config.rule_delimiter)
    }
}

impl RuleSetPrefixer {
    pub fn new() -> Self {
        Self {
            delimiter: DEFAULT_RULE_DELIMITER,
        }
    }

    /// Use a custom separator when splitting delimited rule strings
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Apply `excepts` and then `prefix` to `rules`, returning a new rule set.
    ///
    /// Fields listed in `excepts` lose every rule containing `required` and
    /// gain a leading `sometimes`. When `prefix` is set, every field is
    /// re-keyed as `<prefix>.<field>`, conditional requirement arguments are
    /// prefixed, and fields with no optional marker get a
    /// `required_unless:<parent>,null` guard. An empty prefix is treated as
    /// no prefix.
    pub fn prefix(&self, rules: &RuleSet, prefix: Option<&str>, excepts: &[&str]) -> RuleSet {
        let rules = self.apply_excepts(rules, excepts);

        match prefix.filter(|p| !p.is_empty()) {
            Some(prefix) => self.apply_prefix(rules, prefix),
            None => rules,
        }
    }

    fn apply_excepts(&self, rules: &RuleSet, excepts: &[&str]) -> RuleSet {
        rules
            .iter()
            .map(|(field, spec)| {
                if !excepts.contains(&field.as_str()) {
                    return (field.clone(), spec.clone());
                }

                let mut optional = vec![Rule::from("sometimes")];
                optional.extend(
                    spec.to_rules(self.delimiter)
                        .into_iter()
                        .filter(|rule| !rule.as_token().is_some_and(|t| t.contains("required"))),
                );
                trace!(field = %field, "Relaxed required rules for excepted field");

                (field.clone(), RuleSpec::List(optional))
            })
            .collect()
    }

    fn apply_prefix(&self, rules: RuleSet, prefix: &str) -> RuleSet {
        let parent = prefix.strip_suffix(".*").unwrap_or(prefix);
        let guard = format!("required_unless:{},null", parent);

        trace!(prefix = prefix, fields = rules.len(), "Prefixing rule set");

        rules
            .into_iter()
            .map(|(field, spec)| {
                let components = spec.to_rules(self.delimiter);

                let mut output = Vec::with_capacity(components.len() + 1);
                if !components.iter().any(|rule| is_optional(rule) || is_conditional(rule)) {
                    output.push(Rule::Token(guard.clone()));
                }

                output.extend(components.into_iter().map(|rule| {
                    if is_conditional(&rule) {
                        prefix_arguments(&rule, prefix)
                    } else {
                        rule
                    }
                }));

                (format!("{}.{}", prefix, field), RuleSpec::List(output))
            })
            .collect()
    }
}

/// Apply `excepts` and `prefix` with the default prefixer
pub fn prefix_rules(rules: &RuleSet, prefix: Option<&str>, excepts: &[&str]) -> RuleSet {
    RuleSetPrefixer::new().prefix(rules, prefix, excepts)
}

fn is_optional(rule: &Rule) -> bool {
    rule.as_token()
        .is_some_and(|token| OPTIONAL_MARKERS.contains(&token))
}

/// Only tokens carrying arguments count as conditional requirements
fn is_conditional(rule: &Rule) -> bool {
    rule.arguments().is_some() && CONDITIONAL_REQUIREMENTS.contains(&rule.name())
}

fn prefix_arguments(rule: &Rule, prefix: &str) -> Rule {
    let arguments = rule
        .arguments()
        .unwrap_or_default()
        .split(',')
        .filter(|arg| !arg.is_empty())
        .map(|arg| format!("{}.{}", prefix, arg))
        .collect::<Vec<_>>()
        .join(",");

    Rule::Token(format!("{}:{}", rule.name(), arguments))
}
