// Rule tokens and rule sets

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Input values handed to the rule engine
pub type Values = serde_json::Map<String, serde_json::Value>;

/// Custom messages keyed by `field.rule` or `field`
pub type Messages = BTreeMap<String, String>;

/// Full mapping from field name to rules for one validation pass
pub type RuleSet = BTreeMap<String, RuleSpec>;

/// Default separator of delimited rule strings (`"required|numeric"`)
pub const DEFAULT_RULE_DELIMITER: char = '|';

/// A rule implemented outside of the string token syntax.
///
/// The validation layer never evaluates these; they are forwarded to the
/// rule engine untouched.
pub trait RuleObject: fmt::Debug + Send + Sync {
    /// Name used for logging and debugging
    fn name(&self) -> &str;
}

/// A single entry of a rule list
#[derive(Debug, Clone)]
pub enum Rule {
    /// `name` or `name:arg1,arg2`
    Token(String),
    /// Opaque rule object
    Object(Arc<dyn RuleObject>),
}

impl Rule {
    /// Wrap a rule object
    pub fn object<R: RuleObject + 'static>(rule: R) -> Self {
        Rule::Object(Arc::new(rule))
    }

    /// Token text, if this is a string rule
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Rule::Token(token) => Some(token),
            Rule::Object(_) => None,
        }
    }

    /// Rule name: the part of a token before `:`, or the object's name
    pub fn name(&self) -> &str {
        match self {
            Rule::Token(token) => token.split_once(':').map_or(token.as_str(), |(name, _)| name),
            Rule::Object(object) => object.name(),
        }
    }

    /// Arguments of a token (`required_with:a,b` yields `a,b`)
    pub fn arguments(&self) -> Option<&str> {
        self.as_token()
            .and_then(|token| token.split_once(':'))
            .map(|(_, args)| args)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Rule::Token(a), Rule::Token(b)) => a == b,
            (Rule::Object(a), Rule::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Token(token) => f.write_str(token),
            Rule::Object(object) => write!(f, "<{}>", object.name()),
        }
    }
}

impl From<&str> for Rule {
    fn from(token: &str) -> Self {
        Rule::Token(token.to_string())
    }
}

impl From<String> for Rule {
    fn from(token: String) -> Self {
        Rule::Token(token)
    }
}

/// Rules attached to a single field
#[derive(Debug, Clone, PartialEq)]
pub enum RuleSpec {
    /// Delimited token string, e.g. `"required|numeric"`
    Delimited(String),
    /// Ordered rule list
    List(Vec<Rule>),
}

impl RuleSpec {
    /// Build a list spec from anything convertible into rules
    pub fn list<I, R>(rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Rule>,
    {
        RuleSpec::List(rules.into_iter().map(Into::into).collect())
    }

    /// Split into an ordered rule list using `delimiter` for string specs
    pub fn to_rules(&self, delimiter: char) -> Vec<Rule> {
        match self {
            RuleSpec::Delimited(spec) => spec.split(delimiter).map(Rule::from).collect(),
            RuleSpec::List(rules) => rules.clone(),
        }
    }

    /// Split into an ordered rule list using the default delimiter
    pub fn rules(&self) -> Vec<Rule> {
        self.to_rules(DEFAULT_RULE_DELIMITER)
    }

    /// Check if any string token equals `token`
    pub fn contains(&self, token: &str) -> bool {
        self.rules().iter().any(|rule| rule.as_token() == Some(token))
    }
}

impl From<&str> for RuleSpec {
    fn from(spec: &str) -> Self {
        RuleSpec::Delimited(spec.to_string())
    }
}

impl From<String> for RuleSpec {
    fn from(spec: String) -> Self {
        RuleSpec::Delimited(spec)
    }
}

impl From<Vec<Rule>> for RuleSpec {
    fn from(rules: Vec<Rule>) -> Self {
        RuleSpec::List(rules)
    }
}

impl<const N: usize> From<[&str; N]> for RuleSpec {
    fn from(tokens: [&str; N]) -> Self {
        RuleSpec::list(tokens)
    }
}

/// Build a [`RuleSet`] from `(field, spec)` pairs.
///
/// ```
/// use armature_fluent_validation::{rule_set, RuleSpec};
///
/// let rules = rule_set([("y", "required|numeric")]);
/// assert_eq!(rules["y"], RuleSpec::from("required|numeric"));
/// ```
pub fn rule_set<I, K, S>(entries: I) -> RuleSet
where
    I: IntoIterator<Item = (K, S)>,
    K: Into<String>,
    S: Into<RuleSpec>,
{
    entries
        .into_iter()
        .map(|(field, spec)| (field.into(), spec.into()))
        .collect()
}
