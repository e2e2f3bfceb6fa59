// Validation traits

use crate::errors::{ErrorBag, Result, ValidationError, ValidationFailed};
use crate::prefix::RuleSetPrefixer;
use crate::request::ValidationRequest;
use crate::rules::{Messages, RuleSet, Values};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Trait for types that provide a rule set
pub trait Validatable {
    /// Rules used when creating a resource
    fn rules(&self) -> RuleSet;

    /// Rules used when updating a resource. `None` means the subject has no
    /// dedicated update rules and [`Validatable::rules`] applies.
    fn update_rules(&self) -> Option<RuleSet> {
        None
    }

    /// Custom error messages
    fn messages(&self) -> Messages {
        Messages::new()
    }

    /// Values carried by a self-describing subject (preferred accessor)
    fn all(&self) -> Option<Value> {
        None
    }

    /// Values carried by a self-describing subject (fallback accessor)
    fn to_array(&self) -> Option<Value> {
        None
    }

    /// Values after the subject's preparation step, if it has one
    fn before_validation(&self) -> Option<Value> {
        None
    }
}

impl<T: Validatable + ?Sized> Validatable for Box<T> {
    fn rules(&self) -> RuleSet {
        (**self).rules()
    }

    fn update_rules(&self) -> Option<RuleSet> {
        (**self).update_rules()
    }

    fn messages(&self) -> Messages {
        (**self).messages()
    }

    fn all(&self) -> Option<Value> {
        (**self).all()
    }

    fn to_array(&self) -> Option<Value> {
        (**self).to_array()
    }

    fn before_validation(&self) -> Option<Value> {
        (**self).before_validation()
    }
}

/// Select the rule set of `subject` for a create or update pass
pub fn resolve_rules(subject: &dyn Validatable, updating: bool) -> RuleSet {
    if updating {
        if let Some(rules) = subject.update_rules() {
            return rules;
        }
    }
    subject.rules()
}

/// Pull the values of a self-describing subject.
///
/// `all()` is preferred over `to_array()`. When `prepare` is set and the
/// subject has a preparation step, its prepared values win.
pub fn subject_values(subject: &dyn Validatable, prepare: bool) -> Result<Values> {
    let prepared = if prepare { subject.before_validation() } else { None };

    let value = prepared
        .or_else(|| subject.all())
        .or_else(|| subject.to_array())
        .ok_or_else(|| {
            ValidationError::configuration(
                "validatable subject must provide all() or to_array() \
                 to be validated without values",
            )
        })?;

    match value {
        Value::Object(values) => Ok(values),
        other => Err(ValidationError::configuration(format!(
            "all() or to_array() must return a mapping, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Host container hook resolving validatable classes by name
pub trait ClassResolver {
    fn resolve(&self, class: &str) -> Option<Box<dyn Validatable>>;
}

impl<F> ClassResolver for F
where
    F: Fn(&str) -> Option<Box<dyn Validatable>>,
{
    fn resolve(&self, class: &str) -> Option<Box<dyn Validatable>> {
        self(class)
    }
}

type Constructor = Arc<dyn Fn() -> Box<dyn Validatable> + Send + Sync>;

/// Name under which [`ClassRegistry::register`] stores a type
pub fn class_name<T: ?Sized>() -> &'static str {
    std::any::type_name::<T>()
}

/// Registry of no-argument constructors, used when no container is available
#[derive(Clone, Default)]
pub struct ClassRegistry {
    constructors: HashMap<String, Constructor>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its type name, constructed with `Default`
    pub fn register<T>(mut self) -> Self
    where
        T: Validatable + Default + 'static,
    {
        self.constructors.insert(
            class_name::<T>().to_string(),
            Arc::new(|| Box::new(T::default()) as Box<dyn Validatable>),
        );
        self
    }

    /// Register a constructor under an explicit name
    pub fn register_with<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn Validatable> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
        self
    }

    /// Check if a name is registered
    pub fn contains(&self, class: &str) -> bool {
        self.constructors.contains_key(class)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl ClassResolver for ClassRegistry {
    fn resolve(&self, class: &str) -> Option<Box<dyn Validatable>> {
        self.constructors.get(class).map(|constructor| constructor())
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Trait for validators driving a rule engine
pub trait Validator {
    /// Run one validation. A failed validation is not an error here;
    /// check [`Validator::fails`].
    fn validate(&mut self, request: ValidationRequest<'_>) -> Result<&mut Self>;

    /// Whether the last validation produced errors
    fn fails(&self) -> bool;

    /// Errors of the last validation
    fn errors(&self) -> &ErrorBag;

    /// Use update rules for the next validation only
    fn updating(&mut self) -> &mut Self;
}

/// Validation entry points on the subject itself
pub trait SelfValidating: Validatable + Sized {
    /// Validate the subject's own values, failing with
    /// [`ValidationError::Failed`] when rules do not pass
    fn validate_using<V: Validator>(&self, validator: &mut V) -> Result<&Self> {
        let validator = validator.validate(ValidationRequest::view(self))?;
        if validator.fails() {
            return Err(ValidationFailed::new(validator.errors().clone()).into());
        }
        Ok(self)
    }

    /// Validate, then pass the subject to `callback`
    fn validate_using_then<V, F, R>(&self, validator: &mut V, callback: F) -> Result<R>
    where
        V: Validator,
        F: FnOnce(&Self) -> R,
    {
        self.validate_using(validator).map(callback)
    }

    /// Validate against the update rules
    fn validated_for_update<V: Validator>(&self, validator: &mut V) -> Result<&Self> {
        self.validate_using(validator.updating())
    }
}

impl<T: Validatable> SelfValidating for T {}

/// Builds prefixed rule sets from a freshly constructed subject
pub trait RulesFactory: Validatable + Sized {
    /// Construct the subject with the given input attributes
    fn from_attributes(attributes: Values) -> Self;

    /// Prefixed create rules
    fn create_rules(prefix: Option<&str>, attributes: Values, excepts: &[&str]) -> RuleSet {
        Self::create_rules_with(&RuleSetPrefixer::new(), prefix, attributes, excepts)
    }

    /// Prefixed update rules, falling back to create rules
    fn create_update_rules(prefix: Option<&str>, attributes: Values, excepts: &[&str]) -> RuleSet {
        Self::create_update_rules_with(&RuleSetPrefixer::new(), prefix, attributes, excepts)
    }

    /// Prefixed create rules, split with `prefixer`'s delimiter
    fn create_rules_with(
        prefixer: &RuleSetPrefixer,
        prefix: Option<&str>,
        attributes: Values,
        excepts: &[&str],
    ) -> RuleSet {
        prefixer.prefix(&Self::from_attributes(attributes).rules(), prefix, excepts)
    }

    /// Prefixed update rules, split with `prefixer`'s delimiter
    fn create_update_rules_with(
        prefixer: &RuleSetPrefixer,
        prefix: Option<&str>,
        attributes: Values,
        excepts: &[&str],
    ) -> RuleSet {
        let subject = Self::from_attributes(attributes);
        let rules = subject.update_rules().unwrap_or_else(|| subject.rules());
        prefixer.prefix(&rules, prefix, excepts)
    }
}
