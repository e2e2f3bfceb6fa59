// Validation call shapes

use crate::errors::{Result, ValidationError};
use crate::rules::{Messages, Rule, RuleSet, RuleSpec, Values};
use crate::traits::{resolve_rules, subject_values, ClassResolver, Validatable};
use serde_json::Value;
use std::fmt;

/// One validation call.
///
/// Each variant is one of the accepted call shapes. Use the constructor
/// functions, or [`ValidationRequest::from_args`] for shapes that arrive as
/// JSON data.
pub enum ValidationRequest<'a> {
    /// Validate values against explicit rules
    RulesAndValues {
        rules: RuleSet,
        values: Values,
        messages: Messages,
    },
    /// Resolve a validatable class by name and validate values against it
    ClassAndValues { class: String, values: Values },
    /// Validate values against an existing subject's rules
    ObjectAndValues {
        subject: &'a dyn Validatable,
        values: Values,
    },
    /// Validate a self-describing subject's own values
    ObjectOnly { subject: &'a dyn Validatable },
}

/// Values, rules and messages handed to the rule engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRequest {
    pub values: Values,
    pub rules: RuleSet,
    pub messages: Messages,
}

impl<'a> ValidationRequest<'a> {
    pub fn rules(rules: RuleSet, values: Values) -> Self {
        ValidationRequest::RulesAndValues {
            rules,
            values,
            messages: Messages::new(),
        }
    }

    pub fn class(class: impl Into<String>, values: Values) -> Self {
        ValidationRequest::ClassAndValues {
            class: class.into(),
            values,
        }
    }

    pub fn object(subject: &'a dyn Validatable, values: Values) -> Self {
        ValidationRequest::ObjectAndValues { subject, values }
    }

    pub fn view(subject: &'a dyn Validatable) -> Self {
        ValidationRequest::ObjectOnly { subject }
    }

    /// Attach custom messages. Only explicit-rule requests carry messages;
    /// subjects provide their own.
    pub fn with_messages(mut self, custom: Messages) -> Self {
        if let ValidationRequest::RulesAndValues { messages, .. } = &mut self {
            *messages = custom;
        }
        self
    }

    /// Short name of the call shape
    pub fn shape(&self) -> &'static str {
        match self {
            ValidationRequest::RulesAndValues { .. } => "rules_and_values",
            ValidationRequest::ClassAndValues { .. } => "class_and_values",
            ValidationRequest::ObjectAndValues { .. } => "object_and_values",
            ValidationRequest::ObjectOnly { .. } => "object_only",
        }
    }

    /// Resolve the call into the triple handed to the engine.
    ///
    /// `updating` selects update rules for subject-based shapes. `prepare`
    /// runs the subject's preparation step for [`ValidationRequest::ObjectOnly`].
    pub fn normalize(
        self,
        resolver: &dyn ClassResolver,
        updating: bool,
        prepare: bool,
    ) -> Result<NormalizedRequest> {
        match self {
            ValidationRequest::RulesAndValues {
                rules,
                values,
                messages,
            } => Ok(NormalizedRequest {
                values,
                rules,
                messages,
            }),
            ValidationRequest::ClassAndValues { class, values } => {
                let subject = resolver.resolve(&class).ok_or_else(|| {
                    ValidationError::invalid_argument(format!(
                        "{} must exist and resolve to a validatable type",
                        class
                    ))
                })?;
                Ok(from_subject(subject.as_ref(), values, updating))
            }
            ValidationRequest::ObjectAndValues { subject, values } => {
                Ok(from_subject(subject, values, updating))
            }
            ValidationRequest::ObjectOnly { subject } => {
                let values = subject_values(subject, prepare)?;
                Ok(from_subject(subject, values, updating))
            }
        }
    }
}

fn from_subject(subject: &dyn Validatable, values: Values, updating: bool) -> NormalizedRequest {
    NormalizedRequest {
        values,
        rules: resolve_rules(subject, updating),
        messages: subject.messages(),
    }
}

impl ValidationRequest<'static> {
    /// Select a call shape by inspecting JSON arguments.
    ///
    /// Shapes are tried in order:
    /// 1. `[rules, values]` or `[rules, values, messages]` (all objects;
    ///    `messages` may be `null`)
    /// 2. `[class_name, values]`
    ///
    /// Anything else is an [`ValidationError::InvalidArgument`].
    pub fn from_args(args: &[Value]) -> Result<Self> {
        match args {
            [Value::Object(rules), Value::Object(values)] => {
                Ok(Self::rules(parse_rules(rules)?, values.clone()))
            }
            [Value::Object(rules), Value::Object(values), messages] => {
                Ok(Self::rules(parse_rules(rules)?, values.clone())
                    .with_messages(parse_messages(messages)?))
            }
            [Value::String(class), Value::Object(values)] => {
                Ok(Self::class(class.clone(), values.clone()))
            }
            _ => Err(ValidationError::invalid_argument(format!(
                "no validation call shape accepts {} argument(s) of the given types",
                args.len()
            ))),
        }
    }
}

fn parse_rules(rules: &Values) -> Result<RuleSet> {
    rules
        .iter()
        .map(|(field, spec)| {
            let spec = match spec {
                Value::String(spec) => RuleSpec::Delimited(spec.clone()),
                Value::Array(items) => RuleSpec::List(
                    items
                        .iter()
                        .map(|item| match item {
                            Value::String(token) => Ok(Rule::Token(token.clone())),
                            _ => Err(ValidationError::invalid_argument(format!(
                                "rules for {} must be strings",
                                field
                            ))),
                        })
                        .collect::<Result<Vec<_>>>()?,
                ),
                _ => {
                    return Err(ValidationError::invalid_argument(format!(
                        "rules for {} must be a string or a list of strings",
                        field
                    )));
                }
            };
            Ok((field.clone(), spec))
        })
        .collect()
}

fn parse_messages(messages: &Value) -> Result<Messages> {
    match messages {
        Value::Null => Ok(Messages::new()),
        Value::Object(map) => map
            .iter()
            .map(|(key, message)| match message {
                Value::String(message) => Ok((key.clone(), message.clone())),
                _ => Err(ValidationError::invalid_argument(format!(
                    "message for {} must be a string",
                    key
                ))),
            })
            .collect(),
        _ => Err(ValidationError::invalid_argument(
            "messages must be a mapping of strings",
        )),
    }
}

impl fmt::Debug for ValidationRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationRequest::RulesAndValues { rules, values, .. } => f
                .debug_struct("RulesAndValues")
                .field("rules", &rules.keys().collect::<Vec<_>>())
                .field("values", &values.len())
                .finish(),
            ValidationRequest::ClassAndValues { class, values } => f
                .debug_struct("ClassAndValues")
                .field("class", class)
                .field("values", &values.len())
                .finish(),
            ValidationRequest::ObjectAndValues { values, .. } => f
                .debug_struct("ObjectAndValues")
                .field("values", &values.len())
                .finish_non_exhaustive(),
            ValidationRequest::ObjectOnly { .. } => {
                f.debug_struct("ObjectOnly").finish_non_exhaustive()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::rule_set;
    use crate::traits::{class_name, ClassRegistry};
    use serde_json::json;

    #[derive(Default)]
    struct Product;

    impl Validatable for Product {
        fn rules(&self) -> RuleSet {
            rule_set([("y", "required|numeric")])
        }

        fn update_rules(&self) -> Option<RuleSet> {
            Some(rule_set([("y", "sometimes")]))
        }

        fn messages(&self) -> Messages {
            Messages::from([("y.required".to_string(), "y please".to_string())])
        }
    }

    fn values(value: Value) -> Values {
        match value {
            Value::Object(map) => map,
            _ => Values::new(),
        }
    }

    #[test]
    fn test_rules_and_values_pass_through() {
        let request =
            ValidationRequest::rules(rule_set([("x", "required")]), values(json!({"x": 1})))
                .with_messages(Messages::from([("x".to_string(), "needed".to_string())]));

        let normalized = request.normalize(&ClassRegistry::new(), true, true).unwrap();
        assert_eq!(normalized.rules, rule_set([("x", "required")]));
        assert_eq!(normalized.messages["x"], "needed");
    }

    #[test]
    fn test_class_shape_resolves_through_registry() {
        let registry = ClassRegistry::new().register::<Product>();
        let request = ValidationRequest::class(class_name::<Product>(), values(json!({"y": 1})));

        let normalized = request.normalize(&registry, false, true).unwrap();
        assert_eq!(normalized.rules, Product.rules());
        assert_eq!(normalized.messages["y.required"], "y please");
    }

    #[test]
    fn test_unknown_class_is_invalid_argument() {
        let request = ValidationRequest::class("Missing", Values::new());
        let err = request.normalize(&ClassRegistry::new(), false, true).unwrap_err();

        assert!(matches!(err, ValidationError::InvalidArgument(_)));
    }

    #[test]
    fn test_object_shape_uses_update_rules_when_updating() {
        let normalized = ValidationRequest::object(&Product, Values::new())
            .normalize(&ClassRegistry::new(), true, true)
            .unwrap();

        assert_eq!(normalized.rules, rule_set([("y", "sometimes")]));
    }

    #[test]
    fn test_object_only_without_accessor_is_configuration_error() {
        let err = ValidationRequest::view(&Product)
            .normalize(&ClassRegistry::new(), false, true)
            .unwrap_err();

        assert!(matches!(err, ValidationError::Configuration(_)));
    }

    #[test]
    fn test_from_args_rules_shape() {
        let request = ValidationRequest::from_args(&[
            json!({"x": "required", "y": ["nullable", "numeric"]}),
            json!({"x": 100}),
        ])
        .unwrap();

        assert_eq!(request.shape(), "rules_and_values");
        let normalized = request.normalize(&ClassRegistry::new(), false, true).unwrap();
        assert_eq!(normalized.rules["y"], RuleSpec::list(["nullable", "numeric"]));
    }

    #[test]
    fn test_from_args_accepts_null_messages() {
        let request =
            ValidationRequest::from_args(&[json!({"x": "required"}), json!({}), Value::Null])
                .unwrap();
        assert_eq!(request.shape(), "rules_and_values");
    }

    #[test]
    fn test_from_args_class_shape() {
        let request = ValidationRequest::from_args(&[json!("Product"), json!({"y": 1})]).unwrap();
        assert_eq!(request.shape(), "class_and_values");
    }

    #[test]
    fn test_from_args_rejects_unknown_shapes() {
        for args in [
            vec![],
            vec![json!({})],
            vec![json!(1), json!({})],
            vec![json!("Product"), json!([1])],
            vec![json!({"x": 1}), json!({})],
            vec![json!({"x": "required"}), json!({}), json!("msg")],
        ] {
            let err = ValidationRequest::from_args(&args).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidArgument(_)), "{:?}", args);
        }
    }
}
