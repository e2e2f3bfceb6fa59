// Validator adapter over a pluggable rule engine

use crate::after::{through, AfterCallback, Chained, ValidationState};
use crate::config::ValidatorConfig;
use crate::engine::{EngineOutcome, RuleEngine};
use crate::errors::{ErrorBag, Result, ValidationError};
use crate::prefix::RuleSetPrefixer;
use crate::request::ValidationRequest;
use crate::traits::{ClassRegistry, ClassResolver, Validator};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Drives a [`RuleEngine`] and keeps the errors of the last validation.
///
/// Every call to [`ValidatorAdapter::validate`] starts from an empty error
/// bag. [`ValidatorAdapter::updating`] applies to exactly one call.
///
/// An adapter holds per-call state; share one between threads only behind
/// external synchronization, or use one adapter per request.
///
/// ```
/// use armature_fluent_validation::*;
/// use serde_json::json;
///
/// let engine = |values: &Values, _: &RuleSet, _: &Messages| {
///     if values.contains_key("y") {
///         StaticOutcome::passed()
///     } else {
///         StaticOutcome::failed(ErrorBag::new().with("y.required", "y is required"))
///     }
/// };
///
/// let mut adapter = validator(engine);
/// let values = json!({"y": 100}).as_object().cloned().unwrap_or_default();
///
/// let result = adapter
///     .validate_then(
///         ValidationRequest::rules(rule_set([("y", "required")]), values),
///         |_| "saved",
///     )
///     .unwrap();
/// assert_eq!(result, "saved");
/// ```
pub struct ValidatorAdapter<E> {
    engine: E,
    resolver: Arc<dyn ClassResolver + Send + Sync>,
    config: ValidatorConfig,
    errors: ErrorBag,
    updating: bool,
}

impl<E: RuleEngine> ValidatorAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            resolver: Arc::new(ClassRegistry::new()),
            config: ValidatorConfig::default(),
            errors: ErrorBag::new(),
            updating: false,
        }
    }

    /// Resolve class-name requests through a host container
    pub fn with_resolver<R>(mut self, resolver: R) -> Self
    where
        R: ClassResolver + Send + Sync + 'static,
    {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// The underlying rule engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Prefixer using the configured rule delimiter
    pub fn prefixer(&self) -> RuleSetPrefixer {
        RuleSetPrefixer::from(&self.config)
    }

    /// Use update rules for the next validation only
    pub fn updating(&mut self) -> &mut Self {
        self.updating = true;
        self
    }

    /// Set the update flag explicitly. Prefer [`ValidatorAdapter::updating`].
    pub fn set_update(&mut self, update: bool) -> &mut Self {
        self.updating = update;
        self
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// Run one validation and store its errors.
    ///
    /// A failed validation is not an `Err`; check [`ValidatorAdapter::fails`].
    /// Errors are reserved for malformed requests.
    pub fn validate(&mut self, request: ValidationRequest<'_>) -> Result<&mut Self> {
        self.errors.clear();
        let updating = std::mem::take(&mut self.updating);

        trace!(shape = request.shape(), updating, "Validating request");

        let normalized = request
            .normalize(self.resolver.as_ref(), updating, self.config.prepare_views)
            .inspect_err(|e| {
                if let ValidationError::InvalidArgument(reason) = e {
                    warn!(reason = %reason, "Rejected validation request");
                }
            })?;

        let outcome = self
            .engine
            .make(&normalized.values, &normalized.rules, &normalized.messages);

        if outcome.fails() {
            self.errors = outcome.errors().into_bag();
            if self.config.log_failures && !self.errors.is_empty() {
                debug!(fields = self.errors.len(), "Validation failed");
            }
        }

        Ok(self)
    }

    /// Validate, then run `callback` with the adapter if it passed.
    ///
    /// Fails with [`ValidationError::Failed`] when the validation fails; the
    /// callback is not invoked in that case.
    pub fn validate_then<R, F>(&mut self, request: ValidationRequest<'_>, callback: F) -> Result<R>
    where
        F: FnOnce(&Self) -> R,
    {
        let validated: &Self = self.validate(request)?;
        through(validated, callback)
    }

    /// Validate with an optional callback.
    ///
    /// Without a callback the adapter is returned whatever the outcome.
    pub fn validate_with<R, F>(
        &mut self,
        request: ValidationRequest<'_>,
        callback: Option<F>,
    ) -> Result<Chained<&Self, R>>
    where
        F: FnOnce(&Self) -> R,
    {
        AfterCallback::from(callback).run_chained(move || self.validate(request).map(|v| &*v))
    }

    /// Whether the last validation produced errors
    pub fn fails(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors of the last validation
    pub fn errors(&self) -> &ErrorBag {
        &self.errors
    }
}

impl<E: RuleEngine> Validator for ValidatorAdapter<E> {
    fn validate(&mut self, request: ValidationRequest<'_>) -> Result<&mut Self> {
        ValidatorAdapter::validate(self, request)
    }

    fn fails(&self) -> bool {
        ValidatorAdapter::fails(self)
    }

    fn errors(&self) -> &ErrorBag {
        ValidatorAdapter::errors(self)
    }

    fn updating(&mut self) -> &mut Self {
        ValidatorAdapter::updating(self)
    }
}

impl<E: RuleEngine> ValidationState for ValidatorAdapter<E> {
    fn fails(&self) -> bool {
        ValidatorAdapter::fails(self)
    }

    fn errors(&self) -> &ErrorBag {
        ValidatorAdapter::errors(self)
    }
}

impl<E> fmt::Debug for ValidatorAdapter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorAdapter")
            .field("config", &self.config)
            .field("errors", &self.errors)
            .field("updating", &self.updating)
            .finish_non_exhaustive()
    }
}

/// Create a validator adapter over `engine`
pub fn validator<E: RuleEngine>(engine: E) -> ValidatorAdapter<E> {
    ValidatorAdapter::new(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineErrors, MessageProvider, StaticOutcome};
    use crate::rules::{rule_set, Messages, RuleSet, Values};
    use crate::traits::{class_name, Validatable};
    use serde_json::{json, Value};
    use std::cell::Cell;

    /// Understands `required` and `numeric`
    fn engine(values: &Values, rules: &RuleSet, _: &Messages) -> StaticOutcome {
        let mut errors = ErrorBag::new();
        for (field, spec) in rules {
            let value = values.get(field).unwrap_or(&Value::Null);
            if spec.contains("required") && value.is_null() {
                errors.add(
                    format!("{}.required", field),
                    format!("{} attribute is required", field),
                );
            }
            if spec.contains("numeric") && !value.is_number() {
                errors.add(format!("{}.numeric", field), format!("{} must be numeric", field));
            }
        }
        StaticOutcome::failed(errors)
    }

    fn values(value: Value) -> Values {
        value.as_object().cloned().unwrap_or_default()
    }

    #[derive(Default)]
    struct Product;

    impl Validatable for Product {
        fn rules(&self) -> RuleSet {
            rule_set([("y", "required|numeric")])
        }

        fn update_rules(&self) -> Option<RuleSet> {
            Some(rule_set([("y", "sometimes")]))
        }
    }

    #[test]
    fn test_passing_validation_has_no_errors() {
        let mut adapter = validator(engine);
        let request =
            ValidationRequest::rules(rule_set([("x", "required")]), values(json!({"x": 100})));

        assert!(!adapter.validate(request).unwrap().fails());
        assert!(adapter.errors().is_empty());
    }

    #[test]
    fn test_missing_required_field_fails() {
        let mut adapter = validator(engine);
        adapter
            .validate(ValidationRequest::object(&Product, values(json!({"y": null}))))
            .unwrap();

        assert!(adapter.fails());
        assert!(adapter.errors().has_field("y"));
    }

    #[test]
    fn test_errors_do_not_carry_over() {
        let mut adapter = validator(engine);
        adapter
            .validate(ValidationRequest::object(&Product, Values::new()))
            .unwrap();
        assert!(adapter.fails());

        adapter
            .validate(ValidationRequest::rules(RuleSet::new(), Values::new()))
            .unwrap();
        assert!(!adapter.fails());
        assert!(adapter.errors().is_empty());
    }

    #[test]
    fn test_updating_applies_to_one_call() {
        let mut adapter = validator(engine);

        adapter.updating();
        assert!(!adapter
            .validate(ValidationRequest::object(&Product, Values::new()))
            .unwrap()
            .fails());
        assert!(!adapter.is_updating());

        assert!(adapter
            .validate(ValidationRequest::object(&Product, Values::new()))
            .unwrap()
            .fails());
    }

    #[test]
    fn test_updating_is_reset_by_rejected_request() {
        let mut adapter = validator(engine);
        adapter.updating();

        assert!(adapter
            .validate(ValidationRequest::class("Missing", Values::new()))
            .is_err());
        assert!(!adapter.is_updating());
    }

    #[test]
    fn test_set_update_toggle() {
        let mut adapter = validator(engine);
        adapter.set_update(true);
        assert!(adapter.is_updating());
        adapter.set_update(false);
        assert!(!adapter.is_updating());
    }

    #[test]
    fn test_class_requests_use_resolver() {
        let registry = ClassRegistry::new().register::<Product>();
        let mut adapter = validator(engine).with_resolver(registry);

        adapter
            .validate(ValidationRequest::class(class_name::<Product>(), values(json!({"y": null}))))
            .unwrap();
        assert!(adapter.fails());
    }

    #[test]
    fn test_validate_then_returns_callback_value() {
        let mut adapter = validator(engine);
        let result = adapter
            .validate_then(
                ValidationRequest::object(&Product, values(json!({"y": 100}))),
                |validated| !validated.fails(),
            )
            .unwrap();

        assert!(result);
    }

    #[test]
    fn test_validate_then_fails_without_calling_back() {
        let called = Cell::new(false);
        let mut adapter = validator(engine);

        let err = adapter
            .validate_then(
                ValidationRequest::object(&Product, values(json!({"y": null}))),
                |_| called.set(true),
            )
            .unwrap_err();

        assert!(!called.get());
        assert!(err.failed_errors().is_some_and(|bag| bag.has("y.required")));
    }

    #[test]
    fn test_validate_with_without_callback_does_not_raise() {
        let mut adapter = validator(engine);
        let chained = adapter
            .validate_with::<(), fn(&ValidatorAdapter<_>)>(
                ValidationRequest::object(&Product, Values::new()),
                None,
            )
            .unwrap();

        assert!(chained.into_subject().is_some_and(|subject| subject.fails()));
    }

    #[test]
    fn test_engine_failure_without_errors_passes() {
        let mut adapter = validator(|_: &Values, _: &RuleSet, _: &Messages| FailsSilently);
        adapter
            .validate(ValidationRequest::rules(RuleSet::new(), Values::new()))
            .unwrap();

        assert!(!adapter.fails());
    }

    struct FailsSilently;

    impl EngineOutcome for FailsSilently {
        fn fails(&self) -> bool {
            true
        }

        fn errors(&self) -> EngineErrors {
            EngineErrors::None
        }
    }

    struct RichErrors(ErrorBag);

    impl MessageProvider for RichErrors {
        fn messages(&self) -> ErrorBag {
            self.0.clone()
        }
    }

    struct RichOutcome(ErrorBag);

    impl EngineOutcome for RichOutcome {
        fn fails(&self) -> bool {
            !self.0.is_empty()
        }

        fn errors(&self) -> EngineErrors {
            EngineErrors::Provider(Box::new(RichErrors(self.0.clone())))
        }
    }

    #[test]
    fn test_rich_error_object_is_normalized() {
        let mut adapter = validator(|values: &Values, _: &RuleSet, _: &Messages| {
            let mut errors = ErrorBag::new();
            if !values.contains_key("email") {
                errors.add("email.required", "email is required");
            }
            RichOutcome(errors)
        });

        adapter
            .validate(ValidationRequest::rules(RuleSet::new(), Values::new()))
            .unwrap();
        assert!(adapter.fails());
        assert_eq!(adapter.errors().first("email.required"), Some("email is required"));

        adapter
            .validate(ValidationRequest::rules(RuleSet::new(), values(json!({"email": "a"}))))
            .unwrap();
        assert!(!adapter.fails());
    }

    #[test]
    fn test_closure_resolver_is_used_for_class_requests() {
        let resolver = |class: &str| -> Option<Box<dyn Validatable>> {
            (class == "product").then(|| Box::new(Product) as Box<dyn Validatable>)
        };
        let mut adapter = validator(engine).with_resolver(resolver);

        adapter
            .validate(ValidationRequest::class("product", values(json!({"y": "abc"}))))
            .unwrap();
        assert!(adapter.errors().has("y.numeric"));

        let err = adapter
            .validate(ValidationRequest::class("order", Values::new()))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidArgument(_)));
    }

    #[test]
    fn test_prefixer_follows_configured_delimiter() {
        let adapter = validator(engine)
            .with_config(ValidatorConfig::new().with_rule_delimiter(';'));
        let prefixed = adapter
            .prefixer()
            .prefix(&rule_set([("a", "nullable;numeric")]), Some("x"), &[]);

        assert_eq!(
            prefixed["x.a"],
            crate::rules::RuleSpec::list(["nullable", "numeric"])
        );
        assert_eq!(
            RuleSetPrefixer::default()
                .prefix(&rule_set([("a", "numeric")]), Some("x"), &[])["x.a"],
            crate::rules::RuleSpec::list(["required_unless:x,null", "numeric"])
        );
    }
}
