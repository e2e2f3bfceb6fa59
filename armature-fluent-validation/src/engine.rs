// Rule evaluation engine contract
//
// The validation layer does not evaluate rules itself. An engine receives
// the normalized values, rules and messages and reports pass/fail.

use crate::errors::ErrorBag;
use crate::rules::{Messages, RuleSet, Values};

/// Rich error object exposing its messages through an accessor
pub trait MessageProvider {
    fn messages(&self) -> ErrorBag;
}

/// Errors reported by an engine outcome
pub enum EngineErrors {
    /// The engine reported no error set
    None,
    /// Plain error mapping
    Bag(ErrorBag),
    /// Richer error object, normalized through [`MessageProvider::messages`]
    Provider(Box<dyn MessageProvider>),
}

impl EngineErrors {
    /// Normalize every form into a plain error bag
    pub fn into_bag(self) -> ErrorBag {
        match self {
            EngineErrors::None => ErrorBag::new(),
            EngineErrors::Bag(bag) => bag,
            EngineErrors::Provider(provider) => provider.messages(),
        }
    }
}

impl From<ErrorBag> for EngineErrors {
    fn from(bag: ErrorBag) -> Self {
        EngineErrors::Bag(bag)
    }
}

impl std::fmt::Debug for EngineErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineErrors::None => f.write_str("None"),
            EngineErrors::Bag(bag) => f.debug_tuple("Bag").field(bag).finish(),
            EngineErrors::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

/// Result of one engine evaluation
pub trait EngineOutcome {
    /// Whether any rule failed
    fn fails(&self) -> bool;

    /// Errors collected by the engine
    fn errors(&self) -> EngineErrors;
}

/// Rule evaluation engine (the validator factory).
///
/// Closures of the form `Fn(&Values, &RuleSet, &Messages) -> O` implement
/// this trait, so a bare function can be used wherever an engine is needed.
pub trait RuleEngine {
    type Outcome: EngineOutcome;

    /// Evaluate `rules` against `values`
    fn make(&self, values: &Values, rules: &RuleSet, messages: &Messages) -> Self::Outcome;
}

impl<F, O> RuleEngine for F
where
    F: Fn(&Values, &RuleSet, &Messages) -> O,
    O: EngineOutcome,
{
    type Outcome = O;

    fn make(&self, values: &Values, rules: &RuleSet, messages: &Messages) -> O {
        self(values, rules, messages)
    }
}

/// An engine outcome that is already known
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticOutcome {
    errors: ErrorBag,
}

impl StaticOutcome {
    pub fn passed() -> Self {
        Self::default()
    }

    pub fn failed(errors: ErrorBag) -> Self {
        Self { errors }
    }
}

impl EngineOutcome for StaticOutcome {
    fn fails(&self) -> bool {
        !self.errors.is_empty()
    }

    fn errors(&self) -> EngineErrors {
        EngineErrors::Bag(self.errors.clone())
    }
}

impl From<ErrorBag> for StaticOutcome {
    fn from(errors: ErrorBag) -> Self {
        Self::failed(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RichErrors(ErrorBag);

    impl MessageProvider for RichErrors {
        fn messages(&self) -> ErrorBag {
            self.0.clone()
        }
    }

    #[test]
    fn test_into_bag_normalizes_every_form() {
        let bag = ErrorBag::new().with("x.required", "x is required");

        assert!(EngineErrors::None.into_bag().is_empty());
        assert_eq!(EngineErrors::Bag(bag.clone()).into_bag(), bag);
        assert_eq!(
            EngineErrors::Provider(Box::new(RichErrors(bag.clone()))).into_bag(),
            bag
        );
    }

    #[test]
    fn test_closure_is_an_engine() {
        let engine = |values: &Values, _: &RuleSet, _: &Messages| {
            if values.is_empty() {
                StaticOutcome::failed(ErrorBag::new().with("input", "empty"))
            } else {
                StaticOutcome::passed()
            }
        };

        let outcome = engine.make(&Values::new(), &RuleSet::new(), &Messages::new());
        assert!(outcome.fails());
        assert!(outcome.errors().into_bag().has("input"));
    }
}
