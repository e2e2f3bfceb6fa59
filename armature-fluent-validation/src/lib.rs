//! Fluent view-model validation for Armature
//!
//! Validates request inputs against declarative rule sets through a
//! pluggable rule engine. Rule sets can be prefixed for nested payloads,
//! view models bundle inputs, files, the authenticated user and an optional
//! model, and callbacks run only once validation passed.
//!
//! # Examples
//!
//! ## Validating Values
//!
//! ```
//! use armature_fluent_validation::*;
//! use serde_json::json;
//!
//! // Any closure over (values, rules, messages) is a rule engine
//! let engine = |values: &Values, rules: &RuleSet, _: &Messages| {
//!     let mut errors = ErrorBag::new();
//!     for (field, spec) in rules {
//!         if spec.contains("required") && values.get(field).is_none_or(|v| v.is_null()) {
//!             errors.add(format!("{}.required", field), format!("{} is required", field));
//!         }
//!     }
//!     StaticOutcome::failed(errors)
//! };
//!
//! let mut adapter = validator(engine);
//! let values = json!({"x": null}).as_object().cloned().unwrap_or_default();
//!
//! adapter
//!     .validate(ValidationRequest::rules(rule_set([("x", "required")]), values))
//!     .unwrap();
//! assert!(adapter.fails());
//! assert!(adapter.errors().has("x.required"));
//! ```
//!
//! ## Prefixing Rules
//!
//! ```
//! use armature_fluent_validation::*;
//!
//! let rules = rule_set([("email", "required|email")]);
//! let prefixed = prefix_rules(&rules, Some("address"), &[]);
//!
//! assert_eq!(
//!     prefixed["address.email"],
//!     RuleSpec::list(["required_unless:address,null", "required", "email"])
//! );
//! ```
//!
//! ## Configuration
//!
//! ```
//! use armature_fluent_validation::ValidatorConfig;
//!
//! let config = ValidatorConfig::new()
//!     .with_log_failures(false)
//!     .with_rule_delimiter(',');
//! assert_eq!(config.rule_delimiter, ',');
//! ```

mod adapter;
mod after;
mod auth;
mod config;
mod engine;
mod errors;
mod files;
mod model;
mod prefix;
mod request;
mod rules;
mod traits;
mod view_model;

pub use adapter::*;
pub use after::*;
pub use auth::*;
pub use config::*;
pub use engine::*;
pub use errors::*;
pub use files::*;
pub use model::Model;
pub use prefix::*;
pub use request::*;
pub use rules::*;
pub use traits::*;
pub use view_model::*;
