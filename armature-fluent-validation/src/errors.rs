// Validation errors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result type for validation operations
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Error set produced by a rule engine for a failed validation.
///
/// Keys are either a bare field name (`"email"`) or a field name followed
/// by the failing rule (`"email.required"`). Each key maps to one or more
/// human readable messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorBag {
    messages: BTreeMap<String, Vec<String>>,
}

impl ErrorBag {
    /// Create an empty error bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message under the given key
    pub fn add(&mut self, key: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.messages
            .entry(key.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Builder variant of [`ErrorBag::add`]
    pub fn with(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(key, message);
        self
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the number of error keys
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if an exact key is present
    pub fn has(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    /// Check if any key refers to `field`, either as `field` or `field.<rule>`
    pub fn has_field(&self, field: &str) -> bool {
        self.messages.keys().any(|key| {
            key == field
                || key
                    .strip_prefix(field)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// Messages stored under a key
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.messages.get(key).map(Vec::as_slice)
    }

    /// First message stored under a key
    pub fn first(&self, key: &str) -> Option<&str> {
        self.messages
            .get(key)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    /// Iterate over error keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    /// Iterate over keys and their messages
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.messages
            .iter()
            .map(|(key, messages)| (key.as_str(), messages.as_slice()))
    }

    /// Remove every message
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Convert to JSON representation
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "errors": self.messages })
    }
}

impl fmt::Display for ErrorBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, messages) in &self.messages {
            for message in messages {
                writeln!(f, "{}: {}", key, message)?;
            }
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for ErrorBag
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (key, message) in iter {
            bag.add(key, message);
        }
        bag
    }
}

impl From<BTreeMap<String, String>> for ErrorBag {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

/// Raised when a validation with a registered callback fails.
///
/// The error bag is the single source of truth for what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Input validation failed with {} error(s)", errors.len())]
pub struct ValidationFailed {
    errors: ErrorBag,
}

impl ValidationFailed {
    pub fn new(errors: ErrorBag) -> Self {
        Self { errors }
    }

    /// Errors that caused the failure
    pub fn errors(&self) -> &ErrorBag {
        &self.errors
    }

    pub fn into_errors(self) -> ErrorBag {
        self.errors
    }
}

/// Validation layer errors
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Malformed call shape or unresolvable validatable class
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A subject cannot supply the values to validate
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Forwarded call on a view model without a model delegate
    #[error("Method {method} does not exist on {owner}")]
    MethodNotFound {
        /// Forwarded method name
        method: String,
        /// Type the call was made on
        owner: String,
    },

    /// Validation failed while a success callback was registered
    #[error(transparent)]
    Failed(#[from] ValidationFailed),
}

impl ValidationError {
    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new method not found error
    pub fn method_not_found(method: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
            owner: owner.into(),
        }
    }

    /// Check if this error carries a failed validation
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Get the error bag if this is a failed validation
    pub fn failed_errors(&self) -> Option<&ErrorBag> {
        match self {
            Self::Failed(failed) => Some(failed.errors()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_bag_add_and_lookup() {
        let mut bag = ErrorBag::new();
        bag.add("y.required", "y attribute is required");
        bag.add("y.required", "y is mandatory");

        assert_eq!(bag.len(), 1);
        assert!(bag.has("y.required"));
        assert_eq!(bag.first("y.required"), Some("y attribute is required"));
        assert_eq!(bag.get("y.required").map(|m| m.len()), Some(2));
    }

    #[test]
    fn test_error_bag_has_field() {
        let bag = ErrorBag::new()
            .with("user.email", "invalid")
            .with("name", "required");

        assert!(bag.has_field("user"));
        assert!(bag.has_field("name"));
        assert!(!bag.has_field("use"));
        assert!(!bag.has_field("email"));
    }

    #[test]
    fn test_error_bag_to_json() {
        let bag = ErrorBag::new().with("x", "bad");
        assert_eq!(
            bag.to_json(),
            serde_json::json!({ "errors": { "x": ["bad"] } })
        );
    }

    #[test]
    fn test_failed_error_exposes_bag() {
        let err: ValidationError = ValidationFailed::new(ErrorBag::new().with("x", "bad")).into();

        assert!(err.is_failed());
        assert!(err.failed_errors().is_some_and(|bag| bag.has("x")));
        assert!(err.to_string().contains("1 error"));
    }

    #[test]
    fn test_method_not_found_display() {
        let err = ValidationError::method_not_found("table", "UserView");
        assert_eq!(err.to_string(), "Method table does not exist on UserView");
        assert!(!err.is_failed());
    }
}
