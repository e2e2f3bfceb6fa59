// Authenticated user context for view models

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// The authenticated user a view model is validated for
pub trait Authenticatable: fmt::Debug + Send + Sync {
    /// Name of the identifier attribute
    fn auth_identifier_name(&self) -> &str {
        "id"
    }

    /// Value of the identifier attribute
    fn auth_identifier(&self) -> Value;

    fn username(&self) -> Option<&str> {
        None
    }
}

/// Shared handle to a user
pub type UserRef = Arc<dyn Authenticatable>;

/// Resolves the user for an optional guard name
pub type UserResolver = Arc<dyn Fn(Option<&str>) -> Option<UserRef> + Send + Sync>;

/// Lazily resolved user attached to a view model
#[derive(Clone, Default)]
pub struct UserContext {
    resolver: Option<UserResolver>,
}

impl UserContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always resolve to `user`, whatever the guard
    pub fn set_user(&mut self, user: Option<UserRef>) -> &mut Self {
        self.set_resolver(move |_| user.clone())
    }

    pub fn set_resolver<F>(&mut self, resolver: F) -> &mut Self
    where
        F: Fn(Option<&str>) -> Option<UserRef> + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn user(&self, guard: Option<&str>) -> Option<UserRef> {
        self.resolver.as_ref().and_then(|resolve| resolve(guard))
    }
}

impl fmt::Debug for UserContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserContext")
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Account {
        id: u64,
        username: String,
    }

    impl Authenticatable for Account {
        fn auth_identifier(&self) -> Value {
            json!(self.id)
        }

        fn username(&self) -> Option<&str> {
            Some(&self.username)
        }
    }

    #[test]
    fn test_no_resolver_has_no_user() {
        assert!(UserContext::new().user(None).is_none());
    }

    #[test]
    fn test_set_user_ignores_guard() {
        let mut context = UserContext::new();
        context.set_user(Some(Arc::new(Account {
            id: 7,
            username: "azandrew".into(),
        })));

        let user = context.user(Some("api")).unwrap();
        assert_eq!(user.auth_identifier(), json!(7));
        assert_eq!(user.auth_identifier_name(), "id");
        assert_eq!(user.username(), Some("azandrew"));
    }

    #[test]
    fn test_resolver_receives_guard() {
        let mut context = UserContext::new();
        context.set_resolver(|guard| {
            (guard == Some("admin")).then(|| {
                Arc::new(Account {
                    id: 1,
                    username: "root".into(),
                }) as UserRef
            })
        });

        assert!(context.user(Some("admin")).is_some());
        assert!(context.user(None).is_none());
    }
}
