// Model delegate of a view model

use crate::rules::Values;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Operations a view model forwards to its model
pub trait Model: fmt::Debug + Send + Sync {
    /// Storage table name
    fn table(&self) -> &str;

    fn primary_key(&self) -> &str {
        "id"
    }

    /// Value of the primary key
    fn key(&self) -> Option<Value>;

    fn attributes(&self) -> Values;

    fn to_array(&self) -> Values {
        self.attributes()
    }
}

type ModelFactory = Arc<dyn Fn() -> Arc<dyn Model> + Send + Sync>;

/// Optional model, created on first use when built from a factory
#[derive(Clone, Default)]
pub(crate) struct ModelSlot {
    factory: Option<ModelFactory>,
    instance: OnceCell<Arc<dyn Model>>,
}

impl ModelSlot {
    pub(crate) fn instance(model: Arc<dyn Model>) -> Self {
        Self {
            factory: None,
            instance: OnceCell::with_value(model),
        }
    }

    pub(crate) fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Model> + Send + Sync + 'static,
    {
        Self {
            factory: Some(Arc::new(factory)),
            instance: OnceCell::new(),
        }
    }

    pub(crate) fn get(&self) -> Option<Arc<dyn Model>> {
        if let Some(model) = self.instance.get() {
            return Some(Arc::clone(model));
        }
        let factory = self.factory.as_ref()?;
        let model = self.instance.get_or_init(|| {
            debug!("Instantiating view model delegate");
            factory()
        });
        Some(Arc::clone(model))
    }

    pub(crate) fn is_configured(&self) -> bool {
        self.factory.is_some() || self.instance.get().is_some()
    }
}

impl fmt::Debug for ModelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSlot")
            .field("factory", &self.factory.is_some())
            .field("instance", &self.instance.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Post;

    impl Model for Post {
        fn table(&self) -> &str {
            "posts"
        }

        fn key(&self) -> Option<Value> {
            Some(Value::from(1))
        }

        fn attributes(&self) -> Values {
            Values::new()
        }
    }

    #[test]
    fn test_empty_slot() {
        let slot = ModelSlot::default();
        assert!(!slot.is_configured());
        assert!(slot.get().is_none());
    }

    #[test]
    fn test_factory_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let slot = ModelSlot::factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(Post) as Arc<dyn Model>
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(slot.get().map(|m| m.table().to_string()), Some("posts".into()));
        assert!(slot.get().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_instance_slot() {
        let slot = ModelSlot::instance(Arc::new(Post));
        assert!(slot.is_configured());
        assert_eq!(slot.get().and_then(|m| m.key()), Some(Value::from(1)));
        assert_eq!(slot.get().map(|m| m.primary_key().to_string()), Some("id".into()));
    }
}
