// View models bundling request inputs, files, user and model

use crate::auth::{UserContext, UserRef};
use crate::errors::{Result, ValidationError};
use crate::files::{FileBag, FileRef};
use crate::model::{Model, ModelSlot};
use crate::rules::{Messages, RuleSet, Values};
use crate::traits::{RulesFactory, Validatable};
use serde_json::Value;
use std::ops::Index;
use std::sync::Arc;

static NULL: Value = Value::Null;

/// Rule provider of a view model
pub trait Blueprint: Clone {
    fn rules(&self) -> RuleSet;

    fn update_rules(&self) -> Option<RuleSet> {
        None
    }

    fn messages(&self) -> Messages {
        Messages::new()
    }

    /// Adjust inputs on a copy of the view model before its values are read
    /// for validation
    fn prepare_for_validation(_view: &mut ViewModel<Self>) {}
}

/// Inputs, files, user and model of one request, validated by `B`'s rules.
///
/// ```
/// use armature_fluent_validation::*;
/// use serde_json::json;
///
/// #[derive(Debug, Clone, Default)]
/// struct CreatePost;
///
/// impl Blueprint for CreatePost {
///     fn rules(&self) -> RuleSet {
///         rule_set([("title", "required|string")])
///     }
/// }
///
/// let inputs = json!({"title": "Hello", "meta": {"lang": "en"}});
/// let view = ViewModel::<CreatePost>::default()
///     .merge(inputs.as_object().cloned().unwrap_or_default());
///
/// assert_eq!(view.get("meta.lang"), Some(&json!("en")));
/// assert!(view.has("title"));
/// ```
#[derive(Debug, Clone)]
pub struct ViewModel<B> {
    blueprint: B,
    inputs: Values,
    files: FileBag,
    user: UserContext,
    model: ModelSlot,
}

impl<B: Blueprint + Default> ViewModel<B> {
    /// Create a view model holding `attributes`
    pub fn new(attributes: Values) -> Self {
        let mut view = Self::from_blueprint(B::default());
        view.update(attributes);
        view
    }
}

impl<B: Blueprint + Default> Default for ViewModel<B> {
    fn default() -> Self {
        Self::from_blueprint(B::default())
    }
}

impl<B: Blueprint> ViewModel<B> {
    pub fn from_blueprint(blueprint: B) -> Self {
        Self {
            blueprint,
            inputs: Values::new(),
            files: FileBag::new(),
            user: UserContext::new(),
            model: ModelSlot::default(),
        }
    }

    pub fn blueprint(&self) -> &B {
        &self.blueprint
    }

    // Inputs

    /// Input value at a dotted path (`"address.email"`, `"items.0.id"`)
    pub fn get(&self, key: &str) -> Option<&Value> {
        get_path(&self.inputs, key)
    }

    /// All raw inputs, without files
    pub fn input(&self) -> &Values {
        &self.inputs
    }

    /// Check if the input at `key` is present and not null
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| !value.is_null())
    }

    /// Replace all inputs
    pub fn set(&mut self, values: Values) -> &mut Self {
        self.inputs = values;
        self
    }

    /// Copy with inputs replaced by `values`
    pub fn with_body(&self, values: Values) -> Self {
        let mut copy = self.clone();
        copy.set(values);
        copy
    }

    /// Copy with `values` merged over the inputs; `self` is untouched
    pub fn merge(&self, values: Values) -> Self {
        let mut copy = self.clone();
        copy.update(values);
        copy
    }

    /// Merge `values` over the inputs in place
    pub fn update(&mut self, values: Values) -> &mut Self {
        self.inputs.extend(values);
        self
    }

    /// Inputs with file descriptors merged recursively over them
    pub fn all(&self) -> Values {
        let mut values = self.inputs.clone();
        replace_recursive(&mut values, self.files.to_values());
        values
    }

    /// Only the given dotted keys of [`ViewModel::all`]; missing keys are null
    pub fn only(&self, keys: &[&str]) -> Values {
        let all = self.all();
        let mut results = Values::new();
        for key in keys {
            let value = get_path(&all, key).cloned().unwrap_or(Value::Null);
            set_path(&mut results, key, value);
        }
        results
    }

    /// [`ViewModel::all`] without the given dotted keys
    pub fn except(&self, keys: &[&str]) -> Values {
        let mut all = self.all();
        for key in keys {
            forget_path(&mut all, key);
        }
        all
    }

    /// Raw inputs as an owned mapping
    pub fn to_array(&self) -> Values {
        self.inputs.clone()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inputs.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.inputs.remove(key)
    }

    /// Check if a top-level input key exists, even when null
    pub fn contains_key(&self, key: &str) -> bool {
        self.inputs.contains_key(key)
    }

    // Files

    pub fn files(&self) -> &FileBag {
        &self.files
    }

    pub fn with_files(mut self, files: FileBag) -> Self {
        self.files = files;
        self
    }

    pub fn set_files(&mut self, files: FileBag) -> &mut Self {
        self.files = files;
        self
    }

    /// Attach a file; `None` is ignored
    pub fn add_file(&mut self, key: impl Into<String>, file: Option<FileRef>) -> &mut Self {
        self.files.add(key, file);
        self
    }

    pub fn file(&self, key: &str) -> Option<&FileRef> {
        self.files.get(key)
    }

    pub fn has_file(&self, key: &str) -> bool {
        self.files.has(key)
    }

    // User

    pub fn with_user(mut self, user: Option<UserRef>) -> Self {
        self.user.set_user(user);
        self
    }

    pub fn set_user(&mut self, user: Option<UserRef>) -> &mut Self {
        self.user.set_user(user);
        self
    }

    pub fn set_user_resolver<F>(&mut self, resolver: F) -> &mut Self
    where
        F: Fn(Option<&str>) -> Option<UserRef> + Send + Sync + 'static,
    {
        self.user.set_resolver(resolver);
        self
    }

    /// User for an optional guard
    pub fn user(&self, guard: Option<&str>) -> Option<UserRef> {
        self.user.user(guard)
    }

    // Model delegate

    pub fn with_model(mut self, model: Arc<dyn Model>) -> Self {
        self.model = ModelSlot::instance(model);
        self
    }

    /// Create the model on first forwarded call
    pub fn with_model_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Model> + Send + Sync + 'static,
    {
        self.model = ModelSlot::factory(factory);
        self
    }

    pub fn has_model(&self) -> bool {
        self.model.is_configured()
    }

    /// The model delegate
    pub fn model(&self) -> Result<Arc<dyn Model>> {
        self.forward("model", |model| Arc::clone(model))
    }

    /// Forwarded to [`Model::table`]
    pub fn table(&self) -> Result<String> {
        self.forward("table", |model| model.table().to_string())
    }

    /// Forwarded to [`Model::primary_key`]
    pub fn primary_key(&self) -> Result<String> {
        self.forward("primary_key", |model| model.primary_key().to_string())
    }

    /// Forwarded to [`Model::key`]
    pub fn model_key(&self) -> Result<Option<Value>> {
        self.forward("key", |model| model.key())
    }

    /// Forwarded to [`Model::to_array`]
    pub fn model_attributes(&self) -> Result<Values> {
        self.forward("to_array", |model| model.to_array())
    }

    fn forward<T>(&self, method: &str, call: impl FnOnce(&Arc<dyn Model>) -> T) -> Result<T> {
        self.model
            .get()
            .map(|model| call(&model))
            .ok_or_else(|| ValidationError::method_not_found(method, std::any::type_name::<Self>()))
    }

    // Preparation

    /// Copy prepared by [`Blueprint::prepare_for_validation`]
    pub fn before(&self) -> Self {
        self.transform(|mut view| {
            B::prepare_for_validation(&mut view);
            view
        })
    }

    /// Apply `f` to a copy of the view model
    pub fn transform<F>(&self, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        f(self.clone())
    }
}

impl<B: Blueprint> Validatable for ViewModel<B> {
    fn rules(&self) -> RuleSet {
        self.blueprint.rules()
    }

    fn update_rules(&self) -> Option<RuleSet> {
        self.blueprint.update_rules()
    }

    fn messages(&self) -> Messages {
        self.blueprint.messages()
    }

    fn all(&self) -> Option<Value> {
        Some(Value::Object(ViewModel::all(self)))
    }

    fn to_array(&self) -> Option<Value> {
        Some(Value::Object(ViewModel::to_array(self)))
    }

    fn before_validation(&self) -> Option<Value> {
        Some(Value::Object(self.before().all()))
    }
}

impl<B: Blueprint + Default> RulesFactory for ViewModel<B> {
    fn from_attributes(attributes: Values) -> Self {
        Self::new(attributes)
    }
}

impl<B: Blueprint> Index<&str> for ViewModel<B> {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

/// Build a view model from a blueprint, an optional user, inputs and files
pub fn view_model<B: Blueprint>(
    blueprint: B,
    user: Option<UserRef>,
    attributes: Values,
    files: FileBag,
) -> ViewModel<B> {
    let mut view = ViewModel::from_blueprint(blueprint);
    if user.is_some() {
        view.set_user(user);
    }
    view.update(attributes);
    view.with_files(files)
}

fn get_path<'a>(values: &'a Values, path: &str) -> Option<&'a Value> {
    if let Some(value) = values.get(path) {
        return Some(value);
    }

    let mut segments = path.split('.');
    let mut current = values.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn set_path(values: &mut Values, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            values.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = values
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Values::new()));
            if !entry.is_object() {
                *entry = Value::Object(Values::new());
            }
            if let Value::Object(nested) = entry {
                set_path(nested, rest, value);
            }
        }
    }
}

fn forget_path(values: &mut Values, path: &str) {
    if values.remove(path).is_some() {
        return;
    }
    if let Some((head, rest)) = path.split_once('.') {
        if let Some(Value::Object(nested)) = values.get_mut(head) {
            forget_path(nested, rest);
        }
    }
}

fn replace_recursive(base: &mut Values, overlay: Values) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                replace_recursive(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
