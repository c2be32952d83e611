//! Defaults registry.
//!
//! [`Config`] is an immutable snapshot of the defaults every controller
//! falls back to: the resolver, the request method and the optional
//! request/response transforms. [`ConfigRegistry`] is a cloneable handle to
//! the current snapshot; it is passed explicitly to controllers and is the
//! one place defaults can be overridden at runtime.
//!
//! Controllers read the registry when a request is dispatched, so replacing
//! the resolver affects every controller that has not dispatched yet.
//!
//! ```
//! use accio::{Config, ConfigRegistry, Method};
//! use accio::{ResolveError, resolver_fn};
//! use serde_json::{Value, json};
//!
//! let config = Config::builder()
//!     .resolver(resolver_fn(|_, _, _| async { Ok::<_, ResolveError>(json!({})) }))
//!     .method(Method::Post)
//!     .build();
//! let registry: ConfigRegistry<Value> = ConfigRegistry::new(config);
//!
//! // Rejected assignments leave the previous value in effect.
//! assert!(registry.set_method("PUT").is_err());
//! assert_eq!(registry.method(), Method::Post);
//! ```

use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use accio_core::{Method, Resolver};
use serde_json::{Map, Value};
use smol_str::SmolStr;
use tracing::debug;

use crate::error::ConfigError;

/// Resolver shared between the registry and controllers.
pub type SharedResolver<Res> = Arc<dyn Resolver<Res>>;

/// Transform applied to the request body before dispatch.
pub type Preparator = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Transform applied to the resolved value before it reaches the state.
pub type Processor<Res> = Arc<dyn Fn(Res) -> Res + Send + Sync>;

/// Immutable defaults snapshot.
pub struct Config<Res> {
    resolver: SharedResolver<Res>,
    method: Method,
    preparator: Option<Preparator>,
    processor: Option<Processor<Res>>,
    extensions: Map<String, Value>,
}

impl<Res> Clone for Config<Res> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            method: self.method,
            preparator: self.preparator.clone(),
            processor: self.processor.clone(),
            extensions: self.extensions.clone(),
        }
    }
}

impl<Res> std::fmt::Debug for Config<Res> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("resolver", &"...")
            .field("method", &self.method)
            .field("preparator", &self.preparator.as_ref().map(|_| "..."))
            .field("processor", &self.processor.as_ref().map(|_| "..."))
            .field("extensions", &self.extensions)
            .finish()
    }
}

impl<Res> Config<Res> {
    /// Creates a new [`ConfigBuilder`].
    pub fn builder() -> ConfigBuilder<Res, NotSet> {
        ConfigBuilder::new()
    }

    /// Returns the default resolver.
    pub fn resolver(&self) -> &SharedResolver<Res> {
        &self.resolver
    }

    /// Returns the default request method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the request body transform, if one is set.
    pub fn preparator(&self) -> Option<&Preparator> {
        self.preparator.as_ref()
    }

    /// Returns the response transform, if one is set.
    pub fn processor(&self) -> Option<&Processor<Res>> {
        self.processor.as_ref()
    }

    /// Returns a pass-through value assigned under `name`.
    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions.get(name)
    }
}

/// Marker type for unset builder fields.
///
/// When you see `NotSet` in a compiler error, it means you haven't called
/// [`ConfigBuilder::resolver`] yet.
pub struct NotSet;

/// Builder for [`Config`].
///
/// Use [`Config::builder()`] to create a new builder.
pub struct ConfigBuilder<Res, R> {
    resolver: R,
    method: Method,
    preparator: Option<Preparator>,
    processor: Option<Processor<Res>>,
    _response: PhantomData<fn() -> Res>,
}

impl<Res> ConfigBuilder<Res, NotSet> {
    /// Creates a new builder with the default method and no transforms.
    pub fn new() -> Self {
        Self {
            resolver: NotSet,
            method: Method::default(),
            preparator: None,
            processor: None,
            _response: PhantomData,
        }
    }
}

impl<Res> Default for ConfigBuilder<Res, NotSet> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Res, R> ConfigBuilder<Res, R> {
    /// Sets the default resolver.
    pub fn resolver<T>(self, resolver: T) -> ConfigBuilder<Res, SharedResolver<Res>>
    where
        T: Resolver<Res> + 'static,
    {
        ConfigBuilder {
            resolver: Arc::new(resolver),
            method: self.method,
            preparator: self.preparator,
            processor: self.processor,
            _response: PhantomData,
        }
    }

    /// Sets the default request method.
    pub fn method(self, method: Method) -> Self {
        Self { method, ..self }
    }

    /// Sets the request body transform.
    pub fn preparator<F>(self, preparator: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self {
            preparator: Some(Arc::new(preparator)),
            ..self
        }
    }

    /// Sets the response transform.
    pub fn processor<F>(self, processor: F) -> Self
    where
        F: Fn(Res) -> Res + Send + Sync + 'static,
    {
        Self {
            processor: Some(Arc::new(processor)),
            ..self
        }
    }
}

impl<Res> ConfigBuilder<Res, SharedResolver<Res>> {
    /// Builds the [`Config`].
    pub fn build(self) -> Config<Res> {
        Config {
            resolver: self.resolver,
            method: self.method,
            preparator: self.preparator,
            processor: self.processor,
            extensions: Map::new(),
        }
    }
}

/// Dynamically typed value for [`ConfigRegistry::assign`].
pub enum DefaultValue<Res> {
    /// A resolver.
    Resolver(SharedResolver<Res>),
    /// A request body transform.
    Preparator(Preparator),
    /// A response transform.
    Processor(Processor<Res>),
    /// A plain data value, typically loaded from a configuration file.
    Json(Value),
}

impl<Res> DefaultValue<Res> {
    /// Wraps a resolver.
    pub fn resolver<T>(resolver: T) -> Self
    where
        T: Resolver<Res> + 'static,
    {
        Self::Resolver(Arc::new(resolver))
    }

    /// Runtime kind of the value, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DefaultValue::Resolver(_) => "resolver",
            DefaultValue::Preparator(_) => "preparator",
            DefaultValue::Processor(_) => "processor",
            DefaultValue::Json(value) => json_kind(value),
        }
    }
}

impl<Res> From<Value> for DefaultValue<Res> {
    fn from(value: Value) -> Self {
        DefaultValue::Json(value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Shared, replaceable handle to the current [`Config`].
///
/// Last writer wins; every clone observes writes immediately.
pub struct ConfigRegistry<Res> {
    current: Arc<RwLock<Config<Res>>>,
}

impl<Res> Clone for ConfigRegistry<Res> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
        }
    }
}

impl<Res> std::fmt::Debug for ConfigRegistry<Res> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("current", &*self.read())
            .finish()
    }
}

impl<Res> ConfigRegistry<Res> {
    /// Creates a registry holding `config`.
    pub fn new(config: Config<Res>) -> Self {
        Self {
            current: Arc::new(RwLock::new(config)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Config<Res>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Config<Res>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the current defaults.
    pub fn snapshot(&self) -> Config<Res> {
        self.read().clone()
    }

    /// Returns the current default resolver.
    pub fn resolver(&self) -> SharedResolver<Res> {
        Arc::clone(&self.read().resolver)
    }

    /// Returns the current default method.
    pub fn method(&self) -> Method {
        self.read().method
    }

    /// Returns the current request body transform.
    pub fn preparator(&self) -> Option<Preparator> {
        self.read().preparator.clone()
    }

    /// Returns the current response transform.
    pub fn processor(&self) -> Option<Processor<Res>> {
        self.read().processor.clone()
    }

    /// Returns a pass-through value assigned under `name`.
    pub fn extension(&self, name: &str) -> Option<Value> {
        self.read().extensions.get(name).cloned()
    }

    /// Replaces the whole snapshot.
    pub fn replace(&self, config: Config<Res>) {
        *self.write() = config;
    }

    /// Replaces the default resolver.
    pub fn set_resolver<T>(&self, resolver: T)
    where
        T: Resolver<Res> + 'static,
    {
        self.write().resolver = Arc::new(resolver);
    }

    /// Replaces the default method, parsed from its name.
    pub fn set_method(&self, method: &str) -> Result<(), ConfigError> {
        let method = method.parse::<Method>()?;
        self.write().method = method;
        Ok(())
    }

    /// Replaces the request body transform.
    pub fn set_preparator<F>(&self, preparator: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.write().preparator = Some(Arc::new(preparator));
    }

    /// Replaces the response transform.
    pub fn set_processor<F>(&self, processor: F)
    where
        F: Fn(Res) -> Res + Send + Sync + 'static,
    {
        self.write().processor = Some(Arc::new(processor));
    }

    /// Assigns a dynamically typed value to the field `field`.
    ///
    /// `resolver`, `preparator` and `processor` only accept the matching
    /// function value; `method` only accepts the strings `GET` and `POST`.
    /// Any other field takes plain data values unchanged.
    pub fn assign(&self, field: &str, value: DefaultValue<Res>) -> Result<(), ConfigError> {
        let invalid = |expected: &'static str, value: &DefaultValue<Res>| ConfigError::InvalidType {
            field: SmolStr::new(field),
            expected,
            found: value.kind(),
        };

        match (field, value) {
            ("resolver", DefaultValue::Resolver(resolver)) => self.write().resolver = resolver,
            ("resolver", other) => return Err(invalid("function", &other)),
            ("preparator", DefaultValue::Preparator(preparator)) => {
                self.write().preparator = Some(preparator)
            }
            ("preparator", other) => return Err(invalid("function", &other)),
            ("processor", DefaultValue::Processor(processor)) => {
                self.write().processor = Some(processor)
            }
            ("processor", other) => return Err(invalid("function", &other)),
            ("method", DefaultValue::Json(Value::String(method))) => self.set_method(&method)?,
            ("method", other) => return Err(invalid("string", &other)),
            (_, DefaultValue::Json(value)) => {
                self.write().extensions.insert(field.to_owned(), value);
            }
            (_, other) => return Err(invalid("JSON value", &other)),
        }
        debug!(field, "defaults assigned");
        Ok(())
    }

    /// Assigns every field of `values` in order, stopping at the first
    /// rejected one. Fields assigned before the rejection stay assigned.
    pub fn assign_all(&self, values: Map<String, Value>) -> Result<(), ConfigError> {
        for (field, value) in values {
            self.assign(&field, DefaultValue::Json(value))?;
        }
        Ok(())
    }
}

impl<Res> From<Config<Res>> for ConfigRegistry<Res> {
    fn from(config: Config<Res>) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accio_core::{ResolveError, resolver_fn};
    use serde_json::json;

    fn registry() -> ConfigRegistry<Value> {
        ConfigRegistry::new(
            Config::builder()
                .resolver(resolver_fn(|_, _, _| async { Ok::<_, ResolveError>(json!("default")) }))
                .build(),
        )
    }

    #[test]
    fn defaults() {
        let registry = registry();
        assert_eq!(registry.method(), Method::Get);
        assert!(registry.preparator().is_none());
        assert!(registry.processor().is_none());
    }

    #[test]
    fn non_function_values_are_rejected() {
        let registry = registry();
        let before = registry.resolver();
        let values = [json!(null), json!(0), json!(""), json!(true), json!([]), json!({})];
        let kinds = ["null", "number", "string", "boolean", "array", "object"];

        for field in ["resolver", "preparator", "processor"] {
            for (value, kind) in values.iter().zip(kinds) {
                let err = registry.assign(field, value.clone().into()).unwrap_err();
                assert_eq!(
                    err,
                    ConfigError::InvalidType {
                        field: field.into(),
                        expected: "function",
                        found: kind,
                    }
                );
            }
        }

        assert!(Arc::ptr_eq(&before, &registry.resolver()));
        assert!(registry.preparator().is_none());
        assert!(registry.processor().is_none());
    }

    #[test]
    fn error_message_names_field_and_type() {
        let err = registry().assign("resolver", json!(0).into()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected resolver to be a function, but instead got number. \
             Check your resolver assignment to accio defaults"
        );
    }

    #[test]
    fn methods_outside_get_and_post_are_rejected() {
        let registry = registry();
        for method in ["PUT", "PATCH", "HEAD", "DELETE", ""] {
            let err = registry.assign("method", json!(method).into()).unwrap_err();
            assert!(matches!(err, ConfigError::UnsupportedMethod(_)), "{method}");
        }
        for value in [json!(null), json!(0), json!(true), json!([]), json!({})] {
            assert!(registry.assign("method", value.into()).is_err());
        }
        assert_eq!(registry.method(), Method::Get);

        registry.assign("method", json!("POST").into()).unwrap();
        assert_eq!(registry.method(), Method::Post);
    }

    #[test]
    fn other_fields_pass_through() {
        let registry = registry();
        registry.assign("retries", json!(3).into()).unwrap();
        assert_eq!(registry.extension("retries"), Some(json!(3)));

        let err = registry
            .assign("retries", DefaultValue::Preparator(Arc::new(|body| body)))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidType { found: "preparator", .. }));
    }

    #[test]
    fn function_values_are_accepted() {
        let registry = registry();
        registry
            .assign("preparator", DefaultValue::Preparator(Arc::new(|_| json!("prepared"))))
            .unwrap();
        registry
            .assign("processor", DefaultValue::Processor(Arc::new(|_| json!("processed"))))
            .unwrap();

        let config = registry.snapshot();
        assert_eq!(config.preparator().map(|f| f(json!({}))), Some(json!("prepared")));
        assert_eq!(config.processor().map(|f| f(json!({}))), Some(json!("processed")));
    }

    #[test]
    fn clones_observe_writes() {
        let registry = registry();
        let clone = registry.clone();
        registry.set_method("POST").unwrap();
        assert_eq!(clone.method(), Method::Post);
    }
}
