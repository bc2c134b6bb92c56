//! Jinja2-compatible filter plugins.
//!
//! A filter plugin is a named transformation that templates call with the
//! pipe syntax, `{{ value | name(arg) }}`. Filter plugins are grouped into
//! *filter modules*: each module hands the engine a table mapping filter
//! names to callables, and the [`FilterRegistry`] installs those tables into
//! a minijinja [`Environment`].
//!
//! # Available modules
//!
//! - **custom**: `custom_title` (title-case a string, prepend a prefix)
//!
//! # Usage
//!
//! ```rust,ignore
//! use custom_filter::plugins::filter::FilterRegistry;
//! use minijinja::Environment;
//!
//! let mut env = Environment::new();
//! FilterRegistry::register_all(&mut env);
//! ```
//!
//! # Writing a filter module
//!
//! ```rust,ignore
//! use custom_filter::plugins::filter::{FilterMap, FilterModule};
//! use minijinja::{Error, Value};
//!
//! fn shout(value: Value, _args: &[Value]) -> Result<Value, Error> {
//!     Ok(value.as_str().map_or(value.clone(), |s| Value::from(s.to_uppercase())))
//! }
//!
//! struct ShoutFilters;
//!
//! impl FilterModule for ShoutFilters {
//!     fn name(&self) -> &'static str { "shout" }
//!     fn description(&self) -> &'static str { "Uppercase strings" }
//!     fn filters(&self) -> FilterMap {
//!         let mut filters = FilterMap::new();
//!         filters.insert("shout", shout);
//!         filters
//!     }
//! }
//! ```

pub mod custom;

use indexmap::IndexMap;
use minijinja::value::{Rest, Value};
use minijinja::Environment;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Uniform filter callable: the piped value plus positional arguments.
pub type FilterFn = fn(Value, &[Value]) -> std::result::Result<Value, minijinja::Error>;

/// Mapping from filter name to callable, in registration order.
pub type FilterMap = IndexMap<&'static str, FilterFn>;

/// A group of filters the engine can discover and install.
///
/// This is the whole loading contract: a module has a name and hands out
/// its name-to-callable table.
pub trait FilterModule: Send + Sync {
    /// Module name, used in configuration to enable it.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// The filters this module provides.
    fn filters(&self) -> FilterMap;
}

/// Registry of filter modules.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    modules: IndexMap<&'static str, Arc<dyn FilterModule>>,
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("modules", &self.module_names())
            .finish()
    }
}

impl FilterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in filter module.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(custom::CustomFilters);
        registry
    }

    /// Register all built-in filters with the given environment.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use minijinja::Environment;
    /// use custom_filter::plugins::filter::FilterRegistry;
    ///
    /// let mut env = Environment::new();
    /// FilterRegistry::register_all(&mut env);
    /// ```
    pub fn register_all(env: &mut Environment<'static>) {
        Self::with_builtins().install(env);
    }

    /// Add a module, replacing any module registered under the same name.
    pub fn register<M: FilterModule + 'static>(&mut self, module: M) {
        let name = module.name();
        if self.modules.insert(name, Arc::new(module)).is_some() {
            debug!(module = name, "Replaced filter module");
        }
    }

    /// Look up a module by name.
    pub fn module(&self, name: &str) -> Option<&Arc<dyn FilterModule>> {
        self.modules.get(name)
    }

    /// Names of the registered modules, in registration order.
    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.keys().copied().collect()
    }

    /// Look up a filter across all modules (later modules win).
    pub fn filter(&self, name: &str) -> Option<FilterFn> {
        self.modules
            .values()
            .rev()
            .find_map(|module| module.filters().get(name).copied())
    }

    /// Names of every filter provided by the registered modules.
    pub fn filter_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for module in self.modules.values() {
            for name in module.filters().keys() {
                if !names.contains(name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Install every registered module into `env`.
    pub fn install(&self, env: &mut Environment<'static>) {
        let mut installed = FilterMap::new();
        for module in self.modules.values() {
            install_module(env, module.as_ref(), &mut installed);
        }
    }

    /// Install only the named modules, in the given order.
    ///
    /// Fails if a name does not match a registered module; nothing is
    /// installed in that case.
    pub fn install_modules<S: AsRef<str>>(
        &self,
        env: &mut Environment<'static>,
        names: &[S],
    ) -> Result<()> {
        let selected = names
            .iter()
            .map(|name| {
                self.modules
                    .get(name.as_ref())
                    .ok_or_else(|| Error::FilterModuleNotFound(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut installed = FilterMap::new();
        for module in selected {
            install_module(env, module.as_ref(), &mut installed);
        }
        Ok(())
    }
}

fn install_module(
    env: &mut Environment<'static>,
    module: &dyn FilterModule,
    installed: &mut FilterMap,
) {
    for (name, filter) in module.filters() {
        if installed.insert(name, filter).is_some() {
            warn!(
                filter = name,
                module = module.name(),
                "Filter already provided by another module; overriding"
            );
        }
        env.add_filter(name, move |value: Value, args: Rest<Value>| filter(value, &args));
    }
    debug!(module = module.name(), "Installed filter module");
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    fn shout(value: Value, _args: &[Value]) -> std::result::Result<Value, minijinja::Error> {
        Ok(match value.as_str() {
            Some(s) => Value::from(s.to_uppercase()),
            None => value,
        })
    }

    fn custom_title_override(
        _value: Value,
        _args: &[Value],
    ) -> std::result::Result<Value, minijinja::Error> {
        Ok(Value::from("overridden"))
    }

    struct ShoutFilters;

    impl FilterModule for ShoutFilters {
        fn name(&self) -> &'static str {
            "shout"
        }

        fn description(&self) -> &'static str {
            "Uppercase strings"
        }

        fn filters(&self) -> FilterMap {
            let mut filters = FilterMap::new();
            filters.insert("shout", shout);
            filters.insert("custom_title", custom_title_override);
            filters
        }
    }

    #[test]
    fn test_register_all_filters() {
        let mut env = Environment::new();
        FilterRegistry::register_all(&mut env);

        let result = env
            .render_str("{{ 'hello ansible' | custom_title('Custom: ') }}", context! {})
            .unwrap();
        assert_eq!(result, "Custom: Hello Ansible");
    }

    #[test]
    fn test_builtin_mapping() {
        let registry = FilterRegistry::with_builtins();
        assert_eq!(registry.module_names(), vec!["custom"]);
        assert_eq!(registry.filter_names(), vec!["custom_title"]);
        assert!(registry.filter("custom_title").is_some());
        assert!(registry.filter("missing").is_none());
    }

    #[test]
    fn test_lookup_returns_callable() {
        let registry = FilterRegistry::with_builtins();
        let filter = registry.filter("custom_title").unwrap();
        let result = filter(Value::from("hello"), &[Value::from("> ")]).unwrap();
        assert_eq!(result.as_str(), Some("> Hello"));
    }

    #[test]
    fn test_install_modules_subset() {
        let mut registry = FilterRegistry::with_builtins();
        registry.register(ShoutFilters);

        let mut env = Environment::new();
        registry.install_modules(&mut env, &["custom"]).unwrap();

        assert!(env.render_str("{{ 'x' | shout }}", context! {}).is_err());
        assert_eq!(
            env.render_str("{{ 'x' | custom_title }}", context! {}).unwrap(),
            "X"
        );
    }

    #[test]
    fn test_install_modules_unknown_name() {
        let registry = FilterRegistry::with_builtins();
        let mut env = Environment::new();
        let err = registry
            .install_modules(&mut env, &["custom", "nope"])
            .unwrap_err();
        assert!(matches!(err, Error::FilterModuleNotFound(name) if name == "nope"));
        assert!(env.render_str("{{ 'x' | custom_title }}", context! {}).is_err());
    }

    #[test]
    fn test_later_module_wins() {
        let mut registry = FilterRegistry::with_builtins();
        registry.register(ShoutFilters);

        let mut env = Environment::new();
        registry.install(&mut env);

        assert_eq!(
            env.render_str("{{ 'x' | custom_title }}", context! {}).unwrap(),
            "overridden"
        );
        assert_eq!(registry.filter_names(), vec!["custom_title", "shout"]);
        let filter = registry.filter("custom_title").unwrap();
        assert_eq!(
            filter(Value::from("x"), &[]).unwrap().as_str(),
            Some("overridden")
        );
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = FilterRegistry::new();
        registry.register(custom::CustomFilters);
        registry.register(custom::CustomFilters);
        assert_eq!(registry.module_names().len(), 1);
        assert!(registry.module("custom").is_some());
    }
}
