//! Plugin system.
//!
//! Plugins extend the engine without touching its core. This crate ships one
//! plugin category:
//!
//! ## Filter Plugins
//!
//! Jinja2-compatible filters for template processing. A filter module
//! exposes a table of filter names to callables and the
//! [`FilterRegistry`](filter::FilterRegistry) installs it into the template
//! environment.
//!
//! See the [`filter`] module for the available filters.
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use custom_filter::plugins::filter::FilterRegistry;
//! use minijinja::Environment;
//!
//! let mut env = Environment::new();
//! FilterRegistry::register_all(&mut env);
//! ```

pub mod filter;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::filter::custom::{custom_title, title_case, CustomFilters};
    pub use super::filter::{FilterFn, FilterMap, FilterModule, FilterRegistry};
}
