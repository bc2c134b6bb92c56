//! Jinja2-compatible template engine powered by minijinja.
//!
//! The engine owns a minijinja [`Environment`] with the filter modules from a
//! [`FilterRegistry`] installed. Undefined variables are errors, as they are
//! in playbooks.
//!
//! Values in task arguments are rendered with [`TemplateEngine::render_value`]:
//! a string made of exactly one `{{ ... }}` block is evaluated as an
//! expression and keeps its native type, so
//! `"{{ 42 | custom_title('Custom: ') }}"` stays the integer `42` instead of
//! becoming the text `"42"`.

use minijinja::{Environment, UndefinedBehavior, Value};
use std::collections::HashMap;
use tracing::trace;

use crate::error::{Error, Result};
use crate::plugins::filter::FilterRegistry;

/// Variables a template is rendered against.
pub type TemplateVars = HashMap<String, serde_json::Value>;

/// Template engine with filter plugins installed.
#[derive(Debug)]
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    /// Create an engine with every built-in filter module installed.
    pub fn new() -> Self {
        Self::with_registry(&FilterRegistry::with_builtins())
    }

    /// Create an engine with every module of `registry` installed.
    pub fn with_registry(registry: &FilterRegistry) -> Self {
        let mut env = base_environment();
        registry.install(&mut env);
        Self { env }
    }

    /// Create an engine with only the named modules of `registry` installed.
    pub fn with_filter_modules<S: AsRef<str>>(
        registry: &FilterRegistry,
        modules: &[S],
    ) -> Result<Self> {
        let mut env = base_environment();
        registry.install_modules(&mut env, modules)?;
        Ok(Self { env })
    }

    /// Render a template string to text.
    pub fn render(&self, template: &str, vars: &TemplateVars) -> Result<String> {
        self.env
            .render_str(template, vars)
            .map_err(|e| Error::from_template(template, &e))
    }

    /// Evaluate a bare expression (no `{{ }}`) and return its native value.
    pub fn evaluate(&self, expression: &str, vars: &TemplateVars) -> Result<serde_json::Value> {
        let value = self.eval_native(expression, vars)?;
        if value.is_undefined() {
            return Err(Error::template_render(
                expression,
                "expression evaluated to an undefined value",
            ));
        }
        Ok(serde_json::to_value(&value)?)
    }

    /// Evaluate a `when`-style condition.
    ///
    /// Accepts bare expressions as well as a single `{{ ... }}` block.
    pub fn evaluate_condition(&self, condition: &str, vars: &TemplateVars) -> Result<bool> {
        let condition = condition.trim();
        let expression = single_expression(condition).unwrap_or(condition);
        let value = self.eval_native(expression, vars)?;
        Ok(value.is_true())
    }

    /// Render every string inside `value`, recursing through lists and maps.
    pub fn render_value(
        &self,
        value: &serde_json::Value,
        vars: &TemplateVars,
    ) -> Result<serde_json::Value> {
        match value {
            serde_json::Value::String(s) => {
                if let Some(expression) = single_expression(s) {
                    trace!(expression, "Evaluating native expression");
                    self.evaluate(expression, vars)
                } else if Self::is_template(s) {
                    Ok(serde_json::Value::String(self.render(s, vars)?))
                } else {
                    Ok(value.clone())
                }
            }
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| self.render_value(item, vars))
                .collect::<Result<Vec<_>>>()
                .map(serde_json::Value::Array),
            serde_json::Value::Object(map) => {
                let mut rendered = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    rendered.insert(key.clone(), self.render_value(item, vars)?);
                }
                Ok(serde_json::Value::Object(rendered))
            }
            _ => Ok(value.clone()),
        }
    }

    /// Check whether a string contains template syntax.
    pub fn is_template(s: &str) -> bool {
        s.contains("{{") || s.contains("{%") || s.contains("{#")
    }

    /// Check whether templates can use the filter `name`.
    pub fn has_filter(&self, name: &str) -> bool {
        self.env
            .render_str(&format!("{{{{ none | {name} }}}}"), ())
            .map_or_else(
                |e| e.kind() != minijinja::ErrorKind::UnknownFilter,
                |_| true,
            )
    }

    fn eval_native(&self, expression: &str, vars: &TemplateVars) -> Result<Value> {
        let compiled = self
            .env
            .compile_expression_owned(expression.trim().to_string())
            .map_err(|e| Error::from_template(expression, &e))?;
        compiled
            .eval(vars)
            .map_err(|e| Error::from_template(expression, &e))
    }
}

fn base_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env
}

/// Return the inner expression if `s` is exactly one `{{ ... }}` block.
fn single_expression(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") || inner.trim().is_empty() {
        return None;
    }
    Some(inner.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn vars(pairs: &[(&str, serde_json::Value)]) -> TemplateVars {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_render_with_custom_title() {
        let engine = TemplateEngine::new();
        let vars = vars(&[("message", json!("hello ansible"))]);
        let result = engine
            .render("{{ message | custom_title('Custom: ') }}", &vars)
            .unwrap();
        assert_eq!(result, "Custom: Hello Ansible");
    }

    #[test]
    fn test_render_undefined_is_error() {
        let engine = TemplateEngine::new();
        let err = engine.render("{{ missing }}", &TemplateVars::new()).unwrap_err();
        assert!(matches!(err, Error::TemplateRender { .. }));
    }

    #[test]
    fn test_render_syntax_error() {
        let engine = TemplateEngine::new();
        let err = engine.render("{{ oops", &TemplateVars::new()).unwrap_err();
        assert!(matches!(err, Error::TemplateSyntax { .. }));
    }

    #[test]
    fn test_render_value_keeps_native_types() {
        let engine = TemplateEngine::new();
        let vars = vars(&[("items", json!(["a", "b"]))]);

        let number = engine
            .render_value(&json!("{{ 42 | custom_title('Custom: ') }}"), &vars)
            .unwrap();
        assert_eq!(number, json!(42));

        let list = engine
            .render_value(&json!("{{ items | custom_title('Custom: ') }}"), &vars)
            .unwrap();
        assert_eq!(list, json!(["a", "b"]));
    }

    #[test]
    fn test_render_value_keeps_text_around_block() {
        let engine = TemplateEngine::new();
        let vars = vars(&[("x", json!("hello ansible"))]);

        let padded = engine
            .render_value(&json!("  {{ x | custom_title('C: ') }}  "), &vars)
            .unwrap();
        assert_eq!(padded, json!("  C: Hello Ansible  "));

        let number = engine
            .render_value(&json!(" {{ 42 | custom_title }}"), &vars)
            .unwrap();
        assert_eq!(number, json!(" 42"));
    }

    #[test]
    fn test_render_value_recurses() {
        let engine = TemplateEngine::new();
        let vars = vars(&[("name", json!("web server"))]);
        let value = json!({
            "msg": "Host: {{ name | custom_title }}!",
            "plain": "no template here",
            "nested": ["{{ name | custom_title('> ') }}", 3],
        });

        let rendered = engine.render_value(&value, &vars).unwrap();
        assert_eq!(
            rendered,
            json!({
                "msg": "Host: Web Server!",
                "plain": "no template here",
                "nested": ["> Web Server", 3],
            })
        );
    }

    #[test]
    fn test_evaluate_condition() {
        let engine = TemplateEngine::new();
        let vars = vars(&[("enabled", json!(true)), ("count", json!(3))]);
        assert!(engine.evaluate_condition("enabled", &vars).unwrap());
        assert!(engine.evaluate_condition("count > 2", &vars).unwrap());
        assert!(!engine.evaluate_condition("{{ count == 1 }}", &vars).unwrap());
        assert!(engine.evaluate_condition(" {{ count == 3 }} ", &vars).unwrap());
    }

    #[test]
    fn test_evaluate_undefined_is_error() {
        let engine = TemplateEngine::new();
        assert!(engine.evaluate("missing", &TemplateVars::new()).is_err());
    }

    #[test]
    fn test_single_expression_detection() {
        assert_eq!(single_expression("{{ x }}"), Some("x"));
        assert_eq!(single_expression("{{  x | f('a') }}"), Some("x | f('a')"));
        assert_eq!(single_expression("  {{ x | f('a') }} "), None);
        assert_eq!(single_expression("{{ a }} {{ b }}"), None);
        assert_eq!(single_expression("pre {{ x }}"), None);
        assert_eq!(single_expression("{{ }}"), None);
    }

    #[test]
    fn test_filter_subset() {
        let registry = FilterRegistry::with_builtins();
        let none: [&str; 0] = [];
        let engine = TemplateEngine::with_filter_modules(&registry, &none).unwrap();
        assert!(!engine.has_filter("custom_title"));
        assert!(TemplateEngine::new().has_filter("custom_title"));
    }
}
