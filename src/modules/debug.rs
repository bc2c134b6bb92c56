//! Debug module - Print debug messages and variable values
//!
//! The usual way to look at what a filter produced: `msg` shows a rendered
//! value, `var` shows a variable by name. Runs entirely on the control node.

use super::{Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult};
use serde_json::Value;

/// Module for printing debug messages and variable values
pub struct DebugModule;

impl DebugModule {
    /// Format a value for display: strings as-is, everything else as JSON.
    pub fn format_value(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => "(undefined)".to_string(),
            _ => serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value)),
        }
    }

    /// Look up a variable, following dotted paths into objects and lists.
    fn get_variable_value<'a>(var_name: &str, context: &'a ModuleContext) -> Option<&'a Value> {
        let mut parts = var_name.split('.');
        let mut current = context.vars.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Object(obj) => obj.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    fn required_verbosity(params: &ModuleParams) -> ModuleResult<u8> {
        match params.get("verbosity") {
            None => Ok(0),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| {
                    ModuleError::InvalidParameter(format!("invalid verbosity: {}", n))
                }),
            Some(Value::String(s)) => s.trim().parse::<u8>().map_err(|_| {
                ModuleError::InvalidParameter(format!("invalid verbosity: {}", s))
            }),
            Some(other) => Err(ModuleError::InvalidParameter(format!(
                "invalid verbosity: {}",
                other
            ))),
        }
    }
}

impl Module for DebugModule {
    fn name(&self) -> &'static str {
        "debug"
    }

    fn description(&self) -> &'static str {
        "Print debug messages or variable values to the console"
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        if params.contains_key("msg") && params.contains_key("var") {
            return Err(ModuleError::InvalidParameter(
                "Cannot specify both 'msg' and 'var' parameters".to_string(),
            ));
        }
        Self::required_verbosity(params)?;
        Ok(())
    }

    fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        if context.verbosity < Self::required_verbosity(params)? {
            return Ok(ModuleOutput::skipped("Skipped due to verbosity level"));
        }

        if let Some(var_param) = params.get("var") {
            let var_name = var_param.as_str().ok_or_else(|| {
                ModuleError::InvalidParameter("'var' parameter must be a string".to_string())
            })?;

            return Ok(match Self::get_variable_value(var_name, context) {
                Some(value) => {
                    let message = format!("{}: {}", var_name, Self::format_value(value));
                    ModuleOutput::ok(message).with_data(var_name, value.clone())
                }
                None => ModuleOutput::ok(format!("{}: VARIABLE IS NOT DEFINED!", var_name))
                    .with_data(var_name, Value::Null),
            });
        }

        // Without msg or var, Ansible prints its default greeting.
        let msg = params
            .get("msg")
            .cloned()
            .unwrap_or_else(|| Value::String("Hello world!".to_string()));

        Ok(ModuleOutput::ok(Self::format_value(&msg)).with_data("msg", msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn params(pairs: &[(&str, Value)]) -> ModuleParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_debug_with_msg() {
        let result = DebugModule
            .execute(
                &params(&[("msg", json!("Custom: Hello Ansible"))]),
                &ModuleContext::default(),
            )
            .unwrap();

        assert!(!result.changed);
        assert_eq!(result.msg, "Custom: Hello Ansible");
        assert_eq!(result.data.get("msg"), Some(&json!("Custom: Hello Ansible")));
    }

    #[test]
    fn test_debug_keeps_native_msg() {
        let result = DebugModule
            .execute(&params(&[("msg", json!(["a", "b"]))]), &ModuleContext::default())
            .unwrap();

        assert_eq!(result.msg, r#"["a","b"]"#);
        assert_eq!(result.data.get("msg"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn test_debug_default_message() {
        let result = DebugModule
            .execute(&ModuleParams::new(), &ModuleContext::default())
            .unwrap();
        assert_eq!(result.msg, "Hello world!");
    }

    #[test]
    fn test_debug_with_nested_var() {
        let mut vars = HashMap::new();
        vars.insert("app".to_string(), json!({"title": "Custom: Web"}));
        let context = ModuleContext::default().with_vars(vars);

        let result = DebugModule
            .execute(&params(&[("var", json!("app.title"))]), &context)
            .unwrap();
        assert_eq!(result.msg, "app.title: Custom: Web");
    }

    #[test]
    fn test_debug_with_undefined_var() {
        let result = DebugModule
            .execute(
                &params(&[("var", json!("undefined_var"))]),
                &ModuleContext::default(),
            )
            .unwrap();

        assert!(result.msg.contains("VARIABLE IS NOT DEFINED"));
        assert_eq!(result.data.get("undefined_var"), Some(&Value::Null));
    }

    #[test]
    fn test_debug_verbosity_gate() {
        let p = params(&[("msg", json!("loud")), ("verbosity", json!(2))]);

        let quiet = DebugModule.execute(&p, &ModuleContext::default()).unwrap();
        assert_eq!(quiet.status, crate::modules::ModuleStatus::Skipped);

        let loud = DebugModule
            .execute(&p, &ModuleContext::default().with_verbosity(2))
            .unwrap();
        assert_eq!(loud.msg, "loud");
    }

    #[test]
    fn test_debug_validation_not_both() {
        let p = params(&[("msg", json!("Hello")), ("var", json!("test"))]);
        let err = DebugModule.validate_params(&p).unwrap_err();
        assert!(err.to_string().contains("Cannot specify both"));
    }
}
