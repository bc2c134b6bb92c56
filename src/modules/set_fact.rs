//! Set_fact module - Set host variables during playbook execution
//!
//! Arguments are rendered by the executor before the module sees them, so a
//! fact set from `"{{ 42 | custom_title }}"` keeps its integer type. The
//! facts are returned under `ansible_facts` for the executor to store.

use super::{Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult};

/// Module for setting host facts/variables dynamically
pub struct SetFactModule;

impl Module for SetFactModule {
    fn name(&self) -> &'static str {
        "set_fact"
    }

    fn description(&self) -> &'static str {
        "Set host variables (facts) that persist for the duration of the run"
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        if params.keys().all(|k| k == "cacheable") {
            return Err(ModuleError::InvalidParameter(
                "set_fact requires at least one key=value pair to set".to_string(),
            ));
        }
        Ok(())
    }

    fn execute(
        &self,
        params: &ModuleParams,
        _context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let mut facts: Vec<&String> = params.keys().filter(|k| *k != "cacheable").collect();
        facts.sort();

        let message = if facts.len() == 1 {
            format!("Set fact: {}", facts[0])
        } else {
            format!(
                "Set {} facts: {}",
                facts.len(),
                facts
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };

        // set_fact is reported as ok, never changed
        let values = facts
            .into_iter()
            .map(|key| (key.clone(), params[key].clone()))
            .collect();
        Ok(ModuleOutput::ok(message).with_facts(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_fact_validation() {
        let mut params = ModuleParams::new();
        assert!(SetFactModule.validate_params(&params).is_err());

        params.insert("cacheable".to_string(), json!(true));
        assert!(SetFactModule.validate_params(&params).is_err());

        params.insert("title".to_string(), json!("Custom: Web"));
        assert!(SetFactModule.validate_params(&params).is_ok());
    }

    #[test]
    fn test_set_fact_execute() {
        let mut params = ModuleParams::new();
        params.insert("title".to_string(), json!("Custom: Web"));
        params.insert("port".to_string(), json!(42));
        params.insert("cacheable".to_string(), json!(false));

        let result = SetFactModule
            .execute(&params, &ModuleContext::default())
            .unwrap();

        assert!(!result.changed);
        assert_eq!(result.msg, "Set 2 facts: port, title");
        let facts = result.facts().unwrap();
        assert_eq!(facts.get("port"), Some(&json!(42)));
        assert_eq!(facts.get("title"), Some(&json!("Custom: Web")));
        assert!(!facts.contains_key("cacheable"));
    }
}
