use std::env;

const KNOWN_STAGES: [&str; 3] = ["local", "development", "production"];

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Debug, Clone)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) default_directive: String,
    /// Captured during parsing so they can be logged once tracing is up.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    fn from_lookup(component: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let component = component.trim().to_string();
        let mut warnings = Vec::new();

        let service_name = lookup("SERVICE_NAME")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| component.clone());

        let environment = match lookup("STAGE").filter(|v| !v.trim().is_empty()) {
            Some(stage) if KNOWN_STAGES.contains(&stage.as_str()) => stage,
            Some(stage) => {
                warnings.push(format!(
                    "STAGE is not one of {} (value: {stage}); logging it as-is",
                    KNOWN_STAGES.join(", ")
                ));
                stage
            }
            None => "local".to_string(),
        };

        // Local runs get debug output from our own crates; deployed stages stay at info.
        let default_directive = if environment == "local" {
            "info,crates=debug,backend=debug".to_string()
        } else {
            "info".to_string()
        };

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
            default_directive,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ObservabilityConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ObservabilityConfig::from_lookup("backend", |key| vars.get(key).cloned())
    }

    #[test]
    fn service_name_falls_back_to_component() {
        let config = config(&[]);
        assert_eq!(config.service_context.service_name, "backend");
        assert_eq!(config.service_context.environment, "local");
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn unknown_stage_is_kept_with_a_warning() {
        let config = config(&[("STAGE", "staging"), ("SERVICE_NAME", "clips-api")]);
        assert_eq!(config.service_context.environment, "staging");
        assert_eq!(config.service_context.service_name, "clips-api");
        assert_eq!(config.default_directive, "info");
        assert_eq!(config.warnings.len(), 1);
    }
}
