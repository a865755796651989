//! `{{placeholder}}` substitution for code templates.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::warn;

use super::DesiredOperations;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{\s*([a-z_][a-z0-9_.]*)\s*\}\}").unwrap();
}

/// Values available to a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateValues {
    values: BTreeMap<String, String>,
}

impl TemplateValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values for an init template: `service_name`, `instrumentations`,
    /// `components` and one `components.<kind>` per component kind.
    pub fn for_init(service_name: &str, ops: &DesiredOperations) -> Self {
        let mut values = Self::new();
        values.set("service_name", service_name);
        values.set("instrumentations", &ops.instrumentations.join(", "));

        let summary: Vec<String> = ops
            .components
            .iter()
            .map(|(kind, names)| format!("{}: {}", kind, names.join(", ")))
            .collect();
        values.set("components", &summary.join("; "));
        for (kind, names) in &ops.components {
            values.set(&format!("components.{kind}"), &names.join(", "));
        }
        values
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Substitute every known placeholder. Unknown placeholders are kept verbatim.
pub fn render_template(template: &str, values: &TemplateValues) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            match values.get(key) {
                Some(value) => value.to_string(),
                None => {
                    warn!(placeholder = key, "unknown template placeholder");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_known_placeholders() {
        let mut values = TemplateValues::new();
        values.set("path", "go.opentelemetry.io/otel");
        assert_eq!(
            render_template("import \"{{path}}\"", &values),
            "import \"go.opentelemetry.io/otel\""
        );
        assert_eq!(render_template("{{ path }}", &values), "go.opentelemetry.io/otel");
    }

    #[test]
    fn test_unknown_placeholder_is_preserved() {
        let values = TemplateValues::new();
        assert_eq!(render_template("x = {{missing}}", &values), "x = {{missing}}");
    }

    #[test]
    fn test_init_values() {
        let mut ops = DesiredOperations::core();
        ops.instrumentations = vec!["flask".into(), "requests".into()];
        ops.components
            .insert("propagator".into(), vec!["tracecontext".into(), "baggage".into()]);
        ops.components.insert("sampler".into(), vec!["always_on".into()]);

        let values = TemplateValues::for_init("checkout", &ops);
        assert_eq!(values.get("service_name"), Some("checkout"));
        assert_eq!(values.get("instrumentations"), Some("flask, requests"));
        assert_eq!(
            values.get("components"),
            Some("propagator: tracecontext, baggage; sampler: always_on")
        );
        assert_eq!(
            render_template("{{components.propagator}}", &values),
            "tracecontext, baggage"
        );
    }
}
