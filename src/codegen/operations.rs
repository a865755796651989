//! What should end up present in a file, and what it is called.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::template::{render_template, TemplateValues};
use crate::languages::LanguageProfile;

/// Desired end state for the files being processed.
///
/// Field names follow the operations files produced by the opportunity
/// scanner (`install_otel`, `install_instrumentations`, `install_components`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredOperations {
    #[serde(default, rename = "install_otel", alias = "install_core")]
    pub install_core: bool,

    #[serde(default, rename = "install_instrumentations", alias = "instrumentations")]
    pub instrumentations: Vec<String>,

    /// Component kind (e.g., "propagator") to component names.
    #[serde(default, rename = "install_components", alias = "components")]
    pub components: BTreeMap<String, Vec<String>>,
}

impl DesiredOperations {
    /// Parse an operations file. JSON is accepted as a YAML subset.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let ops: DesiredOperations = serde_yaml::from_str(&content)?;
        Ok(ops)
    }

    pub fn core() -> Self {
        Self {
            install_core: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.install_core && self.instrumentations.is_empty() && self.components.is_empty()
    }
}

/// Maps (language, dependency) to the concrete import path to render.
pub trait DependencyNaming: Send + Sync {
    /// Imports required for a core install.
    fn core_imports(&self, profile: &LanguageProfile) -> Vec<String>;

    /// Import path for a named instrumentation, if the language has one.
    fn instrumentation_import(&self, profile: &LanguageProfile, id: &str) -> Option<String>;
}

/// Naming derived from profile defaults, with per-language overrides.
#[derive(Debug, Clone, Default)]
pub struct ProfileNaming {
    core_overrides: HashMap<String, Vec<String>>,
    instrumentation_overrides: HashMap<String, HashMap<String, String>>,
}

impl ProfileNaming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_core_override(mut self, language: &str, imports: Vec<String>) -> Self {
        self.core_overrides.insert(language.to_string(), imports);
        self
    }

    pub fn with_instrumentation_override(mut self, language: &str, id: &str, path: &str) -> Self {
        self.instrumentation_overrides
            .entry(language.to_string())
            .or_default()
            .insert(id.to_string(), path.to_string());
        self
    }
}

impl DependencyNaming for ProfileNaming {
    fn core_imports(&self, profile: &LanguageProfile) -> Vec<String> {
        match self.core_overrides.get(profile.id()) {
            Some(imports) => imports.clone(),
            None => profile
                .definition
                .core_imports
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    fn instrumentation_import(&self, profile: &LanguageProfile, id: &str) -> Option<String> {
        if let Some(path) = self
            .instrumentation_overrides
            .get(profile.id())
            .and_then(|m| m.get(id))
        {
            return Some(path.clone());
        }

        let template = profile.definition.instrumentation_import_template;
        if template.is_empty() {
            return None;
        }
        let mut values = TemplateValues::new();
        values.set("name", id);
        Some(render_template(template, &values))
    }
}
