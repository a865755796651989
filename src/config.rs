//! Configuration file schema and discovery.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::codegen::ProfileNaming;

/// File names looked up in the working directory, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &[".lawrence.yaml", "lawrence.yaml"];

const DEFAULT_LOG_FILTER: &str = "warn";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Service name rendered into init code (default: project directory name).
    #[serde(default)]
    pub service_name: Option<String>,
    /// Worker threads for batch injection (default: one per CPU).
    #[serde(default)]
    pub workers: Option<usize>,
    /// tracing `EnvFilter` directive, e.g. "lawrence=debug".
    #[serde(default)]
    pub log_filter: Option<String>,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Glob patterns for paths to leave alone (e.g., "**/generated/**").
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    #[serde(default)]
    pub imports: ImportOverrides,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Per-language replacements for the built-in dependency names.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ImportOverrides {
    /// Language id to the full list of core imports.
    #[serde(default)]
    pub core: HashMap<String, Vec<String>>,
    /// Language id to instrumentation id to import path.
    #[serde(default)]
    pub instrumentations: HashMap<String, HashMap<String, String>>,
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load `explicit` if given, else the first discovered file, else defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => discover(Path::new(".")),
        };
        match path {
            Some(path) => Self::parse_file(&path)
                .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e)),
            None => Ok(Self::default()),
        }
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Compile `excluded_paths`. `None` when nothing is excluded.
    pub fn excluded_globs(&self) -> anyhow::Result<Option<GlobSet>> {
        if self.excluded_paths.is_empty() {
            return Ok(None);
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Some(builder.build()?))
    }

    /// Dependency naming with this configuration's overrides applied.
    pub fn naming(&self) -> ProfileNaming {
        let mut naming = ProfileNaming::new();
        for (language, imports) in &self.imports.core {
            naming = naming.with_core_override(language, imports.clone());
        }
        for (language, paths) in &self.imports.instrumentations {
            for (id, path) in paths {
                naming = naming.with_instrumentation_override(language, id, path);
            }
        }
        naming
    }

    /// Service name from configuration, else the basename of `project`.
    pub fn service_name_for(&self, project: &Path) -> String {
        if let Some(name) = &self.service_name {
            return name.clone();
        }
        let dir = if project.is_file() {
            project.parent().unwrap_or(project)
        } else {
            project
        };
        dir.canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| String::from("service"))
    }
}

/// Find a configuration file in `dir`, then in the user config directory.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    for name in DEFAULT_CONFIG_NAMES {
        let path = dir.join(name);
        if path.is_file() {
            return Some(path);
        }
    }
    directories::ProjectDirs::from("", "", "lawrence")
        .map(|d| d.config_dir().join("config.yaml"))
        .filter(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::DependencyNaming;
    use crate::languages;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lawrence.yaml");
        fs::write(
            &path,
            r#"
service_name: checkout
workers: 4
log_filter: lawrence=debug
log_format: json
excluded_paths:
  - "**/generated/**"
imports:
  core:
    go: ["context", "example.com/otelsetup"]
  instrumentations:
    python:
      flask: custom.flask_otel
"#,
        )
        .unwrap();

        let config = Config::parse_file(&path).unwrap();
        assert_eq!(config.service_name.as_deref(), Some("checkout"));
        assert_eq!(config.workers, Some(4));
        assert_eq!(config.log_filter(), "lawrence=debug");
        assert_eq!(config.log_format, LogFormat::Json);

        let globs = config.excluded_globs().unwrap().unwrap();
        assert!(globs.is_match("src/generated/main.go"));
        assert!(!globs.is_match("src/main.go"));

        let registry = languages::builtin().unwrap();
        let naming = config.naming();
        assert_eq!(
            naming.core_imports(registry.get("go").unwrap()),
            vec!["context", "example.com/otelsetup"]
        );
        assert_eq!(
            naming
                .instrumentation_import(registry.get("python").unwrap(), "flask")
                .as_deref(),
            Some("custom.flask_otel")
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log_filter(), "warn");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.excluded_globs().unwrap().is_none());
    }

    #[test]
    fn test_discover_in_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".lawrence.yaml"), "service_name: a\n").unwrap();
        assert_eq!(discover(dir.path()), Some(dir.path().join(".lawrence.yaml")));
    }

    #[test]
    fn test_service_name_defaults_to_directory() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("payments");
        fs::create_dir(&project).unwrap();
        assert_eq!(Config::default().service_name_for(&project), "payments");

        let config = Config {
            service_name: Some("explicit".into()),
            ..Config::default()
        };
        assert_eq!(config.service_name_for(&project), "explicit");
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "workers: many\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }
}
