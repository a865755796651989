//! Language profiles and the registry that owns them.
//!
//! A profile is plain data: a grammar, the file extensions it claims, the
//! tree-sitter queries used to find imports, entry points and insertion
//! candidates, and the code templates rendered into modifications. Each
//! supported language contributes one static [`ProfileDefinition`]; the
//! registry compiles every query once at registration so a malformed query
//! surfaces as [`InjectError::QueryCompile`] before any file is touched.
//!
//! # Capture names
//!
//! | query              | captures                                                   |
//! |--------------------|------------------------------------------------------------|
//! | existing imports   | `import_path`, `import_location`, `import_block_item`      |
//! | entry point        | `entry_name` (optional), `entry_body`                      |
//! | insertion priority | `after_variables`, `after_imports`, `before_function_calls`, `function_start` |
//! | preamble           | any name; the furthest end line is used                   |
//!
//! Captures whose name starts with `_` only feed predicates and are ignored.
//!
//! # Adding a New Language
//!
//! 1. Create a module next to `go.rs` holding a `pub(crate) static PROFILE`.
//! 2. Add it to [`BUILTIN_PROFILES`].

mod csharp;
mod go;
mod java;
mod javascript;
mod python;
mod ruby;
mod typescript;

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::OnceCell;
use tree_sitter::{Language, Parser, Query};

use crate::error::{InjectError, QueryKind, Result};

/// Static description of a supported language.
#[derive(Debug)]
pub struct ProfileDefinition {
    /// Canonical identifier (e.g., "go", "csharp").
    pub id: &'static str,
    pub display_name: &'static str,
    /// Alternative identifiers accepted by lookup, matched case-insensitively.
    pub aliases: &'static [&'static str],
    /// File extensions including the leading dot.
    pub extensions: &'static [&'static str],
    pub grammar: fn() -> Language,
    pub existing_imports_query: &'static str,
    pub entry_point_query: &'static str,
    pub insertion_priority_query: Option<&'static str>,
    /// Deepest level below the body node where insertion patterns may start.
    pub insertion_depth: Option<u32>,
    /// Package/module declaration or leading docstring.
    pub preamble_query: Option<&'static str>,
    /// Rendering of a stand-alone import statement (`{{path}}`).
    pub import_template: &'static str,
    /// Rendering of an entry inside an existing grouped import block.
    pub block_import_template: Option<&'static str>,
    pub init_template: &'static str,
    pub cleanup_template: Option<&'static str>,
    /// Substrings that mark a body as already instrumented.
    pub setup_markers: &'static [&'static str],
    /// Substrings that classify an import path as instrumentation.
    pub instrumentation_namespaces: &'static [&'static str],
    /// Imports required by a core install.
    pub core_imports: &'static [&'static str],
    /// Import path for a named instrumentation (`{{name}}`).
    pub instrumentation_import_template: &'static str,
    /// One level of indentation, used when a body has no statements to copy from.
    pub indent_unit: &'static str,
}

/// Compiled queries of a profile.
pub struct Queries {
    pub existing_imports: Query,
    pub entry_point: Query,
    pub insertion_priority: Option<Query>,
    pub preamble: Option<Query>,
}

/// A registered, ready-to-use language profile.
pub struct LanguageProfile {
    pub definition: &'static ProfileDefinition,
    language: Language,
    queries: Queries,
}

impl std::fmt::Debug for LanguageProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageProfile")
            .field("id", &self.definition.id)
            .field("extensions", &self.definition.extensions)
            .finish_non_exhaustive()
    }
}

impl LanguageProfile {
    /// Load the grammar and compile every query of `definition`.
    pub fn compile(definition: &'static ProfileDefinition) -> Result<Self> {
        let language = (definition.grammar)();

        // Fail early if the grammar ABI does not match the linked runtime.
        Parser::new()
            .set_language(&language)
            .map_err(|source| InjectError::Grammar {
                language: definition.id.to_string(),
                source,
            })?;

        let compile = |kind: QueryKind, source: &str| {
            Query::new(&language, source).map_err(|source| InjectError::QueryCompile {
                language: definition.id.to_string(),
                kind,
                source,
            })
        };

        let queries = Queries {
            existing_imports: compile(QueryKind::ExistingImports, definition.existing_imports_query)?,
            entry_point: compile(QueryKind::EntryPoint, definition.entry_point_query)?,
            insertion_priority: definition
                .insertion_priority_query
                .map(|q| compile(QueryKind::InsertionPriority, q))
                .transpose()?,
            preamble: definition
                .preamble_query
                .map(|q| compile(QueryKind::Preamble, q))
                .transpose()?,
        };

        Ok(Self {
            definition,
            language,
            queries,
        })
    }

    pub fn id(&self) -> &'static str {
        self.definition.id
    }

    pub fn display_name(&self) -> &'static str {
        self.definition.display_name
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn queries(&self) -> &Queries {
        &self.queries
    }

    /// Create a fresh parser for this profile's grammar.
    pub fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|source| InjectError::Grammar {
                language: self.id().to_string(),
                source,
            })?;
        Ok(parser)
    }

    /// Whether `path` carries one of this profile's extensions.
    pub fn matches_path(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self
                .definition
                .extensions
                .iter()
                .any(|known| known.trim_start_matches('.').eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    pub fn is_instrumentation_import(&self, path: &str) -> bool {
        self.definition
            .instrumentation_namespaces
            .iter()
            .any(|ns| path.contains(ns))
    }

    pub fn has_setup_marker(&self, text: &str) -> bool {
        self.definition
            .setup_markers
            .iter()
            .any(|marker| text.contains(marker))
    }
}

/// Lookup table from language identifier to profile.
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: Vec<LanguageProfile>,
    by_key: HashMap<String, usize>,
    by_extension: HashMap<String, usize>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in profile.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        for definition in BUILTIN_PROFILES {
            registry.register(LanguageProfile::compile(definition)?);
        }
        Ok(registry)
    }

    /// Add a profile. A profile with the same id replaces the previous one.
    pub fn register(&mut self, profile: LanguageProfile) {
        let definition = profile.definition;
        let index = match self.by_key.get(definition.id) {
            Some(&existing) => {
                self.profiles[existing] = profile;
                existing
            }
            None => {
                self.profiles.push(profile);
                self.profiles.len() - 1
            }
        };

        self.by_key.insert(definition.id.to_ascii_lowercase(), index);
        for alias in definition.aliases {
            self.by_key.insert(alias.to_ascii_lowercase(), index);
        }
        for ext in definition.extensions {
            self.by_extension
                .insert(ext.trim_start_matches('.').to_ascii_lowercase(), index);
        }
    }

    /// Look up a profile by id or alias.
    pub fn get(&self, language_id: &str) -> Result<&LanguageProfile> {
        self.by_key
            .get(&language_id.trim().to_ascii_lowercase())
            .map(|&i| &self.profiles[i])
            .ok_or_else(|| InjectError::UnsupportedLanguage(language_id.to_string()))
    }

    /// Look up a profile by file extension (with or without the leading dot).
    pub fn for_extension(&self, ext: &str) -> Option<&LanguageProfile> {
        self.by_extension
            .get(&ext.trim_start_matches('.').to_ascii_lowercase())
            .map(|&i| &self.profiles[i])
    }

    /// Look up a profile from a file path's extension.
    pub fn for_path(&self, path: &Path) -> Option<&LanguageProfile> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| self.for_extension(ext))
    }

    pub fn profiles(&self) -> impl Iterator<Item = &LanguageProfile> {
        self.profiles.iter()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.profiles.iter().map(|p| p.id()).collect()
    }
}

/// Every language shipped with the crate.
pub static BUILTIN_PROFILES: &[&ProfileDefinition] = &[
    &go::PROFILE,
    &python::PROFILE,
    &javascript::PROFILE,
    &typescript::PROFILE,
    &java::PROFILE,
    &csharp::PROFILE,
    &ruby::PROFILE,
];

static BUILTIN: OnceCell<ProfileRegistry> = OnceCell::new();

/// Process-wide registry of built-in profiles, compiled on first use.
pub fn builtin() -> Result<&'static ProfileRegistry> {
    BUILTIN.get_or_try_init(ProfileRegistry::with_builtin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtin_profiles_compile() {
        for definition in BUILTIN_PROFILES {
            if let Err(e) = LanguageProfile::compile(definition) {
                panic!("profile {} failed to compile: {}", definition.id, e);
            }
        }
    }

    #[test]
    fn test_grammar_abi_supported() {
        let supported = tree_sitter::MIN_COMPATIBLE_LANGUAGE_VERSION..=tree_sitter::LANGUAGE_VERSION;
        for definition in BUILTIN_PROFILES {
            let version = (definition.grammar)().version();
            assert!(
                supported.contains(&version),
                "{} grammar has ABI {}, supported {:?}",
                definition.id,
                version,
                supported
            );
        }
    }

    #[test]
    fn test_lookup_by_id_alias_and_extension() {
        let registry = builtin().unwrap();

        assert_eq!(registry.get("go").unwrap().id(), "go");
        assert_eq!(registry.get("Golang").unwrap().id(), "go");
        assert_eq!(registry.get("dotnet").unwrap().id(), "csharp");
        assert_eq!(registry.get("C#").unwrap().id(), "csharp");
        assert_eq!(registry.for_extension(".py").unwrap().id(), "python");
        assert_eq!(registry.for_extension("mjs").unwrap().id(), "javascript");
        assert_eq!(
            registry.for_path(Path::new("src/app.ts")).unwrap().id(),
            "typescript"
        );
        assert!(registry.for_extension("rs").is_none());
    }

    #[test]
    fn test_unknown_language_is_unsupported() {
        let registry = builtin().unwrap();
        let err = registry.get("cobol").unwrap_err();
        assert!(matches!(err, InjectError::UnsupportedLanguage(ref id) if id == "cobol"));
    }

    fn go_grammar() -> Language {
        tree_sitter_go::LANGUAGE.into()
    }

    static BROKEN: ProfileDefinition = ProfileDefinition {
        id: "broken-go",
        display_name: "Broken Go",
        aliases: &[],
        extensions: &[],
        grammar: go_grammar,
        existing_imports_query: "(import_declaration",
        entry_point_query: "(function_declaration body: (block) @entry_body)",
        insertion_priority_query: None,
        insertion_depth: None,
        preamble_query: None,
        import_template: "import \"{{path}}\"",
        block_import_template: None,
        init_template: "",
        cleanup_template: None,
        setup_markers: &[],
        instrumentation_namespaces: &[],
        core_imports: &[],
        instrumentation_import_template: "{{name}}",
        indent_unit: "\t",
    };

    #[test]
    fn test_malformed_query_fails_at_registration() {
        let err = LanguageProfile::compile(&BROKEN).unwrap_err();
        match err {
            InjectError::QueryCompile { language, kind, .. } => {
                assert_eq!(language, "broken-go");
                assert_eq!(kind, QueryKind::ExistingImports);
            }
            other => panic!("expected QueryCompile, got {other:?}"),
        }
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = ProfileRegistry::new();
        registry.register(LanguageProfile::compile(&go::PROFILE).unwrap());
        registry.register(LanguageProfile::compile(&go::PROFILE).unwrap());
        assert_eq!(registry.ids(), vec!["go"]);
    }
}
