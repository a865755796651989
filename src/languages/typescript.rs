//! TypeScript profile. Reuses the JavaScript queries; the grammar shares
//! their node names.

use tree_sitter::Language;

use super::javascript::{
    ENTRY_POINT_QUERY, IMPORT_QUERY, INSERTION_QUERY, PREAMBLE_QUERY, SETUP_MARKERS,
};
use super::ProfileDefinition;

const INIT_TEMPLATE: &str = r#"import { setupOTel } from "./otel";
setupOTel("{{service_name}}");"#;

fn grammar() -> Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

pub(crate) static PROFILE: ProfileDefinition = ProfileDefinition {
    id: "typescript",
    display_name: "TypeScript",
    aliases: &["ts"],
    extensions: &[".ts", ".mts", ".cts"],
    grammar,
    existing_imports_query: IMPORT_QUERY,
    entry_point_query: ENTRY_POINT_QUERY,
    insertion_priority_query: Some(INSERTION_QUERY),
    insertion_depth: Some(0),
    preamble_query: Some(PREAMBLE_QUERY),
    import_template: "import \"{{path}}\";",
    block_import_template: None,
    init_template: INIT_TEMPLATE,
    cleanup_template: None,
    setup_markers: SETUP_MARKERS,
    instrumentation_namespaces: &["@opentelemetry/"],
    core_imports: &["@opentelemetry/api"],
    instrumentation_import_template: "@opentelemetry/instrumentation-{{name}}",
    indent_unit: "  ",
};
