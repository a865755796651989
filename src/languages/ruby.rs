//! Ruby profile. Scripts run top to bottom, so the program is the entry body
//! and the SDK is configured right after the last top-level `require`, or at
//! the top of the script (below any shebang) when there is none.

use tree_sitter::Language;

use super::ProfileDefinition;

const IMPORT_QUERY: &str = r#"
(program
  (call
    method: (identifier) @_require
    arguments: (argument_list (string) @import_path)
  ) @import_location
  (#any-of? @_require "require" "require_relative")
)
"#;

const ENTRY_POINT_QUERY: &str = r#"
(program) @entry_body
"#;

const INSERTION_QUERY: &str = r#"
(program
  (call method: (identifier) @_require) @after_imports
  (#any-of? @_require "require" "require_relative")
)
(program) @function_start
"#;

const PREAMBLE_QUERY: &str = r#"
(program . (comment) @preamble (#match? @preamble "^#!"))
"#;

const INIT_TEMPLATE: &str = r#"OpenTelemetry::SDK.configure do |c|
  c.service_name = "{{service_name}}"
  c.use_all
end"#;

fn grammar() -> Language {
    tree_sitter_ruby::LANGUAGE.into()
}

pub(crate) static PROFILE: ProfileDefinition = ProfileDefinition {
    id: "ruby",
    display_name: "Ruby",
    aliases: &["rb"],
    extensions: &[".rb"],
    grammar,
    existing_imports_query: IMPORT_QUERY,
    entry_point_query: ENTRY_POINT_QUERY,
    insertion_priority_query: Some(INSERTION_QUERY),
    insertion_depth: Some(0),
    preamble_query: Some(PREAMBLE_QUERY),
    import_template: "require \"{{path}}\"",
    block_import_template: None,
    init_template: INIT_TEMPLATE,
    cleanup_template: None,
    setup_markers: &["OpenTelemetry::SDK.configure", "OTelSetup"],
    instrumentation_namespaces: &["opentelemetry"],
    core_imports: &["opentelemetry/sdk", "opentelemetry/exporter/otlp"],
    instrumentation_import_template: "opentelemetry/instrumentation/{{name}}",
    indent_unit: "  ",
};
