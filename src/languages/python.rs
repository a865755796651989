//! Python profile. The entry point is the `if __name__ == "__main__":` guard.

use tree_sitter::Language;

use super::ProfileDefinition;

const IMPORT_QUERY: &str = r#"
(import_statement
  name: (dotted_name) @import_path
) @import_location

(import_from_statement
  module_name: (dotted_name) @import_path
) @import_location
"#;

const ENTRY_POINT_QUERY: &str = r#"
(if_statement
  condition: (comparison_operator
    (identifier) @_name_var
    (string) @_main_str
  )
  consequence: (block) @entry_body
  (#eq? @_name_var "__name__")
  (#match? @_main_str "__main__")
)
"#;

const INSERTION_QUERY: &str = r#"
(block
  (expression_statement (assignment)) @after_variables
)
(block
  (expression_statement (call)) @before_function_calls
)
(block) @function_start
"#;

// A module docstring or a leading comment (shebang, encoding line).
const PREAMBLE_QUERY: &str = r#"
(module . (expression_statement (string)) @preamble)
(module . (comment) @preamble)
"#;

const INIT_TEMPLATE: &str = r#"from otel import init_tracer
tracer_provider = init_tracer("{{service_name}}", instrumentations="{{instrumentations}}")"#;

fn grammar() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

pub(crate) static PROFILE: ProfileDefinition = ProfileDefinition {
    id: "python",
    display_name: "Python",
    aliases: &["py"],
    extensions: &[".py", ".pyw"],
    grammar,
    existing_imports_query: IMPORT_QUERY,
    entry_point_query: ENTRY_POINT_QUERY,
    insertion_priority_query: Some(INSERTION_QUERY),
    insertion_depth: Some(0),
    preamble_query: Some(PREAMBLE_QUERY),
    import_template: "import {{path}}",
    block_import_template: None,
    init_template: INIT_TEMPLATE,
    cleanup_template: None,
    setup_markers: &[
        "init_tracer(",
        "initialize_otel",
        "TracerProvider",
        "set_tracer_provider",
    ],
    instrumentation_namespaces: &["opentelemetry"],
    core_imports: &[
        "opentelemetry.sdk.trace",
        "opentelemetry.exporter.otlp.proto.http.trace_exporter",
    ],
    instrumentation_import_template: "opentelemetry.instrumentation.{{name}}",
    indent_unit: "    ",
};
