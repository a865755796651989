//! Go profile.
//!
//! Entry point is `func main()`. Imports are recognised both as single
//! `import "x"` declarations and as specs inside a grouped `import ( ... )`
//! block; new imports prefer the grouped block.

use tree_sitter::Language;

use super::ProfileDefinition;

const IMPORT_QUERY: &str = r#"
(import_declaration
  (import_spec
    path: [(interpreted_string_literal) (raw_string_literal)] @import_path
  )
) @import_location

(import_declaration
  (import_spec_list
    (import_spec
      path: [(interpreted_string_literal) (raw_string_literal)] @import_path
    ) @import_block_item
  )
) @import_location
"#;

const ENTRY_POINT_QUERY: &str = r#"
(function_declaration
  name: (identifier) @entry_name
  body: (block) @entry_body
  (#eq? @entry_name "main")
)
"#;

// Unrooted so the patterns hold whether or not the grammar wraps block
// statements in a statement_list; depth keeps them at the body's own level.
// Start of body is the resolver default, so nested blocks are never captured.
const INSERTION_QUERY: &str = r#"
(var_declaration) @after_variables
(short_var_declaration) @after_variables
(expression_statement (call_expression)) @before_function_calls
"#;

const PREAMBLE_QUERY: &str = r#"
(package_clause) @preamble
"#;

const INIT_TEMPLATE: &str = r#"tp, err := SetupOTEL("{{service_name}}")
if err != nil {
	log.Fatalf("failed to initialize OpenTelemetry: %v", err)
}
defer func() { _ = tp.Shutdown(context.Background()) }()"#;

fn grammar() -> Language {
    tree_sitter_go::LANGUAGE.into()
}

pub(crate) static PROFILE: ProfileDefinition = ProfileDefinition {
    id: "go",
    display_name: "Go",
    aliases: &["golang"],
    extensions: &[".go"],
    grammar,
    existing_imports_query: IMPORT_QUERY,
    entry_point_query: ENTRY_POINT_QUERY,
    insertion_priority_query: Some(INSERTION_QUERY),
    insertion_depth: Some(2),
    preamble_query: Some(PREAMBLE_QUERY),
    import_template: "import \"{{path}}\"",
    block_import_template: Some("\t\"{{path}}\""),
    init_template: INIT_TEMPLATE,
    cleanup_template: None,
    setup_markers: &[
        "SetupOTEL",
        "otel.SetTracerProvider",
        "trace.NewTracerProvider",
        "setupTracing",
    ],
    instrumentation_namespaces: &["go.opentelemetry.io"],
    core_imports: &["context", "log"],
    instrumentation_import_template: "go.opentelemetry.io/contrib/instrumentation/{{name}}",
    indent_unit: "\t",
};
