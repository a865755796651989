//! JavaScript profile.
//!
//! Node programs have no main function; the whole program is the entry body.
//! Both ES `import` statements and top-level `require(...)` calls count as
//! imports. The query strings are shared with the TypeScript profile.

use tree_sitter::Language;

use super::ProfileDefinition;

pub(super) const IMPORT_QUERY: &str = r#"
(program
  (import_statement
    source: (string) @import_path
  ) @import_location
)

(program
  (lexical_declaration
    (variable_declarator
      value: (call_expression
        function: (identifier) @_require
        arguments: (arguments (string) @import_path)
      )
    )
  ) @import_location
  (#eq? @_require "require")
)

(program
  (variable_declaration
    (variable_declarator
      value: (call_expression
        function: (identifier) @_require
        arguments: (arguments (string) @import_path)
      )
    )
  ) @import_location
  (#eq? @_require "require")
)

(program
  (expression_statement
    (call_expression
      function: (identifier) @_require
      arguments: (arguments (string) @import_path)
    )
  ) @import_location
  (#eq? @_require "require")
)
"#;

pub(super) const ENTRY_POINT_QUERY: &str = r#"
(program) @entry_body
"#;

pub(super) const INSERTION_QUERY: &str = r#"
(program (lexical_declaration) @after_variables)
(program (variable_declaration) @after_variables)
(program (expression_statement (call_expression)) @before_function_calls)
(program) @function_start
"#;

/// A shebang only works on the first line.
pub(super) const PREAMBLE_QUERY: &str = r#"
(program . (hash_bang_line) @preamble)
"#;

pub(super) const SETUP_MARKERS: &[&str] = &[
    "setupOTel(",
    "@opentelemetry/sdk-node",
    "NodeSDK(",
];

const INIT_TEMPLATE: &str = r#"const { setupOTel } = require("./otel");
setupOTel("{{service_name}}");"#;

fn grammar() -> Language {
    tree_sitter_javascript::LANGUAGE.into()
}

pub(crate) static PROFILE: ProfileDefinition = ProfileDefinition {
    id: "javascript",
    display_name: "JavaScript",
    aliases: &["js", "node", "nodejs"],
    extensions: &[".js", ".mjs", ".cjs"],
    grammar,
    existing_imports_query: IMPORT_QUERY,
    entry_point_query: ENTRY_POINT_QUERY,
    insertion_priority_query: Some(INSERTION_QUERY),
    insertion_depth: Some(0),
    preamble_query: Some(PREAMBLE_QUERY),
    import_template: "require(\"{{path}}\");",
    block_import_template: None,
    init_template: INIT_TEMPLATE,
    cleanup_template: None,
    setup_markers: SETUP_MARKERS,
    instrumentation_namespaces: &["@opentelemetry/"],
    core_imports: &["@opentelemetry/api"],
    instrumentation_import_template: "@opentelemetry/instrumentation-{{name}}",
    indent_unit: "  ",
};
