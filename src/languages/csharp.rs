//! C# profile for classic `static void Main` programs.

use tree_sitter::Language;

use super::ProfileDefinition;

const IMPORT_QUERY: &str = r#"
(using_directive
  (qualified_name) @import_path
) @import_location

(using_directive
  (identifier) @import_path
) @import_location
"#;

const ENTRY_POINT_QUERY: &str = r#"
(method_declaration
  name: (identifier) @entry_name
  body: (block) @entry_body
  (#eq? @entry_name "Main")
)
"#;

const INSERTION_QUERY: &str = r#"
(block (local_declaration_statement) @after_variables)
(block (expression_statement (invocation_expression)) @before_function_calls)
(block) @function_start
"#;

const INIT_TEMPLATE: &str = r#"using var tracerProvider = Sdk.CreateTracerProviderBuilder()
    .SetResourceBuilder(ResourceBuilder.CreateDefault().AddService("{{service_name}}"))
    .AddOtlpExporter()
    .Build();"#;

fn grammar() -> Language {
    tree_sitter_c_sharp::LANGUAGE.into()
}

pub(crate) static PROFILE: ProfileDefinition = ProfileDefinition {
    id: "csharp",
    display_name: "C#",
    aliases: &["c#", "cs", "dotnet"],
    extensions: &[".cs"],
    grammar,
    existing_imports_query: IMPORT_QUERY,
    entry_point_query: ENTRY_POINT_QUERY,
    insertion_priority_query: Some(INSERTION_QUERY),
    insertion_depth: Some(0),
    preamble_query: None,
    import_template: "using {{path}};",
    block_import_template: None,
    init_template: INIT_TEMPLATE,
    cleanup_template: None,
    setup_markers: &[
        "AddOpenTelemetry(",
        "WithTracing(",
        "CreateTracerProviderBuilder(",
    ],
    instrumentation_namespaces: &["OpenTelemetry"],
    core_imports: &["OpenTelemetry", "OpenTelemetry.Resources", "OpenTelemetry.Trace"],
    instrumentation_import_template: "OpenTelemetry.Instrumentation.{{name}}",
    indent_unit: "    ",
};
