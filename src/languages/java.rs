//! Java profile.
//!
//! The SDK handle created by the init block is closed again just before the
//! end of `main`.

use tree_sitter::Language;

use super::ProfileDefinition;

const IMPORT_QUERY: &str = r#"
(import_declaration
  (scoped_identifier) @import_path
) @import_location
"#;

const ENTRY_POINT_QUERY: &str = r#"
(method_declaration
  name: (identifier) @entry_name
  body: (block) @entry_body
  (#eq? @entry_name "main")
)
"#;

const INSERTION_QUERY: &str = r#"
(block (local_variable_declaration) @after_variables)
(block (expression_statement (method_invocation)) @before_function_calls)
(block) @function_start
"#;

const PREAMBLE_QUERY: &str = r#"
(package_declaration) @preamble
"#;

const INIT_TEMPLATE: &str = r#"OpenTelemetrySdk openTelemetry = OpenTelemetrySdk.builder()
    .setTracerProvider(SdkTracerProvider.builder()
        .setResource(Resource.getDefault().toBuilder()
            .put("service.name", "{{service_name}}")
            .build())
        .build())
    .buildAndRegisterGlobal();"#;

fn grammar() -> Language {
    tree_sitter_java::LANGUAGE.into()
}

pub(crate) static PROFILE: ProfileDefinition = ProfileDefinition {
    id: "java",
    display_name: "Java",
    aliases: &[],
    extensions: &[".java"],
    grammar,
    existing_imports_query: IMPORT_QUERY,
    entry_point_query: ENTRY_POINT_QUERY,
    insertion_priority_query: Some(INSERTION_QUERY),
    insertion_depth: Some(0),
    preamble_query: Some(PREAMBLE_QUERY),
    import_template: "import {{path}};",
    block_import_template: None,
    init_template: INIT_TEMPLATE,
    cleanup_template: Some("openTelemetry.close();"),
    setup_markers: &[
        "OpenTelemetrySdk",
        "SdkTracerProvider",
        "GlobalOpenTelemetry",
    ],
    instrumentation_namespaces: &["io.opentelemetry"],
    core_imports: &[
        "io.opentelemetry.sdk.OpenTelemetrySdk",
        "io.opentelemetry.sdk.trace.SdkTracerProvider",
        "io.opentelemetry.sdk.resources.Resource",
    ],
    instrumentation_import_template: "io.opentelemetry.instrumentation.{{name}}",
    indent_unit: "    ",
};
