//! Per-file syntax analysis.

use std::collections::BTreeSet;
use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor, Tree};
use tracing::debug;

use super::{
    resolve, snippet, EntryPointInfo, FileAnalysis, InsertionPoint, SourcePosition,
    IMPORT_BLOCK_PRIORITY, IMPORT_STATEMENT_PRIORITY,
};
use crate::error::{InjectError, Result};
use crate::languages::LanguageProfile;

/// Parse `source` with the profile's grammar and collect imports, import
/// anchors and entry points.
///
/// Fails with [`InjectError::Parse`] when the bytes are not valid UTF-8 or the
/// tree contains syntax errors; a file is never partially analyzed.
pub fn analyze(path: &Path, source: &[u8], profile: &LanguageProfile) -> Result<FileAnalysis> {
    let text = std::str::from_utf8(source).map_err(|e| parse_error(path, profile, e.to_string()))?;

    let tree = parse(path, source, profile)?;
    let root = tree.root_node();

    let mut analysis = FileAnalysis {
        language: profile.id().to_string(),
        file_path: path.to_path_buf(),
        has_instrumentation_imports: false,
        existing_imports: BTreeSet::new(),
        import_insertion_candidates: Vec::new(),
        entry_points: Vec::new(),
        preamble_end: preamble_end(root, source, profile),
    };

    collect_imports(root, source, profile, &mut analysis);
    collect_entry_points(root, path, text, profile, &mut analysis);

    debug!(
        file = %path.display(),
        imports = analysis.existing_imports.len(),
        anchors = analysis.import_insertion_candidates.len(),
        entry_points = analysis.entry_points.len(),
        instrumented = analysis.has_instrumentation_imports,
        "analyzed file"
    );

    Ok(analysis)
}

fn parse(path: &Path, source: &[u8], profile: &LanguageProfile) -> Result<Tree> {
    let mut parser = profile.parser()?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| parse_error(path, profile, "parser produced no tree".into()))?;

    let root = tree.root_node();
    if root.has_error() {
        let message = match first_error(root) {
            Some(node) => format!(
                "syntax error at line {}, column {}",
                node.start_position().row + 1,
                node.start_position().column + 1
            ),
            None => "syntax error".to_string(),
        };
        return Err(parse_error(path, profile, message));
    }

    Ok(tree)
}

fn parse_error(path: &Path, profile: &LanguageProfile, message: String) -> InjectError {
    InjectError::Parse {
        path: path.to_path_buf(),
        language: profile.id().to_string(),
        message,
    }
}

/// Depth-first search for the first ERROR or MISSING node.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

fn collect_imports(
    root: Node,
    source: &[u8],
    profile: &LanguageProfile,
    analysis: &mut FileAnalysis,
) {
    let query = &profile.queries().existing_imports;
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root, source);

    while let Some(m) = matches.next() {
        for capture in m.captures {
            let name = query.capture_names()[capture.index as usize];
            let node = capture.node;
            match name {
                "import_path" => {
                    let path = normalize_import(node.utf8_text(source).unwrap_or(""));
                    if path.is_empty() {
                        continue;
                    }
                    if profile.is_instrumentation_import(&path) {
                        analysis.has_instrumentation_imports = true;
                    }
                    analysis.existing_imports.insert(path);
                }
                "import_location" => {
                    analysis
                        .import_insertion_candidates
                        .push(anchor_after(node, source, IMPORT_STATEMENT_PRIORITY));
                }
                "import_block_item" => {
                    analysis
                        .import_insertion_candidates
                        .push(anchor_after(node, source, IMPORT_BLOCK_PRIORITY));
                }
                _ => {}
            }
        }
    }
}

fn anchor_after(node: Node, source: &[u8], priority: i32) -> InsertionPoint {
    let end = SourcePosition::end_of(node);
    InsertionPoint {
        line: end.line,
        column: end.column,
        context: snippet(node.utf8_text(source).unwrap_or("")),
        priority,
    }
}

/// Strip quoting and whitespace from a captured import path.
fn normalize_import(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

fn preamble_end(root: Node, source: &[u8], profile: &LanguageProfile) -> Option<usize> {
    let query = profile.queries().preamble.as_ref()?;
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root, source);

    let mut end = None;
    while let Some(m) = matches.next() {
        for capture in m.captures {
            let line = capture.node.end_position().row + 1;
            end = Some(end.map_or(line, |current: usize| current.max(line)));
        }
    }
    end
}

fn collect_entry_points(
    root: Node,
    path: &Path,
    text: &str,
    profile: &LanguageProfile,
    analysis: &mut FileAnalysis,
) {
    let source = text.as_bytes();
    let lines: Vec<&str> = text.split('\n').collect();
    let query = &profile.queries().entry_point;
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root, source);

    while let Some(m) = matches.next() {
        let mut name_node = None;
        let mut body_node = None;
        for capture in m.captures {
            match query.capture_names()[capture.index as usize] {
                "entry_name" => name_node = Some(capture.node),
                "entry_body" => body_node = Some(capture.node),
                _ => {}
            }
        }

        let Some(body) = body_node else {
            continue;
        };

        let name = match name_node {
            Some(node) => node.utf8_text(source).unwrap_or("").to_string(),
            None => path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("<module>")
                .to_string(),
        };

        let declaration = SourcePosition::start_of(body.parent().unwrap_or(body));
        let body_text = body.utf8_text(source).unwrap_or("");
        let has_setup = profile.has_setup_marker(body_text);
        let body_start = resolve(body, source, profile);
        let body_end = SourcePosition::end_of(body);
        let inline_body = is_inline_body(body, source, &body_start, &body_end);

        debug!(
            entry = %name,
            line = declaration.line,
            insert_after = body_start.line,
            has_setup,
            inline_body,
            "found entry point"
        );

        analysis.entry_points.push(EntryPointInfo {
            name,
            line: declaration.line,
            column: declaration.column,
            body_start,
            body_end,
            body_indent: body_indent(body, &lines, profile),
            has_instrumentation_setup: has_setup,
            inline_body,
        });
    }
}

/// A delimited body whose chosen anchor sits on its closing line, or an
/// undelimited body that starts on its header's line. Whole-program bodies
/// are never inline.
fn is_inline_body(
    body: Node,
    source: &[u8],
    anchor: &InsertionPoint,
    end: &SourcePosition,
) -> bool {
    let Some(header) = body.parent() else {
        return false;
    };
    if source.get(body.start_byte()) == Some(&b'{') {
        anchor.line >= end.line
    } else {
        body.start_position().row == header.start_position().row
    }
}

/// Indentation of the body's first statement, or the enclosing line's
/// indentation plus one unit for an empty body.
fn body_indent(body: Node, lines: &[&str], profile: &LanguageProfile) -> String {
    let mut cursor = body.walk();
    let first_statement = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");

    if let Some(child) = first_statement {
        return leading_whitespace(lines.get(child.start_position().row).copied().unwrap_or(""));
    }

    if body.parent().is_none() {
        return String::new();
    }

    let line = lines.get(body.start_position().row).copied().unwrap_or("");
    format!("{}{}", leading_whitespace(line), profile.definition.indent_unit)
}

fn leading_whitespace(line: &str) -> String {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages;

    fn analyze_str(language: &str, file: &str, source: &str) -> Result<FileAnalysis> {
        let profile = languages::builtin().unwrap().get(language).unwrap();
        analyze(Path::new(file), source.as_bytes(), profile)
    }

    #[test]
    fn test_go_block_imports() {
        let source = r#"package main

import (
	"fmt"
	"net/http"
)

func main() {
	fmt.Println("hi")
	http.ListenAndServe(":8080", nil)
}
"#;
        let a = analyze_str("go", "main.go", source).unwrap();
        assert!(a.existing_imports.contains("fmt"));
        assert!(a.existing_imports.contains("net/http"));
        assert!(!a.has_instrumentation_imports);
        assert_eq!(a.preamble_end, Some(1));

        let anchor = a.best_import_anchor();
        assert_eq!(anchor.priority, IMPORT_BLOCK_PRIORITY);
        assert_eq!(anchor.line, 5);

        assert_eq!(a.entry_points.len(), 1);
        let entry = &a.entry_points[0];
        assert_eq!(entry.name, "main");
        assert_eq!(entry.line, 8);
        assert_eq!(entry.body_end.line, 11);
        assert_eq!(entry.body_indent, "\t");
        assert!(!entry.has_instrumentation_setup);
    }

    #[test]
    fn test_go_detects_otel_imports_and_setup() {
        let source = r#"package main

import "go.opentelemetry.io/otel"

func main() {
	tp, _ := SetupOTEL("svc")
	otel.SetTracerProvider(tp)
}
"#;
        let a = analyze_str("go", "main.go", source).unwrap();
        assert!(a.has_instrumentation_imports);
        assert!(a.existing_imports.contains("go.opentelemetry.io/otel"));
        assert_eq!(a.best_import_anchor().priority, IMPORT_STATEMENT_PRIORITY);
        assert!(a.entry_points[0].has_instrumentation_setup);
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = analyze_str("go", "broken.go", "package main\n\nfunc main( {\n").unwrap_err();
        match err {
            InjectError::Parse { path, language, message } => {
                assert_eq!(path, Path::new("broken.go"));
                assert_eq!(language, "go");
                assert!(message.contains("syntax error"), "{message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let profile = languages::builtin().unwrap().get("python").unwrap();
        let err = analyze(Path::new("bad.py"), &[0x66, 0x6f, 0xff, 0xfe], profile).unwrap_err();
        assert!(matches!(err, InjectError::Parse { .. }));
    }

    #[test]
    fn test_python_main_guard() {
        let source = r#""""Service entry point."""
import os
from flask import Flask

app = Flask(__name__)

if __name__ == "__main__":
    port = int(os.environ.get("PORT", "8080"))
    app.run(port=port)
"#;
        let a = analyze_str("python", "app.py", source).unwrap();
        assert!(a.existing_imports.contains("os"));
        assert!(a.existing_imports.contains("flask"));
        assert_eq!(a.preamble_end, Some(1));
        assert_eq!(a.best_import_anchor().line, 3);

        assert_eq!(a.entry_points.len(), 1);
        let entry = &a.entry_points[0];
        assert_eq!(entry.name, "app");
        assert_eq!(entry.body_indent, "    ");
        assert_eq!(entry.body_start.line, 8);
        assert_eq!(entry.body_start.priority, 3);
    }

    #[test]
    fn test_python_without_guard_has_no_entry_point() {
        let a = analyze_str("python", "lib.py", "def helper():\n    return 1\n").unwrap();
        assert!(a.entry_points.is_empty());
        assert!(a.import_insertion_candidates.is_empty());
        assert_eq!(a.best_import_anchor().line, 0);
    }

    #[test]
    fn test_javascript_require_and_import() {
        let source = r#"const express = require("express");
require('dotenv').config;

const app = express();
app.listen(3000);
"#;
        let a = analyze_str("javascript", "index.js", source).unwrap();
        assert!(a.existing_imports.contains("express"));
        assert_eq!(a.entry_points.len(), 1);
        let entry = &a.entry_points[0];
        assert_eq!(entry.name, "index");
        assert_eq!(entry.body_indent, "");
        // After the last top-level declaration.
        assert_eq!(entry.body_start.line, 4);
    }

    #[test]
    fn test_java_main_method() {
        let source = r#"package com.example;

import java.util.List;

public class App {
    public static void main(String[] args) {
        System.out.println("hello");
    }
}
"#;
        let a = analyze_str("java", "App.java", source).unwrap();
        assert!(a.existing_imports.contains("java.util.List"));
        assert_eq!(a.preamble_end, Some(1));
        let entry = &a.entry_points[0];
        assert_eq!(entry.name, "main");
        assert_eq!(entry.body_indent, "        ");
        assert_eq!(entry.body_end.line, 8);
    }

    #[test]
    fn test_csharp_main_method() {
        let source = r#"using System;
using System.Net.Http;

class Program
{
    static void Main(string[] args)
    {
        Console.WriteLine("hello");
    }
}
"#;
        let a = analyze_str("csharp", "Program.cs", source).unwrap();
        assert!(a.existing_imports.contains("System"));
        assert!(a.existing_imports.contains("System.Net.Http"));
        assert_eq!(a.best_import_anchor().line, 2);
        let entry = &a.entry_points[0];
        assert_eq!(entry.name, "Main");
        assert_eq!(entry.body_start.line, 8);
        assert_eq!(entry.body_start.priority, 2);
        assert_eq!(entry.body_indent, "        ");
    }

    #[test]
    fn test_csharp_allman_brace_empty_body() {
        let source = "class Program\n{\n    static void Main()\n    {\n    }\n}\n";
        let a = analyze_str("csharp", "Program.cs", source).unwrap();
        let entry = &a.entry_points[0];
        // The opening brace sits on its own line; new statements go after it.
        assert_eq!(entry.body_start.line, 4);
        assert_eq!(entry.body_indent, "        ");
    }

    #[test]
    fn test_ruby_requires() {
        let source = "require \"sinatra\"\nrequire_relative \"lib/app\"\n\nrun App\n";
        let a = analyze_str("ruby", "config.rb", source).unwrap();
        assert!(a.existing_imports.contains("sinatra"));
        assert!(a.existing_imports.contains("lib/app"));
        assert_eq!(a.best_import_anchor().line, 2);
        assert_eq!(a.entry_points[0].body_start.line, 2);
    }

    #[test]
    fn test_ruby_init_follows_requires_not_assignments() {
        let source = "require \"sinatra\"\n\nPORT = 4567\nset :port, PORT\n";
        let a = analyze_str("ruby", "app.rb", source).unwrap();
        assert_eq!(a.entry_points[0].body_start.line, 1);
    }

    #[test]
    fn test_shebang_is_preamble() {
        let js = analyze_str("javascript", "cli.js", "#!/usr/bin/env node\nconsole.log(1);\n").unwrap();
        assert_eq!(js.preamble_end, Some(1));
        assert_eq!(js.best_import_anchor().line, 1);

        let ts = analyze_str("typescript", "cli.ts", "#!/usr/bin/env node\nconsole.log(1);\n").unwrap();
        assert_eq!(ts.best_import_anchor().line, 1);

        let rb = analyze_str("ruby", "tool.rb", "#!/usr/bin/env ruby\n# helper\nputs 1\n").unwrap();
        assert_eq!(rb.preamble_end, Some(1));

        let plain = analyze_str("ruby", "tool.rb", "# helper\nputs 1\n").unwrap();
        assert_eq!(plain.preamble_end, None);
    }

    #[test]
    fn test_one_line_bodies_are_inline() {
        let go = analyze_str("go", "main.go", "package main\n\nfunc main() { serve() }\n").unwrap();
        assert!(go.entry_points[0].inline_body);

        let py = analyze_str("python", "app.py", "if __name__ == \"__main__\": run()\n").unwrap();
        assert!(py.entry_points[0].inline_body);

        let multi = analyze_str("go", "main.go", "package main\n\nfunc main() {\n\tserve()\n}\n").unwrap();
        assert!(!multi.entry_points[0].inline_body);

        let js = analyze_str("javascript", "index.js", "serve()").unwrap();
        assert!(!js.entry_points[0].inline_body);
    }

    #[test]
    fn test_normalize_import() {
        assert_eq!(normalize_import("\"fmt\""), "fmt");
        assert_eq!(normalize_import("'express'"), "express");
        assert_eq!(normalize_import("`raw/path`"), "raw/path");
        assert_eq!(normalize_import(" os "), "os");
    }
}
