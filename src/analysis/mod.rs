//! Syntax analysis of a single source file.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │ Source bytes │────▶│ Analyzer     │────▶│ FileAnalysis     │
//! └──────────────┘     │ (tree-sitter)│     │ imports, anchors,│
//!                      └──────┬───────┘     │ entry points     │
//!                             │             └──────────────────┘
//!                             ▼
//!                      ┌──────────────┐
//!                      │ Resolver     │ best insertion point per body
//!                      └──────────────┘
//! ```
//!
//! Positions are 1-indexed. A modification anchored "after line N" lands
//! between line N and line N+1, so line 0 means the top of the file.

mod analyzer;
mod resolver;

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

pub use analyzer::analyze;
pub use resolver::{resolve, PriorityClass};

/// Priority of an anchor inside a grouped import block.
pub const IMPORT_BLOCK_PRIORITY: i32 = 3;
/// Priority of an anchor after a stand-alone import statement.
pub const IMPORT_STATEMENT_PRIORITY: i32 = 2;
/// Priority of the synthesized top-of-file anchor.
pub const SYNTHESIZED_IMPORT_PRIORITY: i32 = 0;

/// A line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub fn start_of(node: tree_sitter::Node) -> Self {
        let p = node.start_position();
        Self {
            line: p.row + 1,
            column: p.column + 1,
        }
    }

    pub fn end_of(node: tree_sitter::Node) -> Self {
        let p = node.end_position();
        Self {
            line: p.row + 1,
            column: p.column + 1,
        }
    }
}

/// A location where generated code may be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertionPoint {
    pub line: usize,
    pub column: usize,
    /// Diagnostic snippet of the anchoring code.
    pub context: String,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryPointInfo {
    pub name: String,
    /// Start of the enclosing declaration.
    pub line: usize,
    pub column: usize,
    pub body_start: InsertionPoint,
    pub body_end: SourcePosition,
    /// Leading whitespace for statements placed inside the body.
    pub body_indent: String,
    pub has_instrumentation_setup: bool,
    /// The body shares a line with its header or its closing delimiter at
    /// the insertion point, so there is no line to place new statements on.
    pub inline_body: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub language: String,
    pub file_path: PathBuf,
    pub has_instrumentation_imports: bool,
    pub existing_imports: BTreeSet<String>,
    pub import_insertion_candidates: Vec<InsertionPoint>,
    pub entry_points: Vec<EntryPointInfo>,
    /// Last line of the package/module declaration, if any.
    pub preamble_end: Option<usize>,
}

impl FileAnalysis {
    /// The single anchor new imports are placed after.
    ///
    /// Highest priority wins; on equal priority the later candidate wins so
    /// new imports follow the last existing one. Without candidates the
    /// anchor is synthesized after the preamble, or at the top of the file.
    pub fn best_import_anchor(&self) -> InsertionPoint {
        let mut best: Option<&InsertionPoint> = None;
        for candidate in &self.import_insertion_candidates {
            match best {
                Some(current) if candidate.priority < current.priority => {}
                _ => best = Some(candidate),
            }
        }

        match best {
            Some(point) => point.clone(),
            None => InsertionPoint {
                line: self.preamble_end.unwrap_or(0),
                column: 1,
                context: String::from("<top of file>"),
                priority: SYNTHESIZED_IMPORT_PRIORITY,
            },
        }
    }
}

/// First line of `text`, trimmed and shortened for diagnostics.
pub(crate) fn snippet(text: &str) -> String {
    const MAX_CHARS: usize = 60;
    let line = text.lines().next().unwrap_or("").trim();
    if line.chars().count() <= MAX_CHARS {
        line.to_string()
    } else {
        let cut: String = line.chars().take(MAX_CHARS).collect();
        format!("{cut}...")
    }
}
