//! Insertion point resolution inside an entry-point body.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor};
use tracing::trace;

use super::{snippet, InsertionPoint};
use crate::languages::LanguageProfile;

/// Fixed priority classes of the insertion-priority query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityClass {
    /// Right after a local variable declaration.
    AfterVariables,
    /// Right after a top-level import/require statement.
    AfterImports,
    /// Next to a statement-level function call.
    BeforeFunctionCalls,
    /// Start of the body.
    FunctionStart,
}

impl PriorityClass {
    pub fn from_capture(name: &str) -> Option<Self> {
        match name {
            "after_variables" => Some(PriorityClass::AfterVariables),
            "after_imports" => Some(PriorityClass::AfterImports),
            "before_function_calls" => Some(PriorityClass::BeforeFunctionCalls),
            "function_start" => Some(PriorityClass::FunctionStart),
            _ => None,
        }
    }

    pub fn priority(self) -> i32 {
        match self {
            PriorityClass::AfterVariables => 3,
            PriorityClass::AfterImports | PriorityClass::BeforeFunctionCalls => 2,
            PriorityClass::FunctionStart => 1,
        }
    }

    /// Candidate point for a captured node.
    pub fn point(self, node: Node, source: &[u8]) -> InsertionPoint {
        match self {
            PriorityClass::FunctionStart => start_of_body(node, source),
            _ => {
                let end = node.end_position();
                InsertionPoint {
                    line: end.row + 1,
                    column: end.column + 1,
                    context: snippet(node.utf8_text(source).unwrap_or("")),
                    priority: self.priority(),
                }
            }
        }
    }
}

/// Pick the single best insertion point inside `body`.
///
/// Higher priority wins. Among equal priorities the capture seen last wins,
/// which lets profiles prefer the final qualifying statement.
pub fn resolve(body: Node, source: &[u8], profile: &LanguageProfile) -> InsertionPoint {
    let mut best = start_of_body(body, source);

    let Some(query) = profile.queries().insertion_priority.as_ref() else {
        return best;
    };

    let mut cursor = QueryCursor::new();
    cursor.set_max_start_depth(profile.definition.insertion_depth);
    let mut matches = cursor.matches(query, body, source);

    while let Some(m) = matches.next() {
        for capture in m.captures {
            let name = query.capture_names()[capture.index as usize];
            let Some(class) = PriorityClass::from_capture(name) else {
                continue;
            };
            let candidate = class.point(capture.node, source);
            if candidate.priority >= best.priority {
                trace!(
                    capture = name,
                    line = candidate.line,
                    priority = candidate.priority,
                    "insertion candidate"
                );
                best = candidate;
            }
        }
    }

    best
}

/// Anchor for statements placed at the very start of `body`.
///
/// A delimited body (`{ ... }`) anchors on the line holding the delimiter. A
/// body that begins directly with its first statement anchors on the line
/// before it, so new statements precede that statement.
fn start_of_body(body: Node, source: &[u8]) -> InsertionPoint {
    if let Some(shebang) = leading_shebang(body, source) {
        return InsertionPoint {
            line: shebang.end_position().row + 1,
            column: 1,
            context: snippet(shebang.utf8_text(source).unwrap_or("")),
            priority: PriorityClass::FunctionStart.priority(),
        };
    }

    let start = body.start_position();
    let opens_with_delimiter = source.get(body.start_byte()) == Some(&b'{');
    let line = if opens_with_delimiter {
        start.row + 1
    } else {
        start.row
    };

    InsertionPoint {
        line,
        column: start.column + 1,
        context: snippet(body.utf8_text(source).unwrap_or("")),
        priority: PriorityClass::FunctionStart.priority(),
    }
}

/// A `#!` line opening a whole-program body.
fn leading_shebang<'t>(body: Node<'t>, source: &[u8]) -> Option<Node<'t>> {
    if body.parent().is_some() || !source.starts_with(b"#!") {
        return None;
    }
    body.child(0).filter(|first| first.start_byte() == 0)
}
