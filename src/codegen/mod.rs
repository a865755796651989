//! Modification planning and application.
//!
//! The planner compares a [`FileAnalysis`](crate::analysis::FileAnalysis)
//! with the [`DesiredOperations`] and emits only what is missing; the applier
//! splices the resulting plan into the file text bottom-up.

mod applier;
mod operations;
mod planner;
mod template;

use std::path::PathBuf;

use serde::Serialize;

pub use applier::{apply, backup_path, preview, render, ApplyOutcome};
pub use operations::{DependencyNaming, DesiredOperations, ProfileNaming};
pub use planner::Planner;
pub use template::{render_template, TemplateValues};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationKind {
    AddImport,
    AddInit,
    AddCleanup,
}

impl ModificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModificationKind::AddImport => "add_import",
            ModificationKind::AddInit => "add_init",
            ModificationKind::AddCleanup => "add_cleanup",
        }
    }
}

/// Whether content goes after or before the anchor line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    After,
    Before,
}

/// A single text insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeModification {
    pub kind: ModificationKind,
    pub language: String,
    pub file_path: PathBuf,
    pub line: usize,
    pub column: usize,
    pub placement: Placement,
    pub content: String,
}

impl CodeModification {
    pub fn insert_after(&self) -> bool {
        self.placement == Placement::After
    }

    pub fn insert_before(&self) -> bool {
        self.placement == Placement::Before
    }
}

/// Ordered modifications for one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModificationPlan {
    pub file_path: PathBuf,
    pub modifications: Vec<CodeModification>,
}

impl ModificationPlan {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            modifications: Vec::new(),
        }
    }

    pub fn push(&mut self, modification: CodeModification) {
        self.modifications.push(modification);
    }

    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modifications.len()
    }

    pub fn count(&self, kind: ModificationKind) -> usize {
        self.modifications.iter().filter(|m| m.kind == kind).count()
    }
}
