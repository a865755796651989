//! Minimal modification planning.

use tracing::{debug, warn};

use super::template::{render_template, TemplateValues};
use super::{
    CodeModification, DependencyNaming, DesiredOperations, ModificationKind, ModificationPlan,
    Placement,
};
use crate::analysis::{FileAnalysis, IMPORT_BLOCK_PRIORITY};
use crate::languages::LanguageProfile;

/// Turns a file analysis into the smallest plan that satisfies the desired
/// operations. Anything already present produces nothing, so planning a file
/// that was already processed yields an empty plan.
pub struct Planner<'a> {
    naming: &'a dyn DependencyNaming,
    service_name: String,
}

impl<'a> Planner<'a> {
    pub fn new(naming: &'a dyn DependencyNaming, service_name: impl Into<String>) -> Self {
        Self {
            naming,
            service_name: service_name.into(),
        }
    }

    pub fn plan(
        &self,
        analysis: &FileAnalysis,
        profile: &LanguageProfile,
        ops: &DesiredOperations,
    ) -> ModificationPlan {
        let mut plan = ModificationPlan::new(&analysis.file_path);
        if !ops.install_core {
            return plan;
        }

        // Imports with nowhere to initialize would go unused.
        let entries = &analysis.entry_points;
        if !entries.is_empty() && entries.iter().all(|e| e.inline_body) {
            warn!(
                file = %analysis.file_path.display(),
                "every entry point body fits on one line, leaving file unchanged"
            );
            return plan;
        }

        if !analysis.has_instrumentation_imports {
            self.plan_imports(analysis, profile, ops, &mut plan);
        }
        self.plan_init(analysis, profile, ops, &mut plan);

        debug!(
            file = %analysis.file_path.display(),
            imports = plan.count(ModificationKind::AddImport),
            inits = plan.count(ModificationKind::AddInit),
            cleanups = plan.count(ModificationKind::AddCleanup),
            "planned modifications"
        );
        plan
    }

    /// Core imports followed by one import per instrumentation, de-duplicated.
    pub fn required_imports(&self, profile: &LanguageProfile, ops: &DesiredOperations) -> Vec<String> {
        let mut required: Vec<String> = Vec::new();
        let instrumentation = ops
            .instrumentations
            .iter()
            .filter_map(|id| self.naming.instrumentation_import(profile, id));

        for import in self.naming.core_imports(profile).into_iter().chain(instrumentation) {
            if !required.contains(&import) {
                required.push(import);
            }
        }
        required
    }

    fn plan_imports(
        &self,
        analysis: &FileAnalysis,
        profile: &LanguageProfile,
        ops: &DesiredOperations,
        plan: &mut ModificationPlan,
    ) {
        let anchor = analysis.best_import_anchor();
        let template = match profile.definition.block_import_template {
            Some(block) if anchor.priority == IMPORT_BLOCK_PRIORITY => block,
            _ => profile.definition.import_template,
        };

        for import in self.required_imports(profile, ops) {
            if analysis.existing_imports.contains(&import) {
                continue;
            }
            let mut values = TemplateValues::new();
            values.set("path", &import);
            plan.push(CodeModification {
                kind: ModificationKind::AddImport,
                language: profile.id().to_string(),
                file_path: analysis.file_path.clone(),
                line: anchor.line,
                column: anchor.column,
                placement: Placement::After,
                content: render_template(template, &values),
            });
        }
    }

    fn plan_init(
        &self,
        analysis: &FileAnalysis,
        profile: &LanguageProfile,
        ops: &DesiredOperations,
        plan: &mut ModificationPlan,
    ) {
        let values = TemplateValues::for_init(&self.service_name, ops);
        let init = render_template(profile.definition.init_template, &values);
        let cleanup = profile
            .definition
            .cleanup_template
            .map(|t| render_template(t, &values));

        for entry in &analysis.entry_points {
            if entry.has_instrumentation_setup {
                continue;
            }
            if entry.inline_body {
                warn!(
                    file = %analysis.file_path.display(),
                    entry = %entry.name,
                    line = entry.line,
                    "entry point body fits on one line, not adding initialization"
                );
                continue;
            }

            plan.push(CodeModification {
                kind: ModificationKind::AddInit,
                language: profile.id().to_string(),
                file_path: analysis.file_path.clone(),
                line: entry.body_start.line,
                column: entry.body_start.column,
                placement: Placement::After,
                content: indent(&init, &entry.body_indent),
            });

            // A body closing on its opening line has no separate line to
            // place cleanup before.
            if let Some(cleanup) = &cleanup {
                if entry.body_end.line > entry.body_start.line {
                    plan.push(CodeModification {
                        kind: ModificationKind::AddCleanup,
                        language: profile.id().to_string(),
                        file_path: analysis.file_path.clone(),
                        line: entry.body_end.line,
                        column: entry.body_end.column,
                        placement: Placement::Before,
                        content: indent(cleanup, &entry.body_indent),
                    });
                }
            }
        }
    }
}

/// Prefix every non-empty line of `text` with `prefix`.
fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
