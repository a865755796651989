//! Per-file pipeline and the parallel batch driver.
//!
//! Each file runs read, analyze, plan and apply sequentially on one worker.
//! Files share nothing but the read-only profile registry, so a batch fans
//! out over a bounded rayon pool after duplicate paths have been removed.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::analysis;
use crate::codegen::{
    self, ApplyOutcome, CodeModification, DependencyNaming, DesiredOperations, Planner,
};
use crate::error::{InjectError, Result};
use crate::languages::{LanguageProfile, ProfileRegistry};

/// Why a file was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedLanguage(String),
    ParseFailure(String),
    EmptyPlan,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnsupportedLanguage(id) => write!(f, "unsupported language: {id}"),
            SkipReason::ParseFailure(msg) => write!(f, "parse failure: {msg}"),
            SkipReason::EmptyPlan => f.write_str("nothing to change"),
        }
    }
}

/// Terminal state of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Applied { backup: PathBuf },
    DryRun { preview: String },
    Skipped(SkipReason),
    Failed(String),
}

/// What happened to one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub language: Option<String>,
    pub status: FileStatus,
    pub modifications: Vec<CodeModification>,
}

impl FileReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, FileStatus::Failed(_))
    }

    /// Whether the file was (or in a dry run would be) modified.
    pub fn touched(&self) -> bool {
        matches!(
            self.status,
            FileStatus::Applied { .. } | FileStatus::DryRun { .. }
        )
    }
}

/// One unit of batch work: a file and, optionally, its language id.
/// Without a language id the profile is chosen by file extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InjectJob {
    pub path: PathBuf,
    pub language: Option<String>,
}

impl InjectJob {
    pub fn new(path: impl Into<PathBuf>, language: Option<&str>) -> Self {
        Self {
            path: path.into(),
            language: language.map(str::to_string),
        }
    }
}

/// Drives the injection pipeline over files.
pub struct CodeInjector<'r> {
    registry: &'r ProfileRegistry,
    naming: Box<dyn DependencyNaming>,
    service_name: String,
    progress: Option<ProgressBar>,
}

impl<'r> CodeInjector<'r> {
    pub fn new(
        registry: &'r ProfileRegistry,
        naming: Box<dyn DependencyNaming>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            naming,
            service_name: service_name.into(),
            progress: None,
        }
    }

    /// Tick `progress` once per finished file in batches.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Inject into a single file and return the paths touched (or, in a dry
    /// run, that would be touched). The dry-run preview is printed to stdout.
    ///
    /// An unsupported language or a parse failure is returned as an error the
    /// caller should treat as "skip"; an empty plan touches nothing.
    pub fn inject_file(
        &self,
        path: &Path,
        language_id: &str,
        ops: &DesiredOperations,
        dry_run: bool,
    ) -> Result<Vec<PathBuf>> {
        let profile = self.registry.get(language_id)?;
        let (_, outcome) = self.run_pipeline(path, profile, ops, dry_run)?;

        Ok(match outcome {
            Some(ApplyOutcome::Written { path, .. }) => vec![path],
            Some(ApplyOutcome::Preview(preview)) => {
                print!("{preview}");
                vec![path.to_path_buf()]
            }
            None => Vec::new(),
        })
    }

    /// Run the pipeline for one file and capture the outcome in a report.
    pub fn process_file(
        &self,
        path: &Path,
        language_id: Option<&str>,
        ops: &DesiredOperations,
        dry_run: bool,
    ) -> FileReport {
        let mut report = FileReport {
            path: path.to_path_buf(),
            language: None,
            status: FileStatus::Skipped(SkipReason::EmptyPlan),
            modifications: Vec::new(),
        };

        let profile = match self.resolve_profile(path, language_id) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping file");
                report.status = FileStatus::Skipped(skip_reason(&e));
                return report;
            }
        };
        report.language = Some(profile.id().to_string());

        match self.run_pipeline(path, profile, ops, dry_run) {
            Ok((modifications, outcome)) => {
                report.modifications = modifications;
                report.status = match outcome {
                    Some(ApplyOutcome::Written { backup, .. }) => FileStatus::Applied { backup },
                    Some(ApplyOutcome::Preview(preview)) => FileStatus::DryRun { preview },
                    None => FileStatus::Skipped(SkipReason::EmptyPlan),
                };
            }
            Err(e) if e.is_skip() => {
                warn!(file = %path.display(), error = %e, "skipping file");
                report.status = FileStatus::Skipped(skip_reason(&e));
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to process file");
                report.status = FileStatus::Failed(e.to_string());
            }
        }
        report
    }

    /// Process every job on a pool of `workers` threads.
    ///
    /// Duplicate paths are dropped before dispatch so no two workers ever own
    /// the same file. Reports come back sorted by path.
    pub fn inject_batch(
        &self,
        jobs: Vec<InjectJob>,
        ops: &DesiredOperations,
        dry_run: bool,
        workers: Option<usize>,
    ) -> anyhow::Result<Vec<FileReport>> {
        let mut seen = HashSet::new();
        let jobs: Vec<InjectJob> = jobs
            .into_iter()
            .filter(|job| seen.insert(job.path.clone()))
            .collect();

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = workers {
            builder = builder.num_threads(workers);
        }
        let pool = builder.build()?;

        let mut reports: Vec<FileReport> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let report = self.process_file(&job.path, job.language.as_deref(), ops, dry_run);
                    if let Some(progress) = &self.progress {
                        progress.inc(1);
                    }
                    report
                })
                .collect()
        });

        reports.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(reports)
    }

    fn resolve_profile(&self, path: &Path, language_id: Option<&str>) -> Result<&'r LanguageProfile> {
        match language_id {
            Some(id) => self.registry.get(id),
            None => self.registry.for_path(path).ok_or_else(|| {
                let ext = path
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_else(|| String::from("<no extension>"));
                InjectError::UnsupportedLanguage(ext)
            }),
        }
    }

    /// Read, analyze, plan and apply. `None` outcome means an empty plan.
    fn run_pipeline(
        &self,
        path: &Path,
        profile: &LanguageProfile,
        ops: &DesiredOperations,
        dry_run: bool,
    ) -> Result<(Vec<CodeModification>, Option<ApplyOutcome>)> {
        let bytes = fs::read(path).map_err(|e| InjectError::io("failed to read", path, e))?;
        let analysis = analysis::analyze(path, &bytes, profile)?;

        let planner = Planner::new(self.naming.as_ref(), self.service_name.as_str());
        let plan = planner.plan(&analysis, profile, ops);
        if plan.is_empty() {
            info!(file = %path.display(), "already instrumented, nothing to change");
            return Ok((Vec::new(), None));
        }

        // analyze() has already rejected non UTF-8 input.
        let text = String::from_utf8_lossy(&bytes);
        let outcome = codegen::apply(path, &text, &plan, dry_run)?;
        Ok((plan.modifications, Some(outcome)))
    }
}

fn skip_reason(err: &InjectError) -> SkipReason {
    match err {
        InjectError::UnsupportedLanguage(id) => SkipReason::UnsupportedLanguage(id.clone()),
        other => SkipReason::ParseFailure(other.to_string()),
    }
}
