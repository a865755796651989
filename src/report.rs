//! Output formatting for injection results.
//!
//! Two formats:
//! - Pretty: coloured terminal output for humans
//! - JSON: structured output for tooling

use colored::*;
use serde::{Deserialize, Serialize};

use crate::analysis::FileAnalysis;
use crate::codegen::CodeModification;
use crate::discover::EntryPoint;
use crate::injector::{FileReport, FileStatus};
use crate::languages::ProfileRegistry;

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub dry_run: bool,
    pub files: Vec<JsonFile>,
    pub summary: JsonSummary,
}

#[derive(Serialize, Deserialize)]
pub struct JsonFile {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// One of "applied", "dry_run", "skipped", "failed".
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifications: Vec<JsonModification>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonModification {
    pub kind: String,
    pub line: usize,
    pub placement: String,
    pub content: String,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonSummary {
    pub applied: usize,
    pub dry_run: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl JsonSummary {
    pub fn of(reports: &[FileReport]) -> Self {
        let mut summary = Self::default();
        for r in reports {
            match r.status {
                FileStatus::Applied { .. } => summary.applied += 1,
                FileStatus::DryRun { .. } => summary.dry_run += 1,
                FileStatus::Skipped(_) => summary.skipped += 1,
                FileStatus::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Build the JSON report for a batch.
pub fn json_report(path: &str, dry_run: bool, reports: &[FileReport]) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        dry_run,
        files: reports.iter().map(file_to_json).collect(),
        summary: JsonSummary::of(reports),
    }
}

/// Write batch results in JSON format.
pub fn write_json(path: &str, dry_run: bool, reports: &[FileReport]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&json_report(path, dry_run, reports))?;
    println!("{}", json);
    Ok(())
}

fn file_to_json(r: &FileReport) -> JsonFile {
    let (status, reason, backup) = match &r.status {
        FileStatus::Applied { backup } => ("applied", None, Some(backup.display().to_string())),
        FileStatus::DryRun { .. } => ("dry_run", None, None),
        FileStatus::Skipped(reason) => ("skipped", Some(reason.to_string()), None),
        FileStatus::Failed(message) => ("failed", Some(message.clone()), None),
    };
    JsonFile {
        path: r.path.display().to_string(),
        language: r.language.clone(),
        status: status.to_string(),
        reason,
        backup,
        modifications: r.modifications.iter().map(modification_to_json).collect(),
    }
}

fn modification_to_json(m: &CodeModification) -> JsonModification {
    JsonModification {
        kind: m.kind.as_str().to_string(),
        line: m.line,
        placement: if m.insert_after() { "after" } else { "before" }.to_string(),
        content: m.content.clone(),
    }
}

/// Print a file analysis as JSON.
pub fn write_analysis(analysis: &FileAnalysis) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(analysis)?);
    Ok(())
}

/// Print discovered entry points as JSON.
pub fn write_entry_points_json(entries: &[EntryPoint]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(entries)?);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write batch results in pretty (human-readable) format.
pub fn write_pretty(path: &str, dry_run: bool, reports: &[FileReport]) {
    write_header(path);
    if dry_run {
        println!("  {}", "Dry run: no files will be written".yellow());
        println!();
    }

    for r in reports {
        write_file(r);
    }
    if !reports.is_empty() {
        println!();
    }

    let summary = JsonSummary::of(reports);
    print!("  {} ", "Summary:".bold());
    if dry_run {
        print!("{} would change", summary.dry_run.to_string().green());
    } else {
        print!("{} modified", summary.applied.to_string().green());
    }
    print!(", {} skipped", summary.skipped.to_string().dimmed());
    if summary.failed > 0 {
        print!(", {} failed", summary.failed.to_string().red());
    }
    println!();
    println!();
}

fn write_header(path: &str) {
    println!();
    print!("  ");
    print!("{}", "lawrence".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", "Target: ".dimmed());
    println!("{}", path);
    println!();
}

fn write_file(r: &FileReport) {
    match &r.status {
        FileStatus::Applied { backup } => {
            print!("    {} ", "DONE ".green());
            print!("{}", r.path.display().to_string().blue());
            println!("  {}", format!("(backup: {})", backup.display()).dimmed());
            write_modifications(&r.modifications);
        }
        FileStatus::DryRun { preview } => {
            print!("    {} ", "PLAN ".yellow());
            println!("{}", r.path.display().to_string().blue());
            for line in preview.lines().skip(1) {
                println!("          {}", line);
            }
        }
        FileStatus::Skipped(reason) => {
            print!("    {} ", "SKIP ".dimmed());
            print!("{}", r.path.display().to_string().blue());
            println!("  {}", reason.to_string().dimmed());
        }
        FileStatus::Failed(message) => {
            print!("    {} ", "ERROR".red());
            println!("{}", r.path.display().to_string().blue());
            println!("            {}", message);
        }
    }
}

fn write_modifications(modifications: &[CodeModification]) {
    for m in modifications {
        let first = m.content.lines().next().unwrap_or("").trim();
        println!(
            "          {:<12}{}  {}",
            m.kind.as_str().dimmed(),
            format!("line {}", m.line).dimmed(),
            first
        );
    }
}

/// Write discovered entry points as a table.
pub fn write_entry_points_pretty(root: &str, entries: &[EntryPoint]) {
    write_header(root);
    if entries.is_empty() {
        println!("  {}", "No entry points found".dimmed());
        println!();
        return;
    }

    println!("  {} ({}):", "Entry points".bold(), entries.len());
    println!();
    for e in entries {
        print!("    {:<12}", e.language.dimmed());
        print!("{}", e.path.display().to_string().blue());
        print!("{}", format!(":{}", e.line).dimmed());
        println!("  {} ({:.1})", e.function_name, e.confidence);
    }
    println!();
}

/// List registered language profiles.
pub fn write_languages(registry: &ProfileRegistry) {
    println!("Supported languages:");
    println!();
    for profile in registry.profiles() {
        let def = profile.definition;
        let aliases = if def.aliases.is_empty() {
            String::new()
        } else {
            format!("(aliases: {})", def.aliases.join(", "))
        };
        println!(
            "  {:<12} {:<16} {}",
            def.id,
            def.extensions.join(" "),
            aliases.dimmed()
        );
    }
}
