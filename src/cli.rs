//! Command-line interface for lawrence.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::analysis;
use crate::codegen::DesiredOperations;
use crate::config::Config;
use crate::discover;
use crate::injector::{CodeInjector, InjectJob};
use crate::languages::{self, LanguageProfile, ProfileRegistry};
use crate::logging;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Inject OpenTelemetry setup code into application entry points.
///
/// Lawrence parses source files with tree-sitter, finds each program's entry
/// point and import block, and inserts the missing imports, initialization
/// and cleanup code. Files that are already instrumented are left alone, and
/// every modified file keeps a `.backup` copy of its original contents.
#[derive(Parser)]
#[command(name = "lawrence")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration YAML file (default: auto-discover)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter directive, e.g. "debug" or "lawrence=trace"
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Insert instrumentation into a file, or into each directory's entry-point file
    Inject(InjectArgs),
    /// Print what the analyzer sees in one file
    Analyze(AnalyzeArgs),
    /// List the best entry-point file per directory
    #[command(visible_alias = "entry-points")]
    Entrypoints(EntrypointsArgs),
    /// List supported languages
    Languages,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

/// Arguments for the inject command.
#[derive(Args)]
pub struct InjectArgs {
    /// File or directory to instrument
    pub path: PathBuf,

    /// Language id (default: by file extension)
    #[arg(short, long)]
    pub language: Option<String>,

    /// YAML or JSON file describing the desired operations
    #[arg(short, long)]
    pub operations: Option<PathBuf>,

    /// Install the core OpenTelemetry setup
    #[arg(long)]
    pub install_otel: bool,

    /// Instrumentation to install (repeatable)
    #[arg(short, long = "instrumentation")]
    pub instrumentations: Vec<String>,

    /// Component to install as kind=name (repeatable)
    #[arg(long = "component", value_parser = parse_component)]
    pub components: Vec<(String, String)>,

    /// Service name rendered into the init code
    #[arg(short, long)]
    pub service_name: Option<String>,

    /// Show the planned edits without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Worker threads for directories (default: config, else one per CPU)
    #[arg(short, long)]
    pub workers: Option<usize>,
}

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Source file to analyze
    pub file: PathBuf,

    /// Language id (default: by file extension)
    #[arg(short, long)]
    pub language: Option<String>,
}

/// Arguments for the entrypoints command.
#[derive(Args)]
pub struct EntrypointsArgs {
    /// Project directory to walk
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Only look at one language (default: all)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,
}

fn parse_component(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((kind, name)) if !kind.trim().is_empty() && !name.trim().is_empty() => {
            Ok((kind.trim().to_string(), name.trim().to_string()))
        }
        _ => Err(format!("expected kind=name, got {:?}", raw)),
    }
}

/// Load configuration and install logging. Shared by every command.
pub fn setup(cli: &Cli) -> anyhow::Result<Config> {
    let config = Config::load(cli.config.as_deref())?;
    logging::init(config.log_filter(), cli.log_level.as_deref(), config.log_format)?;
    Ok(config)
}

/// Merge the operations file with the command-line flags.
pub fn desired_operations(args: &InjectArgs) -> anyhow::Result<DesiredOperations> {
    let mut ops = match &args.operations {
        Some(path) => DesiredOperations::parse_file(path)
            .map_err(|e| anyhow::anyhow!("invalid operations file {}: {}", path.display(), e))?,
        None => DesiredOperations::default(),
    };

    ops.install_core |= args.install_otel;
    for id in &args.instrumentations {
        if !ops.instrumentations.contains(id) {
            ops.instrumentations.push(id.clone());
        }
    }
    for (kind, name) in &args.components {
        let names = ops.components.entry(kind.clone()).or_default();
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    // Asking for instrumentations or components implies the core setup.
    if !ops.instrumentations.is_empty() || !ops.components.is_empty() {
        ops.install_core = true;
    }
    Ok(ops)
}

/// One injection job per directory: the best entry-point file under `root`
/// for each profile. Library files next to it are left alone.
pub fn collect_jobs(
    root: &Path,
    profiles: &[&LanguageProfile],
    config: &Config,
) -> anyhow::Result<Vec<InjectJob>> {
    let excluded = config.excluded_globs()?;
    let mut jobs = Vec::new();
    for profile in profiles {
        for entry in discover::detect_entry_points(root, profile, excluded.as_ref())? {
            jobs.push(InjectJob::new(entry.path, Some(profile.id())));
        }
    }
    Ok(jobs)
}

/// Profiles selected by `--language`, or all of them.
fn selected_profiles<'r>(
    registry: &'r ProfileRegistry,
    language: Option<&str>,
) -> anyhow::Result<Vec<&'r LanguageProfile>> {
    match language {
        Some(id) => Ok(vec![registry.get(id)?]),
        None => Ok(registry.profiles().collect()),
    }
}

fn progress_bar(len: usize) -> Option<ProgressBar> {
    if len < 2 || !std::io::stderr().is_terminal() {
        return None;
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} {msg}") {
        bar.set_style(style);
    }
    Some(bar)
}

/// Run the inject command.
pub fn run_inject(args: &InjectArgs, config: &Config) -> anyhow::Result<i32> {
    let ops = desired_operations(args)?;
    if !ops.install_core {
        eprintln!("Error: nothing to install");
        eprintln!("Pass --install-otel, --instrumentation, --component or --operations");
        return Ok(EXIT_ERROR);
    }

    let registry = languages::builtin()?;

    let metadata = match std::fs::metadata(&args.path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let jobs = if metadata.is_dir() {
        let profiles = match selected_profiles(registry, args.language.as_deref()) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Run 'lawrence languages' to see supported languages");
                return Ok(EXIT_ERROR);
            }
        };
        collect_jobs(&args.path, &profiles, config)?
    } else {
        vec![InjectJob::new(&args.path, args.language.as_deref())]
    };

    if jobs.is_empty() {
        eprintln!("Warning: no entry points found");
        return Ok(EXIT_SUCCESS);
    }

    let service_name = match &args.service_name {
        Some(name) => name.clone(),
        None => config.service_name_for(&args.path),
    };

    let mut injector = CodeInjector::new(registry, Box::new(config.naming()), service_name);
    let progress = match args.format {
        OutputFormat::Pretty => progress_bar(jobs.len()),
        OutputFormat::Json => None,
    };
    if let Some(bar) = &progress {
        injector = injector.with_progress(bar.clone());
    }

    let workers = args.workers.or(config.workers);
    let reports = injector.inject_batch(jobs, &ops, args.dry_run, workers)?;
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    let path_str = args.path.to_string_lossy().to_string();
    match args.format {
        OutputFormat::Json => report::write_json(&path_str, args.dry_run, &reports)?,
        OutputFormat::Pretty => report::write_pretty(&path_str, args.dry_run, &reports),
    }

    if reports.iter().any(|r| r.is_failure()) {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let registry = languages::builtin()?;
    let profile = match &args.language {
        Some(id) => registry.get(id)?,
        None => match registry.for_path(&args.file) {
            Some(p) => p,
            None => {
                eprintln!("Error: no language registered for {}", args.file.display());
                eprintln!("Pass --language or run 'lawrence languages'");
                return Ok(EXIT_ERROR);
            }
        },
    };

    let source = std::fs::read(&args.file)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", args.file.display(), e))?;
    match analysis::analyze(&args.file, &source, profile) {
        Ok(result) => {
            report::write_analysis(&result)?;
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(EXIT_FAILED)
        }
    }
}

/// Run the entrypoints command.
pub fn run_entrypoints(args: &EntrypointsArgs, config: &Config) -> anyhow::Result<i32> {
    let registry = languages::builtin()?;
    let profiles = selected_profiles(registry, args.language.as_deref())?;
    let excluded = config.excluded_globs()?;

    let mut entries = Vec::new();
    for profile in profiles {
        entries.extend(discover::detect_entry_points(&args.path, profile, excluded.as_ref())?);
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    match args.format {
        OutputFormat::Json => report::write_entry_points_json(&entries)?,
        OutputFormat::Pretty => {
            report::write_entry_points_pretty(&args.path.to_string_lossy(), &entries)
        }
    }
    Ok(EXIT_SUCCESS)
}

/// Run the languages command.
pub fn run_languages() -> anyhow::Result<i32> {
    report::write_languages(languages::builtin()?);
    Ok(EXIT_SUCCESS)
}
