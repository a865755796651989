//! Lawrence - OpenTelemetry setup injection for existing codebases.
//!
//! Lawrence parses source files with tree-sitter, locates imports and
//! program entry points, and splices in the imports, initialization and
//! cleanup code needed to bootstrap OpenTelemetry. Re-running it on an
//! instrumented file is a no-op.
//!
//! # Architecture
//!
//! Each file flows through a strictly sequential pipeline:
//!
//! - `languages`: per-language profiles (grammar, queries, templates) and the registry
//! - `analysis`: tree-sitter analysis and insertion-point resolution
//! - `codegen`: modification planning and bottom-up application with backups
//! - `injector`: per-file driver and the parallel batch driver
//! - `discover`: project walk for entry-point files
//! - `config`, `logging`, `report`, `cli`: the binary's ambient layers
//!
//! # Adding a New Language
//!
//! See `src/languages/` for examples. Write a static `ProfileDefinition`
//! and list it in `BUILTIN_PROFILES`.

pub mod analysis;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod discover;
pub mod error;
pub mod injector;
pub mod languages;
pub mod logging;
pub mod report;

pub use analysis::{analyze, EntryPointInfo, FileAnalysis, InsertionPoint, SourcePosition};
pub use codegen::{
    CodeModification, DependencyNaming, DesiredOperations, ModificationKind, ModificationPlan,
    Planner, ProfileNaming,
};
pub use config::Config;
pub use discover::{detect_entry_points, EntryPoint};
pub use error::{InjectError, Result};
pub use injector::{CodeInjector, FileReport, FileStatus, InjectJob, SkipReason};
pub use languages::{LanguageProfile, ProfileRegistry};
