//! Entry-point discovery across a project tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::analysis;
use crate::languages::LanguageProfile;

/// Directories never worth descending into.
const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "__pycache__",
    "venv",
    "dist",
    "build",
    "target",
    "out",
    "bin",
    "obj",
];

/// The best entry point found in one directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryPoint {
    pub path: PathBuf,
    pub language: String,
    pub function_name: String,
    pub line: usize,
    pub column: usize,
    pub confidence: f32,
}

/// Walk `root` and return the best entry point per directory, sorted by path.
///
/// Files that cannot be read or parsed are skipped.
pub fn detect_entry_points(
    root: &Path,
    profile: &LanguageProfile,
    excluded: Option<&GlobSet>,
) -> anyhow::Result<Vec<EntryPoint>> {
    let mut best: BTreeMap<PathBuf, EntryPoint> = BTreeMap::new();

    for file in source_files(root, profile, excluded)? {
        let source = match fs::read(&file) {
            Ok(source) => source,
            Err(e) => {
                debug!(file = %file.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        let analysis = match analysis::analyze(&file, &source, profile) {
            Ok(analysis) => analysis,
            Err(e) => {
                debug!(file = %file.display(), error = %e, "skipping unparsable file");
                continue;
            }
        };

        let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        for entry in analysis.entry_points {
            let candidate = EntryPoint {
                path: file.clone(),
                language: profile.id().to_string(),
                confidence: confidence(&entry.name),
                function_name: entry.name,
                line: entry.line,
                column: entry.column,
            };
            match best.get(&dir) {
                Some(current) if current.confidence >= candidate.confidence => {}
                _ => {
                    best.insert(dir.clone(), candidate);
                }
            }
        }
    }

    let mut entries: Vec<EntryPoint> = best.into_values().collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Files under `root` carrying one of the profile's extensions, sorted.
///
/// Unreadable subdirectories are logged and skipped.
pub fn source_files(
    root: &Path,
    profile: &LanguageProfile,
    excluded: Option<&GlobSet>,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
    {
        // Only a missing or unreadable root aborts the walk.
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                warn!(error = %e, "skipping unreadable path");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !profile.matches_path(path) {
            continue;
        }
        if let Some(globs) = excluded {
            let relative = path.strip_prefix(root).unwrap_or(path);
            if globs.is_match(relative) || globs.is_match(path) {
                continue;
            }
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

fn confidence(name: &str) -> f32 {
    if name.to_ascii_lowercase().contains("main") {
        1.0
    } else {
        0.8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages;
    use globset::{Glob, GlobSetBuilder};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_best_entry_point_per_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "api/index.js", "const app = 1;\n");
        write(root, "api/main.js", "const app = 2;\n");
        write(root, "worker/job.js", "run();\n");
        write(root, "node_modules/lib/main.js", "x();\n");
        write(root, ".cache/main.js", "x();\n");

        let js = languages::builtin().unwrap().get("javascript").unwrap();
        let entries = detect_entry_points(root, js, None).unwrap();

        let found: Vec<(String, f32)> = entries
            .iter()
            .map(|e| {
                let rel = e.path.strip_prefix(root).unwrap();
                (rel.to_string_lossy().replace('\\', "/"), e.confidence)
            })
            .collect();
        assert_eq!(
            found,
            vec![("api/main.js".to_string(), 1.0), ("worker/job.js".to_string(), 0.8)]
        );
    }

    #[test]
    fn test_go_main_detection_skips_broken_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "cmd/server/main.go", "package main\n\nfunc main() {\n}\n");
        write(root, "cmd/broken/main.go", "package main\nfunc main( {\n");
        write(root, "pkg/lib.go", "package pkg\n\nfunc Helper() {}\n");

        let go = languages::builtin().unwrap().get("go").unwrap();
        let entries = detect_entry_points(root, go, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].function_name, "main");
        assert_eq!(entries[0].line, 3);
        assert!(entries[0].path.ends_with("cmd/server/main.go"));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let go = languages::builtin().unwrap().get("go").unwrap();
        assert!(source_files(&dir.path().join("absent"), go, None).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "cmd/api/main.go", "package main\n\nfunc main() {\n}\n");
        write(root, "locked/main.go", "package main\n\nfunc main() {\n}\n");
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let go = languages::builtin().unwrap().get("go").unwrap();
        let result = detect_entry_points(root, go, None);
        let readable_anyway = fs::read_dir(&locked).is_ok();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let entries = result.unwrap();
        // Privileged users can still list the directory.
        let expected = if readable_anyway { 2 } else { 1 };
        assert_eq!(entries.len(), expected);
        assert!(entries[0].path.ends_with("cmd/api/main.go"));
    }

    #[test]
    fn test_excluded_globs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "app/main.py", "if __name__ == \"__main__\":\n    pass\n");
        write(root, "generated/main.py", "if __name__ == \"__main__\":\n    pass\n");

        let mut builder = GlobSetBuilder::new();
        builder.add(Glob::new("generated/**").unwrap());
        let globs = builder.build().unwrap();

        let python = languages::builtin().unwrap().get("python").unwrap();
        let files = source_files(root, python, Some(&globs)).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("app/main.py"));
    }
}
