//! Splicing a plan into file text.
//!
//! Modifications are applied from the bottom of the file upwards. Inserting
//! lines shifts everything below the insertion point, so applying the highest
//! anchor first keeps the line numbers of every pending modification valid.
//! The new content is built completely in memory before any write happens.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{CodeModification, ModificationPlan, Placement};
use crate::error::{InjectError, Result};

/// Result of applying a plan to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// File rewritten after its original bytes were saved to `backup`.
    Written { path: PathBuf, backup: PathBuf },
    /// Dry run: nothing was touched.
    Preview(String),
}

/// `<path>.backup` beside the original file.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".backup");
    PathBuf::from(name)
}

/// Apply `plan` to `original` and either write the result or describe it.
///
/// Without `dry_run` the original bytes are written to `<path>.backup` first;
/// the target is only overwritten once the backup is complete.
pub fn apply(
    path: &Path,
    original: &str,
    plan: &ModificationPlan,
    dry_run: bool,
) -> Result<ApplyOutcome> {
    let modified = render(original, plan);

    if dry_run {
        return Ok(ApplyOutcome::Preview(preview(path, plan)));
    }

    let backup = backup_path(path);
    fs::write(&backup, original).map_err(|e| InjectError::io("failed to write backup", &backup, e))?;
    fs::write(path, modified).map_err(|e| InjectError::io("failed to write", path, e))?;

    info!(
        file = %path.display(),
        modifications = plan.len(),
        backup = %backup.display(),
        "applied modifications"
    );

    Ok(ApplyOutcome::Written {
        path: path.to_path_buf(),
        backup,
    })
}

/// The text that results from applying `plan`, highest line first.
///
/// Modifications sharing a line are applied in reverse plan order so that
/// several insertions after one anchor appear in plan order.
pub fn render(original: &str, plan: &ModificationPlan) -> String {
    let mut order: Vec<usize> = (0..plan.modifications.len()).collect();
    order.sort_by(|&a, &b| {
        let (ma, mb) = (&plan.modifications[a], &plan.modifications[b]);
        mb.line.cmp(&ma.line).then(b.cmp(&a))
    });

    let ordered = order.into_iter().map(|i| &plan.modifications[i]);
    let (lines, ending) = split_lines(original);
    join_lines(splice(lines, ordered), ending)
}

/// Human-readable description of a plan for dry runs.
pub fn preview(path: &Path, plan: &ModificationPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Would modify file: {}", path.display());
    for m in &plan.modifications {
        let content = m.content.trim().replace('\n', "\n    ");
        let _ = writeln!(out, "  Line {}: {}", m.line, content);
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct LineEnding {
    crlf: bool,
    trailing_newline: bool,
}

fn split_lines(text: &str) -> (Vec<String>, LineEnding) {
    let ending = LineEnding {
        crlf: text.contains("\r\n"),
        trailing_newline: text.ends_with('\n'),
    };
    if text.is_empty() {
        return (Vec::new(), ending);
    }

    let body = text.strip_suffix('\n').unwrap_or(text);
    let lines = body
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
        .collect();
    (lines, ending)
}

fn join_lines(lines: Vec<String>, ending: LineEnding) -> String {
    let eol = if ending.crlf { "\r\n" } else { "\n" };
    let mut text = lines.join(eol);
    if ending.trailing_newline && !lines.is_empty() {
        text.push_str(eol);
    }
    text
}

/// Insert each modification, in the order given, into `lines`.
///
/// Anchors beyond the current line count are skipped.
fn splice<'a>(
    mut lines: Vec<String>,
    modifications: impl Iterator<Item = &'a CodeModification>,
) -> Vec<String> {
    for m in modifications {
        let index = match m.placement {
            Placement::After => m.line,
            Placement::Before => match m.line.checked_sub(1) {
                Some(index) => index,
                None => {
                    debug!(kind = m.kind.as_str(), "skipping insert before line 0");
                    continue;
                }
            },
        };

        if m.line > lines.len() || index > lines.len() {
            debug!(
                kind = m.kind.as_str(),
                line = m.line,
                lines = lines.len(),
                "skipping modification beyond end of file"
            );
            continue;
        }

        let content: Vec<String> = m.content.split('\n').map(str::to_string).collect();
        lines.splice(index..index, content);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::ModificationKind;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn insert(line: usize, placement: Placement, content: &str) -> CodeModification {
        CodeModification {
            kind: ModificationKind::AddInit,
            language: "go".into(),
            file_path: PathBuf::from("main.go"),
            line,
            column: 1,
            placement,
            content: content.into(),
        }
    }

    fn plan_of(modifications: Vec<CodeModification>) -> ModificationPlan {
        ModificationPlan {
            file_path: PathBuf::from("main.go"),
            modifications,
        }
    }

    const ORIGINAL: &str = "one\ntwo\nthree\nfour\n";

    #[test]
    fn test_descending_order_keeps_anchors_valid() {
        let plan = plan_of(vec![
            insert(1, Placement::After, "after-one"),
            insert(3, Placement::After, "after-three"),
            insert(4, Placement::Before, "before-four"),
        ]);
        assert_eq!(
            render(ORIGINAL, &plan),
            "one\nafter-one\ntwo\nthree\nafter-three\nbefore-four\nfour\n"
        );
    }

    #[test]
    fn test_ascending_order_corrupts_content() {
        let plan = plan_of(vec![
            insert(1, Placement::After, "after-one"),
            insert(3, Placement::After, "after-three"),
        ]);
        let descending = render(ORIGINAL, &plan);

        let (lines, ending) = split_lines(ORIGINAL);
        let ascending = join_lines(splice(lines, plan.modifications.iter()), ending);

        assert_ne!(ascending, descending);
        // The second insertion lands one line early: after "two", not "three".
        assert_eq!(ascending, "one\nafter-one\ntwo\nafter-three\nthree\nfour\n");
    }

    #[test]
    fn test_same_line_insertions_keep_plan_order() {
        let plan = plan_of(vec![
            insert(2, Placement::After, "first"),
            insert(2, Placement::After, "second"),
            insert(2, Placement::After, "third"),
        ]);
        assert_eq!(
            render(ORIGINAL, &plan),
            "one\ntwo\nfirst\nsecond\nthird\nthree\nfour\n"
        );
    }

    #[test]
    fn test_multiline_content_and_top_of_file() {
        let plan = plan_of(vec![insert(0, Placement::After, "a\nb")]);
        assert_eq!(render("x\n", &plan), "a\nb\nx\n");
    }

    #[test]
    fn test_stale_anchor_is_skipped() {
        let plan = plan_of(vec![
            insert(10, Placement::After, "nowhere"),
            insert(0, Placement::Before, "nowhere"),
            insert(2, Placement::After, "kept"),
        ]);
        assert_eq!(render(ORIGINAL, &plan), "one\ntwo\nkept\nthree\nfour\n");
    }

    #[test]
    fn test_preserves_missing_trailing_newline_and_crlf() {
        let plan = plan_of(vec![insert(1, Placement::After, "new")]);
        assert_eq!(render("a\nb", &plan), "a\nnew\nb");
        assert_eq!(render("a\r\nb\r\n", &plan), "a\r\nnew\r\nb\r\n");
    }

    #[test]
    fn test_apply_writes_backup_first() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, ORIGINAL).unwrap();

        let plan = plan_of(vec![insert(1, Placement::After, "inserted")]);
        let outcome = apply(&path, ORIGINAL, &plan, false).unwrap();

        let backup = backup_path(&path);
        assert_eq!(
            outcome,
            ApplyOutcome::Written {
                path: path.clone(),
                backup: backup.clone()
            }
        );
        assert_eq!(fs::read(&backup).unwrap(), ORIGINAL.as_bytes());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "one\ninserted\ntwo\nthree\nfour\n"
        );
        assert_eq!(backup.file_name().unwrap(), "main.go.backup");
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, ORIGINAL).unwrap();

        let plan = plan_of(vec![insert(2, Placement::After, "  x := 1  ")]);
        let outcome = apply(&path, ORIGINAL, &plan, true).unwrap();

        let expected = format!("Would modify file: {}\n  Line 2: x := 1\n", path.display());
        assert_eq!(outcome, ApplyOutcome::Preview(expected));
        assert_eq!(fs::read_to_string(&path).unwrap(), ORIGINAL);
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_backup_failure_leaves_target_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, ORIGINAL).unwrap();
        // A directory where the backup file should go makes the write fail.
        fs::create_dir(backup_path(&path)).unwrap();

        let plan = plan_of(vec![insert(1, Placement::After, "x")]);
        let err = apply(&path, ORIGINAL, &plan, false).unwrap_err();
        assert!(matches!(err, InjectError::FileIo { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), ORIGINAL);
    }
}
