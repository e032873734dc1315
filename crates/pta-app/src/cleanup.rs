//! Best-effort removal of stale solver artifacts.
//!
//! Nothing here fails: problems are logged and skipped.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Artifacts a previous run of `project_file` (e.g. `Board_01.aedt`) leaves
/// in `workdir`: the project, its lock, and the results and scripting folders.
pub fn stale_artifacts(workdir: &Path, project_file: &str) -> Vec<PathBuf> {
    let stem = Path::new(project_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(project_file);
    vec![
        workdir.join(project_file),
        workdir.join(format!("{project_file}.lock")),
        workdir.join(format!("{stem}.aedtresults")),
        workdir.join(format!("{stem}.pyaedt")),
    ]
}

/// Remove the artifacts of an earlier run; returns what was removed.
pub fn remove_stale_project(workdir: &Path, project_file: &str) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    for path in stale_artifacts(workdir, project_file) {
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else if path.exists() {
            fs::remove_file(&path)
        } else {
            continue;
        };
        match result {
            Ok(()) => {
                debug!(path = %path.display(), "removed stale artifact");
                removed.push(path);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "could not remove stale artifact"),
        }
    }
    removed
}

/// Delete every `*.lock` file directly inside `workdir`.
pub fn sweep_lock_files(workdir: &Path) -> usize {
    let entries = match fs::read_dir(workdir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %workdir.display(), error = %e, "cannot list working directory");
            return 0;
        }
    };
    let mut count = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "lock") {
            match fs::remove_file(&path) {
                Ok(()) => count += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "could not remove lock file"),
            }
        }
    }
    count
}
