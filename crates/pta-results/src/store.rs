//! Run storage API.

use crate::types::{ResultKind, ResultTable, RunManifest};
use crate::{ResultsError, ResultsResult};
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST: &str = "manifest.json";

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store under `<workdir>/.pta/runs`.
    pub fn for_workdir(workdir: &Path) -> ResultsResult<Self> {
        Self::new(workdir.join(".pta").join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST).exists()
    }

    /// Write the manifest, replacing an earlier run with the same id.
    pub fn save_manifest(&self, manifest: &RunManifest) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;
        let json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join(MANIFEST), json)?;
        tracing::debug!(run_id = %manifest.run_id, "saved run manifest");
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join(MANIFEST);

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Attach an extracted table to an existing run.
    pub fn save_table(&self, run_id: &str, table: &ResultTable) -> ResultsResult<()> {
        if !self.has_run(run_id) {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let path = self.run_dir(run_id).join(table.kind.file_name());
        fs::write(path, serde_json::to_string_pretty(table)?)?;
        Ok(())
    }

    pub fn load_table(&self, run_id: &str, kind: ResultKind) -> ResultsResult<ResultTable> {
        let path = self.run_dir(run_id).join(kind.file_name());
        if !path.exists() {
            return Err(ResultsError::TableNotFound {
                run_id: run_id.to_string(),
                kind,
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Kinds stored for a run, in [`ResultKind::ALL`] order.
    pub fn tables(&self, run_id: &str) -> Vec<ResultKind> {
        let dir = self.run_dir(run_id);
        ResultKind::ALL
            .into_iter()
            .filter(|k| dir.join(k.file_name()).exists())
            .collect()
    }

    /// Every readable manifest, newest first. Unreadable run directories are
    /// skipped.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                match self.load_manifest(&run_id) {
                    Ok(manifest) => runs.push(manifest),
                    Err(e) => tracing::warn!(run_id, error = %e, "skipping run directory"),
                }
            }
        }

        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
