//! Per-user session context.

use std::path::{Path, PathBuf};

use pta_bc::BcTable;
use pta_engine::ThermalEngine;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cleanup::sweep_lock_files;
use crate::error::AppResult;

/// Input files picked for a run.
#[derive(Debug, Clone, Default)]
pub struct SessionFiles {
    pub board: Option<PathBuf>,
    /// Defaults to the library paired with the board file.
    pub library: Option<PathBuf>,
    pub table: Option<PathBuf>,
    pub materials: Option<PathBuf>,
    /// Layout database the board stack-up is imported from.
    pub ecad: Option<PathBuf>,
}

/// One interactive session over a working directory.
///
/// The solver handle itself is passed to each operation; the session keeps
/// the process id of the solver it last started.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    workdir: PathBuf,
    pub files: SessionFiles,
    pub(crate) process_id: Option<u32>,
    pub(crate) last_table: Option<BcTable>,
}

impl Session {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            workdir: workdir.into(),
            files: SessionFiles::default(),
            process_id: None,
            last_table: None,
        };
        info!(session = %session.id, workdir = %session.workdir.display(), "session started");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Process id of the solver started by the last run, while it is alive.
    pub fn process_id(&self) -> Option<u32> {
        self.process_id
    }

    /// The table most recently built or consumed in this session.
    pub fn last_table(&self) -> Option<&BcTable> {
        self.last_table.as_ref()
    }

    pub fn set_last_table(&mut self, table: BcTable) {
        self.last_table = Some(table);
    }

    /// Shut the solver down if it is still running and sweep lock files from
    /// the working directory.
    ///
    /// The sweep runs even when shutdown fails; the shutdown error is returned
    /// afterwards.
    pub fn end(&mut self, engine: &mut dyn ThermalEngine) -> AppResult<usize> {
        let shutdown = match engine.process_id() {
            Some(_) => engine.shutdown(),
            None => Ok(()),
        };
        self.process_id = None;
        let swept = sweep_lock_files(&self.workdir);
        if let Err(e) = &shutdown {
            warn!(session = %self.id, swept, error = %e, "solver did not shut down cleanly");
        } else {
            info!(session = %self.id, swept, "session ended");
        }
        shutdown?;
        Ok(swept)
    }

    /// End the session after `work`, whether it succeeded or not.
    ///
    /// An error from `work` takes precedence over one from ending the session.
    pub fn end_after<T>(
        &mut self,
        engine: &mut dyn ThermalEngine,
        work: AppResult<T>,
    ) -> AppResult<(T, usize)> {
        let ended = self.end(engine);
        let value = work?;
        Ok((value, ended?))
    }
}
