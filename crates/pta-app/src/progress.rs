use std::fmt;
use std::time::Instant;

/// Named steps of a simulation run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    CheckingPreconditions,
    CleaningUp,
    ImportingGeometry,
    PreparingModel,
    AssigningBoundaries,
    ConfiguringConvection,
    ConfiguringMesh,
    Solving,
    SavingRun,
    Completed,
}

impl RunStage {
    pub fn label(self) -> &'static str {
        match self {
            RunStage::CheckingPreconditions => "preconditions",
            RunStage::CleaningUp => "cleanup",
            RunStage::ImportingGeometry => "import",
            RunStage::PreparingModel => "prepare",
            RunStage::AssigningBoundaries => "boundaries",
            RunStage::ConfiguringConvection => "convection",
            RunStage::ConfiguringMesh => "mesh",
            RunStage::Solving => "solve",
            RunStage::SavingRun => "save_run",
            RunStage::Completed => "completed",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}

pub(crate) fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
        });
    }
}
