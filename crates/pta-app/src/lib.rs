//! Shared service layer for the PCB thermal analyzer.
//!
//! This crate ties the parsers, the boundary-condition table, the settings
//! and the solver seam together: table generation and editing, the staged
//! simulation run, and result extraction from a solved project.

pub mod board_side;
pub mod cleanup;
pub mod error;
pub mod extract;
pub mod mapping;
pub mod mesh;
pub mod pipeline;
pub mod progress;
pub mod scene;
pub mod session;
pub mod table_service;

// Re-export key types for convenience
pub use board_side::{BoardBodies, BoardSideLocator, PlacementLocator, TouchingFaceLocator};
pub use error::{AppError, AppResult, Precondition};
pub use extract::{Extractor, clean_header, reshape_report};
pub use mapping::{BoundaryAssignment, block_name, map_row, point_name};
pub use mesh::{Histogram, MeshSizing, mesh_sizing};
pub use pipeline::{
    Convection, PipelineState, RunOutcome, StageInput, check_preconditions, run_simulation,
    run_simulation_with_progress,
};
pub use progress::{RunProgressEvent, RunStage};
pub use scene::scene_from_idf;
pub use session::{Session, SessionFiles};
pub use table_service::{generate_table, load_materials, load_table, set_cell};
