//! pta-engine: the solver seam.
//!
//! Provides:
//! - `ThermalEngine`, the operations the orchestrator drives a solver with
//! - Boundary, mesh, setup and report descriptions passed through it
//! - `RecordingEngine`, an in-memory session that journals every call
//!
//! # Architecture
//!
//! The orchestrator never talks to a solver process directly. A production
//! backend implements [`ThermalEngine`] over its scripting interface; tests
//! and dry runs use [`RecordingEngine`] with a [`Scene`] describing the bodies
//! an import would create.
//!
//! # Example
//!
//! ```
//! use pta_core::BoundingBox;
//! use pta_engine::{LaunchOptions, RecordingEngine, Scene, ThermalEngine};
//!
//! let scene = Scene::new().with_body(
//!     "U1",
//!     BoundingBox::from_origin_size([0.0, 0.0, 1.6], [5.0, 5.0, 1.0]),
//! );
//! let mut engine = RecordingEngine::new(scene);
//! engine
//!     .launch(&LaunchOptions { release: "2023.1".into(), graphical: false })
//!     .unwrap();
//! engine.import_idf(std::path::Path::new("board.emn")).unwrap();
//! assert!(engine.model_objects().unwrap().contains(&"U1".to_string()));
//! ```

pub mod engine;
pub mod error;
pub mod recording;
pub mod scene;
pub mod types;

pub use engine::ThermalEngine;
pub use error::{EngineError, EngineResult};
pub use recording::{EngineCall, RecordingEngine};
pub use scene::{Scene, SceneBody};
pub use types::*;
