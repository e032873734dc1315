//! Geometry a [`RecordingEngine`](crate::RecordingEngine) produces on import.

use std::path::Path;

use pta_core::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneBody {
    pub name: String,
    pub bbox: BoundingBox,
}

impl SceneBody {
    pub fn new(name: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            name: name.into(),
            bbox,
        }
    }
}

/// Bodies that appear when a layout database or an IDF board is imported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Created by `import_ecad`.
    #[serde(default)]
    pub board_layers: Vec<SceneBody>,
    /// Created by `import_idf`: components, the board outline and mechanical parts.
    #[serde(default)]
    pub idf_bodies: Vec<SceneBody>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, name: impl Into<String>, bbox: BoundingBox) -> Self {
        self.board_layers.push(SceneBody::new(name, bbox));
        self
    }

    pub fn with_body(mut self, name: impl Into<String>, bbox: BoundingBox) -> Self {
        self.idf_bodies.push(SceneBody::new(name, bbox));
        self
    }

    pub fn from_json_file(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}
