//! Which face of a component lies against the board.

use pta_core::BoxFace;
use pta_engine::{IDF_BOARD_OUTLINE, ThermalEngine};
use pta_idf::Side;
use pta_project::BoardSideMethod;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// Bodies standing in for the board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardBodies {
    /// Sorted; the first is the top layer and the last the bottom layer.
    pub layers: Vec<String>,
    /// Whether the layers came from a layout database import.
    pub from_ecad: bool,
}

impl BoardBodies {
    /// Imported board layers, or the IDF board outline when there are none.
    pub fn discover(engine: &mut dyn ThermalEngine) -> AppResult<Self> {
        let layers = engine.board_layers()?;
        if !layers.is_empty() {
            return Ok(Self {
                layers,
                from_ecad: true,
            });
        }
        let has_outline = engine
            .solid_bodies()?
            .iter()
            .any(|s| s.name == IDF_BOARD_OUTLINE);
        if !has_outline {
            return Err(AppError::NoBoard);
        }
        Ok(Self {
            layers: vec![IDF_BOARD_OUTLINE.to_string()],
            from_ecad: false,
        })
    }

    pub fn top(&self) -> &str {
        &self.layers[0]
    }

    pub fn bottom(&self) -> &str {
        &self.layers[self.layers.len() - 1]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l == name)
    }
}

/// Finds the board-facing face of a component body.
pub trait BoardSideLocator {
    fn find_board_side(
        &self,
        engine: &mut dyn ThermalEngine,
        object: &str,
        placement: Side,
    ) -> AppResult<BoxFace>;
}

/// Underside for TOP parts, upper side for BOTTOM parts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementLocator;

pub fn placement_face(placement: Side) -> BoxFace {
    match placement {
        Side::Top => BoxFace::bottom_z(),
        Side::Bottom => BoxFace::top_z(),
    }
}

impl BoardSideLocator for PlacementLocator {
    fn find_board_side(
        &self,
        _engine: &mut dyn ThermalEngine,
        _object: &str,
        placement: Side,
    ) -> AppResult<BoxFace> {
        Ok(placement_face(placement))
    }
}

/// The face touching the top board layer, else the bottom layer.
///
/// Components touching neither fall back to the placement face.
#[derive(Debug, Clone)]
pub struct TouchingFaceLocator {
    top: String,
    bottom: String,
}

impl TouchingFaceLocator {
    pub fn new(board: &BoardBodies) -> Self {
        Self {
            top: board.top().to_string(),
            bottom: board.bottom().to_string(),
        }
    }
}

impl BoardSideLocator for TouchingFaceLocator {
    fn find_board_side(
        &self,
        engine: &mut dyn ThermalEngine,
        object: &str,
        placement: Side,
    ) -> AppResult<BoxFace> {
        if let Some(face) = engine.touching_face(object, &self.top)? {
            return Ok(face);
        }
        if let Some(face) = engine.touching_face(object, &self.bottom)? {
            return Ok(face);
        }
        let face = placement_face(placement);
        warn!(object, %face, "component does not touch the board; using its placement side");
        Ok(face)
    }
}

pub fn locator_for(method: BoardSideMethod, board: &BoardBodies) -> Box<dyn BoardSideLocator> {
    match method {
        BoardSideMethod::Placement => Box::new(PlacementLocator),
        BoardSideMethod::TouchingFace => Box::new(TouchingFaceLocator::new(board)),
    }
}
