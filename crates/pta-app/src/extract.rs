//! Result tables and images from a solved project.
//!
//! Every table goes through the same steps: define the field expressions it
//! needs, export a one-row data report to `<ReportName>.csv` in the working
//! directory, then rewrite that file as a two-column `(name, value)` table.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use pta_bc::delimited::{split_record, strip_bom};
use pta_engine::{
    BoundaryKind, FieldExpression, FieldOp, FieldPlotRequest, FieldQuantity, FieldRegion,
    LaunchOptions, REGION, ReportCategory, ReportRequest, ThermalEngine,
};
use pta_results::{ResultKind, ResultTable};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::board_side::BoardBodies;
use crate::error::{AppError, AppResult};

pub const PCB_LAYERS_IMAGE: &str = "Temperature_on_PCB_layers.png";
pub const ALL_OBJECTS_IMAGE: &str = "Temperature_on_all_objects.png";

/// Suffix of the board-side heat flow expression of a component.
pub const HEAT_FLUX_SUFFIX: &str = "_board_side_heat_flux";

static UNIT_DECORATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[[^\]]*\]").expect("unit pattern is valid"));

/// Bare object or point name from an exported column header.
pub fn clean_header(kind: ResultKind, header: &str) -> String {
    let stripped = UNIT_DECORATION.replace_all(header.trim(), "");
    let mut name = stripped.trim().trim_matches('"');
    for suffix in [".Internal.Temperature", ".Temperature", HEAT_FLUX_SUFFIX] {
        if let Some(rest) = name.strip_suffix(suffix) {
            name = rest;
            break;
        }
    }
    if kind == ResultKind::MonitorPoints {
        name = name.strip_prefix("point_").unwrap_or(name);
    }
    name.to_string()
}

/// Turn an exported one-row report into a `(name, value)` table.
///
/// The first column is the sweep variable and is dropped.
pub fn reshape_report(kind: ResultKind, csv: &str) -> AppResult<ResultTable> {
    let invalid = |message: String| AppError::InvalidReport {
        name: kind.report_name().to_string(),
        message,
    };
    let mut lines = strip_bom(csv).lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| invalid("empty report".to_string()))?;
    let header = split_record(header).map_err(invalid)?;
    let rows: Vec<&str> = lines.collect();
    let [row] = rows.as_slice() else {
        return Err(invalid(format!("expected one data row, found {}", rows.len())));
    };
    let cells = split_record(row).map_err(invalid)?;
    if cells.len() != header.len() {
        return Err(invalid(format!(
            "{} headers but {} values",
            header.len(),
            cells.len()
        )));
    }

    let mut table = ResultTable::new(kind);
    for (name, cell) in header.iter().zip(&cells).skip(1) {
        let value: f64 = cell
            .trim()
            .parse()
            .map_err(|_| invalid(format!("`{cell}` under `{name}` is not a number")))?;
        table.rows.push((clean_header(kind, name), value));
    }
    Ok(table)
}

/// Pulls results out of a solved project.
pub struct Extractor<'e> {
    engine: &'e mut dyn ThermalEngine,
    workdir: PathBuf,
    solution: String,
}

impl<'e> Extractor<'e> {
    /// Attach to the solution in the engine's current session.
    pub fn new(engine: &'e mut dyn ThermalEngine, workdir: impl Into<PathBuf>) -> AppResult<Self> {
        let solution = engine.solution_name()?;
        debug!(solution = %solution, "extracting results");
        Ok(Self {
            engine,
            workdir: workdir.into(),
            solution,
        })
    }

    /// Open a saved project and attach to its solution.
    pub fn open_project(
        engine: &'e mut dyn ThermalEngine,
        project: &Path,
        options: &LaunchOptions,
    ) -> AppResult<Self> {
        engine.open_project(project, options)?;
        let workdir = project
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::new(engine, workdir)
    }

    pub fn solution(&self) -> &str {
        &self.solution
    }

    pub fn report_path(&self, kind: ResultKind) -> PathBuf {
        self.workdir.join(format!("{}.csv", kind.report_name()))
    }

    pub fn extract(&mut self, kind: ResultKind) -> AppResult<ResultTable> {
        match kind {
            ResultKind::MonitorPoints => self.monitor_point_temperatures(),
            ResultKind::NetworkJunctions => self.network_junction_temperatures(),
            ResultKind::ObjectMaxTemperatures => self.object_max_temperatures(),
            ResultKind::BoardSideHeatFlow => self.board_side_heat_flow(),
        }
    }

    pub fn monitor_point_temperatures(&mut self) -> AppResult<ResultTable> {
        let quantities = self
            .engine
            .monitor_names()?
            .into_iter()
            .map(|p| format!("{p}.Temperature"))
            .collect();
        self.report(ResultKind::MonitorPoints, ReportCategory::Monitor, quantities)
    }

    pub fn network_junction_temperatures(&mut self) -> AppResult<ResultTable> {
        let quantities: Vec<String> = self
            .engine
            .boundaries()?
            .into_iter()
            .filter(|b| b.kind == BoundaryKind::Network)
            .map(|b| format!("{}.Internal.Temperature", b.name))
            .collect();
        if quantities.is_empty() {
            return Err(AppError::NoNetworkBlocks);
        }
        self.report(ResultKind::NetworkJunctions, ReportCategory::Monitor, quantities)
    }

    /// Maximum temperature over the volume of solid blocks and imported board
    /// layers, and over the surface of hollow blocks.
    pub fn object_max_temperatures(&mut self) -> AppResult<ResultTable> {
        let mut regions = Vec::new();
        for boundary in self.engine.boundaries()? {
            for object in boundary.objects {
                match boundary.kind {
                    BoundaryKind::SolidBlock => regions.push(FieldRegion::Volume { object }),
                    BoundaryKind::HollowBlock => regions.push(FieldRegion::Surface { object }),
                    BoundaryKind::Network | BoundaryKind::Opening => {}
                }
            }
        }
        for layer in self.engine.board_layers()? {
            regions.push(FieldRegion::Volume { object: layer });
        }

        let mut quantities = Vec::with_capacity(regions.len());
        for region in regions {
            let name = match &region {
                FieldRegion::Volume { object }
                | FieldRegion::Surface { object }
                | FieldRegion::Face { object, .. } => object.clone(),
            };
            self.engine.define_field_expression(&FieldExpression {
                name: name.clone(),
                quantity: FieldQuantity::Temperature,
                region,
                op: FieldOp::Maximum,
            })?;
            quantities.push(name);
        }
        self.report(
            ResultKind::ObjectMaxTemperatures,
            ReportCategory::Fields,
            quantities,
        )
    }

    /// Heat flow through the face of each component that lies against the
    /// board.
    pub fn board_side_heat_flow(&mut self) -> AppResult<ResultTable> {
        let board = BoardBodies::discover(&mut *self.engine)?;
        let components: Vec<String> = self
            .engine
            .model_objects()?
            .into_iter()
            .filter(|n| n != REGION && !board.contains(n))
            .collect();

        let mut quantities = Vec::with_capacity(components.len());
        for object in components {
            let face = match self.engine.touching_face(&object, board.top())? {
                Some(face) => Some(face),
                None => self.engine.touching_face(&object, board.bottom())?,
            };
            let Some(face) = face else {
                warn!(object = %object, "not touching the board; no heat flow reported");
                continue;
            };
            let name = format!("{object}{HEAT_FLUX_SUFFIX}");
            self.engine.define_field_expression(&FieldExpression {
                name: name.clone(),
                quantity: FieldQuantity::HeatFlux,
                region: FieldRegion::Face { object, face },
                op: FieldOp::Integrate,
            })?;
            quantities.push(name);
        }
        self.report(ResultKind::BoardSideHeatFlow, ReportCategory::Fields, quantities)
    }

    fn report(
        &mut self,
        kind: ResultKind,
        category: ReportCategory,
        quantities: Vec<String>,
    ) -> AppResult<ResultTable> {
        if quantities.is_empty() {
            warn!(report = kind.report_name(), "nothing to report");
            return Ok(ResultTable::new(kind));
        }
        let path = self.report_path(kind);
        let request = ReportRequest {
            name: kind.report_name().to_string(),
            category,
            solution: self.solution.clone(),
            quantities,
        };
        self.engine.export_report(&request, &path)?;
        let exported = fs::read_to_string(&path).map_err(|e| AppError::io(&path, e))?;
        let table = reshape_report(kind, &exported)?;
        fs::write(&path, table.to_csv()).map_err(|e| AppError::io(&path, e))?;
        info!(report = kind.report_name(), rows = table.rows.len(), "report exported");
        Ok(table)
    }

    /// Temperature contours on the board layers.
    pub fn pcb_layers_image(&mut self) -> AppResult<PathBuf> {
        let board = BoardBodies::discover(&mut *self.engine)?;
        self.image(PCB_LAYERS_IMAGE, board.layers)
    }

    /// Temperature contours on every model object.
    pub fn all_objects_image(&mut self) -> AppResult<PathBuf> {
        let objects = self
            .engine
            .model_objects()?
            .into_iter()
            .filter(|n| n != REGION)
            .collect();
        self.image(ALL_OBJECTS_IMAGE, objects)
    }

    fn image(&mut self, file_name: &str, objects: Vec<String>) -> AppResult<PathBuf> {
        let path = self.workdir.join(file_name);
        if path.is_file() {
            debug!(path = %path.display(), "reusing exported image");
            return Ok(path);
        }
        let name = file_name.trim_end_matches(".png").to_string();
        self.engine.export_field_plot(
            &FieldPlotRequest {
                name,
                objects,
                quantity: FieldQuantity::Temperature,
                solution: self.solution.clone(),
            },
            &path,
        )?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_lose_units_and_decoration() {
        assert_eq!(
            clean_header(ResultKind::MonitorPoints, "point_U1.Temperature [cel]"),
            "U1"
        );
        assert_eq!(
            clean_header(ResultKind::NetworkJunctions, "U7.Internal.Temperature [cel]"),
            "U7"
        );
        assert_eq!(
            clean_header(ResultKind::BoardSideHeatFlow, "R1_board_side_heat_flux [W]"),
            "R1"
        );
        // only monitor points carry the prefix
        assert_eq!(
            clean_header(ResultKind::ObjectMaxTemperatures, "point_light [cel]"),
            "point_light"
        );
        // names ending in the letters of a suffix keep them
        assert_eq!(clean_header(ResultKind::ObjectMaxTemperatures, "Tempe [cel]"), "Tempe");
    }

    #[test]
    fn reshape_drops_sweep_column_and_transposes() {
        let csv = "X [],point_U1.Temperature [cel],point_R2.Temperature [cel]\n0,45.5,21\n";
        let table = reshape_report(ResultKind::MonitorPoints, csv).unwrap();
        assert_eq!(
            table.rows,
            vec![("U1".to_string(), 45.5), ("R2".to_string(), 21.0)]
        );
        assert_eq!(
            table.to_csv(),
            "Point Name,Temperature [C]\nU1,45.5\nR2,21\n"
        );
    }

    #[test]
    fn reshape_rejects_malformed_reports() {
        assert!(matches!(
            reshape_report(ResultKind::ObjectMaxTemperatures, ""),
            Err(AppError::InvalidReport { .. })
        ));
        let two_rows = "X [],U1 [cel]\n0,1\n1,2\n";
        assert!(reshape_report(ResultKind::ObjectMaxTemperatures, two_rows).is_err());
        let short = "X [],U1 [cel],U2 [cel]\n0,1\n";
        assert!(reshape_report(ResultKind::ObjectMaxTemperatures, short).is_err());
        let text = "X [],U1 [cel]\n0,hot\n";
        let err = reshape_report(ResultKind::ObjectMaxTemperatures, text).unwrap_err();
        assert!(err.to_string().contains("Object_Max_Temperatures"), "{err}");
    }
}
