//! Result data types.

use std::fmt;

use serde::{Deserialize, Serialize};

pub type RunId = String;

/// One of the tabular results pulled from a solved project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    MonitorPoints,
    NetworkJunctions,
    ObjectMaxTemperatures,
    BoardSideHeatFlow,
}

impl ResultKind {
    pub const ALL: [ResultKind; 4] = [
        ResultKind::MonitorPoints,
        ResultKind::NetworkJunctions,
        ResultKind::ObjectMaxTemperatures,
        ResultKind::BoardSideHeatFlow,
    ];

    /// Report name in the solver; the exported file is `<name>.csv`.
    pub fn report_name(self) -> &'static str {
        match self {
            ResultKind::MonitorPoints => "Monitor_Point_Temperatures",
            ResultKind::NetworkJunctions => "Network_Junction_Temperatures",
            ResultKind::ObjectMaxTemperatures => "Object_Max_Temperatures",
            ResultKind::BoardSideHeatFlow => "Object_Board_Side_Heat_Flux",
        }
    }

    /// Headers of the reshaped two-column table.
    pub fn headers(self) -> (&'static str, &'static str) {
        match self {
            ResultKind::MonitorPoints => ("Point Name", "Temperature [C]"),
            ResultKind::NetworkJunctions => ("Network Junction", "Temperature [C]"),
            ResultKind::ObjectMaxTemperatures => ("Object", "Temperature [C]"),
            ResultKind::BoardSideHeatFlow => ("Object", "Heat Flow [W]"),
        }
    }

    fn key(self) -> &'static str {
        match self {
            ResultKind::MonitorPoints => "monitor_points",
            ResultKind::NetworkJunctions => "network_junctions",
            ResultKind::ObjectMaxTemperatures => "object_max_temperatures",
            ResultKind::BoardSideHeatFlow => "board_side_heat_flow",
        }
    }

    /// File name of the stored table inside a run directory.
    pub fn file_name(self) -> String {
        format!("{}.json", self.key())
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A `(name, value)` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub kind: ResultKind,
    pub rows: Vec<(String, f64)>,
}

impl ResultTable {
    pub fn new(kind: ResultKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
        }
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.rows.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Two-column comma-delimited text with the kind's headers.
    pub fn to_csv(&self) -> String {
        let (name, value) = self.kind.headers();
        let mut out = format!("{name},{value}\n");
        for (n, v) in &self.rows {
            out.push_str(&format!("{n},{v}\n"));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub project_name: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    /// SHA-256 of the settings YAML alone.
    pub settings_digest: String,
    pub solved: bool,
    /// Pipeline stages that completed, in order.
    pub stages: Vec<String>,
}

impl RunManifest {
    /// A manifest stamped with the current time and no completed stages.
    pub fn new(run_id: RunId, project_name: impl Into<String>, settings_digest: String) -> Self {
        Self {
            run_id,
            project_name: project_name.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            settings_digest,
            solved: false,
            stages: Vec::new(),
        }
    }
}
