use core::fmt;
use core::str::FromStr;

use pta_core::{format_number, parse_number};
use pta_idf::{ComponentRecord, DesignatorType, NOREFDES, Side};

use crate::{BcError, BcResult, Column};

/// Material written into a fresh table.
pub const DEFAULT_MATERIAL: &str = "Ceramic_material";

const YES: &str = "YES";
const NO: &str = "NO";

/// How a component is represented thermally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BcType {
    #[default]
    Block,
    Network,
    Hollow,
}

impl BcType {
    pub const ALL: [BcType; 3] = [BcType::Block, BcType::Network, BcType::Hollow];

    pub fn label(self) -> &'static str {
        match self {
            BcType::Block => "block",
            BcType::Network => "network",
            BcType::Hollow => "hollow",
        }
    }
}

impl fmt::Display for BcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BcType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BcType::ALL
            .into_iter()
            .find(|t| t.label() == s.trim())
            .ok_or_else(|| s.to_string())
    }
}

/// One row of the boundary-condition table.
///
/// Numeric cells hold `None` when the stored text was not a number; such a
/// value is written back as an empty cell rather than as zero.
#[derive(Clone, Debug, PartialEq)]
pub struct BcRow {
    pub include: bool,
    pub package_name: String,
    pub part_name: String,
    pub instance_name: String,
    pub designator_type: DesignatorType,
    pub height_mm: Option<f64>,
    pub placement: Side,
    pub bc_type: BcType,
    pub power_w: Option<f64>,
    pub r_jb: Option<f64>,
    pub r_jc: Option<f64>,
    pub monitor_point: bool,
    pub material: String,
}

impl BcRow {
    /// Defaulted row for a parsed component.
    pub fn from_record(record: &ComponentRecord, height_mm: f64) -> Self {
        Self {
            include: true,
            package_name: record.package_name.clone(),
            part_name: record.part_name.clone(),
            instance_name: record.instance_name.clone(),
            designator_type: record.designator_type,
            height_mm: Some(height_mm),
            placement: record.placement,
            bc_type: BcType::Block,
            power_w: Some(0.0),
            r_jb: Some(0.0),
            r_jc: Some(0.0),
            monitor_point: false,
            material: DEFAULT_MATERIAL.to_string(),
        }
    }

    /// Rows without a reference designator are never simulated.
    pub fn is_sentinel(&self) -> bool {
        self.instance_name == NOREFDES
    }

    /// Text stored for `column`.
    pub fn cell(&self, column: Column) -> String {
        let number = |v: Option<f64>| v.map(format_number).unwrap_or_default();
        match column {
            Column::Include => yes_no(self.include).to_string(),
            Column::PackageName => self.package_name.clone(),
            Column::PartName => self.part_name.clone(),
            Column::InstanceName => self.instance_name.clone(),
            Column::DesignatorType => self.designator_type.label().to_string(),
            Column::HeightMm => number(self.height_mm),
            Column::Placement => self.placement.label().to_string(),
            Column::BcType => self.bc_type.label().to_string(),
            Column::PowerW => number(self.power_w),
            Column::RJb => number(self.r_jb),
            Column::RJc => number(self.r_jc),
            Column::MonitorPoint => yes_no(self.monitor_point).to_string(),
            Column::Material => self.material.clone(),
        }
    }

    pub fn cells(&self) -> Vec<String> {
        Column::ALL.iter().map(|c| self.cell(*c)).collect()
    }

    /// Parse a stored row. Enumerated cells must hold one of their labels.
    pub fn from_cells(line: usize, cells: &[String]) -> BcResult<Self> {
        if cells.len() != Column::ALL.len() {
            return Err(BcError::Malformed {
                line,
                message: format!(
                    "expected {} cells, found {}",
                    Column::ALL.len(),
                    cells.len()
                ),
            });
        }
        let text = |c: Column| cells[c.index()].trim();
        let invalid = |c: Column| BcError::InvalidCell {
            line,
            column: c,
            value: cells[c.index()].clone(),
        };
        let flag = |c: Column| parse_yes_no(text(c)).ok_or_else(|| invalid(c));

        Ok(Self {
            include: flag(Column::Include)?,
            package_name: text(Column::PackageName).to_string(),
            part_name: text(Column::PartName).to_string(),
            instance_name: text(Column::InstanceName).to_string(),
            designator_type: text(Column::DesignatorType)
                .parse()
                .map_err(|_| invalid(Column::DesignatorType))?,
            height_mm: parse_number(text(Column::HeightMm)),
            placement: text(Column::Placement)
                .parse()
                .map_err(|_| invalid(Column::Placement))?,
            bc_type: text(Column::BcType)
                .parse()
                .map_err(|_| invalid(Column::BcType))?,
            power_w: parse_number(text(Column::PowerW)),
            r_jb: parse_number(text(Column::RJb)),
            r_jc: parse_number(text(Column::RJc)),
            monitor_point: flag(Column::MonitorPoint)?,
            material: text(Column::Material).to_string(),
        })
    }
}

pub(crate) fn yes_no(v: bool) -> &'static str {
    if v { YES } else { NO }
}

pub(crate) fn parse_yes_no(s: &str) -> Option<bool> {
    match s {
        YES => Some(true),
        NO => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ComponentRecord {
        ComponentRecord {
            package_name: "QFN48".into(),
            part_name: "MCU".into(),
            instance_name: "U1".into(),
            placement: Side::Top,
            designator_type: DesignatorType::IntegratedCircuit,
        }
    }

    #[test]
    fn defaults() {
        let row = BcRow::from_record(&record(), 1.016);
        assert_eq!(
            row.cells(),
            vec![
                "YES",
                "QFN48",
                "MCU",
                "U1",
                "INTEGRATED CIRCUIT",
                "1.016",
                "TOP",
                "block",
                "0",
                "0",
                "0",
                "NO",
                "Ceramic_material"
            ]
        );
    }

    #[test]
    fn non_numeric_cells_are_missing_not_zero() {
        let mut cells = BcRow::from_record(&record(), 1.0).cells();
        cells[Column::PowerW.index()] = "lots".into();
        let row = BcRow::from_cells(2, &cells).unwrap();
        assert_eq!(row.power_w, None);
        assert_eq!(row.cell(Column::PowerW), "");
    }

    #[test]
    fn enumerated_cells_are_strict() {
        let mut cells = BcRow::from_record(&record(), 1.0).cells();
        cells[Column::BcType.index()] = "BLOCK".into();
        let err = BcRow::from_cells(7, &cells).unwrap_err();
        assert!(matches!(
            err,
            BcError::InvalidCell {
                line: 7,
                column: Column::BcType,
                ..
            }
        ));
    }

    #[test]
    fn wrong_cell_count() {
        let err = BcRow::from_cells(3, &["YES".to_string()]).unwrap_err();
        assert!(matches!(err, BcError::Malformed { line: 3, .. }));
    }
}
