use core::fmt;
use core::str::FromStr;

use crate::BcError;

/// Columns of the boundary-condition table, in file order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    Include,
    PackageName,
    PartName,
    InstanceName,
    DesignatorType,
    HeightMm,
    Placement,
    BcType,
    PowerW,
    RJb,
    RJc,
    MonitorPoint,
    Material,
}

/// How a column may be edited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Fixed by the geometry file.
    ReadOnly,
    /// One of a closed set of values.
    Choice,
    /// Free numeric entry; non-numbers become a missing value.
    Numeric,
    /// Free text, or a choice when a materials list is loaded.
    Text,
}

impl Column {
    pub const ALL: [Column; 13] = [
        Column::Include,
        Column::PackageName,
        Column::PartName,
        Column::InstanceName,
        Column::DesignatorType,
        Column::HeightMm,
        Column::Placement,
        Column::BcType,
        Column::PowerW,
        Column::RJb,
        Column::RJc,
        Column::MonitorPoint,
        Column::Material,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::Include => "Include",
            Column::PackageName => "Package_Name",
            Column::PartName => "Part_Name",
            Column::InstanceName => "Instance_Name",
            Column::DesignatorType => "Designator_Type",
            Column::HeightMm => "Height [mm]",
            Column::Placement => "Placement",
            Column::BcType => "BC_Type",
            Column::PowerW => "Power [W]",
            Column::RJb => "R_jb [C/W]",
            Column::RJc => "R_jc [C/W]",
            Column::MonitorPoint => "Monitor_Point",
            Column::Material => "Material",
        }
    }

    pub fn index(self) -> usize {
        Column::ALL
            .iter()
            .position(|c| *c == self)
            .unwrap_or_default()
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            Column::PackageName | Column::PartName | Column::InstanceName | Column::Placement => {
                ColumnKind::ReadOnly
            }
            Column::Include | Column::MonitorPoint | Column::BcType | Column::DesignatorType => {
                ColumnKind::Choice
            }
            Column::HeightMm | Column::PowerW | Column::RJb | Column::RJc => ColumnKind::Numeric,
            Column::Material => ColumnKind::Text,
        }
    }

    /// The full header line.
    pub fn header_line() -> String {
        Column::ALL
            .iter()
            .map(|c| c.header())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for Column {
    type Err = BcError;

    /// Accepts the exact header or a loose spelling such as `power`, `r_jb` or `bc-type`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = loose(s);
        Column::ALL
            .into_iter()
            .find(|c| c.header() == s.trim() || loose(c.header()) == wanted)
            .ok_or_else(|| BcError::UnknownColumn(s.to_string()))
    }
}

fn loose(s: &str) -> String {
    let base = s.split('[').next().unwrap_or(s);
    base.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_line_is_stable() {
        assert_eq!(
            Column::header_line(),
            "Include,Package_Name,Part_Name,Instance_Name,Designator_Type,Height [mm],Placement,BC_Type,Power [W],R_jb [C/W],R_jc [C/W],Monitor_Point,Material"
        );
    }

    #[test]
    fn loose_column_names() {
        assert_eq!("Power [W]".parse::<Column>().unwrap(), Column::PowerW);
        assert_eq!("power".parse::<Column>().unwrap(), Column::PowerW);
        assert_eq!("r_jb".parse::<Column>().unwrap(), Column::RJb);
        assert_eq!("bc-type".parse::<Column>().unwrap(), Column::BcType);
        assert_eq!("height".parse::<Column>().unwrap(), Column::HeightMm);
        assert!("colour".parse::<Column>().is_err());
    }

    #[test]
    fn indices_follow_file_order() {
        for (i, c) in Column::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }
}
