use pta_core::parse_number;
use pta_idf::DesignatorType;
use pta_idf::token::sanitize;
use tracing::{debug, warn};

use crate::row::{parse_yes_no, yes_no};
use crate::{BcError, BcResult, BcTable, BcType, Column, ColumnKind, MaterialList};

/// What a single accepted edit stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Edit {
    pub row: usize,
    pub column: Column,
    pub previous: String,
    pub stored: String,
}

/// Applies constrained edits to a table.
///
/// Material is a choice when a materials list is attached and free text
/// otherwise.
pub struct Editor<'a> {
    table: &'a mut BcTable,
    materials: Option<&'a MaterialList>,
}

impl<'a> Editor<'a> {
    pub fn new(table: &'a mut BcTable) -> Self {
        Self {
            table,
            materials: None,
        }
    }

    pub fn with_materials(mut self, materials: &'a MaterialList) -> Self {
        self.materials = Some(materials);
        self
    }

    /// The allowed values of a choice column; `None` for free entry.
    pub fn choices(&self, column: Column) -> Option<Vec<String>> {
        match column {
            Column::Include | Column::MonitorPoint => Some(labels(&[yes_no(true), yes_no(false)])),
            Column::BcType => Some(labels(&BcType::ALL.map(BcType::label))),
            Column::DesignatorType => Some(labels(&DesignatorType::ALL.map(DesignatorType::label))),
            Column::Material => self.materials.map(MaterialList::names),
            _ => None,
        }
    }

    pub fn set_by_designator(
        &mut self,
        instance_name: &str,
        column: Column,
        value: &str,
    ) -> BcResult<Edit> {
        let row = self.table.position(instance_name)?;
        self.set_cell(row, column, value)
    }

    pub fn set_cell(&mut self, row: usize, column: Column, value: &str) -> BcResult<Edit> {
        if column.kind() == ColumnKind::ReadOnly {
            return Err(BcError::ReadOnly(column));
        }
        // table cells never hold commas, so material names compare sanitized
        let value = match column {
            Column::Material => sanitize(value.trim()),
            _ => value.trim().to_string(),
        };
        let value = value.as_str();
        let not_a_choice = |choices: Vec<String>| BcError::NotAChoice {
            column,
            value: value.to_string(),
            choices,
        };
        if let Some(choices) = self.choices(column) {
            if !choices.iter().any(|c| c == value) {
                return Err(not_a_choice(choices));
            }
        }

        let target = self.table.row_mut(row)?;
        let previous = target.cell(column);
        match column {
            Column::Include => target.include = parse_yes_no(value).unwrap_or(target.include),
            Column::MonitorPoint => {
                target.monitor_point = parse_yes_no(value).unwrap_or(target.monitor_point)
            }
            Column::BcType => {
                target.bc_type = value
                    .parse()
                    .map_err(|_| not_a_choice(labels(&BcType::ALL.map(BcType::label))))?
            }
            Column::DesignatorType => {
                target.designator_type = value.parse().map_err(|_| {
                    not_a_choice(labels(&DesignatorType::ALL.map(DesignatorType::label)))
                })?
            }
            Column::HeightMm | Column::PowerW | Column::RJb | Column::RJc => {
                let number = parse_number(value);
                if number.is_none() && !value.is_empty() {
                    warn!(%column, value, "non-numeric entry stored as missing");
                }
                match column {
                    Column::HeightMm => target.height_mm = number,
                    Column::PowerW => target.power_w = number,
                    Column::RJb => target.r_jb = number,
                    _ => target.r_jc = number,
                }
            }
            Column::Material => target.material = value.to_string(),
            Column::PackageName | Column::PartName | Column::InstanceName | Column::Placement => {
                return Err(BcError::ReadOnly(column));
            }
        }
        let stored = target.cell(column);
        debug!(row, %column, %previous, %stored, "edited cell");
        Ok(Edit {
            row,
            column,
            previous,
            stored,
        })
    }
}

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BcRow, Material};
    use pta_idf::{ComponentRecord, Side};

    fn table() -> BcTable {
        let record = |name: &str| ComponentRecord {
            package_name: "PKG".into(),
            part_name: "PART".into(),
            instance_name: name.into(),
            placement: Side::Top,
            designator_type: DesignatorType::Misc,
        };
        BcTable::new(vec![
            BcRow::from_record(&record("U1"), 1.0),
            BcRow::from_record(&record("R1"), 0.5),
        ])
        .unwrap()
    }

    #[test]
    fn choices_are_enforced() {
        let mut t = table();
        let mut editor = Editor::new(&mut t);
        editor.set_cell(0, Column::BcType, "network").unwrap();
        editor.set_cell(0, Column::Include, "NO").unwrap();
        let err = editor.set_cell(0, Column::BcType, "NETWORK").unwrap_err();
        match err {
            BcError::NotAChoice { choices, .. } => {
                assert_eq!(choices, vec!["block", "network", "hollow"])
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(editor.set_cell(1, Column::MonitorPoint, "yes").is_err());
        assert_eq!(t.rows()[0].bc_type, BcType::Network);
        assert!(!t.rows()[0].include);
    }

    #[test]
    fn numeric_entry_becomes_missing() {
        let mut t = table();
        let mut editor = Editor::new(&mut t);
        let edit = editor.set_by_designator("R1", Column::PowerW, "abc").unwrap();
        assert_eq!(edit.previous, "0");
        assert_eq!(edit.stored, "");
        editor.set_by_designator("R1", Column::RJb, "2.5").unwrap();
        assert_eq!(t.rows()[1].power_w, None);
        assert_eq!(t.rows()[1].r_jb, Some(2.5));
    }

    #[test]
    fn read_only_and_out_of_range() {
        let mut t = table();
        let mut editor = Editor::new(&mut t);
        assert!(matches!(
            editor.set_cell(0, Column::PartName, "X"),
            Err(BcError::ReadOnly(Column::PartName))
        ));
        assert!(matches!(
            editor.set_cell(9, Column::PowerW, "1"),
            Err(BcError::RowOutOfRange { row: 9, len: 2 })
        ));
        assert!(matches!(
            editor.set_by_designator("C9", Column::PowerW, "1"),
            Err(BcError::UnknownDesignator(_))
        ));
    }

    #[test]
    fn material_is_free_text_without_a_list() {
        let mut t = table();
        Editor::new(&mut t)
            .set_cell(0, Column::Material, "Resistor,100ohm")
            .unwrap();
        assert_eq!(t.rows()[0].material, "Resistor_100ohm");
    }

    #[test]
    fn material_list_restricts_choices() {
        let list = MaterialList::new(vec![Material {
            name: "Copper".into(),
            conductivity: 400.0,
        }]);
        let mut t = table();
        let mut editor = Editor::new(&mut t).with_materials(&list);
        assert_eq!(editor.choices(Column::Material), Some(vec!["Copper".into()]));
        editor.set_cell(0, Column::Material, "Copper").unwrap();
        assert!(editor.set_cell(0, Column::Material, "Gold").is_err());
    }

    #[test]
    fn listed_material_with_comma_is_accepted() {
        let list = MaterialList::from_csv("Name,Conductivity\n\"FR4, core\",0.3\n").unwrap();
        let mut t = table();
        let mut editor = Editor::new(&mut t).with_materials(&list);
        let edit = editor.set_cell(0, Column::Material, "FR4, core").unwrap();
        assert_eq!(edit.stored, "FR4_ core");
        editor.set_cell(1, Column::Material, "FR4_ core").unwrap();
        assert!(list.contains(&t.rows()[0].material));
        assert!(list.contains(&t.rows()[1].material));
    }
}
