use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pta_idf::{Board, Library};
use tracing::{debug, info, warn};

use crate::delimited::{join_record, lines, split_record};
use crate::{BcError, BcResult, BcRow, Column};

/// The boundary-condition table, one row per placed component.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BcTable {
    rows: Vec<BcRow>,
}

/// `<board dir>/<board stem>_bcs.csv`.
pub fn default_table_path(board_path: &Path) -> PathBuf {
    let stem = board_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("board");
    board_path.with_file_name(format!("{stem}_bcs.csv"))
}

impl BcTable {
    pub fn new(rows: Vec<BcRow>) -> BcResult<Self> {
        check_unique(&rows)?;
        Ok(Self { rows })
    }

    /// Defaulted table for a parsed board, heights joined from its library.
    pub fn build(board: &Board, library: &Library) -> BcResult<Self> {
        if board.is_empty() {
            return Err(BcError::EmptyBoard);
        }
        let rows: Vec<BcRow> = board
            .records()
            .map(|r| BcRow::from_record(r, library.height_of(&r.part_name)))
            .collect();
        let unmatched = rows
            .iter()
            .filter(|r| library.entry(&r.part_name).is_none())
            .count();
        if unmatched > 0 {
            debug!(unmatched, "parts without a library height");
        }
        info!(rows = rows.len(), "built boundary-condition table");
        Self::new(rows)
    }

    pub fn rows(&self) -> &[BcRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> BcResult<&BcRow> {
        self.rows.get(index).ok_or(BcError::RowOutOfRange {
            row: index,
            len: self.rows.len(),
        })
    }

    pub(crate) fn row_mut(&mut self, index: usize) -> BcResult<&mut BcRow> {
        let len = self.rows.len();
        self.rows
            .get_mut(index)
            .ok_or(BcError::RowOutOfRange { row: index, len })
    }

    /// Index of the row with this designator.
    pub fn position(&self, instance_name: &str) -> BcResult<usize> {
        self.rows
            .iter()
            .position(|r| r.instance_name == instance_name && !r.is_sentinel())
            .ok_or_else(|| BcError::UnknownDesignator(instance_name.to_string()))
    }

    pub fn find(&self, instance_name: &str) -> Option<&BcRow> {
        self.position(instance_name).ok().map(|i| &self.rows[i])
    }

    /// Rows the simulation acts on: included, with a designator.
    pub fn active(&self) -> impl Iterator<Item = &BcRow> {
        self.rows.iter().filter(|r| r.include && !r.is_sentinel())
    }

    /// Rows to remove or exclude from the model.
    pub fn excluded(&self) -> impl Iterator<Item = &BcRow> {
        self.rows.iter().filter(|r| !r.include && !r.is_sentinel())
    }

    pub fn to_csv(&self) -> String {
        let mut out = Column::header_line();
        out.push('\n');
        for row in &self.rows {
            out.push_str(&join_record(row.cells()));
            out.push('\n');
        }
        out
    }

    pub fn from_csv(text: &str) -> BcResult<Self> {
        let mut records = lines(text);
        let expected = Column::header_line();
        let Some((_, header)) = records.next() else {
            return Err(BcError::Header {
                expected,
                found: String::new(),
            });
        };
        let found = split_record(header)
            .map_err(|message| BcError::Malformed { line: 1, message })?
            .iter()
            .map(|c| c.trim())
            .collect::<Vec<_>>()
            .join(",");
        if found != expected {
            return Err(BcError::Header { expected, found });
        }

        let mut rows = Vec::new();
        for (line, text) in records {
            let cells =
                split_record(text).map_err(|message| BcError::Malformed { line, message })?;
            let row = BcRow::from_cells(line, &cells)?;
            for column in [Column::HeightMm, Column::PowerW, Column::RJb, Column::RJc] {
                if row.cell(column).is_empty() && !cells[column.index()].trim().is_empty() {
                    warn!(
                        line,
                        %column,
                        value = %cells[column.index()],
                        "non-numeric cell read as missing"
                    );
                }
            }
            rows.push(row);
        }
        Self::new(rows)
    }

    /// Write the whole table. Nothing is written if serialization fails.
    pub fn write_csv(&self, path: &Path) -> BcResult<()> {
        std::fs::write(path, self.to_csv()).map_err(|source| BcError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), rows = self.rows.len(), "wrote table");
        Ok(())
    }

    pub fn read_csv(path: &Path) -> BcResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| BcError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv(&text)
    }
}

fn check_unique(rows: &[BcRow]) -> BcResult<()> {
    let mut seen = HashSet::new();
    for row in rows.iter().filter(|r| !r.is_sentinel()) {
        if !seen.insert(row.instance_name.as_str()) {
            return Err(BcError::DuplicateDesignator(row.instance_name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pta_idf::parse_board;

    const BOARD: &str = ".PLACEMENT\n\
\"QFN48\" \"MCU\" \"U1\"\n0 0 0 0 TOP PLACED\n\
\"0603\" \"\" \"R1\"\n0 0 0 0 BOTTOM PLACED\n\
\"HOLE\" \"\" \"NOREFDES\"\n0 0 0 0 TOP MCAD\n\
\"HOLE\" \"\" \"NOREFDES\"\n0 0 0 0 TOP MCAD\n\
.END_PLACEMENT\n";

    #[test]
    fn build_defaults_every_row() {
        let board = parse_board(BOARD).unwrap();
        let table = BcTable::build(&board, &Library::default()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.rows()[1].part_name, "NOPARTNAME");
        assert_eq!(table.active().count(), 2);
        assert!(table.find("NOREFDES").is_none());
        assert_eq!(table.position("R1").unwrap(), 1);
    }

    #[test]
    fn build_rejects_empty_board() {
        let board = parse_board(".PLACEMENT\n.END_PLACEMENT\n").unwrap();
        let err = BcTable::build(&board, &Library::default()).unwrap_err();
        assert!(matches!(err, BcError::EmptyBoard));
    }

    #[test]
    fn build_rejects_duplicate_designator() {
        let text = ".PLACEMENT\nA B U1\n0 0 0 0 TOP\nA B U1\n0 0 0 0 BOTTOM\n.END_PLACEMENT\n";
        let board = parse_board(text).unwrap();
        let err = BcTable::build(&board, &Library::default()).unwrap_err();
        assert!(matches!(err, BcError::DuplicateDesignator(d) if d == "U1"));
    }

    #[test]
    fn header_must_match() {
        let err = BcTable::from_csv("Include,Package\nYES,A\n").unwrap_err();
        assert!(matches!(err, BcError::Header { .. }));
        let err = BcTable::from_csv("").unwrap_err();
        assert!(matches!(err, BcError::Header { .. }));
    }

    #[test]
    fn default_path_sits_next_to_board() {
        assert_eq!(
            default_table_path(Path::new("/work/demo.emn")),
            PathBuf::from("/work/demo_bcs.csv")
        );
    }
}
