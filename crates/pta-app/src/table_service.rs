//! Boundary-condition table operations on a session.

use std::path::{Path, PathBuf};

use pta_bc::{BcTable, Column, Edit, Editor, MaterialList, default_table_path};
use pta_idf::{library_path_for, load_pair};
use tracing::info;

use crate::error::{AppError, AppResult, Precondition};
use crate::session::Session;

/// Build the table for a board/library pair and write it next to the board
/// as `<board stem>_bcs.csv`.
///
/// The library defaults to the one paired with the board file. Nothing is
/// written unless both files parse.
pub fn generate_table(
    session: &mut Session,
    board: &Path,
    library: Option<&Path>,
) -> AppResult<(PathBuf, BcTable)> {
    let library = match library {
        Some(path) => path.to_path_buf(),
        None => library_path_for(board)?,
    };
    let (parsed_board, parsed_library) = load_pair(board, &library)?;
    let table = BcTable::build(&parsed_board, &parsed_library)?;
    let path = default_table_path(board);
    table.write_csv(&path)?;
    info!(path = %path.display(), rows = table.len(), "boundary-condition table written");

    session.files.board = Some(board.to_path_buf());
    session.files.library = Some(library);
    session.files.table = Some(path.clone());
    session.set_last_table(table.clone());
    Ok((path, table))
}

/// Read a table and make it the session's current one.
pub fn load_table(session: &mut Session, path: &Path) -> AppResult<BcTable> {
    let table = BcTable::read_csv(path)?;
    session.files.table = Some(path.to_path_buf());
    session.set_last_table(table.clone());
    Ok(table)
}

pub fn load_materials(session: &mut Session, path: &Path) -> AppResult<MaterialList> {
    let materials = MaterialList::read_csv(path)?;
    session.files.materials = Some(path.to_path_buf());
    Ok(materials)
}

/// Edit one cell of the session's table file and save it.
///
/// With a materials file selected, the material column only accepts its
/// names.
pub fn set_cell(
    session: &mut Session,
    designator: &str,
    column: Column,
    value: &str,
) -> AppResult<Edit> {
    let Some(path) = session.files.table.clone() else {
        return Err(AppError::Preconditions(vec![Precondition::MissingTable]));
    };
    let materials = match &session.files.materials {
        Some(m) => Some(MaterialList::read_csv(m)?),
        None => None,
    };
    let mut table = BcTable::read_csv(&path)?;
    let mut editor = Editor::new(&mut table);
    if let Some(materials) = &materials {
        editor = editor.with_materials(materials);
    }
    let edit = editor.set_by_designator(designator, column, value)?;
    table.write_csv(&path)?;
    info!(designator, column = %column, stored = %edit.stored, "table cell updated");
    session.set_last_table(table);
    Ok(edit)
}
