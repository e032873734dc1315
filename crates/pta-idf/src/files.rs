use std::path::{Path, PathBuf};

use crate::{Board, IdfError, IdfResult, Library, parse_board, parse_library};

/// Library file that pairs with a board file: `.emn` → `.emp`, `.bdf` → `.ldf`.
pub fn library_path_for(board_path: &Path) -> IdfResult<PathBuf> {
    let ext = board_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let library_ext = match ext.to_ascii_lowercase().as_str() {
        "emn" => "emp",
        "bdf" => "ldf",
        _ => return Err(IdfError::UnsupportedExtension(ext.to_string())),
    };
    Ok(board_path.with_extension(library_ext))
}

fn read(path: &Path) -> IdfResult<String> {
    std::fs::read_to_string(path).map_err(|source| IdfError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_board(path: &Path) -> IdfResult<Board> {
    parse_board(&read(path)?)
}

pub fn read_library(path: &Path) -> IdfResult<Library> {
    parse_library(&read(path)?)
}

/// Read a board file and its library.
pub fn load_pair(board_path: &Path, library_path: &Path) -> IdfResult<(Board, Library)> {
    Ok((read_board(board_path)?, read_library(library_path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_extensions() {
        assert_eq!(
            library_path_for(Path::new("dir/board.emn")).unwrap(),
            PathBuf::from("dir/board.emp")
        );
        assert_eq!(
            library_path_for(Path::new("board.BDF")).unwrap(),
            PathBuf::from("board.ldf")
        );
        assert!(library_path_for(Path::new("board.brd")).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_board(Path::new("/nonexistent/board.emn")).unwrap_err();
        match err {
            IdfError::Read { path, .. } => assert!(path.ends_with("board.emn")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
