use pta_core::IdfUnit;
use tracing::debug;

use crate::board::{Line, loop_extents, number, significant_lines};
use crate::{IdfError, IdfResult, Library, LibraryEntry};

const OPEN: &str = ".ELECTRICAL";
const CLOSE: &str = ".END_ELECTRICAL";

/// Parse every `.ELECTRICAL` block of a library file.
///
/// The line after each tag reads `geometry part unit height`; the height is
/// converted to millimetres using that unit. Outline loop points up to
/// `.END_ELECTRICAL` give the footprint extents.
pub fn parse_library(text: &str) -> IdfResult<Library> {
    let lines = significant_lines(text);
    let mut entries = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].tag() != OPEN {
            i += 1;
            continue;
        }
        let body_start = i + 1;
        let body_len = lines[body_start..]
            .iter()
            .position(|l| l.tag() == CLOSE)
            .ok_or(IdfError::UnterminatedSection {
                open: OPEN,
                close: CLOSE,
            })?;
        let body = &lines[body_start..body_start + body_len];
        let Some((header, points)) = body.split_first() else {
            return Err(IdfError::parse(lines[i].number, "empty .ELECTRICAL block"));
        };
        entries.push(parse_entry(header, points)?);
        i = body_start + body_len + 1;
    }

    debug!(entries = entries.len(), "parsed library");
    Ok(Library::new(entries))
}

fn parse_entry(header: &Line<'_>, points: &[Line<'_>]) -> IdfResult<LibraryEntry> {
    let tokens = header.tokens()?;
    let [package_name, part_name, unit, height, ..] = tokens.as_slice() else {
        return Err(IdfError::parse(
            header.number,
            format!(
                "expected geometry, part, unit and height, found {} field(s)",
                tokens.len()
            ),
        ));
    };
    let unit = IdfUnit::parse(unit).map_err(|e| IdfError::parse(header.number, e.to_string()))?;
    let height = number(header, height, "height")?;

    Ok(LibraryEntry {
        package_name: package_name.clone(),
        part_name: part_name.clone(),
        height_mm: unit.to_mm(height),
        outline: loop_extents(points, unit)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#".HEADER
LIBRARY_FILE 3.0 "Sample" 2023/01/01.12:00:00 1
.END_HEADER
.ELECTRICAL
"QFN48" "MCU,ARM" THOU 10.0
0 -100.0 -100.0 0.0
0 100.0 -100.0 0.0
0 100.0 100.0 0.0
0 -100.0 100.0 0.0
.END_ELECTRICAL
.MECHANICAL
"BRACKET" "" THOU 300.0
0 0.0 0.0 0.0
.END_MECHANICAL
.ELECTRICAL
"0402" "RES_0402" MM 0.35
0 -0.5 -0.25 0.0
0 0.5 0.25 0.0
.END_ELECTRICAL
"#;

    #[test]
    fn reads_heights_in_millimetres() {
        let lib = parse_library(LIBRARY).unwrap();
        assert_eq!(lib.entries().len(), 2);
        assert_eq!(lib.height_of("MCU_ARM"), 0.254);
        assert_eq!(lib.height_of("RES_0402"), 0.35);
        assert_eq!(lib.height_of("UNKNOWN"), 0.0);
    }

    #[test]
    fn reads_footprint_extents() {
        let lib = parse_library(LIBRARY).unwrap();
        let outline = lib.entry("MCU_ARM").unwrap().outline.unwrap();
        assert!((outline.width() - 5.08).abs() < 1e-9);
        let outline = lib.entry("RES_0402").unwrap().outline.unwrap();
        assert_eq!(outline.width(), 1.0);
        assert_eq!(outline.depth(), 0.5);
    }

    #[test]
    fn last_definition_wins() {
        let text = ".ELECTRICAL\nA P THOU 10\n.END_ELECTRICAL\n.ELECTRICAL\nB P THOU 20\n.END_ELECTRICAL\n";
        let lib = parse_library(text).unwrap();
        assert_eq!(lib.height_of("P"), 0.508);
        assert_eq!(lib.entry("P").unwrap().package_name, "B");
    }

    #[test]
    fn unknown_unit_is_rejected() {
        let err = parse_library(".ELECTRICAL\nA P INCH 1\n.END_ELECTRICAL\n").unwrap_err();
        assert!(matches!(err, IdfError::Parse { line: 2, .. }));
    }

    #[test]
    fn unterminated_block_is_rejected() {
        let err = parse_library(".ELECTRICAL\nA P THOU 1\n").unwrap_err();
        assert!(matches!(err, IdfError::UnterminatedSection { .. }));
    }
}
