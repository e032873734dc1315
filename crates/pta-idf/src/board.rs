use pta_core::IdfUnit;
use tracing::debug;

use crate::token::tokenize;
use crate::{
    Board, ComponentRecord, Extents, IdfError, IdfResult, PlacedComponent, PlacementLocation,
    classify_designator,
};

/// A non-blank, non-comment line with its 1-based line number.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Line<'a> {
    pub number: usize,
    pub text: &'a str,
}

impl Line<'_> {
    pub fn tag(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or("")
    }

    pub fn tokens(&self) -> IdfResult<Vec<String>> {
        tokenize(self.text).map_err(|e| {
            IdfError::parse(
                self.number,
                format!("unterminated quote at column {}", e.column),
            )
        })
    }
}

pub(crate) fn significant_lines(text: &str) -> Vec<Line<'_>> {
    text.lines()
        .enumerate()
        .map(|(i, l)| Line {
            number: i + 1,
            text: l.trim(),
        })
        .filter(|l| !l.text.is_empty() && !l.text.starts_with('#'))
        .collect()
}

/// Body of the first `open` ... `close` block, `None` if `open` never appears.
pub(crate) fn section<'l, 'a>(
    lines: &'l [Line<'a>],
    open: &'static str,
    close: &'static str,
) -> IdfResult<Option<&'l [Line<'a>]>> {
    let Some(start) = lines.iter().position(|l| l.tag() == open) else {
        return Ok(None);
    };
    let body = &lines[start + 1..];
    let end = body
        .iter()
        .position(|l| l.tag() == close)
        .ok_or(IdfError::UnterminatedSection { open, close })?;
    Ok(Some(&body[..end]))
}

pub(crate) fn number(line: &Line<'_>, token: &str, what: &str) -> IdfResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| IdfError::parse(line.number, format!("{what} is not a number: {token}")))
}

/// Parse a board file.
///
/// A file without `.PLACEMENT` is an error; a placement block with no entries
/// yields an empty board.
pub fn parse_board(text: &str) -> IdfResult<Board> {
    let lines = significant_lines(text);
    let units = header_units(&lines)?;
    let (thickness_mm, outline) = board_outline(&lines, units)?;

    let body = section(&lines, ".PLACEMENT", ".END_PLACEMENT")?
        .ok_or(IdfError::MissingSection(".PLACEMENT"))?;

    if body.len() % 2 != 0 {
        let last = body[body.len() - 1];
        return Err(IdfError::DanglingLine { line: last.number });
    }

    let components = body
        .chunks_exact(2)
        .map(|pair| parse_entry(&pair[0], &pair[1], units))
        .collect::<IdfResult<Vec<_>>>()?;

    debug!(
        components = components.len(),
        ?units,
        "parsed board placement"
    );

    Ok(Board {
        units,
        thickness_mm,
        outline,
        components,
    })
}

fn header_units(lines: &[Line<'_>]) -> IdfResult<IdfUnit> {
    let Some(header) = section(lines, ".HEADER", ".END_HEADER")? else {
        return Ok(IdfUnit::default());
    };
    // second header line: board name, units
    let Some(line) = header.get(1) else {
        return Ok(IdfUnit::default());
    };
    let tokens = line.tokens()?;
    match tokens.last() {
        Some(unit) => IdfUnit::parse(unit).map_err(|e| IdfError::parse(line.number, e.to_string())),
        None => Ok(IdfUnit::default()),
    }
}

fn board_outline(
    lines: &[Line<'_>],
    units: IdfUnit,
) -> IdfResult<(Option<f64>, Option<Extents>)> {
    let Some(body) = section(lines, ".BOARD_OUTLINE", ".END_BOARD_OUTLINE")? else {
        return Ok((None, None));
    };
    let Some((first, points)) = body.split_first() else {
        return Ok((None, None));
    };
    let thickness = number(first, first.tag(), "board thickness")?;
    let outline = loop_extents(points, units)?;
    Ok((Some(units.to_mm(thickness)), outline))
}

/// Bounding rectangle of `label x y angle` loop point lines.
pub(crate) fn loop_extents(points: &[Line<'_>], units: IdfUnit) -> IdfResult<Option<Extents>> {
    let mut extents = None;
    for line in points {
        let tokens: Vec<&str> = line.text.split_whitespace().collect();
        if tokens.len() < 3 {
            return Err(IdfError::parse(line.number, "outline point needs x and y"));
        }
        let x = number(line, tokens[1], "outline x")?;
        let y = number(line, tokens[2], "outline y")?;
        Extents::include(&mut extents, units.to_mm(x), units.to_mm(y));
    }
    Ok(extents)
}

fn parse_entry(
    identity: &Line<'_>,
    placement: &Line<'_>,
    units: IdfUnit,
) -> IdfResult<PlacedComponent> {
    let names = identity.tokens()?;
    let [package_name, part_name, instance_name, ..] = names.as_slice() else {
        return Err(IdfError::parse(
            identity.number,
            format!(
                "expected package, part and designator names, found {} field(s)",
                names.len()
            ),
        ));
    };

    let fields: Vec<&str> = placement.text.split_whitespace().collect();
    if fields.len() < 5 {
        return Err(IdfError::parse(
            placement.number,
            format!(
                "expected x, y, offset, rotation and side, found {} field(s)",
                fields.len()
            ),
        ));
    }
    let side = fields[4].parse().map_err(|s| {
        IdfError::parse(
            placement.number,
            format!("placement side must be TOP or BOTTOM, found {s}"),
        )
    })?;

    let location = PlacementLocation {
        x_mm: units.to_mm(number(placement, fields[0], "x")?),
        y_mm: units.to_mm(number(placement, fields[1], "y")?),
        offset_mm: units.to_mm(number(placement, fields[2], "mounting offset")?),
        rotation_deg: number(placement, fields[3], "rotation")?,
    };

    Ok(PlacedComponent {
        record: ComponentRecord {
            package_name: package_name.clone(),
            part_name: part_name.clone(),
            instance_name: instance_name.clone(),
            placement: side,
            designator_type: classify_designator(instance_name),
        },
        location,
    })
}
