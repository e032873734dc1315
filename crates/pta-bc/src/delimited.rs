//! Comma-delimited text, one record per line.
//!
//! Cells are written bare unless they contain a comma, quote or line break, in
//! which case they are double-quoted with inner quotes doubled. The reader
//! accepts the same quoting, so tables re-saved from a spreadsheet load back.

/// Strip a leading UTF-8 byte-order mark.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Non-blank lines with their 1-based line numbers.
pub fn lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    strip_bom(text)
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !l.trim().is_empty())
}

/// Split one record into cells.
pub fn split_record(line: &str) -> Result<Vec<String>, String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;
    let mut at_cell_start = true;

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    cell.push('"');
                    chars.next();
                }
                '"' => quoted = false,
                _ => cell.push(c),
            }
            continue;
        }
        match c {
            '"' if at_cell_start => {
                quoted = true;
                at_cell_start = false;
            }
            ',' => {
                cells.push(std::mem::take(&mut cell));
                at_cell_start = true;
            }
            _ => {
                cell.push(c);
                at_cell_start = false;
            }
        }
    }
    if quoted {
        return Err("unterminated quoted cell".to_string());
    }
    cells.push(cell);
    Ok(cells)
}

fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Join cells into one record.
pub fn join_record<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    cells
        .into_iter()
        .map(|c| quote(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_and_quoted_cells() {
        assert_eq!(split_record("a,b,,c").unwrap(), vec!["a", "b", "", "c"]);
        assert_eq!(
            split_record(r#"YES,"Pkg, big","say ""hi""",x"#).unwrap(),
            vec!["YES", "Pkg, big", r#"say "hi""#, "x"]
        );
        assert!(split_record(r#"a,"b"#).is_err());
    }

    #[test]
    fn join_quotes_only_when_needed() {
        assert_eq!(join_record(["a", "b c", "d,e"]), r#"a,b c,"d,e""#);
        let line = join_record(["x\"y", "z"]);
        assert_eq!(split_record(&line).unwrap(), vec!["x\"y", "z"]);
    }

    #[test]
    fn bom_and_blank_lines() {
        let text = "\u{feff}h1,h2\n\n1,2\n";
        let got: Vec<_> = lines(text).collect();
        assert_eq!(got, vec![(1, "h1,h2"), (3, "1,2")]);
    }
}
