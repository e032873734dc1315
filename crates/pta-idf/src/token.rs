//! Quote-aware tokenizer shared by board and library parsing.

use std::sync::LazyLock;

use regex::Regex;

use crate::NOPARTNAME;

// quoted string | unterminated quote | bare word
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]*)"|("[^"]*$)|([^"\s]\S*)"#).expect("token pattern is valid")
});

/// Why a line could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnterminatedQuote {
    pub column: usize,
}

/// Split a line into tokens.
///
/// A token is either a run of non-space characters that does not start with a
/// double quote, or a double-quoted string with the quotes removed. An empty
/// quoted string becomes [`NOPARTNAME`]. Commas are replaced with underscores
/// in every token.
pub fn tokenize(line: &str) -> Result<Vec<String>, UnterminatedQuote> {
    let mut tokens = Vec::new();
    for caps in TOKEN.captures_iter(line) {
        if let Some(quoted) = caps.get(1) {
            if quoted.as_str().is_empty() {
                tokens.push(NOPARTNAME.to_string());
            } else {
                tokens.push(sanitize(quoted.as_str()));
            }
        } else if let Some(open) = caps.get(2) {
            return Err(UnterminatedQuote {
                column: open.start() + 1,
            });
        } else if let Some(bare) = caps.get(3) {
            tokens.push(sanitize(bare.as_str()));
        }
    }
    Ok(tokens)
}

/// Replace every comma with an underscore.
pub fn sanitize(token: &str) -> String {
    token.replace(',', "_")
}
