//! Command grammar: `/cmd --key value --flag ...`.

use std::collections::HashMap;

/// Two-character marker that introduces an option key.
pub const OPTION_MARKER: &str = "--";

/// Value recorded for an option that has no value token.
pub const FLAG_VALUE: &str = "true";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    /// First token, verbatim (includes the leading `/`).
    pub name: String,
    pub options: HashMap<String, String>,
}

impl ParsedCommand {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

/// Split user text into a command name and its options.
///
/// Never fails: blank input yields an empty command. Repeated keys keep the last value.
/// Tokens that are neither option keys nor option values are ignored.
pub fn parse(text: &str) -> ParsedCommand {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let Some((&name, rest)) = tokens.split_first() else {
        return ParsedCommand::default();
    };

    let mut options = HashMap::new();
    let mut i = 0usize;
    while i < rest.len() {
        let Some(key) = rest[i].strip_prefix(OPTION_MARKER) else {
            i += 1;
            continue;
        };

        match rest.get(i + 1) {
            Some(next) if !next.starts_with(OPTION_MARKER) => {
                options.insert(key.to_string(), (*next).to_string());
                i += 2;
            }
            _ => {
                options.insert(key.to_string(), FLAG_VALUE.to_string());
                i += 1;
            }
        }
    }

    ParsedCommand {
        name: name.to_string(),
        options,
    }
}
