use regex::Regex;
use lazy_static::lazy_static;
use crate::utils::{quote, error};
use crate::error::TlError;

lazy_static! {
    pub static ref TOKEN_REGEX: Regex = Regex::new(concat!(
        r"(---[a-z]+---",
        r"|//[^\n]*",
        r"|/\*[\s\S]*?\*/",
        r"|#[0-9a-fA-F]+\b",
        r"|#",
        r"|[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*",
        r"|\d+",
        r"|[:;=?!%<>{}\[\]*.,]",
        r"|\s+)",
    )).unwrap();
    pub static ref WHITESPACE_RX: Regex = Regex::new(r"^(//[^\n]*|/\*[\s\S]*\*/|\s+)$").unwrap();
}

#[derive(Debug, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

/// Splits TL source text into tokens, dropping whitespace and comments. The
/// last token is always an empty EOF marker.
pub fn tokenize_schema(text: &str) -> Result<Vec<Token>, TlError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;

    for mat in TOKEN_REGEX.find_iter(text) {
        let start = mat.start();
        let end   = mat.end();
        let part  = mat.as_str();

        if start > last_end {
            let unexpected = &text[last_end..start];
            return Err(error(
                &format!("Syntax error: {}", quote(unexpected)),
                line,
                column,
            ));
        }

        if !WHITESPACE_RX.is_match(part) {
            tokens.push(Token {
                text:   part.to_string(),
                line,
                column,
            });
        }

        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.chars().count() + 1;
            }
        } else {
            column += part.chars().count();
        }

        last_end = end;
    }

    if last_end != text.len() {
        let unexpected = &text[last_end..];
        return Err(error(
            &format!("Syntax error: {}", quote(unexpected)),
            line,
            column,
        ));
    }

    tokens.push(Token {
        text:   "".to_string(),
        line,
        column,
    });
    Ok(tokens)
}
