use crate::error::TlError;

pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn error(msg: &str, line: usize, column: usize) -> TlError {
    TlError::ParseError {
        msg: msg.to_string(),
        line,
        column,
    }
}
