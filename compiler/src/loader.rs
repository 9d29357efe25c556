use crate::error::TlError;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;

lazy_static! {
    static ref COMMENT_RX:    Regex = Regex::new(r"/\*[\s\S]*?\*/|//[^\n]*").unwrap();
    static ref BLANK_LINES:   Regex = Regex::new(r"\n\s*\n").unwrap();
    static ref LAYER_RX:      Regex = Regex::new(r"//\s*LAYER\s+(\d+)").unwrap();
}

/// One named schema text, usually the contents of a `.tl` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSource {
    pub name: String,
    pub text: String,
}

impl SchemaSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        SchemaSource {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, TlError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Ok(SchemaSource::new(path.display().to_string(), text))
    }

    /// The layer number from a `// LAYER N` comment, if present.
    pub fn layer(&self) -> Option<u32> {
        LAYER_RX
            .captures(&self.text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    pub fn stripped(&self) -> String {
        strip_schema(&self.text)
    }
}

/// Removes comments and collapses blank lines. Stripping never changes
/// what the text compiles to, so a `// LAYER N` marker is kept as the first
/// line.
pub fn strip_schema(text: &str) -> String {
    let without_comments = COMMENT_RX.replace_all(text, "");
    let collapsed = BLANK_LINES.replace_all(&without_comments, "\n");
    let body = collapsed.trim();
    match LAYER_RX.captures(text).and_then(|caps| caps.get(1)) {
        Some(layer) => format!("// LAYER {}\n{}", layer.as_str(), body),
        None => body.to_string(),
    }
}
