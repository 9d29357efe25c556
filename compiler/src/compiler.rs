use brine_tl_schema::Registry;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::{
    assembler::assemble,
    emitter::emit,
    error::{TlError, ValidationWarning},
    ids::resolve_ids,
    loader::SchemaSource,
    model::build_model,
    parser::parse_schema,
    tokenizer::tokenize_schema,
    types::Schema,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Give declarations without `#id` the checksum of their signature. When
    /// off they stay abstract.
    pub derive_missing_ids: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            derive_missing_ids: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub registry: Registry,
    pub warnings: Vec<ValidationWarning>,
}

/// Tokenize and parse one source.
pub fn parse_source(source: &SchemaSource) -> Result<Schema, TlError> {
    let tokens = tokenize_schema(&source.text)?;
    let declarations = parse_schema(&tokens)?;
    debug!(source = %source.name, tokens = tokens.len(), declarations = declarations.len(), "parsed schema source");
    Ok(Schema {
        source: source.name.clone(),
        layer: source.layer(),
        declarations,
    })
}

/// Compile several sources into one registry. Sources may refer to each
/// other's types; the layer is the highest one any source declares.
pub fn compile_sources(sources: &[SchemaSource], options: &CompileOptions) -> Result<CompileOutput, TlError> {
    let schemas = sources.iter().map(parse_source).collect::<Result<Vec<_>, _>>()?;

    let mut model = build_model(&schemas)?;
    let layer = model.layer;
    debug!(definitions = model.defs.len(), "resolved schema model");

    let warnings = resolve_ids(&mut model, options);
    let registry = assemble(emit(model), layer)?;

    info!(
        definitions = registry.len(),
        layer = ?registry.layer(),
        warnings = warnings.len(),
        "compiled schema"
    );
    Ok(CompileOutput { registry, warnings })
}

/// Compile a single schema text with default options.
pub fn compile_schema(text: &str) -> Result<CompileOutput, TlError> {
    compile_sources(&[SchemaSource::new("<schema>", text)], &CompileOptions::default())
}
