use crate::{
    compiler::CompileOptions,
    error::ValidationWarning,
    model::Model,
    types::{Declaration, TypeExpr},
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

lazy_static! {
    static ref FLAGS_FIELD: Regex = Regex::new(r"^flags\d*$").unwrap();
}

/// The normalized form of a declaration that its constructor id is the
/// CRC-32 of: `name X:Type a:int b:flags.0?string = Vector User`.
///
/// Generic braces and angle brackets are dropped, top level `bytes` is
/// written as `string` and `true` fields gated by a `flags`, `flags2`, ...
/// field are left out entirely.
pub fn canonical_signature(decl: &Declaration) -> String {
    let mut parts = vec![decl.name.clone()];

    for generic in &decl.generics {
        parts.push(format!("{}:Type", generic.name));
    }

    for field in &decl.fields {
        let gated_by_flags = field.condition.as_ref().map_or(false, |c| FLAGS_FIELD.is_match(&c.field));
        if gated_by_flags && field.type_.is_named("true") {
            continue;
        }
        let condition = field
            .condition
            .as_ref()
            .map(|c| format!("{}.{}?", c.field, c.bit))
            .unwrap_or_default();
        let ty = match &field.type_ {
            ty if ty.is_named("bytes") => "string".to_string(),
            ty => flatten_type(ty),
        };
        parts.push(format!("{}:{}{}", field.name, condition, ty));
    }

    parts.push("=".to_string());
    parts.push(flatten_type(&decl.result));
    parts.join(" ")
}

fn flatten_type(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Named { name, bare_marker, args } => {
            let mut out = String::new();
            if *bare_marker {
                out.push('%');
            }
            out.push_str(name);
            for arg in args {
                out.push(' ');
                out.push_str(&flatten_type(arg));
            }
            out
        }
        other => other.to_string(),
    }
}

pub fn signature_id(signature: &str) -> u32 {
    crc32fast::hash(signature.as_bytes())
}

/// Computes the signature of every definition, checks declared ids against
/// it and fills in missing ids. A mismatch keeps the declared id and is
/// returned as a warning.
pub fn resolve_ids(model: &mut Model, options: &CompileOptions) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for entry in &mut model.defs {
        let signature = canonical_signature(&entry.decl);
        let computed = signature_id(&signature);

        match entry.def.id {
            Some(declared) if declared != computed => {
                warn!(
                    name = %entry.def.name,
                    declared = %format!("{:08x}", declared),
                    computed = %format!("{:08x}", computed),
                    "declared constructor id does not match its signature"
                );
                warnings.push(ValidationWarning {
                    name: entry.def.name.clone(),
                    declared,
                    computed,
                });
            }
            Some(_) => {}
            None if options.derive_missing_ids => {
                debug!(name = %entry.def.name, id = %format!("{:08x}", computed), "derived constructor id");
                entry.def.id = Some(computed);
            }
            None => {
                debug!(name = %entry.def.name, "no constructor id, keeping definition abstract");
            }
        }

        entry.def.signature = signature;
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::parse_schema, tokenizer::tokenize_schema};

    fn decl(text: &str) -> Declaration {
        parse_schema(&tokenize_schema(text).unwrap()).unwrap().remove(0)
    }

    fn id_of(text: &str) -> u32 {
        signature_id(&canonical_signature(&decl(text)))
    }

    #[test]
    fn known_ids() {
        assert_eq!(id_of("boolFalse = Bool;"), 0xbc799737);
        assert_eq!(id_of("boolTrue = Bool;"), 0x997275b5);
        assert_eq!(id_of("true = True;"), 0x3fedd339);
        assert_eq!(id_of("error code:int text:string = Error;"), 0xc4b9f9bb);
    }

    #[test]
    fn signature_normalization() {
        assert_eq!(
            canonical_signature(&decl("user#abcdef12 flags:# self:flags.10?true id:long first_name:flags.0?string = User;")),
            "user flags:# id:long first_name:flags.0?string = User"
        );
        assert_eq!(
            canonical_signature(&decl("---functions---\ninvokeWithLayer#da9b0d0d {X:Type} layer:int query:!X = X;")),
            "invokeWithLayer X:Type layer:int query:!X = X"
        );
        assert_eq!(
            canonical_signature(&decl("a pq:bytes opt:flags.1?bytes list:Vector<bytes> m:vector<%Message> = Vector<A>;")),
            "a pq:string opt:flags.1?string list:Vector bytes m:vector %Message = Vector A"
        );
    }

    #[test]
    fn only_flags_fields_drop_true() {
        assert_eq!(
            canonical_signature(&decl("a flags2:# quiet:flags2.3?true = A;")),
            "a flags2:# = A"
        );
        assert_eq!(
            canonical_signature(&decl("a mode:# quiet:mode.0?true = A;")),
            "a mode:# quiet:mode.0?true = A"
        );
    }

    #[test]
    fn the_id_ignores_the_declared_id() {
        assert_eq!(id_of("boolTrue#00000000 = Bool;"), id_of("boolTrue = Bool;"));
    }

    #[test]
    fn bytes_and_string_share_an_id() {
        assert_eq!(id_of("a data:bytes = A;"), id_of("a data:string = A;"));
    }
}
