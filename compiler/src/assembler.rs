use std::collections::HashMap;
use brine_tl_schema::{Def, Registry};
use crate::{emitter::Emitted, error::TlError, utils::quote};
use tracing::debug;

/// Merges emitted definitions from every source into one registry.
///
/// A definition repeated with the same id and signature is kept once. The
/// same id with a different signature is a [`TlError::DuplicateId`], and the
/// same name declared with a different id is a schema error.
pub fn assemble(emitted: Vec<Emitted>, layer: Option<u32>) -> Result<Registry, TlError> {
    let mut defs: Vec<Def> = Vec::with_capacity(emitted.len());
    let mut origins: Vec<String> = Vec::with_capacity(emitted.len());
    let mut by_id: HashMap<u32, usize> = HashMap::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for Emitted { def, origin } in emitted {
        if let Some(&index) = by_name.get(&def.name) {
            let first = &defs[index];
            if first.id == def.id && first.signature == def.signature {
                debug!(name = %def.name, origin = %origin, "skipping repeated definition");
                continue;
            }
            return Err(match (first.id, def.id) {
                (Some(a), Some(b)) if a == b => TlError::DuplicateId {
                    id:     a,
                    first:  origins[index].clone(),
                    second: origin,
                },
                _ => TlError::SchemaError(format!(
                    "The definition {} is declared twice: {} and {}",
                    quote(&def.name),
                    origins[index],
                    origin
                )),
            });
        }

        if let Some(id) = def.id {
            if let Some(&index) = by_id.get(&id) {
                return Err(TlError::DuplicateId {
                    id,
                    first: origins[index].clone(),
                    second: origin,
                });
            }
            by_id.insert(id, defs.len());
        }

        by_name.insert(def.name.clone(), defs.len());
        defs.push(def);
        origins.push(origin);
    }

    debug!(definitions = defs.len(), layer = ?layer, "assembled registry");
    Ok(Registry::new(defs, layer))
}
