use brine_tl_schema::Def;
use crate::model::Model;
use tracing::debug;

/// A runtime definition and where it was declared.
#[derive(Debug, Clone, PartialEq)]
pub struct Emitted {
    pub def:    Def,
    pub origin: String,
}

/// Turns the resolved model into runtime definitions, keeping declaration
/// order. Definitions still without an id are emitted as abstract: the
/// registry knows them by name but refuses to serialize them.
pub fn emit(model: Model) -> Vec<Emitted> {
    let mut out = Vec::with_capacity(model.defs.len());
    let mut abstract_count = 0;

    for entry in model.defs {
        let origin = entry.origin();
        let def = entry.def;

        if def.is_abstract() {
            abstract_count += 1;
        }

        debug!(
            name = %def.name,
            id = ?def.id.map(|id| format!("{:08x}", id)),
            params = def.params.len(),
            "emitted definition"
        );
        out.push(Emitted { def, origin });
    }

    debug!(definitions = out.len(), abstract_count, "emitted schema");
    out
}
