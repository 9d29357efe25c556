use std::collections::{HashMap, HashSet};
use brine_tl_schema::{Def, DefKind, FlagBit, Param, Primitive, ResultType, TypeRef};
use crate::{
    types::{Declaration, Schema, TypeExpr},
    utils::quote,
    error::TlError,
};

/// A resolved definition together with the declaration it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDef {
    pub def:    Def,
    pub decl:   Declaration,
    pub source: String,
}

impl ModelDef {
    /// `name (source:line:column)`, used in diagnostics.
    pub fn origin(&self) -> String {
        format!("{} ({}:{}:{})", self.def.name, self.source, self.decl.line, self.decl.column)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    pub layer: Option<u32>,
    pub defs:  Vec<ModelDef>,
}

/// Names visible to every declaration across all sources.
#[derive(Default)]
struct SymbolTable<'a> {
    /// Boxed type name to the constructors producing it, in declaration order.
    types:        HashMap<&'a str, Vec<&'a str>>,
    constructors: HashSet<&'a str>,
}

impl<'a> SymbolTable<'a> {
    fn collect(schemas: &'a [Schema]) -> Result<SymbolTable<'a>, TlError> {
        let mut table = SymbolTable::default();
        for schema in schemas {
            for decl in schema.declarations.iter().filter(|d| d.kind == DefKind::Constructor) {
                let type_name = match &decl.result {
                    TypeExpr::Named { name, bare_marker: false, args } if args.is_empty() => name.as_str(),
                    other => {
                        return Err(TlError::SchemaError(format!(
                            "Constructor {} at {}:{}:{} must produce a plain boxed type, not {}",
                            quote(&decl.name),
                            schema.source,
                            decl.line,
                            decl.column,
                            quote(&other.to_string())
                        )))
                    }
                };
                let ctors = table.types.entry(type_name).or_default();
                if !ctors.contains(&decl.name.as_str()) {
                    ctors.push(&decl.name);
                }
                table.constructors.insert(&decl.name);
            }
        }
        Ok(table)
    }
}

enum Position {
    Param,
    Nested,
    Result,
}

struct Context<'a> {
    symbols:  &'a SymbolTable<'a>,
    generics: &'a [String],
    decl:     &'a Declaration,
    source:   &'a str,
}

impl Context<'_> {
    fn error(&self, what: &str, msg: String) -> TlError {
        TlError::SchemaError(format!(
            "{} in {} of {} at {}:{}:{}",
            msg,
            what,
            quote(&self.decl.name),
            self.source,
            self.decl.line,
            self.decl.column
        ))
    }

    fn resolve(&self, expr: &TypeExpr, position: Position, what: &str) -> Result<TypeRef, TlError> {
        match expr {
            TypeExpr::Flags => match position {
                Position::Param => Ok(TypeRef::Primitive(Primitive::Flags)),
                _ => Err(self.error(what, "\"#\" is only valid as a parameter type".to_string())),
            },

            TypeExpr::Placeholder(name) => {
                if self.generics.contains(name) {
                    Ok(TypeRef::Placeholder(name.clone()))
                } else {
                    Err(self.error(what, format!("Generic {} is not declared with {{{}:Type}}", quote(name), name)))
                }
            }

            TypeExpr::Named { name, bare_marker, args } => {
                if name == "Vector" || name == "vector" {
                    let element = match args.as_slice() {
                        [element] => self.resolve(element, Position::Nested, what)?,
                        _ => {
                            return Err(self.error(
                                what,
                                format!("{} expects exactly one type argument, found {}", name, args.len()),
                            ))
                        }
                    };
                    return Ok(TypeRef::Vector {
                        element: Box::new(element),
                        bare:    name == "vector",
                    });
                }

                if !args.is_empty() {
                    return Err(self.error(what, format!("The type {} does not take type arguments", quote(name))));
                }

                if *bare_marker {
                    return self.resolve_bare(name, what);
                }

                if let Some(primitive) = Primitive::from_name(name) {
                    return Ok(TypeRef::Primitive(primitive));
                }
                if name == "Object" {
                    return Ok(TypeRef::Any);
                }
                if self.generics.contains(name) {
                    return Ok(TypeRef::Placeholder(name.clone()));
                }
                if self.symbols.types.contains_key(name.as_str()) {
                    return Ok(TypeRef::Named { name: name.clone(), bare: false });
                }
                if self.symbols.constructors.contains(name.as_str()) {
                    return Ok(TypeRef::Named { name: name.clone(), bare: true });
                }

                Err(self.error(what, format!("The type {} is not defined", quote(name))))
            }
        }
    }

    /// `%T` names the single constructor of boxed type `T`.
    fn resolve_bare(&self, name: &str, what: &str) -> Result<TypeRef, TlError> {
        if let Some(ctors) = self.symbols.types.get(name) {
            return match ctors.as_slice() {
                [ctor] => Ok(TypeRef::Named { name: ctor.to_string(), bare: true }),
                _ => Err(self.error(
                    what,
                    format!(
                        "%{} is ambiguous: the type has {} constructors ({})",
                        name,
                        ctors.len(),
                        ctors.join(", ")
                    ),
                )),
            };
        }
        if self.symbols.constructors.contains(name) {
            return Ok(TypeRef::Named { name: name.to_string(), bare: true });
        }
        match Primitive::from_name(name) {
            Some(primitive) if primitive != Primitive::Flags => Ok(TypeRef::Primitive(primitive)),
            _ => Err(self.error(what, format!("The type {} is not defined", quote(name)))),
        }
    }

    fn build(&self) -> Result<Def, TlError> {
        let decl = self.decl;
        let mut params: Vec<Param> = Vec::with_capacity(decl.fields.len());

        for field in &decl.fields {
            let what = format!("parameter {}", quote(&field.name));

            if params.iter().any(|p| p.name == field.name) {
                return Err(self.error(&what, "Duplicate parameter name".to_string()));
            }

            let ty = self.resolve(&field.type_, Position::Param, &what)?;

            let flag = match &field.condition {
                Some(condition) => {
                    match params.iter().find(|p| p.name == condition.field) {
                        Some(target) if target.is_flags() => {}
                        Some(_) => {
                            return Err(self.error(
                                &what,
                                format!("Field {} is not of type \"#\"", quote(&condition.field)),
                            ))
                        }
                        None => {
                            return Err(self.error(
                                &what,
                                format!("Flags field {} must be declared before it is used", quote(&condition.field)),
                            ))
                        }
                    }
                    if ty == TypeRef::Primitive(Primitive::Flags) {
                        return Err(self.error(&what, "A flags field cannot itself be conditional".to_string()));
                    }
                    Some(FlagBit {
                        field: condition.field.clone(),
                        bit:   condition.bit,
                    })
                }
                None => None,
            };

            params.push(Param {
                name: field.name.clone(),
                ty,
                flag,
            });
        }

        let result = match (&decl.kind, &decl.result) {
            (DefKind::Method, TypeExpr::Placeholder(name)) if self.generics.contains(name) => {
                ResultType::Generic(name.clone())
            }
            (DefKind::Method, TypeExpr::Named { name, bare_marker: false, args })
                if args.is_empty() && self.generics.contains(name) =>
            {
                ResultType::Generic(name.clone())
            }
            (DefKind::Constructor, TypeExpr::Named { name, .. }) => {
                ResultType::Known(TypeRef::Named { name: name.clone(), bare: false })
            }
            (_, expr) => ResultType::Known(self.resolve(expr, Position::Result, "result type")?),
        };

        Ok(Def {
            name: decl.name.clone(),
            id: decl.id,
            kind: decl.kind,
            params,
            result,
            generics: self.generics.to_vec(),
            signature: String::new(),
        })
    }
}

/// Resolves every declaration of every source against a symbol table built
/// from all of them, so declarations may refer to types declared later or in
/// another source.
pub fn build_model(schemas: &[Schema]) -> Result<Model, TlError> {
    let symbols = SymbolTable::collect(schemas)?;
    let mut defs = Vec::new();

    for schema in schemas {
        for decl in &schema.declarations {
            let generics: Vec<String> = decl.generics.iter().map(|g| g.name.clone()).collect();
            let context = Context {
                symbols:  &symbols,
                generics: &generics,
                decl,
                source:   &schema.source,
            };
            defs.push(ModelDef {
                def:    context.build()?,
                decl:   decl.clone(),
                source: schema.source.clone(),
            });
        }
    }

    Ok(Model {
        layer: schemas.iter().filter_map(|s| s.layer).max(),
        defs,
    })
}
