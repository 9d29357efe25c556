use brine_tl_schema::DefKind;
use serde::Serialize;
use std::fmt;

/// Declarations parsed from one schema source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub source:       String,
    pub layer:        Option<u32>,
    pub declarations: Vec<Declaration>,
}

/// A type expression exactly as written in the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeExpr {
    /// `#`
    Flags,
    /// `!X`
    Placeholder(String),
    /// `Name`, `%Name` or `Name<T, ...>`.
    Named {
        name:        String,
        bare_marker: bool,
        args:        Vec<TypeExpr>,
    },
}

impl TypeExpr {
    pub fn named(name: &str) -> TypeExpr {
        TypeExpr::Named {
            name:        name.to_string(),
            bare_marker: false,
            args:        vec![],
        }
    }

    pub fn is_named(&self, expected: &str) -> bool {
        matches!(self, TypeExpr::Named { name, args, .. } if name == expected && args.is_empty())
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeExpr::Flags => f.write_str("#"),
            TypeExpr::Placeholder(name) => write!(f, "!{}", name),
            TypeExpr::Named { name, bare_marker, args } => {
                if *bare_marker {
                    f.write_str("%")?;
                }
                f.write_str(name)?;
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", args.join(","))?;
                }
                Ok(())
            }
        }
    }
}

/// `flags.N?` prefix of a conditional field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub field: String,
    pub bit:   u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name:      String,
    pub line:      usize,
    pub column:    usize,
    pub type_:     TypeExpr,
    pub condition: Option<Condition>,
}

/// `{X:Type}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generic {
    pub name:   String,
    pub line:   usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub name:     String,
    pub line:     usize,
    pub column:   usize,
    pub id:       Option<u32>,
    pub kind:     DefKind,
    pub generics: Vec<Generic>,
    pub fields:   Vec<Field>,
    pub result:   TypeExpr,
}
