use serde::Serialize;
use std::fmt;

/// Whether a definition constructs a value or names an RPC method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefKind {
    Constructor,
    Method,
}

/// Built-in TL types with a fixed wire layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Int,
    Long,
    Double,
    String,
    Bytes,
    /// Boxed boolean, written as `boolTrue` / `boolFalse`.
    Bool,
    /// Zero-width presence marker, normally behind a flag bit.
    True,
    Int128,
    Int256,
    /// The `#` type: a 32-bit flags word derived from the fields it gates.
    Flags,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Primitive> {
        Some(match name {
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "double" => Primitive::Double,
            "string" => Primitive::String,
            "bytes" => Primitive::Bytes,
            "Bool" => Primitive::Bool,
            "true" => Primitive::True,
            "int128" => Primitive::Int128,
            "int256" => Primitive::Int256,
            "#" => Primitive::Flags,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Double => "double",
            Primitive::String => "string",
            Primitive::Bytes => "bytes",
            Primitive::Bool => "Bool",
            Primitive::True => "true",
            Primitive::Int128 => "int128",
            Primitive::Int256 => "int256",
            Primitive::Flags => "#",
        }
    }
}

/// A resolved type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum TypeRef {
    Primitive(Primitive),
    /// `Vector<T>` when boxed, `vector<T>` when bare.
    Vector { element: Box<TypeRef>, bare: bool },
    /// A boxed polymorphic type (`User`) when `bare` is false, otherwise a
    /// single bare constructor (`user`, `%User`).
    Named { name: String, bare: bool },
    /// A generic parameter introduced by `{X:Type}`.
    Placeholder(String),
    /// The built-in `Object` type: any boxed definition.
    Any,
}

impl TypeRef {
    pub fn is_vector(&self) -> bool {
        matches!(self, TypeRef::Vector { .. })
    }

    /// True when the value is written without a leading constructor id.
    pub fn is_bare(&self) -> bool {
        match self {
            TypeRef::Primitive(p) => *p != Primitive::Bool,
            TypeRef::Vector { bare, .. } | TypeRef::Named { bare, .. } => *bare,
            TypeRef::Placeholder(_) | TypeRef::Any => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => f.write_str(p.name()),
            TypeRef::Vector { element, bare } => {
                write!(f, "{}<{}>", if *bare { "vector" } else { "Vector" }, element)
            }
            TypeRef::Named { name, bare: true } if name.starts_with(char::is_uppercase) => {
                write!(f, "%{}", name)
            }
            TypeRef::Named { name, .. } => f.write_str(name),
            TypeRef::Placeholder(name) => write!(f, "!{}", name),
            TypeRef::Any => f.write_str("Object"),
        }
    }
}

/// The result of a definition.
///
/// `Generic` is only known once a concrete request is supplied; see
/// [`Registry::result_type`](crate::Registry::result_type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "type", rename_all = "lowercase")]
pub enum ResultType {
    Known(TypeRef),
    Generic(String),
}

/// Binds an optional parameter to one bit of an earlier `#` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FlagBit {
    pub field: String,
    pub bit:   u8,
}

impl FlagBit {
    pub fn mask(&self) -> u32 {
        1u32 << self.bit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty:   TypeRef,
    pub flag: Option<FlagBit>,
}

impl Param {
    pub fn is_vector(&self) -> bool {
        self.ty.is_vector()
    }

    pub fn is_bare(&self) -> bool {
        self.ty.is_bare()
    }

    pub fn is_flags(&self) -> bool {
        self.ty == TypeRef::Primitive(Primitive::Flags)
    }

    /// The generic parameter this field is bound to, if any.
    pub fn generic_binding(&self) -> Option<&str> {
        match &self.ty {
            TypeRef::Placeholder(name) => Some(name),
            _ => None,
        }
    }
}

/// One compiled constructor or method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Def {
    /// Full name including the namespace, e.g. `auth.sentCode`.
    pub name:      String,
    pub id:        Option<u32>,
    pub kind:      DefKind,
    pub params:    Vec<Param>,
    pub result:    ResultType,
    pub generics:  Vec<String>,
    /// Normalized signature the id checksum is computed over.
    pub signature: String,
}

impl Def {
    pub fn namespace(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(ns, _)| ns)
    }

    pub fn short_name(&self) -> &str {
        self.name.rsplit_once('.').map_or(self.name.as_str(), |(_, n)| n)
    }

    pub fn is_abstract(&self) -> bool {
        self.id.is_none()
    }

    /// Name of the boxed type a constructor belongs to.
    pub fn type_name(&self) -> Option<&str> {
        match (&self.kind, &self.result) {
            (DefKind::Constructor, ResultType::Known(TypeRef::Named { name, .. })) => Some(name),
            _ => None,
        }
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Parameters gated by the flags parameter `flags`.
    pub fn flagged_by<'a>(&'a self, flags: &'a str) -> impl Iterator<Item = &'a Param> + 'a {
        self.params
            .iter()
            .filter(move |p| p.flag.as_ref().is_some_and(|f| f.field == flags))
    }
}
