use crate::{
    bb::{ByteBuffer, ByteBufferMut},
    error::{DecodeError, EncodeError},
    registry::Registry,
    schema::{Def, FlagBit, Primitive, TypeRef},
    VECTOR_ID,
};

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

/// How many objects deep a decoded value may nest before decoding gives up.
pub const MAX_DECODE_DEPTH: usize = 256;

/// This type holds dynamic TL data.
///
/// Values can represent anything in a TL schema and can be converted to and
/// from byte arrays using the corresponding [Registry](struct.Registry.html).
/// An object only stores the fields that are present: optional fields that
/// are absent are missing from the map, and flags words are never stored at
/// all since they are derived from the optional fields while encoding.
#[derive(Clone, PartialEq, Serialize)]
pub enum Value {
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Bool(bool),
    True,
    Int128([u8; 16]),
    Int256([u8; 32]),
    Vector(Vec<Value>),
    Object(String, HashMap<String, Value>),
}

impl Value {
    /// Builds an [Object](#variant.Object) from a constructor name and its
    /// present fields.
    pub fn object<I, K>(name: impl Into<String>, fields: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(
            name.into(),
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )
    }

    /// Returns `0` for other value kinds.
    pub fn as_int(&self) -> i32 {
        match *self {
            Value::Int(value) => value,
            _ => 0,
        }
    }

    /// Returns `0` for other value kinds.
    pub fn as_long(&self) -> i64 {
        match *self {
            Value::Long(value) => value,
            _ => 0,
        }
    }

    /// Returns `0.0` for other value kinds.
    pub fn as_double(&self) -> f64 {
        match *self {
            Value::Double(value) => value,
            _ => 0.0,
        }
    }

    /// Returns `false` for other value kinds. [True](#variant.True) counts
    /// as `true`.
    pub fn as_bool(&self) -> bool {
        match *self {
            Value::Bool(value) => value,
            Value::True => true,
            _ => false,
        }
    }

    /// Returns `""` for other value kinds.
    pub fn as_string(&self) -> &str {
        match *self {
            Value::String(ref value) => value.as_str(),
            _ => "",
        }
    }

    /// Returns an empty slice for other value kinds.
    pub fn as_bytes(&self) -> &[u8] {
        match *self {
            Value::Bytes(ref value) => value.as_slice(),
            Value::String(ref value) => value.as_bytes(),
            _ => &[],
        }
    }

    /// Returns an empty slice for other value kinds.
    pub fn as_vector(&self) -> &[Value] {
        match *self {
            Value::Vector(ref values) => values.as_slice(),
            _ => &[],
        }
    }

    /// The constructor name of an [Object](#variant.Object), `""` otherwise.
    pub fn name(&self) -> &str {
        match *self {
            Value::Object(ref name, _) => name.as_str(),
            _ => "",
        }
    }

    /// Short description of the value kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match *self {
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Bool(_) => "Bool",
            Value::True => "true",
            Value::Int128(_) => "int128",
            Value::Int256(_) => "int256",
            Value::Vector(_) => "vector",
            Value::Object(..) => "object",
        }
    }

    pub fn len(&self) -> usize {
        match *self {
            Value::Vector(ref values) => values.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends to a [Vector](#variant.Vector). Does nothing for other kinds.
    pub fn push(&mut self, value: Value) {
        if let Value::Vector(ref mut values) = *self {
            values.push(value);
        }
    }

    /// A convenience method to extract a field out of an [Object](#variant.Object).
    /// Returns `None` for other value kinds or if the field isn't present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match *self {
            Value::Object(_, ref fields) => fields.get(name),
            _ => None,
        }
    }

    /// A convenience method to update a field on an [Object](#variant.Object).
    /// Does nothing for other value kinds.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        if let Value::Object(_, ref mut fields) = *self {
            fields.insert(name.into(), value);
        }
    }

    /// A convenience method to remove a field on an [Object](#variant.Object).
    /// Does nothing for other value kinds.
    pub fn remove(&mut self, name: &str) {
        if let Value::Object(_, ref mut fields) = *self {
            fields.remove(name);
        }
    }

    /// Decodes a value of type `ty` from `bytes`.
    pub fn decode(registry: &Registry, ty: &TypeRef, bytes: &[u8]) -> Result<Value, DecodeError> {
        Value::decode_bb(registry, ty, &mut ByteBuffer::new(bytes))
    }

    /// Encodes this value as type `ty`.
    pub fn encode(&self, registry: &Registry, ty: &TypeRef) -> Result<Vec<u8>, EncodeError> {
        let mut bb = ByteBufferMut::new();
        self.encode_bb(registry, ty, &mut bb)?;
        Ok(bb.data())
    }

    /// Decodes a value of type `ty` from `bb` starting at the current index.
    /// After this function returns successfully, the index has been advanced
    /// past the value. On error the value is discarded as a whole.
    pub fn decode_bb(
        registry: &Registry,
        ty: &TypeRef,
        bb: &mut ByteBuffer,
    ) -> Result<Value, DecodeError> {
        Value::decode_nested(registry, ty, bb, 0)
    }

    /// Decodes the parameters of `def` (the bare body of a constructor).
    /// Flags words are read first and only the fields whose bit is set are
    /// read after them; absent fields stay absent.
    pub fn decode_fields_bb(
        registry: &Registry,
        def: &Def,
        bb: &mut ByteBuffer,
    ) -> Result<Value, DecodeError> {
        Value::decode_fields_nested(registry, def, bb, 0)
    }

    fn decode_nested(
        registry: &Registry,
        ty: &TypeRef,
        bb: &mut ByteBuffer,
        depth: usize,
    ) -> Result<Value, DecodeError> {
        match ty {
            TypeRef::Primitive(primitive) => Ok(match primitive {
                Primitive::Int | Primitive::Flags => Value::Int(bb.read_int()?),
                Primitive::Long => Value::Long(bb.read_long()?),
                Primitive::Double => Value::Double(bb.read_double()?),
                Primitive::String => Value::String(bb.read_string()?.into_owned()),
                Primitive::Bytes => Value::Bytes(bb.read_bytes()?.to_vec()),
                Primitive::Bool => Value::Bool(bb.read_bool()?),
                Primitive::True => Value::True,
                Primitive::Int128 => Value::Int128(bb.read_int128()?),
                Primitive::Int256 => Value::Int256(bb.read_int256()?),
            }),

            TypeRef::Vector { element, bare } => {
                if !bare {
                    expect_id(bb, VECTOR_ID)?;
                }
                let offset = bb.index();
                let len = bb.read_int()?;
                if len < 0 {
                    return Err(DecodeError::NegativeLength { offset, len });
                }
                let mut values = Vec::with_capacity((len as usize).min(bb.remaining()));
                for _ in 0..len {
                    values.push(Value::decode_nested(registry, element, bb, depth)?);
                }
                Ok(Value::Vector(values))
            }

            TypeRef::Named { name, bare: true } => {
                let def = registry.lookup_by_name(name).ok_or_else(|| DecodeError::Unsupported {
                    offset: bb.index(),
                    name:   name.clone(),
                    reason: "bare constructor is not in the registry".to_owned(),
                })?;
                Value::decode_fields_nested(registry, def, bb, depth)
            }

            TypeRef::Named { name, bare: false } => {
                let (offset, def) = read_boxed_def(registry, bb)?;
                if def.type_name() != Some(name.as_str()) {
                    return Err(DecodeError::TypeMismatch {
                        offset,
                        expected: name.clone(),
                        found:    def.name.clone(),
                    });
                }
                Value::decode_fields_nested(registry, def, bb, depth)
            }

            TypeRef::Placeholder(_) | TypeRef::Any => {
                let (_, def) = read_boxed_def(registry, bb)?;
                Value::decode_fields_nested(registry, def, bb, depth)
            }
        }
    }

    fn decode_fields_nested(
        registry: &Registry,
        def: &Def,
        bb: &mut ByteBuffer,
        depth: usize,
    ) -> Result<Value, DecodeError> {
        if depth >= MAX_DECODE_DEPTH {
            return Err(DecodeError::TooDeep { offset: bb.index(), limit: MAX_DECODE_DEPTH });
        }

        let mut flags: HashMap<&str, u32> = HashMap::new();
        let mut fields = HashMap::with_capacity(def.params.len());

        for param in &def.params {
            if param.is_flags() {
                flags.insert(param.name.as_str(), bb.read_uint()?);
                continue;
            }
            if let Some(flag) = &param.flag {
                let bits = flags.get(flag.field.as_str()).copied().unwrap_or(0);
                if bits & flag.mask() == 0 {
                    continue;
                }
            }
            fields.insert(param.name.clone(), Value::decode_nested(registry, &param.ty, bb, depth + 1)?);
        }

        Ok(Value::Object(def.name.clone(), fields))
    }

    /// Encodes the current value as type `ty` to the end of `bb`.
    pub fn encode_bb(
        &self,
        registry: &Registry,
        ty: &TypeRef,
        bb: &mut ByteBufferMut,
    ) -> Result<(), EncodeError> {
        match (ty, self) {
            (TypeRef::Primitive(Primitive::Int), Value::Int(value)) => bb.write_int(*value),
            (TypeRef::Primitive(Primitive::Long), Value::Long(value)) => bb.write_long(*value),
            (TypeRef::Primitive(Primitive::Double), Value::Double(value)) => bb.write_double(*value),
            (TypeRef::Primitive(Primitive::String), Value::String(value)) => bb.write_string(value)?,
            (TypeRef::Primitive(Primitive::Bytes), Value::Bytes(value)) => bb.write_bytes(value)?,
            (TypeRef::Primitive(Primitive::Bool), Value::Bool(value)) => bb.write_bool(*value),
            (TypeRef::Primitive(Primitive::True), Value::True) => {}
            (TypeRef::Primitive(Primitive::Int128), Value::Int128(value)) => bb.write_raw(value),
            (TypeRef::Primitive(Primitive::Int256), Value::Int256(value)) => bb.write_raw(value),

            (TypeRef::Vector { element, bare }, Value::Vector(values)) => {
                if !bare {
                    bb.write_uint(VECTOR_ID);
                }
                bb.write_int(values.len() as i32);
                for value in values {
                    value.encode_bb(registry, element, bb)?;
                }
            }

            (TypeRef::Named { name, bare }, Value::Object(ctor, fields)) => {
                let def = lookup(registry, ctor)?;
                if *bare {
                    if def.name != *name {
                        return Err(mismatch(ty, self));
                    }
                    Value::encode_fields_bb(registry, def, fields, bb)?;
                } else {
                    if def.type_name() != Some(name.as_str()) {
                        return Err(mismatch(ty, self));
                    }
                    Value::encode_boxed_bb(registry, def, fields, bb)?;
                }
            }

            (TypeRef::Placeholder(_) | TypeRef::Any, Value::Object(ctor, fields)) => {
                let def = lookup(registry, ctor)?;
                Value::encode_boxed_bb(registry, def, fields, bb)?;
            }

            _ => return Err(mismatch(ty, self)),
        }
        Ok(())
    }

    /// Writes the id of `def` followed by its fields.
    pub fn encode_boxed_bb(
        registry: &Registry,
        def: &Def,
        fields: &HashMap<String, Value>,
        bb: &mut ByteBufferMut,
    ) -> Result<(), EncodeError> {
        let id = def.id.ok_or_else(|| EncodeError::Abstract(def.name.clone()))?;
        bb.write_uint(id);
        Value::encode_fields_bb(registry, def, fields, bb)
    }

    /// Writes the parameters of `def` in declared order. Each flags word is
    /// recomputed from the optional fields present in `fields`; a value stored
    /// under the flags parameter's own name is ignored. Once a bit is set every
    /// non-`true` field sharing it has to be present.
    pub fn encode_fields_bb(
        registry: &Registry,
        def: &Def,
        fields: &HashMap<String, Value>,
        bb: &mut ByteBufferMut,
    ) -> Result<(), EncodeError> {
        for param in &def.params {
            if param.is_flags() {
                bb.write_uint(flags_for(def, &param.name, fields));
                continue;
            }
            match (fields.get(&param.name), &param.flag) {
                (Some(value), _) => value.encode_bb(registry, &param.ty, bb)?,
                (None, Some(flag)) => {
                    let bit_set = (flags_for(def, &flag.field, fields) & flag.mask()) != 0;
                    if bit_set && !matches!(param.ty, TypeRef::Primitive(Primitive::True)) {
                        return Err(EncodeError::MissingField {
                            name:  def.name.clone(),
                            field: param.name.clone(),
                        });
                    }
                }
                (None, None) => {
                    return Err(EncodeError::MissingField {
                        name:  def.name.clone(),
                        field: param.name.clone(),
                    })
                }
            }
        }
        Ok(())
    }
}

/// The flags word for parameter `flags` of `def`: the OR of the bits of every
/// gated field present in `fields`.
pub fn flags_for(def: &Def, flags: &str, fields: &HashMap<String, Value>) -> u32 {
    def.flagged_by(flags)
        .filter(|p| fields.contains_key(&p.name))
        .filter_map(|p| p.flag.as_ref().map(FlagBit::mask))
        .fold(0, |acc, mask| acc | mask)
}

fn lookup<'r>(registry: &'r Registry, ctor: &str) -> Result<&'r Def, EncodeError> {
    registry
        .lookup_by_name(ctor)
        .ok_or_else(|| EncodeError::UnknownConstructor(ctor.to_owned()))
}

fn mismatch(ty: &TypeRef, value: &Value) -> EncodeError {
    let found = match value {
        Value::Object(name, _) => name.clone(),
        other => other.kind_name().to_owned(),
    };
    EncodeError::TypeMismatch { expected: ty.to_string(), found }
}

fn expect_id(bb: &mut ByteBuffer, expected: u32) -> Result<(), DecodeError> {
    let offset = bb.index();
    let found = bb.read_uint()?;
    if found != expected {
        return Err(DecodeError::IdMismatch { offset, expected, found });
    }
    Ok(())
}

fn read_boxed_def<'r>(
    registry: &'r Registry,
    bb: &mut ByteBuffer,
) -> Result<(usize, &'r Def), DecodeError> {
    let offset = bb.index();
    let id = bb.read_uint()?;
    let def = registry
        .lookup_by_id(id)
        .ok_or(DecodeError::UnknownId { offset, id })?;
    Ok((offset, def))
}

impl Index<usize> for Value {
    type Output = Value;

    /// A convenience method that adds support for `self[index]` expressions.
    /// It will panic if this value isn't a [Vector](#variant.Vector) or if the
    /// provided index is out of bounds.
    fn index(&self, index: usize) -> &Value {
        match *self {
            Value::Vector(ref values) => &values[index],
            _ => panic!("cannot index a non-vector value"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match *self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Long(value) => write!(f, "{}L", value),
            Value::Double(value) => write!(f, "{:?}", value),
            Value::String(ref value) => write!(f, "{:?}", value),
            Value::Bytes(ref value) => write!(f, "b{:?}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::True => f.write_str("true"),
            Value::Int128(ref value) => write!(f, "int128{:?}", value),
            Value::Int256(ref value) => write!(f, "int256{:?}", value),
            Value::Vector(ref values) => f.debug_list().entries(values).finish(),

            Value::Object(ref name, ref fields) => {
                let mut keys: Vec<_> = fields.keys().collect();
                let mut first = true;
                keys.sort();
                write!(f, "{} {{", name)?;

                for key in keys {
                    if first {
                        first = false;
                    } else {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {:?}", key, fields[key])?;
                }

                write!(f, "}}")
            }
        }
    }
}
