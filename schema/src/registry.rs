use serde::Serialize;
use std::collections::HashMap;

use crate::{
    bb::{ByteBuffer, ByteBufferMut},
    error::{DecodeError, EncodeError},
    schema::{Def, DefKind, Param, ResultType, TypeRef},
    value::Value,
};

/// Immutable id/name lookup over every compiled definition.
///
/// A registry is built once and never mutated afterwards, so it can be shared
/// between threads without locking.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Registry {
    layer: Option<u32>,
    defs:  Vec<Def>,
    #[serde(skip)]
    by_id: HashMap<u32, usize>,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
}

impl Registry {
    /// Index `defs`. Definitions are expected to be unique by name and id;
    /// the first occurrence wins otherwise.
    pub fn new(defs: Vec<Def>, layer: Option<u32>) -> Registry {
        let mut by_id = HashMap::with_capacity(defs.len());
        let mut by_name = HashMap::with_capacity(defs.len());
        for (index, def) in defs.iter().enumerate() {
            if let Some(id) = def.id {
                by_id.entry(id).or_insert(index);
            }
            by_name.entry(def.name.clone()).or_insert(index);
        }
        Registry { layer, defs, by_id, by_name }
    }

    /// Schema layer announced by the sources, if any.
    pub fn layer(&self) -> Option<u32> {
        self.layer
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Def> {
        self.defs.iter()
    }

    pub fn lookup_by_id(&self, id: u32) -> Option<&Def> {
        self.by_id.get(&id).map(|&index| &self.defs[index])
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&Def> {
        self.by_name.get(name).map(|&index| &self.defs[index])
    }

    pub fn constructors(&self) -> impl Iterator<Item = &Def> {
        self.defs.iter().filter(|def| def.kind == DefKind::Constructor)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Def> {
        self.defs.iter().filter(|def| def.kind == DefKind::Method)
    }

    /// Constructors whose result is the boxed type `type_name`.
    pub fn constructors_of<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Def> + 'a {
        self.constructors().filter(move |def| def.type_name() == Some(type_name))
    }

    pub fn descriptor(&self, name: &str) -> Option<Descriptor<'_>> {
        self.lookup_by_name(name).map(|def| Descriptor { registry: self, def })
    }

    pub fn descriptor_by_id(&self, id: u32) -> Option<Descriptor<'_>> {
        self.lookup_by_id(id).map(|def| Descriptor { registry: self, def })
    }

    /// Encodes any boxed object, dispatching on its constructor name.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        value.encode(self, &TypeRef::Any)
    }

    /// Decodes any boxed object, dispatching on its leading id.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value, DecodeError> {
        Value::decode(self, &TypeRef::Any, bytes)
    }

    pub fn encode_as(&self, ty: &TypeRef, value: &Value) -> Result<Vec<u8>, EncodeError> {
        value.encode(self, ty)
    }

    pub fn decode_as(&self, ty: &TypeRef, bytes: &[u8]) -> Result<Value, DecodeError> {
        Value::decode(self, ty, bytes)
    }

    /// The concrete result type of `request`.
    ///
    /// Methods such as `invokeWithLayer {X:Type} layer:int query:!X = X` only
    /// know their result once the wrapped query is known: the type is taken
    /// from the field bound to `X`, recursively.
    pub fn result_type(&self, request: &Value) -> Result<TypeRef, EncodeError> {
        let def = self
            .lookup_by_name(request.name())
            .ok_or_else(|| EncodeError::UnknownConstructor(request.name().to_owned()))?;
        match &def.result {
            ResultType::Known(ty) => Ok(ty.clone()),
            ResultType::Generic(generic) => {
                let param = def
                    .params
                    .iter()
                    .find(|p| p.generic_binding() == Some(generic.as_str()))
                    .ok_or_else(|| EncodeError::MissingField {
                        name:  def.name.clone(),
                        field: format!("!{}", generic),
                    })?;
                let inner = request.get(&param.name).ok_or_else(|| EncodeError::MissingField {
                    name:  def.name.clone(),
                    field: param.name.clone(),
                })?;
                self.result_type(inner)
            }
        }
    }

    /// Decodes the response to `request` using its [result type](Registry::result_type).
    pub fn decode_result(&self, request: &Value, bytes: &[u8]) -> Result<Value, DecodeError> {
        let ty = self.result_type(request).map_err(|err| DecodeError::Unsupported {
            offset: 0,
            name:   request.name().to_owned(),
            reason: err.to_string(),
        })?;
        Value::decode(self, &ty, bytes)
    }
}

/// The codec view of one definition: its property schema plus
/// serialize/deserialize in boxed and bare form.
#[derive(Clone, Copy)]
pub struct Descriptor<'r> {
    registry: &'r Registry,
    def:      &'r Def,
}

impl<'r> Descriptor<'r> {
    pub fn def(&self) -> &'r Def {
        self.def
    }

    pub fn name(&self) -> &'r str {
        &self.def.name
    }

    pub fn id(&self) -> Option<u32> {
        self.def.id
    }

    pub fn kind(&self) -> DefKind {
        self.def.kind
    }

    pub fn params(&self) -> &'r [Param] {
        &self.def.params
    }

    /// Writes the id followed by the fields of `instance`.
    pub fn serialize(&self, instance: &Value) -> Result<Vec<u8>, EncodeError> {
        let fields = self.fields_of(instance)?;
        let mut bb = ByteBufferMut::new();
        Value::encode_boxed_bb(self.registry, self.def, fields, &mut bb)?;
        Ok(bb.data())
    }

    /// Writes the fields of `instance` without the leading id.
    pub fn serialize_bare(&self, instance: &Value) -> Result<Vec<u8>, EncodeError> {
        let fields = self.fields_of(instance)?;
        let mut bb = ByteBufferMut::new();
        Value::encode_fields_bb(self.registry, self.def, fields, &mut bb)?;
        Ok(bb.data())
    }

    /// Reads the id, which must be this definition's, then the fields.
    pub fn deserialize(&self, bb: &mut ByteBuffer) -> Result<Value, DecodeError> {
        let offset = bb.index();
        let expected = self.def.id.ok_or_else(|| DecodeError::Unsupported {
            offset,
            name:   self.def.name.clone(),
            reason: "definition has no id".to_owned(),
        })?;
        let found = bb.read_uint()?;
        if found != expected {
            return Err(DecodeError::IdMismatch { offset, expected, found });
        }
        Value::decode_fields_bb(self.registry, self.def, bb)
    }

    pub fn deserialize_bare(&self, bb: &mut ByteBuffer) -> Result<Value, DecodeError> {
        Value::decode_fields_bb(self.registry, self.def, bb)
    }

    fn fields_of<'v>(&self, instance: &'v Value) -> Result<&'v HashMap<String, Value>, EncodeError> {
        match instance {
            Value::Object(name, fields) if *name == self.def.name => Ok(fields),
            Value::Object(name, _) => Err(EncodeError::TypeMismatch {
                expected: self.def.name.clone(),
                found:    name.clone(),
            }),
            other => Err(EncodeError::TypeMismatch {
                expected: self.def.name.clone(),
                found:    other.kind_name().to_owned(),
            }),
        }
    }
}
