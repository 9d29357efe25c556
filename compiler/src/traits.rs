use crate::error::TlError;
use brine_tl_schema::Value;

/// Conversion from a decoded [`Value`] into a generated Rust type.
pub trait FromTl: Sized {
    fn from_tl(value: &Value) -> Result<Self, TlError>;
}

/// Looks up a required field of a decoded object.
pub fn required<'a>(value: &'a Value, field: &str) -> Result<&'a Value, TlError> {
    value.get(field).ok_or_else(|| TlError::MissingField(field.to_string()))
}

fn unexpected(expected: &str, found: &Value) -> TlError {
    TlError::UnexpectedValue {
        expected: expected.to_string(),
        found:    found.kind_name().to_string(),
    }
}

macro_rules! from_tl_primitive {
    ($ty:ty, $expected:literal, $pattern:pat => $out:expr) => {
        impl FromTl for $ty {
            fn from_tl(value: &Value) -> Result<Self, TlError> {
                match value {
                    $pattern => Ok($out),
                    other => Err(unexpected($expected, other)),
                }
            }
        }
    };
}

from_tl_primitive!(i32, "int", Value::Int(v) => *v);
from_tl_primitive!(i64, "long", Value::Long(v) => *v);
from_tl_primitive!(f64, "double", Value::Double(v) => *v);
from_tl_primitive!(String, "string", Value::String(v) => v.clone());
from_tl_primitive!(Vec<u8>, "bytes", Value::Bytes(v) => v.clone());
from_tl_primitive!([u8; 16], "int128", Value::Int128(v) => *v);
from_tl_primitive!([u8; 32], "int256", Value::Int256(v) => *v);

impl FromTl for bool {
    fn from_tl(value: &Value) -> Result<Self, TlError> {
        match value {
            Value::Bool(v) => Ok(*v),
            Value::True => Ok(true),
            other => Err(unexpected("Bool", other)),
        }
    }
}

impl FromTl for Value {
    fn from_tl(value: &Value) -> Result<Self, TlError> {
        Ok(value.clone())
    }
}

impl<T: FromTl> FromTl for Vec<T> {
    fn from_tl(value: &Value) -> Result<Self, TlError> {
        match value {
            Value::Vector(items) => items.iter().map(T::from_tl).collect(),
            other => Err(unexpected("Vector", other)),
        }
    }
}

impl<T: FromTl> FromTl for Box<T> {
    fn from_tl(value: &Value) -> Result<Self, TlError> {
        T::from_tl(value).map(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives() {
        assert_eq!(i32::from_tl(&Value::Int(7)).unwrap(), 7);
        assert_eq!(i64::from_tl(&Value::Long(-7)).unwrap(), -7);
        assert_eq!(String::from_tl(&Value::String("hi".into())).unwrap(), "hi");
        assert!(bool::from_tl(&Value::True).unwrap());
        assert!(!bool::from_tl(&Value::Bool(false)).unwrap());
        assert_eq!(Vec::<i32>::from_tl(&Value::Vector(vec![Value::Int(1), Value::Int(2)])).unwrap(), vec![1, 2]);
    }

    #[test]
    fn mismatches() {
        let err = i32::from_tl(&Value::Long(1)).unwrap_err();
        assert!(
            matches!(err, TlError::UnexpectedValue { ref expected, ref found } if expected == "int" && found == "long"),
            "{:?}",
            err
        );

        let object = Value::object("user", [("id", Value::Long(1))]);
        assert!(required(&object, "id").is_ok());
        assert!(matches!(required(&object, "name"), Err(TlError::MissingField(ref f)) if f == "name"));
    }
}
