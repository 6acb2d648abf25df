//! Conversions between Rust field types and [`Value`], used by `#[derive(CqlUdt)]`.

use std::net::IpAddr;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{CqlError, Result};

use super::value::{CqlDuration, CqlVector, UdtValue, Value, Varint};

/// A Rust type that can be written as a CQL value.
pub trait ToCqlValue {
    fn to_cql_value(&self) -> Value;
}

/// A Rust type that can be read back from a CQL value.
pub trait FromCqlValue: Sized {
    fn from_cql_value(value: Value) -> Result<Self>;
}

fn unexpected(expected: &str, value: &Value) -> CqlError {
    CqlError::InvalidType(format!("expected {}, found {} value", expected, value.kind()))
}

macro_rules! impl_cql_value {
    ($($ty:ty => $variant:ident, $name:literal);* $(;)?) => {
        $(
            impl ToCqlValue for $ty {
                fn to_cql_value(&self) -> Value {
                    Value::$variant(self.clone())
                }
            }

            impl FromCqlValue for $ty {
                fn from_cql_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(unexpected($name, &other)),
                    }
                }
            }
        )*
    };
}

impl_cql_value! {
    bool => Boolean, "boolean";
    i8 => TinyInt, "tinyint";
    i16 => SmallInt, "smallint";
    i32 => Int, "int";
    i64 => BigInt, "bigint";
    f32 => Float, "float";
    f64 => Double, "double";
    Decimal => Decimal, "decimal";
    Varint => Varint, "varint";
    String => Text, "text";
    IpAddr => Inet, "inet";
    DateTime<Utc> => Timestamp, "timestamp";
    NaiveDate => Date, "date";
    NaiveTime => Time, "time";
    CqlDuration => Duration, "duration";
    CqlVector => Vector, "vector";
    UdtValue => Udt, "udt";
}

impl ToCqlValue for Uuid {
    fn to_cql_value(&self) -> Value {
        Value::Uuid(*self)
    }
}

/// Accepts both `uuid` and `timeuuid` values.
impl FromCqlValue for Uuid {
    fn from_cql_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(v) | Value::TimeUuid(v) => Ok(v),
            other => Err(unexpected("uuid", &other)),
        }
    }
}

impl ToCqlValue for Bytes {
    fn to_cql_value(&self) -> Value {
        Value::Blob(self.to_vec())
    }
}

impl FromCqlValue for Bytes {
    fn from_cql_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(v) => Ok(Bytes::from(v)),
            other => Err(unexpected("blob", &other)),
        }
    }
}

impl ToCqlValue for Value {
    fn to_cql_value(&self) -> Value {
        self.clone()
    }
}

impl FromCqlValue for Value {
    fn from_cql_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: ToCqlValue> ToCqlValue for Option<T> {
    fn to_cql_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToCqlValue::to_cql_value)
    }
}

impl<T: FromCqlValue> FromCqlValue for Option<T> {
    fn from_cql_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_cql_value(other).map(Some),
        }
    }
}

impl<T: ToCqlValue> ToCqlValue for Vec<T> {
    fn to_cql_value(&self) -> Value {
        Value::List(self.iter().map(ToCqlValue::to_cql_value).collect())
    }
}

/// Reads lists and sets; a null collection reads as empty.
impl<T: FromCqlValue> FromCqlValue for Vec<T> {
    fn from_cql_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) | Value::Set(items) => {
                items.into_iter().map(T::from_cql_value).collect()
            }
            Value::Null => Ok(Vec::new()),
            other => Err(unexpected("list", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_round_trip() {
        assert_eq!(42i32.to_cql_value(), Value::Int(42));
        assert_eq!(i32::from_cql_value(Value::Int(42)).unwrap(), 42);
        assert_eq!(
            String::from_cql_value("x".to_string().to_cql_value()).unwrap(),
            "x"
        );
    }

    #[test]
    fn test_wrong_variant_is_invalid_type() {
        let err = i64::from_cql_value(Value::Int(1)).unwrap_err();
        assert!(matches!(err, CqlError::InvalidType(_)));
        assert!(err.to_string().contains("bigint"));
    }

    #[test]
    fn test_null_requires_option() {
        assert!(i32::from_cql_value(Value::Null).is_err());
        assert_eq!(Option::<i32>::from_cql_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::None.to_cql_value(), Value::Null);
    }

    #[test]
    fn test_lists_and_sets() {
        let tags = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            tags.to_cql_value(),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        let from_set =
            Vec::<String>::from_cql_value(Value::Set(vec![Value::from("a")])).unwrap();
        assert_eq!(from_set, vec!["a".to_string()]);
        assert!(Vec::<String>::from_cql_value(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_uuid_accepts_timeuuid() {
        let id = Uuid::from_u128(7);
        assert_eq!(Uuid::from_cql_value(Value::TimeUuid(id)).unwrap(), id);
        assert_eq!(id.to_cql_value(), Value::Uuid(id));
    }

    #[test]
    fn test_bytes_as_blob() {
        let bytes = Bytes::from_static(b"\x01\x02");
        assert_eq!(bytes.to_cql_value(), Value::Blob(vec![1, 2]));
        assert_eq!(Bytes::from_cql_value(Value::Blob(vec![1, 2])).unwrap(), bytes);
    }
}
