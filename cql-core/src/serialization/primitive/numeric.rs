//! Fixed-width boolean, integer and floating point codecs.

use crate::error::Result;
use crate::protocol::ProtocolVersion;
use crate::serialization::codec::{fixed_width, value_mismatch, TypeCodec};
use crate::types::{ColumnInfo, ColumnTypeCode, NativeType, Value};

/// `boolean`: one byte, any non-zero value is true.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl TypeCodec for BooleanCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Boolean
    }

    fn native_type(&self) -> NativeType {
        NativeType::Boolean
    }

    fn serialize(&self, _: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        match value {
            Value::Boolean(v) => Ok(vec![u8::from(*v)]),
            other => Err(value_mismatch(self.cql_type(), other)),
        }
    }

    fn deserialize(&self, _: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        let [b] = fixed_width::<1>(data, self.cql_type())?;
        Ok(Value::Boolean(b != 0))
    }
}

macro_rules! fixed_width_codec {
    ($(#[$meta:meta])* $name:ident, $code:ident, $native:ident, $variant:ident, $ty:ty, $width:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl TypeCodec for $name {
            fn cql_type(&self) -> ColumnTypeCode {
                ColumnTypeCode::$code
            }

            fn native_type(&self) -> NativeType {
                NativeType::$native
            }

            fn serialize(
                &self,
                _: ProtocolVersion,
                value: &Value,
                _: Option<&ColumnInfo>,
            ) -> Result<Vec<u8>> {
                match value {
                    Value::$variant(v) => Ok(v.to_be_bytes().to_vec()),
                    other => Err(value_mismatch(self.cql_type(), other)),
                }
            }

            fn deserialize(
                &self,
                _: ProtocolVersion,
                data: &[u8],
                _: Option<&ColumnInfo>,
            ) -> Result<Value> {
                let bytes = fixed_width::<$width>(data, self.cql_type())?;
                Ok(Value::$variant(<$ty>::from_be_bytes(bytes)))
            }
        }
    };
}

fixed_width_codec!(
    /// `tinyint`: one signed byte.
    TinyIntCodec, TinyInt, Int8, TinyInt, i8, 1
);
fixed_width_codec!(
    /// `smallint`: two bytes.
    SmallIntCodec, SmallInt, Int16, SmallInt, i16, 2
);
fixed_width_codec!(
    /// `int`: four bytes.
    IntCodec, Int, Int32, Int, i32, 4
);
fixed_width_codec!(
    /// `float`: IEEE 754 single precision.
    FloatCodec, Float, Float32, Float, f32, 4
);
fixed_width_codec!(
    /// `double`: IEEE 754 double precision.
    DoubleCodec, Double, Float64, Double, f64, 8
);

/// `bigint` and `counter`: eight bytes. Both decode to [`Value::BigInt`].
#[derive(Debug, Clone, Copy)]
pub struct BigIntCodec {
    code: ColumnTypeCode,
}

impl BigIntCodec {
    pub fn new(code: ColumnTypeCode) -> Self {
        debug_assert!(matches!(code, ColumnTypeCode::Bigint | ColumnTypeCode::Counter));
        Self { code }
    }
}

impl TypeCodec for BigIntCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        self.code
    }

    fn native_type(&self) -> NativeType {
        NativeType::Int64
    }

    fn serialize(&self, _: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        match value {
            Value::BigInt(v) => Ok(v.to_be_bytes().to_vec()),
            other => Err(value_mismatch(self.code, other)),
        }
    }

    fn deserialize(&self, _: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        let bytes = fixed_width::<8>(data, self.code)?;
        Ok(Value::BigInt(i64::from_be_bytes(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CqlError;
    use proptest::prelude::*;

    const V4: ProtocolVersion = ProtocolVersion::V4;

    fn round_trip(codec: &dyn TypeCodec, value: Value) -> Value {
        let bytes = codec.serialize(V4, &value, None).unwrap();
        codec.deserialize(V4, &bytes, None).unwrap()
    }

    #[test]
    fn test_boolean_round_trip() {
        assert_eq!(BooleanCodec.serialize(V4, &Value::Boolean(true), None).unwrap(), vec![1]);
        assert_eq!(round_trip(&BooleanCodec, Value::Boolean(false)), Value::Boolean(false));
    }

    #[test]
    fn test_boolean_non_zero_is_true() {
        assert_eq!(BooleanCodec.deserialize(V4, &[0x7F], None).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_int_big_endian() {
        assert_eq!(
            IntCodec.serialize(V4, &Value::Int(0x01020304), None).unwrap(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn test_integer_boundaries_round_trip() {
        for v in [i8::MIN, -1, 0, 1, i8::MAX] {
            assert_eq!(round_trip(&TinyIntCodec, Value::TinyInt(v)), Value::TinyInt(v));
        }
        for v in [i16::MIN, -1, 0, i16::MAX] {
            assert_eq!(round_trip(&SmallIntCodec, Value::SmallInt(v)), Value::SmallInt(v));
        }
        for v in [i32::MIN, -1, 0, i32::MAX] {
            assert_eq!(round_trip(&IntCodec, Value::Int(v)), Value::Int(v));
        }
        let bigint = BigIntCodec::new(ColumnTypeCode::Bigint);
        for v in [i64::MIN, -1, 0, i64::MAX] {
            assert_eq!(round_trip(&bigint, Value::BigInt(v)), Value::BigInt(v));
        }
    }

    #[test]
    fn test_counter_decodes_as_bigint() {
        let counter = BigIntCodec::new(ColumnTypeCode::Counter);
        assert_eq!(counter.cql_type(), ColumnTypeCode::Counter);
        assert_eq!(
            counter.deserialize(V4, &[0, 0, 0, 0, 0, 0, 0, 9], None).unwrap(),
            Value::BigInt(9)
        );
    }

    #[test]
    fn test_float_special_values() {
        assert_eq!(round_trip(&FloatCodec, Value::Float(-0.0)), Value::Float(-0.0));
        assert_eq!(
            round_trip(&DoubleCodec, Value::Double(f64::INFINITY)),
            Value::Double(f64::INFINITY)
        );
        match round_trip(&DoubleCodec, Value::Double(f64::NAN)) {
            Value::Double(v) => assert!(v.is_nan()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_wrong_length_fails_fast() {
        let err = IntCodec.deserialize(V4, &[0, 0, 1], None).unwrap_err();
        assert!(matches!(err, CqlError::MalformedData(_)));
        assert!(DoubleCodec.deserialize(V4, &[0; 9], None).is_err());
        assert!(BooleanCodec.deserialize(V4, &[], None).is_err());
    }

    #[test]
    fn test_wrong_variant_rejected() {
        let err = IntCodec.serialize(V4, &Value::BigInt(1), None).unwrap_err();
        assert!(matches!(err, CqlError::InvalidType(_)));
    }

    proptest! {
        #[test]
        fn prop_int_round_trip(v in any::<i32>()) {
            prop_assert_eq!(round_trip(&IntCodec, Value::Int(v)), Value::Int(v));
        }

        #[test]
        fn prop_bigint_round_trip(v in any::<i64>()) {
            let codec = BigIntCodec::new(ColumnTypeCode::Bigint);
            prop_assert_eq!(round_trip(&codec, Value::BigInt(v)), Value::BigInt(v));
        }

        #[test]
        fn prop_double_bits_preserved(v in any::<f64>()) {
            let bytes = DoubleCodec.serialize(V4, &Value::Double(v), None).unwrap();
            match DoubleCodec.deserialize(V4, &bytes, None).unwrap() {
                Value::Double(out) => prop_assert_eq!(out.to_bits(), v.to_bits()),
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }
    }
}
