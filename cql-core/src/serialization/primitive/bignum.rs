//! Arbitrary-precision `varint` and `decimal`.

use rust_decimal::Decimal;

use crate::error::{CqlError, Result};
use crate::protocol::ProtocolVersion;
use crate::serialization::codec::{value_mismatch, TypeCodec};
use crate::serialization::wire::{WireReader, WireWriter};
use crate::types::{ColumnInfo, ColumnTypeCode, NativeType, Value, Varint};

/// `varint`: the whole body as big-endian two's complement.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarintCodec;

impl TypeCodec for VarintCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Varint
    }

    fn native_type(&self) -> NativeType {
        NativeType::Varint
    }

    fn serialize(&self, _: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        match value {
            Value::Varint(v) => Ok(v.as_be_bytes().to_vec()),
            other => Err(value_mismatch(self.cql_type(), other)),
        }
    }

    fn deserialize(&self, _: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        Ok(Value::Varint(Varint::from_be_bytes(data)))
    }
}

/// `decimal`: a four-byte scale followed by the unscaled value as a varint.
///
/// Decodes into [`rust_decimal::Decimal`], so values need to fit its 96-bit
/// mantissa and a scale of at most 28. Negative scales are folded into the
/// mantissa when the result still fits.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalCodec;

impl TypeCodec for DecimalCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Decimal
    }

    fn native_type(&self) -> NativeType {
        NativeType::Decimal
    }

    fn serialize(&self, _: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        let decimal = match value {
            Value::Decimal(d) => d,
            other => return Err(value_mismatch(self.cql_type(), other)),
        };
        let unscaled = Varint::from(decimal.mantissa());
        let mut output = WireWriter::with_capacity(4 + unscaled.as_be_bytes().len());
        // rust_decimal caps the scale at 28
        output.write_i32(decimal.scale() as i32);
        output.write_bytes(unscaled.as_be_bytes());
        Ok(output.into_bytes())
    }

    fn deserialize(&self, _: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        let mut input = WireReader::new(data);
        let scale = input.read_i32()?;
        let unscaled = Varint::from_be_bytes(input.read_slice(input.remaining())?);
        decimal_from_parts(&unscaled, scale).map(Value::Decimal)
    }
}

fn decimal_from_parts(unscaled: &Varint, scale: i32) -> Result<Decimal> {
    let out_of_range = || {
        CqlError::MalformedData(format!(
            "decimal {}E{} is outside the supported range",
            unscaled, -(scale as i64)
        ))
    };

    let mantissa = unscaled.to_i128().ok_or_else(out_of_range)?;
    if scale >= 0 {
        return Decimal::try_from_i128_with_scale(mantissa, scale as u32).map_err(|_| out_of_range());
    }

    let mantissa = 10i128
        .checked_pow(scale.unsigned_abs())
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or_else(out_of_range)?;
    Decimal::try_from_i128_with_scale(mantissa, 0).map_err(|_| out_of_range())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const V4: ProtocolVersion = ProtocolVersion::V4;

    fn decimal(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_decimal_wire_layout() {
        let bytes = DecimalCodec
            .serialize(V4, &Value::Decimal(decimal("1.23")), None)
            .unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 2, 0x7B]);
    }

    #[test]
    fn test_decimal_round_trip() {
        for s in ["0", "-1", "3.14159", "-0.0001", "79228162514264337593543950335"] {
            let value = Value::Decimal(decimal(s));
            let bytes = DecimalCodec.serialize(V4, &value, None).unwrap();
            assert_eq!(DecimalCodec.deserialize(V4, &bytes, None).unwrap(), value);
        }
    }

    #[test]
    fn test_decimal_negative_scale() {
        // 5E+3
        let value = DecimalCodec.deserialize(V4, &[0xFF, 0xFF, 0xFF, 0xFD, 0x05], None).unwrap();
        assert_eq!(value, Value::Decimal(decimal("5000")));
    }

    #[test]
    fn test_decimal_out_of_range() {
        let mut data = vec![0, 0, 0, 0];
        data.extend_from_slice(&[0x01; 14]);
        let err = DecimalCodec.deserialize(V4, &data, None).unwrap_err();
        assert!(matches!(err, CqlError::MalformedData(_)));

        let too_fine = [0, 0, 0, 40, 0x01];
        assert!(DecimalCodec.deserialize(V4, &too_fine, None).is_err());
    }

    #[test]
    fn test_decimal_missing_scale() {
        assert!(DecimalCodec.deserialize(V4, &[0, 0], None).is_err());
    }

    #[test]
    fn test_varint_round_trip() {
        for v in [0i128, -1, 255, -256, i64::MAX as i128 * 4, i128::MIN] {
            let value = Value::Varint(Varint::from(v));
            let bytes = VarintCodec.serialize(V4, &value, None).unwrap();
            assert_eq!(VarintCodec.deserialize(V4, &bytes, None).unwrap(), value);
        }
    }

    #[test]
    fn test_varint_minimal_bytes() {
        let bytes = VarintCodec
            .serialize(V4, &Value::Varint(Varint::from(128i64)), None)
            .unwrap();
        assert_eq!(bytes, vec![0x00, 0x80]);
    }
}
