//! Text, blob and inet codecs.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::{CqlError, Result};
use crate::protocol::ProtocolVersion;
use crate::serialization::codec::{value_mismatch, TypeCodec};
use crate::types::{ColumnInfo, ColumnTypeCode, NativeType, Value};

/// `varchar`, `text` and `ascii`: the whole body as UTF-8.
#[derive(Debug, Clone, Copy)]
pub struct TextCodec {
    code: ColumnTypeCode,
}

impl TextCodec {
    pub fn new(code: ColumnTypeCode) -> Self {
        debug_assert!(matches!(
            code,
            ColumnTypeCode::Varchar | ColumnTypeCode::Text | ColumnTypeCode::Ascii
        ));
        Self { code }
    }
}

impl TypeCodec for TextCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        self.code
    }

    fn native_type(&self) -> NativeType {
        NativeType::String
    }

    fn serialize(&self, _: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        let text = match value {
            Value::Text(s) => s,
            other => return Err(value_mismatch(self.code, other)),
        };
        if self.code == ColumnTypeCode::Ascii && !text.is_ascii() {
            return Err(CqlError::InvalidType(
                "ascii value contains non-ASCII characters".to_string(),
            ));
        }
        Ok(text.as_bytes().to_vec())
    }

    fn deserialize(&self, _: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        std::str::from_utf8(data)
            .map(|s| Value::Text(s.to_string()))
            .map_err(|e| CqlError::MalformedData(format!("invalid UTF-8 in {}: {}", self.code, e)))
    }
}

/// `blob`: the body verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobCodec;

impl TypeCodec for BlobCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Blob
    }

    fn native_type(&self) -> NativeType {
        NativeType::Bytes
    }

    fn serialize(&self, _: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        match value {
            Value::Blob(b) => Ok(b.clone()),
            other => Err(value_mismatch(self.cql_type(), other)),
        }
    }

    fn deserialize(&self, _: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        Ok(Value::Blob(data.to_vec()))
    }
}

/// `inet`: 4 bytes for IPv4, 16 for IPv6.
#[derive(Debug, Clone, Copy, Default)]
pub struct InetCodec;

impl TypeCodec for InetCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Inet
    }

    fn native_type(&self) -> NativeType {
        NativeType::IpAddr
    }

    fn serialize(&self, _: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        match value {
            Value::Inet(IpAddr::V4(addr)) => Ok(addr.octets().to_vec()),
            Value::Inet(IpAddr::V6(addr)) => Ok(addr.octets().to_vec()),
            other => Err(value_mismatch(self.cql_type(), other)),
        }
    }

    fn deserialize(&self, _: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        if let Ok(octets) = <[u8; 4]>::try_from(data) {
            return Ok(Value::Inet(IpAddr::V4(Ipv4Addr::from(octets))));
        }
        if let Ok(octets) = <[u8; 16]>::try_from(data) {
            return Ok(Value::Inet(IpAddr::V6(Ipv6Addr::from(octets))));
        }
        Err(CqlError::MalformedData(format!(
            "inet requires 4 or 16 bytes, got {}",
            data.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V4: ProtocolVersion = ProtocolVersion::V4;

    #[test]
    fn test_text_round_trip() {
        let codec = TextCodec::new(ColumnTypeCode::Varchar);
        for s in ["", "hello", "żółw 🐢"] {
            let bytes = codec.serialize(V4, &Value::from(s), None).unwrap();
            assert_eq!(bytes.len(), s.len());
            assert_eq!(codec.deserialize(V4, &bytes, None).unwrap(), Value::from(s));
        }
    }

    #[test]
    fn test_ascii_rejects_non_ascii() {
        let codec = TextCodec::new(ColumnTypeCode::Ascii);
        assert!(codec.serialize(V4, &Value::from("plain"), None).is_ok());
        let err = codec.serialize(V4, &Value::from("café"), None).unwrap_err();
        assert!(matches!(err, CqlError::InvalidType(_)));
    }

    #[test]
    fn test_invalid_utf8() {
        let codec = TextCodec::new(ColumnTypeCode::Text);
        let err = codec.deserialize(V4, &[0xC3, 0x28], None).unwrap_err();
        assert!(matches!(err, CqlError::MalformedData(_)));
    }

    #[test]
    fn test_blob_empty_is_present() {
        let bytes = BlobCodec.serialize(V4, &Value::Blob(vec![]), None).unwrap();
        assert!(bytes.is_empty());
        assert_eq!(BlobCodec.deserialize(V4, &[], None).unwrap(), Value::Blob(vec![]));
    }

    #[test]
    fn test_inet_v4_and_v6() {
        let v4: IpAddr = "192.168.0.1".parse().unwrap();
        let bytes = InetCodec.serialize(V4, &Value::Inet(v4), None).unwrap();
        assert_eq!(bytes, vec![192, 168, 0, 1]);
        assert_eq!(InetCodec.deserialize(V4, &bytes, None).unwrap(), Value::Inet(v4));

        let v6: IpAddr = "::1".parse().unwrap();
        let bytes = InetCodec.serialize(V4, &Value::Inet(v6), None).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(InetCodec.deserialize(V4, &bytes, None).unwrap(), Value::Inet(v6));
    }

    #[test]
    fn test_inet_bad_length() {
        assert!(InetCodec.deserialize(V4, &[127, 0, 0], None).is_err());
        assert!(InetCodec.deserialize(V4, &[0; 8], None).is_err());
    }
}
