//! Building serializers from configuration: user codecs, UDT maps and TOML files.

use std::sync::Arc;

use cql_core::{
    ColumnInfo, ColumnTypeCode, CqlError, CustomColumnInfo, CustomValue, NativeType,
    ProtocolVersion, Result, Serializer, SerializerConfig, TypeCodec, TypeDescriptor, Value,
};

const POINT_CLASS: &str = "com.example.PointType";

/// Packs a pair of ints for a server-side custom type.
struct PointCodec {
    info: ColumnInfo,
}

impl PointCodec {
    fn new() -> Self {
        Self {
            info: ColumnInfo::Custom(CustomColumnInfo::new(POINT_CLASS)),
        }
    }
}

impl TypeCodec for PointCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Custom
    }

    fn native_type(&self) -> NativeType {
        NativeType::Custom("Point".to_string())
    }

    fn type_info(&self) -> Option<&ColumnInfo> {
        Some(&self.info)
    }

    fn serialize(&self, _: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        let (x, y) = match value {
            Value::Custom(custom) => *custom
                .downcast_ref::<(i32, i32)>()
                .ok_or_else(|| CqlError::InvalidType("not a point".to_string()))?,
            _ => return Err(CqlError::InvalidType("not a point".to_string())),
        };
        let mut out = x.to_be_bytes().to_vec();
        out.extend_from_slice(&y.to_be_bytes());
        Ok(out)
    }

    fn deserialize(&self, _: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        if data.len() != 8 {
            return Err(CqlError::MalformedData("point needs 8 bytes".to_string()));
        }
        let x = i32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let y = i32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        Ok(Value::Custom(CustomValue::new("Point", (x, y))))
    }
}

#[test]
fn test_custom_codec_from_config() {
    let config = SerializerConfig::builder()
        .add_codec(Arc::new(PointCodec::new()))
        .build()
        .unwrap();
    let serializer = Serializer::from_config(&config).unwrap();

    let point = Value::Custom(CustomValue::new("Point", (3i32, -4i32)));
    let bytes = serializer.serialize(&point).unwrap().unwrap();
    assert_eq!(bytes, vec![0, 0, 0, 3, 0xFF, 0xFF, 0xFF, 0xFC]);

    let decoded = serializer
        .deserialize_value(&bytes, &TypeDescriptor::custom(POINT_CLASS))
        .unwrap();
    let Value::Custom(custom) = decoded else {
        panic!("expected a custom value");
    };
    assert_eq!(custom.downcast_ref::<(i32, i32)>(), Some(&(3, -4)));

    // Other custom classes still fall back to raw bytes.
    assert_eq!(
        serializer
            .deserialize_value(b"xy", &TypeDescriptor::custom("com.example.Other"))
            .unwrap(),
        Value::Blob(b"xy".to_vec())
    );

    let desc = serializer
        .get_cql_type(&NativeType::Custom("Point".to_string()))
        .unwrap();
    assert_eq!(desc, TypeDescriptor::custom(POINT_CLASS));
}

#[test]
fn test_protocol_version_from_config() {
    let config = SerializerConfig::builder()
        .protocol_version(ProtocolVersion::V2)
        .build()
        .unwrap();
    let serializer = Serializer::from_config(&config).unwrap();
    assert_eq!(serializer.protocol_version(), ProtocolVersion::V2);
}

#[cfg(feature = "config-file")]
#[test]
fn test_toml_file_registers_udt_maps() {
    let path = std::env::temp_dir().join(format!("cql-core-config-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
protocol-version = "V4"

[[udt-maps]]
keyspace = "shop"
name = "address"
native-name = "Address"
fields = [
    { name = "street_name", type = "org.apache.cassandra.db.marshal.UTF8Type" },
    { name = "zip", type = "org.apache.cassandra.db.marshal.Int32Type" },
]
properties = { street_name = "street" }
"#,
    )
    .unwrap();

    let config = SerializerConfig::from_toml(&path);
    std::fs::remove_file(&path).unwrap();
    let serializer = Serializer::from_config(&config.unwrap()).unwrap();

    let map = serializer.udt_map("shop.address").expect("mapping registered");
    assert_eq!(map.native_name(), "Address");
    assert_eq!(map.property_for("street_name"), "street");
}

#[cfg(feature = "config-file")]
#[test]
fn test_missing_toml_file() {
    let result = SerializerConfig::from_toml("/nonexistent/cql-core.toml");
    assert!(matches!(result, Err(CqlError::Configuration(_))));
}
