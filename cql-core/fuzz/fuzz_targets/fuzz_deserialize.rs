#![no_main]

use libfuzzer_sys::fuzz_target;

use cql_core::{ColumnTypeCode, ProtocolVersion, Serializer, TypeDescriptor, UdtColumnInfo};

fn descriptors() -> Vec<TypeDescriptor> {
    let text = || TypeDescriptor::new(ColumnTypeCode::Varchar);
    let int = || TypeDescriptor::new(ColumnTypeCode::Int);
    vec![
        TypeDescriptor::new(ColumnTypeCode::Decimal),
        TypeDescriptor::new(ColumnTypeCode::Varint),
        TypeDescriptor::new(ColumnTypeCode::Duration),
        TypeDescriptor::new(ColumnTypeCode::Inet),
        TypeDescriptor::new(ColumnTypeCode::Date),
        TypeDescriptor::list(int()),
        TypeDescriptor::set(text()),
        TypeDescriptor::map(text(), TypeDescriptor::list(int())),
        TypeDescriptor::tuple(vec![int(), text(), TypeDescriptor::new(ColumnTypeCode::Uuid)]),
        TypeDescriptor::vector(TypeDescriptor::new(ColumnTypeCode::Float), Some(3)),
        TypeDescriptor::vector(text(), Some(2)),
        TypeDescriptor::udt(
            UdtColumnInfo::new("ks", "address")
                .with_field("street", text())
                .with_field("zip", int()),
        ),
    ]
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let descriptors = descriptors();
    let descriptor = &descriptors[usize::from(selector & 0x0f) % descriptors.len()];
    let version = if selector & 0x80 == 0 {
        ProtocolVersion::V4
    } else {
        ProtocolVersion::V2
    };

    let serializer = Serializer::default().clone_with_protocol_version(version);
    if let Ok(value) = serializer.deserialize_value(payload, descriptor) {
        let _ = serializer.serialize_with_type(&value, descriptor);
    }
});
