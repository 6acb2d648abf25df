//! Mapping between user-defined types and native structs.

use crate::error::Result;
use crate::types::{UdtColumnInfo, UdtValue};

/// Binds a schema UDT to a native struct name and its property names.
///
/// CQL fields without an explicit [`map`](UdtMap::map) entry use a property
/// of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdtMap {
    native_name: String,
    definition: UdtColumnInfo,
    field_map: Vec<(String, String)>,
}

impl UdtMap {
    pub fn new(native_name: impl Into<String>, definition: UdtColumnInfo) -> Self {
        Self {
            native_name: native_name.into(),
            definition,
            field_map: Vec::new(),
        }
    }

    /// Maps a CQL field to a differently named native property.
    pub fn map(mut self, cql_field: impl Into<String>, property: impl Into<String>) -> Self {
        let cql_field = cql_field.into();
        let property = property.into();
        match self.field_map.iter_mut().find(|(f, _)| *f == cql_field) {
            Some(entry) => entry.1 = property,
            None => self.field_map.push((cql_field, property)),
        }
        self
    }

    /// Replaces the definition, keeping the property mapping.
    ///
    /// Used when the schema is loaded after the mapping was declared.
    pub fn with_definition(mut self, definition: UdtColumnInfo) -> Self {
        self.definition = definition;
        self
    }

    /// `keyspace.name` of the mapped UDT.
    pub fn qualified_name(&self) -> String {
        self.definition.qualified_name()
    }

    pub fn native_name(&self) -> &str {
        &self.native_name
    }

    pub fn definition(&self) -> &UdtColumnInfo {
        &self.definition
    }

    /// The native property that holds `cql_field`.
    pub fn property_for<'a>(&'a self, cql_field: &'a str) -> &'a str {
        self.field_map
            .iter()
            .find(|(f, _)| f == cql_field)
            .map(|(_, p)| p.as_str())
            .unwrap_or(cql_field)
    }

    /// The CQL field stored in `property`, if the definition has one.
    pub fn field_for(&self, property: &str) -> Option<&str> {
        if let Some((field, _)) = self.field_map.iter().find(|(_, p)| p == property) {
            return Some(field);
        }
        self.definition
            .field(property)
            .filter(|f| !self.field_map.iter().any(|(mapped, _)| *mapped == f.name))
            .map(|f| f.name.as_str())
    }
}

/// A native struct that converts to and from [`UdtValue`].
///
/// Usually implemented with `#[derive(CqlUdt)]` from `cql-derive`.
pub trait UdtMapped: Sized {
    /// Native name used as [`UdtValue::type_name`].
    fn type_name() -> &'static str;

    /// Builds the mapping for the given schema definition.
    fn udt_map(definition: UdtColumnInfo) -> UdtMap;

    fn to_udt_value(&self) -> UdtValue;

    fn from_udt_value(value: UdtValue) -> Result<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnTypeCode, TypeDescriptor};

    fn address() -> UdtColumnInfo {
        UdtColumnInfo::new("ks", "address")
            .with_field("street_name", TypeDescriptor::new(ColumnTypeCode::Text))
            .with_field("zip", TypeDescriptor::new(ColumnTypeCode::Int))
    }

    #[test]
    fn test_identity_mapping_by_default() {
        let map = UdtMap::new("Address", address());
        assert_eq!(map.qualified_name(), "ks.address");
        assert_eq!(map.property_for("zip"), "zip");
        assert_eq!(map.field_for("zip"), Some("zip"));
        assert_eq!(map.field_for("city"), None);
    }

    #[test]
    fn test_explicit_mapping() {
        let map = UdtMap::new("Address", address()).map("street_name", "street");
        assert_eq!(map.property_for("street_name"), "street");
        assert_eq!(map.field_for("street"), Some("street_name"));
        assert_eq!(map.field_for("street_name"), None);
    }

    #[test]
    fn test_remapping_replaces_entry() {
        let map = UdtMap::new("Address", address())
            .map("zip", "postcode")
            .map("zip", "postal_code");
        assert_eq!(map.property_for("zip"), "postal_code");
    }

    #[test]
    fn test_with_definition_keeps_mapping() {
        let map = UdtMap::new("Address", UdtColumnInfo::new("ks", "address"))
            .map("zip", "postcode")
            .with_definition(address());
        assert_eq!(map.definition().fields.len(), 2);
        assert_eq!(map.property_for("zip"), "postcode");
    }
}
