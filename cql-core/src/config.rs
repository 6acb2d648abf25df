//! Programmatic configuration of the type serializer.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{CqlError, Result};
use crate::protocol::ProtocolVersion;
use crate::serialization::{TypeAdapter, TypeCodec, UdtMap};

/// Everything a [`GenericSerializer`](crate::GenericSerializer) is built from.
///
/// User codecs take precedence over the built-in codecs of the same wire
/// type. The three legacy adapters are installed before user codecs, so a
/// user codec for `decimal` or `varint` still wins over them.
#[derive(Clone, Default)]
pub struct SerializerConfig {
    protocol_version: ProtocolVersion,
    codecs: Vec<Arc<dyn TypeCodec>>,
    decimal_adapter: Option<Arc<dyn TypeAdapter>>,
    varint_adapter: Option<Arc<dyn TypeAdapter>>,
    custom_adapter: Option<Arc<dyn TypeAdapter>>,
    udt_maps: Vec<UdtMap>,
}

impl SerializerConfig {
    pub fn builder() -> SerializerConfigBuilder {
        SerializerConfigBuilder::new()
    }

    /// Version the initial [`Serializer`](crate::Serializer) is bound to.
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    pub fn codecs(&self) -> &[Arc<dyn TypeCodec>] {
        &self.codecs
    }

    pub fn decimal_adapter(&self) -> Option<&Arc<dyn TypeAdapter>> {
        self.decimal_adapter.as_ref()
    }

    pub fn varint_adapter(&self) -> Option<&Arc<dyn TypeAdapter>> {
        self.varint_adapter.as_ref()
    }

    pub fn custom_adapter(&self) -> Option<&Arc<dyn TypeAdapter>> {
        self.custom_adapter.as_ref()
    }

    pub fn udt_maps(&self) -> &[UdtMap] {
        &self.udt_maps
    }
}

impl fmt::Debug for SerializerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codecs: Vec<String> = self
            .codecs
            .iter()
            .map(|c| format!("{} => {}", c.cql_type(), c.native_type()))
            .collect();
        let udt_maps: Vec<String> = self.udt_maps.iter().map(UdtMap::qualified_name).collect();
        f.debug_struct("SerializerConfig")
            .field("protocol_version", &self.protocol_version)
            .field("codecs", &codecs)
            .field("decimal_adapter", &self.decimal_adapter.as_ref().map(|a| a.native_type()))
            .field("varint_adapter", &self.varint_adapter.as_ref().map(|a| a.native_type()))
            .field("custom_adapter", &self.custom_adapter.as_ref().map(|a| a.native_type()))
            .field("udt_maps", &udt_maps)
            .finish()
    }
}

/// Builder for [`SerializerConfig`].
#[derive(Default)]
pub struct SerializerConfigBuilder {
    protocol_version: Option<ProtocolVersion>,
    codecs: Vec<Arc<dyn TypeCodec>>,
    decimal_adapter: Option<Arc<dyn TypeAdapter>>,
    varint_adapter: Option<Arc<dyn TypeAdapter>>,
    custom_adapter: Option<Arc<dyn TypeAdapter>>,
    udt_maps: Vec<UdtMap>,
}

impl SerializerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial protocol version. Defaults to V4.
    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = Some(version);
        self
    }

    /// Registers a user codec.
    ///
    /// When several codecs claim the same wire type, the first one added is
    /// kept and the rest are ignored with a warning.
    ///
    /// A codec that codes nested values serves one live serializer at a
    /// time. Sharing it between serializers works once the earlier ones
    /// have been dropped.
    pub fn add_codec(mut self, codec: Arc<dyn TypeCodec>) -> Self {
        self.codecs.push(codec);
        self
    }

    pub fn decimal_adapter(mut self, adapter: Arc<dyn TypeAdapter>) -> Self {
        self.decimal_adapter = Some(adapter);
        self
    }

    /// Installs an adapter for `varint`. It exchanges little-endian bytes.
    pub fn varint_adapter(mut self, adapter: Arc<dyn TypeAdapter>) -> Self {
        self.varint_adapter = Some(adapter);
        self
    }

    /// Installs the fallback adapter for custom types no codec claims.
    pub fn custom_adapter(mut self, adapter: Arc<dyn TypeAdapter>) -> Self {
        self.custom_adapter = Some(adapter);
        self
    }

    pub fn add_udt_map(mut self, map: UdtMap) -> Self {
        self.udt_maps.push(map);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CqlError::Configuration`] if two UDT maps target the same
    /// `keyspace.name` or the same native struct, or if a user codec claims
    /// a collection or tuple type.
    pub fn build(self) -> Result<SerializerConfig> {
        let mut qualified = HashSet::new();
        let mut native = HashSet::new();
        for map in &self.udt_maps {
            if !qualified.insert(map.qualified_name()) {
                return Err(CqlError::Configuration(format!(
                    "UDT {} is mapped more than once",
                    map.qualified_name()
                )));
            }
            if !native.insert(map.native_name().to_string()) {
                return Err(CqlError::Configuration(format!(
                    "native struct {} is mapped to more than one UDT",
                    map.native_name()
                )));
            }
        }

        if let Some(codec) = self.codecs.iter().find(|c| c.cql_type().is_structural()) {
            return Err(CqlError::Configuration(format!(
                "codecs for {} cannot be replaced",
                codec.cql_type()
            )));
        }

        Ok(SerializerConfig {
            protocol_version: self.protocol_version.unwrap_or_default(),
            codecs: self.codecs,
            decimal_adapter: self.decimal_adapter,
            varint_adapter: self.varint_adapter,
            custom_adapter: self.custom_adapter,
            udt_maps: self.udt_maps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{CollectionCodec, TextCodec};
    use crate::types::{ColumnTypeCode, UdtColumnInfo};

    #[test]
    fn test_defaults() {
        let config = SerializerConfig::builder().build().unwrap();
        assert_eq!(config.protocol_version(), ProtocolVersion::V4);
        assert!(config.codecs().is_empty());
        assert!(config.decimal_adapter().is_none());
        assert!(config.udt_maps().is_empty());
    }

    #[test]
    fn test_codecs_keep_registration_order() {
        let config = SerializerConfig::builder()
            .protocol_version(ProtocolVersion::V3)
            .add_codec(Arc::new(TextCodec::new(ColumnTypeCode::Ascii)))
            .add_codec(Arc::new(TextCodec::new(ColumnTypeCode::Text)))
            .build()
            .unwrap();
        assert_eq!(config.protocol_version(), ProtocolVersion::V3);
        let codes: Vec<_> = config.codecs().iter().map(|c| c.cql_type()).collect();
        assert_eq!(codes, vec![ColumnTypeCode::Ascii, ColumnTypeCode::Text]);
    }

    #[test]
    fn test_duplicate_udt_map_rejected() {
        let result = SerializerConfig::builder()
            .add_udt_map(UdtMap::new("A", UdtColumnInfo::new("ks", "t")))
            .add_udt_map(UdtMap::new("B", UdtColumnInfo::new("ks", "t")))
            .build();
        assert!(matches!(result, Err(CqlError::Configuration(_))));
    }

    #[test]
    fn test_native_name_mapped_twice_rejected() {
        let result = SerializerConfig::builder()
            .add_udt_map(UdtMap::new("A", UdtColumnInfo::new("ks", "t1")))
            .add_udt_map(UdtMap::new("A", UdtColumnInfo::new("ks", "t2")))
            .build();
        assert!(matches!(result, Err(CqlError::Configuration(_))));
    }

    #[test]
    fn test_structural_codec_rejected() {
        let result = SerializerConfig::builder()
            .add_codec(Arc::new(CollectionCodec::list()))
            .build();
        assert!(matches!(result, Err(CqlError::Configuration(_))));
    }

    #[test]
    fn test_debug_lists_codecs() {
        let config = SerializerConfig::builder()
            .add_codec(Arc::new(TextCodec::new(ColumnTypeCode::Ascii)))
            .build()
            .unwrap();
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("ascii => String"));
    }
}
