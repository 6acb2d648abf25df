//! The serializer bound to one protocol version.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use crate::config::SerializerConfig;
use crate::error::Result;
use crate::protocol::ProtocolVersion;
use crate::types::{ColumnInfo, ColumnTypeCode, NativeType, TypeDescriptor, Value};

use super::generic::GenericSerializer;
use super::udt_map::UdtMap;

/// A [`GenericSerializer`] paired with a fixed protocol version.
///
/// This is the codec API used by request and response framing. Rebinding to
/// another version with [`clone_with_protocol_version`] shares the registry
/// instead of rebuilding it.
///
/// [`clone_with_protocol_version`]: Serializer::clone_with_protocol_version
#[derive(Debug, Clone)]
pub struct Serializer {
    version: ProtocolVersion,
    inner: Arc<GenericSerializer>,
}

impl Serializer {
    pub fn new(version: ProtocolVersion, inner: Arc<GenericSerializer>) -> Self {
        Self { version, inner }
    }

    /// Builds the registry from `config` and binds it to the configured version.
    pub fn from_config(config: &SerializerConfig) -> Result<Self> {
        Ok(Self::new(
            config.protocol_version(),
            GenericSerializer::new(config)?,
        ))
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.version
    }

    /// The shared registry.
    pub fn generic(&self) -> &Arc<GenericSerializer> {
        &self.inner
    }

    /// A serializer for `version` over the same registry.
    pub fn clone_with_protocol_version(&self, version: ProtocolVersion) -> Self {
        Self {
            version,
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn serialize(&self, value: &Value) -> Result<Option<Vec<u8>>> {
        self.inner.serialize(self.version, value)
    }

    pub fn serialize_with_type(
        &self,
        value: &Value,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<Vec<u8>>> {
        self.inner.serialize_with_type(self.version, value, descriptor)
    }

    pub fn deserialize(
        &self,
        data: &[u8],
        offset: usize,
        length: usize,
        type_code: ColumnTypeCode,
        type_info: Option<&ColumnInfo>,
    ) -> Result<Value> {
        self.inner
            .deserialize(self.version, data, offset, length, type_code, type_info)
    }

    pub fn deserialize_value(&self, data: &[u8], descriptor: &TypeDescriptor) -> Result<Value> {
        self.inner.deserialize_value(self.version, data, descriptor)
    }

    pub fn get_cql_type(&self, native: &NativeType) -> Result<TypeDescriptor> {
        self.inner.get_cql_type(native)
    }

    pub fn is_assignable_from(&self, descriptor: &TypeDescriptor, value: &Value) -> Result<bool> {
        self.inner.is_assignable_from(descriptor, value)
    }

    pub fn get_value_length_if_fixed(
        &self,
        type_code: ColumnTypeCode,
        type_info: Option<&ColumnInfo>,
    ) -> Result<Option<usize>> {
        self.inner.get_value_length_if_fixed(type_code, type_info)
    }

    pub fn set_udt_map(&self, qualified_name: impl Into<String>, map: UdtMap) {
        self.inner.set_udt_map(qualified_name, map);
    }

    pub fn udt_map(&self, qualified_name: &str) -> Option<Arc<UdtMap>> {
        self.inner.udt_map(qualified_name)
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new(ProtocolVersion::default(), GenericSerializer::with_defaults())
    }
}

/// Holds the serializer for the version negotiated with the cluster.
///
/// Readers take a snapshot with [`current`](Self::current). Changing the
/// version publishes a new instance; snapshots already handed out keep the
/// version they were taken with.
pub struct SerializerManager {
    current: ArcSwap<Serializer>,
}

impl SerializerManager {
    pub fn new(config: &SerializerConfig) -> Result<Self> {
        Ok(Self::from_serializer(Serializer::from_config(config)?))
    }

    pub fn from_serializer(serializer: Serializer) -> Self {
        Self {
            current: ArcSwap::from_pointee(serializer),
        }
    }

    pub fn current(&self) -> Arc<Serializer> {
        self.current.load_full()
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.current.load().protocol_version()
    }

    /// Rebinds to `version`, sharing the existing registry.
    pub fn change_protocol_version(&self, version: ProtocolVersion) {
        let previous = self.current.load_full();
        if previous.protocol_version() == version {
            return;
        }
        debug!(from = %previous.protocol_version(), to = %version, "changing protocol version");
        self.current
            .store(Arc::new(previous.clone_with_protocol_version(version)));
    }
}

impl std::fmt::Debug for SerializerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerManager")
            .field("current", &*self.current.load())
            .finish()
    }
}

impl Default for SerializerManager {
    fn default() -> Self {
        Self::from_serializer(Serializer::default())
    }
}
