//! The type dispatcher: registry and routing between values and codecs.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::config::SerializerConfig;
use crate::error::{CqlError, Result};
use crate::protocol::ProtocolVersion;
use crate::types::{
    validate_descriptor, validate_pair, ColumnInfo, ColumnTypeCode, CustomColumnInfo,
    NativeType, TypeDescriptor, Value,
};

use super::codec::TypeCodec;
use super::composite::{check_dimension, CollectionCodec, MapCodec, TupleCodec, UdtCodec, VectorCodec};
use super::legacy::LegacyTypeCodec;
use super::primitive::{builtin_codecs, DURATION_CLASS_NAME};
use super::udt_map::UdtMap;

/// Codec tables. Immutable once the dispatcher is built.
struct Registry {
    primitive_by_code: HashMap<ColumnTypeCode, Arc<dyn TypeCodec>>,
    primitive_by_native: HashMap<NativeType, Arc<dyn TypeCodec>>,
    custom_by_info: HashMap<CustomColumnInfo, Arc<dyn TypeCodec>>,
    custom_by_native: HashMap<NativeType, Arc<dyn TypeCodec>>,
    legacy_custom: Option<Arc<dyn TypeCodec>>,
    list: Arc<dyn TypeCodec>,
    set: Arc<dyn TypeCodec>,
    map: Arc<dyn TypeCodec>,
    tuple: Arc<dyn TypeCodec>,
    vector: Arc<dyn TypeCodec>,
    udt: Arc<dyn TypeCodec>,
}

impl Registry {
    fn with_builtins() -> Self {
        let mut primitive_by_code = HashMap::new();
        let mut primitive_by_native = HashMap::new();
        for codec in builtin_codecs() {
            // Several codes share a native type; the first listed is preferred.
            primitive_by_native
                .entry(codec.native_type())
                .or_insert_with(|| Arc::clone(&codec));
            primitive_by_code.insert(codec.cql_type(), codec);
        }

        Self {
            primitive_by_code,
            primitive_by_native,
            custom_by_info: HashMap::new(),
            custom_by_native: HashMap::new(),
            legacy_custom: None,
            list: Arc::new(CollectionCodec::list()),
            set: Arc::new(CollectionCodec::set()),
            map: Arc::new(MapCodec::new()),
            tuple: Arc::new(TupleCodec::new()),
            vector: Arc::new(VectorCodec::new()),
            udt: Arc::new(UdtCodec::new()),
        }
    }

    fn replace_primitive(&mut self, codec: Arc<dyn TypeCodec>) {
        self.primitive_by_native
            .insert(codec.native_type(), Arc::clone(&codec));
        self.primitive_by_code.insert(codec.cql_type(), codec);
    }

    /// Wraps the configured legacy adapters. Runs before user codecs.
    fn insert_legacy_adapters(&mut self, config: &SerializerConfig) {
        if let Some(adapter) = config.decimal_adapter() {
            self.replace_primitive(Arc::new(LegacyTypeCodec::new(
                ColumnTypeCode::Decimal,
                Arc::clone(adapter),
                false,
            )));
        }
        if let Some(adapter) = config.varint_adapter() {
            self.replace_primitive(Arc::new(LegacyTypeCodec::new(
                ColumnTypeCode::Varint,
                Arc::clone(adapter),
                true,
            )));
        }
        if let Some(adapter) = config.custom_adapter() {
            let codec: Arc<dyn TypeCodec> = Arc::new(LegacyTypeCodec::custom(Arc::clone(adapter)));
            self.custom_by_native
                .insert(codec.native_type(), Arc::clone(&codec));
            self.legacy_custom = Some(codec);
        }
    }

    /// Installs user codecs. The first codec per wire type wins; custom
    /// codecs are keyed by their custom type name instead.
    fn set_specific_serializers(&mut self, codecs: &[Arc<dyn TypeCodec>]) -> Result<()> {
        let mut defined = HashSet::new();
        for codec in codecs {
            let code = codec.cql_type();
            match code {
                ColumnTypeCode::Custom => {
                    let Some(ColumnInfo::Custom(info)) = codec.type_info() else {
                        return Err(CqlError::Configuration(format!(
                            "custom codec for {} must describe its custom type name",
                            codec.native_type()
                        )));
                    };
                    if self.custom_by_info.contains_key(info) {
                        warn!(
                            custom_type = %info.custom_type_name,
                            native_type = %codec.native_type(),
                            "ignoring duplicate codec registration"
                        );
                        continue;
                    }
                    self.custom_by_info.insert(info.clone(), Arc::clone(codec));
                    self.custom_by_native
                        .entry(codec.native_type())
                        .or_insert_with(|| Arc::clone(codec));
                }
                ColumnTypeCode::List
                | ColumnTypeCode::Set
                | ColumnTypeCode::Map
                | ColumnTypeCode::Tuple => {
                    return Err(CqlError::Configuration(format!(
                        "codecs for {} cannot be replaced",
                        code
                    )));
                }
                _ if !defined.insert(code) => {
                    warn!(
                        cql_type = %code,
                        native_type = %codec.native_type(),
                        "ignoring duplicate codec registration"
                    );
                }
                ColumnTypeCode::Udt => self.udt = Arc::clone(codec),
                _ => self.replace_primitive(Arc::clone(codec)),
            }
        }
        Ok(())
    }

    /// Lets the `duration` codec answer for its custom type name, which is
    /// how result metadata describes the type before V5. A user codec for
    /// that name takes precedence.
    fn alias_duration(&mut self) {
        let Some(codec) = self.primitive_by_code.get(&ColumnTypeCode::Duration) else {
            return;
        };
        self.custom_by_info
            .entry(CustomColumnInfo::new(DURATION_CLASS_NAME))
            .or_insert_with(|| Arc::clone(codec));
    }

    fn attach(&self, dispatcher: &Weak<GenericSerializer>) {
        let composites = [
            &self.list,
            &self.set,
            &self.map,
            &self.tuple,
            &self.vector,
            &self.udt,
        ];
        self.primitive_by_code
            .values()
            .chain(self.custom_by_info.values())
            .chain(self.custom_by_native.values())
            .chain(composites)
            .for_each(|codec| codec.attach(dispatcher));
    }
}

/// UDT mappings by `keyspace.name`, plus the reverse index from native name.
#[derive(Default)]
struct UdtMaps {
    by_qualified: HashMap<String, Arc<UdtMap>>,
    by_native: HashMap<String, String>,
}

/// Routes values and wire bodies to the registered codecs.
///
/// The registry is built once and shared; it is independent of the protocol
/// version, which every call passes explicitly. Composite codecs hold a weak
/// reference back to this dispatcher to code their elements.
///
/// # Example
///
/// ```
/// use cql_core::{GenericSerializer, ProtocolVersion, TypeDescriptor, ColumnTypeCode, Value};
///
/// let serializer = GenericSerializer::with_defaults();
/// let bytes = serializer
///     .serialize(ProtocolVersion::V4, &Value::Int(7))
///     .unwrap()
///     .unwrap();
/// let value = serializer
///     .deserialize_value(ProtocolVersion::V4, &bytes, &TypeDescriptor::new(ColumnTypeCode::Int))
///     .unwrap();
/// assert_eq!(value, Value::Int(7));
/// ```
pub struct GenericSerializer {
    registry: Registry,
    udt_maps: RwLock<UdtMaps>,
}

impl GenericSerializer {
    /// Builds a dispatcher from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CqlError::Configuration`] if a user codec targets a
    /// collection or tuple type, or a custom codec has no custom type name.
    pub fn new(config: &SerializerConfig) -> Result<Arc<Self>> {
        let mut registry = Registry::with_builtins();
        registry.insert_legacy_adapters(config);
        registry.set_specific_serializers(config.codecs())?;

        let mut udt_maps = UdtMaps::default();
        for map in config.udt_maps() {
            udt_maps
                .by_native
                .insert(map.native_name().to_string(), map.qualified_name());
            udt_maps
                .by_qualified
                .insert(map.qualified_name(), Arc::new(map.clone()));
        }

        debug!(
            primitive_codecs = registry.primitive_by_code.len(),
            custom_codecs = registry.custom_by_info.len(),
            legacy_custom = registry.legacy_custom.is_some(),
            udt_maps = udt_maps.by_qualified.len(),
            "built type serializer registry"
        );
        Ok(Self::from_parts(registry, udt_maps))
    }

    /// A dispatcher with only the built-in codecs.
    pub fn with_defaults() -> Arc<Self> {
        Self::from_parts(Registry::with_builtins(), UdtMaps::default())
    }

    fn from_parts(mut registry: Registry, udt_maps: UdtMaps) -> Arc<Self> {
        registry.alias_duration();
        Arc::new_cyclic(|weak| {
            registry.attach(weak);
            Self {
                registry,
                udt_maps: RwLock::new(udt_maps),
            }
        })
    }

    /// Encodes a value, inferring its wire type from the value itself.
    ///
    /// `Null` encodes to `None`; every other value, including empty text or
    /// blobs, encodes to `Some`. `Unset` encodes to an empty body, and only
    /// on protocol versions that support it.
    pub fn serialize(&self, version: ProtocolVersion, value: &Value) -> Result<Option<Vec<u8>>> {
        self.encode(version, value)
    }

    /// Encodes a value against a known wire type.
    ///
    /// Tuples, UDTs and vectors use the descriptor's element types, field
    /// order and dimension.
    pub fn serialize_with_type(
        &self,
        version: ProtocolVersion,
        value: &Value,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<Vec<u8>>> {
        descriptor.validate()?;
        self.encode_typed(version, value, descriptor)
    }

    /// Decodes `length` bytes of `data` starting at `offset`.
    pub fn deserialize(
        &self,
        version: ProtocolVersion,
        data: &[u8],
        offset: usize,
        length: usize,
        type_code: ColumnTypeCode,
        type_info: Option<&ColumnInfo>,
    ) -> Result<Value> {
        validate_descriptor(type_code, type_info)?;
        let end = offset
            .checked_add(length)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| {
                CqlError::MalformedData(format!(
                    "range {}+{} is outside a buffer of {} bytes",
                    offset,
                    length,
                    data.len()
                ))
            })?;
        self.decode(version, &data[offset..end], type_code, type_info)
    }

    /// Decodes a whole buffer as one value of the described type.
    pub fn deserialize_value(
        &self,
        version: ProtocolVersion,
        data: &[u8],
        descriptor: &TypeDescriptor,
    ) -> Result<Value> {
        self.deserialize(
            version,
            data,
            0,
            data.len(),
            descriptor.type_code,
            descriptor.type_info.as_ref(),
        )
    }

    /// Infers the wire type of a native type.
    ///
    /// Vectors are returned without a dimension. Durations are described by
    /// their custom type name, the only form servers accept before V5.
    pub fn get_cql_type(&self, native: &NativeType) -> Result<TypeDescriptor> {
        if let Some(codec) = self.registry.primitive_by_native.get(native) {
            return Ok(match codec.cql_type() {
                ColumnTypeCode::Duration => TypeDescriptor::custom(DURATION_CLASS_NAME),
                code => TypeDescriptor::new(code),
            });
        }
        if let Some(codec) = self.registry.custom_by_native.get(native) {
            return Ok(TypeDescriptor {
                type_code: codec.cql_type(),
                type_info: codec.type_info().cloned(),
            });
        }
        match native {
            NativeType::Array(element) | NativeType::List(element) => {
                Ok(TypeDescriptor::list(self.get_cql_type(element)?))
            }
            NativeType::Nullable(inner) => self.get_cql_type(inner),
            NativeType::Vector(element) => {
                Ok(TypeDescriptor::vector(self.get_cql_type(element)?, None))
            }
            NativeType::Map(key, value) => Ok(TypeDescriptor::map(
                self.get_cql_type(key)?,
                self.get_cql_type(value)?,
            )),
            NativeType::Set(element) => Ok(TypeDescriptor::set(self.get_cql_type(element)?)),
            NativeType::Tuple(elements) => Ok(TypeDescriptor::tuple(
                elements
                    .iter()
                    .map(|e| self.get_cql_type(e))
                    .collect::<Result<Vec<_>>>()?,
            )),
            NativeType::Struct(name) => self
                .udt_map_for_native(name)
                .map(|map| TypeDescriptor::udt(map.definition().clone()))
                .ok_or_else(|| CqlError::unknown_target_type(native)),
            other => Err(CqlError::unknown_target_type(other)),
        }
    }

    /// A quick, permissive check that `value` could be sent as `descriptor`.
    ///
    /// This is not a type check. Values with an exact primitive codec are
    /// held to their own wire type only for `int` and `double` targets.
    ///
    /// # Errors
    ///
    /// [`CqlError::VectorDimensionMismatch`] when a vector's length differs
    /// from the declared dimension.
    pub fn is_assignable_from(&self, descriptor: &TypeDescriptor, value: &Value) -> Result<bool> {
        descriptor.validate()?;
        if matches!(value, Value::Null | Value::Blob(_)) {
            return Ok(true);
        }

        let target = descriptor.type_code;
        let primitive = value
            .native_type()
            .and_then(|native| self.registry.primitive_by_native.get(&native));
        if let Some(codec) = primitive {
            if codec.cql_type() == target {
                return Ok(true);
            }
            return Ok(match target {
                ColumnTypeCode::Int => false,
                ColumnTypeCode::Double => matches!(value, Value::BigInt(_)),
                _ => true,
            });
        }

        match (target, &descriptor.type_info) {
            (ColumnTypeCode::List | ColumnTypeCode::Set, _) => Ok(matches!(
                value,
                Value::List(_) | Value::Set(_) | Value::Vector(_)
            )),
            (ColumnTypeCode::Map, _) => Ok(matches!(value, Value::Map(_))),
            (ColumnTypeCode::Tuple, _) => Ok(matches!(value, Value::Tuple(_))),
            (ColumnTypeCode::Custom, Some(ColumnInfo::Vector(info))) => match value {
                Value::Vector(vector) => {
                    check_dimension(vector, info.dimension)?;
                    Ok(true)
                }
                _ => Ok(false),
            },
            _ => Ok(true),
        }
    }

    /// The encoded length shared by every value of a type, if there is one.
    ///
    /// # Errors
    ///
    /// [`CqlError::Configuration`] for a vector without a dimension, and
    /// [`CqlError::InvalidType`] when `info` does not fit `type_code`.
    pub fn get_value_length_if_fixed(
        &self,
        type_code: ColumnTypeCode,
        type_info: Option<&ColumnInfo>,
    ) -> Result<Option<usize>> {
        validate_pair(type_code, type_info)?;
        let length = match type_code {
            ColumnTypeCode::Boolean => Some(1),
            ColumnTypeCode::Int | ColumnTypeCode::Float => Some(4),
            ColumnTypeCode::Bigint | ColumnTypeCode::Timestamp | ColumnTypeCode::Double => Some(8),
            ColumnTypeCode::Uuid | ColumnTypeCode::Timeuuid => Some(16),
            ColumnTypeCode::Custom => match type_info {
                Some(ColumnInfo::Vector(info)) => {
                    let dimension = info.dimension.ok_or_else(|| {
                        CqlError::Configuration(format!(
                            "vector<{}> has no known dimension",
                            info.value_type
                        ))
                    })?;
                    let element = &info.value_type;
                    match self
                        .get_value_length_if_fixed(element.type_code, element.type_info.as_ref())?
                    {
                        Some(len) => Some(len.checked_mul(dimension).ok_or_else(|| {
                            CqlError::Configuration(format!(
                                "vector dimension {} is too large",
                                dimension
                            ))
                        })?),
                        None => None,
                    }
                }
                _ => None,
            },
            _ => None,
        };
        Ok(length)
    }

    /// Registers or replaces the mapping for a UDT.
    ///
    /// Called while schema metadata is loaded; safe to call concurrently
    /// with serialization.
    pub fn set_udt_map(&self, qualified_name: impl Into<String>, map: UdtMap) {
        let qualified_name = qualified_name.into();
        debug!(
            udt = %qualified_name,
            native_type = %map.native_name(),
            fields = map.definition().fields.len(),
            "registered UDT mapping"
        );
        let mut maps = self.udt_maps.write();
        maps.by_native
            .insert(map.native_name().to_string(), qualified_name.clone());
        maps.by_qualified.insert(qualified_name, Arc::new(map));
    }

    /// The mapping registered for `keyspace.name`.
    pub fn udt_map(&self, qualified_name: &str) -> Option<Arc<UdtMap>> {
        self.udt_maps.read().by_qualified.get(qualified_name).cloned()
    }

    pub(crate) fn udt_map_for_native(&self, native_name: &str) -> Option<Arc<UdtMap>> {
        let maps = self.udt_maps.read();
        let qualified = maps.by_native.get(native_name)?;
        maps.by_qualified.get(qualified).cloned()
    }

    pub(crate) fn encode(&self, version: ProtocolVersion, value: &Value) -> Result<Option<Vec<u8>>> {
        if let Some(body) = Self::encode_marker(version, value)? {
            return Ok(body);
        }
        let codec = self.codec_for_value(value)?;
        codec.serialize(version, value, None).map(Some)
    }

    pub(crate) fn encode_typed(
        &self,
        version: ProtocolVersion,
        value: &Value,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<Vec<u8>>> {
        if let Some(body) = Self::encode_marker(version, value)? {
            return Ok(body);
        }
        let info = descriptor.type_info.as_ref();
        match self.codec_for_type(descriptor.type_code, info) {
            Some(codec) => codec.serialize(version, value, info).map(Some),
            None => match value {
                // An unclaimed custom type is sent as the bytes it was read as.
                Value::Blob(raw) if descriptor.type_code == ColumnTypeCode::Custom => {
                    Ok(Some(raw.clone()))
                }
                _ => Err(CqlError::InvalidType(format!(
                    "no codec registered for {}",
                    descriptor
                ))),
            },
        }
    }

    /// Handles `Null` and `Unset`, which no codec sees.
    fn encode_marker(version: ProtocolVersion, value: &Value) -> Result<Option<Option<Vec<u8>>>> {
        match value {
            Value::Null => Ok(Some(None)),
            Value::Unset if version.supports_unset() => Ok(Some(Some(Vec::new()))),
            Value::Unset => Err(CqlError::InvalidType(format!(
                "unset values require protocol V4 or later, got {}",
                version
            ))),
            _ => Ok(None),
        }
    }

    pub(crate) fn decode(
        &self,
        version: ProtocolVersion,
        data: &[u8],
        type_code: ColumnTypeCode,
        type_info: Option<&ColumnInfo>,
    ) -> Result<Value> {
        match self.codec_for_type(type_code, type_info) {
            Some(codec) => codec.deserialize(version, data, type_info),
            None if type_code == ColumnTypeCode::Custom => {
                trace!(
                    custom_type = ?type_info,
                    len = data.len(),
                    "no codec for custom type, returning raw bytes"
                );
                Ok(Value::Blob(data.to_vec()))
            }
            None => Err(CqlError::unknown_target_type(type_code)),
        }
    }

    fn codec_for_value(&self, value: &Value) -> Result<&Arc<dyn TypeCodec>> {
        if let Some(native) = value.native_type() {
            if let Some(codec) = self
                .registry
                .primitive_by_native
                .get(&native)
                .or_else(|| self.registry.custom_by_native.get(&native))
            {
                return Ok(codec);
            }
        }
        match value {
            Value::List(_) => Ok(&self.registry.list),
            Value::Set(_) => Ok(&self.registry.set),
            Value::Map(_) => Ok(&self.registry.map),
            Value::Tuple(_) => Ok(&self.registry.tuple),
            Value::Vector(_) => Ok(&self.registry.vector),
            Value::Udt(_) => Ok(&self.registry.udt),
            other => Err(CqlError::unknown_target_type(
                other
                    .native_type()
                    .map_or_else(|| other.kind().to_string(), |n| n.to_string()),
            )),
        }
    }

    fn codec_for_type(
        &self,
        type_code: ColumnTypeCode,
        type_info: Option<&ColumnInfo>,
    ) -> Option<&Arc<dyn TypeCodec>> {
        let registry = &self.registry;
        match type_code {
            ColumnTypeCode::List => Some(&registry.list),
            ColumnTypeCode::Set => Some(&registry.set),
            ColumnTypeCode::Map => Some(&registry.map),
            ColumnTypeCode::Tuple => Some(&registry.tuple),
            ColumnTypeCode::Udt => Some(&registry.udt),
            ColumnTypeCode::Custom => match type_info {
                Some(ColumnInfo::Vector(_)) => Some(&registry.vector),
                Some(ColumnInfo::Custom(info)) => registry
                    .custom_by_info
                    .get(info)
                    .or(registry.legacy_custom.as_ref()),
                _ => registry.legacy_custom.as_ref(),
            },
            code => registry.primitive_by_code.get(&code),
        }
    }
}

impl fmt::Debug for GenericSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<_> = self.registry.primitive_by_code.keys().copied().collect();
        codes.sort();
        let mut custom: Vec<_> = self
            .registry
            .custom_by_info
            .keys()
            .map(|info| info.custom_type_name.as_str())
            .collect();
        custom.sort_unstable();
        let udts = self.udt_maps.read().by_qualified.len();
        f.debug_struct("GenericSerializer")
            .field("primitive_codes", &codes)
            .field("custom_types", &custom)
            .field("legacy_custom", &self.registry.legacy_custom.is_some())
            .field("udt_maps", &udts)
            .finish()
    }
}
