//! Declarative serializer configuration from TOML and environment variables.
//!
//! Codecs and adapters are code, so only the protocol version and UDT
//! mappings can be declared in a file. Field types are written as
//! fully-qualified marshal class names.
//!
//! # Example TOML
//!
//! ```toml
//! protocol-version = "V4"
//!
//! [[udt-maps]]
//! keyspace = "shop"
//! name = "address"
//! native-name = "Address"
//! fields = [
//!     { name = "street_name", type = "org.apache.cassandra.db.marshal.UTF8Type" },
//!     { name = "zip", type = "org.apache.cassandra.db.marshal.Int32Type" },
//! ]
//! properties = { street_name = "street" }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{SerializerConfig, SerializerConfigBuilder};
use crate::error::{CqlError, Result};
use crate::protocol::ProtocolVersion;
use crate::serialization::UdtMap;
use crate::types::{parse_fq_type_name, UdtColumnInfo};

/// Environment variable read by [`SerializerConfig::from_env`].
pub const PROTOCOL_VERSION_ENV: &str = "CQL_PROTOCOL_VERSION";

/// Top-level file configuration, converted through [`TryFrom`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct FileSerializerConfig {
    /// `V1`..`V5`, `DSE_V1`, `DSE_V2` or the numeric header value.
    pub protocol_version: Option<String>,
    pub udt_maps: Option<Vec<FileUdtMap>>,
}

/// One UDT mapping.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct FileUdtMap {
    pub keyspace: String,
    pub name: String,
    pub native_name: String,
    pub fields: Vec<FileUdtField>,
    /// CQL field name to native property name, for fields that differ.
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct FileUdtField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl TryFrom<FileUdtMap> for UdtMap {
    type Error = CqlError;

    fn try_from(file: FileUdtMap) -> Result<Self> {
        if file.keyspace.is_empty() || file.name.is_empty() {
            return Err(CqlError::Configuration(
                "UDT maps need both a keyspace and a name".to_string(),
            ));
        }
        let mut definition = UdtColumnInfo::new(file.keyspace, file.name);
        for field in file.fields {
            let field_type = parse_fq_type_name(&field.field_type).map_err(|e| {
                CqlError::Configuration(format!(
                    "invalid type for field {} of {}: {e}",
                    field.name,
                    definition.qualified_name()
                ))
            })?;
            definition = definition.with_field(field.name, field_type);
        }
        let native_name = if file.native_name.is_empty() {
            definition.name.clone()
        } else {
            file.native_name
        };

        let mut map = UdtMap::new(native_name, definition);
        for (cql_field, property) in file.properties {
            map = map.map(cql_field, property);
        }
        Ok(map)
    }
}

impl TryFrom<FileSerializerConfig> for SerializerConfig {
    type Error = CqlError;

    fn try_from(file: FileSerializerConfig) -> Result<Self> {
        let mut builder = SerializerConfigBuilder::new();

        if let Some(version) = file.protocol_version {
            builder = builder.protocol_version(version.parse::<ProtocolVersion>()?);
        }

        for map in file.udt_maps.unwrap_or_default() {
            builder = builder.add_udt_map(map.try_into()?);
        }

        builder.build()
    }
}

impl SerializerConfig {
    /// Parses configuration from a TOML string.
    ///
    /// Requires the `config-file` feature.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file_config: FileSerializerConfig = toml::from_str(content)
            .map_err(|e| CqlError::Configuration(format!("failed to parse TOML config: {e}")))?;
        file_config.try_into()
    }

    /// Loads configuration from a TOML file.
    ///
    /// Requires the `config-file` feature.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let config = SerializerConfig::from_toml("serializer.toml")?;
    /// let manager = SerializerManager::new(&config)?;
    /// ```
    #[cfg(feature = "config-file")]
    pub fn from_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CqlError::Configuration(format!("failed to read TOML config file: {e}"))
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads configuration from environment variables.
    ///
    /// | Variable | Maps to |
    /// |----------|---------|
    /// | `CQL_PROTOCOL_VERSION` | `protocol_version` |
    pub fn from_env() -> Result<Self> {
        let mut file_config = FileSerializerConfig::default();
        if let Ok(val) = std::env::var(PROTOCOL_VERSION_ENV) {
            file_config.protocol_version = Some(val);
        }
        file_config.try_into()
    }
}
