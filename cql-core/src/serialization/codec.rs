//! The codec capability shared by primitive, composite, legacy and user codecs.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::{CqlError, Result};
use crate::protocol::ProtocolVersion;
use crate::types::{ColumnInfo, ColumnTypeCode, NativeType, Value};

use super::generic::GenericSerializer;

/// A serialize/deserialize pair bound to one wire type code and one native type.
///
/// Codecs are registered with a [`GenericSerializer`] and must be shareable
/// between threads. `info` is the auxiliary type information of the value
/// being coded when it is known; primitive codecs ignore it.
pub trait TypeCodec: Send + Sync {
    /// The wire type code this codec reads and writes.
    fn cql_type(&self) -> ColumnTypeCode;

    /// The native type this codec produces and accepts.
    fn native_type(&self) -> NativeType;

    /// Auxiliary information identifying a `Custom` codec.
    ///
    /// Codecs registered for [`ColumnTypeCode::Custom`] must return a
    /// [`ColumnInfo::Custom`] here; it is the key the dispatcher uses to find
    /// them when decoding.
    fn type_info(&self) -> Option<&ColumnInfo> {
        None
    }

    /// Encodes a non-null value into its wire body.
    fn serialize(
        &self,
        version: ProtocolVersion,
        value: &Value,
        info: Option<&ColumnInfo>,
    ) -> Result<Vec<u8>>;

    /// Decodes a wire body. `data` is exactly the value's byte range.
    fn deserialize(
        &self,
        version: ProtocolVersion,
        data: &[u8],
        info: Option<&ColumnInfo>,
    ) -> Result<Value>;

    /// Receives the back-reference to the owning dispatcher.
    ///
    /// Called once for every registered codec when the dispatcher is built.
    /// Codecs that code nested values keep it in a [`DispatcherRef`].
    fn attach(&self, _dispatcher: &Weak<GenericSerializer>) {}
}

/// A non-owning handle from a codec back to the dispatcher that owns it.
///
/// A codec instance serves one live dispatcher at a time. Attaching it to a
/// second dispatcher while the first is alive has no effect; once the first
/// is dropped the next attach rebinds it.
#[derive(Debug, Default)]
pub struct DispatcherRef {
    inner: RwLock<Weak<GenericSerializer>>,
}

impl DispatcherRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, dispatcher: &Weak<GenericSerializer>) {
        let mut current = self.inner.write();
        if current.strong_count() == 0 {
            *current = dispatcher.clone();
        }
    }

    /// Upgrades to the dispatcher for the duration of one call.
    pub fn get(&self) -> Result<Arc<GenericSerializer>> {
        self.inner
            .read()
            .upgrade()
            .ok_or_else(|| {
                CqlError::Configuration("codec is not attached to a live serializer".to_string())
            })
    }
}

/// The error for a value variant a codec does not accept.
pub(crate) fn value_mismatch(code: ColumnTypeCode, value: &Value) -> CqlError {
    CqlError::InvalidType(format!("cannot encode a {} value as {}", value.kind(), code))
}

/// Checks that a fixed-width body has exactly `N` bytes.
pub(crate) fn fixed_width<const N: usize>(data: &[u8], code: ColumnTypeCode) -> Result<[u8; N]> {
    <[u8; N]>::try_from(data).map_err(|_| {
        CqlError::MalformedData(format!(
            "{} requires exactly {} bytes, got {}",
            code,
            N,
            data.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_exact() {
        let bytes: [u8; 4] = fixed_width(&[0, 0, 0, 7], ColumnTypeCode::Int).unwrap();
        assert_eq!(bytes, [0, 0, 0, 7]);
    }

    #[test]
    fn test_fixed_width_rejects_short_and_long() {
        let err = fixed_width::<4>(&[0, 0, 7], ColumnTypeCode::Int).unwrap_err();
        assert!(matches!(err, CqlError::MalformedData(_)));
        assert!(err.to_string().contains("int requires exactly 4 bytes, got 3"));
        assert!(fixed_width::<4>(&[0; 5], ColumnTypeCode::Int).is_err());
    }

    #[test]
    fn test_value_mismatch_message() {
        let err = value_mismatch(ColumnTypeCode::Int, &Value::from("x"));
        assert_eq!(err.to_string(), "invalid type: cannot encode a text value as int");
    }

    #[test]
    fn test_unattached_dispatcher_ref() {
        let handle = DispatcherRef::new();
        assert!(matches!(handle.get(), Err(CqlError::Configuration(_))));
    }

    #[test]
    fn test_dead_dispatcher_ref() {
        let handle = DispatcherRef::new();
        handle.set(&Weak::new());
        assert!(handle.get().is_err());
    }

    #[test]
    fn test_rebinds_after_dispatcher_is_dropped() {
        let handle = DispatcherRef::new();
        let first = GenericSerializer::with_defaults();
        handle.set(&Arc::downgrade(&first));

        let second = GenericSerializer::with_defaults();
        handle.set(&Arc::downgrade(&second));
        assert!(Arc::ptr_eq(&handle.get().unwrap(), &first));

        drop(first);
        assert!(handle.get().is_err());
        handle.set(&Arc::downgrade(&second));
        assert!(Arc::ptr_eq(&handle.get().unwrap(), &second));
    }
}
