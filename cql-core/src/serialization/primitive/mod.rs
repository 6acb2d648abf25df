//! Codecs for the scalar wire types.
//!
//! Every codec here is stateless. Multi-byte numbers are big-endian;
//! variable-length types (text, blob, varint) take the whole value body.

mod bignum;
mod guid;
mod numeric;
mod temporal;
mod text;

use std::sync::Arc;

use crate::types::ColumnTypeCode;

use super::codec::TypeCodec;

pub use self::bignum::{DecimalCodec, VarintCodec};
pub use self::guid::UuidCodec;
pub use self::numeric::{
    BigIntCodec, BooleanCodec, DoubleCodec, FloatCodec, IntCodec, SmallIntCodec, TinyIntCodec,
};
pub use self::temporal::{DateCodec, DurationCodec, TimeCodec, TimestampCodec, DURATION_CLASS_NAME};
pub use self::text::{BlobCodec, InetCodec, TextCodec};

/// The built-in scalar codecs in registration order.
///
/// When several codecs share a native type the earlier one owns it for
/// serialization: strings go out as `varchar`, `i64` as `bigint`.
pub fn builtin_codecs() -> Vec<Arc<dyn TypeCodec>> {
    vec![
        Arc::new(BooleanCodec),
        Arc::new(TinyIntCodec),
        Arc::new(SmallIntCodec),
        Arc::new(IntCodec),
        Arc::new(BigIntCodec::new(ColumnTypeCode::Bigint)),
        Arc::new(BigIntCodec::new(ColumnTypeCode::Counter)),
        Arc::new(FloatCodec),
        Arc::new(DoubleCodec),
        Arc::new(DecimalCodec),
        Arc::new(VarintCodec),
        Arc::new(TextCodec::new(ColumnTypeCode::Varchar)),
        Arc::new(TextCodec::new(ColumnTypeCode::Text)),
        Arc::new(TextCodec::new(ColumnTypeCode::Ascii)),
        Arc::new(BlobCodec),
        Arc::new(UuidCodec::new(ColumnTypeCode::Uuid)),
        Arc::new(UuidCodec::new(ColumnTypeCode::Timeuuid)),
        Arc::new(InetCodec),
        Arc::new(TimestampCodec),
        Arc::new(DateCodec),
        Arc::new(TimeCodec),
        Arc::new(DurationCodec),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_codes_are_unique() {
        let codecs = builtin_codecs();
        let codes: HashSet<_> = codecs.iter().map(|c| c.cql_type()).collect();
        assert_eq!(codes.len(), codecs.len());
    }

    #[test]
    fn test_builtins_cover_every_scalar_code() {
        let codes: HashSet<_> = builtin_codecs().iter().map(|c| c.cql_type()).collect();
        for code in 0x01u16..=0x15 {
            let code = ColumnTypeCode::from_code(code).unwrap();
            assert!(codes.contains(&code), "missing codec for {}", code);
        }
        assert!(!codes.contains(&ColumnTypeCode::List));
        assert!(!codes.contains(&ColumnTypeCode::Custom));
    }
}
