//! Value codecs and the dispatcher that routes between them.

mod codec;
pub mod composite;
mod generic;
mod legacy;
pub mod primitive;
mod serializer;
mod udt_map;
pub mod vint;
mod wire;

pub use codec::{DispatcherRef, TypeCodec};
pub use composite::{CollectionCodec, CollectionKind, MapCodec, TupleCodec, UdtCodec, VectorCodec};
pub use generic::GenericSerializer;
pub use legacy::{LegacyTypeCodec, TypeAdapter};
pub use primitive::{
    builtin_codecs, BigIntCodec, BlobCodec, BooleanCodec, DateCodec, DecimalCodec, DoubleCodec,
    DurationCodec, FloatCodec, InetCodec, IntCodec, SmallIntCodec, TextCodec, TimeCodec,
    TimestampCodec, TinyIntCodec, UuidCodec, VarintCodec, DURATION_CLASS_NAME,
};
pub use serializer::{Serializer, SerializerManager};
pub use udt_map::{UdtMap, UdtMapped};
pub use wire::{WireReader, WireWriter};
