//! CQL binary protocol revisions and the wire-format rules they govern.

mod version;

pub use version::ProtocolVersion;
