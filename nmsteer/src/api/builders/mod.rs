//! Builders for NetworkManager connection settings dictionaries.
//!
//! The activator uses these when an access point has no saved profile yet.
//! They are exposed for callers that want to create profiles themselves.

pub mod connection_builder;
pub mod wifi_builder;

pub use connection_builder::{ConnectionBuilder, RawSettings};
pub use wifi_builder::WifiConnectionBuilder;
