//! Access point tracking and band steering for NetworkManager.
//!
//! This crate keeps a live, per-device model of the Wi-Fi access points
//! NetworkManager sees and acts on it:
//!
//! - Tracks access points per wireless device, hiding unreliable weak
//!   signals and hidden networks
//! - Publishes added/removed/changed events and a JSON summary for UIs
//! - Activates access points, fixing up saved profiles whose security
//!   changed or creating a profile when none exists
//! - Steers active connections to a better band of the same network,
//!   automatically or on request
//!
//! # Example
//!
//! ```no_run
//! use nmsteer::{ApManager, SteeringConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> nmsteer::Result<()> {
//! let config = SteeringConfig::new().with_debounce(Duration::from_secs(5));
//! let manager = ApManager::system(config).await?;
//! manager.track_all_devices().await?;
//!
//! // Move every device to 5 GHz if a same-network AP is available.
//! manager.request_band("a").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result`], whose error type
//! [`NetworkError`] has distinct variants for validation failures (hidden
//! access point, bad band token, a profile that needs user edits) and for
//! D-Bus failures.
//!
//! # Testing Without a Bus
//!
//! Everything above the D-Bus layer goes through the [`NetworkBackend`]
//! trait. [`DbusBackend`] is the production implementation; tests can supply
//! their own.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade. Add a logging
//! implementation such as `env_logger` to see output.

// Internal implementation modules
mod core;
mod dbus;
mod monitoring;
mod types;
mod util;

// Public API modules
pub mod api;
pub mod backend;

pub use api::builders;
pub use api::models;

// Re-exported public API
pub use api::config::SteeringConfig;
pub use api::manager::ApManager;
pub use api::models::{
    AccessPointEvent, AccessPointProps, AccessPointSnapshot, ActiveConnectionInfo,
    ActiveConnectionState, Band, DeviceEvent, NetworkError, SecurityCategory,
};
pub use backend::{ConnectionSettings, DbusBackend, NetworkBackend};
pub use crate::core::activator::ConnectionActivator;
pub use crate::core::registry::{AccessPointRegistry, Observation};
pub use crate::core::security::classify_security;
pub use crate::core::steering::BandSteeringEngine;
pub use types::constants::{ApFlags, ApSecurityFlags};

/// A specialized `Result` type for access point operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
