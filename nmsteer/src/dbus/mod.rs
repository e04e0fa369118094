//! zbus proxies for the parts of NetworkManager's D-Bus API the backend uses.
//!
//! Only the members the access point model and steering need are declared.

mod access_point;
mod active_connection;
mod device;
mod main_nm;
mod settings;
mod wireless;

pub(crate) use access_point::NMAccessPointProxy;
pub(crate) use active_connection::NMActiveConnectionProxy;
pub(crate) use device::NMDeviceProxy;
pub(crate) use main_nm::NMProxy;
pub(crate) use settings::{NMSettingsConnectionProxy, NMSettingsProxy};
pub(crate) use wireless::NMWirelessProxy;
