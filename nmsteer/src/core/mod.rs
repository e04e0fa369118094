//! Core logic: the access point model, profile fix-ups, activation and
//! band steering.

pub(crate) mod access_point;
pub(crate) mod activator;
pub(crate) mod profile;
pub(crate) mod registry;
pub(crate) mod security;
pub(crate) mod steering;
