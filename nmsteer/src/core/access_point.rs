//! The access point entity held by the registry.

use tokio_util::sync::DropGuard;
use zvariant::OwnedObjectPath;

use crate::Result;
use crate::api::models::{AccessPointProps, AccessPointSnapshot, NetworkError, SecurityCategory};
use crate::core::security::classify_security;
use crate::util::utils::decode_ssid_or_empty;

/// Whether an access point should be hidden from listings.
///
/// Strengths in `1..ignore_below` are driver artifacts unless the AP's SSID
/// is the one in use on its device. A strength of exactly 0 is never ignored.
pub(crate) fn should_be_ignored(strength: u8, activated: bool, ignore_below: u8) -> bool {
    strength != 0 && strength < ignore_below && !activated
}

/// Whether the ignore decision for `strength` depends on activation state.
///
/// Lets callers skip the active connection lookup for strong signals.
pub(crate) fn needs_activation_check(strength: u8, ignore_below: u8) -> bool {
    strength != 0 && strength < ignore_below
}

/// One access point as seen by the device whose slot holds it.
///
/// Derived fields are refreshed together by [`AccessPoint::update_props`];
/// the security category is never stored apart from the flags it came from.
#[derive(Debug)]
pub(crate) struct AccessPoint {
    path: OwnedObjectPath,
    ssid: String,
    security: SecurityCategory,
    strength: u8,
    frequency: u32,
    ignored: bool,
    // Cancels the property watcher when the entity is released.
    _watch: Option<DropGuard>,
}

impl AccessPoint {
    /// Builds an entity from freshly read properties.
    ///
    /// Hidden access points (empty SSID) are rejected.
    pub(crate) fn new(
        path: OwnedObjectPath,
        props: &AccessPointProps,
        activated: bool,
        ignore_below: u8,
    ) -> Result<Self> {
        let mut ap = Self {
            path,
            ssid: String::new(),
            security: SecurityCategory::None,
            strength: 0,
            frequency: 0,
            ignored: false,
            _watch: None,
        };
        ap.update_props(props, activated, ignore_below);

        if ap.ssid.is_empty() {
            return Err(NetworkError::HiddenAccessPoint);
        }
        Ok(ap)
    }

    /// Re-derives every cached field and the ignore flag.
    pub(crate) fn update_props(
        &mut self,
        props: &AccessPointProps,
        activated: bool,
        ignore_below: u8,
    ) {
        self.ssid = decode_ssid_or_empty(&props.ssid).into_owned();
        self.security = classify_security(props.flags, props.wpa_flags, props.rsn_flags);
        self.strength = props.strength;
        self.frequency = props.frequency;
        self.ignored = should_be_ignored(self.strength, activated, ignore_below);
    }

    pub(crate) fn attach_watch(&mut self, guard: DropGuard) {
        self._watch = Some(guard);
    }

    pub(crate) fn path(&self) -> &OwnedObjectPath {
        &self.path
    }

    pub(crate) fn is_ignored(&self) -> bool {
        self.ignored
    }

    pub(crate) fn snapshot(&self) -> AccessPointSnapshot {
        AccessPointSnapshot {
            ssid: self.ssid.clone(),
            secured: self.security.is_secured(),
            secured_in_eap: self.security.is_eap(),
            strength: self.strength,
            path: self.path.clone(),
            frequency: self.frequency,
        }
    }
}
