//! Activation of an access point with a saved or freshly built profile.

use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;
use zvariant::OwnedObjectPath;

use crate::Result;
use crate::api::builders::WifiConnectionBuilder;
use crate::api::models::{NetworkError, SecurityCategory};
use crate::backend::NetworkBackend;
use crate::core::profile;
use crate::core::security::classify_security;

/// Decision for a saved profile whose stored security may be stale.
#[derive(Debug, PartialEq, Eq)]
enum ProfileFix {
    /// Stored key management still matches the access point.
    Unchanged,
    /// Key management must be rewritten before activation.
    Rewrite(SecurityCategory),
}

fn decide_fix(stored: SecurityCategory, current: SecurityCategory) -> Result<ProfileFix> {
    if stored == current {
        return Ok(ProfileFix::Unchanged);
    }
    if current.is_eap() {
        return Err(NetworkError::NeedUserEdit);
    }
    Ok(ProfileFix::Rewrite(current))
}

/// Activates access points, fixing or creating profiles on the way.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct ConnectionActivator {
    backend: Arc<dyn NetworkBackend>,
}

impl ConnectionActivator {
    pub fn new(backend: Arc<dyn NetworkBackend>) -> Self {
        Self { backend }
    }

    /// Activates `ap` on `device` and returns the active connection path.
    ///
    /// With a non-empty `uuid` the saved profile is reused. If the access
    /// point's security changed since the profile was saved, its key
    /// management is rewritten and persisted first; a change to EAP fails
    /// with [`NetworkError::NeedUserEdit`] and leaves the profile untouched.
    ///
    /// With an empty `uuid` a new profile is built from the access point and
    /// created and activated in one call.
    ///
    /// Failures are returned as-is. Nothing is retried.
    pub async fn activate(
        &self,
        uuid: &str,
        ap: &OwnedObjectPath,
        device: &OwnedObjectPath,
    ) -> Result<OwnedObjectPath> {
        debug!(
            "Activating AP {} on {} (uuid={uuid:?})",
            ap.as_str(),
            device.as_str()
        );

        let props = self.backend.access_point(ap).await?;
        let security = classify_security(props.flags, props.wpa_flags, props.rsn_flags);

        if !uuid.is_empty() {
            self.fix_security_change(uuid, security).await?;
            let active = self.backend.activate_connection(uuid, device, ap).await?;
            info!("Activated connection {uuid} on {}", device.as_str());
            return Ok(active);
        }

        if props.ssid.is_empty() {
            return Err(NetworkError::HiddenAccessPoint);
        }

        let settings = WifiConnectionBuilder::new(&props.ssid)
            .uuid(Uuid::new_v4())
            .security(security)
            .into_settings()?;

        let active = self
            .backend
            .add_and_activate_connection(settings, device, ap)
            .await?;
        info!(
            "Created and activated new {security} connection on {}",
            device.as_str()
        );
        Ok(active)
    }

    async fn fix_security_change(&self, uuid: &str, current: SecurityCategory) -> Result<()> {
        let mut settings = self.backend.connection_settings(uuid).await?;

        let stored = match profile::stored_security(&settings) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Cannot read security of connection {uuid}, activating unchanged: {e}");
                return Ok(());
            }
        };

        let ProfileFix::Rewrite(category) = decide_fix(stored, current)? else {
            return Ok(());
        };

        debug!("Security of connection {uuid} changed from {stored} to {category}");
        profile::set_key_mgmt(&mut settings, category)?;
        profile::normalize_ipv6(&mut settings);
        self.backend.update_connection(uuid, settings).await
    }
}

impl std::fmt::Debug for ConnectionActivator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionActivator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_category_needs_no_fix() {
        for c in [
            SecurityCategory::None,
            SecurityCategory::Wep,
            SecurityCategory::Psk,
            SecurityCategory::Eap,
        ] {
            assert_eq!(decide_fix(c, c).unwrap(), ProfileFix::Unchanged);
        }
    }

    #[test]
    fn change_to_eap_needs_user_edit() {
        assert!(matches!(
            decide_fix(SecurityCategory::Psk, SecurityCategory::Eap),
            Err(NetworkError::NeedUserEdit)
        ));
    }

    #[test]
    fn change_away_from_eap_is_rewritten() {
        assert_eq!(
            decide_fix(SecurityCategory::Eap, SecurityCategory::Psk).unwrap(),
            ProfileFix::Rewrite(SecurityCategory::Psk)
        );
        assert_eq!(
            decide_fix(SecurityCategory::Psk, SecurityCategory::None).unwrap(),
            ProfileFix::Rewrite(SecurityCategory::None)
        );
    }
}
