//! Helpers for SSID decoding and object paths.

use log::warn;
use std::borrow::Cow;
use std::str;
use zvariant::OwnedObjectPath;

use crate::types::constants::NULL_PATH;

/// Decode SSID bytes, defaulting to an empty string if invalid.
///
/// An empty result marks a hidden access point.
pub(crate) fn decode_ssid_or_empty(bytes: &[u8]) -> Cow<'static, str> {
    if bytes.is_empty() {
        return Cow::Borrowed("");
    }

    match str::from_utf8(bytes) {
        Ok(s) => Cow::Owned(s.to_owned()),
        Err(e) => {
            warn!("Invalid UTF-8 in SSID: {e}");
            Cow::Owned(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Whether `path` is a usable object path (not empty and not `/`).
pub(crate) fn is_valid_path(path: &OwnedObjectPath) -> bool {
    let p = path.as_str();
    !p.is_empty() && p != NULL_PATH
}

/// Macro to convert Result to Option with error logging.
/// Usage: `try_log!(result, "context message")`
#[macro_export]
macro_rules! try_log {
    ($result:expr, $context:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => {
                log::warn!("{}: {:?}", $context, e);
                return None;
            }
        }
    };
}
