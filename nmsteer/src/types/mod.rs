//! NetworkManager codes and the thresholds derived from them.

pub(crate) mod constants;
