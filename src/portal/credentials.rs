//! Captured network credentials.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// The SSID and passphrase the operator selected on the portal page.
///
/// Both fields are opaque: whatever the form submitted is what the caller
/// receives, with no trimming or validation. An empty passphrase is the
/// normal case for open networks. Passphrase memory is zeroed when the
/// value is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    /// Selected network name.
    pub ssid: String,
    /// Entered passphrase. Empty for open networks.
    pub passphrase: String,
}

impl Credentials {
    /// Create credentials from captured form values.
    pub fn new(ssid: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            passphrase: passphrase.into(),
        }
    }

    /// True when no passphrase was entered.
    pub fn is_open(&self) -> bool {
        self.passphrase.is_empty()
    }
}

// Manual Debug so the passphrase never reaches log output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}
