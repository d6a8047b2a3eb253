//! Portal configuration.

use std::net::Ipv4Addr;

use crate::service::PortalError;

/// Maximum SSID length per IEEE 802.11.
pub const MAX_AP_SSID_LEN: usize = 32;

/// Fixed network identity and service ports for the captive portal.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// SSID the soft access point advertises.
    pub ap_ssid: String,
    /// Address the device claims; also the gateway and the answer every DNS
    /// query resolves to.
    pub address: Ipv4Addr,
    /// Network mask for the portal subnet.
    pub netmask: Ipv4Addr,
    /// Port the portal HTTP service listens on.
    pub http_port: u16,
    /// Port the DNS responder listens on.
    pub dns_port: u16,
    /// TTL for DNS answers. Zero keeps clients from caching resolutions
    /// across rescans.
    pub dns_ttl: u32,
    /// Ask the radio to report hidden networks during scans.
    pub scan_hidden: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            ap_ssid: "Device Setup".to_string(),
            address: Ipv4Addr::new(192, 168, 4, 1),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            http_port: 80,
            dns_port: 53,
            dns_ttl: 0,
            scan_hidden: false,
        }
    }
}

impl PortalConfig {
    /// Validate configuration parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the advertised SSID is empty or longer than
    /// [`MAX_AP_SSID_LEN`] bytes, a port is zero, or the netmask is not
    /// contiguous.
    pub fn validate(&self) -> Result<(), PortalError> {
        if self.ap_ssid.is_empty() {
            return Err(PortalError::InvalidConfig("ap_ssid must not be empty"));
        }
        if self.ap_ssid.len() > MAX_AP_SSID_LEN {
            return Err(PortalError::InvalidConfig(
                "ap_ssid must be at most 32 bytes",
            ));
        }
        if self.http_port == 0 {
            return Err(PortalError::InvalidConfig("http_port must be non-zero"));
        }
        if self.dns_port == 0 {
            return Err(PortalError::InvalidConfig("dns_port must be non-zero"));
        }
        let mask = u32::from(self.netmask);
        if mask.leading_ones() + mask.trailing_zeros() != 32 {
            return Err(PortalError::InvalidConfig("netmask must be contiguous"));
        }
        Ok(())
    }

    /// URL of the portal index page, as clients reach it from the portal
    /// subnet.
    pub fn index_url(&self) -> String {
        if self.http_port == 80 {
            format!("http://{}/", self.address)
        } else {
            format!("http://{}:{}/", self.address, self.http_port)
        }
    }
}
