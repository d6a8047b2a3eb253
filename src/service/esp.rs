//! ESP-IDF radio adapter.
//!
//! Wraps `EspWifi` for the portal: station-mode scanning and a soft AP with
//! a fixed router address. The AP network interface is configured at
//! construction (the netif address cannot change once created), so the
//! portal address is handed in up front and the mode-switch call only
//! verifies it.

use std::net::Ipv4Addr;

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::ipv4::{self, Mask, RouterConfiguration, Subnet};
use esp_idf_svc::netif::{EspNetif, NetifConfiguration, NetifStack};
use esp_idf_svc::wifi::config::ScanConfig;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi, WifiDriver,
};
use esp_idf_sys::EspError;
use log::{debug, warn};

use super::{PortalError, RadioControl, ScanStatus};
use crate::portal::{ApObservation, PortalConfig, SecurityMode};

/// ESP32 radio control backed by `esp-idf-svc`.
pub struct EspRadio<'a> {
    wifi: EspWifi<'a>,
    address: Ipv4Addr,
    scan_request_failed: bool,
    results: Vec<ApObservation>,
}

impl<'a> EspRadio<'a> {
    /// Create the radio with the AP side pre-routed to the portal address.
    ///
    /// # Errors
    ///
    /// Returns an error if the WiFi driver or the network interfaces cannot
    /// be created.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        config: &PortalConfig,
    ) -> Result<Self, PortalError> {
        let mask = Mask(u32::from(config.netmask).leading_ones() as u8);
        // The AP interface acts as router for the portal subnet and hands
        // itself out as the DNS server via DHCP.
        let ap_netif_config = NetifConfiguration {
            ip_configuration: Some(ipv4::Configuration::Router(RouterConfiguration {
                subnet: Subnet {
                    gateway: config.address,
                    mask,
                },
                dhcp_enabled: true,
                dns: Some(config.address),
                secondary_dns: None,
            })),
            ..NetifConfiguration::wifi_default_router()
        };

        let driver = WifiDriver::new(modem, sysloop.clone(), None)
            .map_err(|e| radio_err("wifi driver", e))?;
        let sta_netif =
            EspNetif::new(NetifStack::Sta).map_err(|e| radio_err("sta netif", e))?;
        let ap_netif = EspNetif::new_with_conf(&ap_netif_config)
            .map_err(|e| radio_err("ap netif", e))?;
        let wifi = EspWifi::wrap_all(driver, sta_netif, ap_netif)
            .map_err(|e| radio_err("wifi wrap", e))?;

        Ok(Self {
            wifi,
            address: config.address,
            scan_request_failed: false,
            results: Vec::new(),
        })
    }

    fn ensure_started(&mut self) -> Result<(), EspError> {
        if !self.wifi.is_started()? {
            self.wifi.start()?;
        }
        Ok(())
    }
}

impl RadioControl for EspRadio<'_> {
    fn set_station_mode(&mut self) -> Result<(), PortalError> {
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(|e| radio_err("station mode", e))?;
        self.ensure_started()
            .map_err(|e| radio_err("wifi start", e))?;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), PortalError> {
        // Not being associated is the expected case here.
        if let Err(e) = self.wifi.disconnect() {
            debug!("disconnect skipped: {:?}", e);
        }
        Ok(())
    }

    fn start_scan(&mut self, show_hidden: bool) {
        self.results.clear();
        let scan_config = ScanConfig {
            show_hidden,
            ..ScanConfig::default()
        };
        self.scan_request_failed = match self.wifi.start_scan(&scan_config, false) {
            Ok(()) => false,
            Err(e) => {
                warn!("scan request failed: {:?}", e);
                true
            }
        };
    }

    fn scan_status(&mut self) -> ScanStatus {
        if self.scan_request_failed {
            self.scan_request_failed = false;
            return ScanStatus::Failed;
        }

        match self.wifi.is_scan_done() {
            Ok(false) => ScanStatus::Running,
            Ok(true) => match self.wifi.get_scan_result() {
                Ok(infos) => {
                    self.results = infos
                        .iter()
                        .map(|info| ApObservation {
                            ssid: info.ssid.as_str().to_string(),
                            signal_dbm: i32::from(info.signal_strength),
                            // Unknown auth modes count as secured.
                            security: match info.auth_method {
                                Some(AuthMethod::None) => SecurityMode::Open,
                                _ => SecurityMode::Secured,
                            },
                        })
                        .collect();
                    ScanStatus::Complete(self.results.len())
                }
                Err(e) => {
                    warn!("fetching scan results failed: {:?}", e);
                    ScanStatus::Failed
                }
            },
            Err(e) => {
                warn!("scan poll failed: {:?}", e);
                ScanStatus::Failed
            }
        }
    }

    fn observation(&self, index: usize) -> Option<ApObservation> {
        self.results.get(index).cloned()
    }

    fn set_access_point_mode(
        &mut self,
        address: Ipv4Addr,
        _gateway: Ipv4Addr,
        _netmask: Ipv4Addr,
    ) -> Result<(), PortalError> {
        // The AP netif was routed at construction; a different address would
        // silently serve the wrong subnet.
        if address != self.address {
            return Err(PortalError::Radio(format!(
                "access point address fixed at {} (requested {})",
                self.address, address
            )));
        }
        Ok(())
    }

    fn start_access_point(&mut self, ssid: &str) -> Result<(), PortalError> {
        let ap_config = AccessPointConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| PortalError::Radio(format!("ssid '{}' too long", ssid)))?,
            ssid_hidden: false,
            channel: 1,
            auth_method: AuthMethod::None,
            max_connections: 4,
            ..Default::default()
        };

        self.wifi
            .set_configuration(&Configuration::AccessPoint(ap_config))
            .map_err(|e| radio_err("access point mode", e))?;
        self.ensure_started()
            .map_err(|e| radio_err("wifi start", e))?;
        Ok(())
    }
}

fn radio_err(op: &str, e: EspError) -> PortalError {
    PortalError::Radio(format!("{}: {:?}", op, e))
}
