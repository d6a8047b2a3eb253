//! Simulated radio for host development.
//!
//! There is no soft-AP on a laptop, so this adapter replays a canned set of
//! observations and logs the mode changes it would make. It lets the full
//! portal loop, including the real HTTP and DNS adapters, run on the host.

use std::net::Ipv4Addr;

use log::{debug, info};

use super::{PortalError, RadioControl, ScanStatus};
use crate::portal::ApObservation;

/// Number of status polls a simulated scan stays in flight.
const SCAN_POLLS: u8 = 2;

/// Host radio that always "sees" a fixed set of networks.
pub struct HostRadio {
    observations: Vec<ApObservation>,
    polls_remaining: Option<u8>,
    scan_done: bool,
}

impl HostRadio {
    /// Create a radio whose every scan reports `observations`.
    pub fn new(observations: Vec<ApObservation>) -> Self {
        Self {
            observations,
            polls_remaining: None,
            scan_done: false,
        }
    }
}

impl RadioControl for HostRadio {
    fn set_station_mode(&mut self) -> Result<(), PortalError> {
        debug!("host radio: station mode (simulated)");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), PortalError> {
        debug!("host radio: disconnect (simulated)");
        Ok(())
    }

    fn start_scan(&mut self, _show_hidden: bool) {
        self.polls_remaining = Some(SCAN_POLLS);
        self.scan_done = false;
    }

    fn scan_status(&mut self) -> ScanStatus {
        match self.polls_remaining.as_mut() {
            None => ScanStatus::Failed,
            Some(0) => {
                self.scan_done = true;
                ScanStatus::Complete(self.observations.len())
            }
            Some(polls) => {
                *polls -= 1;
                ScanStatus::Running
            }
        }
    }

    fn observation(&self, index: usize) -> Option<ApObservation> {
        if !self.scan_done {
            return None;
        }
        self.observations.get(index).cloned()
    }

    fn set_access_point_mode(
        &mut self,
        address: Ipv4Addr,
        _gateway: Ipv4Addr,
        _netmask: Ipv4Addr,
    ) -> Result<(), PortalError> {
        info!("host radio: access point mode at {} (simulated)", address);
        Ok(())
    }

    fn start_access_point(&mut self, ssid: &str) -> Result<(), PortalError> {
        info!("host radio: advertising '{}' (simulated)", ssid);
        Ok(())
    }
}
