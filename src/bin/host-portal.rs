//! Host-based portal demo for development and testing.
//!
//! Runs the full portal loop on the host with a simulated radio and the
//! real HTTP and DNS adapters on unprivileged ports:
//! - selection page at http://127.0.0.1:8080/
//! - DNS responder on 127.0.0.1:5353
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin host-portal
//! ```

use std::net::Ipv4Addr;
use std::time::Duration;

use captive_portal_esp32::{
    ApObservation, HostRadio, PortalConfig, PortalStateMachine, SecurityMode, TinyHttpPortal,
    UdpDnsResponder,
};
use log::{error, info};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("=== Captive portal host demo starting ===");

    // Networks the simulated radio "sees", duplicates included so the
    // deduplication shows up on the page.
    let radio = HostRadio::new(vec![
        ApObservation::new("Home WiFi", -48, SecurityMode::Secured),
        ApObservation::new("Cafe Guest", -70, SecurityMode::Open),
        ApObservation::new("Home WiFi", -62, SecurityMode::Secured),
        ApObservation::new("Neighbor 5G", -85, SecurityMode::Secured),
    ]);

    let config = PortalConfig {
        ap_ssid: "Host Demo Portal".to_string(),
        address: Ipv4Addr::new(127, 0, 0, 1),
        http_port: 8080,
        dns_port: 5353,
        ..PortalConfig::default()
    };

    let mut portal = match PortalStateMachine::new(
        radio,
        TinyHttpPortal::new(),
        UdpDnsResponder::new(),
        config,
    ) {
        Ok(portal) => portal,
        Err(e) => {
            error!("portal setup failed: {}", e);
            std::process::exit(1);
        }
    };

    info!("open http://127.0.0.1:8080/ and submit a selection (Ctrl+C to exit)");

    loop {
        match portal.step() {
            Ok(true) => break,
            Ok(false) => std::thread::sleep(Duration::from_millis(10)),
            Err(e) => {
                error!("portal failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let credentials = portal.take_credentials();
    info!(
        "captured credentials: network '{}' ({})",
        credentials.ssid,
        if credentials.is_open() {
            "open network"
        } else {
            "passphrase set"
        }
    );
}
