//! Captive-portal firmware binary for ESP32.

#[cfg(feature = "esp32")]
fn main() {
    // Link ESP-IDF patches (must be first!)
    esp_idf_sys::link_patches();

    // Initialize ESP-IDF logger for log crate integration
    esp_idf_svc::log::EspLogger::initialize_default();

    if let Err(e) = run() {
        log::error!("portal failed: {}", e);
        panic!("portal failed: {}", e);
    }
}

#[cfg(feature = "esp32")]
fn run() -> Result<(), captive_portal_esp32::PortalError> {
    use captive_portal_esp32::{
        EspRadio, PortalConfig, PortalStateMachine, TinyHttpPortal, UdpDnsResponder,
    };
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use std::time::Duration;

    let peripherals = Peripherals::take()
        .map_err(|e| captive_portal_esp32::PortalError::Radio(format!("peripherals: {:?}", e)))?;
    let sysloop = EspSystemEventLoop::take()
        .map_err(|e| captive_portal_esp32::PortalError::Radio(format!("event loop: {:?}", e)))?;

    let config = PortalConfig::default();
    let radio = EspRadio::new(peripherals.modem, sysloop, &config)?;

    let mut portal = PortalStateMachine::new(
        radio,
        TinyHttpPortal::new(),
        UdpDnsResponder::new(),
        config,
    )?;

    log::info!("starting captive portal");
    while !portal.step()? {
        // Cooperative loop; leave the CPU some room between polls.
        std::thread::sleep(Duration::from_millis(10));
    }

    let credentials = portal.take_credentials();
    log::info!(
        "provisioning complete: network '{}' ({})",
        credentials.ssid,
        if credentials.is_open() {
            "open"
        } else {
            "passphrase set"
        }
    );

    // Credential storage and the station connection belong to the caller;
    // park here so the log stays visible on the console.
    loop {
        std::thread::sleep(Duration::from_secs(5));
    }
}

#[cfg(not(feature = "esp32"))]
fn main() {
    println!("This binary requires the 'esp32' feature.");
    println!("Use 'cargo run --bin host-portal' for the host demo.");
}
