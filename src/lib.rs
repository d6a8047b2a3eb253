//! Captive-portal WiFi provisioning for ESP32-class devices.
//!
//! A device with no stored network credentials scans for visible networks,
//! then raises its own access point with an HTTP selection page and a DNS
//! responder that points every name at that page. The operator picks a
//! network and enters a passphrase; the captured pair is handed back to the
//! caller.
//!
//! The core (state machine + scan registry) is platform-independent and
//! tested on the host. Radio, HTTP, and DNS are collaborators behind the
//! traits in [`service`]; the esp-idf radio adapter is gated behind the
//! `esp32` cargo feature.

pub mod portal;
pub mod service;

// Re-export commonly used items
pub use portal::{
    AccessPointRegistry, ApObservation, ApRecord, Credentials, PortalConfig, PortalState,
    PortalStateMachine, SecurityMode,
};
pub use service::{
    HostRadio, PortalDns, PortalError, PortalHttp, PortalRequest, RadioControl, RouteHandler,
    ScanStatus, TinyHttpPortal, UdpDnsResponder,
};

#[cfg(feature = "esp32")]
pub use service::EspRadio;
