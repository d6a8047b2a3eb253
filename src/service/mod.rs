//! Collaborator interfaces for the portal.
//!
//! The state machine drives three external services - radio control, an HTTP
//! request dispatcher, and a DNS responder - through the narrow traits below.
//! Adapters:
//!
//! - [`TinyHttpPortal`] - `tiny_http`-backed HTTP service (host and ESP32)
//! - [`UdpDnsResponder`] - UDP socket DNS responder (host and ESP32)
//! - [`HostRadio`] - simulated radio for host development
//! - `EspRadio` - ESP-IDF WiFi driver wrapper (`esp32` feature only)
//!
//! All poll-style operations are non-blocking: they perform at most one unit
//! of pending work and return.

use std::net::Ipv4Addr;

use crate::portal::ApObservation;

mod dns;
mod host;
mod http;

#[cfg(feature = "esp32")]
mod esp;

pub use dns::UdpDnsResponder;
pub use host::HostRadio;
pub use http::TinyHttpPortal;

#[cfg(feature = "esp32")]
pub use esp::EspRadio;

/// Outcome of polling an asynchronous network scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// Scan still in progress.
    Running,
    /// Scan failed; the caller is expected to request a new one.
    Failed,
    /// Scan finished with this many observations available.
    Complete(usize),
}

/// Radio driver surface the portal needs.
pub trait RadioControl {
    /// Put the radio in station mode so it can scan.
    fn set_station_mode(&mut self) -> Result<(), PortalError>;

    /// Drop any association left over from earlier use of the radio.
    fn disconnect(&mut self) -> Result<(), PortalError>;

    /// Request an asynchronous scan. Request failures are not reported here;
    /// they surface as [`ScanStatus::Failed`] from `scan_status`.
    fn start_scan(&mut self, show_hidden: bool);

    /// Poll the outcome of the scan requested by `start_scan`.
    fn scan_status(&mut self) -> ScanStatus;

    /// Observation `index` of the completed scan, `None` past the end.
    fn observation(&self, index: usize) -> Option<ApObservation>;

    /// Switch to access-point mode with a fixed address.
    fn set_access_point_mode(
        &mut self,
        address: Ipv4Addr,
        gateway: Ipv4Addr,
        netmask: Ipv4Addr,
    ) -> Result<(), PortalError>;

    /// Begin advertising the access point under `ssid`.
    fn start_access_point(&mut self, ssid: &str) -> Result<(), PortalError>;
}

/// One HTTP request/response exchange, as seen by a route handler.
pub trait PortalRequest {
    /// Request path with any query string stripped.
    fn path(&self) -> &str;

    /// Value of a query or form parameter, already decoded.
    fn param(&self, name: &str) -> Option<&str>;

    /// Add a header to the pending response.
    fn set_header(&mut self, name: &str, value: &str);

    /// Set the response. The last call before the handler returns wins.
    fn respond(&mut self, status: u16, content_type: &str, body: &str);
}

/// Route callback invoked by the HTTP service.
pub type RouteHandler = Box<dyn FnMut(&mut dyn PortalRequest) + Send>;

/// Minimal HTTP service surface.
///
/// Routes are registered before `start`; `poll_once` dispatches at most one
/// pending request to its handler.
pub trait PortalHttp {
    /// Register a handler for an exact path.
    fn register_route(&mut self, path: &str, handler: RouteHandler) -> Result<(), PortalError>;

    /// Register the handler for every path without an exact route.
    fn register_catch_all(&mut self, handler: RouteHandler) -> Result<(), PortalError>;

    /// Bind and start listening.
    fn start(&mut self, port: u16) -> Result<(), PortalError>;

    /// Serve at most one pending request. No-op before `start`.
    fn poll_once(&mut self) -> Result<(), PortalError>;
}

/// Minimal DNS responder surface.
pub trait PortalDns {
    /// TTL carried by every answer.
    fn configure(&mut self, ttl: u32);

    /// Bind and start answering queries whose name matches `match_pattern`
    /// (`"*"` matches everything) with `resolve_to`.
    fn start(
        &mut self,
        port: u16,
        match_pattern: &str,
        resolve_to: Ipv4Addr,
    ) -> Result<(), PortalError>;

    /// Answer at most one pending query. No-op before `start`.
    fn poll_once(&mut self) -> Result<(), PortalError>;
}

/// Errors surfaced by the portal and its service adapters.
///
/// Service bring-up failures are fatal: there is no retry path for a portal
/// whose HTTP or DNS side never came up. The only recoverable failure, a
/// failed scan, is handled inside the state machine and never appears here.
#[derive(Debug)]
pub enum PortalError {
    /// Invalid configuration parameter.
    InvalidConfig(&'static str),
    /// Radio driver failure (mode switch, AP bring-up).
    Radio(String),
    /// HTTP service failed to bind or start.
    HttpBind(std::io::Error),
    /// HTTP service failed while receiving a request.
    Http(std::io::Error),
    /// DNS responder failed to bind.
    DnsBind(std::io::Error),
    /// DNS responder failed while receiving a query.
    Dns(std::io::Error),
}

impl std::fmt::Display for PortalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
            Self::Radio(msg) => write!(f, "radio error: {}", msg),
            Self::HttpBind(e) => write!(f, "http service failed to start: {}", e),
            Self::Http(e) => write!(f, "http service error: {}", e),
            Self::DnsBind(e) => write!(f, "dns responder failed to start: {}", e),
            Self::Dns(e) => write!(f, "dns responder error: {}", e),
        }
    }
}

impl std::error::Error for PortalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpBind(e) | Self::Http(e) | Self::DnsBind(e) | Self::Dns(e) => Some(e),
            _ => None,
        }
    }
}
