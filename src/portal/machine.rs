//! Portal bring-up state machine.
//!
//! Sequences scan → soft-AP → HTTP → DNS → serve, then waits for the
//! operator to submit a selection. Driven by an external loop calling
//! [`PortalStateMachine::step`]; every call does at most one transition or
//! one unit of polling work and never blocks.

use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use super::config::PortalConfig;
use super::credentials::Credentials;
use super::page;
use super::registry::AccessPointRegistry;
use crate::service::{PortalDns, PortalError, PortalHttp, RadioControl, ScanStatus};

/// Path of the credential submission route.
pub const SUBMIT_ROUTE: &str = "/submit";

/// Path of the index route.
pub const INDEX_ROUTE: &str = "/";

/// Phase of the portal lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalState {
    /// Request a network scan.
    BeginScan,
    /// Scan in flight; polling for its outcome.
    Scanning,
    /// Bring the soft access point up.
    ActivateAccessPoint,
    /// Create and start the HTTP service (first activation only).
    StartHttp,
    /// Create and start the DNS responder (first activation only).
    StartDns,
    /// Portal is up; polling DNS and HTTP for operator traffic.
    Serving,
    /// Credentials captured; nothing left to do.
    Done,
}

/// State shared between the stepper and the HTTP route handlers.
///
/// The handlers run inside `poll_once` on the same thread as `step`, but the
/// mutex keeps the invariant intact if an adapter ever dispatches from its
/// own thread.
struct PortalShared {
    registry: AccessPointRegistry,
    submitted: Option<Credentials>,
}

/// Captive-portal state machine.
///
/// Owns the registry and the submission slot, and drives the three
/// collaborators. One instance at a time: the handle is an owned value and
/// the collaborators move in at construction.
///
/// # Example
///
/// ```no_run
/// use captive_portal_esp32::{
///     HostRadio, PortalConfig, PortalStateMachine, TinyHttpPortal, UdpDnsResponder,
/// };
///
/// let radio = HostRadio::new(Vec::new());
/// let machine = PortalStateMachine::new(
///     radio,
///     TinyHttpPortal::new(),
///     UdpDnsResponder::new(),
///     PortalConfig::default(),
/// );
/// let mut machine = machine.unwrap();
/// loop {
///     if machine.step().unwrap() {
///         break;
///     }
/// }
/// let creds = machine.take_credentials();
/// println!("selected {}", creds.ssid);
/// ```
pub struct PortalStateMachine<R, H, D> {
    radio: R,
    http: H,
    dns: D,
    config: PortalConfig,
    state: PortalState,
    http_started: bool,
    shared: Arc<Mutex<PortalShared>>,
}

impl<R, H, D> PortalStateMachine<R, H, D>
where
    R: RadioControl,
    H: PortalHttp,
    D: PortalDns,
{
    /// Create a machine in the [`PortalState::BeginScan`] state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(radio: R, http: H, dns: D, config: PortalConfig) -> Result<Self, PortalError> {
        config.validate()?;
        Ok(Self {
            radio,
            http,
            dns,
            config,
            state: PortalState::BeginScan,
            http_started: false,
            shared: Arc::new(Mutex::new(PortalShared {
                registry: AccessPointRegistry::new(),
                submitted: None,
            })),
        })
    }

    /// Current phase, for logging and tests.
    pub fn state(&self) -> PortalState {
        self.state
    }

    /// Advance the portal by at most one transition or one unit of polling.
    ///
    /// Returns `Ok(true)` once credentials have been captured; safe to keep
    /// calling afterwards.
    ///
    /// # Errors
    ///
    /// Radio mode switches and HTTP/DNS bring-up failures are fatal and
    /// surface here. A failed scan is not an error; it restarts scanning.
    pub fn step(&mut self) -> Result<bool, PortalError> {
        match self.state {
            PortalState::BeginScan => {
                self.radio.set_station_mode()?;
                self.radio.disconnect()?;
                self.radio.start_scan(self.config.scan_hidden);
                debug!("scan requested (hidden networks: {})", self.config.scan_hidden);
                self.state = PortalState::Scanning;
                Ok(false)
            }
            PortalState::Scanning => {
                match self.radio.scan_status() {
                    ScanStatus::Running => {}
                    ScanStatus::Failed => {
                        warn!("network scan failed, restarting scan");
                        self.state = PortalState::BeginScan;
                    }
                    ScanStatus::Complete(count) => {
                        let observations: Vec<_> =
                            (0..count).filter_map(|i| self.radio.observation(i)).collect();
                        let mut shared = self.shared.lock().unwrap();
                        shared.registry.rebuild(observations);
                        info!(
                            "scan complete: {} observations, {} distinct networks",
                            count,
                            shared.registry.len()
                        );
                        self.state = PortalState::ActivateAccessPoint;
                    }
                }
                Ok(false)
            }
            PortalState::ActivateAccessPoint => {
                self.radio.set_access_point_mode(
                    self.config.address,
                    self.config.address,
                    self.config.netmask,
                )?;
                self.radio.start_access_point(&self.config.ap_ssid)?;
                info!(
                    "access point '{}' up at {}",
                    self.config.ap_ssid, self.config.address
                );
                // On a rescan the services are already running; skip straight
                // back to serving.
                self.state = if self.http_started {
                    PortalState::Serving
                } else {
                    PortalState::StartHttp
                };
                Ok(false)
            }
            PortalState::StartHttp => {
                self.register_routes()?;
                self.http.start(self.config.http_port)?;
                self.http_started = true;
                info!("portal http listening on port {}", self.config.http_port);
                self.state = PortalState::StartDns;
                Ok(false)
            }
            PortalState::StartDns => {
                self.dns.configure(self.config.dns_ttl);
                self.dns
                    .start(self.config.dns_port, "*", self.config.address)?;
                info!(
                    "portal dns answering every query with {} on port {}",
                    self.config.address, self.config.dns_port
                );
                self.state = PortalState::Serving;
                Ok(false)
            }
            PortalState::Serving => {
                self.dns.poll_once()?;
                self.http.poll_once()?;
                // The submit handler only deposits into the slot; the
                // Serving -> Done transition happens here so state has a
                // single writer per step.
                if self.shared.lock().unwrap().submitted.is_some() {
                    info!("credentials submitted, portal complete");
                    self.state = PortalState::Done;
                    return Ok(true);
                }
                Ok(false)
            }
            PortalState::Done => Ok(true),
        }
    }

    /// Discard the current network list and scan again.
    ///
    /// Only meaningful while serving (before a submission); the access point
    /// and both services are reused when serving resumes. Ignored in any
    /// other phase.
    pub fn request_rescan(&mut self) {
        if self.state == PortalState::Serving {
            info!("rescan requested");
            self.state = PortalState::BeginScan;
        } else {
            debug!("rescan request ignored in state {:?}", self.state);
        }
    }

    /// Take the captured credentials.
    ///
    /// # Panics
    ///
    /// Panics if called before [`step`](Self::step) has returned `Ok(true)`,
    /// or a second time. Both are caller contract breaches.
    pub fn take_credentials(&mut self) -> Credentials {
        assert_eq!(
            self.state,
            PortalState::Done,
            "credentials requested before the portal completed"
        );
        self.shared
            .lock()
            .unwrap()
            .submitted
            .take()
            .expect("credentials already taken")
    }

    fn register_routes(&mut self) -> Result<(), PortalError> {
        let index_shared = Arc::clone(&self.shared);
        self.http.register_route(
            INDEX_ROUTE,
            Box::new(move |req| {
                let shared = index_shared.lock().unwrap();
                let body = page::render_index(&shared.registry, SUBMIT_ROUTE);
                req.respond(200, "text/html", &body);
            }),
        )?;

        let submit_shared = Arc::clone(&self.shared);
        self.http.register_route(
            SUBMIT_ROUTE,
            Box::new(move |req| {
                // Missing fields are captured as empty strings; the values
                // pass through untouched.
                let ssid = req.param("ssid").unwrap_or("").to_string();
                let pass = req.param("pass").unwrap_or("").to_string();
                let mut shared = submit_shared.lock().unwrap();
                if shared.submitted.is_none() {
                    info!("operator selected network '{}'", ssid);
                    shared.submitted = Some(Credentials::new(ssid, pass));
                } else {
                    debug!("ignoring repeat submission");
                }
                req.respond(200, "text/html", page::ACK_PAGE);
            }),
        )?;

        let index_url = self.config.index_url();
        self.http.register_catch_all(Box::new(move |req| {
            req.set_header("Location", &index_url);
            req.respond(302, "text/html", "");
        }))?;

        Ok(())
    }
}
