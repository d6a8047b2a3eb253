//! Captive-portal core.
//!
//! Platform-independent pieces of the provisioning flow:
//!
//! - [`machine`] - bring-up/teardown state machine driven by `step()`
//! - [`registry`] - scan result deduplication and ranking
//! - [`credentials`] - the captured SSID/passphrase pair
//! - [`config`] - fixed portal network identity and service ports
//!
//! Everything here is testable on the host; the radio and the network
//! services arrive through the traits in [`crate::service`].

mod config;
mod credentials;
mod machine;
mod page;
mod registry;

pub use config::{PortalConfig, MAX_AP_SSID_LEN};
pub use credentials::Credentials;
pub use machine::{PortalState, PortalStateMachine, INDEX_ROUTE, SUBMIT_ROUTE};
pub use registry::{AccessPointRegistry, ApObservation, ApRecord, SecurityMode};
