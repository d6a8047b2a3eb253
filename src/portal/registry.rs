//! Access point discovery registry.
//!
//! A radio scan reports every beacon it heard, so the same network shows up
//! once per access point (and once per repeated beacon). The registry folds
//! those raw observations into one record per distinct network name, keeping
//! the field set from the strongest sighting.

/// Security classification of a visible network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    /// No authentication required to join.
    Open,
    /// Any authenticated mode (WEP/WPA/WPA2/...).
    Secured,
}

/// One raw scan result, as reported by the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApObservation {
    /// Network name. May repeat across observations within one scan.
    pub ssid: String,
    /// Received signal strength in dBm. Higher (less negative) is stronger:
    /// -40 dBm beats -80 dBm.
    pub signal_dbm: i32,
    /// Security classification at the time of the observation.
    pub security: SecurityMode,
}

impl ApObservation {
    /// Convenience constructor used heavily by callers building scan results.
    pub fn new(ssid: impl Into<String>, signal_dbm: i32, security: SecurityMode) -> Self {
        Self {
            ssid: ssid.into(),
            signal_dbm,
            security,
        }
    }
}

/// One distinct visible network, after deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApRecord {
    /// Network name, unique within a registry.
    pub ssid: String,
    /// Strongest signal seen for this name, in dBm (higher = stronger).
    pub signal_dbm: i32,
    /// Security mode taken from the same observation as `signal_dbm`.
    pub security: SecurityMode,
}

impl From<ApObservation> for ApRecord {
    fn from(obs: ApObservation) -> Self {
        Self {
            ssid: obs.ssid,
            signal_dbm: obs.signal_dbm,
            security: obs.security,
        }
    }
}

/// Ordered collection of distinct networks, insertion order = discovery order.
///
/// The registry is rebuilt from scratch on every scan cycle; records never
/// survive from one cycle to the next.
#[derive(Debug, Default)]
pub struct AccessPointRegistry {
    records: Vec<ApRecord>,
}

impl AccessPointRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registry contents with the deduplicated observations.
    ///
    /// Observations are folded in reported order. A name seen for the first
    /// time is appended; a repeat updates the stored strength and security
    /// only when strictly stronger, without moving the record. Expected
    /// cardinality is tens of networks, so lookup is a linear scan.
    pub fn rebuild<I>(&mut self, observations: I)
    where
        I: IntoIterator<Item = ApObservation>,
    {
        self.records.clear();
        for obs in observations {
            match self.records.iter_mut().find(|r| r.ssid == obs.ssid) {
                Some(existing) => {
                    if obs.signal_dbm > existing.signal_dbm {
                        existing.signal_dbm = obs.signal_dbm;
                        existing.security = obs.security;
                    }
                }
                None => self.records.push(ApRecord::from(obs)),
            }
        }
    }

    /// Deduplicated records in discovery order.
    pub fn records(&self) -> &[ApRecord] {
        &self.records
    }

    /// Number of distinct networks.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the last scan saw no networks (or no scan completed yet).
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(ssid: &str, signal_dbm: i32, security: SecurityMode) -> ApObservation {
        ApObservation::new(ssid, signal_dbm, security)
    }

    #[test]
    fn test_empty_scan_yields_empty_registry() {
        let mut registry = AccessPointRegistry::new();
        registry.rebuild(Vec::new());
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_distinct_names_kept_in_discovery_order() {
        let mut registry = AccessPointRegistry::new();
        registry.rebuild(vec![
            obs("Gamma", -70, SecurityMode::Secured),
            obs("Alpha", -50, SecurityMode::Open),
            obs("Beta", -60, SecurityMode::Secured),
        ]);

        let names: Vec<&str> = registry.records().iter().map(|r| r.ssid.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Alpha", "Beta"]);
    }

    #[test]
    fn test_duplicate_keeps_strongest() {
        let mut registry = AccessPointRegistry::new();
        registry.rebuild(vec![
            obs("Net1", -80, SecurityMode::Open),
            obs("Net2", -50, SecurityMode::Secured),
            obs("Net1", -40, SecurityMode::Open),
        ]);

        assert_eq!(
            registry.records(),
            &[
                ApRecord {
                    ssid: "Net1".to_string(),
                    signal_dbm: -40,
                    security: SecurityMode::Open,
                },
                ApRecord {
                    ssid: "Net2".to_string(),
                    signal_dbm: -50,
                    security: SecurityMode::Secured,
                },
            ]
        );
    }

    #[test]
    fn test_weaker_duplicate_does_not_replace() {
        let mut registry = AccessPointRegistry::new();
        registry.rebuild(vec![
            obs("Net1", -40, SecurityMode::Secured),
            obs("Net1", -80, SecurityMode::Open),
        ]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.records()[0].signal_dbm, -40);
        assert_eq!(registry.records()[0].security, SecurityMode::Secured);
    }

    #[test]
    fn test_security_follows_strongest_observation() {
        // Two access points advertise the same name with different security;
        // the record must take both fields from the stronger one.
        let mut registry = AccessPointRegistry::new();
        registry.rebuild(vec![
            obs("Mixed", -75, SecurityMode::Open),
            obs("Mixed", -45, SecurityMode::Secured),
        ]);

        assert_eq!(registry.records()[0].security, SecurityMode::Secured);
        assert_eq!(registry.records()[0].signal_dbm, -45);
    }

    #[test]
    fn test_equal_strength_keeps_first_seen() {
        let mut registry = AccessPointRegistry::new();
        registry.rebuild(vec![
            obs("Tie", -55, SecurityMode::Open),
            obs("Tie", -55, SecurityMode::Secured),
        ]);

        // Strictly-stronger updates only, so the first observation wins a tie.
        assert_eq!(registry.records()[0].security, SecurityMode::Open);
    }

    #[test]
    fn test_rebuild_replaces_prior_contents() {
        let mut registry = AccessPointRegistry::new();
        registry.rebuild(vec![
            obs("Old1", -40, SecurityMode::Open),
            obs("Old2", -60, SecurityMode::Secured),
        ]);
        registry.rebuild(vec![obs("New", -70, SecurityMode::Secured)]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.records()[0].ssid, "New");
    }

    #[test]
    fn test_rebuild_to_empty_clears_registry() {
        let mut registry = AccessPointRegistry::new();
        registry.rebuild(vec![obs("Net", -40, SecurityMode::Open)]);
        registry.rebuild(Vec::new());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_strongest_position_is_first_seen_position() {
        // The strongest duplicate appears last, but the record stays where the
        // name was first discovered.
        let mut registry = AccessPointRegistry::new();
        registry.rebuild(vec![
            obs("A", -80, SecurityMode::Open),
            obs("B", -50, SecurityMode::Open),
            obs("A", -30, SecurityMode::Open),
        ]);

        assert_eq!(registry.records()[0].ssid, "A");
        assert_eq!(registry.records()[0].signal_dbm, -30);
        assert_eq!(registry.records()[1].ssid, "B");
    }
}
