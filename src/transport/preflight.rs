//! Connection check a host runs before starting a script on a flaky link.

use std::time::Duration;

use tracing::{debug, warn};

use super::HidTransport;
use crate::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreflightConfig {
    /// Give up if no stable connection is seen within this window.
    pub window: Duration,
    /// Wait between the first positive check and the confirming one.
    pub recheck_delay: Duration,
    /// Wait between negative checks.
    pub poll_interval: Duration,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(3),
            recheck_delay: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Return `true` once the transport reports connected twice in a row,
/// `recheck_delay` apart, within `window`.
///
/// A `false` result is the "connection unstable" condition: the host should
/// not start the script.
pub fn verify_connection(
    transport: &mut dyn HidTransport,
    clock: &dyn Clock,
    config: &PreflightConfig,
) -> bool {
    let start = clock.now();
    while clock.now().saturating_duration_since(start) < config.window {
        if transport.is_connected() {
            clock.sleep(config.recheck_delay);
            if transport.is_connected() {
                debug!("connection verified");
                return true;
            }
        }
        clock.sleep(config.poll_interval);
    }
    warn!("connection unstable after {:?}", config.window);
    false
}
