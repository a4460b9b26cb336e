//! Wireless (BLE) HID transport
//!
//! The radio stack needs time to settle after every state change and its
//! connectivity query is expensive, so this transport wraps the link in an
//! explicit lifecycle:
//!
//! ```text
//! Idle -> Initializing -> Ready <-> Disconnected
//!                           |            |
//!                           +-> ShuttingDown -> Idle
//! ```
//!
//! Sends are only attempted in `Ready`. Connectivity is polled at most once
//! per `poll_interval` (once per `startup_poll_interval` during the first
//! `startup_window` after bring-up); between polls the cached value is
//! returned.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{ConnectionState, HidTransport};
use crate::clock::Clock;
use crate::error::{LinkError, TransportError};
use crate::keys::{KeyCode, ModifierMask};

/// The BLE keyboard stack.
pub trait RadioLink: Send {
    /// Create the HID service and start advertising as `identity`.
    fn start(&mut self, identity: &str) -> Result<(), LinkError>;

    /// Stop advertising and release the radio.
    fn stop(&mut self);

    /// Live query of the GATT connection.
    fn is_connected(&mut self) -> bool;

    /// Send modifiers and key in a single report.
    fn press_raw(&mut self, key: KeyCode, modifiers: ModifierMask) -> Result<(), LinkError>;

    fn release_all(&mut self) -> Result<(), LinkError>;

    fn print(&mut self, text: &str) -> Result<(), LinkError>;
}

/// Outcome of a successful [`WirelessTransport::bind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindStatus {
    /// The stack was brought up with the requested identity.
    Started,
    /// Already running with the requested identity; nothing was done.
    Reused,
    /// Already running with a different identity. The link is never
    /// reinitialized while it may be connected, so `active` is still the
    /// advertised identity.
    IdentityKept { active: String },
}

/// Minimum waits and polling intervals of the wireless lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WirelessTiming {
    pub key_hold: Duration,
    pub release_settle: Duration,
    pub text_settle: Duration,
    /// Extra wait before a combo while inside `early_send_window`.
    pub early_send_settle: Duration,
    pub early_send_window: Duration,
    pub poll_interval: Duration,
    pub startup_poll_interval: Duration,
    pub startup_window: Duration,
    pub pre_init_settle: Duration,
    pub post_create_settle: Duration,
    pub post_begin_settle: Duration,
    pub shutdown_settle: Duration,
}

impl Default for WirelessTiming {
    fn default() -> Self {
        Self {
            key_hold: Duration::from_millis(100),
            release_settle: Duration::from_millis(100),
            text_settle: Duration::from_millis(20),
            early_send_settle: Duration::from_millis(50),
            early_send_window: Duration::from_secs(3),
            poll_interval: Duration::from_millis(100),
            startup_poll_interval: Duration::from_millis(500),
            startup_window: Duration::from_secs(2),
            pre_init_settle: Duration::from_millis(200),
            post_create_settle: Duration::from_millis(100),
            post_begin_settle: Duration::from_millis(100),
            shutdown_settle: Duration::from_millis(500),
        }
    }
}

/// BLE transport over a [`RadioLink`].
pub struct WirelessTransport<L: RadioLink> {
    link: L,
    clock: Arc<dyn Clock>,
    timing: WirelessTiming,
    state: ConnectionState,
    identity: Option<String>,
    ready_since: Option<Instant>,
    last_poll: Option<Instant>,
    connected: bool,
}

impl<L: RadioLink> WirelessTransport<L> {
    pub fn new(link: L, clock: Arc<dyn Clock>) -> Self {
        Self::with_timing(link, clock, WirelessTiming::default())
    }

    pub fn with_timing(link: L, clock: Arc<dyn Clock>, timing: WirelessTiming) -> Self {
        Self {
            link,
            clock,
            timing,
            state: ConnectionState::Idle,
            identity: None,
            ready_since: None,
            last_poll: None,
            connected: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Identity currently advertised, if the stack is up.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Bring the stack up advertising as `identity`.
    pub fn bind(&mut self, identity: &str) -> Result<BindStatus, TransportError> {
        match self.state {
            ConnectionState::Initializing | ConnectionState::ShuttingDown => {
                warn!("BLE bind blocked: {:?}", self.state);
                return Err(TransportError::Busy(self.state));
            }
            ConnectionState::Ready | ConnectionState::Disconnected => {
                let active = self.identity.clone().unwrap_or_default();
                if active == identity {
                    debug!("BLE reusing running stack: {}", active);
                    return Ok(BindStatus::Reused);
                }
                warn!(
                    "BLE identity change to {:?} ignored while running; still advertising {:?}",
                    identity, active
                );
                return Ok(BindStatus::IdentityKept { active });
            }
            ConnectionState::Idle => {}
        }

        self.state = ConnectionState::Initializing;
        self.clock.sleep(self.timing.pre_init_settle);

        if let Err(e) = self.bring_up(identity) {
            warn!("BLE bring-up failed: {}", e);
            self.link.stop();
            self.identity = None;
            self.state = ConnectionState::Idle;
            return Err(TransportError::BringUp(e.to_string()));
        }

        let now = self.clock.now();
        self.identity = Some(identity.to_string());
        self.ready_since = Some(now);
        self.last_poll = None;
        self.connected = false;
        self.state = ConnectionState::Ready;
        info!("BLE keyboard up: {}", identity);
        Ok(BindStatus::Started)
    }

    fn bring_up(&mut self, identity: &str) -> Result<(), LinkError> {
        self.clock.sleep(self.timing.post_create_settle);
        self.link.start(identity)?;
        self.clock.sleep(self.timing.post_begin_settle);
        Ok(())
    }

    /// Tear the stack down and return to `Idle`. No-op when already idle.
    pub fn unbind(&mut self) {
        if self.state == ConnectionState::Idle {
            return;
        }
        self.state = ConnectionState::ShuttingDown;
        self.link.stop();
        self.clock.sleep(self.timing.shutdown_settle);

        self.identity = None;
        self.ready_since = None;
        self.last_poll = None;
        self.connected = false;
        self.state = ConnectionState::Idle;
        info!("BLE keyboard stopped");
    }

    /// Refresh connectivity from the link right away, bypassing the debounce.
    ///
    /// Meant for radio connect/disconnect callbacks.
    pub fn handle_connection(&mut self) {
        if self.is_up() {
            self.poll(self.clock.now());
        } else {
            self.connected = false;
        }
    }

    fn is_up(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::Ready | ConnectionState::Disconnected
        )
    }

    fn in_window(&self, now: Instant, window: Duration) -> bool {
        self.ready_since
            .is_some_and(|since| now.saturating_duration_since(since) < window)
    }

    fn poll(&mut self, now: Instant) {
        self.last_poll = Some(now);
        self.connected = self.link.is_connected();
        let next = if self.connected {
            ConnectionState::Ready
        } else {
            ConnectionState::Disconnected
        };
        if next != self.state {
            info!("BLE {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Gate shared by all sends: not mid-transition, link reported
    /// connected, state `Ready`.
    fn check_sendable(&mut self) -> Result<(), TransportError> {
        if matches!(
            self.state,
            ConnectionState::Initializing | ConnectionState::ShuttingDown
        ) {
            warn!("BLE send blocked: {:?}", self.state);
            return Err(TransportError::NotReady(self.state));
        }
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        if self.state != ConnectionState::Ready {
            return Err(TransportError::NotReady(self.state));
        }
        Ok(())
    }

    fn mark_failed(&mut self, err: LinkError) -> TransportError {
        warn!("BLE send failed, marking disconnected: {}", err);
        self.connected = false;
        TransportError::Link(err)
    }

    fn press_and_release(
        &mut self,
        key: KeyCode,
        modifiers: ModifierMask,
    ) -> Result<(), LinkError> {
        self.link.press_raw(key, modifiers)?;
        self.clock.sleep(self.timing.key_hold);
        self.link.release_all()?;
        self.clock.sleep(self.timing.release_settle);
        Ok(())
    }
}

impl<L: RadioLink> HidTransport for WirelessTransport<L> {
    fn send_key_combo(
        &mut self,
        key: KeyCode,
        modifiers: ModifierMask,
    ) -> Result<(), TransportError> {
        self.check_sendable()?;

        if self.in_window(self.clock.now(), self.timing.early_send_window) {
            self.clock.sleep(self.timing.early_send_settle);
        }

        debug!("BLE combo key=0x{:02X} mods=0x{:02X}", key, modifiers.bits());
        self.press_and_release(key, modifiers)
            .map_err(|e| self.mark_failed(e))
    }

    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.check_sendable()?;
        self.link.print(text).map_err(|e| self.mark_failed(e))?;
        self.clock.sleep(self.timing.text_settle);
        Ok(())
    }

    fn send_raw_sequence(&mut self, keys: &str) -> Result<(), TransportError> {
        warn!("BLE raw key sequence not supported: {}", keys);
        Err(TransportError::Unsupported(keys.to_string()))
    }

    fn pause(&mut self, duration: Duration) {
        self.clock.sleep(duration);
    }

    fn is_connected(&mut self) -> bool {
        if !self.is_up() {
            return false;
        }

        let now = self.clock.now();
        let interval = if self.in_window(now, self.timing.startup_window) {
            self.timing.startup_poll_interval
        } else {
            self.timing.poll_interval
        };
        let due = self
            .last_poll
            .is_none_or(|last| now.saturating_duration_since(last) >= interval);
        if due {
            self.poll(now);
        }
        self.connected
    }
}

impl<L: RadioLink> Drop for WirelessTransport<L> {
    fn drop(&mut self) {
        if self.state != ConnectionState::Idle {
            self.link.stop();
        }
    }
}
