//! HID transport abstraction
//!
//! A transport delivers keyboard reports to the host computer. Two backends
//! implement [`HidTransport`]:
//!
//! - [`DirectTransport`]: wired USB. Always ready once the host has mounted
//!   the device; connectivity is a plain read of the mount status.
//! - [`WirelessTransport`]: BLE. Has an explicit bring-up/teardown lifecycle
//!   and caches connectivity because querying the radio stack is expensive.
//!
//! The hardware below each transport is abstracted again ([`UsbLink`],
//! [`RadioLink`]) so the lifecycle and timing rules can be exercised without
//! a device attached.

mod direct;
mod preflight;
pub mod usb_events;
mod wireless;

pub use direct::{DirectTiming, DirectTransport, UsbLink};
pub use preflight::{PreflightConfig, verify_connection};
pub use wireless::{BindStatus, RadioLink, WirelessTiming, WirelessTransport};

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::error::TransportError;
use crate::keys::{KeyCode, ModifierMask};

/// Lifecycle of the wireless transport.
///
/// The direct transport has no lifecycle and never reports a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Initializing,
    Ready,
    Disconnected,
    ShuttingDown,
}

/// Capability interface the scheduler executes commands against.
///
/// Send operations never panic on link failure; they return an error and the
/// transport updates its own connectivity state.
pub trait HidTransport: Send {
    /// Press `modifiers` + `key` as one combo, then release everything.
    ///
    /// A `key` of `0` presses only the modifiers.
    fn send_key_combo(&mut self, key: KeyCode, modifiers: ModifierMask)
    -> Result<(), TransportError>;

    /// Type literal text.
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Forward a raw multi-key sequence. Chord sequencing is not implemented
    /// by either backend; both log the sequence and return
    /// [`TransportError::Unsupported`].
    fn send_raw_sequence(&mut self, keys: &str) -> Result<(), TransportError>;

    /// Block the calling thread for `duration`.
    fn pause(&mut self, duration: Duration);

    fn is_connected(&mut self) -> bool;
}

/// Transport handle shared between the host loop and the scheduler.
///
/// All lifecycle transitions and sends go through the one mutex, so hardware
/// callbacks arriving on another thread are serialized with script execution.
pub type SharedTransport = Arc<Mutex<dyn HidTransport>>;

/// Wrap a transport so it can be bound to a scheduler while the host keeps a
/// typed handle for lifecycle calls.
pub fn shared<T: HidTransport + 'static>(transport: T) -> Arc<Mutex<T>> {
    Arc::new(Mutex::new(transport))
}
