//! Wired USB HID transport

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::HidTransport;
use super::usb_events::{UsbEvent, UsbEventSink};
use crate::clock::Clock;
use crate::error::TransportError;
use crate::keys::{KeyCode, ModifierMask};

/// Press codes for modifier keys in the `Keyboard.h` code space, indexed by
/// modifier bit (left Ctrl/Shift/Alt/GUI, then the right-hand ones).
const MODIFIER_PRESS_CODES: [KeyCode; 8] = [0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87];

/// The USB keyboard device stack.
///
/// Calls are fire-and-forget: the stack gives no error signal, so a press
/// that the host never sees is indistinguishable from one that it did.
pub trait UsbLink: Send {
    /// Whether the host has enumerated and mounted the device.
    fn is_mounted(&self) -> bool;

    fn press(&mut self, code: KeyCode);

    fn release_all(&mut self);

    fn print(&mut self, text: &str);
}

/// Minimum waits around USB reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectTiming {
    /// How long a combo is held before release.
    pub key_hold: Duration,
    /// Settle time after release-all.
    pub release_settle: Duration,
    /// Settle time after typing text.
    pub text_settle: Duration,
}

impl Default for DirectTiming {
    fn default() -> Self {
        Self {
            key_hold: Duration::from_millis(20),
            release_settle: Duration::from_millis(20),
            text_settle: Duration::from_millis(20),
        }
    }
}

impl DirectTiming {
    /// No waits at all. Useful with a link that needs no settling.
    pub fn immediate() -> Self {
        Self {
            key_hold: Duration::ZERO,
            release_settle: Duration::ZERO,
            text_settle: Duration::ZERO,
        }
    }
}

/// Wired transport over a [`UsbLink`].
///
/// Connectivity is read straight from the link on every call; there is no
/// cache and no grace period.
pub struct DirectTransport<L: UsbLink> {
    link: L,
    clock: Arc<dyn Clock>,
    timing: DirectTiming,
    events: Arc<UsbEventSink>,
}

impl<L: UsbLink> DirectTransport<L> {
    pub fn new(link: L, clock: Arc<dyn Clock>) -> Self {
        Self::with_timing(link, clock, DirectTiming::default())
    }

    pub fn with_timing(link: L, clock: Arc<dyn Clock>, timing: DirectTiming) -> Self {
        Self {
            link,
            clock,
            timing,
            events: Arc::new(UsbEventSink::default()),
        }
    }

    /// Sink that receives platform USB events for this device.
    ///
    /// Pass it to [`usb_events::install`](super::usb_events::install) so the
    /// platform callback reaches this transport.
    pub fn event_sink(&self) -> Arc<UsbEventSink> {
        Arc::clone(&self.events)
    }

    /// Most recent USB bus event, for diagnostics.
    pub fn last_event(&self) -> Option<UsbEvent> {
        self.events.last_event()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    fn require_mounted(&self) -> Result<(), TransportError> {
        if self.link.is_mounted() {
            Ok(())
        } else {
            Err(TransportError::NotConnected)
        }
    }
}

impl<L: UsbLink> HidTransport for DirectTransport<L> {
    fn send_key_combo(
        &mut self,
        key: KeyCode,
        modifiers: ModifierMask,
    ) -> Result<(), TransportError> {
        self.require_mounted()?;
        debug!("USB combo key=0x{:02X} mods=0x{:02X}", key, modifiers.bits());

        for (bit, code) in ModifierMask::ALL.iter().zip(MODIFIER_PRESS_CODES) {
            if modifiers.contains(*bit) {
                self.link.press(code);
            }
        }
        if key != 0 {
            self.link.press(key);
        }

        self.clock.sleep(self.timing.key_hold);
        self.link.release_all();
        self.clock.sleep(self.timing.release_settle);
        Ok(())
    }

    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.require_mounted()?;
        trace!("USB text {:?}", text);
        self.link.print(text);
        self.clock.sleep(self.timing.text_settle);
        Ok(())
    }

    fn send_raw_sequence(&mut self, keys: &str) -> Result<(), TransportError> {
        warn!("USB raw key sequence not supported: {}", keys);
        Err(TransportError::Unsupported(keys.to_string()))
    }

    fn pause(&mut self, duration: Duration) {
        self.clock.sleep(duration);
    }

    fn is_connected(&mut self) -> bool {
        self.link.is_mounted()
    }
}
