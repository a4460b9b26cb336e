//! Bridge from the platform's USB event callback to a transport instance.
//!
//! The device stack calls a fixed C entry point with no user pointer, so the
//! target has to live in a global. The global is private to this module;
//! everything else talks to an [`UsbEventSink`].

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Bus-level USB events reported by the device stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbEvent {
    Started,
    Stopped,
    Suspended,
    Resumed,
}

impl UsbEvent {
    /// Map a platform event id (`ARDUINO_USB_*_EVENT` order) to an event.
    pub fn from_raw(id: i32) -> Option<Self> {
        match id {
            0 => Some(Self::Started),
            1 => Some(Self::Stopped),
            2 => Some(Self::Suspended),
            3 => Some(Self::Resumed),
            _ => None,
        }
    }
}

/// Receives USB events on behalf of a transport.
#[derive(Debug, Default)]
pub struct UsbEventSink {
    last: Mutex<Option<UsbEvent>>,
}

impl UsbEventSink {
    pub fn on_event(&self, event: UsbEvent) {
        info!("USB {:?}", event);
        *self.last.lock() = Some(event);
    }

    pub fn last_event(&self) -> Option<UsbEvent> {
        *self.last.lock()
    }
}

static TARGET: Mutex<Option<Weak<UsbEventSink>>> = Mutex::new(None);

/// Route platform callbacks to `sink`, replacing any previous target.
pub fn install(sink: &Arc<UsbEventSink>) {
    *TARGET.lock() = Some(Arc::downgrade(sink));
}

/// Stop routing callbacks.
pub fn uninstall() {
    *TARGET.lock() = None;
}

/// Deliver one event to the installed sink, if it is still alive.
pub fn dispatch(event: UsbEvent) {
    let target = TARGET.lock().as_ref().and_then(Weak::upgrade);
    match target {
        Some(sink) => sink.on_event(event),
        None => debug!("USB {:?} with no sink installed", event),
    }
}

/// Entry point registered with the device stack.
pub extern "C" fn usb_event_callback(event_id: i32) {
    match UsbEvent::from_raw(event_id) {
        Some(event) => dispatch(event),
        None => debug!("ignoring USB event id {}", event_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test owns the global so parallel tests cannot race on it.
    #[test]
    fn test_callback_reaches_installed_sink() {
        let sink = Arc::new(UsbEventSink::default());
        install(&sink);

        usb_event_callback(2);
        assert_eq!(sink.last_event(), Some(UsbEvent::Suspended));

        usb_event_callback(99);
        assert_eq!(sink.last_event(), Some(UsbEvent::Suspended));

        dispatch(UsbEvent::Resumed);
        assert_eq!(sink.last_event(), Some(UsbEvent::Resumed));

        uninstall();
        dispatch(UsbEvent::Stopped);
        assert_eq!(sink.last_event(), Some(UsbEvent::Resumed));

        let dropped = Arc::new(UsbEventSink::default());
        install(&dropped);
        drop(dropped);
        dispatch(UsbEvent::Started);
        uninstall();
    }

    #[test]
    fn test_from_raw() {
        assert_eq!(UsbEvent::from_raw(0), Some(UsbEvent::Started));
        assert_eq!(UsbEvent::from_raw(3), Some(UsbEvent::Resumed));
        assert_eq!(UsbEvent::from_raw(4), None);
    }
}
