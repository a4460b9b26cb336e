//! Test doubles shared by the unit tests.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{LinkError, TransportError};
use crate::keys::{KeyCode, ModifierMask};
use crate::transport::{HidTransport, RadioLink, UsbLink};

/// Everything a [`RecordingTransport`] was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Combo(KeyCode, ModifierMask),
    Text(String),
    Raw(String),
    Pause(Duration),
}

/// Transport that records actions instead of touching hardware.
pub struct RecordingTransport {
    actions: Arc<Mutex<Vec<Action>>>,
    connected: bool,
    scripted: VecDeque<bool>,
}

impl RecordingTransport {
    pub fn connected() -> Self {
        Self {
            actions: Arc::new(Mutex::new(Vec::new())),
            connected: true,
            scripted: VecDeque::new(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::connected()
        }
    }

    /// Answers for the next `is_connected` calls, before falling back to the
    /// fixed flag.
    pub fn script_connectivity(&mut self, answers: Vec<bool>) {
        self.scripted = answers.into();
    }

    /// Handle onto the action log that survives moving the transport.
    pub fn log(&self) -> Arc<Mutex<Vec<Action>>> {
        Arc::clone(&self.actions)
    }

    fn record(&mut self, action: Action) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.actions.lock().push(action);
        Ok(())
    }
}

impl HidTransport for RecordingTransport {
    fn send_key_combo(
        &mut self,
        key: KeyCode,
        modifiers: ModifierMask,
    ) -> Result<(), TransportError> {
        self.record(Action::Combo(key, modifiers))
    }

    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.record(Action::Text(text.to_string()))
    }

    fn send_raw_sequence(&mut self, keys: &str) -> Result<(), TransportError> {
        self.record(Action::Raw(keys.to_string()))
    }

    fn pause(&mut self, duration: Duration) {
        self.actions.lock().push(Action::Pause(duration));
    }

    fn is_connected(&mut self) -> bool {
        self.scripted.pop_front().unwrap_or(self.connected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsbCall {
    Press(KeyCode),
    ReleaseAll,
    Print(String),
}

/// USB link whose mount status can be flipped from the test.
#[derive(Clone)]
pub struct MockUsbLink {
    mounted: Arc<AtomicBool>,
    calls: Arc<Mutex<Vec<UsbCall>>>,
}

impl MockUsbLink {
    pub fn new(mounted: bool) -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(mounted)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_mounted(&self, mounted: bool) {
        self.mounted.store(mounted, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<UsbCall> {
        self.calls.lock().clone()
    }
}

impl UsbLink for MockUsbLink {
    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    fn press(&mut self, code: KeyCode) {
        self.calls.lock().push(UsbCall::Press(code));
    }

    fn release_all(&mut self) {
        self.calls.lock().push(UsbCall::ReleaseAll);
    }

    fn print(&mut self, text: &str) {
        self.calls.lock().push(UsbCall::Print(text.to_string()));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCall {
    Start(String),
    Stop,
    PressRaw(KeyCode, ModifierMask),
    ReleaseAll,
    Print(String),
}

/// Radio link with switchable connectivity and failure injection.
///
/// Connectivity queries are counted, not logged as calls.
#[derive(Clone)]
pub struct MockRadio {
    connected: Arc<AtomicBool>,
    fail_start: Arc<AtomicBool>,
    fail_sends: Arc<AtomicBool>,
    queries: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<RadioCall>>>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self {
            connected: Arc::new(AtomicBool::new(false)),
            fail_start: Arc::new(AtomicBool::new(false)),
            fail_sends: Arc::new(AtomicBool::new(false)),
            queries: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn connected_queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RadioCall> {
        self.calls.lock().clone()
    }

    fn send(&self, call: RadioCall) -> Result<(), LinkError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(LinkError::new("notify failed"));
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

impl RadioLink for MockRadio {
    fn start(&mut self, identity: &str) -> Result<(), LinkError> {
        self.calls.lock().push(RadioCall::Start(identity.to_string()));
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(LinkError::new("advertising failed"));
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.calls.lock().push(RadioCall::Stop);
    }

    fn is_connected(&mut self) -> bool {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.connected.load(Ordering::SeqCst)
    }

    fn press_raw(&mut self, key: KeyCode, modifiers: ModifierMask) -> Result<(), LinkError> {
        self.send(RadioCall::PressRaw(key, modifiers))
    }

    fn release_all(&mut self) -> Result<(), LinkError> {
        self.send(RadioCall::ReleaseAll)
    }

    fn print(&mut self, text: &str) -> Result<(), LinkError> {
        self.send(RadioCall::Print(text.to_string()))
    }
}
