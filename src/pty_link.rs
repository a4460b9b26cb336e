//! Keyboard link into a program running in a PTY.
//!
//! [`PtyLink`] plays the role of the keyboard hardware for both transports.
//! Key reports are held until release and then translated into the bytes a
//! terminal would produce for the same keystroke:
//!
//! | Report | Bytes |
//! |--------|-------|
//! | `ENTER`, `TAB`, `ESC`, `BACKSPACE` | `\r`, `\t`, `ESC`, `DEL` |
//! | arrows, `HOME`, `END` | `ESC [ A` .. `ESC [ F` |
//! | `DELETE`, `INSERT`, `PAGEUP`, `PAGEDOWN`, `F5`.. | `ESC [ n ~` |
//! | `F1`..`F4` | `ESC O P` .. `ESC O S` |
//! | Ctrl + letter | the control character (`CTRL c` is `0x03`) |
//! | Shift + letter | the uppercase letter |
//! | Alt + anything | `ESC` prefix |
//!
//! GUI has no terminal meaning and is dropped. Keys with no terminal
//! encoding (`CAPSLOCK`, `PRINTSCREEN`) produce nothing.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, trace};

use crate::error::LinkError;
use crate::keys::{
    KEY_BACKSPACE, KEY_DELETE, KEY_DOWN, KEY_END, KEY_ENTER, KEY_ESC, KEY_F1, KEY_HOME,
    KEY_INSERT, KEY_LEFT, KEY_PAGE_DOWN, KEY_PAGE_UP, KEY_RIGHT, KEY_TAB, KEY_UP, KeyCode,
    ModifierMask,
};
use crate::transport::{RadioLink, UsbLink};

const ESC: u8 = 0x1b;

/// First `Keyboard.h` modifier press code; the eight modifiers follow in
/// report-bit order.
const MODIFIER_CODE_BASE: KeyCode = 0x80;

pub struct PtyLink {
    writer: Box<dyn Write + Send>,
    alive: Arc<AtomicBool>,
    key: KeyCode,
    modifiers: ModifierMask,
    advertising: Option<String>,
}

impl PtyLink {
    /// `alive` is shared with the PTY reader, which clears it when the
    /// program exits.
    pub fn new(writer: Box<dyn Write + Send>, alive: Arc<AtomicBool>) -> Self {
        Self {
            writer,
            alive,
            key: 0,
            modifiers: ModifierMask::NONE,
            advertising: None,
        }
    }

    fn host_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        if bytes.is_empty() {
            return Ok(());
        }
        if !self.host_alive() {
            return Err(LinkError::new("host program has exited"));
        }
        self.writer
            .write_all(bytes)
            .and_then(|()| self.writer.flush())
            .map_err(|e| LinkError::new(format!("PTY write failed: {e}")))
    }

    /// Translate and write the held report, then clear it.
    fn flush_report(&mut self) -> Result<(), LinkError> {
        let bytes = encode_keystroke(self.key, self.modifiers);
        trace!("report 0x{:02X} {:?} -> {:?}", self.key, self.modifiers, bytes);
        self.key = 0;
        self.modifiers = ModifierMask::NONE;
        self.write(&bytes)
    }
}

impl UsbLink for PtyLink {
    fn is_mounted(&self) -> bool {
        self.host_alive()
    }

    fn press(&mut self, code: KeyCode) {
        match code.checked_sub(MODIFIER_CODE_BASE) {
            Some(bit) if bit < 8 => self.modifiers |= ModifierMask::from_bits(1 << bit),
            _ => self.key = code,
        }
    }

    fn release_all(&mut self) {
        if let Err(e) = self.flush_report() {
            debug!("dropped key report: {}", e);
        }
    }

    fn print(&mut self, text: &str) {
        if let Err(e) = self.write(text.as_bytes()) {
            debug!("dropped text: {}", e);
        }
    }
}

impl RadioLink for PtyLink {
    fn start(&mut self, identity: &str) -> Result<(), LinkError> {
        if !self.host_alive() {
            return Err(LinkError::new("host program has exited"));
        }
        info!("Advertising as {:?}", identity);
        self.advertising = Some(identity.to_string());
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(identity) = self.advertising.take() {
            info!("Stopped advertising as {:?}", identity);
        }
    }

    fn is_connected(&mut self) -> bool {
        self.advertising.is_some() && self.host_alive()
    }

    fn press_raw(&mut self, key: KeyCode, modifiers: ModifierMask) -> Result<(), LinkError> {
        self.key = key;
        self.modifiers = modifiers;
        Ok(())
    }

    fn release_all(&mut self) -> Result<(), LinkError> {
        self.flush_report()
    }

    fn print(&mut self, text: &str) -> Result<(), LinkError> {
        self.write(text.as_bytes())
    }
}

/// Bytes a terminal receives for `key` pressed with `modifiers`.
pub fn encode_keystroke(key: KeyCode, modifiers: ModifierMask) -> Vec<u8> {
    let ctrl = modifiers.has_either(ModifierMask::CTRL_LEFT);
    let shift = modifiers.has_either(ModifierMask::SHIFT_LEFT);
    let alt = modifiers.has_either(ModifierMask::ALT_LEFT);

    let mut bytes = match key {
        0 => Vec::new(),
        KEY_ENTER => vec![b'\r'],
        KEY_TAB if shift => vec![ESC, b'[', b'Z'],
        KEY_TAB => vec![b'\t'],
        KEY_ESC => vec![ESC],
        KEY_BACKSPACE => vec![0x7f],
        KEY_UP => csi(b"A"),
        KEY_DOWN => csi(b"B"),
        KEY_RIGHT => csi(b"C"),
        KEY_LEFT => csi(b"D"),
        KEY_HOME => csi(b"H"),
        KEY_END => csi(b"F"),
        KEY_INSERT => csi(b"2~"),
        KEY_DELETE => csi(b"3~"),
        KEY_PAGE_UP => csi(b"5~"),
        KEY_PAGE_DOWN => csi(b"6~"),
        k if (KEY_F1..KEY_F1 + 12).contains(&k) => function_key(k - KEY_F1 + 1),
        k if k.is_ascii() => vec![ascii_keystroke(k, ctrl, shift)],
        _ => Vec::new(),
    };

    if alt && !bytes.is_empty() {
        bytes.insert(0, ESC);
    }
    bytes
}

fn csi(tail: &[u8]) -> Vec<u8> {
    let mut bytes = vec![ESC, b'['];
    bytes.extend_from_slice(tail);
    bytes
}

fn function_key(n: u8) -> Vec<u8> {
    match n {
        1..=4 => vec![ESC, b'O', b'P' + (n - 1)],
        _ => {
            let code: u8 = match n {
                5 => 15,
                6..=10 => n + 11,
                _ => n + 12,
            };
            csi(format!("{code}~").as_bytes())
        }
    }
}

fn ascii_keystroke(ch: u8, ctrl: bool, shift: bool) -> u8 {
    if ctrl {
        match ch.to_ascii_uppercase() {
            c @ (b'@'..=b'_') => c & 0x1f,
            b'?' => 0x7f,
            _ => ch,
        }
    } else if shift {
        ch.to_ascii_uppercase()
    } else {
        ch
    }
}
