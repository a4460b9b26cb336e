//! # hidscript
//!
//! A keystroke-script engine for keyboard-emulating devices.
//!
//! hidscript reads a DuckyScript-style script and replays it as keyboard
//! reports over a HID transport, one line per scheduler tick so the host loop
//! stays responsive between commands. Two transports are provided: a wired
//! USB one and a Bluetooth LE one with its own bring-up lifecycle. The
//! bundled binary drives a program running in a PTY as if a keyboard were
//! plugged into it.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use hidscript::{DirectTransport, Scheduler, SystemClock, UsbLink, transport::shared};
//!
//! # struct Board;
//! # impl UsbLink for Board {
//! #     fn is_mounted(&self) -> bool { true }
//! #     fn press(&mut self, _code: u8) {}
//! #     fn release_all(&mut self) {}
//! #     fn print(&mut self, _text: &str) {}
//! # }
//! let transport = shared(DirectTransport::new(Board, Arc::new(SystemClock)));
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.set_transport(transport).unwrap();
//! scheduler.start("GUI r\nDELAY 500\nSTRINGLN notepad");
//! while !scheduler.is_complete() {
//!     scheduler.tick();
//! }
//! ```
//!
//! ## Script syntax
//!
//! Keywords are case-sensitive and one command goes on each line.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `REM text` | Comment |
//! | `REM_BLOCK` ... `REM_BLOCK END` | Block comment; every line in between is skipped |
//! | `DELAY 500` | Pause for 500 ms |
//! | `DEFAULTDELAY 50` | Pause 50 ms after every later command (`DEFAULT_DELAY` also works) |
//! | `STRING text` | Type `text` |
//! | `STRINGLN text` | Type `text`, then press Enter |
//! | `KEY CTRL ALT t` | Press a combo of modifiers and one key |
//! | `GUI r` | Press GUI plus the given keys (`WINDOWS` and `COMMAND` are aliases) |
//! | `ENTER` | Press Enter |
//! | `CTRL c`, `F5` | A line starting with a key or modifier name is a combo |
//! | `KEYS ...` | Raw multi-key sequence (not supported by the bundled transports) |
//!
//! Anything else is logged as an unknown command and skipped.
//!
//! ## Logging
//!
//! Everything is logged through `tracing`. Install any subscriber to see it;
//! the binary uses `tracing_subscriber` with `RUST_LOG` support.

pub mod clock;
pub mod command;
pub mod commands;
pub mod error;
pub mod keys;
pub mod parser;
pub mod pty;
pub mod pty_link;
pub mod pty_reader;
pub mod scheduler;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, Context};
pub use error::{LinkError, SchedulerError, TransportError};
pub use keys::{KeyCode, KeyTable, ModifierMask};
pub use parser::{Interpreter, split_lines};
pub use scheduler::{RunState, Scheduler, SchedulerConfig};
pub use transport::{
    BindStatus, ConnectionState, DirectTiming, DirectTransport, HidTransport, PreflightConfig,
    RadioLink, SharedTransport, UsbLink, WirelessTiming, WirelessTransport, verify_connection,
};
