use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, channel};
use std::thread;

use tracing::debug;

/// Spawns a background thread to read from a PTY.
///
/// `alive` is cleared once the PTY reaches EOF or fails, which is how the
/// links learn that the host went away.
pub fn spawn_reader<R: Read + Send + 'static>(
    mut reader: R,
    alive: Arc<AtomicBool>,
) -> Receiver<Vec<u8>> {
    let (tx, rx) = channel();

    thread::spawn(move || {
        let mut buffer = [0u8; 4096];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break, // EOF
                Ok(n) => {
                    if tx.send(buffer[..n].to_vec()).is_err() {
                        break; // Receiver dropped
                    }
                }
                Err(e) => {
                    debug!("PTY read failed: {}", e);
                    break;
                }
            }
        }
        alive.store(false, Ordering::SeqCst);
    });

    rx
}
