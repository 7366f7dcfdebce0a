//! Keyboard Actor: dedicated thread turning terminal key presses into
//! interrupts.
//!
//! Every key press becomes a PC set-1 scancode raised on the
//! [`InterruptLine`], just as a real keyboard controller would deliver it.
//! A few host keys are additionally forwarded to the front-end: F5 starts a
//! game, Esc and Ctrl-C quit.

use super::input::InterruptLine;
use super::messages::{HostEvent, IrqReturn};
use crate::error::{KeydanceError, Result};
use crossbeam_channel::Sender;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Set-1 make codes for the letter rows, top to bottom.
const QWERTY_ROWS: [(&str, u8); 3] = [("qwertyuiop", 0x10), ("asdfghjkl", 0x1E), ("zxcvbnm", 0x2C)];

/// PC set-1 make code for a terminal key, if the key has one.
pub fn scancode_for(code: KeyCode) -> Option<u8> {
    Some(match code {
        KeyCode::Esc => 0x01,
        KeyCode::Char(c @ '1'..='9') => c as u8 - b'1' + 0x02,
        KeyCode::Char('0') => 0x0B,
        KeyCode::Char('-') => 0x0C,
        KeyCode::Char('=') => 0x0D,
        KeyCode::Backspace => 0x0E,
        KeyCode::Tab => 0x0F,
        KeyCode::Enter => 0x1C,
        KeyCode::Char(' ') => 0x39,
        KeyCode::F(n @ 1..=10) => 0x3A + n,
        KeyCode::Char(c) => {
            let c = c.to_ascii_lowercase();
            return QWERTY_ROWS.iter().find_map(|&(row, base)| {
                let offset = row.find(c)?;
                u8::try_from(offset).ok().map(|offset| base + offset)
            });
        }
        _ => return None,
    })
}

/// Host action bound to a key, if any.
fn host_event_for(key: &KeyEvent) -> Option<HostEvent> {
    match key.code {
        KeyCode::F(5) => Some(HostEvent::Start),
        KeyCode::Esc => Some(HostEvent::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(HostEvent::Quit),
        _ => None,
    }
}

/// Keyboard actor that polls terminal events.
pub struct KeyboardActor {
    /// Handle to the keyboard thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
}

impl KeyboardActor {
    /// Spawn the keyboard thread.
    ///
    /// # Arguments
    ///
    /// * `line` - Interrupt line receiving every key press.
    /// * `host` - Channel for start/quit requests.
    /// * `poll_timeout` - How long to wait for events before checking shutdown.
    pub fn spawn(line: InterruptLine, host: Sender<HostEvent>, poll_timeout: Duration) -> Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("keydance-keyboard".to_string())
            .spawn(move || {
                Self::run_loop(&line, &host, &shutdown_clone, poll_timeout);
            })
            .map_err(|source| KeydanceError::Registration {
                resource: "keyboard source",
                source,
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    /// Signal the keyboard thread to shutdown.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the keyboard thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main polling loop.
    fn run_loop(
        line: &InterruptLine,
        host: &Sender<HostEvent>,
        shutdown: &Arc<AtomicBool>,
        poll_timeout: Duration,
    ) {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                let _ = host.send(HostEvent::Shutdown);
                break;
            }

            match event::poll(poll_timeout) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if !Self::deliver(line, host, &key) {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let _ = host.send(HostEvent::Error(e.to_string()));
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    let _ = host.send(HostEvent::Error(e.to_string()));
                }
            }
        }
    }

    /// Raise the key's interrupt and forward host keys.
    ///
    /// Returns `false` once the front-end has gone away.
    fn deliver(line: &InterruptLine, host: &Sender<HostEvent>, key: &KeyEvent) -> bool {
        if let Some(scancode) = scancode_for(key.code) {
            if line.raise(scancode) == IrqReturn::None {
                log::trace!("scancode {scancode:#04x} not claimed");
            }
        }
        match host_event_for(key) {
            Some(event) => host.send(event).is_ok(),
            None => true,
        }
    }
}

impl Drop for KeyboardActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
