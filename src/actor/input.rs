//! Input Handler: interrupt top half and the bottom-half worker thread.
//!
//! The top half ([`InterruptLine::raise`]) runs in whatever context
//! delivers the key event. It never takes the game lock and never blocks:
//! it checks the lock-free `running` mirror and queues the event. The
//! bottom half drains that queue on its own thread and does the real work
//! under the lock.

use super::shared::Core;
use super::messages::{IrqReturn, IrqWork};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Handle through which key events are delivered to the game.
///
/// Cheap to clone; every clone feeds the same bottom half. After the game
/// is unloaded every call returns [`IrqReturn::None`].
#[derive(Clone)]
pub struct InterruptLine {
    core: Arc<Core>,
    work: Sender<IrqWork>,
}

impl InterruptLine {
    /// Top half: deliver one key press as a set-1 scancode.
    pub fn raise(&self, scancode: u8) -> IrqReturn {
        if !self.core.is_running() {
            return IrqReturn::None;
        }

        match self.work.try_send(IrqWork::Key(scancode)) {
            Ok(()) => IrqReturn::WakeThread,
            Err(TrySendError::Full(_)) => {
                log::warn!("interrupt queue full, dropping scancode {scancode:#04x}");
                IrqReturn::Handled
            }
            Err(TrySendError::Disconnected(_)) => IrqReturn::None,
        }
    }
}

/// Bottom-half worker thread.
pub(crate) struct BottomHalf {
    /// Handle to the worker thread.
    handle: Option<JoinHandle<()>>,
    /// Used to post the deregistration marker.
    work: Sender<IrqWork>,
}

impl BottomHalf {
    /// Register the interrupt line: spawn the worker and hand out the top half.
    pub(crate) fn spawn(core: Arc<Core>, queue_depth: usize) -> io::Result<(Self, InterruptLine)> {
        let (work, work_rx) = bounded(queue_depth);
        let worker_core = Arc::clone(&core);

        let handle = thread::Builder::new()
            .name("keydance-irq".to_string())
            .spawn(move || {
                Self::run_loop(&worker_core, &work_rx);
            })?;

        let line = InterruptLine {
            core,
            work: work.clone(),
        };
        Ok((
            Self {
                handle: Some(handle),
                work,
            },
            line,
        ))
    }

    /// Deregister the line and wait for any in-flight event to finish.
    pub(crate) fn deregister(mut self) {
        let _ = self.work.send(IrqWork::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main bottom-half loop: one queued event per lock acquisition.
    fn run_loop(core: &Core, work: &Receiver<IrqWork>) {
        for item in work {
            match item {
                IrqWork::Key(scancode) => {
                    if let Some(press) = core.handle_key(scancode) {
                        log::trace!("scancode {scancode:#04x}: {press:?}");
                    }
                }
                IrqWork::Shutdown => break,
            }
        }
    }
}

impl Drop for BottomHalf {
    fn drop(&mut self) {
        let _ = self.work.try_send(IrqWork::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverConfig;
    use crate::game::ScriptedPattern;
    use crate::indicator::{IndicatorDriver, IndicatorMask, Indicators, MemoryController};
    use crossbeam_channel::unbounded;
    use std::time::{Duration, Instant};

    /// Lamps that report every write, then block until released.
    struct GatedLamps {
        entered: Sender<IndicatorMask>,
        gate: Receiver<()>,
    }

    impl Indicators for GatedLamps {
        fn set_indicators(&mut self, mask: IndicatorMask) -> Duration {
            let _ = self.entered.send(mask);
            let _ = self.gate.recv();
            Duration::ZERO
        }
    }

    fn core() -> (Arc<Core>, MemoryController) {
        let port = MemoryController::new();
        let driver = IndicatorDriver::new(
            port.clone(),
            DriverConfig {
                poll_quantum: Duration::ZERO,
                max_polls: 10,
            },
        );
        let core = Core::new(
            Duration::from_secs(1),
            Box::new(driver),
            Box::new(ScriptedPattern::constant(IndicatorMask::all())),
        );
        (Arc::new(core), port)
    }

    fn wait_for(mut done: impl FnMut() -> bool) -> bool {
        let give_up = Instant::now() + Duration::from_secs(2);
        while !done() {
            if Instant::now() > give_up {
                return false;
            }
            thread::sleep(Duration::from_millis(2));
        }
        true
    }

    #[test]
    fn test_disclaims_when_stopped() {
        let (core, port) = core();
        let (bottom, line) = BottomHalf::spawn(Arc::clone(&core), 4).unwrap();

        assert_eq!(line.raise(2), IrqReturn::None);
        assert_eq!(line.raise(0x1E), IrqReturn::None);

        bottom.deregister();
        assert!(port.writes().is_empty());
    }

    #[test]
    fn test_key_reaches_bottom_half() {
        let (core, port) = core();
        let (bottom, line) = BottomHalf::spawn(Arc::clone(&core), 4).unwrap();
        core.start(|_| {});
        core.tick();

        assert_eq!(line.raise(2), IrqReturn::WakeThread);
        assert!(wait_for(|| {
            port.lamps() == Some(IndicatorMask::SCROLL_LOCK | IndicatorMask::CAPS_LOCK)
        }));

        bottom.deregister();
    }

    #[test]
    fn test_stray_key_is_recorded() {
        let (core, _port) = core();
        let (bottom, line) = BottomHalf::spawn(Arc::clone(&core), 8).unwrap();
        core.start(|_| {});
        core.tick();
        for code in [2, 3, 4] {
            line.raise(code);
        }
        line.raise(0x1E);

        // Deregistering drains everything queued before it.
        bottom.deregister();
        core.tick();
        assert_eq!(core.snapshot().misses, 1);
    }

    #[test]
    fn test_line_is_dead_after_deregister() {
        let (core, _port) = core();
        let (bottom, line) = BottomHalf::spawn(Arc::clone(&core), 4).unwrap();
        core.start(|_| {});
        bottom.deregister();
        core.halt();

        assert_eq!(line.raise(2), IrqReturn::None);
    }

    #[test]
    fn test_full_queue_drops_key() {
        let (entered, writes) = unbounded();
        let (release, gate) = unbounded();
        let core = Arc::new(Core::new(
            Duration::from_secs(1),
            Box::new(GatedLamps { entered, gate }),
            Box::new(ScriptedPattern::constant(IndicatorMask::all())),
        ));
        let (bottom, line) = BottomHalf::spawn(Arc::clone(&core), 1).unwrap();

        // Let the start and first tick writes through.
        release.send(()).unwrap();
        release.send(()).unwrap();
        core.start(|_| {});
        core.tick();
        assert_eq!(writes.recv().unwrap(), IndicatorMask::empty());
        assert_eq!(writes.recv().unwrap(), IndicatorMask::all());

        // The bottom half takes key "1" and parks on its lamp write.
        assert_eq!(line.raise(2), IrqReturn::WakeThread);
        assert_eq!(
            writes.recv_timeout(Duration::from_secs(2)).unwrap(),
            IndicatorMask::SCROLL_LOCK | IndicatorMask::CAPS_LOCK
        );

        assert_eq!(line.raise(3), IrqReturn::WakeThread);
        assert_eq!(line.raise(4), IrqReturn::Handled);

        drop(release);
        bottom.deregister();

        // Key "2" was processed, key "3" never reached the game.
        assert_eq!(writes.try_iter().collect::<Vec<_>>(), vec![IndicatorMask::SCROLL_LOCK]);
        assert!(core.snapshot().running);
    }
}
