//! Pattern Scheduler: dedicated timer thread that ends rounds.
//!
//! The timer is one-shot: it sleeps until its deadline, runs one tick and
//! rearms itself only if the tick asks for it. The start command arms it
//! from outside. Cancelling joins the thread, so once
//! [`PatternScheduler::cancel_sync`] returns no tick is running or will run.

use super::shared::{Core, Tick};
use super::messages::TimerCommand;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Timer actor driving [`Core::tick`].
pub(crate) struct PatternScheduler {
    /// Handle to the timer thread.
    handle: Option<JoinHandle<()>>,
    /// Command queue into the timer thread.
    commands: Sender<TimerCommand>,
}

impl PatternScheduler {
    /// Spawn the timer thread, initially disarmed.
    pub(crate) fn spawn(core: Arc<Core>) -> io::Result<Self> {
        let (commands, command_rx) = unbounded();

        let handle = thread::Builder::new()
            .name("keydance-timer".to_string())
            .spawn(move || {
                Self::run_loop(&core, &command_rx);
            })?;

        Ok(Self {
            handle: Some(handle),
            commands,
        })
    }

    /// A sender for arming the timer.
    pub(crate) fn commands(&self) -> Sender<TimerCommand> {
        self.commands.clone()
    }

    /// Cancel any pending tick and wait for the thread to finish.
    pub(crate) fn cancel_sync(mut self) {
        let _ = self.commands.send(TimerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main timer loop.
    fn run_loop(core: &Core, commands: &Receiver<TimerCommand>) {
        let mut deadline: Option<Instant> = None;

        loop {
            let command = match deadline {
                Some(at) => commands.recv_deadline(at),
                None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match command {
                Ok(TimerCommand::Arm(at)) => deadline = Some(at),
                Ok(TimerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    deadline = match core.tick() {
                        Tick::Rearm { round, next } => {
                            log::trace!("tick scored {round:?}, rearmed");
                            Some(next)
                        }
                        Tick::Stopped(reason) => {
                            log::debug!("timer disarmed ({reason:?})");
                            None
                        }
                    };
                }
            }
        }
    }
}

impl Drop for PatternScheduler {
    fn drop(&mut self) {
        let _ = self.commands.send(TimerCommand::Shutdown);
    }
}
