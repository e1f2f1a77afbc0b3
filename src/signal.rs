use crate::error::{AppError, Result};
use crate::models::Condition;
use crate::platform::Pid;
use log::info;
use std::sync::mpsc::{self, Sender};

/// Channel used to answer a [`Command`].
pub type Reply<T> = Sender<Result<T>>;

/// Everything the host loop reacts to.
#[derive(Debug)]
pub enum Signal {
    /// A process started.
    Launched(Pid),
    /// A process exited. May be delivered more than once for the same pid.
    Terminated(Pid),
    /// An observed process reported it became active.
    Activated(Pid),
    /// The workspace reported a foreground change. Carries no payload; the
    /// frontmost application is re-read when the check fires.
    FrontmostChanged,
    Command(Command),
    Shutdown,
}

/// Requests from the UI layer.
#[derive(Debug)]
pub enum Command {
    AddCurrentApplication(Reply<usize>),
    Remove { row: usize, reply: Reply<Condition> },
    SetEnabled { row: usize, enabled: bool, reply: Reply<()> },
    Conditions(Sender<Vec<Condition>>),
    ActivateCondition { row: usize, reply: Reply<()> },
}

/// Cloneable front door to a running switch service.
///
/// Every call blocks until the host loop has answered.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    tx: Sender<Signal>,
}

impl ServiceHandle {
    pub fn new(tx: Sender<Signal>) -> Self {
        Self { tx }
    }

    /// Raw sender, for platform code that forwards events.
    pub fn sender(&self) -> Sender<Signal> {
        self.tx.clone()
    }

    /// Add (or refresh) a condition for the frontmost application using the
    /// current input source. Returns the condition's position.
    pub fn add_current_application(&self) -> Result<usize> {
        self.request(Command::AddCurrentApplication)
    }

    pub fn remove(&self, row: usize) -> Result<Condition> {
        self.request(|reply| Command::Remove { row, reply })
    }

    pub fn set_enabled(&self, row: usize, enabled: bool) -> Result<()> {
        self.request(|reply| Command::SetEnabled { row, enabled, reply })
    }

    pub fn conditions(&self) -> Result<Vec<Condition>> {
        let (reply, rx) = mpsc::channel();
        self.send(Signal::Command(Command::Conditions(reply)))?;
        rx.recv().map_err(|_| AppError::ChannelClosed)
    }

    /// Switch to the input source of the condition at `row` right away.
    pub fn activate_condition(&self, row: usize) -> Result<()> {
        self.request(|reply| Command::ActivateCondition { row, reply })
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Signal::Shutdown)
    }

    fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, rx) = mpsc::channel();
        self.send(Signal::Command(command(reply)))?;
        rx.recv().map_err(|_| AppError::ChannelClosed)?
    }

    fn send(&self, signal: Signal) -> Result<()> {
        self.tx.send(signal).map_err(|_| AppError::ChannelClosed)
    }
}

/// Turn SIGINT, SIGTERM and SIGHUP into a [`Signal::Shutdown`] so the host
/// loop releases its observers before the process exits.
///
/// Only one handler can be installed per process.
pub fn install_shutdown_handler(handle: ServiceHandle) -> std::result::Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        info!("Shutting down...");
        let _ = handle.shutdown();
    })
}
