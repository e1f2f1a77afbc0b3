pub mod diff;
pub mod types;

pub use diff::ProcessDiff;
pub use types::{
    EventPump, InputSourceController, InputSourceHandle, ObserverFactory, Pid,
    RunningApplication, Workspace,
};

#[cfg(target_os = "macos")]
pub mod macos;

/// Pid of the running process.
pub fn own_pid() -> Pid {
    Pid::try_from(std::process::id()).unwrap_or(Pid::MAX)
}
