use crate::error::Result;
use std::time::Duration;

/// OS process identifier.
pub type Pid = i32;

/// A running application as reported by the workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunningApplication {
    pub pid: Pid,
    pub bundle_id: Option<String>,
    pub name: Option<String>,
}

/// System-wide view of running applications.
pub trait Workspace {
    fn frontmost_application(&self) -> Option<RunningApplication>;

    /// Pid of the frontmost application. Implementations may skip reading
    /// names.
    fn frontmost_pid(&self) -> Option<Pid> {
        self.frontmost_application().map(|app| app.pid)
    }

    fn running_pids(&self) -> Vec<Pid>;
    /// Icon image bytes for `pid`, empty when unavailable.
    fn application_icon(&self, pid: Pid) -> Vec<u8>;
}

/// A selectable keyboard input method.
pub trait InputSourceHandle {
    fn id(&self) -> &str;
    fn localized_name(&self) -> Option<String>;
    /// Icon image bytes, if the input source ships one.
    fn icon(&self) -> Option<Vec<u8>>;
}

/// Enumerates and switches input sources.
pub trait InputSourceController {
    type Handle: InputSourceHandle;

    fn current(&self) -> Result<Self::Handle>;
    fn resolve(&self, id: &str) -> Option<Self::Handle>;
    fn activate(&self, handle: &Self::Handle) -> Result<()>;
}

/// Creates per-process "application activated" observers.
///
/// Dropping an observer detaches it from the run loop and releases it.
pub trait ObserverFactory {
    type Observer;

    fn create(&mut self, pid: Pid) -> Result<Self::Observer>;
}

/// Drives platform event delivery on the host loop thread.
pub trait EventPump {
    /// Process platform events for at most `timeout`, forwarding them as
    /// signals.
    fn pump(&mut self, timeout: Duration);
}
