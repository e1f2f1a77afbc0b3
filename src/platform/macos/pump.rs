use super::ffi;
use super::notifications::LifecycleNotifications;
use super::workspace::MacWorkspace;
use crate::platform::{EventPump, ProcessDiff};
use crate::signal::Signal;
use core_foundation::runloop::{CFRunLoop, CFRunLoopRunResult};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

/// Spins the main run loop so AX observer callbacks and workspace
/// notifications fire, then reconciles the process list and foreground pid
/// seen since the last slice.
pub struct MacEventPump {
    tx: Sender<Signal>,
    diff: ProcessDiff<MacWorkspace>,
    _notifications: LifecycleNotifications,
}

impl MacEventPump {
    pub fn new(tx: Sender<Signal>, workspace: MacWorkspace) -> Self {
        Self {
            _notifications: LifecycleNotifications::register(tx.clone()),
            diff: ProcessDiff::new(workspace),
            tx,
        }
    }
}

impl EventPump for MacEventPump {
    fn pump(&mut self, timeout: Duration) {
        let result = CFRunLoop::run_in_mode(ffi::default_mode(), timeout, true);
        if matches!(result, CFRunLoopRunResult::Finished) {
            // No sources attached yet; the run loop returns immediately.
            thread::sleep(timeout);
        }
        for signal in self.diff.changes() {
            if self.tx.send(signal).is_err() {
                break;
            }
        }
    }
}
