//! Slice-to-slice comparison of the workspace's process list.

use crate::platform::{Pid, Workspace};
use crate::signal::Signal;
use log::debug;
use std::collections::BTreeSet;

/// Remembers the running pids and frontmost pid seen at the last call and
/// reports what changed since.
pub struct ProcessDiff<W> {
    workspace: W,
    running: BTreeSet<Pid>,
    frontmost: Option<Pid>,
}

impl<W: Workspace> ProcessDiff<W> {
    /// Snapshot the current state so only later changes are reported.
    pub fn new(workspace: W) -> Self {
        Self {
            running: workspace.running_pids().into_iter().collect(),
            frontmost: workspace.frontmost_pid(),
            workspace,
        }
    }

    /// Terminations first, then launches, then a foreground change.
    pub fn changes(&mut self) -> Vec<Signal> {
        let running: BTreeSet<Pid> = self.workspace.running_pids().into_iter().collect();
        let mut signals = Vec::new();

        for &pid in self.running.difference(&running) {
            debug!("Process exited: {pid}");
            signals.push(Signal::Terminated(pid));
        }
        for &pid in running.difference(&self.running) {
            debug!("Process launched: {pid}");
            signals.push(Signal::Launched(pid));
        }
        self.running = running;

        let frontmost = self.workspace.frontmost_pid();
        if frontmost != self.frontmost {
            self.frontmost = frontmost;
            signals.push(Signal::FrontmostChanged);
        }
        signals
    }
}
