//! One activation observer per running foreign process.

use crate::error::Result;
use crate::platform::{ObserverFactory, Pid};
use log::{debug, info};
use std::collections::HashMap;

/// Outcome of [`ProcessObserverRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    AlreadyTracked,
    OwnProcess,
}

/// Keeps the observer map in step with process launches and terminations.
///
/// Observers are released by dropping them; the registry is the only owner.
pub struct ProcessObserverRegistry<F: ObserverFactory> {
    factory: F,
    own_pid: Pid,
    observers: HashMap<Pid, F::Observer>,
}

impl<F: ObserverFactory> ProcessObserverRegistry<F> {
    pub fn new(factory: F, own_pid: Pid) -> Self {
        Self {
            factory,
            own_pid,
            observers: HashMap::new(),
        }
    }

    /// Start observing `pid`. A failed observer creation leaves the registry
    /// untouched for that pid.
    pub fn register(&mut self, pid: Pid) -> Result<Registration> {
        if pid == self.own_pid {
            return Ok(Registration::OwnProcess);
        }
        if self.observers.contains_key(&pid) {
            return Ok(Registration::AlreadyTracked);
        }

        let observer = self.factory.create(pid)?;
        self.observers.insert(pid, observer);
        debug!("Observing pid {pid} ({} tracked)", self.observers.len());
        Ok(Registration::Registered)
    }

    /// Stop observing `pid`. Returns false when it was not tracked.
    pub fn unregister(&mut self, pid: Pid) -> bool {
        match self.observers.remove(&pid) {
            Some(observer) => {
                drop(observer);
                debug!("Released observer for pid {pid}");
                true
            }
            None => false,
        }
    }

    /// Release every observer.
    pub fn teardown_all(&mut self) {
        let count = self.observers.len();
        for (_, observer) in self.observers.drain() {
            drop(observer);
        }
        if count > 0 {
            info!("Released {count} activation observers");
        }
    }

    pub fn is_tracked(&self, pid: Pid) -> bool {
        self.observers.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn tracked_pids(&self) -> Vec<Pid> {
        let mut pids: Vec<Pid> = self.observers.keys().copied().collect();
        pids.sort_unstable();
        pids
    }
}

impl<F: ObserverFactory> Drop for ProcessObserverRegistry<F> {
    fn drop(&mut self) {
        self.teardown_all();
    }
}
