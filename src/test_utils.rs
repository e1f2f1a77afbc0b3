//! Shared test utilities for inputshift.
//!
//! In-memory stand-ins for the platform traits plus database setup. The fakes
//! are cheap to clone; clones share state so a test can keep one copy for
//! assertions while the code under test owns another.

#![cfg(test)]

use crate::db::{migrations, Database};
use crate::error::{AppError, Result};
use crate::platform::{
    InputSourceController, InputSourceHandle, ObserverFactory, Pid, RunningApplication, Workspace,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tempfile::{tempdir, TempDir};

/// Create a temporary test database with migrations applied.
///
/// Returns a tuple of (Database, TempDir). The TempDir must be kept alive
/// for the duration of the test to prevent the database file from being deleted.
pub fn setup_test_db() -> (Database, TempDir) {
    let dir = tempdir().expect("Failed to create temp directory for test DB");
    let db_path = dir.path().join("test.db");
    let db = Database::open(&db_path).expect("Failed to open test database");
    migrations::run(db.connection()).expect("Failed to run migrations on test DB");
    (db, dir)
}

// ── Workspace ──────────────────────────────────────────────────────

#[derive(Default)]
struct WorkspaceState {
    frontmost: Option<RunningApplication>,
    running: Vec<Pid>,
    icons: HashMap<Pid, Vec<u8>>,
    frontmost_queries: usize,
}

#[derive(Clone, Default)]
pub struct FakeWorkspace {
    state: Rc<RefCell<WorkspaceState>>,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_frontmost(&self, pid: Pid, bundle_id: Option<&str>) {
        self.set_frontmost_app(RunningApplication {
            pid,
            bundle_id: bundle_id.map(str::to_string),
            name: bundle_id.map(|id| format!("App {id}")),
        });
    }

    pub fn set_frontmost_app(&self, app: RunningApplication) {
        self.state.borrow_mut().frontmost = Some(app);
    }

    pub fn set_running(&self, pids: &[Pid]) {
        self.state.borrow_mut().running = pids.to_vec();
    }

    pub fn set_icon(&self, pid: Pid, icon: &[u8]) {
        self.state.borrow_mut().icons.insert(pid, icon.to_vec());
    }

    /// How many times the frontmost application was looked up.
    pub fn frontmost_queries(&self) -> usize {
        self.state.borrow().frontmost_queries
    }
}

impl Workspace for FakeWorkspace {
    fn frontmost_application(&self) -> Option<RunningApplication> {
        let mut state = self.state.borrow_mut();
        state.frontmost_queries += 1;
        state.frontmost.clone()
    }

    fn running_pids(&self) -> Vec<Pid> {
        self.state.borrow().running.clone()
    }

    fn application_icon(&self, pid: Pid) -> Vec<u8> {
        self.state.borrow().icons.get(&pid).cloned().unwrap_or_default()
    }
}

// ── Input sources ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeInputSource {
    id: String,
}

impl InputSourceHandle for FakeInputSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn localized_name(&self) -> Option<String> {
        Some(format!("Name of {}", self.id))
    }

    fn icon(&self) -> Option<Vec<u8>> {
        Some(self.id.as_bytes().to_vec())
    }
}

#[derive(Default)]
struct InputSourceState {
    installed: Vec<String>,
    current: Option<String>,
    activations: Vec<String>,
    fail_activation: bool,
}

#[derive(Clone, Default)]
pub struct FakeInputSources {
    state: Rc<RefCell<InputSourceState>>,
}

impl FakeInputSources {
    /// Installed sources; the first one is current.
    pub fn with_sources(ids: &[&str]) -> Self {
        let sources = Self::default();
        {
            let mut state = sources.state.borrow_mut();
            state.installed = ids.iter().map(|id| (*id).to_string()).collect();
            state.current = state.installed.first().cloned();
        }
        sources
    }

    pub fn set_current(&self, id: &str) {
        self.state.borrow_mut().current = Some(id.to_string());
    }

    pub fn current_id(&self) -> Option<String> {
        self.state.borrow().current.clone()
    }

    pub fn uninstall(&self, id: &str) {
        self.state.borrow_mut().installed.retain(|installed| installed != id);
    }

    /// Make every later `activate` call fail.
    pub fn fail_activation(&self) {
        self.state.borrow_mut().fail_activation = true;
    }

    /// Ids passed to successful `activate` calls, in order.
    pub fn activations(&self) -> Vec<String> {
        self.state.borrow().activations.clone()
    }
}

impl InputSourceController for FakeInputSources {
    type Handle = FakeInputSource;

    fn current(&self) -> Result<FakeInputSource> {
        self.state
            .borrow()
            .current
            .clone()
            .map(|id| FakeInputSource { id })
            .ok_or_else(|| AppError::InputSource("no current input source".into()))
    }

    fn resolve(&self, id: &str) -> Option<FakeInputSource> {
        self.state
            .borrow()
            .installed
            .iter()
            .find(|installed| installed.as_str() == id)
            .map(|installed| FakeInputSource { id: installed.clone() })
    }

    fn activate(&self, handle: &FakeInputSource) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_activation {
            return Err(AppError::InputSource(format!("cannot select {}", handle.id)));
        }
        state.current = Some(handle.id.clone());
        state.activations.push(handle.id.clone());
        Ok(())
    }
}

// ── Observers ──────────────────────────────────────────────────────

#[derive(Default)]
struct ObserverCounts {
    created: HashMap<Pid, usize>,
    released: HashMap<Pid, usize>,
    failing: HashSet<Pid>,
}

/// Counts observer allocations and releases per pid.
#[derive(Clone, Default)]
pub struct FakeObserverFactory {
    counts: Rc<RefCell<ObserverCounts>>,
}

pub struct FakeObserver {
    pid: Pid,
    counts: Rc<RefCell<ObserverCounts>>,
}

impl Drop for FakeObserver {
    fn drop(&mut self) {
        *self.counts.borrow_mut().released.entry(self.pid).or_default() += 1;
    }
}

impl FakeObserverFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make observer creation fail for `pid`.
    pub fn fail_for(&self, pid: Pid) {
        self.counts.borrow_mut().failing.insert(pid);
    }

    pub fn created(&self, pid: Pid) -> usize {
        self.counts.borrow().created.get(&pid).copied().unwrap_or(0)
    }

    pub fn released(&self, pid: Pid) -> usize {
        self.counts.borrow().released.get(&pid).copied().unwrap_or(0)
    }

    pub fn total_created(&self) -> usize {
        self.counts.borrow().created.values().sum()
    }

    pub fn total_released(&self) -> usize {
        self.counts.borrow().released.values().sum()
    }

    /// Observers created but not yet released.
    pub fn live(&self) -> usize {
        self.total_created() - self.total_released()
    }
}

impl ObserverFactory for FakeObserverFactory {
    type Observer = FakeObserver;

    fn create(&mut self, pid: Pid) -> Result<FakeObserver> {
        let mut counts = self.counts.borrow_mut();
        if counts.failing.contains(&pid) {
            return Err(AppError::ResourceCreation { pid, code: -25204 });
        }
        *counts.created.entry(pid).or_default() += 1;
        Ok(FakeObserver {
            pid,
            counts: Rc::clone(&self.counts),
        })
    }
}
