//! Turns noisy activation signals into at most one condition lookup per
//! genuine foreground change.

use crate::platform::{InputSourceController, InputSourceHandle, Pid, Workspace};
use crate::store::ConditionStore;
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// What a debounced check decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    NoFrontmost,
    /// Frontmost pid is the one already handled.
    Unchanged(Pid),
    /// This process is frontmost (e.g. its own menu is open).
    OwnProcess,
    /// Foreground changed but no enabled condition applies.
    NoMatch {
        pid: Pid,
        application: Option<String>,
    },
    Activated {
        pid: Pid,
        application: String,
        input_source_id: String,
    },
    /// A condition matched but its input source could not be resolved.
    Unresolved {
        pid: Pid,
        application: String,
        input_source_id: String,
    },
    ActivationFailed {
        pid: Pid,
        input_source_id: String,
        reason: String,
    },
}

pub struct SwitchCoordinator {
    own_pid: Pid,
    debounce: Duration,
    pending_until: Option<Instant>,
    last_known_foreground_pid: Option<Pid>,
}

impl SwitchCoordinator {
    pub fn new(own_pid: Pid, debounce: Duration) -> Self {
        Self {
            own_pid,
            debounce,
            pending_until: None,
            last_known_foreground_pid: None,
        }
    }

    /// Schedule a check one debounce window from `now`. A signal arriving
    /// while a check is pending is absorbed by it. Returns true when a new
    /// check was scheduled.
    pub fn on_activation_signal(&mut self, now: Instant) -> bool {
        if self.pending_until.is_some() {
            return false;
        }
        self.pending_until = Some(now + self.debounce);
        true
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending_until
    }

    pub fn is_pending(&self) -> bool {
        self.pending_until.is_some()
    }

    pub fn last_known_foreground_pid(&self) -> Option<Pid> {
        self.last_known_foreground_pid
    }

    /// Run the pending check if its deadline has passed.
    pub fn fire_if_due<W, C>(
        &mut self,
        now: Instant,
        workspace: &W,
        store: &ConditionStore,
        controller: &C,
    ) -> Option<SwitchOutcome>
    where
        W: Workspace,
        C: InputSourceController,
    {
        let due = self.pending_until.is_some_and(|deadline| now >= deadline);
        if !due {
            return None;
        }
        self.pending_until = None;

        let outcome = self.check(workspace, store, controller);
        debug!("Switch check: {outcome:?}");
        Some(outcome)
    }

    fn check<W, C>(
        &mut self,
        workspace: &W,
        store: &ConditionStore,
        controller: &C,
    ) -> SwitchOutcome
    where
        W: Workspace,
        C: InputSourceController,
    {
        let Some(frontmost) = workspace.frontmost_application() else {
            return SwitchOutcome::NoFrontmost;
        };
        let pid = frontmost.pid;

        if self.last_known_foreground_pid == Some(pid) {
            return SwitchOutcome::Unchanged(pid);
        }
        if pid == self.own_pid {
            return SwitchOutcome::OwnProcess;
        }
        self.last_known_foreground_pid = Some(pid);

        let condition = frontmost
            .bundle_id
            .as_deref()
            .and_then(|bundle_id| store.match_application(bundle_id));

        let Some(condition) = condition else {
            return SwitchOutcome::NoMatch {
                pid,
                application: frontmost.bundle_id,
            };
        };

        let application = condition.application_identifier.clone();
        let input_source_id = condition.input_source_id.clone();

        let Some(handle) = controller.resolve(&input_source_id) else {
            warn!("Input source {input_source_id} for {application} is not available");
            return SwitchOutcome::Unresolved {
                pid,
                application,
                input_source_id,
            };
        };

        match controller.activate(&handle) {
            Ok(()) => {
                info!("Switched to {} for {application}", handle.id());
                SwitchOutcome::Activated {
                    pid,
                    application,
                    input_source_id,
                }
            }
            Err(e) => {
                warn!("Failed to activate {input_source_id} for {application}: {e}");
                SwitchOutcome::ActivationFailed {
                    pid,
                    input_source_id,
                    reason: e.to_string(),
                }
            }
        }
    }
}
