//! The switch engine as it runs on the host loop: store, observer registry
//! and coordinator, plus the platform objects they talk to.

use crate::coordinator::{SwitchCoordinator, SwitchOutcome};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Condition, DisplayPayload};
use crate::platform::{InputSourceController, InputSourceHandle, ObserverFactory, Pid, Workspace};
use crate::registry::ProcessObserverRegistry;
use crate::signal::{Command, Signal};
use crate::store::{input_source_display, ConditionStore};
use log::{error, info, warn};
use std::time::{Duration, Instant};

/// Whether the host loop should keep going after a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct SwitchService<W, C, F>
where
    F: ObserverFactory,
{
    store: ConditionStore,
    registry: ProcessObserverRegistry<F>,
    coordinator: SwitchCoordinator,
    workspace: W,
    controller: C,
    db: Option<Database>,
}

impl<W, C, F> SwitchService<W, C, F>
where
    W: Workspace,
    C: InputSourceController,
    F: ObserverFactory,
{
    /// Build the service, loading persisted conditions from `db` when given.
    ///
    /// A database that cannot be read leaves the service with an empty list.
    pub fn new(
        workspace: W,
        controller: C,
        factory: F,
        own_pid: Pid,
        debounce: Duration,
        db: Option<Database>,
    ) -> Self {
        let store = match db.as_ref().map(Database::load_conditions) {
            Some(Ok(records)) => {
                let report = ConditionStore::from_records(records, &controller);
                if !report.stale.is_empty() {
                    warn!(
                        "{} saved condition(s) refer to input sources that are not installed",
                        report.stale.len()
                    );
                }
                report.store
            }
            Some(Err(e)) => {
                error!("Failed to load conditions, starting empty: {e}");
                ConditionStore::new()
            }
            None => ConditionStore::new(),
        };
        info!("Loaded {} condition(s)", store.len());

        Self {
            store,
            registry: ProcessObserverRegistry::new(factory, own_pid),
            coordinator: SwitchCoordinator::new(own_pid, debounce),
            workspace,
            controller,
            db,
        }
    }

    /// Observe every running process and schedule an initial check.
    pub fn start(&mut self, now: Instant) {
        for pid in self.workspace.running_pids() {
            self.observe(pid);
        }
        info!("Observing {} running process(es)", self.registry.len());
        self.coordinator.on_activation_signal(now);
    }

    pub fn handle(&mut self, signal: Signal, now: Instant) -> Flow {
        match signal {
            Signal::Launched(pid) => {
                self.observe(pid);
                self.coordinator.on_activation_signal(now);
            }
            Signal::Terminated(pid) => {
                self.registry.unregister(pid);
            }
            Signal::Activated(_) | Signal::FrontmostChanged => {
                self.coordinator.on_activation_signal(now);
            }
            Signal::Command(command) => self.handle_command(command),
            Signal::Shutdown => return Flow::Stop,
        }
        Flow::Continue
    }

    /// Run the debounced check if it is due.
    pub fn fire_due(&mut self, now: Instant) -> Option<SwitchOutcome> {
        self.coordinator
            .fire_if_due(now, &self.workspace, &self.store, &self.controller)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.coordinator.deadline()
    }

    /// Release every observer.
    pub fn shutdown(&mut self) {
        self.registry.teardown_all();
    }

    /// Add or refresh the condition for the frontmost application, pointing
    /// it at the current input source.
    pub fn add_current_application_condition(&mut self) -> Result<usize> {
        let application = self
            .workspace
            .frontmost_application()
            .ok_or(AppError::NoFrontmostApplication)?;
        let input_source = self.controller.current()?;

        let icon = self.workspace.application_icon(application.pid);
        let display = DisplayPayload::new(application.name.unwrap_or_default(), icon);
        let position = self.store.upsert(
            application.bundle_id.as_deref().unwrap_or_default(),
            input_source.id(),
            display,
        )?;
        let source_display = input_source_display(&input_source);
        info!(
            "Condition added: {} -> {} ({})",
            application.bundle_id.as_deref().unwrap_or_default(),
            input_source.id(),
            source_display.name
        );
        self.store.set_input_source_display(position, source_display);
        self.persist();
        Ok(position)
    }

    pub fn remove_condition(&mut self, row: usize) -> Result<Condition> {
        let removed = self.store.remove(row)?;
        info!("Condition removed: {}", removed.application_identifier);
        self.persist();
        Ok(removed)
    }

    pub fn set_condition_enabled(&mut self, row: usize, enabled: bool) -> Result<()> {
        self.store.set_enabled(row, enabled)?;
        self.persist();
        Ok(())
    }

    /// Switch to the input source of the condition at `row` now.
    pub fn activate_condition(&self, row: usize) -> Result<()> {
        let condition = self.store.get_row(row)?;
        let handle = self
            .controller
            .resolve(&condition.input_source_id)
            .ok_or_else(|| AppError::StaleReference {
                application_identifier: condition.application_identifier.clone(),
                input_source_id: condition.input_source_id.clone(),
            })?;
        self.controller.activate(&handle)
    }

    pub fn conditions(&self) -> &[Condition] {
        self.store.all()
    }

    pub fn registry(&self) -> &ProcessObserverRegistry<F> {
        &self.registry
    }

    pub fn coordinator(&self) -> &SwitchCoordinator {
        &self.coordinator
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::AddCurrentApplication(reply) => {
                let _ = reply.send(self.add_current_application_condition());
            }
            Command::Remove { row, reply } => {
                let _ = reply.send(self.remove_condition(row));
            }
            Command::SetEnabled { row, enabled, reply } => {
                let _ = reply.send(self.set_condition_enabled(row, enabled));
            }
            Command::Conditions(reply) => {
                let _ = reply.send(self.store.all().to_vec());
            }
            Command::ActivateCondition { row, reply } => {
                let _ = reply.send(self.activate_condition(row));
            }
        }
    }

    fn observe(&mut self, pid: Pid) {
        if let Err(e) = self.registry.register(pid) {
            warn!("Skipping pid {pid}: {e}");
        }
    }

    fn persist(&mut self) {
        let Some(db) = self.db.as_mut() else {
            return;
        };
        if let Err(e) = db.save_conditions(&self.store.to_records()) {
            error!("Failed to save conditions: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConditionRecord;
    use crate::test_utils::{setup_test_db, FakeInputSources, FakeObserverFactory, FakeWorkspace};
    use std::sync::mpsc;

    const OWN_PID: Pid = 1;
    const WINDOW: Duration = Duration::from_millis(100);

    type TestService = SwitchService<FakeWorkspace, FakeInputSources, FakeObserverFactory>;

    struct Fixture {
        workspace: FakeWorkspace,
        sources: FakeInputSources,
        factory: FakeObserverFactory,
    }

    impl Fixture {
        fn new(sources: &[&str]) -> Self {
            Self {
                workspace: FakeWorkspace::new(),
                sources: FakeInputSources::with_sources(sources),
                factory: FakeObserverFactory::new(),
            }
        }

        fn service(&self, db: Option<Database>) -> TestService {
            SwitchService::new(
                self.workspace.clone(),
                self.sources.clone(),
                self.factory.clone(),
                OWN_PID,
                WINDOW,
                db,
            )
        }
    }

    #[test]
    fn test_add_current_application_into_empty_store() {
        let fixture = Fixture::new(&["com.input.abc"]);
        fixture.workspace.set_frontmost(10, Some("com.editor"));
        fixture.workspace.set_icon(10, &[0x4d, 0x4d]);
        let mut service = fixture.service(None);

        let position = service.add_current_application_condition().unwrap();

        assert_eq!(position, 0);
        let conditions = service.conditions();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].application_identifier, "com.editor");
        assert_eq!(conditions[0].input_source_id, "com.input.abc");
        assert_eq!(conditions[0].display.name, "App com.editor");
        assert_eq!(conditions[0].display.icon, vec![0x4d, 0x4d]);
        assert_eq!(conditions[0].input_source.name, "Name of com.input.abc");
        assert!(conditions[0].enabled);
    }

    #[test]
    fn test_add_current_application_refreshes_existing() {
        let fixture = Fixture::new(&["src.a", "src.b"]);
        fixture.workspace.set_frontmost(10, Some("com.editor"));
        let mut service = fixture.service(None);
        service.add_current_application_condition().unwrap();
        service.set_condition_enabled(1, false).unwrap();

        fixture.sources.set_current("src.b");
        service.add_current_application_condition().unwrap();

        let conditions = service.conditions();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].input_source_id, "src.b");
        assert!(conditions[0].enabled);
    }

    #[test]
    fn test_add_current_application_without_frontmost() {
        let fixture = Fixture::new(&["src"]);
        let mut service = fixture.service(None);

        let result = service.add_current_application_condition();

        assert!(matches!(result, Err(AppError::NoFrontmostApplication)));
        assert!(service.conditions().is_empty());
    }

    #[test]
    fn test_add_current_application_without_bundle_id() {
        let fixture = Fixture::new(&["src"]);
        fixture.workspace.set_frontmost(10, None);
        let mut service = fixture.service(None);

        let result = service.add_current_application_condition();

        assert!(matches!(result, Err(AppError::InvalidInput { .. })));
        assert!(service.conditions().is_empty());
    }

    #[test]
    fn test_start_observes_running_processes_except_own() {
        let fixture = Fixture::new(&[]);
        fixture.workspace.set_running(&[OWN_PID, 100, 200]);
        let mut service = fixture.service(None);

        service.start(Instant::now());

        assert_eq!(service.registry().tracked_pids(), vec![100, 200]);
        assert!(service.coordinator().is_pending());
    }

    #[test]
    fn test_launch_registers_and_schedules_check() {
        let fixture = Fixture::new(&["src.a"]);
        let mut service = fixture.service(None);
        fixture.workspace.set_frontmost(300, Some("com.new"));

        let t0 = Instant::now();
        assert_eq!(service.handle(Signal::Launched(300), t0), Flow::Continue);

        assert!(service.registry().is_tracked(300));
        assert_eq!(service.next_deadline(), Some(t0 + WINDOW));
        let outcome = service.fire_due(t0 + WINDOW).unwrap();
        assert!(matches!(outcome, SwitchOutcome::NoMatch { pid: 300, .. }));
    }

    #[test]
    fn test_observer_failure_does_not_stop_other_pids() {
        let fixture = Fixture::new(&[]);
        fixture.factory.fail_for(200);
        let mut service = fixture.service(None);
        let now = Instant::now();

        service.handle(Signal::Launched(100), now);
        service.handle(Signal::Launched(200), now);
        service.handle(Signal::Launched(300), now);

        assert_eq!(service.registry().tracked_pids(), vec![100, 300]);
    }

    #[test]
    fn test_terminated_twice_releases_once() {
        let fixture = Fixture::new(&[]);
        let mut service = fixture.service(None);
        let now = Instant::now();
        service.handle(Signal::Launched(500), now);

        service.handle(Signal::Terminated(500), now);
        service.handle(Signal::Terminated(500), now);

        assert!(!service.registry().is_tracked(500));
        assert_eq!(fixture.factory.created(500), 1);
        assert_eq!(fixture.factory.released(500), 1);
    }

    #[test]
    fn test_activation_switches_input_source() {
        let fixture = Fixture::new(&["src.default", "com.input.abc"]);
        fixture.workspace.set_frontmost(10, Some("com.editor"));
        fixture.sources.set_current("com.input.abc");
        let mut service = fixture.service(None);
        service.add_current_application_condition().unwrap();

        fixture.sources.set_current("src.default");
        fixture.workspace.set_frontmost(20, Some("com.other"));
        let t0 = Instant::now();
        service.handle(Signal::Activated(20), t0);
        service.fire_due(t0 + WINDOW);

        fixture.workspace.set_frontmost(10, Some("com.editor"));
        service.handle(Signal::FrontmostChanged, t0 + WINDOW * 2);
        let outcome = service.fire_due(t0 + WINDOW * 3).unwrap();

        assert!(matches!(outcome, SwitchOutcome::Activated { pid: 10, .. }));
        assert_eq!(fixture.sources.current_id().as_deref(), Some("com.input.abc"));
        assert_eq!(fixture.sources.activations(), vec!["com.input.abc".to_string()]);
    }

    #[test]
    fn test_disabled_condition_does_not_switch() {
        let fixture = Fixture::new(&["com.input.abc", "src.other"]);
        fixture.workspace.set_frontmost(10, Some("com.editor"));
        let mut service = fixture.service(None);
        service.add_current_application_condition().unwrap();
        service.set_condition_enabled(1, false).unwrap();

        fixture.workspace.set_frontmost(20, Some("com.other"));
        let t0 = Instant::now();
        service.handle(Signal::Activated(20), t0);
        service.fire_due(t0 + WINDOW);
        fixture.workspace.set_frontmost(10, Some("com.editor"));
        service.handle(Signal::Activated(10), t0 + WINDOW * 2);
        service.fire_due(t0 + WINDOW * 3);

        assert!(fixture.sources.activations().is_empty());
    }

    #[test]
    fn test_commands_reply_through_channels() {
        let fixture = Fixture::new(&["src.a"]);
        fixture.workspace.set_frontmost(10, Some("com.editor"));
        let mut service = fixture.service(None);
        let now = Instant::now();

        let (reply, rx) = mpsc::channel();
        service.handle(Signal::Command(Command::AddCurrentApplication(reply)), now);
        assert_eq!(rx.recv().unwrap().unwrap(), 0);

        let (reply, rx) = mpsc::channel();
        service.handle(Signal::Command(Command::Remove { row: 0, reply }), now);
        assert!(matches!(rx.recv().unwrap(), Err(AppError::OutOfRange { row: 0, len: 1 })));

        let (reply, rx) = mpsc::channel();
        service.handle(Signal::Command(Command::Conditions(reply)), now);
        assert_eq!(rx.recv().unwrap().len(), 1);

        let (reply, rx) = mpsc::channel();
        service.handle(Signal::Command(Command::Remove { row: 1, reply }), now);
        assert_eq!(rx.recv().unwrap().unwrap().application_identifier, "com.editor");
        assert!(service.conditions().is_empty());
    }

    #[test]
    fn test_activate_condition_now() {
        let fixture = Fixture::new(&["src.a", "src.b"]);
        fixture.workspace.set_frontmost(10, Some("com.editor"));
        let mut service = fixture.service(None);
        fixture.sources.set_current("src.b");
        service.add_current_application_condition().unwrap();
        fixture.sources.set_current("src.a");

        service.activate_condition(1).unwrap();

        assert_eq!(fixture.sources.current_id().as_deref(), Some("src.b"));
        assert!(matches!(service.activate_condition(0), Err(AppError::OutOfRange { .. })));
    }

    #[test]
    fn test_activate_condition_with_uninstalled_source() {
        let fixture = Fixture::new(&["src.a"]);
        fixture.workspace.set_frontmost(10, Some("com.editor"));
        let mut service = fixture.service(None);
        service.add_current_application_condition().unwrap();
        fixture.sources.uninstall("src.a");

        let result = service.activate_condition(1);

        assert!(matches!(result, Err(AppError::StaleReference { .. })));
    }

    #[test]
    fn test_shutdown_signal_stops_and_teardown_releases() {
        let fixture = Fixture::new(&[]);
        fixture.workspace.set_running(&[100, 200]);
        let mut service = fixture.service(None);
        service.start(Instant::now());

        assert_eq!(service.handle(Signal::Shutdown, Instant::now()), Flow::Stop);
        service.shutdown();

        assert!(service.registry().is_empty());
        assert_eq!(fixture.factory.live(), 0);
    }

    #[test]
    fn test_mutations_are_persisted() {
        let (db, dir) = setup_test_db();
        let fixture = Fixture::new(&["src.a", "src.b"]);
        let mut service = fixture.service(Some(db));

        fixture.workspace.set_frontmost(10, Some("com.one"));
        service.add_current_application_condition().unwrap();
        fixture.workspace.set_frontmost(11, Some("com.two"));
        fixture.sources.set_current("src.b");
        service.add_current_application_condition().unwrap();
        service.set_condition_enabled(2, false).unwrap();
        drop(service);

        let db = Database::open_migrated(&dir.path().join("test.db")).unwrap();
        let records = db.load_conditions().unwrap();
        let summary: Vec<(&str, &str, bool)> = records
            .iter()
            .map(|r| (r.application_identifier.as_str(), r.input_source_id.as_str(), r.enabled))
            .collect();
        assert_eq!(summary, vec![("com.two", "src.b", true), ("com.one", "src.a", false)]);
    }

    #[test]
    fn test_startup_skips_stale_conditions() {
        let (mut db, _dir) = setup_test_db();
        let record = |app: &str, source: &str| ConditionRecord {
            application_identifier: app.into(),
            input_source_id: source.into(),
            enabled: true,
            display_name: String::new(),
            display_icon: Vec::new(),
        };
        db.save_conditions(&[record("com.kept", "src.ok"), record("com.gone", "src.removed")])
            .unwrap();
        let fixture = Fixture::new(&["src.ok"]);

        let service = fixture.service(Some(db));

        let ids: Vec<&str> = service
            .conditions()
            .iter()
            .map(|c| c.application_identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["com.kept"]);
    }
}
