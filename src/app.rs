//! Process wiring for the macOS build.

use crate::config::{AppConfig, AppPaths};
use crate::control;
use crate::db::Database;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::platform::macos::{
    is_accessibility_trusted, MacEventPump, MacInputSources, MacObserverFactory, MacWorkspace,
};
use crate::platform::own_pid;
use crate::service::SwitchService;
use crate::signal::{install_shutdown_handler, ServiceHandle};
use log::{error, info, warn};
use std::io;
use std::sync::mpsc;
use std::thread;

/// Open the conditions database. Failure is logged and the service runs
/// without persistence.
fn open_database(paths: &AppPaths, config: &AppConfig) -> Option<Database> {
    let path = match paths.database_path(config) {
        Ok(path) => path,
        Err(e) => {
            error!("Could not prepare database location: {e}");
            return None;
        }
    };
    match Database::open_migrated(&path) {
        Ok(db) => {
            info!("Using database at {}", path.display());
            Some(db)
        }
        Err(e) => {
            error!("Failed to open database {}: {e}", path.display());
            None
        }
    }
}

pub fn run() -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = AppConfig::load(&paths.config_file)?;
    let db = open_database(&paths, &config);

    if !is_accessibility_trusted() {
        warn!("Accessibility access is not granted; application activations will not be observed");
    }

    let (tx, rx) = mpsc::channel();
    let handle = ServiceHandle::new(tx.clone());

    if let Err(e) = install_shutdown_handler(handle.clone()) {
        warn!("Could not install shutdown handler: {e}");
    }

    let control_handle = handle.clone();
    thread::Builder::new()
        .name("control".into())
        .spawn(move || {
            let stdin = io::stdin();
            let stdout = io::stdout();
            if let Err(e) = control::serve(stdin.lock(), &mut stdout.lock(), &control_handle) {
                warn!("Control input failed: {e}");
            }
        })?;

    let service = SwitchService::new(
        MacWorkspace,
        MacInputSources,
        MacObserverFactory::new(handle.sender()),
        own_pid(),
        config.debounce(),
        db,
    );
    let pump = MacEventPump::new(tx, MacWorkspace);

    info!("inputshift running (debounce {} ms)", config.debounce_ms);
    Dispatcher::new(rx, service, config.pump_interval())
        .with_pump(Box::new(pump))
        .run();
    Ok(())
}
