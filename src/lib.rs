#[cfg(target_os = "macos")]
mod app;
pub mod config;
pub mod constants;
pub mod control;
pub mod coordinator;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod platform;
pub mod registry;
pub mod service;
pub mod signal;
pub mod store;
#[cfg(test)]
mod test_utils;
pub mod validation;

use crate::error::Result;

/// Run the input source switcher until Ctrl+C or a `quit` control request.
///
/// Must be called on the main thread.
pub fn run() -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        app::run()
    }
    #[cfg(not(target_os = "macos"))]
    {
        Err(crate::error::AppError::UnsupportedPlatform)
    }
}
