//! macOS implementations of the platform traits.
//!
//! Everything here must run on the main thread: observers attach to the main
//! run loop and the pump spins it.

#![allow(
    unsafe_code,
    reason = "AppKit, Accessibility and Carbon TIS are only reachable through FFI"
)]

mod ffi;
pub mod input_source;
mod notifications;
pub mod observer;
pub mod pump;
pub mod workspace;

pub use input_source::{MacInputSource, MacInputSources};
pub use observer::{ActivationObserver, MacObserverFactory};
pub use pump::MacEventPump;
pub use workspace::MacWorkspace;

/// Whether this process may use the Accessibility API. Never prompts.
pub fn is_accessibility_trusted() -> bool {
    // SAFETY: no arguments, reads process state only.
    unsafe { ffi::AXIsProcessTrusted() != 0 }
}
