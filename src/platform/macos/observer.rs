//! Per-process "application activated" observers.

use super::ffi::{self, AXObserverRef, AXUIElementRef, AX_ERROR_FAILURE, AX_ERROR_SUCCESS};
use crate::error::{AppError, Result};
use crate::platform::{ObserverFactory, Pid};
use crate::signal::Signal;
use core_foundation::base::{CFType, TCFType};
use core_foundation::runloop::{CFRunLoop, CFRunLoopSource};
use core_foundation::string::{CFString, CFStringRef};
use log::trace;
use std::ffi::c_void;
use std::ptr;
use std::sync::mpsc::Sender;

const APPLICATION_ACTIVATED: &str = "AXApplicationActivated";

/// Callback context. Boxed so its address stays fixed while registered.
struct ActivationSink {
    pid: Pid,
    tx: Sender<Signal>,
}

unsafe extern "C" fn on_application_activated(
    _observer: AXObserverRef,
    _element: AXUIElementRef,
    _notification: CFStringRef,
    refcon: *mut c_void,
) {
    if refcon.is_null() {
        return;
    }
    // SAFETY: refcon is the ActivationSink owned by the ActivationObserver,
    // which removes this notification before freeing it. Callbacks only run
    // on the main run loop, the same thread that drops observers.
    let sink = unsafe { &*refcon.cast::<ActivationSink>() };
    trace!("Application activated: pid {}", sink.pid);
    let _ = sink.tx.send(Signal::Activated(sink.pid));
}

fn as_ax_ref(cf: &CFType) -> *mut c_void {
    cf.as_CFTypeRef().cast_mut()
}

/// A live AX observer subscribed to one process. Dropping it detaches the
/// run loop source; the observer and element are released with their
/// wrappers.
pub struct ActivationObserver {
    pid: Pid,
    observer: CFType,
    element: CFType,
    source: CFRunLoopSource,
    notification: CFString,
    _sink: Box<ActivationSink>,
}

impl ActivationObserver {
    pub fn pid(&self) -> Pid {
        self.pid
    }
}

impl Drop for ActivationObserver {
    fn drop(&mut self) {
        // SAFETY: observer and element are still retained by self; the
        // notification was added in `create`.
        unsafe {
            ffi::AXObserverRemoveNotification(
                as_ax_ref(&self.observer),
                as_ax_ref(&self.element),
                self.notification.as_concrete_TypeRef(),
            );
        }
        CFRunLoop::get_main().remove_source(&self.source, ffi::default_mode());
    }
}

/// Creates [`ActivationObserver`]s that report into the host loop channel.
pub struct MacObserverFactory {
    tx: Sender<Signal>,
}

impl MacObserverFactory {
    pub fn new(tx: Sender<Signal>) -> Self {
        Self { tx }
    }
}

impl ObserverFactory for MacObserverFactory {
    type Observer = ActivationObserver;

    fn create(&mut self, pid: Pid) -> Result<ActivationObserver> {
        let mut raw_observer: AXObserverRef = ptr::null_mut();
        // SAFETY: out-pointer is valid; callback has the required signature.
        let code =
            unsafe { ffi::AXObserverCreate(pid, on_application_activated, &mut raw_observer) };
        if code != AX_ERROR_SUCCESS || raw_observer.is_null() {
            return Err(AppError::ResourceCreation { pid, code });
        }
        // SAFETY: AXObserverCreate follows the create rule.
        let observer = unsafe { CFType::wrap_under_create_rule(raw_observer.cast_const()) };

        // SAFETY: returns a new element reference or null.
        let raw_element = unsafe { ffi::AXUIElementCreateApplication(pid) };
        if raw_element.is_null() {
            return Err(AppError::ResourceCreation {
                pid,
                code: AX_ERROR_FAILURE,
            });
        }
        // SAFETY: non-null, create rule.
        let element = unsafe { CFType::wrap_under_create_rule(raw_element.cast_const()) };

        let sink = Box::new(ActivationSink {
            pid,
            tx: self.tx.clone(),
        });
        let refcon = ptr::from_ref(sink.as_ref()).cast_mut().cast::<c_void>();
        let notification = CFString::from_static_string(APPLICATION_ACTIVATED);

        // SAFETY: observer and element are live; refcon outlives the
        // registration because the observer owns the sink.
        let code = unsafe {
            ffi::AXObserverAddNotification(
                as_ax_ref(&observer),
                as_ax_ref(&element),
                notification.as_concrete_TypeRef(),
                refcon,
            )
        };
        if code != AX_ERROR_SUCCESS {
            return Err(AppError::ResourceCreation { pid, code });
        }

        // SAFETY: the observer owns its source; the get rule retains it for
        // as long as the wrapper lives.
        let source = unsafe {
            let raw = ffi::AXObserverGetRunLoopSource(as_ax_ref(&observer));
            CFRunLoopSource::wrap_under_get_rule(raw)
        };
        CFRunLoop::get_main().add_source(&source, ffi::default_mode());

        Ok(ActivationObserver {
            pid,
            observer,
            element,
            source,
            notification,
            _sink: sink,
        })
    }
}
