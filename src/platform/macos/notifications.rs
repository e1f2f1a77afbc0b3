//! Process launch and exit reported by `NSWorkspace`'s notification center.

use crate::platform::Pid;
use crate::signal::Signal;
use log::trace;
use objc2::rc::Retained;
use objc2::runtime::{NSObject, NSObjectProtocol};
use objc2::{declare_class, msg_send_id, mutability, sel, ClassType, DeclaredClass};
use objc2_app_kit::{
    NSRunningApplication, NSWorkspace, NSWorkspaceApplicationKey,
    NSWorkspaceDidLaunchApplicationNotification, NSWorkspaceDidTerminateApplicationNotification,
};
use objc2_foundation::NSNotification;
use std::sync::mpsc::Sender;

declare_class!(
    struct LifecycleObserver;

    // SAFETY: NSObject has no subclassing requirements and the class does not
    // implement Drop.
    unsafe impl ClassType for LifecycleObserver {
        type Super = NSObject;
        type Mutability = mutability::InteriorMutable;
        const NAME: &'static str = "InputShiftLifecycleObserver";
    }

    impl DeclaredClass for LifecycleObserver {
        type Ivars = Sender<Signal>;
    }

    unsafe impl LifecycleObserver {
        #[method(applicationDidLaunch:)]
        fn application_did_launch(&self, notification: &NSNotification) {
            self.forward(notification, Signal::Launched);
        }

        #[method(applicationDidTerminate:)]
        fn application_did_terminate(&self, notification: &NSNotification) {
            self.forward(notification, Signal::Terminated);
        }
    }
);

unsafe impl NSObjectProtocol for LifecycleObserver {}

impl LifecycleObserver {
    fn new(tx: Sender<Signal>) -> Retained<Self> {
        let this = Self::alloc().set_ivars(tx);
        // SAFETY: NSObject's designated initializer.
        unsafe { msg_send_id![super(this), init] }
    }

    fn forward(&self, notification: &NSNotification, signal: fn(Pid) -> Signal) {
        if let Some(pid) = notified_pid(notification) {
            let signal = signal(pid);
            trace!("Workspace notification: {signal:?}");
            let _ = self.ivars().send(signal);
        }
    }
}

/// Pid of the application a workspace notification is about.
fn notified_pid(notification: &NSNotification) -> Option<Pid> {
    // SAFETY: workspace launch and terminate notifications carry the
    // NSRunningApplication under NSWorkspaceApplicationKey.
    unsafe {
        let info = notification.userInfo()?;
        let app: Option<Retained<NSRunningApplication>> =
            msg_send_id![&*info, objectForKey: NSWorkspaceApplicationKey];
        Some(app?.processIdentifier())
    }
}

/// Keeps a `LifecycleObserver` registered for did-launch and
/// did-terminate until dropped. Notifications are delivered while the main
/// run loop spins.
pub struct LifecycleNotifications {
    observer: Retained<LifecycleObserver>,
}

impl LifecycleNotifications {
    pub fn register(tx: Sender<Signal>) -> Self {
        let observer = LifecycleObserver::new(tx);
        // SAFETY: both selectors are implemented by LifecycleObserver and take
        // one NSNotification; the observer is removed in Drop.
        unsafe {
            let center = NSWorkspace::sharedWorkspace().notificationCenter();
            center.addObserver_selector_name_object(
                &observer,
                sel!(applicationDidLaunch:),
                Some(NSWorkspaceDidLaunchApplicationNotification),
                None,
            );
            center.addObserver_selector_name_object(
                &observer,
                sel!(applicationDidTerminate:),
                Some(NSWorkspaceDidTerminateApplicationNotification),
                None,
            );
        }
        Self { observer }
    }
}

impl Drop for LifecycleNotifications {
    fn drop(&mut self) {
        // SAFETY: removes the registrations made in `register`.
        unsafe {
            NSWorkspace::sharedWorkspace()
                .notificationCenter()
                .removeObserver(&self.observer);
        }
    }
}
