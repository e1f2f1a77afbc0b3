use crate::platform::{Pid, RunningApplication, Workspace};
use objc2::rc::autoreleasepool;
use objc2_app_kit::{NSRunningApplication, NSWorkspace};

/// `NSWorkspace`-backed view of running applications.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacWorkspace;

fn describe(app: &NSRunningApplication) -> RunningApplication {
    // SAFETY: plain property reads on a live NSRunningApplication.
    unsafe {
        RunningApplication {
            pid: app.processIdentifier(),
            bundle_id: app.bundleIdentifier().map(|id| id.to_string()),
            name: app.localizedName().map(|name| name.to_string()),
        }
    }
}

impl Workspace for MacWorkspace {
    fn frontmost_application(&self) -> Option<RunningApplication> {
        autoreleasepool(|_| {
            // SAFETY: see `frontmost_pid`.
            let app = unsafe { NSWorkspace::sharedWorkspace().frontmostApplication() }?;
            Some(describe(&app))
        })
    }

    fn frontmost_pid(&self) -> Option<Pid> {
        autoreleasepool(|_| {
            // SAFETY: main-thread AppKit queries with no preconditions.
            unsafe {
                let workspace = NSWorkspace::sharedWorkspace();
                workspace.frontmostApplication().map(|app| app.processIdentifier())
            }
        })
    }

    fn running_pids(&self) -> Vec<Pid> {
        autoreleasepool(|_| {
            // SAFETY: see `frontmost_pid`.
            let apps = unsafe { NSWorkspace::sharedWorkspace().runningApplications() };
            apps.iter()
                // SAFETY: property read on an element of the array above.
                .map(|app| unsafe { app.processIdentifier() })
                .collect()
        })
    }

    fn application_icon(&self, pid: Pid) -> Vec<u8> {
        autoreleasepool(|_| {
            // SAFETY: lookups on live AppKit objects; TIFF data is copied out
            // before the pool drains.
            unsafe {
                NSRunningApplication::runningApplicationWithProcessIdentifier(pid)
                    .and_then(|app| app.icon())
                    .and_then(|icon| icon.TIFFRepresentation())
                    .map(|data| data.bytes().to_vec())
                    .unwrap_or_default()
            }
        })
    }
}
