//! Raw declarations for the Accessibility and Carbon Text Input Source APIs.
//! CoreFoundation itself goes through the `core-foundation` wrappers.

#![allow(non_upper_case_globals, reason = "framework symbol names")]

use core_foundation::array::CFArrayRef;
use core_foundation::base::CFTypeRef;
use core_foundation::dictionary::CFDictionaryRef;
use core_foundation::runloop::CFRunLoopSourceRef;
use core_foundation::string::CFStringRef;
use std::ffi::c_void;

pub type AXObserverRef = *mut c_void;
pub type AXUIElementRef = *mut c_void;
pub type TISInputSourceRef = *mut c_void;

pub type AXObserverCallback = unsafe extern "C" fn(
    observer: AXObserverRef,
    element: AXUIElementRef,
    notification: CFStringRef,
    refcon: *mut c_void,
);

pub const AX_ERROR_SUCCESS: i32 = 0;
pub const AX_ERROR_FAILURE: i32 = -25200;

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    pub fn AXIsProcessTrusted() -> u8;

    pub fn AXObserverCreate(
        application: i32,
        callback: AXObserverCallback,
        observer_out: *mut AXObserverRef,
    ) -> i32;

    pub fn AXObserverAddNotification(
        observer: AXObserverRef,
        element: AXUIElementRef,
        notification: CFStringRef,
        refcon: *mut c_void,
    ) -> i32;

    pub fn AXObserverRemoveNotification(
        observer: AXObserverRef,
        element: AXUIElementRef,
        notification: CFStringRef,
    ) -> i32;

    pub fn AXObserverGetRunLoopSource(observer: AXObserverRef) -> CFRunLoopSourceRef;

    pub fn AXUIElementCreateApplication(pid: i32) -> AXUIElementRef;
}

#[link(name = "Carbon", kind = "framework")]
extern "C" {
    pub fn TISCopyCurrentKeyboardInputSource() -> TISInputSourceRef;
    pub fn TISCreateInputSourceList(
        properties: CFDictionaryRef,
        include_all_installed: u8,
    ) -> CFArrayRef;
    pub fn TISGetInputSourceProperty(source: TISInputSourceRef, key: CFStringRef) -> CFTypeRef;
    pub fn TISSelectInputSource(source: TISInputSourceRef) -> i32;

    pub static kTISPropertyInputSourceID: CFStringRef;
    pub static kTISPropertyLocalizedName: CFStringRef;
    pub static kTISPropertyIconImageURL: CFStringRef;
}

/// The default run loop mode.
pub fn default_mode() -> CFStringRef {
    // SAFETY: immutable framework constant.
    unsafe { core_foundation::runloop::kCFRunLoopDefaultMode }
}
