//! Keyboard input sources through Carbon Text Input Source Services.

use super::ffi::{self, TISInputSourceRef};
use crate::error::{AppError, Result};
use crate::platform::{InputSourceController, InputSourceHandle};
use core_foundation::array::CFArray;
use core_foundation::base::{CFType, TCFType};
use core_foundation::dictionary::CFDictionary;
use core_foundation::string::{CFString, CFStringRef};
use core_foundation::url::CFURL;
use std::fs;

/// A retained `TISInputSourceRef`.
pub struct MacInputSource {
    source: CFType,
    id: String,
}

impl MacInputSource {
    /// Returns None for sources without an id.
    fn from_retained(source: CFType) -> Option<Self> {
        // SAFETY: source is a live input source.
        let id = unsafe { string_property(as_tis_ref(&source), ffi::kTISPropertyInputSourceID) }?;
        Some(Self { source, id })
    }

    fn as_raw(&self) -> TISInputSourceRef {
        as_tis_ref(&self.source)
    }
}

fn as_tis_ref(source: &CFType) -> TISInputSourceRef {
    source.as_CFTypeRef().cast_mut()
}

/// Read a CFString property; the result follows the get rule.
unsafe fn string_property(source: TISInputSourceRef, key: CFStringRef) -> Option<String> {
    // SAFETY: caller passes a live source and a TIS property key.
    let value = unsafe { ffi::TISGetInputSourceProperty(source, key) };
    if value.is_null() {
        return None;
    }
    // SAFETY: the property is documented as a CFString.
    Some(unsafe { CFString::wrap_under_get_rule(value.cast()) }.to_string())
}

impl InputSourceHandle for MacInputSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn localized_name(&self) -> Option<String> {
        // SAFETY: self.source is live while self is.
        unsafe { string_property(self.as_raw(), ffi::kTISPropertyLocalizedName) }
    }

    fn icon(&self) -> Option<Vec<u8>> {
        // SAFETY: self.source is live; the property is a CFURL.
        let url =
            unsafe { ffi::TISGetInputSourceProperty(self.as_raw(), ffi::kTISPropertyIconImageURL) };
        if url.is_null() {
            return None;
        }
        // SAFETY: non-null CFURL under the get rule.
        let url = unsafe { CFURL::wrap_under_get_rule(url.cast()) };
        fs::read(url.to_path()?).ok()
    }
}

/// The system's installed keyboard input sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacInputSources;

impl InputSourceController for MacInputSources {
    type Handle = MacInputSource;

    fn current(&self) -> Result<MacInputSource> {
        // SAFETY: returns a +1 reference or null.
        let source = unsafe { ffi::TISCopyCurrentKeyboardInputSource() };
        if source.is_null() {
            return Err(AppError::InputSource("no current keyboard input source".into()));
        }
        // SAFETY: non-null, create rule.
        let source = unsafe { CFType::wrap_under_create_rule(source.cast_const()) };
        MacInputSource::from_retained(source)
            .ok_or_else(|| AppError::InputSource("current input source has no id".into()))
    }

    fn resolve(&self, id: &str) -> Option<MacInputSource> {
        // SAFETY: framework constant.
        let key = unsafe { CFString::wrap_under_get_rule(ffi::kTISPropertyInputSourceID) };
        let filter = CFDictionary::from_CFType_pairs(&[(key, CFString::new(id))]);

        // SAFETY: filter is a valid CFDictionary; the list follows the create rule.
        let list = unsafe { ffi::TISCreateInputSourceList(filter.as_concrete_TypeRef(), 1) };
        if list.is_null() {
            return None;
        }
        // SAFETY: non-null CFArray of input sources, create rule.
        let list: CFArray<CFType> = unsafe { CFArray::wrap_under_create_rule(list) };
        let source = CFType::clone(&list.get(0)?);
        MacInputSource::from_retained(source)
    }

    fn activate(&self, handle: &MacInputSource) -> Result<()> {
        // SAFETY: handle.source is live.
        let status = unsafe { ffi::TISSelectInputSource(handle.as_raw()) };
        if status == 0 {
            Ok(())
        } else {
            Err(AppError::InputSource(format!(
                "TISSelectInputSource({}) returned {status}",
                handle.id
            )))
        }
    }
}
