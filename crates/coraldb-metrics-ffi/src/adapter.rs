//! Adapters bridging foreign handles into the core collector traits.
//!
//! `ForeignMeter` owns a meter handle and turns the host's
//! create-recorder callback into an [`ExternalCollector`];
//! `ForeignRecorder` wraps each recorder handle the callback returns.
//! Dropping an adapter frees its handle shell; the host cookie is
//! never freed here.

use std::ffi::CString;
use std::ptr;
use std::sync::Arc;

use libc::c_void;

use coraldb_metrics::{ExternalCollector, ExternalRecorder, Tag};

use crate::{CoralMeter, CoralRecorder, CoralTag};

/// External collector backed by a host-supplied meter handle.
///
/// Taking ownership here mirrors installing the handle into a client
/// instance: the adapter frees the meter handle on drop, and every
/// recorder handle the host's callback returned is freed when its
/// wrapping [`ForeignRecorder`] drops with the owning meter.
pub struct ForeignMeter {
    raw: *mut CoralMeter,
}

// The boundary contract requires host callbacks to be callable from
// the client's threads; the handle shell itself is immutable after
// callback registration.
unsafe impl Send for ForeignMeter {}
unsafe impl Sync for ForeignMeter {}

impl ForeignMeter {
    /// Take ownership of a meter handle.
    ///
    /// Returns `None` for a null handle.
    ///
    /// # Safety
    ///
    /// `raw` must come from [`coralmetrics_meter_create`] and must not
    /// be freed by the host afterwards; the create-recorder callback
    /// must already be registered.
    ///
    /// [`coralmetrics_meter_create`]: crate::coralmetrics_meter_create
    pub unsafe fn from_raw(raw: *mut CoralMeter) -> Option<Self> {
        if raw.is_null() {
            None
        } else {
            Some(Self { raw })
        }
    }

    /// The host cookie stored in the handle.
    pub fn cookie(&self) -> *mut c_void {
        unsafe { (*self.raw).cookie }
    }
}

impl ExternalCollector for ForeignMeter {
    fn create_recorder(&self, name: &str, tags: &[Tag]) -> Arc<dyn ExternalRecorder> {
        let meter = unsafe { &*self.raw };
        let Some(callback) = meter.create_recorder else {
            tracing::debug!(
                target: "op_metrics",
                metric = name,
                "no create-recorder callback registered on external meter",
            );
            return Arc::new(ForeignRecorder {
                raw: ptr::null_mut(),
            });
        };

        let name_c = CString::new(name).unwrap_or_default();
        let keys: Vec<CString> = tags
            .iter()
            .map(|t| CString::new(t.key.as_str()).unwrap_or_default())
            .collect();
        let values: Vec<CString> = tags
            .iter()
            .map(|t| CString::new(t.value.as_str()).unwrap_or_default())
            .collect();
        // Transient array; the host must not retain the pointer past
        // the callback.
        let tag_array: Vec<CoralTag> = keys
            .iter()
            .zip(values.iter())
            .map(|(key, value)| CoralTag {
                key: key.as_ptr(),
                value: value.as_ptr(),
            })
            .collect();
        let tags_ptr = if tag_array.is_empty() {
            ptr::null()
        } else {
            tag_array.as_ptr()
        };

        let raw = unsafe { callback(self.raw, name_c.as_ptr(), tags_ptr, tag_array.len()) };
        Arc::new(ForeignRecorder { raw })
    }
}

impl Drop for ForeignMeter {
    fn drop(&mut self) {
        unsafe {
            drop(Box::from_raw(self.raw));
        }
    }
}

/// External recorder backed by a host-supplied recorder handle.
pub struct ForeignRecorder {
    raw: *mut CoralRecorder,
}

unsafe impl Send for ForeignRecorder {}
unsafe impl Sync for ForeignRecorder {}

impl ForeignRecorder {
    /// The host cookie stored in the handle, or null for a recorder
    /// the host declined to create.
    pub fn cookie(&self) -> *mut c_void {
        if self.raw.is_null() {
            return ptr::null_mut();
        }
        unsafe { (*self.raw).cookie }
    }
}

impl ExternalRecorder for ForeignRecorder {
    fn record_value(&self, value_us: u64) {
        if self.raw.is_null() {
            return;
        }
        let recorder = unsafe { &*self.raw };
        if let Some(callback) = recorder.record_value {
            unsafe { callback(self.raw, value_us) };
        }
    }
}

impl Drop for ForeignRecorder {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            unsafe {
                drop(Box::from_raw(self.raw));
            }
        }
    }
}
