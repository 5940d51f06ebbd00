//! C-compatible boundary for external metrics collectors.
//!
//! A host process registers its own meter implementation through this
//! surface and receives latency values without the client library
//! knowing what it does with them. The library allocates and frees the
//! opaque handle shells; the host owns whatever its cookie points to
//! and recovers it inside callbacks via the cookie accessors.
//!
//! Every entry point returns a [`CoralStatus`] and never unwinds.
//! Registering the create-recorder callback before any recorder is
//! requested is a documented precondition, not a runtime check.
//!
//! # Host-side usage
//!
//! ```ignore
//! let mut meter = std::ptr::null_mut();
//! coralmetrics_meter_create(cookie, &mut meter);
//! coralmetrics_meter_set_create_recorder_callback(meter, Some(new_recorder));
//! // Hand `meter` to the client configuration; ownership of the
//! // handle (and of every recorder handle the callback returns)
//! // passes to the client.
//! ```

pub mod adapter;

pub use adapter::{ForeignMeter, ForeignRecorder};

use libc::{c_char, c_void};

/// Status code returned by every boundary function.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoralStatus {
    /// Success.
    Ok = 0,
    /// A required pointer argument was null.
    NullArgument = 1,
}

/// A metric tag crossing the boundary.
///
/// The tag array handed to the create-recorder callback is transient;
/// the host must copy anything it wants to keep.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CoralTag {
    /// Tag key, NUL-terminated.
    pub key: *const c_char,
    /// Tag value, NUL-terminated.
    pub value: *const c_char,
}

/// Host callback creating a recorder for a metric name and tag set.
pub type CoralCreateRecorderFn = unsafe extern "C" fn(
    meter: *const CoralMeter,
    name: *const c_char,
    tags: *const CoralTag,
    tag_count: usize,
) -> *mut CoralRecorder;

/// Host callback receiving one latency value, in microseconds.
pub type CoralRecordValueFn = unsafe extern "C" fn(recorder: *const CoralRecorder, value: u64);

/// Opaque external meter handle.
pub struct CoralMeter {
    pub(crate) cookie: *mut c_void,
    pub(crate) create_recorder: Option<CoralCreateRecorderFn>,
}

/// Opaque external recorder handle.
pub struct CoralRecorder {
    pub(crate) cookie: *mut c_void,
    pub(crate) record_value: Option<CoralRecordValueFn>,
}

/// Allocate an external meter handle holding the host `cookie`.
///
/// The handle is freed by the client when the owning instance is
/// destroyed, or by [`coralmetrics_meter_destroy`] if it was never
/// installed.
#[no_mangle]
pub unsafe extern "C" fn coralmetrics_meter_create(
    cookie: *mut c_void,
    meter_out: *mut *mut CoralMeter,
) -> CoralStatus {
    if meter_out.is_null() {
        return CoralStatus::NullArgument;
    }
    let meter = Box::new(CoralMeter {
        cookie,
        create_recorder: None,
    });
    *meter_out = Box::into_raw(meter);
    CoralStatus::Ok
}

/// Register the host's create-recorder callback.
///
/// Must be called before any recorder is requested from the meter.
#[no_mangle]
pub unsafe extern "C" fn coralmetrics_meter_set_create_recorder_callback(
    meter: *mut CoralMeter,
    callback: Option<CoralCreateRecorderFn>,
) -> CoralStatus {
    if meter.is_null() {
        return CoralStatus::NullArgument;
    }
    (*meter).create_recorder = callback;
    CoralStatus::Ok
}

/// Fetch the host cookie from a meter handle.
#[no_mangle]
pub unsafe extern "C" fn coralmetrics_meter_cookie(
    meter: *const CoralMeter,
    cookie_out: *mut *mut c_void,
) -> CoralStatus {
    if meter.is_null() || cookie_out.is_null() {
        return CoralStatus::NullArgument;
    }
    *cookie_out = (*meter).cookie;
    CoralStatus::Ok
}

/// Free a meter handle that was never installed into a client.
///
/// An installed meter is freed by the client instance instead,
/// together with every recorder handle it created. The host cookie is
/// never touched.
#[no_mangle]
pub unsafe extern "C" fn coralmetrics_meter_destroy(meter: *mut CoralMeter) -> CoralStatus {
    if meter.is_null() {
        return CoralStatus::NullArgument;
    }
    drop(Box::from_raw(meter));
    CoralStatus::Ok
}

/// Allocate an external recorder handle holding the host `cookie`.
#[no_mangle]
pub unsafe extern "C" fn coralmetrics_recorder_create(
    cookie: *mut c_void,
    recorder_out: *mut *mut CoralRecorder,
) -> CoralStatus {
    if recorder_out.is_null() {
        return CoralStatus::NullArgument;
    }
    let recorder = Box::new(CoralRecorder {
        cookie,
        record_value: None,
    });
    *recorder_out = Box::into_raw(recorder);
    CoralStatus::Ok
}

/// Register the host's record-value callback.
#[no_mangle]
pub unsafe extern "C" fn coralmetrics_recorder_set_record_value_callback(
    recorder: *mut CoralRecorder,
    callback: Option<CoralRecordValueFn>,
) -> CoralStatus {
    if recorder.is_null() {
        return CoralStatus::NullArgument;
    }
    (*recorder).record_value = callback;
    CoralStatus::Ok
}

/// Fetch the host cookie from a recorder handle.
#[no_mangle]
pub unsafe extern "C" fn coralmetrics_recorder_cookie(
    recorder: *const CoralRecorder,
    cookie_out: *mut *mut c_void,
) -> CoralStatus {
    if recorder.is_null() || cookie_out.is_null() {
        return CoralStatus::NullArgument;
    }
    *cookie_out = (*recorder).cookie;
    CoralStatus::Ok
}

/// Free a recorder handle that was allocated but never returned from
/// the create-recorder callback.
///
/// Recorders the callback did return are owned, and freed, by the
/// client's meter.
#[no_mangle]
pub unsafe extern "C" fn coralmetrics_recorder_destroy(
    recorder: *mut CoralRecorder,
) -> CoralStatus {
    if recorder.is_null() {
        return CoralStatus::NullArgument;
    }
    drop(Box::from_raw(recorder));
    CoralStatus::Ok
}

#[cfg(test)]
mod tests {
    use std::ptr;

    use super::*;

    #[test]
    fn test_meter_lifecycle_and_cookie() {
        let cookie = Box::into_raw(Box::new(7u32)) as *mut c_void;
        let mut meter = ptr::null_mut();
        unsafe {
            assert_eq!(coralmetrics_meter_create(cookie, &mut meter), CoralStatus::Ok);
            assert!(!meter.is_null());

            let mut fetched = ptr::null_mut();
            assert_eq!(
                coralmetrics_meter_cookie(meter, &mut fetched),
                CoralStatus::Ok
            );
            assert_eq!(fetched, cookie);

            assert_eq!(coralmetrics_meter_destroy(meter), CoralStatus::Ok);
            // The cookie is host-owned; the destroy above must not have
            // touched it.
            drop(Box::from_raw(cookie as *mut u32));
        }
    }

    #[test]
    fn test_orphan_recorder_destroy() {
        let mut recorder = ptr::null_mut();
        unsafe {
            assert_eq!(
                coralmetrics_recorder_create(ptr::null_mut(), &mut recorder),
                CoralStatus::Ok
            );
            assert_eq!(coralmetrics_recorder_destroy(recorder), CoralStatus::Ok);
        }
    }

    #[test]
    fn test_null_arguments() {
        unsafe {
            assert_eq!(
                coralmetrics_meter_create(ptr::null_mut(), ptr::null_mut()),
                CoralStatus::NullArgument
            );
            assert_eq!(
                coralmetrics_meter_set_create_recorder_callback(ptr::null_mut(), None),
                CoralStatus::NullArgument
            );
            assert_eq!(
                coralmetrics_meter_cookie(ptr::null(), ptr::null_mut()),
                CoralStatus::NullArgument
            );
            assert_eq!(
                coralmetrics_meter_destroy(ptr::null_mut()),
                CoralStatus::NullArgument
            );
            assert_eq!(
                coralmetrics_recorder_create(ptr::null_mut(), ptr::null_mut()),
                CoralStatus::NullArgument
            );
            assert_eq!(
                coralmetrics_recorder_destroy(ptr::null_mut()),
                CoralStatus::NullArgument
            );
        }
    }
}
