//! Binding to the vendor device-interface library, loaded at runtime.
//!
//! Signatures of `InitializeTI`, `ShutdownTI`, `Discover`,
//! `GetDiscoveredDeviceName`, `Connect`, `Close`, `Pulse`, `ChangeGain` and
//! `GetLastEAIError` are the ones in the vendor header. The remaining entry
//! points follow the facade's argument order and have not been checked
//! against real hardware.

use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::path::Path;

use libloading::Library;
use tactor_types::error::{Result, TactorError};

use crate::driver::{TactorDriver, func};

type StatusFn = unsafe extern "C" fn() -> c_int;
type Int1Fn = unsafe extern "C" fn(c_int) -> c_int;
type Int2Fn = unsafe extern "C" fn(c_int, c_int) -> c_int;
type Int3Fn = unsafe extern "C" fn(c_int, c_int, c_int) -> c_int;
type Int4Fn = unsafe extern "C" fn(c_int, c_int, c_int, c_int) -> c_int;
type Int6Fn = unsafe extern "C" fn(c_int, c_int, c_int, c_int, c_int, c_int) -> c_int;
type NameFn = unsafe extern "C" fn(c_int) -> *const c_char;
type ConnectFn = unsafe extern "C" fn(*const c_char, c_int, *mut c_void) -> c_int;

/// Entry points resolved from the library.
struct Symbols {
    initialize: StatusFn,
    shutdown: StatusFn,
    update: StatusFn,
    discover: Int1Fn,
    discovered_name: NameFn,
    connect: ConnectFn,
    close: Int1Fn,
    set_time_factor: Int1Fn,
    pulse: Int4Fn,
    change_gain: Int4Fn,
    change_freq: Int4Fn,
    ramp_gain: Int6Fn,
    ramp_freq: Int6Fn,
    stop: Int2Fn,
    set_tactors: Int3Fn,
    begin_store_taction: Int2Fn,
    finish_store_taction: Int1Fn,
    play_stored_taction: Int3Fn,
    last_error: StatusFn,
}

/// Copy a function pointer out of the library.
///
/// # Safety
///
/// `T` must match the exported symbol's real signature.
unsafe fn symbol<T: Copy>(lib: &Library, name: &str) -> std::result::Result<T, libloading::Error> {
    // SAFETY: forwarded to the caller.
    unsafe { lib.get::<T>(name.as_bytes()).map(|sym| *sym) }
}

impl Symbols {
    /// # Safety
    ///
    /// The library must export every entry point with the declared signature.
    unsafe fn resolve(lib: &Library) -> std::result::Result<Self, libloading::Error> {
        // SAFETY: forwarded to the caller.
        unsafe {
            Ok(Self {
                initialize: symbol(lib, func::INITIALIZE)?,
                shutdown: symbol(lib, func::SHUTDOWN)?,
                update: symbol(lib, func::UPDATE)?,
                discover: symbol(lib, func::DISCOVER)?,
                discovered_name: symbol(lib, func::GET_NAME)?,
                connect: symbol(lib, func::CONNECT)?,
                close: symbol(lib, func::CLOSE)?,
                set_time_factor: symbol(lib, func::SET_TIME_FACTOR)?,
                pulse: symbol(lib, func::PULSE)?,
                change_gain: symbol(lib, func::CHANGE_GAIN)?,
                change_freq: symbol(lib, func::CHANGE_FREQ)?,
                ramp_gain: symbol(lib, func::RAMP_GAIN)?,
                ramp_freq: symbol(lib, func::RAMP_FREQ)?,
                stop: symbol(lib, func::STOP)?,
                set_tactors: symbol(lib, func::SET_TACTORS)?,
                begin_store_taction: symbol(lib, func::BEGIN_STORE_TACTION)?,
                finish_store_taction: symbol(lib, func::FINISH_STORE_TACTION)?,
                play_stored_taction: symbol(lib, func::PLAY_STORED_TACTION)?,
                last_error: symbol(lib, func::LAST_ERROR)?,
            })
        }
    }
}

/// [`TactorDriver`] over the vendor library.
pub struct VendorDriver {
    syms: Symbols,
    // Must outlive every pointer in `syms`.
    _lib: Library,
}

impl VendorDriver {
    /// Load the library at `path` and resolve every entry point.
    pub fn load(path: &Path) -> Result<Self> {
        let load_error =
            |e: libloading::Error| TactorError::Config(format!("failed to load {}: {e}", path.display()));

        // SAFETY: loading runs the library's initialisers; the vendor library
        // is trusted to export the entry points with the declared signatures.
        let lib = unsafe { Library::new(path) }.map_err(load_error)?;
        let syms = unsafe { Symbols::resolve(&lib) }.map_err(load_error)?;
        log::info!("Loaded vendor tactor library {}", path.display());
        Ok(Self { syms, _lib: lib })
    }
}

impl std::fmt::Debug for VendorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorDriver").finish_non_exhaustive()
    }
}

// SAFETY (every block below): the pointers were resolved in `load` with their
// declared signatures, and `_lib` keeps them valid for `self`'s lifetime.
impl TactorDriver for VendorDriver {
    fn initialize(&mut self) -> i32 {
        unsafe { (self.syms.initialize)() }
    }

    fn shutdown(&mut self) -> i32 {
        unsafe { (self.syms.shutdown)() }
    }

    fn update(&mut self) -> i32 {
        unsafe { (self.syms.update)() }
    }

    fn discover(&mut self, device_type: i32) -> i32 {
        unsafe { (self.syms.discover)(device_type) }
    }

    fn discovered_name(&self, index: i32) -> Option<String> {
        let ptr = unsafe { (self.syms.discovered_name)(index) };
        if ptr.is_null() {
            return None;
        }
        // SAFETY: a non-null result is a nul-terminated string owned by the
        // library, valid until the next discovery.
        let name = unsafe { CStr::from_ptr(ptr) };
        Some(name.to_string_lossy().into_owned())
    }

    fn connect(&mut self, name: &str, device_type: i32) -> i32 {
        // The C side reads up to the first nul anyway.
        let head = name.split('\0').next().unwrap_or_default();
        let name = CString::new(head).unwrap_or_default();
        unsafe { (self.syms.connect)(name.as_ptr(), device_type, std::ptr::null_mut()) }
    }

    fn close(&mut self, device_id: i32) -> i32 {
        unsafe { (self.syms.close)(device_id) }
    }

    fn set_time_factor(&mut self, factor: i32) -> i32 {
        unsafe { (self.syms.set_time_factor)(factor) }
    }

    fn pulse(&mut self, device_id: i32, tactor: i32, duration: i32, delay: i32) -> i32 {
        unsafe { (self.syms.pulse)(device_id, tactor, duration, delay) }
    }

    fn change_gain(&mut self, device_id: i32, tactor: i32, gain: i32, delay: i32) -> i32 {
        unsafe { (self.syms.change_gain)(device_id, tactor, gain, delay) }
    }

    fn change_freq(&mut self, device_id: i32, tactor: i32, freq: i32, delay: i32) -> i32 {
        unsafe { (self.syms.change_freq)(device_id, tactor, freq, delay) }
    }

    fn ramp_gain(
        &mut self,
        device_id: i32,
        tactor: i32,
        start: i32,
        end: i32,
        duration: i32,
        delay: i32,
    ) -> i32 {
        unsafe { (self.syms.ramp_gain)(device_id, tactor, start, end, duration, delay) }
    }

    fn ramp_freq(
        &mut self,
        device_id: i32,
        tactor: i32,
        start: i32,
        end: i32,
        duration: i32,
        delay: i32,
    ) -> i32 {
        unsafe { (self.syms.ramp_freq)(device_id, tactor, start, end, duration, delay) }
    }

    fn stop(&mut self, device_id: i32, delay: i32) -> i32 {
        unsafe { (self.syms.stop)(device_id, delay) }
    }

    fn set_tactors(&mut self, device_id: i32, delay: i32, mask: u32) -> i32 {
        // Same bit pattern; the C side takes a plain int.
        let states = c_int::from_ne_bytes(mask.to_ne_bytes());
        unsafe { (self.syms.set_tactors)(device_id, delay, states) }
    }

    fn begin_store_taction(&mut self, device_id: i32, tac_id: i32) -> i32 {
        unsafe { (self.syms.begin_store_taction)(device_id, tac_id) }
    }

    fn finish_store_taction(&mut self, device_id: i32) -> i32 {
        unsafe { (self.syms.finish_store_taction)(device_id) }
    }

    fn play_stored_taction(&mut self, device_id: i32, delay: i32, tac_id: i32) -> i32 {
        unsafe { (self.syms.play_stored_taction)(device_id, delay, tac_id) }
    }

    fn last_error(&self) -> i32 {
        unsafe { (self.syms.last_error)() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_is_config_error() {
        let err = VendorDriver::load(Path::new("/nonexistent/libTactorInterface.so")).unwrap_err();
        match err {
            TactorError::Config(msg) => {
                assert!(msg.contains("/nonexistent/libTactorInterface.so"), "{msg}");
            },
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
