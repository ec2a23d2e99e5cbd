//! The vendor device-interface trait.

/// Vendor function names, as they appear in driver error reports.
pub mod func {
    pub const INITIALIZE: &str = "InitializeTI";
    pub const SHUTDOWN: &str = "ShutdownTI";
    pub const UPDATE: &str = "UpdateTI";
    pub const DISCOVER: &str = "Discover";
    pub const GET_NAME: &str = "GetDiscoveredDeviceName";
    pub const CONNECT: &str = "Connect";
    pub const CLOSE: &str = "Close";
    pub const SET_TIME_FACTOR: &str = "SetTimeFactor";
    pub const PULSE: &str = "Pulse";
    pub const CHANGE_GAIN: &str = "ChangeGain";
    pub const CHANGE_FREQ: &str = "ChangeFreq";
    pub const RAMP_GAIN: &str = "RampGain";
    pub const RAMP_FREQ: &str = "RampFreq";
    pub const STOP: &str = "Stop";
    pub const SET_TACTORS: &str = "SetTactors";
    pub const BEGIN_STORE_TACTION: &str = "BeginStoreTAction";
    pub const FINISH_STORE_TACTION: &str = "FinishStoreTAction";
    pub const PLAY_STORED_TACTION: &str = "PlayStoredTAction";
    pub const LAST_ERROR: &str = "GetLastEAIError";
}

/// Abstraction over the vendor tactor interface.
///
/// Return values follow the vendor convention: a negative value is a failure
/// whose detail is available from [`last_error`](Self::last_error); any other
/// value is success and may carry a result (device id, discovered count).
/// Implementations perform blocking I/O and are called from one thread at a
/// time.
pub trait TactorDriver {
    /// Start the interface. Must precede every other call except `shutdown`.
    fn initialize(&mut self) -> i32;

    /// Release the interface and any driver-side resources.
    fn shutdown(&mut self) -> i32;

    /// Pump pending driver work (heartbeat, queued responses).
    fn update(&mut self) -> i32;

    /// Scan for devices of `device_type`. Returns the number found.
    fn discover(&mut self, device_type: i32) -> i32;

    /// Name of the `index`th device found by the last discovery, 0-based.
    fn discovered_name(&self, index: i32) -> Option<String>;

    /// Open a device by name. Returns the device id.
    fn connect(&mut self, name: &str, device_type: i32) -> i32;

    /// Close a previously connected device.
    fn close(&mut self, device_id: i32) -> i32;

    /// Scale applied to every duration sent to the device (1-255).
    fn set_time_factor(&mut self, factor: i32) -> i32;

    fn pulse(&mut self, device_id: i32, tactor: i32, duration: i32, delay: i32) -> i32;

    fn change_gain(&mut self, device_id: i32, tactor: i32, gain: i32, delay: i32) -> i32;

    fn change_freq(&mut self, device_id: i32, tactor: i32, freq: i32, delay: i32) -> i32;

    fn ramp_gain(
        &mut self,
        device_id: i32,
        tactor: i32,
        start: i32,
        end: i32,
        duration: i32,
        delay: i32,
    ) -> i32;

    fn ramp_freq(
        &mut self,
        device_id: i32,
        tactor: i32,
        start: i32,
        end: i32,
        duration: i32,
        delay: i32,
    ) -> i32;

    /// Stop every tactor on the device.
    fn stop(&mut self, device_id: i32, delay: i32) -> i32;

    /// Switch tactors on or off at once. Bit 0 of `mask` is tactor 1.
    fn set_tactors(&mut self, device_id: i32, delay: i32, mask: u32) -> i32;

    /// Start recording subsequent actions into TAction slot `tac_id`.
    fn begin_store_taction(&mut self, device_id: i32, tac_id: i32) -> i32;

    /// Finish the recording started by `begin_store_taction`.
    fn finish_store_taction(&mut self, device_id: i32) -> i32;

    fn play_stored_taction(&mut self, device_id: i32, delay: i32, tac_id: i32) -> i32;

    /// Detailed code for the most recent failure.
    fn last_error(&self) -> i32;
}

impl<T: TactorDriver + ?Sized> TactorDriver for Box<T> {
    fn initialize(&mut self) -> i32 {
        (**self).initialize()
    }

    fn shutdown(&mut self) -> i32 {
        (**self).shutdown()
    }

    fn update(&mut self) -> i32 {
        (**self).update()
    }

    fn discover(&mut self, device_type: i32) -> i32 {
        (**self).discover(device_type)
    }

    fn discovered_name(&self, index: i32) -> Option<String> {
        (**self).discovered_name(index)
    }

    fn connect(&mut self, name: &str, device_type: i32) -> i32 {
        (**self).connect(name, device_type)
    }

    fn close(&mut self, device_id: i32) -> i32 {
        (**self).close(device_id)
    }

    fn set_time_factor(&mut self, factor: i32) -> i32 {
        (**self).set_time_factor(factor)
    }

    fn pulse(&mut self, device_id: i32, tactor: i32, duration: i32, delay: i32) -> i32 {
        (**self).pulse(device_id, tactor, duration, delay)
    }

    fn change_gain(&mut self, device_id: i32, tactor: i32, gain: i32, delay: i32) -> i32 {
        (**self).change_gain(device_id, tactor, gain, delay)
    }

    fn change_freq(&mut self, device_id: i32, tactor: i32, freq: i32, delay: i32) -> i32 {
        (**self).change_freq(device_id, tactor, freq, delay)
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
        (**self).ramp_gain(device_id, tactor, start, end, duration, delay)
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
        (**self).ramp_freq(device_id, tactor, start, end, duration, delay)
    }

    fn stop(&mut self, device_id: i32, delay: i32) -> i32 {
        (**self).stop(device_id, delay)
    }

    fn set_tactors(&mut self, device_id: i32, delay: i32, mask: u32) -> i32 {
        (**self).set_tactors(device_id, delay, mask)
    }

    fn begin_store_taction(&mut self, device_id: i32, tac_id: i32) -> i32 {
        (**self).begin_store_taction(device_id, tac_id)
    }

    fn finish_store_taction(&mut self, device_id: i32) -> i32 {
        (**self).finish_store_taction(device_id)
    }

    fn play_stored_taction(&mut self, device_id: i32, delay: i32, tac_id: i32) -> i32 {
        (**self).play_stored_taction(device_id, delay, tac_id)
    }

    fn last_error(&self) -> i32 {
        (**self).last_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimDriver;
    use tactor_types::catalog;

    #[test]
    fn boxed_driver_forwards() {
        let mut boxed: Box<dyn TactorDriver + Send> = Box::new(SimDriver::default());
        assert!(boxed.connect("DEV0", 1) < 0);
        assert_eq!(boxed.last_error(), catalog::NO_INIT);
        assert_eq!(boxed.initialize(), 0);
        assert_eq!(boxed.connect("DEV0", 1), 0);
        assert_eq!(boxed.set_tactors(0, 0, 0b11), 0);
        assert_eq!(boxed.close(0), 0);
        assert_eq!(boxed.shutdown(), 0);
    }
}
