//! Session lifecycle and device operations.

use std::collections::BTreeMap;
use std::fmt;

use tactor_driver::{TactorDriver, func};
use tactor_types::error::{Result, TactorError};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Driver not started (initial state, and the state after shutdown).
    Uninitialized,
    /// Driver started, no device bound.
    Ready,
    /// Driver started and one device bound.
    Connected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Ready => write!(f, "ready"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// A device opened through the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Handle returned by the driver's connect call.
    pub device_id: i32,
    /// Device type the connection was opened with.
    pub device_type: i32,
}

/// Owned session context.
///
/// Holds the driver plus everything the lifecycle needs to know about it.
/// At most one device is bound at a time; `connected` is derived from the
/// device table, so it cannot drift from it.
pub struct Session<D: TactorDriver> {
    driver: D,
    initialized: bool,
    devices: BTreeMap<i32, DeviceRecord>,
}

impl<D: TactorDriver> Session<D> {
    /// Wrap a driver. The driver is not touched until `initialize`.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            initialized: false,
            devices: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        if !self.initialized {
            SessionState::Uninitialized
        } else if self.devices.is_empty() {
            SessionState::Ready
        } else {
            SessionState::Connected
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a device is bound. Pure read, no driver call.
    pub fn is_connected(&self) -> bool {
        !self.devices.is_empty()
    }

    /// The bound device, if any.
    pub fn device(&self) -> Option<&DeviceRecord> {
        self.devices.values().next()
    }

    /// Every tracked device in id order.
    pub fn devices(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.devices.values()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Direct driver access. Calls made this way bypass session tracking.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Turn a raw driver result into a `Result`, translating failures.
    fn check(&self, function: &'static str, raw: i32) -> Result<i32> {
        if raw < 0 {
            let code = self.driver.last_error();
            log::debug!("{function} returned {raw}, last error {code}");
            Err(TactorError::driver(function, code))
        } else {
            Ok(raw)
        }
    }

    /// Run one driver call and check its result.
    fn call(&mut self, function: &'static str, op: impl FnOnce(&mut D) -> i32) -> Result<i32> {
        let raw = op(&mut self.driver);
        self.check(function, raw)
    }

    /// Pump the driver, then run `op`. A refresh failure is reported as-is
    /// and `op` is not attempted.
    fn refreshed(
        &mut self,
        function: &'static str,
        op: impl FnOnce(&mut D) -> i32,
    ) -> Result<()> {
        self.refresh()?;
        self.call(function, op).map(drop)
    }

    // -- Lifecycle --

    /// Start the driver. A no-op when already initialized.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            log::debug!("initialize: already {}, skipping", self.state());
            return Ok(());
        }
        self.call(func::INITIALIZE, |d| d.initialize())?;
        self.initialized = true;
        log::info!("Tactor interface initialized");
        Ok(())
    }

    /// Open a device and bind it to the session.
    ///
    /// Fails without calling the driver when a device is already bound. On
    /// driver failure nothing is recorded.
    pub fn connect(&mut self, name: &str, device_type: i32) -> Result<i32> {
        if let Some(current) = self.device() {
            return Err(TactorError::AlreadyConnected {
                device_id: current.device_id,
            });
        }
        let device_id = self.call(func::CONNECT, |d| d.connect(name, device_type))?;
        self.devices.insert(
            device_id,
            DeviceRecord {
                device_id,
                device_type,
            },
        );
        log::info!("Connected to {name} (type {device_type}) as device {device_id}");
        Ok(device_id)
    }

    /// Close one device. The record is dropped only if the driver succeeds.
    pub fn close(&mut self, device_id: i32) -> Result<()> {
        self.call(func::CLOSE, |d| d.close(device_id))?;
        if self.devices.remove(&device_id).is_some() {
            log::info!("Closed device {device_id}");
        }
        Ok(())
    }

    /// Close every device, stop the driver, and return to `Uninitialized`.
    ///
    /// Individual close failures are logged and skipped. The session is reset
    /// even when the driver's own shutdown fails; that failure is still
    /// returned. Calling this on an uninitialized session does nothing.
    pub fn shutdown(&mut self) -> Result<()> {
        if !self.initialized && self.devices.is_empty() {
            log::debug!("shutdown: nothing to release");
            return Ok(());
        }

        let ids: Vec<i32> = self.devices.keys().copied().collect();
        for device_id in ids {
            let raw = self.driver.close(device_id);
            if let Err(e) = self.check(func::CLOSE, raw) {
                log::warn!("Ignoring close failure for device {device_id}: {e}");
            }
        }
        self.devices.clear();

        let raw = self.driver.shutdown();
        let result = self.check(func::SHUTDOWN, raw).map(drop);
        self.initialized = false;
        log::info!("Tactor interface shut down");
        result
    }

    // -- Queries --

    /// Scan for devices. Returns how many were found.
    pub fn discover(&mut self, device_type: i32) -> Result<i32> {
        let found = self.call(func::DISCOVER, |d| d.discover(device_type))?;
        log::debug!("Discovered {found} device(s) of type {device_type}");
        Ok(found)
    }

    /// Name of a discovered device, 0-based.
    pub fn device_name(&self, index: i32) -> Result<String> {
        self.driver
            .discovered_name(index)
            .ok_or_else(|| TactorError::driver(func::GET_NAME, self.driver.last_error()))
    }

    pub fn set_time_factor(&mut self, factor: i32) -> Result<()> {
        self.call(func::SET_TIME_FACTOR, |d| d.set_time_factor(factor))
            .map(drop)
    }

    /// Let the driver process pending work.
    pub fn refresh(&mut self) -> Result<()> {
        self.call(func::UPDATE, |d| d.update()).map(drop)
    }

    // -- Device actuation --
    //
    // None of these check `is_connected` first: the driver is the single
    // source of truth for device errors.

    pub fn pulse(&mut self, device_id: i32, tactor: i32, duration: i32, delay: i32) -> Result<()> {
        self.refreshed(func::PULSE, |d| d.pulse(device_id, tactor, duration, delay))
    }

    pub fn change_gain(
        &mut self,
        device_id: i32,
        tactor: i32,
        gain: i32,
        delay: i32,
    ) -> Result<()> {
        self.refreshed(func::CHANGE_GAIN, |d| {
            d.change_gain(device_id, tactor, gain, delay)
        })
    }

    pub fn change_freq(
        &mut self,
        device_id: i32,
        tactor: i32,
        freq: i32,
        delay: i32,
    ) -> Result<()> {
        self.refreshed(func::CHANGE_FREQ, |d| {
            d.change_freq(device_id, tactor, freq, delay)
        })
    }

    pub fn ramp_gain(
        &mut self,
        device_id: i32,
        tactor: i32,
        start: i32,
        end: i32,
        duration: i32,
        delay: i32,
    ) -> Result<()> {
        self.refreshed(func::RAMP_GAIN, |d| {
            d.ramp_gain(device_id, tactor, start, end, duration, delay)
        })
    }

    pub fn ramp_freq(
        &mut self,
        device_id: i32,
        tactor: i32,
        start: i32,
        end: i32,
        duration: i32,
        delay: i32,
    ) -> Result<()> {
        self.refreshed(func::RAMP_FREQ, |d| {
            d.ramp_freq(device_id, tactor, start, end, duration, delay)
        })
    }

    pub fn stop(&mut self, device_id: i32, delay: i32) -> Result<()> {
        self.refreshed(func::STOP, |d| d.stop(device_id, delay))
    }

    /// Set every tactor at once. Bit 0 of `mask` is tactor 1.
    pub fn set_state(&mut self, device_id: i32, mask: u32, delay: i32) -> Result<()> {
        self.refreshed(func::SET_TACTORS, |d| d.set_tactors(device_id, delay, mask))
    }

    pub fn begin_store_taction(&mut self, device_id: i32, tac_id: i32) -> Result<()> {
        self.call(func::BEGIN_STORE_TACTION, |d| {
            d.begin_store_taction(device_id, tac_id)
        })
        .map(drop)
    }

    pub fn finish_store_taction(&mut self, device_id: i32) -> Result<()> {
        self.call(func::FINISH_STORE_TACTION, |d| {
            d.finish_store_taction(device_id)
        })
        .map(drop)
    }

    pub fn play_stored_taction(&mut self, device_id: i32, tac_id: i32, delay: i32) -> Result<()> {
        self.refreshed(func::PLAY_STORED_TACTION, |d| {
            d.play_stored_taction(device_id, delay, tac_id)
        })
    }
}

impl<D: TactorDriver> fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("devices", &self.devices)
            .finish_non_exhaustive()
    }
}

impl<D: TactorDriver> Drop for Session<D> {
    fn drop(&mut self) {
        if self.state() != SessionState::Uninitialized || !self.devices.is_empty() {
            log::info!("Session dropped while {}; releasing driver", self.state());
        }
        if let Err(e) = self.shutdown() {
            log::warn!("Cleanup on exit failed: {e}");
        }
    }
}
