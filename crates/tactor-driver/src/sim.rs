//! In-process simulated tactor driver.
//!
//! Follows the vendor interface's observable behavior: calls before
//! `initialize` fail with "no initialization", device calls on unknown ids
//! fail with a connection error, out-of-range parameters fail with "bad
//! parameter". Every call is appended to a [`Journal`] that outlives the
//! driver, so callers can inspect what happened after teardown.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tactor_types::catalog;
use tactor_types::config::SimulatorConfig;

use crate::driver::{TactorDriver, func};

/// Valid carrier frequency range in Hz.
const FREQ_RANGE: std::ops::RangeInclusive<i32> = 300..=3550;
/// Valid gain and time-factor range.
const BYTE_RANGE: std::ops::RangeInclusive<i32> = 1..=255;
/// Durations and delays.
const NON_NEGATIVE: std::ops::RangeInclusive<i32> = 0..=i32::MAX;

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverCall {
    /// Vendor function name (see [`func`]).
    pub function: &'static str,
    /// Raw value the call returned.
    pub result: i32,
}

/// Shared, append-only log of driver calls.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<DriverCall>>>,
}

impl Journal {
    fn lock(&self) -> MutexGuard<'_, Vec<DriverCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, function: &'static str, result: i32) {
        self.lock().push(DriverCall { function, result });
    }

    /// Snapshot of every call so far.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().clone()
    }

    /// Number of calls made to `function`.
    pub fn count(&self, function: &str) -> usize {
        self.lock().iter().filter(|c| c.function == function).count()
    }

    /// Total number of calls.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[derive(Debug, Default)]
struct SimDevice {
    name: String,
    device_type: i32,
    /// Bitmask of tactors currently switched on.
    active: u32,
    recording: Option<i32>,
    stored: BTreeSet<i32>,
}

/// Simulated vendor driver.
#[derive(Debug)]
pub struct SimDriver {
    config: SimulatorConfig,
    initialized: bool,
    discovered: Vec<String>,
    devices: BTreeMap<i32, SimDevice>,
    next_id: i32,
    time_factor: i32,
    faults: HashMap<&'static str, i32>,
    last_error: Cell<i32>,
    journal: Journal,
}

impl SimDriver {
    /// Create a simulator reporting the devices named in `config`.
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            initialized: false,
            discovered: Vec::new(),
            devices: BTreeMap::new(),
            next_id: 0,
            time_factor: 1,
            faults: HashMap::new(),
            last_error: Cell::new(0),
            journal: Journal::default(),
        }
    }

    /// Handle to the call journal. Stays valid after the driver is dropped.
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Make every call to `function` fail with `code` until cleared.
    pub fn inject_failure(&mut self, function: &'static str, code: i32) {
        self.faults.insert(function, code);
    }

    pub fn clear_failure(&mut self, function: &str) {
        self.faults.remove(function);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Ids of devices the simulator currently holds open.
    pub fn open_devices(&self) -> Vec<i32> {
        self.devices.keys().copied().collect()
    }

    /// Tactor bitmask last set on a device.
    pub fn active_tactors(&self, device_id: i32) -> Option<u32> {
        self.devices.get(&device_id).map(|d| d.active)
    }

    pub fn time_factor(&self) -> i32 {
        self.time_factor
    }

    fn fail(&self, function: &'static str, code: i32) -> i32 {
        log::trace!("sim {function} -> error {code}");
        self.last_error.set(code);
        self.journal.record(function, -1);
        -1
    }

    fn ok(&self, function: &'static str, value: i32) -> i32 {
        self.journal.record(function, value);
        value
    }

    /// Shared preconditions: no injected fault and an initialized interface.
    fn check(&self, function: &'static str) -> Result<(), i32> {
        if let Some(&code) = self.faults.get(function) {
            return Err(code);
        }
        if !self.initialized {
            return Err(catalog::NO_INIT);
        }
        Ok(())
    }

    fn check_tactor(
        &self,
        function: &'static str,
        device_id: i32,
        tactor: i32,
    ) -> Result<(), i32> {
        self.check(function)?;
        if !self.devices.contains_key(&device_id) {
            return Err(catalog::CONNECTION_ERROR);
        }
        if !(1..=self.config.tactors_per_device).contains(&tactor) {
            return Err(catalog::BAD_PARAMETER);
        }
        Ok(())
    }

    fn finish(&self, function: &'static str, outcome: Result<i32, i32>) -> i32 {
        match outcome {
            Ok(value) => self.ok(function, value),
            Err(code) => self.fail(function, code),
        }
    }

    fn actuate(
        &self,
        function: &'static str,
        device_id: i32,
        tactor: i32,
        params: &[(i32, &std::ops::RangeInclusive<i32>)],
    ) -> i32 {
        let outcome = self.check_tactor(function, device_id, tactor).and_then(|()| {
            if params.iter().all(|(v, range)| range.contains(v)) {
                Ok(0)
            } else {
                Err(catalog::BAD_PARAMETER)
            }
        });
        if outcome.is_ok()
            && let Some(slot) = self.devices.get(&device_id).and_then(|d| d.recording)
        {
            log::trace!("sim {function} recorded into TAction {slot}");
        }
        self.finish(function, outcome)
    }
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl TactorDriver for SimDriver {
    fn initialize(&mut self) -> i32 {
        if let Some(&code) = self.faults.get(func::INITIALIZE) {
            return self.fail(func::INITIALIZE, code);
        }
        self.initialized = true;
        self.ok(func::INITIALIZE, 0)
    }

    fn shutdown(&mut self) -> i32 {
        if let Some(&code) = self.faults.get(func::SHUTDOWN) {
            return self.fail(func::SHUTDOWN, code);
        }
        self.initialized = false;
        self.discovered.clear();
        self.devices.clear();
        self.ok(func::SHUTDOWN, 0)
    }

    fn update(&mut self) -> i32 {
        let outcome = self.check(func::UPDATE).map(|()| 0);
        self.finish(func::UPDATE, outcome)
    }

    fn discover(&mut self, device_type: i32) -> i32 {
        let outcome = self.check(func::DISCOVER).and_then(|()| {
            if device_type < 1 {
                Err(catalog::BAD_PARAMETER)
            } else {
                Ok(())
            }
        });
        match outcome {
            Ok(()) => {
                self.discovered = self.config.devices.clone();
                let found = i32::try_from(self.discovered.len()).unwrap_or(i32::MAX);
                self.ok(func::DISCOVER, found)
            },
            Err(code) => self.fail(func::DISCOVER, code),
        }
    }

    fn discovered_name(&self, index: i32) -> Option<String> {
        let outcome = self.check(func::GET_NAME).and_then(|()| {
            usize::try_from(index)
                .ok()
                .and_then(|i| self.discovered.get(i))
                .ok_or(catalog::BAD_PARAMETER)
        });
        match outcome {
            Ok(name) => {
                self.ok(func::GET_NAME, 0);
                Some(name.clone())
            },
            Err(code) => {
                self.fail(func::GET_NAME, code);
                None
            },
        }
    }

    fn connect(&mut self, name: &str, device_type: i32) -> i32 {
        let outcome = self.check(func::CONNECT).and_then(|()| {
            if self.config.devices.iter().any(|d| d == name) {
                Ok(())
            } else {
                Err(catalog::CONNECTION_ERROR)
            }
        });
        match outcome {
            Ok(()) => {
                let id = self.next_id;
                self.next_id += 1;
                self.devices.insert(
                    id,
                    SimDevice {
                        name: name.to_string(),
                        device_type,
                        ..SimDevice::default()
                    },
                );
                log::trace!("sim connected {name} (type {device_type}) as {id}");
                self.ok(func::CONNECT, id)
            },
            Err(code) => self.fail(func::CONNECT, code),
        }
    }

    fn close(&mut self, device_id: i32) -> i32 {
        let outcome = self.check(func::CLOSE).and_then(|()| {
            self.devices
                .remove(&device_id)
                .map(|dev| {
                    log::trace!("sim closed {} (type {})", dev.name, dev.device_type);
                    0
                })
                .ok_or(catalog::FAILED_TO_CLOSE)
        });
        self.finish(func::CLOSE, outcome)
    }

    fn set_time_factor(&mut self, factor: i32) -> i32 {
        let outcome = self.check(func::SET_TIME_FACTOR).and_then(|()| {
            if BYTE_RANGE.contains(&factor) {
                Ok(0)
            } else {
                Err(catalog::BAD_PARAMETER)
            }
        });
        if outcome.is_ok() {
            self.time_factor = factor;
        }
        self.finish(func::SET_TIME_FACTOR, outcome)
    }

    fn pulse(&mut self, device_id: i32, tactor: i32, duration: i32, delay: i32) -> i32 {
        self.actuate(
            func::PULSE,
            device_id,
            tactor,
            &[(duration, &NON_NEGATIVE), (delay, &NON_NEGATIVE)],
        )
    }

    fn change_gain(&mut self, device_id: i32, tactor: i32, gain: i32, delay: i32) -> i32 {
        self.actuate(
            func::CHANGE_GAIN,
            device_id,
            tactor,
            &[(gain, &BYTE_RANGE), (delay, &NON_NEGATIVE)],
        )
    }

    fn change_freq(&mut self, device_id: i32, tactor: i32, freq: i32, delay: i32) -> i32 {
        self.actuate(
            func::CHANGE_FREQ,
            device_id,
            tactor,
            &[(freq, &FREQ_RANGE), (delay, &NON_NEGATIVE)],
        )
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
        self.actuate(
            func::RAMP_GAIN,
            device_id,
            tactor,
            &[
                (start, &BYTE_RANGE),
                (end, &BYTE_RANGE),
                (duration, &NON_NEGATIVE),
                (delay, &NON_NEGATIVE),
            ],
        )
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
        self.actuate(
            func::RAMP_FREQ,
            device_id,
            tactor,
            &[
                (start, &FREQ_RANGE),
                (end, &FREQ_RANGE),
                (duration, &NON_NEGATIVE),
                (delay, &NON_NEGATIVE),
            ],
        )
    }

    fn stop(&mut self, device_id: i32, _delay: i32) -> i32 {
        let outcome = self.check(func::STOP).and_then(|()| {
            self.devices
                .get_mut(&device_id)
                .map(|dev| {
                    dev.active = 0;
                    0
                })
                .ok_or(catalog::CONNECTION_ERROR)
        });
        self.finish(func::STOP, outcome)
    }

    fn set_tactors(&mut self, device_id: i32, _delay: i32, mask: u32) -> i32 {
        let tactors = self.config.tactors_per_device;
        let outcome = self.check(func::SET_TACTORS).and_then(|()| {
            let dev = self
                .devices
                .get_mut(&device_id)
                .ok_or(catalog::CONNECTION_ERROR)?;
            if tactors < 32 && mask >> tactors != 0 {
                return Err(catalog::BAD_PARAMETER);
            }
            dev.active = mask;
            Ok(0)
        });
        self.finish(func::SET_TACTORS, outcome)
    }

    fn begin_store_taction(&mut self, device_id: i32, tac_id: i32) -> i32 {
        let outcome = self.check(func::BEGIN_STORE_TACTION).and_then(|()| {
            let dev = self
                .devices
                .get_mut(&device_id)
                .ok_or(catalog::CONNECTION_ERROR)?;
            if tac_id < 0 || dev.recording.is_some() {
                return Err(catalog::BAD_PARAMETER);
            }
            dev.recording = Some(tac_id);
            Ok(0)
        });
        self.finish(func::BEGIN_STORE_TACTION, outcome)
    }

    fn finish_store_taction(&mut self, device_id: i32) -> i32 {
        let outcome = self.check(func::FINISH_STORE_TACTION).and_then(|()| {
            let dev = self
                .devices
                .get_mut(&device_id)
                .ok_or(catalog::CONNECTION_ERROR)?;
            let slot = dev.recording.take().ok_or(catalog::BAD_PARAMETER)?;
            dev.stored.insert(slot);
            Ok(0)
        });
        self.finish(func::FINISH_STORE_TACTION, outcome)
    }

    fn play_stored_taction(&mut self, device_id: i32, _delay: i32, tac_id: i32) -> i32 {
        let outcome = self.check(func::PLAY_STORED_TACTION).and_then(|()| {
            let dev = self
                .devices
                .get(&device_id)
                .ok_or(catalog::CONNECTION_ERROR)?;
            if dev.stored.contains(&tac_id) {
                Ok(0)
            } else {
                Err(catalog::BAD_PARAMETER)
            }
        });
        self.finish(func::PLAY_STORED_TACTION, outcome)
    }

    fn last_error(&self) -> i32 {
        self.last_error.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> SimDriver {
        let mut d = SimDriver::default();
        assert_eq!(d.initialize(), 0);
        d
    }

    #[test]
    fn calls_before_initialize_report_no_init() {
        let mut d = SimDriver::default();
        assert!(d.discover(1) < 0);
        assert_eq!(d.last_error(), catalog::NO_INIT);
        assert!(d.connect("DEV0", 1) < 0);
        assert_eq!(d.last_error(), catalog::NO_INIT);
        assert!(d.update() < 0);
    }

    #[test]
    fn discover_and_name() {
        let mut d = ready();
        assert_eq!(d.discover(1), 1);
        assert_eq!(d.discovered_name(0).as_deref(), Some("DEV0"));
        assert!(d.discovered_name(1).is_none());
        assert_eq!(d.last_error(), catalog::BAD_PARAMETER);
        assert!(d.discovered_name(-1).is_none());
    }

    #[test]
    fn discover_rejects_bad_type() {
        let mut d = ready();
        assert!(d.discover(0) < 0);
        assert_eq!(d.last_error(), catalog::BAD_PARAMETER);
    }

    #[test]
    fn connect_assigns_sequential_ids() {
        let mut d = SimDriver::new(SimulatorConfig {
            devices: vec!["A".into(), "B".into()],
            tactors_per_device: 4,
        });
        d.initialize();
        assert_eq!(d.connect("A", 1), 0);
        assert_eq!(d.connect("B", 1), 1);
        assert_eq!(d.open_devices(), vec![0, 1]);
    }

    #[test]
    fn connect_unknown_name() {
        let mut d = ready();
        assert!(d.connect("nope", 1) < 0);
        assert_eq!(d.last_error(), catalog::CONNECTION_ERROR);
        assert!(d.open_devices().is_empty());
    }

    #[test]
    fn pulse_validates_device_and_tactor() {
        let mut d = ready();
        let id = d.connect("DEV0", 1);
        assert_eq!(d.pulse(id, 1, 100, 0), 0);
        assert!(d.pulse(id + 1, 1, 100, 0) < 0);
        assert_eq!(d.last_error(), catalog::CONNECTION_ERROR);
        assert!(d.pulse(id, 9, 100, 0) < 0);
        assert_eq!(d.last_error(), catalog::BAD_PARAMETER);
    }

    #[test]
    fn freq_out_of_range() {
        let mut d = ready();
        let id = d.connect("DEV0", 1);
        assert_eq!(d.change_freq(id, 1, 300, 0), 0);
        assert_eq!(d.change_freq(id, 1, 3550, 0), 0);
        assert!(d.change_freq(id, 1, 299, 0) < 0);
        assert!(d.ramp_freq(id, 1, 300, 4000, 100, 0) < 0);
    }

    #[test]
    fn set_tactors_and_stop() {
        let mut d = ready();
        let id = d.connect("DEV0", 1);
        assert_eq!(d.set_tactors(id, 0, 0b101), 0);
        assert_eq!(d.active_tactors(id), Some(0b101));
        assert!(d.set_tactors(id, 0, 1 << 8) < 0);
        assert_eq!(d.stop(id, 0), 0);
        assert_eq!(d.active_tactors(id), Some(0));
    }

    #[test]
    fn taction_lifecycle() {
        let mut d = ready();
        let id = d.connect("DEV0", 1);
        assert!(d.play_stored_taction(id, 0, 3) < 0);
        assert!(d.finish_store_taction(id) < 0);
        assert_eq!(d.begin_store_taction(id, 3), 0);
        assert_eq!(d.pulse(id, 1, 50, 0), 0);
        assert_eq!(d.finish_store_taction(id), 0);
        assert_eq!(d.play_stored_taction(id, 0, 3), 0);
    }

    #[test]
    fn close_unknown_device() {
        let mut d = ready();
        assert!(d.close(5) < 0);
        assert_eq!(d.last_error(), catalog::FAILED_TO_CLOSE);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut d = ready();
        d.connect("DEV0", 1);
        assert_eq!(d.shutdown(), 0);
        assert!(!d.is_initialized());
        assert!(d.open_devices().is_empty());
    }

    #[test]
    fn injected_failure_persists_until_cleared() {
        let mut d = ready();
        d.inject_failure(func::UPDATE, catalog::TIMEOUT);
        assert!(d.update() < 0);
        assert_eq!(d.last_error(), catalog::TIMEOUT);
        assert!(d.update() < 0);
        d.clear_failure(func::UPDATE);
        assert_eq!(d.update(), 0);
    }

    #[test]
    fn time_factor_range() {
        let mut d = ready();
        assert_eq!(d.set_time_factor(10), 0);
        assert_eq!(d.time_factor(), 10);
        assert!(d.set_time_factor(0) < 0);
        assert!(d.set_time_factor(256) < 0);
        assert_eq!(d.time_factor(), 10);
    }

    #[test]
    fn journal_outlives_driver() {
        let journal = {
            let mut d = SimDriver::default();
            d.initialize();
            d.discover(1);
            d.journal()
        };
        assert_eq!(journal.len(), 2);
        assert_eq!(journal.count(func::INITIALIZE), 1);
        assert_eq!(journal.calls()[1].result, 1);
        journal.clear();
        assert!(journal.is_empty());
    }
}
