//! Tests for the session state machine.

use tactor_driver::{SimDriver, TactorDriver, func};
use tactor_types::catalog;
use tactor_types::config::SimulatorConfig;
use tactor_types::error::TactorError;

use super::*;

fn connected() -> Session<SimDriver> {
    let mut s = Session::new(SimDriver::default());
    s.initialize().unwrap();
    assert_eq!(s.connect("DEV0", 1).unwrap(), 0);
    s
}

fn driver_code(err: &TactorError) -> i32 {
    match err {
        TactorError::Driver { code, .. } => *code,
        other => panic!("expected driver error, got {other:?}"),
    }
}

#[test]
fn starts_uninitialized() {
    let s = Session::new(SimDriver::default());
    assert_eq!(s.state(), SessionState::Uninitialized);
    assert!(!s.is_connected());
    assert!(s.device().is_none());
    assert!(s.driver().journal().is_empty());
}

#[test]
fn initialize_is_idempotent() {
    let mut s = Session::new(SimDriver::default());
    s.initialize().unwrap();
    s.initialize().unwrap();
    assert_eq!(s.state(), SessionState::Ready);
    assert_eq!(s.driver().journal().count(func::INITIALIZE), 1);
}

#[test]
fn initialize_while_connected_is_noop() {
    let mut s = connected();
    s.initialize().unwrap();
    assert_eq!(s.state(), SessionState::Connected);
    assert_eq!(s.driver().journal().count(func::INITIALIZE), 1);
}

#[test]
fn initialize_failure_stays_uninitialized() {
    let mut driver = SimDriver::default();
    driver.inject_failure(func::INITIALIZE, catalog::NO_SUPPORTED_DRIVER);
    let mut s = Session::new(driver);
    let err = s.initialize().unwrap_err();
    assert_eq!(driver_code(&err), catalog::NO_SUPPORTED_DRIVER);
    assert_eq!(s.state(), SessionState::Uninitialized);
}

#[test]
fn connect_binds_device() {
    let s = connected();
    assert_eq!(s.state(), SessionState::Connected);
    assert_eq!(
        s.device(),
        Some(&DeviceRecord {
            device_id: 0,
            device_type: 1
        })
    );
}

#[test]
fn second_connect_rejected_without_driver_call() {
    let mut s = connected();
    let err = s.connect("DEV0", 1).unwrap_err();
    assert!(matches!(err, TactorError::AlreadyConnected { device_id: 0 }));
    assert_eq!(s.driver().journal().count(func::CONNECT), 1);
    assert_eq!(s.devices().count(), 1);
    assert_eq!(s.device().map(|d| d.device_id), Some(0));
}

#[test]
fn connect_before_initialize_reports_no_init() {
    let mut s = Session::new(SimDriver::default());
    let err = s.connect("DEV0", 1).unwrap_err();
    assert_eq!(driver_code(&err), catalog::NO_INIT);
    assert!(format!("{err}").contains("No initialization."));
    assert_eq!(s.state(), SessionState::Uninitialized);
    assert!(s.device().is_none());
}

#[test]
fn failed_connect_records_nothing() {
    let mut s = Session::new(SimDriver::default());
    s.initialize().unwrap();
    let err = s.connect("missing", 1).unwrap_err();
    assert_eq!(driver_code(&err), catalog::CONNECTION_ERROR);
    assert_eq!(s.state(), SessionState::Ready);
}

#[test]
fn close_returns_to_ready() {
    let mut s = connected();
    s.close(0).unwrap();
    assert_eq!(s.state(), SessionState::Ready);
    assert_eq!(s.connect("DEV0", 1).unwrap(), 1);
}

#[test]
fn close_failure_keeps_record() {
    let mut s = connected();
    s.driver_mut().inject_failure(func::CLOSE, catalog::FAILED_TO_CLOSE);
    assert!(s.close(0).is_err());
    assert!(s.is_connected());
}

#[test]
fn shutdown_closes_and_resets() {
    let mut s = connected();
    s.shutdown().unwrap();
    assert_eq!(s.state(), SessionState::Uninitialized);
    assert!(!s.is_connected());
    let journal = s.driver().journal();
    assert_eq!(journal.count(func::CLOSE), 1);
    assert_eq!(journal.count(func::SHUTDOWN), 1);
    assert!(!s.driver().is_initialized());
}

#[test]
fn shutdown_when_uninitialized_makes_no_calls() {
    let mut s = Session::new(SimDriver::default());
    s.shutdown().unwrap();
    s.shutdown().unwrap();
    assert!(s.driver().journal().is_empty());
}

#[test]
fn shutdown_twice_is_safe() {
    let mut s = connected();
    s.shutdown().unwrap();
    s.shutdown().unwrap();
    let journal = s.driver().journal();
    assert_eq!(journal.count(func::SHUTDOWN), 1);
    assert_eq!(journal.count(func::CLOSE), 1);
}

#[test]
fn shutdown_continues_past_close_failure() {
    let mut s = connected();
    s.driver_mut().inject_failure(func::CLOSE, catalog::FAILED_TO_CLOSE);
    s.shutdown().unwrap();
    assert_eq!(s.state(), SessionState::Uninitialized);
    assert_eq!(s.driver().journal().count(func::SHUTDOWN), 1);
}

#[test]
fn shutdown_failure_still_resets() {
    let mut s = connected();
    s.driver_mut().inject_failure(func::SHUTDOWN, catalog::INTERNAL_ERROR);
    let err = s.shutdown().unwrap_err();
    assert_eq!(driver_code(&err), catalog::INTERNAL_ERROR);
    assert_eq!(s.state(), SessionState::Uninitialized);
}

#[test]
fn reinitialize_after_shutdown() {
    let mut s = connected();
    s.shutdown().unwrap();
    s.initialize().unwrap();
    assert_eq!(s.state(), SessionState::Ready);
    assert_eq!(s.driver().journal().count(func::INITIALIZE), 2);
}

#[test]
fn drop_releases_connected_session() {
    let journal = {
        let s = connected();
        s.driver().journal()
    };
    assert_eq!(journal.count(func::CLOSE), 1);
    assert_eq!(journal.count(func::SHUTDOWN), 1);
}

#[test]
fn drop_after_shutdown_does_nothing_more() {
    let journal = {
        let mut s = connected();
        s.shutdown().unwrap();
        s.driver().journal()
    };
    assert_eq!(journal.count(func::SHUTDOWN), 1);
    assert_eq!(journal.count(func::CLOSE), 1);
}

#[test]
fn drop_of_untouched_session_is_silent() {
    let journal = {
        let s = Session::new(SimDriver::default());
        s.driver().journal()
    };
    assert!(journal.is_empty());
}

#[test]
fn discover_and_name() {
    let mut s = Session::new(SimDriver::new(SimulatorConfig {
        devices: vec!["A".into(), "B".into()],
        tactors_per_device: 8,
    }));
    s.initialize().unwrap();
    assert_eq!(s.discover(1).unwrap(), 2);
    assert_eq!(s.device_name(1).unwrap(), "B");
    let err = s.device_name(2).unwrap_err();
    assert_eq!(driver_code(&err), catalog::BAD_PARAMETER);
}

#[test]
fn discover_before_initialize() {
    let mut s = Session::new(SimDriver::default());
    let err = s.discover(1).unwrap_err();
    assert_eq!(driver_code(&err), catalog::NO_INIT);
}

#[test]
fn pulse_refreshes_first() {
    let mut s = connected();
    s.pulse(0, 1, 100, 0).unwrap();
    let calls = s.driver().journal().calls();
    let tail: Vec<&str> = calls.iter().rev().take(2).map(|c| c.function).collect();
    assert_eq!(tail, vec![func::PULSE, func::UPDATE]);
}

#[test]
fn refresh_failure_aborts_action() {
    let mut s = connected();
    s.driver_mut().inject_failure(func::UPDATE, catalog::TIMEOUT);
    let err = s.pulse(0, 1, 100, 0).unwrap_err();
    match err {
        TactorError::Driver { function, code, .. } => {
            assert_eq!(function, func::UPDATE);
            assert_eq!(code, catalog::TIMEOUT);
        },
        other => panic!("expected driver error, got {other:?}"),
    }
    assert_eq!(s.driver().journal().count(func::PULSE), 0);
}

#[test]
fn actuation_without_connection_is_driver_reported() {
    let mut s = Session::new(SimDriver::default());
    s.initialize().unwrap();
    let err = s.change_gain(0, 1, 200, 0).unwrap_err();
    assert_eq!(driver_code(&err), catalog::CONNECTION_ERROR);
    assert_eq!(s.driver().journal().count(func::CHANGE_GAIN), 1);
}

#[test]
fn set_state_and_stop() {
    let mut s = connected();
    s.set_state(0, 0b11, 0).unwrap();
    assert_eq!(s.driver().active_tactors(0), Some(0b11));
    s.stop(0, 0).unwrap();
    assert_eq!(s.driver().active_tactors(0), Some(0));
}

#[test]
fn ramps_and_freq() {
    let mut s = connected();
    s.change_freq(0, 1, 400, 0).unwrap();
    s.ramp_gain(0, 1, 1, 255, 500, 0).unwrap();
    s.ramp_freq(0, 1, 300, 3000, 500, 0).unwrap();
    let err = s.change_freq(0, 1, 100, 0).unwrap_err();
    assert_eq!(driver_code(&err), catalog::BAD_PARAMETER);
}

#[test]
fn taction_round() {
    let mut s = connected();
    s.begin_store_taction(0, 2).unwrap();
    s.pulse(0, 1, 50, 0).unwrap();
    s.finish_store_taction(0).unwrap();
    s.play_stored_taction(0, 2, 0).unwrap();
    assert!(s.play_stored_taction(0, 7, 0).is_err());
}

#[test]
fn time_factor_forwarded() {
    let mut s = Session::new(SimDriver::default());
    s.initialize().unwrap();
    s.set_time_factor(20).unwrap();
    assert_eq!(s.driver().time_factor(), 20);
}

#[test]
fn debug_shows_state() {
    let s = connected();
    let dbg = format!("{s:?}");
    assert!(dbg.contains("Connected"));
    assert_eq!(s.driver().last_error(), 0);
}
