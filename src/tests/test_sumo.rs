use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};
use crate::config::EnvironmentConfig;
use crate::error::TrafficError;
use crate::simulator::{SimulatorSession, SumoSession};

// Stand-in for a SUMO process that never opens its TraCI port.
#[cfg(target_os = "linux")]
fn long_sleeper() -> std::process::Child {
    Command::new("sleep").arg("30").spawn().unwrap()
}

#[cfg(target_os = "linux")]
fn is_reaped(pid: u32) -> bool {
    !Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(target_os = "linux")]
#[test]
fn test_close_kills_and_reaps_unconnected_process() {
    let child = long_sleeper();
    let pid = child.id();
    let mut session = SumoSession::with_child(child);
    assert!(!session.is_open());

    let started = Instant::now();
    session.close().unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(is_reaped(pid));

    // Second close has nothing left to do.
    session.close().unwrap();
}

#[cfg(target_os = "linux")]
#[test]
fn test_drop_kills_and_reaps_process() {
    let child = long_sleeper();
    let pid = child.id();

    let started = Instant::now();
    drop(SumoSession::with_child(child));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(is_reaped(pid));
}

#[cfg(unix)]
#[test]
fn test_start_retries_when_process_exits_before_connecting() {
    let config = EnvironmentConfig { connect_retries: 20, ..EnvironmentConfig::default() };

    let started = Instant::now();
    let result = SumoSession::start_binary(Path::new("false"), &config);
    assert!(started.elapsed() < Duration::from_secs(30));
    match result {
        Err(TrafficError::SimulatorError(message)) => {
            assert!(message.contains("exited before accepting a connection"));
            assert!(message.contains("3 attempts"));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("a process that exits cannot be connected to"),
    }
}

#[test]
fn test_start_reports_missing_binary() {
    let config = EnvironmentConfig::default();
    let result = SumoSession::start_binary(Path::new("/nonexistent/bin/sumo"), &config);
    assert!(matches!(result, Err(TrafficError::EnvironmentMissing(_))));
}
