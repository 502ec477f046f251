use std::env;
use std::net::{Ipv4Addr, TcpListener};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use super::{SimulatorSession, TraciClient};
use crate::config::EnvironmentConfig;
use crate::error::{Result, TrafficError};

const CONNECT_BACKOFF: Duration = Duration::from_millis(250);
const LAUNCH_ATTEMPTS: u32 = 3;

enum Startup {
    Connected(TraciClient),
    Exited(ExitStatus),
}

/// A SUMO process plus the TraCI connection driving it.
///
/// The process is launched once by [`SumoSession::start`]; episodes reuse it
/// through `load`. [`SimulatorSession::close`] ends the session, and dropping
/// an open session closes it as well (killing the process if the socket is
/// already gone), so no simulator outlives the run on any exit path.
pub struct SumoSession {
    client: Option<TraciClient>,
    child: Option<Child>,
}

impl SumoSession {
    /// Locate the SUMO binary under `SUMO_HOME`, launch it on a free local
    /// port, and connect.
    pub fn start(config: &EnvironmentConfig) -> Result<Self> {
        let binary = sumo_binary(config.use_gui)?;
        Self::start_binary(&binary, config)
    }

    /// Launch `binary` with the SUMO command line and connect to it.
    ///
    /// The port is probed free and released before SUMO binds it, so another
    /// process can take it in between. SUMO then exits during startup and the
    /// launch is retried on a fresh port, up to `LAUNCH_ATTEMPTS` times.
    pub(crate) fn start_binary(binary: &Path, config: &EnvironmentConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.step_timeout_secs);
        let mut last_exit = None;

        for attempt in 1..=LAUNCH_ATTEMPTS {
            let port = free_port()?;
            let mut session = Self::spawn(binary, config, port)?;
            match session.connect(port, config.connect_retries, timeout)? {
                Startup::Connected(client) => {
                    session.client = Some(client);
                    if let Some(client) = session.client.as_mut() {
                        let (api, description) = client.version()?;
                        info!(api, %description, "connected to SUMO");
                    }
                    return Ok(session);
                }
                Startup::Exited(status) => {
                    warn!(attempt, port, %status, "SUMO exited during startup, retrying on another port");
                    last_exit = Some(status);
                }
            }
        }

        let status = last_exit.map(|s| s.to_string()).unwrap_or_default();
        Err(TrafficError::SimulatorError(format!(
            "SUMO exited before accepting a connection on {} attempts ({}); see {}",
            LAUNCH_ATTEMPTS,
            status,
            config.error_log.display()
        )))
    }

    fn spawn(binary: &Path, config: &EnvironmentConfig, port: u16) -> Result<Self> {
        info!(binary = %binary.display(), port, config = %config.sumo_config.display(), "starting SUMO");
        let child = Command::new(binary)
            .arg("-c")
            .arg(&config.sumo_config)
            .arg("--remote-port")
            .arg(port.to_string())
            .arg("--log-file")
            .arg(&config.log_file)
            .arg("--error-log")
            .arg(&config.error_log)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| {
                TrafficError::EnvironmentMissing(format!("cannot launch {}: {}", binary.display(), e))
            })?;
        Ok(Self::with_child(child))
    }

    /// A session owning `child` before any connection exists.
    pub(crate) fn with_child(child: Child) -> Self {
        SumoSession { client: None, child: Some(child) }
    }

    fn connect(&mut self, port: u16, retries: u32, timeout: Duration) -> Result<Startup> {
        let mut last_error = None;
        for attempt in 0..retries.max(1) {
            if let Some(child) = self.child.as_mut() {
                if let Some(status) = child.try_wait()? {
                    self.child = None;
                    return Ok(Startup::Exited(status));
                }
            }
            match TraciClient::connect((Ipv4Addr::LOCALHOST, port), timeout) {
                Ok(client) => return Ok(Startup::Connected(client)),
                Err(e) => {
                    last_error = Some(e);
                    if attempt + 1 < retries {
                        thread::sleep(CONNECT_BACKOFF);
                    }
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            TrafficError::SimulatorError(format!("could not connect to SUMO on port {}", port))
        }))
    }

    fn client(&mut self) -> Result<&mut TraciClient> {
        self.client
            .as_mut()
            .ok_or_else(|| TrafficError::SimulatorError("SUMO session already closed".to_string()))
    }

    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }
}

impl SimulatorSession for SumoSession {
    fn load(&mut self, args: &[String]) -> Result<()> {
        self.client()?.load(args)
    }

    fn simulation_step(&mut self) -> Result<()> {
        self.client()?.simulation_step()
    }

    fn lane_halting_number(&mut self, lane: &str) -> Result<u32> {
        self.client()?.lane_halting_number(lane)
    }

    fn lane_waiting_time(&mut self, lane: &str) -> Result<f64> {
        self.client()?.lane_waiting_time(lane)
    }

    fn set_phase(&mut self, tls_id: &str, index: u32) -> Result<()> {
        self.client()?.set_phase(tls_id, index)
    }

    fn close(&mut self) -> Result<()> {
        let (connected, result) = match self.client.take() {
            Some(mut client) => (true, client.close()),
            None => (false, Ok(())),
        };

        if let Some(mut child) = self.child.take() {
            if !connected || result.is_err() {
                // Without a working socket SUMO will not exit on its own.
                let _ = child.kill();
            }
            match child.wait() {
                Ok(status) => info!(%status, "SUMO exited"),
                Err(e) => warn!(error = %e, "could not reap SUMO process"),
            }
        }
        result
    }
}

impl Drop for SumoSession {
    fn drop(&mut self) {
        if self.client.is_some() || self.child.is_some() {
            if let Err(e) = self.close() {
                warn!(error = %e, "SUMO session closed with an error during drop");
            }
        }
    }
}

/// `$SUMO_HOME/bin/sumo` or `sumo-gui`.
pub fn sumo_binary(use_gui: bool) -> Result<PathBuf> {
    let home = env::var_os("SUMO_HOME").ok_or_else(|| {
        TrafficError::EnvironmentMissing("please declare environment variable 'SUMO_HOME'".to_string())
    })?;

    let name = if use_gui { "sumo-gui" } else { "sumo" };
    let mut binary = PathBuf::from(home).join("bin").join(name);
    if cfg!(windows) {
        binary.set_extension("exe");
    }

    if !binary.is_file() {
        return Err(TrafficError::EnvironmentMissing(format!(
            "SUMO binary not found at {}",
            binary.display()
        )));
    }
    Ok(binary)
}

fn free_port() -> Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(listener.local_addr()?.port())
}
